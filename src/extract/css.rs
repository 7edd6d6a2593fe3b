//! Stylesheet scanning for embedded resource URLs
//!
//! This is not a CSS parser. The tokenizer only splits text into selectors,
//! declaration properties, declaration values and at-rule statements, which is
//! enough to find the `src` descriptors of `@font-face` blocks.

/// Category of a CSS token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    /// A selector (`a:hover`, `@font-face`) or a declaration property name (`src`)
    SelectorOrStyleProperty,

    /// The value of a declaration
    Value,

    /// A block-less at-rule statement such as `@import url(x.css)`
    AtRule,
}

/// A token with the byte offset where it starts in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssToken {
    pub category: TokenCategory,
    pub value: String,
    pub source_index: usize,
}

/// Splits stylesheet text into tokens
///
/// Comments are dropped. Quoted strings and parenthesised groups are kept
/// intact, so `;`, `{` and `}` inside `url(...)` or `"..."` do not split tokens.
pub fn tokenize_css(css: &str) -> Vec<CssToken> {
    let mut tokenizer = Tokenizer::default();
    let mut chars = css.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if tokenizer.in_comment {
            if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                chars.next();
                tokenizer.in_comment = false;
            }
            continue;
        }

        if let Some(quote) = tokenizer.quote {
            tokenizer.push(idx, c);
            if c == '\\' {
                if let Some((next_idx, next)) = chars.next() {
                    tokenizer.push(next_idx, next);
                }
            } else if c == quote {
                tokenizer.quote = None;
            }
            continue;
        }

        match c {
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                tokenizer.in_comment = true;
            }
            '"' | '\'' => {
                tokenizer.quote = Some(c);
                tokenizer.push(idx, c);
            }
            '(' => {
                tokenizer.parens += 1;
                tokenizer.push(idx, c);
            }
            ')' => {
                tokenizer.parens = tokenizer.parens.saturating_sub(1);
                tokenizer.push(idx, c);
            }
            _ if tokenizer.parens > 0 => tokenizer.push(idx, c),
            '{' => {
                tokenizer.emit_selector();
                tokenizer.depth += 1;
            }
            '}' => {
                tokenizer.emit_statement();
                tokenizer.depth = tokenizer.depth.saturating_sub(1);
            }
            ';' => tokenizer.emit_statement(),
            _ => tokenizer.push(idx, c),
        }
    }

    tokenizer.emit_statement();
    tokenizer.tokens
}

/// Extracts the URLs declared by `src` properties
///
/// The most recent `src` property is tracked; the first value token after it
/// is taken as its value, its `url(...)` wrapper and quotes are stripped, and
/// the tracker resets. Each `src` therefore contributes at most one URL, and a
/// `src` with no value before the end of input contributes none.
///
/// # Example
///
/// ```
/// use crawlsheet::extract::extract_css_urls;
///
/// let urls = extract_css_urls(r#"@font-face{font-family:"X";src:url("/fonts/a.eot");}"#);
/// assert_eq!(urls, vec!["/fonts/a.eot".to_string()]);
/// ```
pub fn extract_css_urls(css: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut src_index: Option<usize> = None;

    for token in tokenize_css(css) {
        match token.category {
            TokenCategory::SelectorOrStyleProperty if token.value.eq_ignore_ascii_case("src") => {
                src_index = Some(token.source_index);
            }
            TokenCategory::Value => {
                if let Some(index) = src_index {
                    if token.source_index > index {
                        let url = strip_url_wrapper(&token.value);
                        if !url.is_empty() {
                            urls.push(url);
                        }
                        src_index = None;
                    }
                }
            }
            _ => {}
        }
    }

    urls
}

/// Reduces `url("x")`, `url('x')`, `url(x)` or `"x"` to `x`
fn strip_url_wrapper(value: &str) -> String {
    let value = value.trim();
    let inner = match value.to_ascii_lowercase().find("url(") {
        Some(start) => {
            let rest = &value[start + 4..];
            let end = rest.find(')').unwrap_or(rest.len());
            &rest[..end]
        }
        None => value,
    };

    inner
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[derive(Default)]
struct Tokenizer {
    tokens: Vec<CssToken>,
    buffer: String,
    buffer_start: usize,
    depth: usize,
    parens: usize,
    quote: Option<char>,
    in_comment: bool,
}

impl Tokenizer {
    fn push(&mut self, idx: usize, c: char) {
        if self.buffer.is_empty() {
            if c.is_whitespace() {
                return;
            }
            self.buffer_start = idx;
        }
        self.buffer.push(c);
    }

    fn take_buffer(&mut self) -> Option<(String, usize)> {
        let text = std::mem::take(&mut self.buffer);
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            None
        } else {
            Some((trimmed.to_string(), self.buffer_start))
        }
    }

    fn emit_selector(&mut self) {
        if let Some((text, start)) = self.take_buffer() {
            self.tokens.push(CssToken {
                category: TokenCategory::SelectorOrStyleProperty,
                value: text,
                source_index: start,
            });
        }
    }

    /// Emits a chunk terminated by `;`, `}` or end of input
    fn emit_statement(&mut self) {
        let Some((text, start)) = self.take_buffer() else {
            return;
        };

        if self.depth == 0 && text.starts_with('@') {
            self.tokens.push(CssToken {
                category: TokenCategory::AtRule,
                value: text,
                source_index: start,
            });
            return;
        }

        match text.find(':') {
            Some(colon) => {
                let property = text[..colon].trim();
                if !property.is_empty() {
                    self.tokens.push(CssToken {
                        category: TokenCategory::SelectorOrStyleProperty,
                        value: property.to_string(),
                        source_index: start,
                    });
                }

                let raw_value = &text[colon + 1..];
                let value = raw_value.trim();
                if !value.is_empty() {
                    let leading = raw_value.len() - raw_value.trim_start().len();
                    self.tokens.push(CssToken {
                        category: TokenCategory::Value,
                        value: value.to_string(),
                        source_index: start + colon + 1 + leading,
                    });
                }
            }
            None => self.tokens.push(CssToken {
                category: TokenCategory::SelectorOrStyleProperty,
                value: text,
                source_index: start,
            }),
        }
    }
}
