//! Robots.txt rules
//!
//! Allow/disallow matching is delegated to the `robotstxt` crate; only the
//! `Crawl-delay` extension is read here.

use robotstxt::DefaultMatcher;

/// Rules from one host's robots.txt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// Raw robots.txt content; `None` allows everything
    content: Option<String>,
}

impl RobotsRules {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Rules that allow everything
    ///
    /// Used when a host has no robots.txt or it could not be fetched.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Returns true if these rules allow everything unconditionally
    pub fn allows_everything(&self) -> bool {
        self.content.as_deref().map_or(true, |c| c.trim().is_empty())
    }

    /// Checks whether `user_agent` may fetch `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path (e.g. `/page.html`)
    /// * `user_agent` - Product token of the crawler (e.g. `Crawlsheet`)
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.content.as_deref() {
            Some(content) if !content.trim().is_empty() => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
            _ => true,
        }
    }

    /// Returns the `Crawl-delay` in seconds that applies to `user_agent`
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_deref()?;
        let agent = user_agent.to_lowercase();

        let mut specific = None;
        let mut wildcard = None;
        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !group_open {
                    group.clear();
                    group_open = true;
                }
                group.push(value.to_lowercase());
                continue;
            }
            group_open = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };

            if group.iter().any(|token| token != "*" && agent.contains(token.as_str())) {
                specific.get_or_insert(delay);
            } else if group.iter().any(|token| token == "*") {
                wildcard.get_or_insert(delay);
            }
        }

        specific.or(wildcard)
    }
}
