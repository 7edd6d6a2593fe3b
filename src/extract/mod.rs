//! Extraction of secondary links and page metadata
//!
//! This module reads already-parsed documents. It never fetches anything:
//! - `links`: locally-scoped image, script, stylesheet and `<link>` URLs
//! - `css`: `src` URLs embedded in stylesheet text (e.g. `@font-face`)
//! - `metadata`: page info, SEO and Open Graph fields

mod css;
mod links;
mod metadata;

pub use css::{extract_css_urls, tokenize_css, CssToken, TokenCategory};
pub use links::{extract_links, ParsedLink};
pub use metadata::{
    extract_open_graph_info, extract_page_info, extract_seo_info, OpenGraphInfo, PageInfo,
    SeoInfo,
};
