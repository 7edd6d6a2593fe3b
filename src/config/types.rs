use serde::Deserialize;

/// Main configuration structure for Crawlsheet
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

/// Crawl engine behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of primary pages to request
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum link depth from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-pages-open")]
    pub max_concurrent_pages_open: u32,

    /// Minimum time between request starts (milliseconds)
    #[serde(rename = "minimum-time-on-page")]
    pub minimum_time_on_page: u64,

    /// Whether robots.txt is fetched and honoured
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_depth: 10,
            max_concurrent_pages_open: 4,
            minimum_time_on_page: 250,
            respect_robots: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Crawlsheet".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/crawlsheet".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Aggregation pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Buffered record count that triggers a flush to the sink
    #[serde(rename = "flush-threshold")]
    pub flush_threshold: usize,

    /// Attempts made for each secondary link before giving up
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Wait between attempts when the status is retryable (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// HTTP statuses that trigger the backoff wait
    #[serde(rename = "retryable-statuses")]
    pub retryable_statuses: Vec<u16>,

    /// Disallow reasons (prefixes) that produce no record at all
    #[serde(rename = "ignored-disallow-reasons")]
    pub ignored_disallow_reasons: Vec<String>,

    /// Maximum number of secondary links resolved at once
    #[serde(rename = "max-concurrent-resolves")]
    pub max_concurrent_resolves: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 100,
            retry_attempts: 3,
            retry_backoff_ms: 2000,
            retryable_statuses: vec![502, 503],
            ignored_disallow_reasons: vec![
                "data:application".to_string(),
                "data:image".to_string(),
            ],
            max_concurrent_resolves: 8,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the result file; `{host}.csv` in the working directory when unset
    pub path: Option<String>,

    /// Replace the result file if it already exists
    pub overwrite: bool,
}
