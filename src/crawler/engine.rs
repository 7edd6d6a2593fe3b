//! Same-host crawl engine
//!
//! Breadth-first crawl of one site that reports every page it fetches or
//! declines as a `CrawlEvent`. This module handles:
//! - Scheduling pages in BFS order within the depth and page limits
//! - Politeness: a minimum delay between request starts, raised to the
//!   robots.txt crawl delay when that is longer
//! - Keeping at most `max_concurrent_pages_open` requests in flight
//! - Reporting robots.txt and `data:` refusals as disallowances

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::fetch_page;
use crate::crawler::parser::{extract_anchor_targets, AnchorTarget};
use crate::pipeline::{CrawlEvent, PageCompletion, PageDisallowance};
use crate::robots::{fetch_robots, is_allowed, RobotsRules, ROBOTS_DISALLOW_REASON};
use crate::url::{canonicalize_url, page_key, same_host, DedupKey};
use crate::CrawlsheetError;
use reqwest::Client;
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use url::Url;

/// Totals for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages that produced a response
    pub pages_fetched: u64,

    /// Pages that produced no response
    pub pages_failed: u64,

    /// Pages refused because of robots.txt
    pub robots_disallowed: u64,

    /// `data:` anchors reported as disallowed
    pub data_links: u64,

    /// Same-host links dropped by the depth or page limits
    pub links_over_limit: u64,
}

/// A page waiting to be fetched
#[derive(Debug, Clone)]
struct QueuedPage {
    url: Url,
    depth: u32,
    referer: Option<String>,
}

/// Crawls one site and streams crawl events
pub struct SiteCrawler {
    config: CrawlerConfig,
    agent_token: String,
    client: Client,
}

impl SiteCrawler {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Full configuration; `[crawler]` and `[user-agent]` are used
    /// * `client` - HTTP client, usually from `build_http_client`
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            config: config.crawler.clone(),
            agent_token: config.user_agent.crawler_name.clone(),
            client,
        }
    }

    /// Crawls the site of `start_url`
    ///
    /// Returns when the frontier is exhausted or the page limit is reached.
    /// The sender is dropped on return, which closes the pipeline's channel.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The crawl finished
    /// * `Err(CrawlsheetError)` - The start URL is invalid or the pipeline
    ///   stopped receiving events
    pub async fn crawl(
        &self,
        start_url: &str,
        events: mpsc::Sender<CrawlEvent>,
    ) -> crate::Result<CrawlStats> {
        let start = canonicalize_url(start_url)?;
        let mut stats = CrawlStats::default();

        let robots = if self.config.respect_robots {
            fetch_robots(&self.client, &start).await
        } else {
            RobotsRules::allow_all()
        };
        let delay = self.politeness_delay(&robots);

        tracing::info!(
            "Crawling {} (max {} pages, depth {}, {:?} between requests)",
            start,
            self.config.max_pages,
            self.config.max_depth,
            delay
        );

        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut queue: VecDeque<QueuedPage> = VecDeque::new();
        let mut scheduled: u32 = 0;

        seen.insert(page_key(start.as_str()));
        if self.admit(&robots, &start, None, &events, &mut stats).await? {
            queue.push_back(QueuedPage {
                url: start.clone(),
                depth: 0,
                referer: None,
            });
            scheduled += 1;
        }

        let max_open = self.config.max_concurrent_pages_open.max(1) as usize;
        let mut in_flight: JoinSet<(PageCompletion, u32, Vec<AnchorTarget>)> = JoinSet::new();
        let mut last_start: Option<Instant> = None;

        loop {
            while in_flight.len() < max_open {
                let Some(page) = queue.pop_front() else {
                    break;
                };

                if let Some(last) = last_start {
                    tokio::time::sleep_until(last + delay).await;
                }
                last_start = Some(Instant::now());

                tracing::debug!("Fetching {} (depth {})", page.url, page.depth);
                let client = self.client.clone();
                in_flight.spawn(async move {
                    let completion =
                        fetch_page(&client, page.url.as_str(), page.referer.clone()).await;
                    let targets = discover_targets(&completion, &page.url);
                    (completion, page.depth, targets)
                });
            }

            let Some(done) = in_flight.join_next().await else {
                break;
            };
            let (completion, depth, targets) = done?;

            if completion.http_status.is_some() {
                stats.pages_fetched += 1;
            } else {
                stats.pages_failed += 1;
            }
            let referer = completion.url.clone();
            send(&events, CrawlEvent::PageCompleted(completion)).await?;

            for target in targets {
                match target {
                    AnchorTarget::DataUri { url, reason } => {
                        if !seen.insert(page_key(&url)) {
                            continue;
                        }
                        stats.data_links += 1;
                        let disallowance = PageDisallowance {
                            url,
                            referer: Some(referer.clone()),
                            reason,
                        };
                        send(&events, CrawlEvent::PageDisallowed(disallowance)).await?;
                    }
                    AnchorTarget::Page(url) => {
                        if !same_host(&url, &start) || !seen.insert(page_key(url.as_str())) {
                            continue;
                        }
                        if depth >= self.config.max_depth || scheduled >= self.config.max_pages {
                            stats.links_over_limit += 1;
                            continue;
                        }
                        if self
                            .admit(&robots, &url, Some(&referer), &events, &mut stats)
                            .await?
                        {
                            queue.push_back(QueuedPage {
                                url,
                                depth: depth + 1,
                                referer: Some(referer.clone()),
                            });
                            scheduled += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Crawl finished: {} pages fetched, {} failed, {} disallowed by robots.txt",
            stats.pages_fetched,
            stats.pages_failed,
            stats.robots_disallowed
        );

        Ok(stats)
    }

    /// Checks robots.txt, reporting a disallowance if the page is blocked
    async fn admit(
        &self,
        robots: &RobotsRules,
        url: &Url,
        referer: Option<&str>,
        events: &mpsc::Sender<CrawlEvent>,
        stats: &mut CrawlStats,
    ) -> crate::Result<bool> {
        if is_allowed(robots, url, &self.agent_token) {
            return Ok(true);
        }

        tracing::debug!("Disallowed by robots.txt: {}", url);
        stats.robots_disallowed += 1;
        let disallowance = PageDisallowance {
            url: url.to_string(),
            referer: referer.map(str::to_string),
            reason: ROBOTS_DISALLOW_REASON.to_string(),
        };
        send(events, CrawlEvent::PageDisallowed(disallowance)).await?;
        Ok(false)
    }

    /// The longer of the configured delay and the robots.txt crawl delay
    fn politeness_delay(&self, robots: &RobotsRules) -> Duration {
        let configured = Duration::from_millis(self.config.minimum_time_on_page);
        let robots_delay = robots
            .crawl_delay(&self.agent_token)
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);

        configured.max(robots_delay)
    }
}

/// Parses an HTML response for anchor targets
fn discover_targets(completion: &PageCompletion, page_url: &Url) -> Vec<AnchorTarget> {
    let is_html = completion
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"));

    match (&completion.body, is_html) {
        (Some(body), true) => {
            let document = Html::parse_document(&String::from_utf8_lossy(body));
            extract_anchor_targets(&document, page_url)
        }
        _ => Vec::new(),
    }
}

async fn send(events: &mpsc::Sender<CrawlEvent>, event: CrawlEvent) -> crate::Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| CrawlsheetError::ChannelClosed)
}
