//! Pipeline wiring
//!
//! `Pipeline` owns one instance of each component and consumes crawl events
//! from a channel. Every event is handled in its own task; every secondary
//! link of an admitted page is resolved in its own task, bounded by a
//! semaphore. When the channel closes and all tasks finish, the buffer is
//! drained exactly once.

use crate::config::PipelineConfig;
use crate::pipeline::aggregator::ResultAggregator;
use crate::pipeline::buffer::ResultBuffer;
use crate::pipeline::dedup::Deduplicator;
use crate::pipeline::events::CrawlEvent;
use crate::pipeline::progress::{ProgressObserver, ProgressSnapshot};
use crate::pipeline::resolver::{ResolverSettings, SecondaryLinkResolver, Transport};
use crate::sink::PersistenceSink;
use crate::url::{asset_key, page_key};
use crate::CrawlsheetError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Pipeline tuning derived from `[pipeline]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub flush_threshold: usize,
    pub max_concurrent_resolves: usize,
    pub ignored_disallow_reasons: Vec<String>,
    pub resolver: ResolverSettings,
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            flush_threshold: config.flush_threshold,
            max_concurrent_resolves: config.max_concurrent_resolves,
            ignored_disallow_reasons: config.ignored_disallow_reasons.clone(),
            resolver: ResolverSettings::from(config),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Totals for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Primary page events received
    pub pages: u64,

    /// Secondary links admitted for resolution
    pub secondary_links: u64,

    /// Records rejected by the deduplicator
    pub duplicates: u64,

    /// Disallowances dropped because of their reason
    pub ignored_disallows: u64,

    /// Records carrying an error text
    pub failures: u64,

    pub records_written: u64,
    pub batches: u64,
}

impl RunSummary {
    /// Prints the summary to stdout
    pub fn print(&self) {
        println!("=== Crawl Summary ===\n");
        println!("  Pages processed:     {}", self.pages);
        println!("  Secondary links:     {}", self.secondary_links);
        println!("  Duplicates skipped:  {}", self.duplicates);
        println!("  Ignored disallows:   {}", self.ignored_disallows);
        println!("  Failed resources:    {}", self.failures);
        println!("  Records written:     {}", self.records_written);
        println!("  Batches flushed:     {}", self.batches);
        println!();
    }
}

#[derive(Default)]
struct Counters {
    pages: AtomicU64,
    secondary_links: AtomicU64,
    duplicates: AtomicU64,
    ignored_disallows: AtomicU64,
    failures: AtomicU64,
}

struct Shared<T> {
    aggregator: ResultAggregator,
    dedup: Deduplicator,
    resolver: SecondaryLinkResolver<T>,
    buffer: ResultBuffer,
    resolve_permits: Semaphore,
    observer: Arc<dyn ProgressObserver>,
    counters: Counters,
}

/// The aggregation pipeline
pub struct Pipeline<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport + 'static> Pipeline<T> {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `settings` - Thresholds and retry policy
    /// * `transport` - Fetches secondary links
    /// * `sink` - Receives flushed batches
    /// * `observer` - Receives progress counters
    pub fn new(
        settings: PipelineSettings,
        transport: T,
        sink: Box<dyn PersistenceSink>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                aggregator: ResultAggregator::new(&settings.ignored_disallow_reasons),
                dedup: Deduplicator::new(),
                resolver: SecondaryLinkResolver::new(transport, settings.resolver),
                buffer: ResultBuffer::new(sink, settings.flush_threshold),
                resolve_permits: Semaphore::new(settings.max_concurrent_resolves.max(1)),
                observer,
                counters: Counters::default(),
            }),
        }
    }

    /// Handles one crawl event
    ///
    /// Builds the page record, admits it through the deduplicator, buffers it
    /// and then resolves the page's secondary links concurrently. Returns
    /// once every secondary record is buffered; the progress snapshot is sent
    /// at that point so its buffer depth includes them.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The event is fully processed (per-page failures included)
    /// * `Err(CrawlsheetError)` - A flush failed
    pub async fn handle(&self, event: CrawlEvent) -> crate::Result<()> {
        let shared = &self.shared;
        let pages = shared.counters.pages.fetch_add(1, Ordering::Relaxed) + 1;

        let Some(page) = shared.aggregator.build_record(event) else {
            shared
                .counters
                .ignored_disallows
                .fetch_add(1, Ordering::Relaxed);
            self.report(pages);
            return Ok(());
        };

        if !shared.dedup.try_mark(page_key(&page.record.url)) {
            tracing::debug!("Skipping duplicate page {}", page.record.url);
            shared.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            self.report(pages);
            return Ok(());
        }

        if page.record.has_error() {
            shared.counters.failures.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            "Recorded {} ({}), {} secondary links",
            page.record.url,
            page.record.http_status,
            page.links.len()
        );
        shared.buffer.add(page.record)?;

        let mut resolves = JoinSet::new();
        for link in page.links {
            if !shared.dedup.try_mark(asset_key(&link.url)) {
                shared.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            shared
                .counters
                .secondary_links
                .fetch_add(1, Ordering::Relaxed);

            let pipeline = self.clone();
            resolves.spawn(async move { pipeline.resolve_link(link).await });
        }

        while let Some(done) = resolves.join_next().await {
            if let Err(e) = done? {
                resolves.abort_all();
                return Err(e);
            }
        }

        self.report(pages);
        Ok(())
    }

    /// Consumes events until the sender closes, then drains the buffer
    ///
    /// The first flush failure aborts all in-flight work and is returned
    /// without draining.
    pub async fn run(self, mut events: mpsc::Receiver<CrawlEvent>) -> crate::Result<RunSummary> {
        let mut tasks: JoinSet<crate::Result<()>> = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let pipeline = self.clone();
                        tasks.spawn(async move { pipeline.handle(event).await });
                    }
                    None => break,
                },
                Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = flatten(done) {
                        tasks.abort_all();
                        return Err(e);
                    }
                }
            }
        }

        while let Some(done) = tasks.join_next().await {
            if let Err(e) = flatten(done) {
                tasks.abort_all();
                return Err(e);
            }
        }

        self.shared.buffer.drain()?;

        let summary = self.summary();
        tracing::info!(
            "Pipeline finished: {} records in {} batches",
            summary.records_written,
            summary.batches
        );
        Ok(summary)
    }

    /// Current totals
    pub fn summary(&self) -> RunSummary {
        let counters = &self.shared.counters;
        let stats = self.shared.buffer.stats();

        RunSummary {
            pages: counters.pages.load(Ordering::Relaxed),
            secondary_links: counters.secondary_links.load(Ordering::Relaxed),
            duplicates: counters.duplicates.load(Ordering::Relaxed),
            ignored_disallows: counters.ignored_disallows.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
            records_written: stats.records_written,
            batches: stats.batches_flushed,
        }
    }

    /// Number of distinct dedup keys admitted so far
    pub fn distinct_keys(&self) -> usize {
        self.shared.dedup.len()
    }

    async fn resolve_link(&self, link: crate::extract::ParsedLink) -> crate::Result<()> {
        let shared = &self.shared;
        // The semaphore is never closed
        let Ok(_permit) = shared.resolve_permits.acquire().await else {
            return Ok(());
        };

        let resolution = shared.resolver.resolve(&link).await;
        if resolution.record.has_error() {
            shared.counters.failures.fetch_add(1, Ordering::Relaxed);
        }
        if !resolution.css_urls.is_empty() {
            tracing::info!(
                "{} references {} embedded URLs",
                link.url,
                resolution.css_urls.len()
            );
        }

        shared.buffer.add(resolution.record)?;
        Ok(())
    }

    fn report(&self, pages_crawled: u64) {
        self.shared.observer.on_progress(ProgressSnapshot {
            pages_crawled,
            buffer_depth: self.shared.buffer.depth(),
        });
    }
}

fn flatten(
    done: Result<crate::Result<()>, tokio::task::JoinError>,
) -> Result<(), CrawlsheetError> {
    done?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::events::{PageCompletion, PageDisallowance};
    use crate::pipeline::progress::NoProgress;
    use crate::pipeline::record::ResultRecord;
    use crate::pipeline::resolver::{Fetched, TransportResult};
    use crate::sink::SinkResult;
    use std::future::Future;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemorySink {
        records: Arc<Mutex<Vec<ResultRecord>>>,
    }

    impl PersistenceSink for MemorySink {
        fn append_batch(&mut self, records: &[ResultRecord]) -> SinkResult<()> {
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(())
        }
    }

    /// Serves a tiny body for every URL
    struct OkTransport;

    impl Transport for OkTransport {
        fn fetch<'a>(
            &'a self,
            _url: &'a str,
        ) -> impl Future<Output = TransportResult<Fetched>> + Send + 'a {
            async {
                Ok(Fetched {
                    status: 200,
                    elapsed_millis: 1,
                    bytes: b"ok".to_vec(),
                })
            }
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        updates: Mutex<Vec<ProgressSnapshot>>,
    }

    impl ProgressObserver for CountingObserver {
        fn on_progress(&self, snapshot: ProgressSnapshot) {
            self.updates.lock().unwrap().push(snapshot);
        }
    }

    fn settings(threshold: usize) -> PipelineSettings {
        PipelineSettings {
            flush_threshold: threshold,
            ..PipelineSettings::default()
        }
    }

    fn html_page(url: &str, body: &str) -> CrawlEvent {
        let mut completion = PageCompletion::responded(url, None, 200);
        completion.body = Some(body.as_bytes().to_vec());
        completion.content_type = Some("text/html".to_string());
        CrawlEvent::PageCompleted(completion)
    }

    #[tokio::test]
    async fn test_duplicate_pages_recorded_once() {
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(
            settings(2),
            OkTransport,
            Box::new(sink.clone()),
            Arc::new(NoProgress),
        );

        let (tx, rx) = mpsc::channel(16);
        for url in [
            "https://example.com/a",
            "https://EXAMPLE.com/a",
            "https://example.com/a#frag",
            "https://example.com/b",
        ] {
            tx.send(html_page(url, "<html></html>")).await.unwrap();
        }
        drop(tx);

        let summary = pipeline.run(rx).await.unwrap();

        let records = sink.records.lock().unwrap();
        let mut urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        urls.sort();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(summary.pages, 4);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.records_written, 2);
    }

    #[tokio::test]
    async fn test_progress_depth_includes_secondary_records() {
        let sink = MemorySink::default();
        let observer = Arc::new(CountingObserver::default());
        let pipeline = Pipeline::new(
            settings(100),
            OkTransport,
            Box::new(sink.clone()),
            observer.clone(),
        );

        let body = r#"<img src="/a.png"><img src="/b.png"><script src="/c.js"></script>"#;
        pipeline
            .handle(html_page("https://example.com/", body))
            .await
            .unwrap();

        let updates = observer.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].pages_crawled, 1);
        assert_eq!(updates[0].buffer_depth, 4);
    }

    #[tokio::test]
    async fn test_secondary_links_resolved_once() {
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(
            settings(100),
            OkTransport,
            Box::new(sink.clone()),
            Arc::new(NoProgress),
        );

        let body = r#"<img src="/logo.png"><script src="/app.js?v=1"></script>"#;
        let (tx, rx) = mpsc::channel(16);
        tx.send(html_page("https://example.com/one", body)).await.unwrap();
        tx.send(html_page("https://example.com/two", body)).await.unwrap();
        drop(tx);

        let summary = pipeline.run(rx).await.unwrap();

        assert_eq!(summary.secondary_links, 2);
        assert_eq!(summary.records_written, 4);
        assert_eq!(summary.batches, 1);

        let records = sink.records.lock().unwrap();
        let logo = records
            .iter()
            .find(|r| r.url == "https://example.com/logo.png")
            .unwrap();
        assert_eq!(logo.http_status, 200);
        assert_eq!(logo.size_bytes, 2);
        assert!(logo.referer.is_some());
    }

    #[tokio::test]
    async fn test_ignored_disallow_consumes_no_key() {
        let sink = MemorySink::default();
        let observer = Arc::new(CountingObserver::default());
        let pipeline = Pipeline::new(
            settings(10),
            OkTransport,
            Box::new(sink.clone()),
            observer.clone(),
        );

        pipeline
            .handle(CrawlEvent::PageDisallowed(PageDisallowance {
                url: "https://example.com/img".to_string(),
                referer: None,
                reason: "data:image".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(pipeline.distinct_keys(), 0);

        pipeline
            .handle(CrawlEvent::PageDisallowed(PageDisallowance {
                url: "https://example.com/private".to_string(),
                referer: None,
                reason: "robots.txt".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(pipeline.distinct_keys(), 1);

        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let summary = pipeline.clone().run(rx).await.unwrap();
        assert_eq!(summary.ignored_disallows, 1);
        assert_eq!(summary.failures, 1);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].http_status, 500);
        assert_eq!(records[0].error_text, "robots.txt");
        assert_eq!(observer.updates.lock().unwrap().len(), 2);
    }
}
