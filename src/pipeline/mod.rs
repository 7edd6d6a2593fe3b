//! Crawl result aggregation pipeline
//!
//! This module handles:
//! - Building result records from crawl events
//! - Deduplicating pages and secondary assets
//! - Resolving secondary links with bounded retry
//! - Buffering records and flushing them to a sink in ordered batches

pub mod aggregator;
pub mod buffer;
pub mod dedup;
pub mod events;
pub mod progress;
mod record;
pub mod resolver;
mod runner;

pub use aggregator::{AggregatedPage, ResultAggregator};
pub use buffer::{BufferStats, ResultBuffer};
pub use dedup::Deduplicator;
pub use events::{CrawlEvent, CrawledPage, PageCompletion, PageDisallowance, PageOutcome};
pub use progress::{NoProgress, ProgressObserver, ProgressSnapshot, TracingProgress};
pub use record::ResultRecord;
pub use resolver::{
    Fetched, Resolution, ResolverSettings, SecondaryLinkResolver, Transport, TransportError,
    TransportResult,
};
pub use runner::{Pipeline, PipelineSettings, RunSummary};
