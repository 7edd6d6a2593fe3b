//! Configuration module for Crawlsheet
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the defaults documented
//! on each field.
//!
//! # Example
//!
//! ```no_run
//! use crawlsheet::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlsheet.toml")).unwrap();
//! println!("Flushing every {} records", config.pipeline.flush_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, PipelineConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
