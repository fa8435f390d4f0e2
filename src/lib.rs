//! Social Transcript - A Rust CLI tool for pulling transcripts of social media videos
//!
//! This library classifies YouTube, Instagram and TikTok URLs and hands them to
//! platform extractors that fetch the spoken text through external services.

pub mod backend;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod orchestrator;
pub mod output;
pub mod record;
pub mod transcript;
pub mod utils;

pub use backend::{ActorRun, ApifyClient, JobBackend};
pub use classifier::{classify, Platform};
pub use cli::Cli;
pub use config::Config;
pub use extractors::{ExtractorRegistry, TranscriptExtractor};
pub use orchestrator::Orchestrator;
pub use record::{ResultRecord, Status, TranscriptSource};
pub use transcript::{FetchedTranscript, TranscriptFetcher, YoutubeTranscriptClient};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to transcript extraction
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("No data returned: {0}")]
    NoData(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}
