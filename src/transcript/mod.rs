use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::YoutubeTranscriptClient;

use crate::Result;

/// Individual caption segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Captions for one video together with track metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedTranscript {
    pub video_id: String,

    /// Human readable track name, e.g. "English (auto-generated)"
    pub language: String,

    pub language_code: String,

    /// True for automatic speech recognition tracks
    pub is_generated: bool,

    pub segments: Vec<Segment>,
}

/// Fetches timed captions for a video id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript>;
}
