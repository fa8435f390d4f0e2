use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classifier::Platform;

/// Outcome of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
    NoTranscript,
    Skipped,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Error => write!(f, "error"),
            Status::NoTranscript => write!(f, "no_transcript"),
            Status::Skipped => write!(f, "skipped"),
        }
    }
}

/// Where the transcript text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    /// Structured transcript returned by an API
    Api,
    /// Caption snippets embedded in the scraped item
    Inline,
    /// Downloaded WebVTT subtitle file
    Vtt,
    None,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Api => write!(f, "api"),
            TranscriptSource::Inline => write!(f, "inline"),
            TranscriptSource::Vtt => write!(f, "vtt"),
            TranscriptSource::None => write!(f, "none"),
        }
    }
}

/// Normalized result shared by every extractor.
///
/// Records are only built through the constructors below, which keep the
/// status, text and error fields consistent with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub platform: Platform,
    pub url: String,
    pub status: Status,
    pub text: String,
    pub transcript_source: TranscriptSource,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    /// Record for a fetched transcript. Blank text is reported as `no_transcript`.
    pub fn transcript(
        platform: Platform,
        url: &str,
        text: String,
        source: TranscriptSource,
        metadata: Map<String, Value>,
    ) -> Self {
        if text.trim().is_empty() {
            return Self::no_transcript(platform, url, "Transcript text was empty", metadata);
        }

        Self {
            platform,
            url: url.to_string(),
            status: Status::Success,
            text,
            transcript_source: source,
            metadata,
            error: None,
        }
    }

    pub fn no_transcript(
        platform: Platform,
        url: &str,
        reason: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self::failure(platform, url, Status::NoTranscript, reason.into(), metadata)
    }

    pub fn error(platform: Platform, url: &str, message: impl Into<String>) -> Self {
        Self::failure(platform, url, Status::Error, message.into(), Map::new())
    }

    /// Error record that still carries whatever metadata was gathered
    pub fn error_with_metadata(
        platform: Platform,
        url: &str,
        message: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self::failure(platform, url, Status::Error, message.into(), metadata)
    }

    pub fn skipped(platform: Platform, url: &str, reason: impl Into<String>) -> Self {
        Self::failure(platform, url, Status::Skipped, reason.into(), Map::new())
    }

    fn failure(
        platform: Platform,
        url: &str,
        status: Status,
        error: String,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            platform,
            url: url.to_string(),
            status,
            text: String::new(),
            transcript_source: TranscriptSource::None,
            metadata,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
