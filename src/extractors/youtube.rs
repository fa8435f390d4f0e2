use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::{Arc, LazyLock};

use super::TranscriptExtractor;
use crate::classifier::Platform;
use crate::record::{ResultRecord, TranscriptSource};
use crate::transcript::{FetchedTranscript, TranscriptFetcher};
use crate::utils::join_text;
use crate::{Result, TranscriptError};

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|embed/|v/|shorts/|live/)([^&\n?#/]+)").unwrap()
});

/// Pull the video id out of the known YouTube URL shapes
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID.captures(url).map(|caps| caps[1].to_string())
}

/// YouTube extractor backed by a caption fetcher
pub struct YoutubeExtractor {
    fetcher: Arc<dyn TranscriptFetcher>,
}

impl YoutubeExtractor {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        Self { fetcher }
    }

    async fn try_extract(&self, url: &str) -> Result<ResultRecord> {
        let video_id = extract_video_id(url).ok_or_else(|| {
            TranscriptError::Input("Could not extract video ID from URL".to_string())
        })?;
        tracing::info!("Extracted video ID: {}", video_id);

        let transcript = self.fetcher.fetch(&video_id).await?;
        let text = join_text(transcript.segments.iter().map(|s| s.text.as_str()));

        Ok(ResultRecord::transcript(
            Platform::Youtube,
            url,
            text,
            TranscriptSource::Api,
            metadata(&video_id, &transcript),
        ))
    }
}

fn metadata(video_id: &str, transcript: &FetchedTranscript) -> Map<String, Value> {
    let segments: Vec<Value> = transcript
        .segments
        .iter()
        .map(|segment| {
            json!({
                "text": segment.text,
                "start_time": segment.start,
                "duration": segment.duration,
                "end_time": segment.end(),
            })
        })
        .collect();

    let mut metadata = Map::new();
    metadata.insert("id".into(), json!(video_id));
    metadata.insert("language".into(), json!(transcript.language));
    metadata.insert("language_code".into(), json!(transcript.language_code));
    metadata.insert("is_generated".into(), json!(transcript.is_generated));
    metadata.insert("segments".into(), Value::Array(segments));
    metadata
}

#[async_trait]
impl TranscriptExtractor for YoutubeExtractor {
    async fn extract(&self, url: &str) -> ResultRecord {
        tracing::info!("Processing YouTube URL: {}", url);

        match self.try_extract(url).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Error extracting YouTube content: {:#}", e);
                ResultRecord::error(Platform::Youtube, url, format!("{e:#}"))
            }
        }
    }

    fn platform(&self) -> Platform {
        Platform::Youtube
    }
}
