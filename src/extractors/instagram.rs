use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::TranscriptExtractor;
use crate::backend::{first_item, JobBackend};
use crate::classifier::Platform;
use crate::config::InstagramConfig;
use crate::record::{ResultRecord, TranscriptSource};
use crate::utils::join_text;
use crate::{Result, TranscriptError};

/// Target languages the transcriber actor accepts
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "Arabic",
    "Chinese",
    "Dutch",
    "English",
    "French",
    "German",
    "Hindi",
    "Indonesian",
    "Italian",
    "Japanese",
    "Korean",
    "Polish",
    "Portuguese",
    "Russian",
    "Spanish",
    "Swedish",
    "Thai",
    "Turkish",
    "Ukrainian",
    "Vietnamese",
];

const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("ara", "Arabic"),
    ("zh", "Chinese"),
    ("zho", "Chinese"),
    ("chi", "Chinese"),
    ("nl", "Dutch"),
    ("nld", "Dutch"),
    ("en", "English"),
    ("eng", "English"),
    ("fr", "French"),
    ("fra", "French"),
    ("fre", "French"),
    ("de", "German"),
    ("deu", "German"),
    ("ger", "German"),
    ("hi", "Hindi"),
    ("hin", "Hindi"),
    ("id", "Indonesian"),
    ("ind", "Indonesian"),
    ("it", "Italian"),
    ("ita", "Italian"),
    ("ja", "Japanese"),
    ("jpn", "Japanese"),
    ("ko", "Korean"),
    ("kor", "Korean"),
    ("pl", "Polish"),
    ("pol", "Polish"),
    ("pt", "Portuguese"),
    ("por", "Portuguese"),
    ("ru", "Russian"),
    ("rus", "Russian"),
    ("es", "Spanish"),
    ("spa", "Spanish"),
    ("sv", "Swedish"),
    ("swe", "Swedish"),
    ("th", "Thai"),
    ("tha", "Thai"),
    ("tr", "Turkish"),
    ("tur", "Turkish"),
    ("uk", "Ukrainian"),
    ("ukr", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("vie", "Vietnamese"),
];

/// Map a language name or ISO code onto a supported language name
pub fn normalize_language(language: &str) -> std::result::Result<&'static str, TranscriptError> {
    let wanted = language.trim().to_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|name| name.to_lowercase() == wanted)
        .or_else(|| {
            LANGUAGE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == wanted)
                .map(|(_, name)| *name)
        })
        .ok_or_else(|| {
            TranscriptError::Validation(format!(
                "Unsupported target language '{}'. Supported values: {}",
                language.trim(),
                SUPPORTED_LANGUAGES.join(", ")
            ))
        })
}

/// Instagram extractor using a universal video transcriber actor
pub struct InstagramExtractor {
    backend: Arc<dyn JobBackend>,
    actor_id: String,
    target_language: Option<String>,
}

impl InstagramExtractor {
    pub fn new(backend: Arc<dyn JobBackend>, actor_id: impl Into<String>) -> Self {
        Self {
            backend,
            actor_id: actor_id.into(),
            target_language: None,
        }
    }

    pub fn from_config(backend: Arc<dyn JobBackend>, config: &InstagramConfig) -> Self {
        Self::new(backend, &config.actor_id).with_target_language(config.target_language.clone())
    }

    /// Ask the transcriber to translate into this language (validated at extraction time)
    pub fn with_target_language(mut self, language: Option<String>) -> Self {
        self.target_language = language;
        self
    }

    async fn try_extract(&self, url: &str) -> Result<ResultRecord> {
        let mut input = json!({ "start_urls": url });
        if let Some(language) = &self.target_language {
            input["target_language"] = json!(normalize_language(language)?);
        }

        let item = first_item(self.backend.as_ref(), &self.actor_id, input)
            .await
            .map_err(|e| {
                TranscriptError::Backend(format!("Failed to start Instagram transcription: {e:#}"))
            })?
            .ok_or_else(|| {
                TranscriptError::NoData("No transcription data returned from Apify.".to_string())
            })?;

        let metadata = metadata(&item);
        let reason = non_empty_str(&item, "error");

        // The transcriber reports failures through `status`, with the reason in `error` or `transcript`
        if let Some(status) = item.get("status").and_then(Value::as_str) {
            if status != "success" {
                tracing::debug!("Transcriber returned status {}", status);
                let message = reason
                    .or_else(|| non_empty_str(&item, "transcript"))
                    .unwrap_or("Unknown transcription error");
                return Ok(ResultRecord::error_with_metadata(
                    Platform::Instagram,
                    url,
                    message,
                    metadata,
                ));
            }
        }

        if let Some(error) = reason {
            return Ok(ResultRecord::error_with_metadata(
                Platform::Instagram,
                url,
                error,
                metadata,
            ));
        }

        Ok(ResultRecord::transcript(
            Platform::Instagram,
            url,
            primary_text(&item).unwrap_or_default(),
            TranscriptSource::Api,
            metadata,
        ))
    }
}

fn non_empty_str<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// First non-empty transcript candidate in the backend item
fn primary_text(item: &Value) -> Option<String> {
    ["source_transcript", "target_transcript"]
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(structured_text)
        .or_else(|| {
            ["text", "transcript", "translated_text"]
                .iter()
                .filter_map(|key| item.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(str::to_string)
        })
}

/// Text of a `{text, segments: [{text}]}` transcript object
fn structured_text(transcript: &Value) -> Option<String> {
    if let Some(text) = transcript
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        return Some(text.to_string());
    }

    let segments = transcript.get("segments")?.as_array()?;
    let joined = join_text(
        segments
            .iter()
            .filter_map(|segment| segment.get("text").and_then(Value::as_str)),
    );
    (!joined.is_empty()).then_some(joined)
}

fn metadata(item: &Value) -> Map<String, Value> {
    let mut metadata = Map::new();
    for (key, source) in [
        ("detected_language", "detected_language"),
        ("duration_sec", "durationSec"),
        ("video_id", "videoId"),
        ("timestamp", "timestamp"),
    ] {
        if let Some(value) = item.get(source).filter(|v| !v.is_null()) {
            metadata.insert(key.into(), value.clone());
        }
    }
    metadata.insert("raw".into(), item.clone());
    metadata
}

#[async_trait]
impl TranscriptExtractor for InstagramExtractor {
    async fn extract(&self, url: &str) -> ResultRecord {
        tracing::info!("Processing Instagram URL: {}", url);

        match self.try_extract(url).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Error extracting Instagram content: {:#}", e);
                ResultRecord::error(Platform::Instagram, url, format!("{e:#}"))
            }
        }
    }

    fn platform(&self) -> Platform {
        Platform::Instagram
    }
}
