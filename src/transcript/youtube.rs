use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::{FetchedTranscript, Segment, TranscriptFetcher};
use crate::config::YoutubeConfig;
use crate::{Result, TranscriptError};

static API_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap());

static TEXT_ELEMENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("text").unwrap());

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    name: TrackName,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn display_name(&self) -> String {
        match &self.name.simple_text {
            Some(text) => text.clone(),
            None if !self.name.runs.is_empty() => {
                self.name.runs.iter().map(|run| run.text.as_str()).collect()
            }
            None => self.language_code.clone(),
        }
    }
}

/// Caption fetcher using YouTube's watch page and innertube player API
pub struct YoutubeTranscriptClient {
    client: Client,
    base_url: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptClient {
    pub fn new(base_url: impl Into<String>, languages: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            languages,
        })
    }

    pub fn from_config(config: &YoutubeConfig) -> Result<Self> {
        Self::new(&config.base_url, config.languages.clone())
    }

    /// Scrape the innertube API key from the watch page
    async fn innertube_api_key(&self, video_id: &str) -> Result<String> {
        let html = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US")
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Failed to load watch page: {e}")))?
            .error_for_status()
            .map_err(|e| TranscriptError::Backend(format!("Failed to load watch page: {e}")))?
            .text()
            .await?;

        if let Some(caps) = API_KEY.captures(&html) {
            return Ok(caps[1].to_string());
        }

        if html.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::Backend(
                "YouTube is blocking requests from this IP (captcha required)".to_string(),
            )
            .into());
        }

        Err(TranscriptError::Backend(format!(
            "Could not find an innertube API key for video {video_id}"
        ))
        .into())
    }

    async fn caption_tracks(&self, video_id: &str, api_key: &str) -> Result<Vec<CaptionTrack>> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let player: Value = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Player request failed: {e}")))?
            .error_for_status()
            .map_err(|e| TranscriptError::Backend(format!("Player request failed: {e}")))?
            .json()
            .await
            .context("Failed to decode player response")?;

        if let Some(status) = player.pointer("/playabilityStatus/status").and_then(Value::as_str) {
            if status != "OK" {
                let reason = player
                    .pointer("/playabilityStatus/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("no reason given");
                return Err(TranscriptError::Backend(format!(
                    "Video {video_id} is unplayable ({status}): {reason}"
                ))
                .into());
            }
        }

        let tracks = player
            .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
            .cloned()
            .ok_or_else(|| {
                TranscriptError::NoData(format!("Transcripts are disabled for video {video_id}"))
            })?;

        serde_json::from_value(tracks).context("Failed to decode caption tracks")
    }

    /// Pick a track for the first preferred language, manual captions before generated ones
    fn select_track<'a>(&self, tracks: &'a [CaptionTrack]) -> Result<&'a CaptionTrack> {
        for language in &self.languages {
            let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
            let manual = candidates.clone().find(|t| !t.is_generated());
            if let Some(track) = manual.or_else(|| candidates.next()) {
                return Ok(track);
            }
        }

        let available: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
        Err(TranscriptError::NoData(format!(
            "No transcript found for languages [{}]; available: [{}]",
            self.languages.join(", "),
            available.join(", ")
        ))
        .into())
    }

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>> {
        let url = track.base_url.replace("&fmt=srv3", "");

        let xml = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Caption download failed: {e}")))?
            .error_for_status()
            .map_err(|e| TranscriptError::Backend(format!("Caption download failed: {e}")))?
            .text()
            .await?;

        Ok(parse_timed_text(&xml))
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptClient {
    async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        let api_key = self.innertube_api_key(video_id).await?;
        let tracks = self.caption_tracks(video_id, &api_key).await?;
        let track = self.select_track(&tracks)?;

        tracing::debug!(
            "Using caption track {} (generated: {})",
            track.language_code,
            track.is_generated()
        );

        let segments = self.fetch_segments(track).await?;

        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            language: track.display_name(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated(),
            segments,
        })
    }
}

/// Decode a timed-text document (`<text start=".." dur="..">..</text>` elements)
pub fn parse_timed_text(xml: &str) -> Vec<Segment> {
    let document = Html::parse_fragment(xml);

    document
        .select(&TEXT_ELEMENT)
        .filter_map(|element| {
            let attr = |name: &str| {
                element
                    .value()
                    .attr(name)
                    .and_then(|value| value.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };

            let raw: String = element.text().collect();
            let text = strip_markup(&raw);
            if text.is_empty() {
                return None;
            }

            Some(Segment {
                text,
                start: attr("start"),
                duration: attr("dur"),
            })
        })
        .collect()
}

// Caption text is escaped twice, so one more pass decodes entities and drops inline tags.
fn strip_markup(text: &str) -> String {
    let decoded = if text.contains('&') || text.contains('<') {
        Html::parse_fragment(text).root_element().text().collect()
    } else {
        text.to_string()
    };

    MARKUP
        .replace_all(&decoded, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
