use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::TranscriptExtractor;
use crate::backend::{first_item, JobBackend};
use crate::classifier::Platform;
use crate::config::TiktokConfig;
use crate::record::{ResultRecord, TranscriptSource};
use crate::utils::{join_text, parse_vtt};
use crate::{Result, TranscriptError};

/// TikTok extractor using a scraper actor that returns subtitles
pub struct TiktokExtractor {
    backend: Arc<dyn JobBackend>,
    actor_id: String,
    http: Client,
    subtitle_timeout: Duration,
}

impl TiktokExtractor {
    pub fn new(backend: Arc<dyn JobBackend>, actor_id: impl Into<String>) -> Self {
        Self {
            backend,
            actor_id: actor_id.into(),
            http: Client::new(),
            subtitle_timeout: Duration::from_secs(15),
        }
    }

    pub fn from_config(backend: Arc<dyn JobBackend>, config: &TiktokConfig) -> Self {
        Self::new(backend, &config.actor_id)
            .with_subtitle_timeout(Duration::from_secs(config.subtitle_timeout_secs))
    }

    pub fn with_subtitle_timeout(mut self, timeout: Duration) -> Self {
        self.subtitle_timeout = timeout;
        self
    }

    fn run_input(url: &str) -> Value {
        json!({
            "postURLs": [url],
            "resultsPerPage": 1,
            "shouldDownloadSubtitles": true,
            "shouldDownloadVideos": false,
            "proxyCountryCode": "None",
        })
    }

    async fn try_extract(&self, url: &str) -> Result<ResultRecord> {
        let Some(item) = first_item(self.backend.as_ref(), &self.actor_id, Self::run_input(url)).await?
        else {
            return Ok(ResultRecord::no_transcript(
                Platform::Tiktok,
                url,
                TranscriptError::NoData("the TikTok scraper returned no items".to_string()).to_string(),
                Map::new(),
            ));
        };

        let metadata = metadata(&item);

        let inline = inline_subtitles(&item);
        if !inline.is_empty() {
            return Ok(ResultRecord::transcript(
                Platform::Tiktok,
                url,
                inline,
                TranscriptSource::Inline,
                metadata,
            ));
        }

        match subtitle_link(&item) {
            Some(link) => {
                tracing::debug!("No inline subtitles, downloading {}", link);
                match self.download_subtitles(link).await {
                    Ok(vtt) => Ok(ResultRecord::transcript(
                        Platform::Tiktok,
                        url,
                        parse_vtt(&vtt),
                        TranscriptSource::Vtt,
                        metadata,
                    )),
                    Err(e) => Ok(ResultRecord::error_with_metadata(
                        Platform::Tiktok,
                        url,
                        format!("{e:#}"),
                        metadata,
                    )),
                }
            }
            None => Ok(ResultRecord::no_transcript(
                Platform::Tiktok,
                url,
                "The post has no subtitles",
                metadata,
            )),
        }
    }

    async fn download_subtitles(&self, link: &str) -> Result<String> {
        let response = self
            .http
            .get(link)
            .timeout(self.subtitle_timeout)
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Subtitle download failed: {e}")))?;

        if !response.status().is_success() {
            anyhow::bail!(TranscriptError::Backend(format!(
                "Subtitle download failed: HTTP {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

fn inline_subtitles(item: &Value) -> String {
    let snippets = item
        .get("subtitles")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    join_text(
        snippets
            .iter()
            .filter_map(|snippet| snippet.get("text").and_then(Value::as_str)),
    )
}

fn subtitle_link(item: &Value) -> Option<&str> {
    item.pointer("/videoMeta/subtitleLinks/0/downloadLink")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
}

fn metadata(item: &Value) -> Map<String, Value> {
    let mut metadata = Map::new();
    for (key, pointer) in [
        ("id", "/id"),
        ("author", "/authorMeta/name"),
        ("create_time", "/createTimeISO"),
        ("music", "/musicMeta/musicName"),
    ] {
        if let Some(value) = item.pointer(pointer).filter(|v| !v.is_null()) {
            metadata.insert(key.into(), value.clone());
        }
    }
    metadata
}

#[async_trait]
impl TranscriptExtractor for TiktokExtractor {
    async fn extract(&self, url: &str) -> ResultRecord {
        tracing::info!("Processing TikTok URL: {}", url);

        match self.try_extract(url).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Error extracting TikTok content: {:#}", e);
                ResultRecord::error(Platform::Tiktok, url, format!("{e:#}"))
            }
        }
    }

    fn platform(&self) -> Platform {
        Platform::Tiktok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActorRun, MockJobBackend};
    use crate::record::Status;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://vt.tiktok.com/XYZ/";

    fn backend_returning(items: Vec<Value>) -> MockJobBackend {
        let mut backend = MockJobBackend::new();
        backend
            .expect_call_actor()
            .withf(|actor_id: &str, input: &Value| {
                actor_id == "clockworks/tiktok-scraper"
                    && input["postURLs"][0] == URL
                    && input["shouldDownloadSubtitles"] == true
                    && input["shouldDownloadVideos"] == false
            })
            .times(1)
            .returning(|_, _| {
                Ok(ActorRun {
                    id: "run1".to_string(),
                    status: "SUCCEEDED".to_string(),
                    default_dataset_id: "ds1".to_string(),
                })
            });
        backend
            .expect_dataset_items()
            .withf(|dataset_id: &str| dataset_id == "ds1")
            .times(1)
            .returning(move |_| Ok(items.clone()));
        backend
    }

    fn extractor(backend: MockJobBackend) -> TiktokExtractor {
        TiktokExtractor::new(Arc::new(backend), "clockworks/tiktok-scraper")
    }

    #[tokio::test]
    async fn test_zero_items_is_no_transcript() {
        let record = extractor(backend_returning(vec![])).extract(URL).await;

        assert_eq!(record.status, Status::NoTranscript);
        assert_eq!(record.text, "");
        assert_eq!(record.transcript_source, TranscriptSource::None);
        assert_eq!(record.platform, Platform::Tiktok);
    }

    #[tokio::test]
    async fn test_inline_subtitles() {
        let item = json!({
            "id": "7234",
            "authorMeta": { "name": "someone" },
            "createTimeISO": "2024-01-01T00:00:00.000Z",
            "musicMeta": { "musicName": "original sound" },
            "subtitles": [{ "text": " hello " }, { "language": "en" }, { "text": "world" }],
        });

        let record = extractor(backend_returning(vec![item])).extract(URL).await;

        assert_eq!(record.status, Status::Success);
        assert_eq!(record.text, "hello world");
        assert_eq!(record.transcript_source, TranscriptSource::Inline);
        assert_eq!(record.metadata["id"], "7234");
        assert_eq!(record.metadata["author"], "someone");
        assert_eq!(record.metadata["create_time"], "2024-01-01T00:00:00.000Z");
        assert_eq!(record.metadata["music"], "original sound");
    }

    #[tokio::test]
    async fn test_vtt_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subs.vtt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nhello world\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let item = json!({
            "id": "7234",
            "subtitles": [],
            "videoMeta": { "subtitleLinks": [{ "downloadLink": format!("{}/subs.vtt", server.uri()) }] },
        });

        let record = extractor(backend_returning(vec![item])).extract(URL).await;

        assert_eq!(record.status, Status::Success);
        assert_eq!(record.text, "hello world");
        assert_eq!(record.transcript_source, TranscriptSource::Vtt);
        assert_eq!(record.metadata["id"], "7234");
        assert!(!record.metadata.contains_key("author"));
        assert!(!record.metadata.contains_key("music"));
    }

    #[tokio::test]
    async fn test_vtt_download_failure_keeps_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subs.vtt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let item = json!({
            "id": "7234",
            "videoMeta": { "subtitleLinks": [{ "downloadLink": format!("{}/subs.vtt", server.uri()) }] },
        });

        let record = extractor(backend_returning(vec![item])).extract(URL).await;

        assert_eq!(record.status, Status::Error);
        assert!(record.error.unwrap().contains("404"));
        assert_eq!(record.metadata["id"], "7234");
    }

    #[tokio::test]
    async fn test_item_without_subtitles() {
        let record = extractor(backend_returning(vec![json!({ "id": "1" })]))
            .extract(URL)
            .await;

        assert_eq!(record.status, Status::NoTranscript);
        assert_eq!(record.transcript_source, TranscriptSource::None);
    }

    #[tokio::test]
    async fn test_backend_failure_is_error_record() {
        let mut backend = MockJobBackend::new();
        backend.expect_call_actor().returning(|_, _| {
            Err(TranscriptError::Backend("HTTP 401 Unauthorized".to_string()).into())
        });
        backend.expect_dataset_items().never();

        let record = extractor(backend).extract(URL).await;

        assert_eq!(record.status, Status::Error);
        assert!(record.error.unwrap().contains("401"));
    }
}
