use std::sync::Arc;

use crate::backend::JobBackend;
use crate::classifier::{classify, Platform};
use crate::config::Config;
use crate::extractors::instagram::InstagramExtractor;
use crate::extractors::tiktok::TiktokExtractor;
use crate::extractors::youtube::YoutubeExtractor;
use crate::extractors::ExtractorRegistry;
use crate::record::ResultRecord;
use crate::transcript::{TranscriptFetcher, YoutubeTranscriptClient};
use crate::{Result, TranscriptError};

/// Classifies URLs and routes them to the matching extractor
pub struct Orchestrator {
    registry: ExtractorRegistry,
}

impl Orchestrator {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// Wire the default extractors to the given handles
    pub fn with_handles(
        config: &Config,
        backend: Arc<dyn JobBackend>,
        fetcher: Arc<dyn TranscriptFetcher>,
    ) -> Self {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(YoutubeExtractor::new(fetcher)));
        registry.register(Box::new(InstagramExtractor::from_config(
            backend.clone(),
            &config.instagram,
        )));
        registry.register(Box::new(TiktokExtractor::from_config(backend, &config.tiktok)));

        Self::new(registry)
    }

    /// Build the default extractors, with the YouTube caption client taken from config
    pub fn from_config(config: &Config, backend: Arc<dyn JobBackend>) -> Result<Self> {
        let fetcher = Arc::new(YoutubeTranscriptClient::from_config(&config.youtube)?);
        Ok(Self::with_handles(config, backend, fetcher))
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.registry.list_platforms()
    }

    /// Classify, dispatch and return the record. Never fails.
    pub async fn process(&self, url: &str) -> ResultRecord {
        let platform = classify(url);
        tracing::info!("Classified {} as {}", url, platform);

        if platform == Platform::Unknown {
            return ResultRecord::error(
                Platform::Unknown,
                url,
                format!("Unsupported platform: {platform}"),
            );
        }

        match self.registry.find_extractor(platform) {
            Some(extractor) => {
                tracing::info!("Calling {} extractor", platform);
                extractor.extract(url).await
            }
            None => {
                tracing::info!("No extractor for {}, skipping", platform);
                ResultRecord::skipped(
                    platform,
                    url,
                    TranscriptError::UnsupportedPlatform(platform.to_string()).to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActorRun, MockJobBackend};
    use crate::record::{Status, TranscriptSource};
    use crate::transcript::{FetchedTranscript, MockTranscriptFetcher, Segment};

    fn idle_orchestrator() -> Orchestrator {
        let mut backend = MockJobBackend::new();
        backend.expect_call_actor().never();
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_fetch().never();

        Orchestrator::with_handles(&Config::default(), Arc::new(backend), Arc::new(fetcher))
    }

    #[test]
    fn test_default_platforms() {
        assert_eq!(
            idle_orchestrator().platforms(),
            vec![Platform::Youtube, Platform::Instagram, Platform::Tiktok]
        );
    }

    #[tokio::test]
    async fn test_unknown_url() {
        let record = idle_orchestrator().process("https://example.com/foo").await;

        assert_eq!(record.platform, Platform::Unknown);
        assert_eq!(record.status, Status::Error);
        assert_eq!(record.url, "https://example.com/foo");
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_recognized_platform_without_extractor_is_skipped() {
        let record = idle_orchestrator()
            .process("https://www.airbnb.com/rooms/12345")
            .await;

        assert_eq!(record.platform, Platform::Airbnb);
        assert_eq!(record.status, Status::Skipped);
        assert_eq!(record.error.as_deref(), Some("Unsupported platform: airbnb"));
    }

    #[tokio::test]
    async fn test_youtube_dispatch() {
        let backend = MockJobBackend::new();
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_fetch().times(1).returning(|video_id| {
            Ok(FetchedTranscript {
                video_id: video_id.to_string(),
                language: "English".to_string(),
                language_code: "en".to_string(),
                is_generated: false,
                segments: vec![
                    Segment { text: "hi".to_string(), start: 0.0, duration: 1.0 },
                    Segment { text: "there".to_string(), start: 1.0, duration: 1.0 },
                ],
            })
        });

        let orchestrator =
            Orchestrator::with_handles(&Config::default(), Arc::new(backend), Arc::new(fetcher));
        let record = orchestrator
            .process("https://www.youtube.com/watch?v=abc123")
            .await;

        assert_eq!(record.status, Status::Success);
        assert_eq!(record.text, "hi there");
        assert_eq!(record.transcript_source, TranscriptSource::Api);
    }

    #[tokio::test]
    async fn test_tiktok_dispatch_uses_configured_actor() {
        let mut config = Config::default();
        config.tiktok.actor_id = "someone/other-scraper".to_string();

        let mut backend = MockJobBackend::new();
        backend
            .expect_call_actor()
            .withf(|actor_id: &str, _: &serde_json::Value| actor_id == "someone/other-scraper")
            .times(1)
            .returning(|_, _| {
                Ok(ActorRun {
                    id: "run1".to_string(),
                    status: "SUCCEEDED".to_string(),
                    default_dataset_id: "ds1".to_string(),
                })
            });
        backend.expect_dataset_items().returning(|_| Ok(vec![]));

        let orchestrator = Orchestrator::with_handles(
            &config,
            Arc::new(backend),
            Arc::new(MockTranscriptFetcher::new()),
        );
        let record = orchestrator.process("https://vt.tiktok.com/XYZ/").await;

        assert_eq!(record.platform, Platform::Tiktok);
        assert_eq!(record.status, Status::NoTranscript);
        assert_eq!(record.text, "");
        assert_eq!(record.transcript_source, TranscriptSource::None);
    }
}
