use async_trait::async_trait;

pub mod instagram;
pub mod tiktok;
pub mod youtube;

use crate::classifier::Platform;
use crate::record::ResultRecord;

/// Trait for pulling transcripts from one platform.
///
/// Implementations never fail: every error is reported as a `status=error`
/// record so callers always get something to show and persist.
#[async_trait]
pub trait TranscriptExtractor: Send + Sync {
    /// Extract the transcript for a URL of this platform
    async fn extract(&self, url: &str) -> ResultRecord;

    /// The platform this extractor handles
    fn platform(&self) -> Platform;
}

/// Registry for managing the platform extractors
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TranscriptExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor, replacing any earlier one for the same platform
    pub fn register(&mut self, extractor: Box<dyn TranscriptExtractor>) {
        let platform = extractor.platform();
        self.extractors.retain(|existing| existing.platform() != platform);
        self.extractors.push(extractor);
    }

    /// Find the extractor for a platform
    pub fn find_extractor(&self, platform: Platform) -> Option<&dyn TranscriptExtractor> {
        self.extractors
            .iter()
            .find(|extractor| extractor.platform() == platform)
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported platforms
    pub fn list_platforms(&self) -> Vec<Platform> {
        self.extractors
            .iter()
            .map(|extractor| extractor.platform())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Platform, &'static str);

    #[async_trait]
    impl TranscriptExtractor for Fixed {
        async fn extract(&self, url: &str) -> ResultRecord {
            ResultRecord::error(self.0, url, self.1)
        }

        fn platform(&self) -> Platform {
            self.0
        }
    }

    #[tokio::test]
    async fn test_register_replaces_same_platform() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(Fixed(Platform::Youtube, "first")));
        registry.register(Box::new(Fixed(Platform::Tiktok, "tiktok")));
        registry.register(Box::new(Fixed(Platform::Youtube, "second")));

        assert_eq!(registry.list_platforms(), vec![Platform::Tiktok, Platform::Youtube]);

        let record = registry
            .find_extractor(Platform::Youtube)
            .unwrap()
            .extract("u")
            .await;
        assert_eq!(record.error.as_deref(), Some("second"));
        assert!(registry.find_extractor(Platform::Instagram).is_none());
    }
}
