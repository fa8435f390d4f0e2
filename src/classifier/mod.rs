use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Platform a URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    /// Recognized, but no extractor exists for it
    Airbnb,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Airbnb => "airbnb",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
}

// Checked in order; the first group with any hit wins.
static PATTERN_GROUPS: LazyLock<Vec<(Platform, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            Platform::Youtube,
            compile(&[
                r"(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|v/|shorts/|live/)",
                r"(?:https?://)?(?:www\.)?youtube-nocookie\.com/embed/",
                r"(?:https?://)?youtu\.be/[\w-]+",
            ]),
        ),
        (
            Platform::Instagram,
            compile(&[
                r"(?:https?://)?(?:www\.|m\.)?instagram\.com/(?:[\w.]+/)?(?:p|reel|reels|tv)/[\w-]+",
                r"(?:https?://)?(?:www\.|m\.)?instagram\.com/stories/",
                r"(?:https?://)?(?:www\.)?instagr\.am/(?:p|reel)/",
            ]),
        ),
        (
            Platform::Tiktok,
            compile(&[
                r"(?:https?://)?(?:www\.|m\.)?tiktok\.com/@[\w.-]+/video/\d+",
                r"(?:https?://)?(?:vm|vt)\.tiktok\.com/[\w.-]+",
                r"(?:https?://)?(?:www\.|m\.)?tiktok\.com/(?:t|v)/[\w.-]+",
            ]),
        ),
        (
            Platform::Airbnb,
            compile(&[r"(?:https?://)?(?:www\.)?airbnb\.[a-z.]+/rooms/\d+"]),
        ),
    ]
});

/// Classify a URL by platform. Pure and total: no match is `Platform::Unknown`.
pub fn classify(url: &str) -> Platform {
    PATTERN_GROUPS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(url)))
        .map(|(platform, _)| *platform)
        .unwrap_or(Platform::Unknown)
}
