use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Apify job backend settings
    pub apify: ApifyConfig,

    /// YouTube caption settings
    pub youtube: YoutubeConfig,

    /// Instagram transcriber settings
    pub instagram: InstagramConfig,

    /// TikTok scraper settings
    pub tiktok: TiktokConfig,

    /// Result persistence
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApifyConfig {
    /// API base URL
    pub api_url: String,

    /// Bearer token, only ever read from the environment
    #[serde(skip)]
    pub token: Option<String>,

    /// Seconds the API may hold each run-status request open
    pub wait_for_finish_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Base URL for watch pages and the innertube API
    pub base_url: String,

    /// Preferred caption languages, most preferred first
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    /// Actor that transcribes Instagram videos
    pub actor_id: String,

    /// Optional translation target (language name or code)
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TiktokConfig {
    /// Actor that scrapes TikTok posts
    pub actor_id: String,

    /// Timeout for downloading a linked subtitle file
    pub subtitle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory results are written to
    pub dir: PathBuf,

    /// Write a JSON file for every processed URL
    pub persist: bool,
}

impl ApifyConfig {
    /// The backend credential; its absence is fatal at startup
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .context("APIFY_TOKEN is missing from environment variables")
    }
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.apify.com".to_string(),
            token: None,
            wait_for_finish_secs: 60,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            languages: vec!["en".to_string()],
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            actor_id: "tictechid/anoxvanzi-transcriber".to_string(),
            target_language: None,
        }
    }
}

impl Default for TiktokConfig {
    fn default() -> Self {
        Self {
            actor_id: "clockworks/tiktok-scraper".to_string(),
            subtitle_timeout_secs: 15,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            persist: true,
        }
    }
}

impl Config {
    /// Load configuration from file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_yaml(
                    &fs_err::read_to_string(&path).context("Failed to read config file")?,
                )?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a YAML config document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Locate the config file: `./config.yaml` first, then the user config directory
    fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("social-transcript").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = lookup("APIFY_TOKEN") {
            self.apify.token = Some(token);
        }
        if let Some(url) = lookup("APIFY_API_URL") {
            self.apify.api_url = url;
        }
        if let Some(url) = lookup("YOUTUBE_BASE_URL") {
            self.youtube.base_url = url;
        }
        if let Some(languages) = lookup("YOUTUBE_LANGUAGES") {
            self.youtube.languages = languages
                .split(',')
                .map(|lang| lang.trim().to_string())
                .filter(|lang| !lang.is_empty())
                .collect();
        }
        if let Some(actor) = lookup("TIKTOK_ACTOR_ID") {
            self.tiktok.actor_id = actor;
        }
        if let Some(actor) = lookup("INSTAGRAM_ACTOR_ID") {
            self.instagram.actor_id = actor;
        }
        if let Some(language) = lookup("INSTAGRAM_TARGET_LANGUAGE") {
            self.instagram.target_language = Some(language);
        }
        if let Some(dir) = lookup("TRANSCRIPT_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(persist) = lookup("TRANSCRIPT_PERSIST") {
            match persist.to_lowercase().as_str() {
                "0" | "false" | "no" | "off" => self.output.persist = false,
                "1" | "true" | "yes" | "on" => self.output.persist = true,
                other => tracing::warn!("Ignoring TRANSCRIPT_PERSIST={}", other),
            }
        }
    }
}
