use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "transcript",
    about = "Social Transcript - Pull transcripts from YouTube, Instagram and TikTok videos",
    version,
    long_about = "Classifies a social media URL, fetches the spoken transcript through the matching platform extractor and stores the result as JSON. Requires APIFY_TOKEN for Instagram and TikTok."
)]
pub struct Cli {
    /// URL to process (prompted for when omitted)
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_url() {
        let cli = Cli::try_parse_from(["transcript", "https://youtu.be/abc123"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/abc123"));
    }

    #[test]
    fn test_url_is_optional() {
        let cli = Cli::try_parse_from(["transcript"]).unwrap();
        assert!(cli.url.is_none());
    }

    #[test]
    fn test_no_flags() {
        assert!(Cli::try_parse_from(["transcript", "--output", "x", "https://youtu.be/a"]).is_err());
    }
}
