use url::Url;

/// Soft scheme check: true when the input parses as an http(s) URL
pub fn has_http_scheme(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Convert WebVTT subtitle content into a plain text transcript
pub fn parse_vtt(vtt: &str) -> String {
    let lines: Vec<&str> = vtt
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("WEBVTT") && !line.contains("-->"))
        .collect();

    lines.join(" ")
}

/// Space-join the non-blank pieces of text, trimming each one
pub fn join_text<'a, I>(pieces: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shorten text for console display
pub fn preview(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ");
    if cleaned.chars().count() > max_chars {
        let cut: String = cleaned.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut.trim_end())
    } else {
        cleaned
    }
}
