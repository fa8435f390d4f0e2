use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde_json::json;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::classifier::Platform;
use crate::record::{ResultRecord, Status};
use crate::utils::preview;

/// `<platform>-<DD-MM-YYYY-HH-MM>.json`
pub fn output_filename(platform: Platform, at: DateTime<Local>) -> String {
    format!("{}-{}.json", platform, at.format("%d-%m-%Y-%H-%M"))
}

/// File contents for a record. YouTube transcripts are stored as bare `{"text": ...}`.
pub fn render(record: &ResultRecord) -> Result<String> {
    if record.platform == Platform::Youtube && record.status == Status::Success {
        return Ok(serde_json::to_string(&json!({ "text": record.text }))?);
    }

    serde_json::to_string_pretty(record).context("Failed to serialize result")
}

/// Save the record under `dir`, creating it if needed
pub fn save_result(record: &ResultRecord, dir: &Path) -> Result<PathBuf> {
    save_result_at(record, dir, Local::now())
}

pub fn save_result_at(record: &ResultRecord, dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    fs_err::create_dir_all(dir)?;

    let path = dir.join(output_filename(record.platform, at));
    fs_err::write(&path, render(record)?)?;

    tracing::debug!("Wrote {} result to {}", record.platform, path.display());
    Ok(path)
}

/// Console report for a record
pub fn summary(record: &ResultRecord) -> String {
    let mut out = String::new();

    match record.status {
        Status::Success => {
            let _ = writeln!(out, "URL: {}", record.url);
            let _ = writeln!(out, "Platform: {}", record.platform);
            let _ = writeln!(out, "Status: {}", record.status);
            let _ = writeln!(out, "Transcript source: {}", record.transcript_source);
            let _ = writeln!(out, "Transcript: {}", preview(&record.text, 200));
        }
        Status::Error => {
            let _ = writeln!(
                out,
                "Error: {}",
                record.error.as_deref().unwrap_or("Unknown error")
            );
        }
        Status::NoTranscript | Status::Skipped => {
            let _ = writeln!(out, "URL: {}", record.url);
            let _ = writeln!(out, "Platform: {}", record.platform);
            let _ = writeln!(out, "Status: {}", record.status);
            if let Some(reason) = &record.error {
                let _ = writeln!(out, "Message: {}", reason);
            }
        }
    }

    out.trim_end().to_string()
}
