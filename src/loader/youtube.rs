//! YouTube transcript loader.
//!
//! Uses yt-dlp to fetch video metadata and subtitles (manual captions when
//! available, automatic captions otherwise).

use super::vtt::parse_vtt;
use super::{Loader, SourceBlock, SourceKind, SourceMetadata};
use crate::error::{DocchatError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| {
        // Matches the common YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            ^(?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
                (?:[?&/\#]|$)
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if let Some(caps) = video_id_regex().captures(input) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
    }

    // watch URLs with the id in a later query parameter (`?feature=share&v=...`)
    let parsed = url::Url::parse(input).ok()?;
    let host = parsed.host_str()?;
    if host != "youtube.com" && !host.ends_with(".youtube.com") {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.to_string())
        .filter(|v| v.len() == 11)
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Loads the transcript of a YouTube video as a single block.
pub struct YoutubeLoader {
    language: String,
    temp_dir: PathBuf,
}

impl YoutubeLoader {
    pub fn new(language: &str, temp_dir: &Path) -> Self {
        Self {
            language: language.to_string(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    /// Fetch the video title using yt-dlp.
    async fn fetch_title(&self, video_id: &str) -> Result<String> {
        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--no-playlist",
                &watch_url(video_id),
            ])
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocchatError::Youtube(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            DocchatError::Youtube(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(json["title"].as_str().unwrap_or("Unknown Title").to_string())
    }

    /// Download subtitles into a scratch directory and return the VTT content.
    async fn fetch_subtitles(&self, video_id: &str) -> Result<String> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("subs-")
            .tempdir_in(&self.temp_dir)?;

        let template = scratch.path().join(format!("{}.%(ext)s", video_id));
        let sub_langs = format!("{}.*,{}", self.language, self.language);

        let output = tokio::process::Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-format").arg("vtt")
            .arg("--sub-langs").arg(&sub_langs)
            .arg("--output").arg(template.to_string_lossy().as_ref())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(watch_url(video_id))
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocchatError::ToolFailed(format!("yt-dlp failed: {}", stderr.trim())));
        }

        let path = find_subtitle_file(scratch.path(), video_id, &self.language)?.ok_or_else(|| {
            DocchatError::Youtube(format!(
                "No '{}' transcript available for video {}",
                self.language, video_id
            ))
        })?;

        debug!("Reading subtitles from {:?}", path);
        Ok(std::fs::read_to_string(&path)?)
    }
}

#[async_trait]
impl Loader for YoutubeLoader {
    #[instrument(skip(self))]
    async fn load(&self, input: &str) -> Result<Vec<SourceBlock>> {
        let video_id = extract_video_id(input).ok_or_else(|| {
            DocchatError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        let title = self.fetch_title(&video_id).await?;
        let vtt = self.fetch_subtitles(&video_id).await?;

        let text = parse_vtt(&vtt)
            .into_iter()
            .map(|cue| cue.text)
            .collect::<Vec<_>>()
            .join(" ");

        if text.trim().is_empty() {
            return Err(DocchatError::Youtube(format!(
                "Transcript for video {} is empty",
                video_id
            )));
        }

        info!("Loaded transcript for '{}' ({} chars)", title, text.len());

        Ok(vec![SourceBlock::new(
            text,
            SourceMetadata {
                source: watch_url(&video_id),
                kind: SourceKind::Youtube,
                title,
                page: None,
            },
        )])
    }
}

fn map_spawn_error(e: std::io::Error) -> DocchatError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DocchatError::ToolNotFound("yt-dlp".to_string())
    } else {
        DocchatError::ToolFailed(format!("Failed to run yt-dlp: {}", e))
    }
}

/// Pick the downloaded subtitle file, preferring an exact language match.
fn find_subtitle_file(dir: &Path, video_id: &str, language: &str) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.starts_with(video_id) && name.ends_with(".vtt")
        })
        .collect();

    candidates.sort();
    let exact = format!("{}.{}.vtt", video_id, language);
    let preferred = candidates
        .iter()
        .position(|p| p.file_name().and_then(|n| n.to_str()) == Some(exact.as_str()));

    Ok(match preferred {
        Some(i) => Some(candidates.swap_remove(i)),
        None => candidates.into_iter().next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=pJY0mBWHPw4"),
            Some("pJY0mBWHPw4".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/pJY0mBWHPw4"),
            Some("pJY0mBWHPw4".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtube.com/shorts/pJY0mBWHPw4"),
            Some("pJY0mBWHPw4".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=pJY0mBWHPw4"),
            Some("pJY0mBWHPw4".to_string())
        );
        assert_eq!(extract_video_id("pJY0mBWHPw4"), Some("pJY0mBWHPw4".to_string()));

        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=pJY0mBWHPw4"), None);
        assert_eq!(extract_video_id("https://notyoutube.com/watch?v=pJY0mBWHPw4"), None);
        assert_eq!(
            extract_video_id("https://notyoutube.com/watch?feature=share&v=pJY0mBWHPw4"),
            None
        );
        assert_eq!(extract_video_id("see https://youtu.be/pJY0mBWHPw4"), None);
        assert_eq!(extract_video_id("https://youtu.be/pJY0mBWHPw4extra"), None);
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?v=pJY0mBWHPw4&t=42"),
            Some("pJY0mBWHPw4".to_string())
        );
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_find_subtitle_prefers_exact_language() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["abc.en-US.vtt", "abc.en.vtt", "abc.info.json"] {
            std::fs::write(dir.path().join(name), "WEBVTT").unwrap();
        }

        let found = find_subtitle_file(dir.path(), "abc", "en").unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.en.vtt");

        let empty = tempfile::tempdir().unwrap();
        assert!(find_subtitle_file(empty.path(), "abc", "en").unwrap().is_none());
    }
}
