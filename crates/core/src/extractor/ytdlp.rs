use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Output,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{MetadataSource, TranscriptSource, VideoReference};
use crate::{
    config::ExtractorConfig,
    error::ExtractionError,
    types::{Segment, Transcript, VideoMetadata},
};

/// Transcript and metadata source backed by the `yt-dlp` executable.
pub struct YtDlp {
    config: ExtractorConfig,
}

impl YtDlp {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    async fn run<I, S>(&self, args: I) -> Result<Output, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.config.ytdlp_path);
        command.args(args).kill_on_drop(true);

        match tokio::time::timeout(self.config.timeout(), command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(format!(
                "failed to run {}: {}",
                self.config.ytdlp_path.display(),
                err
            )),
            Err(_) => {
                warn!(timeout_secs = self.config.timeout_secs, "yt-dlp timed out, killing process");
                Err(format!("yt-dlp timed out after {}s", self.config.timeout_secs))
            }
        }
    }
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("yt-dlp exited with an error")
        .trim()
        .to_string()
}

#[async_trait]
impl TranscriptSource for YtDlp {
    async fn fetch_transcript(&self, video: &VideoReference) -> Result<Transcript, ExtractionError> {
        let failed = |reason: String| ExtractionError::TranscriptFailed {
            video_id: video.id().to_string(),
            reason,
        };

        let dir = tempfile::tempdir().map_err(|e| failed(e.to_string()))?;
        let template = dir.path().join("%(id)s.%(ext)s");
        let language = &self.config.language;
        let sub_langs = format!("{language}.*,{language}");
        let url = video.canonical_url();

        debug!(video_id = video.id(), language, "fetching captions");
        let output = self
            .run([
                OsStr::new("--skip-download"),
                OsStr::new("--write-subs"),
                OsStr::new("--write-auto-subs"),
                OsStr::new("--sub-langs"),
                OsStr::new(&sub_langs),
                OsStr::new("--sub-format"),
                OsStr::new("json3"),
                OsStr::new("--no-playlist"),
                OsStr::new("-o"),
                template.as_os_str(),
                OsStr::new(&url),
            ])
            .await
            .map_err(failed)?;

        if !output.status.success() {
            return Err(failed(stderr_tail(&output)));
        }

        let Some(path) = find_subtitle_file(dir.path())
            .await
            .map_err(|e| failed(e.to_string()))?
        else {
            return Err(ExtractionError::TranscriptNotFound {
                video_id: video.id().to_string(),
            });
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let segments = parse_json3(&content).map_err(|e| failed(e.to_string()))?;
        if segments.is_empty() {
            return Err(ExtractionError::TranscriptNotFound {
                video_id: video.id().to_string(),
            });
        }

        Ok(Transcript {
            segments,
            language: language.clone(),
        })
    }
}

#[async_trait]
impl MetadataSource for YtDlp {
    async fn fetch_metadata(&self, video: &VideoReference) -> Result<VideoMetadata, ExtractionError> {
        let unavailable = |reason: String| ExtractionError::MetadataUnavailable {
            video_id: video.id().to_string(),
            reason,
        };

        let url = video.canonical_url();
        let output = self
            .run(["--dump-json", "--skip-download", "--no-playlist", url.as_str()])
            .await
            .map_err(unavailable)?;

        if !output.status.success() {
            return Err(unavailable(stderr_tail(&output)));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_metadata(&json).map_err(|e| unavailable(e.to_string()))
    }
}

/// The first `.json3` file in `dir`, by name.
async fn find_subtitle_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json3") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files.into_iter().next())
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
    /// Set on auto-caption events that only extend the previous line.
    #[serde(default)]
    a_append: Option<u8>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's `json3` caption format into timed segments.
pub fn parse_json3(content: &str) -> Result<Vec<Segment>, serde_json::Error> {
    let captions: Json3 = serde_json::from_str(content)?;

    Ok(captions
        .events
        .into_iter()
        .filter(|event| event.a_append.is_none())
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Segment {
                start: event.t_start_ms as f64 / 1000.0,
                end: (event.t_start_ms + event.d_duration_ms) as f64 / 1000.0,
                text: text.to_string(),
            })
        })
        .collect())
}

/// Map the `--dump-json` document onto [`VideoMetadata`].
pub fn parse_metadata(json: &str) -> Result<VideoMetadata, serde_json::Error> {
    let info: Value = serde_json::from_str(json)?;
    let text = |key: &str| {
        info[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(VideoMetadata {
        title: text("title").unwrap_or_default(),
        author: text("uploader").or_else(|| text("channel")),
        duration_seconds: info["duration"]
            .as_u64()
            .or_else(|| info["duration"].as_f64().map(|d| d.round() as u64)),
        view_count: info["view_count"].as_u64(),
        published: text("upload_date")
            .and_then(|date| NaiveDate::parse_from_str(&date, "%Y%m%d").ok()),
        description: text("description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3_segments() {
        let content = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 2500, "segs": [{"utf8": "Hello "}, {"utf8": "world"}]},
                {"tStartMs": 2500, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2600, "dDurationMs": 1000},
                {"tStartMs": 3000, "dDurationMs": 1500, "segs": [{"utf8": "second\nline"}]}
            ]
        }"#;
        let segments = parse_json3(content).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello world");
        assert_eq!(segments[0].end, 2.5);
        assert_eq!(segments[1].start, 3.0);
        assert_eq!(segments[1].text, "second line");
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3("not json").is_err());
        assert!(parse_json3("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_metadata() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "channel": "Rick Astley",
            "duration": 212.0,
            "view_count": 1500000000,
            "upload_date": "20091025",
            "description": ""
        }"#;
        let metadata = parse_metadata(json).unwrap();
        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.author.as_deref(), Some("Rick Astley"));
        assert_eq!(metadata.duration_seconds, Some(212));
        assert_eq!(metadata.view_count, Some(1_500_000_000));
        assert_eq!(metadata.published, NaiveDate::from_ymd_opt(2009, 10, 25));
        assert_eq!(metadata.description, None);
    }

    #[test]
    fn test_parse_metadata_tolerates_missing_fields() {
        let metadata = parse_metadata(r#"{"upload_date": "garbage"}"#).unwrap();
        assert_eq!(metadata, VideoMetadata::default());
    }

    #[tokio::test]
    async fn test_find_subtitle_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_subtitle_file(dir.path()).await.unwrap().is_none());
        std::fs::write(dir.path().join("abc.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("abc.en.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.de.json3"), "{}").unwrap();
        let found = find_subtitle_file(dir.path()).await.unwrap().unwrap();
        assert!(found.ends_with("abc.de.json3"));
    }
}
