pub mod archive;

pub use archive::{unpack, ArchiveKind};

use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, SubtitleFormat};
use crate::error::{Result, SubextractError};
use crate::probe::{probe_container, TrackRecord};

const CONTAINER_EXTENSIONS: &[&str] = &["mkv", "mp4", "m4v", "mov", "webm", "avi", "ts"];

/// A standalone subtitle file found on disk or inside an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, for display.
    pub label: String,
    pub format: SubtitleFormat,
}

impl SubtitleFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.label.clone())
    }

    /// `<stem>.vtt`
    pub fn vtt_name(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.label.clone());
        format!("{}.{}", stem, SubtitleFormat::Vtt.extension())
    }
}

/// A loaded input, ready for selection.
#[derive(Debug)]
pub enum Source {
    /// A media container and the subtitle streams its report lists.
    Container {
        path: PathBuf,
        tracks: Vec<TrackRecord>,
    },
    /// Standalone subtitle files. Archive contents live in `staging` and are
    /// removed when the source is dropped.
    Files {
        root: PathBuf,
        files: Vec<SubtitleFile>,
        staging: Option<TempDir>,
    },
}

impl Source {
    /// Number of selectable entries.
    pub fn len(&self) -> usize {
        match self {
            Source::Container { tracks, .. } => tracks.len(),
            Source::Files { files, .. } => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One display label per selectable entry, in order.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Source::Container { tracks, .. } => {
                tracks.iter().map(TrackRecord::display_label).collect()
            }
            Source::Files { files, .. } => files.iter().map(|f| f.label.clone()).collect(),
        }
    }

    /// Directory the input came from, used as the default export directory.
    pub fn origin_dir(&self) -> Option<&Path> {
        match self {
            Source::Container { path, .. } => path.parent(),
            Source::Files { staging: Some(_), .. } => None,
            Source::Files { root, .. } => Some(root.as_path()),
        }
    }
}

/// File name without extension, used as the base of container output names.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitles".to_string())
}

/// Load `input` according to what it is: a media container, a subtitle
/// file, a directory of subtitle files, or an archive of them.
pub async fn load_source(input: &Path, config: &Config) -> Result<Source> {
    if !input.exists() {
        return Err(SubextractError::FileNotFound(input.display().to_string()));
    }

    if input.is_dir() {
        let files = scan_subtitle_files(input)?;
        return Ok(Source::Files {
            root: input.to_path_buf(),
            files,
            staging: None,
        });
    }

    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if CONTAINER_EXTENSIONS.contains(&ext.as_str()) {
        info!("Container loaded: {}", input.display());
        let tracks = probe_container(&config.ffmpeg_path, input).await?;
        return Ok(Source::Container {
            path: input.to_path_buf(),
            tracks,
        });
    }

    if let Some(format) = SubtitleFormat::from_path(input) {
        if format != SubtitleFormat::Vtt {
            let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
            return Ok(Source::Files {
                root,
                files: vec![SubtitleFile {
                    path: input.to_path_buf(),
                    label: base_label(input),
                    format,
                }],
                staging: None,
            });
        }
    }

    if let Some(kind) = ArchiveKind::from_extension(&ext) {
        let staging = TempDir::new()?;
        unpack(input, kind, staging.path(), &config.archive_tool).await?;
        let files = scan_subtitle_files(staging.path())?;
        info!(
            "Found {} subtitle file(s) in {}",
            files.len(),
            input.display()
        );
        return Ok(Source::Files {
            root: staging.path().to_path_buf(),
            files,
            staging: Some(staging),
        });
    }

    Err(SubextractError::UnsupportedSource(format!(
        "{} (expected a media container, .srt/.ass file, directory, or .zip/.rar/.7z archive)",
        input.display()
    )))
}

fn base_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Recursively collect `.srt` and `.ass` files under `root`, sorted by path.
pub fn scan_subtitle_files(root: &Path) -> Result<Vec<SubtitleFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let format = match SubtitleFormat::from_path(path) {
            Some(f @ (SubtitleFormat::Srt | SubtitleFormat::Ass)) => f,
            _ => continue,
        };

        let label = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        files.push(SubtitleFile {
            path: path.to_path_buf(),
            label,
            format,
        });
    }

    Ok(files)
}
