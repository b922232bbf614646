use crate::error::{Result, SubextractError};
use crate::probe::label::is_safe_label_char;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How WebVTT outputs are named when a run exports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VttNaming {
    /// `<base>.vtt` for a single track, `subtitle1.vtt`, `subtitle2.vtt`, ... otherwise.
    #[default]
    Numbered,
    /// `<base>.<lang>.vtt`, disambiguated by safe label like original exports.
    Language,
}

impl std::fmt::Display for VttNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VttNaming::Numbered => write!(f, "numbered"),
            VttNaming::Language => write!(f, "language"),
        }
    }
}

impl std::str::FromStr for VttNaming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numbered" => Ok(VttNaming::Numbered),
            "language" => Ok(VttNaming::Language),
            _ => Err(format!(
                "Unknown VTT naming: {}. Use 'numbered' or 'language'",
                s
            )),
        }
    }
}

/// Subtitle file formats handled by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Ass,
    Vtt,
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::Ass => write!(f, "ass"),
            SubtitleFormat::Vtt => write!(f, "vtt"),
        }
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "ass" => Ok(SubtitleFormat::Ass),
            "vtt" => Ok(SubtitleFormat::Vtt),
            _ => Err(format!(
                "Unknown format: {}. Use 'srt', 'ass', or 'vtt'",
                s
            )),
        }
    }
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Ass => "ass",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    /// Format of a standalone subtitle file, judged by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcoder binary used for probing, extraction and conversion.
    pub ffmpeg_path: String,
    /// External tool that unpacks RAR and 7z archives.
    pub archive_tool: String,
    pub overwrite: bool,
    pub vtt_naming: VttNaming,
    /// Leave intermediate SRT files in the export directory after a run.
    pub keep_intermediates: bool,
    pub intermediate_prefix: String,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            archive_tool: "7z".to_string(),
            overwrite: true,
            vtt_naming: VttNaming::default(),
            keep_intermediates: false,
            intermediate_prefix: "__temp__".to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => tracing::warn!(
                        "Ignoring malformed config file {}: {}",
                        config_path.display(),
                        e
                    ),
                }
            }
        }

        // Override with environment variables
        if let Ok(path) = std::env::var("SUBEXTRACT_FFMPEG") {
            config.ffmpeg_path = path;
        }
        if let Ok(tool) = std::env::var("SUBEXTRACT_ARCHIVE_TOOL") {
            config.archive_tool = tool;
        }
        if let Ok(overwrite) = std::env::var("SUBEXTRACT_OVERWRITE") {
            if let Some(v) = parse_bool(&overwrite) {
                config.overwrite = v;
            }
        }
        if let Ok(naming) = std::env::var("SUBEXTRACT_VTT_NAMING") {
            if let Ok(n) = naming.parse() {
                config.vtt_naming = n;
            }
        }
        if let Ok(keep) = std::env::var("SUBEXTRACT_KEEP_INTERMEDIATES") {
            if let Some(v) = parse_bool(&keep) {
                config.keep_intermediates = v;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(SubextractError::Config(
                "ffmpeg_path must not be empty".to_string(),
            ));
        }

        if self.intermediate_prefix.is_empty()
            || !self.intermediate_prefix.chars().all(is_safe_label_char)
        {
            return Err(SubextractError::Config(format!(
                "intermediate_prefix '{}' must be non-empty and use only letters, digits, '_' or '-'",
                self.intermediate_prefix
            )));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subextract").join("config.toml"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
