pub mod label;
pub mod report;

pub use label::{build_safe_label, display_label};
pub use report::{parse_stream_report, scan_title};

use std::path::Path;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SubtitleFormat;
use crate::error::{Result, SubextractError};

/// Language code used when the stream report carries none.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// One subtitle stream discovered in a container's stream report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRecord {
    /// Index of this record within its report.
    pub position: usize,
    /// Stream selector handed back to the transcoder verbatim, e.g. `0:2`.
    pub stream_id: String,
    pub language: String,
    pub codec: String,
    pub description: String,
    pub safe_label: String,
}

impl TrackRecord {
    pub fn is_subrip(&self) -> bool {
        self.codec.eq_ignore_ascii_case("subrip")
    }

    /// Format written for an original-format export. Anything that is not
    /// SubRip is exported as ASS.
    pub fn original_format(&self) -> SubtitleFormat {
        if self.is_subrip() {
            SubtitleFormat::Srt
        } else {
            SubtitleFormat::Ass
        }
    }

    pub fn display_label(&self) -> String {
        display_label(&self.language, &self.codec, &self.description)
    }
}

/// Check that the transcoder binary can be executed.
pub async fn check_ffmpeg(ffmpeg: &str) -> Result<()> {
    let output = Command::new(ffmpeg)
        .arg("-version")
        .output()
        .await
        .map_err(|e| {
            SubextractError::Transcoder(format!(
                "{ffmpeg} not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(SubextractError::Transcoder(format!(
            "{ffmpeg} -version failed"
        )));
    }

    debug!("{} is available", ffmpeg);
    Ok(())
}

/// Run the transcoder against `input` and collect the subtitle streams it reports.
///
/// The transcoder exits non-zero when given no output file; only its
/// diagnostic text matters here. An empty result means the container has no
/// subtitle streams.
pub async fn probe_container(ffmpeg: &str, input: &Path) -> Result<Vec<TrackRecord>> {
    if !input.exists() {
        return Err(SubextractError::FileNotFound(input.display().to_string()));
    }

    info!("Analyzing subtitle streams in {}", input.display());

    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-i")
        .arg(input)
        .output()
        .await
        .map_err(|e| SubextractError::Transcoder(format!("Failed to run {ffmpeg}: {e}")))?;

    let report = String::from_utf8_lossy(&output.stderr);
    debug!("Raw stream report:\n{}", report);

    let tracks = parse_stream_report(&report);
    info!("Found {} subtitle stream(s)", tracks.len());

    Ok(tracks)
}
