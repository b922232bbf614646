use std::ffi::OsString;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::process::Command;
use tracing::debug;

use crate::export::{ExportOperation, OperationKind, OverwriteMode};

use super::{InvocationOutcome, Transcoder};

/// Runs operations through the `ffmpeg` command-line tool.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Translate an extract or convert operation into ffmpeg arguments.
///
/// Copy operations never reach the transcoder and yield `None`.
pub fn build_args(operation: &ExportOperation) -> Option<Vec<OsString>> {
    let mut args: Vec<OsString> = vec!["-hide_banner".into()];
    args.push(match operation.overwrite {
        OverwriteMode::Force => "-y".into(),
        OverwriteMode::NoClobber => "-n".into(),
    });
    args.push("-i".into());
    args.push(operation.source.clone().into_os_string());

    match &operation.kind {
        OperationKind::Extract { stream_id, codec } => {
            args.push("-map".into());
            args.push(stream_id.into());
            if let Some(codec) = codec {
                args.push("-c:s".into());
                args.push((*codec).into());
            }
        }
        OperationKind::Convert => {}
        OperationKind::Copy => return None,
    }

    args.push(operation.target.clone().into_os_string());
    Some(args)
}

/// Copy `operation.source` to its target, refusing to replace an existing
/// file under `NoClobber`.
async fn copy_file(operation: &ExportOperation) -> std::io::Result<u64> {
    match operation.overwrite {
        OverwriteMode::Force => fs::copy(&operation.source, &operation.target).await,
        OverwriteMode::NoClobber => {
            let mut reader = fs::File::open(&operation.source).await?;
            let mut writer = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&operation.target)
                .await?;
            tokio::io::copy(&mut reader, &mut writer).await
        }
    }
}

fn render_command(binary: &str, args: &[OsString]) -> String {
    std::iter::once(binary.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn invoke(&self, operation: &ExportOperation) -> InvocationOutcome {
        let Some(args) = build_args(operation) else {
            return match copy_file(operation).await {
                Ok(bytes) => InvocationOutcome::success(format!("copied {} bytes", bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    InvocationOutcome::failure(format!(
                        "{} already exists, not overwriting",
                        operation.target.display()
                    ))
                }
                Err(e) => InvocationOutcome::failure(format!(
                    "Failed to copy {}: {}",
                    operation.source.display(),
                    e
                )),
            };
        };

        debug!("Running: {}", render_command(&self.binary, &args));

        match Command::new(&self.binary).args(&args).output().await {
            Ok(output) => {
                let mut diagnostic = String::from_utf8_lossy(&output.stdout).into_owned();
                diagnostic.push_str(&String::from_utf8_lossy(&output.stderr));

                if output.status.success() {
                    InvocationOutcome::success(diagnostic)
                } else {
                    let code = output
                        .status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string());
                    InvocationOutcome::failure(format!(
                        "{} exited with {}\n{}",
                        self.binary, code, diagnostic
                    ))
                }
            }
            Err(e) => InvocationOutcome::failure(format!("Failed to run {}: {}", self.binary, e)),
        }
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OutputRole;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn operation(kind: OperationKind, overwrite: OverwriteMode) -> ExportOperation {
        ExportOperation {
            kind,
            source: PathBuf::from("/media/Movie.mkv"),
            target: PathBuf::from("/out/Movie.eng.srt"),
            overwrite,
            role: OutputRole::Original,
            track: 0,
            skip: false,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_extract_args() {
        let op = operation(
            OperationKind::Extract {
                stream_id: "0:2".to_string(),
                codec: None,
            },
            OverwriteMode::NoClobber,
        );
        assert_eq!(
            strings(build_args(&op).unwrap()),
            vec!["-hide_banner", "-n", "-i", "/media/Movie.mkv", "-map", "0:2", "/out/Movie.eng.srt"]
        );
    }

    #[test]
    fn test_extract_with_codec_args() {
        let op = operation(
            OperationKind::Extract {
                stream_id: "0:3".to_string(),
                codec: Some("srt"),
            },
            OverwriteMode::Force,
        );
        let args = strings(build_args(&op).unwrap());
        assert_eq!(args[1], "-y");
        assert_eq!(&args[4..8], ["-map", "0:3", "-c:s", "srt"]);
    }

    #[test]
    fn test_convert_args() {
        let op = operation(OperationKind::Convert, OverwriteMode::Force);
        assert_eq!(
            strings(build_args(&op).unwrap()),
            vec!["-hide_banner", "-y", "-i", "/media/Movie.mkv", "/out/Movie.eng.srt"]
        );
    }

    #[test]
    fn test_copy_has_no_args() {
        let op = operation(OperationKind::Copy, OverwriteMode::Force);
        assert!(build_args(&op).is_none());
    }

    #[tokio::test]
    async fn test_copy_invocation() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.srt");
        std::fs::write(&source, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();

        let op = ExportOperation {
            source: source.clone(),
            target: dir.path().join("out.srt"),
            ..operation(OperationKind::Copy, OverwriteMode::Force)
        };
        let outcome = FfmpegTranscoder::default().invoke(&op).await;

        assert!(outcome.success);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.srt")).unwrap(),
            std::fs::read_to_string(&source).unwrap()
        );
    }

    #[tokio::test]
    async fn test_no_clobber_copy_keeps_existing_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.srt");
        let target = dir.path().join("out.srt");
        std::fs::write(&source, "SECOND").unwrap();
        std::fs::write(&target, "FIRST").unwrap();

        let op = ExportOperation {
            source,
            target: target.clone(),
            ..operation(OperationKind::Copy, OverwriteMode::NoClobber)
        };
        let outcome = FfmpegTranscoder::default().invoke(&op).await;

        assert!(!outcome.success);
        assert!(outcome.diagnostic_output.contains("already exists"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "FIRST");
    }

    #[tokio::test]
    async fn test_no_clobber_copy_creates_missing_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.srt");
        std::fs::write(&source, "1\n").unwrap();

        let op = ExportOperation {
            source,
            target: dir.path().join("out.srt"),
            ..operation(OperationKind::Copy, OverwriteMode::NoClobber)
        };
        let outcome = FfmpegTranscoder::default().invoke(&op).await;

        assert!(outcome.success);
        assert_eq!(std::fs::read_to_string(dir.path().join("out.srt")).unwrap(), "1\n");
    }

    #[tokio::test]
    async fn test_missing_binary_is_failure() {
        let op = operation(OperationKind::Convert, OverwriteMode::Force);
        let outcome = FfmpegTranscoder::new("definitely-not-a-real-transcoder")
            .invoke(&op)
            .await;
        assert!(!outcome.success);
        assert!(outcome.diagnostic_output.contains("Failed to run"));
    }
}
