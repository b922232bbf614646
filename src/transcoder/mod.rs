pub mod ffmpeg;

pub use ffmpeg::{build_args, FfmpegTranscoder};

use crate::export::ExportOperation;
use async_trait::async_trait;

/// Result of running one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    pub success: bool,
    /// Combined output captured from the transcoder, for logging.
    pub diagnostic_output: String,
}

impl InvocationOutcome {
    pub fn success(diagnostic_output: impl Into<String>) -> Self {
        Self {
            success: true,
            diagnostic_output: diagnostic_output.into(),
        }
    }

    pub fn failure(diagnostic_output: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic_output: diagnostic_output.into(),
        }
    }
}

/// Executes single export operations.
///
/// Implementations report failure through the outcome rather than an error
/// so that one failed operation never stops a run.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn invoke(&self, operation: &ExportOperation) -> InvocationOutcome;
    fn name(&self) -> &'static str;
}
