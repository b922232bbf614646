use crate::export::{ExportOperation, ExportPlan, OutputRole};
use crate::transcoder::Transcoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Percentage progress over the selected tasks of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    step: f64,
    value: f64,
}

impl Progress {
    pub fn new(tasks: usize) -> Self {
        let step = if tasks == 0 { 100.0 } else { 100.0 / tasks as f64 };
        Self { step, value: 0.0 }
    }

    pub fn advance(&mut self) {
        self.value = (self.value + self.step).min(100.0);
    }

    pub fn finish(&mut self) {
        self.value = 100.0;
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Succeeded,
    Failed { diagnostic: String },
    Skipped,
}

/// What happened to one planned operation.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub index: usize,
    pub role: OutputRole,
    pub target: PathBuf,
    pub status: OperationStatus,
}

/// Aggregated results of an export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub outcomes: Vec<OperationOutcome>,
    pub originals_exported: usize,
    pub vtts_exported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub progress: f64,
    pub total_time: Duration,
}

impl ExportSummary {
    pub fn exported_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes
            .iter()
            .filter(|o| o.role != OutputRole::Intermediate && o.status == OperationStatus::Succeeded)
            .map(|o| &o.target)
    }
}

/// Runs an export plan one operation at a time.
pub struct ExportSession {
    transcoder: Box<dyn Transcoder>,
    show_progress: bool,
    keep_intermediates: bool,
}

impl ExportSession {
    pub fn new(transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            transcoder,
            show_progress: true,
            keep_intermediates: false,
        }
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Leave intermediate files in place after the run.
    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Execute every operation of `plan` in order.
    ///
    /// Failed and skipped operations are recorded and the run moves on; no
    /// operation starts before the previous one has finished. The conversion
    /// stage of a VTT pipeline whose intermediate failed is recorded as failed
    /// without being run.
    pub async fn run(&self, plan: &ExportPlan) -> ExportSummary {
        let start_time = Instant::now();
        let mut progress = Progress::new(plan.tasks);

        info!(
            "Exporting {} task(s) in {} operation(s) with {}",
            plan.tasks,
            plan.len(),
            self.transcoder.name()
        );

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(plan.tasks as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} exports")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut outcomes = Vec::with_capacity(plan.len());
        let mut broken_pipelines = HashSet::new();

        for (index, operation) in plan.operations.iter().enumerate() {
            let status = if operation.role == OutputRole::Vtt
                && broken_pipelines.contains(&operation.track)
            {
                warn!(
                    "[{}] Not converting {}: its intermediate file was not produced",
                    index + 1,
                    operation.target.display()
                );
                OperationStatus::Failed {
                    diagnostic: format!("intermediate for {} failed", operation.target.display()),
                }
            } else {
                self.execute(index, operation).await
            };

            if operation.role == OutputRole::Intermediate
                && matches!(status, OperationStatus::Failed { .. })
            {
                broken_pipelines.insert(operation.track);
            }

            if operation.completes_task() {
                progress.advance();
                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                }
                debug!("Progress: {:.1}%", progress.value());
            }

            outcomes.push(OperationOutcome {
                index,
                role: operation.role,
                target: operation.target.clone(),
                status,
            });
        }

        progress.finish();
        if let Some(pb) = progress_bar {
            pb.finish_with_message("Export complete");
        }

        if !self.keep_intermediates {
            remove_intermediates(&plan.intermediates).await;
        }

        let count = |role: OutputRole| {
            outcomes
                .iter()
                .filter(|o| o.role == role && o.status == OperationStatus::Succeeded)
                .count()
        };
        let originals_exported = count(OutputRole::Original);
        let vtts_exported = count(OutputRole::Vtt);
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == OperationStatus::Skipped)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o.status, OperationStatus::Failed { .. }))
            .count();

        info!(
            "Export complete: {} original + {} VTT exported, {} skipped, {} failed",
            originals_exported, vtts_exported, skipped, failed
        );

        ExportSummary {
            outcomes,
            originals_exported,
            vtts_exported,
            skipped,
            failed,
            progress: progress.value(),
            total_time: start_time.elapsed(),
        }
    }

    async fn execute(&self, index: usize, operation: &ExportOperation) -> OperationStatus {
        if operation.skip {
            info!("[SKIP] {} exists", operation.target.display());
            return OperationStatus::Skipped;
        }

        info!(
            "[{}] {} {} -> {}",
            index + 1,
            operation.kind,
            operation.source.display(),
            operation.target.display()
        );

        let outcome = self.transcoder.invoke(operation).await;

        if outcome.success {
            debug!("{}", outcome.diagnostic_output);
            OperationStatus::Succeeded
        } else {
            warn!(
                "[{}] {} failed for {}:\n{}",
                index + 1,
                operation.kind,
                operation.target.display(),
                outcome.diagnostic_output
            );
            OperationStatus::Failed {
                diagnostic: outcome.diagnostic_output,
            }
        }
    }
}

async fn remove_intermediates(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed intermediate {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove intermediate {}: {}", path.display(), e),
        }
    }
}

/// Print a summary of the export results.
pub fn print_summary(summary: &ExportSummary, export_dir: &std::path::Path) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Subtitle Export Complete                 ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Directory:  {}", export_dir.display());
    println!("  Originals:  {}", summary.originals_exported);
    println!("  VTT:        {}", summary.vtts_exported);
    if summary.skipped > 0 {
        println!("  Skipped:    {} (already exist)", summary.skipped);
    }
    if summary.failed > 0 {
        println!("  Failed:     {}", summary.failed);
    }
    println!("  Time:       {:.2}s", summary.total_time.as_secs_f64());
    println!();
    for path in summary.exported_paths() {
        println!("    {}", path.display());
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
