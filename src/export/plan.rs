use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{Config, SubtitleFormat};
use crate::error::{Result, SubextractError};
use crate::source::SubtitleFile;

use super::{
    ExportOperation, ExportPlan, ExportRequest, ExportSelection, NamingResult, OperationKind,
    OutputRole, OverwriteMode,
};

/// Options that shape a plan.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Replace existing targets. When false, existing targets are skipped.
    pub overwrite: bool,
    /// Starting point for the intermediate file prefix.
    pub intermediate_prefix: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            intermediate_prefix: "__temp__".to_string(),
        }
    }
}

impl From<&Config> for PlanOptions {
    fn from(config: &Config) -> Self {
        Self {
            overwrite: config.overwrite,
            intermediate_prefix: config.intermediate_prefix.clone(),
        }
    }
}

/// Extend `base` with underscores until no final output name starts with it
/// and none of the intermediate files it would name for `positions` already
/// exists in `export_dir`.
pub fn choose_intermediate_prefix<'a>(
    base: &str,
    final_names: impl IntoIterator<Item = &'a str>,
    export_dir: &Path,
    positions: &[usize],
) -> String {
    let names: Vec<&str> = final_names.into_iter().collect();
    let mut prefix = base.to_string();
    while names.iter().any(|name| name.starts_with(&prefix))
        || positions
            .iter()
            .any(|&pos| intermediate_path(export_dir, &prefix, pos).exists())
    {
        prefix.push('_');
    }
    prefix
}

fn is_blocked(target: &Path, options: &PlanOptions) -> bool {
    !options.overwrite && target.exists()
}

/// Build the ordered operations that export the selected tracks of the
/// container at `source` into `export_dir`.
///
/// Operations follow track order. A track's original export comes before
/// its WebVTT pipeline, which always extracts to an intermediate SRT file
/// first and converts that file to WebVTT second.
pub fn plan(
    source: &Path,
    request: &ExportRequest,
    names: &NamingResult,
    export_dir: &Path,
    options: &PlanOptions,
) -> Result<ExportPlan> {
    let tasks = request.task_count();
    if tasks == 0 {
        return Err(SubextractError::NothingSelected);
    }

    let pipelines: Vec<usize> = request.vtts().map(|track| track.position).collect();
    let prefix = choose_intermediate_prefix(
        &options.intermediate_prefix,
        names.all_names(),
        export_dir,
        &pipelines,
    );
    let overwrite = OverwriteMode::from_flag(options.overwrite);
    let mut plan = ExportPlan {
        tasks,
        ..Default::default()
    };

    for entry in request.entries() {
        let track = &entry.track;

        if entry.selection.original {
            let name = names
                .original(track.position)
                .ok_or(SubextractError::MissingName(track.position))?;
            let target = export_dir.join(name);
            let skip = is_blocked(&target, options);

            plan.operations.push(ExportOperation {
                kind: OperationKind::Extract {
                    stream_id: track.stream_id.clone(),
                    codec: None,
                },
                source: source.to_path_buf(),
                target,
                overwrite,
                role: OutputRole::Original,
                track: track.position,
                skip,
            });
        }

        if entry.selection.vtt {
            let name = names
                .vtt(track.position)
                .ok_or(SubextractError::MissingName(track.position))?;
            let target = export_dir.join(name);
            let intermediate = intermediate_path(export_dir, &prefix, track.position);
            let skip = is_blocked(&target, options);

            plan.operations.push(ExportOperation {
                kind: OperationKind::Extract {
                    stream_id: track.stream_id.clone(),
                    codec: Some(SubtitleFormat::Srt.extension()),
                },
                source: source.to_path_buf(),
                target: intermediate.clone(),
                overwrite: OverwriteMode::Force,
                role: OutputRole::Intermediate,
                track: track.position,
                skip,
            });
            plan.operations.push(ExportOperation {
                kind: OperationKind::Convert,
                source: intermediate.clone(),
                target,
                overwrite,
                role: OutputRole::Vtt,
                track: track.position,
                skip,
            });

            if !skip {
                plan.intermediates.push(intermediate);
            }
        }
    }

    debug!(
        "Planned {} operations for {} tasks (intermediate prefix '{}')",
        plan.operations.len(),
        plan.tasks,
        prefix
    );

    Ok(plan)
}

/// Build the operations that export standalone subtitle files.
///
/// Originals are copied under their own file name; WebVTT outputs are named
/// after the file stem. ASS files reach WebVTT through an intermediate SRT.
pub fn plan_files(
    files: &[SubtitleFile],
    selections: &[ExportSelection],
    export_dir: &Path,
    options: &PlanOptions,
) -> Result<ExportPlan> {
    if files.len() != selections.len() {
        return Err(SubextractError::SelectionMismatch {
            tracks: files.len(),
            selections: selections.len(),
        });
    }

    let tasks: usize = selections.iter().map(ExportSelection::task_count).sum();
    if tasks == 0 {
        return Err(SubextractError::NothingSelected);
    }

    let final_names: Vec<String> = files
        .iter()
        .zip(selections)
        .flat_map(|(file, sel)| {
            let original = sel.original.then(|| file.file_name());
            let vtt = sel.vtt.then(|| file.vtt_name());
            original.into_iter().chain(vtt)
        })
        .collect();
    let pipelines: Vec<usize> = files
        .iter()
        .zip(selections)
        .enumerate()
        .filter(|(_, (file, sel))| sel.vtt && file.format == SubtitleFormat::Ass)
        .map(|(position, _)| position)
        .collect();
    let prefix = choose_intermediate_prefix(
        &options.intermediate_prefix,
        final_names.iter().map(String::as_str),
        export_dir,
        &pipelines,
    );

    let overwrite = OverwriteMode::from_flag(options.overwrite);
    let mut plan = ExportPlan {
        tasks,
        ..Default::default()
    };

    for (position, (file, selection)) in files.iter().zip(selections).enumerate() {
        if selection.original {
            let target = export_dir.join(file.file_name());
            let skip = is_blocked(&target, options);
            plan.operations.push(ExportOperation {
                kind: OperationKind::Copy,
                source: file.path.clone(),
                target,
                overwrite,
                role: OutputRole::Original,
                track: position,
                skip,
            });
        }

        if selection.vtt {
            let target = export_dir.join(file.vtt_name());
            let skip = is_blocked(&target, options);

            match file.format {
                SubtitleFormat::Ass => {
                    let intermediate = intermediate_path(export_dir, &prefix, position);
                    plan.operations.push(ExportOperation {
                        kind: OperationKind::Convert,
                        source: file.path.clone(),
                        target: intermediate.clone(),
                        overwrite: OverwriteMode::Force,
                        role: OutputRole::Intermediate,
                        track: position,
                        skip,
                    });
                    plan.operations.push(ExportOperation {
                        kind: OperationKind::Convert,
                        source: intermediate.clone(),
                        target,
                        overwrite,
                        role: OutputRole::Vtt,
                        track: position,
                        skip,
                    });
                    if !skip {
                        plan.intermediates.push(intermediate);
                    }
                }
                SubtitleFormat::Srt => plan.operations.push(ExportOperation {
                    kind: OperationKind::Convert,
                    source: file.path.clone(),
                    target,
                    overwrite,
                    role: OutputRole::Vtt,
                    track: position,
                    skip,
                }),
                SubtitleFormat::Vtt => plan.operations.push(ExportOperation {
                    kind: OperationKind::Copy,
                    source: file.path.clone(),
                    target,
                    overwrite,
                    role: OutputRole::Vtt,
                    track: position,
                    skip,
                }),
            }
        }
    }

    debug!(
        "Planned {} file operations for {} tasks",
        plan.operations.len(),
        plan.tasks
    );

    Ok(plan)
}

fn intermediate_path(export_dir: &Path, prefix: &str, position: usize) -> PathBuf {
    export_dir.join(format!(
        "{}{}.{}",
        prefix,
        position,
        SubtitleFormat::Srt.extension()
    ))
}
