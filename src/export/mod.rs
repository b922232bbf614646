pub mod naming;
pub mod plan;

pub use naming::{plan_names, NamingContext, NamingResult};
pub use plan::{choose_intermediate_prefix, plan, plan_files, PlanOptions};

use crate::error::{Result, SubextractError};
use crate::probe::TrackRecord;
use std::path::PathBuf;

/// What the user asked to export for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSelection {
    /// Export the track in its native format (SRT or ASS).
    pub original: bool,
    /// Export the track as WebVTT.
    pub vtt: bool,
}

impl ExportSelection {
    pub fn new(original: bool, vtt: bool) -> Self {
        Self { original, vtt }
    }

    /// Number of export tasks this selection asks for.
    pub fn task_count(&self) -> usize {
        usize::from(self.original) + usize::from(self.vtt)
    }
}

/// Build one selection per entry from the 0-based indices chosen for
/// original and WebVTT export.
pub fn build_selections(len: usize, original: &[usize], vtt: &[usize]) -> Result<Vec<ExportSelection>> {
    let mut selections = vec![ExportSelection::default(); len];

    for &i in original {
        selections
            .get_mut(i)
            .ok_or_else(|| out_of_range(i, len))?
            .original = true;
    }
    for &i in vtt {
        selections.get_mut(i).ok_or_else(|| out_of_range(i, len))?.vtt = true;
    }

    Ok(selections)
}

fn out_of_range(index: usize, len: usize) -> SubextractError {
    SubextractError::InvalidSelection(format!(
        "track {} does not exist (source has {} track(s))",
        index + 1,
        len
    ))
}

/// A track paired with its selection.
#[derive(Debug, Clone)]
pub struct SelectedTrack {
    pub track: TrackRecord,
    pub selection: ExportSelection,
}

/// Tracks of one source together with the user's selections.
///
/// Building the request is the only place where tracks and selections are
/// matched up; after that every track carries its own selection.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    entries: Vec<SelectedTrack>,
}

impl ExportRequest {
    pub fn new(tracks: Vec<TrackRecord>, selections: Vec<ExportSelection>) -> Result<Self> {
        if tracks.len() != selections.len() {
            return Err(SubextractError::SelectionMismatch {
                tracks: tracks.len(),
                selections: selections.len(),
            });
        }

        let entries = tracks
            .into_iter()
            .zip(selections)
            .map(|(track, selection)| SelectedTrack { track, selection })
            .collect();

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SelectedTrack] {
        &self.entries
    }

    pub fn task_count(&self) -> usize {
        self.entries.iter().map(|e| e.selection.task_count()).sum()
    }

    pub fn originals(&self) -> impl Iterator<Item = &TrackRecord> {
        self.entries
            .iter()
            .filter(|e| e.selection.original)
            .map(|e| &e.track)
    }

    pub fn vtts(&self) -> impl Iterator<Item = &TrackRecord> {
        self.entries.iter().filter(|e| e.selection.vtt).map(|e| &e.track)
    }
}

/// How the transcoder treats an existing target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteMode {
    Force,
    NoClobber,
}

impl OverwriteMode {
    pub fn from_flag(overwrite: bool) -> Self {
        if overwrite {
            OverwriteMode::Force
        } else {
            OverwriteMode::NoClobber
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// Pull one stream out of the source container. With `codec` set the
    /// stream is transcoded to that subtitle codec on the way out.
    Extract {
        stream_id: String,
        codec: Option<&'static str>,
    },
    /// Transcode an existing subtitle file into the target's format.
    Convert,
    /// Copy a file byte for byte.
    Copy,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Extract { .. } => write!(f, "extract"),
            OperationKind::Convert => write!(f, "convert"),
            OperationKind::Copy => write!(f, "copy"),
        }
    }
}

/// What an operation's target is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRole {
    Original,
    Intermediate,
    Vtt,
}

/// One planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOperation {
    pub kind: OperationKind,
    pub source: PathBuf,
    pub target: PathBuf,
    pub overwrite: OverwriteMode,
    pub role: OutputRole,
    /// Position of the track or file this operation belongs to.
    pub track: usize,
    /// Target already exists and overwriting is disabled.
    pub skip: bool,
}

impl ExportOperation {
    /// Whether finishing this operation completes a selected export task.
    pub fn completes_task(&self) -> bool {
        self.role != OutputRole::Intermediate
    }
}

/// Ordered operations for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportPlan {
    pub operations: Vec<ExportOperation>,
    /// Number of selected export tasks; drives progress.
    pub tasks: usize,
    /// Intermediate files the plan writes.
    pub intermediates: Vec<PathBuf>,
}

impl ExportPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
