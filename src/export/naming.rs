use std::collections::{BTreeMap, HashMap};

use crate::config::{SubtitleFormat, VttNaming};
use crate::probe::TrackRecord;

use super::ExportRequest;

/// Per-language count of the tracks selected in one run.
#[derive(Debug, Clone, Default)]
pub struct NamingContext {
    counts: HashMap<String, usize>,
}

impl NamingContext {
    pub fn from_tracks<'a>(tracks: impl IntoIterator<Item = &'a TrackRecord>) -> Self {
        let mut counts = HashMap::new();
        for track in tracks {
            *counts.entry(track.language.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, language: &str) -> usize {
        self.counts.get(language).copied().unwrap_or(0)
    }

    /// `<base>.<lang>.<ext>`, or `<base>.<lang>.<safe_label>.<ext>` when the
    /// language is shared by several selected tracks.
    pub fn file_name(&self, base_name: &str, track: &TrackRecord, extension: &str) -> String {
        if self.count(&track.language) > 1 {
            format!(
                "{}.{}.{}.{}",
                base_name, track.language, track.safe_label, extension
            )
        } else {
            format!("{}.{}.{}", base_name, track.language, extension)
        }
    }
}

/// Output filenames for one run, keyed by track position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingResult {
    pub originals: BTreeMap<usize, String>,
    pub vtts: BTreeMap<usize, String>,
}

impl NamingResult {
    pub fn original(&self, position: usize) -> Option<&str> {
        self.originals.get(&position).map(String::as_str)
    }

    pub fn vtt(&self, position: usize) -> Option<&str> {
        self.vtts.get(&position).map(String::as_str)
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.originals
            .values()
            .chain(self.vtts.values())
            .map(String::as_str)
    }
}

/// Compute the output filenames of every selected export.
///
/// Numbered VTT names do not say which language or track they came from.
pub fn plan_names(request: &ExportRequest, base_name: &str, vtt_naming: VttNaming) -> NamingResult {
    let context = NamingContext::from_tracks(request.originals());

    let originals = request
        .originals()
        .map(|track| {
            let ext = track.original_format().extension();
            (track.position, context.file_name(base_name, track, ext))
        })
        .collect();

    let vtt_tracks: Vec<&TrackRecord> = request.vtts().collect();
    let vtt_ext = SubtitleFormat::Vtt.extension();

    let vtts = match vtt_naming {
        VttNaming::Numbered if vtt_tracks.len() == 1 => vtt_tracks
            .iter()
            .map(|t| (t.position, format!("{}.{}", base_name, vtt_ext)))
            .collect(),
        VttNaming::Numbered => vtt_tracks
            .iter()
            .enumerate()
            .map(|(n, t)| (t.position, format!("subtitle{}.{}", n + 1, vtt_ext)))
            .collect(),
        VttNaming::Language => {
            let vtt_context = NamingContext::from_tracks(vtt_tracks.iter().copied());
            vtt_tracks
                .iter()
                .map(|t| (t.position, vtt_context.file_name(base_name, t, vtt_ext)))
                .collect()
        }
    };

    NamingResult { originals, vtts }
}
