//! Export session tests driven by a mock transcoder
//!
//! These tests validate sequencing, failure handling and progress without
//! spawning external processes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use subextract::config::VttNaming;
use subextract::export::{
    build_selections, plan, plan_names, ExportOperation, ExportRequest, OutputRole, PlanOptions,
};
use subextract::probe::TrackRecord;
use subextract::session::{ExportSession, OperationStatus};
use subextract::transcoder::{InvocationOutcome, Transcoder};
use tempfile::TempDir;

/// Records every invocation and fails the ones at the configured call numbers.
struct MockTranscoder {
    calls: Arc<Mutex<Vec<PathBuf>>>,
    fail_on: Vec<usize>,
}

impl MockTranscoder {
    fn new(fail_on: Vec<usize>) -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
                fail_on,
            },
            calls,
        )
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn invoke(&self, operation: &ExportOperation) -> InvocationOutcome {
        let mut calls = self.calls.lock().unwrap();
        calls.push(operation.target.clone());
        if self.fail_on.contains(&calls.len()) {
            InvocationOutcome::failure("Invalid data found when processing input")
        } else {
            InvocationOutcome::success("")
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn tracks(count: usize) -> Vec<TrackRecord> {
    let languages = ["eng", "fre", "ger", "jpn", "spa"];
    (0..count)
        .map(|i| TrackRecord {
            position: i,
            stream_id: format!("0:{}", i + 2),
            language: languages[i % languages.len()].to_string(),
            codec: if i % 2 == 0 { "subrip" } else { "ass" }.to_string(),
            description: format!("Track {}", i),
            safe_label: format!("Track_{}", i),
        })
        .collect()
}

fn build_plan(
    count: usize,
    original: &[usize],
    vtt: &[usize],
    export_dir: &Path,
    overwrite: bool,
) -> subextract::ExportPlan {
    let request = ExportRequest::new(
        tracks(count),
        build_selections(count, original, vtt).unwrap(),
    )
    .unwrap();
    let names = plan_names(&request, "Movie", VttNaming::Numbered);
    let options = PlanOptions {
        overwrite,
        ..Default::default()
    };
    plan(Path::new("/media/Movie.mkv"), &request, &names, export_dir, &options).unwrap()
}

fn session(transcoder: MockTranscoder) -> ExportSession {
    ExportSession::new(Box::new(transcoder))
        .with_progress(false)
        .with_keep_intermediates(true)
}

#[tokio::test]
async fn test_failure_does_not_stop_run() {
    let dir = TempDir::new().unwrap();
    let plan = build_plan(5, &[0, 1, 2, 3, 4], &[], dir.path(), true);
    let (transcoder, calls) = MockTranscoder::new(vec![2]);

    let summary = session(transcoder).run(&plan).await;

    assert_eq!(calls.lock().unwrap().len(), 5);
    assert_eq!(summary.outcomes.len(), 5);
    assert!(matches!(
        summary.outcomes[1].status,
        OperationStatus::Failed { ref diagnostic } if diagnostic.contains("Invalid data")
    ));
    for outcome in &summary.outcomes[2..] {
        assert_eq!(outcome.status, OperationStatus::Succeeded);
    }
    assert_eq!(summary.originals_exported, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.progress, 100.0);
}

#[tokio::test]
async fn test_skipped_operation_is_not_invoked() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Movie.eng.srt"), "1\n").unwrap();

    let plan = build_plan(2, &[0, 1], &[], dir.path(), false);
    let (transcoder, calls) = MockTranscoder::new(vec![]);

    let summary = session(transcoder).run(&plan).await;

    assert_eq!(*calls.lock().unwrap(), vec![dir.path().join("Movie.fre.ass")]);
    assert_eq!(summary.outcomes[0].status, OperationStatus::Skipped);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.originals_exported, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.progress, 100.0);
}

#[tokio::test]
async fn test_operations_run_in_plan_order() {
    let dir = TempDir::new().unwrap();
    let plan = build_plan(2, &[0, 1], &[0, 1], dir.path(), true);
    let (transcoder, calls) = MockTranscoder::new(vec![]);

    let summary = session(transcoder).run(&plan).await;

    let expected: Vec<PathBuf> = plan.operations.iter().map(|op| op.target.clone()).collect();
    assert_eq!(*calls.lock().unwrap(), expected);
    assert_eq!(summary.originals_exported, 2);
    assert_eq!(summary.vtts_exported, 2);
    assert_eq!(
        summary.exported_paths().cloned().collect::<Vec<_>>(),
        vec![
            dir.path().join("Movie.eng.srt"),
            dir.path().join("subtitle1.vtt"),
            dir.path().join("Movie.fre.ass"),
            dir.path().join("subtitle2.vtt"),
        ]
    );
}

#[tokio::test]
async fn test_failed_intermediate_fails_its_conversion() {
    let dir = TempDir::new().unwrap();
    let plan = build_plan(2, &[], &[0, 1], dir.path(), true);
    let (transcoder, calls) = MockTranscoder::new(vec![1]);

    let summary = session(transcoder).run(&plan).await;

    // the second pipeline still runs both stages
    assert_eq!(calls.lock().unwrap().len(), 3);
    assert_eq!(summary.outcomes[0].role, OutputRole::Intermediate);
    assert!(matches!(summary.outcomes[0].status, OperationStatus::Failed { .. }));
    assert_eq!(summary.outcomes[1].role, OutputRole::Vtt);
    assert!(matches!(summary.outcomes[1].status, OperationStatus::Failed { .. }));
    assert_eq!(summary.outcomes[3].status, OperationStatus::Succeeded);
    assert_eq!(summary.vtts_exported, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.progress, 100.0);
}

#[tokio::test]
async fn test_stale_intermediate_is_not_converted() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("__temp__0.srt");
    std::fs::write(&stale, "STALE FROM PREVIOUS RUN").unwrap();

    let plan = build_plan(1, &[], &[0], dir.path(), true);
    let (transcoder, calls) = MockTranscoder::new(vec![1]);
    let session = ExportSession::new(Box::new(transcoder)).with_progress(false);
    let summary = session.run(&plan).await;

    assert_eq!(*calls.lock().unwrap(), vec![dir.path().join("__temp___0.srt")]);
    assert_eq!(summary.vtts_exported, 0);
    assert_eq!(summary.exported_paths().count(), 0);
    assert_eq!(
        std::fs::read_to_string(&stale).unwrap(),
        "STALE FROM PREVIOUS RUN"
    );
}

#[tokio::test]
async fn test_intermediates_removed_after_run() {
    let dir = TempDir::new().unwrap();
    let plan = build_plan(1, &[], &[0], dir.path(), true);
    let intermediate = plan.intermediates[0].clone();
    std::fs::write(&intermediate, "1\n").unwrap();

    let (transcoder, _calls) = MockTranscoder::new(vec![]);
    let session = ExportSession::new(Box::new(transcoder)).with_progress(false);
    let summary = session.run(&plan).await;

    assert_eq!(summary.vtts_exported, 1);
    assert!(!intermediate.exists());
}

#[tokio::test]
async fn test_intermediates_kept_on_request() {
    let dir = TempDir::new().unwrap();
    let plan = build_plan(1, &[], &[0], dir.path(), true);
    let intermediate = plan.intermediates[0].clone();
    std::fs::write(&intermediate, "1\n").unwrap();

    let (transcoder, _calls) = MockTranscoder::new(vec![]);
    session(transcoder).run(&plan).await;

    assert!(intermediate.exists());
}
