//! Merge/compress coordinator integration tests

mod common;

use capture_session::edit::{EditCoordinator, JobKind, JobOutcome, JobStatus};
use capture_session::session::{EventSink, SessionEvent};
use capture_session::utils::error::CaptureError;
use common::FakeVideoTool;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

struct Fixture {
    dir: tempfile::TempDir,
    segments: Vec<PathBuf>,
}

impl Fixture {
    fn new(parts: &[&[u8]]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let path = dir.path().join(format!("VIDEO_{i}.mp4"));
                fs::write(&path, bytes).unwrap();
                path
            })
            .collect();
        Self { dir, segments }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("merged.mp4")
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("section_manifest.txt")
    }
}

fn coordinator(tool: Arc<FakeVideoTool>) -> (EditCoordinator, mpsc::UnboundedReceiver<SessionEvent>) {
    let (events, rx) = EventSink::channel();
    (EditCoordinator::new(tool, events), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_merge_progress_is_monotonic_and_finish_is_last() {
    let fixture = Fixture::new(&[b"AA", b"BB", b"CC", b"DD"]);
    let (coordinator, mut rx) = coordinator(FakeVideoTool::new());

    let ticket = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    assert_eq!(ticket.job.kind, JobKind::Merge);
    assert_eq!(ticket.job.status, JobStatus::Running);

    let outcome = ticket.finished().await;
    assert_eq!(outcome, JobOutcome::Finished(fixture.output()));
    assert_eq!(fs::read(fixture.output()).unwrap(), b"AABBCCDD");
    assert!(!fixture.manifest().exists());

    let events = drain(&mut rx);
    let (last, progress) = events.split_last().unwrap();
    assert_eq!(
        last,
        &SessionEvent::MergeFinished {
            output_path: fixture.output()
        }
    );
    let percents: Vec<u8> = progress
        .iter()
        .map(|e| match e {
            SessionEvent::MergeProgress { percent } => *percent,
            other => panic!("unexpected event before finish: {:?}", other),
        })
        .collect();
    assert_eq!(percents, vec![20, 40, 60, 80, 99]);

    let job = coordinator.job();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.progress, 100);
}

#[tokio::test]
async fn test_second_merge_is_rejected_while_running() {
    let fixture = Fixture::new(&[b"AA", b"BB"]);
    let tool = FakeVideoTool::held();
    let (coordinator, _rx) = coordinator(tool.clone());

    let first = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    let other_output = fixture.dir.path().join("other.mp4");
    let second = coordinator.merge(&other_output, &fixture.segments, &fixture.manifest());

    assert!(matches!(second, Err(CaptureError::AlreadyRunning)));
    let current = coordinator.job();
    assert_eq!(current.id, first.job.id);
    assert_eq!(current.status, JobStatus::Running);
    assert_eq!(current.output_path, Some(fixture.output()));
    assert!(matches!(
        coordinator.compress(&fixture.segments[0], &other_output),
        Err(CaptureError::AlreadyRunning)
    ));

    tool.release();
    assert_eq!(
        first.finished().await,
        JobOutcome::Finished(fixture.output())
    );
    assert!(!other_output.exists());

    // slot is free again
    let third = coordinator
        .merge(&other_output, &fixture.segments, &fixture.manifest())
        .unwrap();
    assert!(matches!(third.finished().await, JobOutcome::Finished(_)));
}

#[tokio::test]
async fn test_cancel_deletes_partial_output() {
    let fixture = Fixture::new(&[b"AA", b"BB"]);
    let tool = FakeVideoTool::held();
    let (coordinator, mut rx) = coordinator(tool.clone());

    let ticket = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    coordinator.cancel();
    coordinator.cancel();

    assert_eq!(ticket.finished().await, JobOutcome::Cancelled);
    assert!(!fixture.output().exists());
    assert!(!fixture.manifest().exists());
    assert_eq!(coordinator.job().status, JobStatus::Cancelled);
    assert!(coordinator.job().progress < 100);

    let events = drain(&mut rx);
    assert_eq!(events.last(), Some(&SessionEvent::MergeCancelled));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::MergeFinished { .. })));
}

#[tokio::test]
async fn test_tool_failure_surfaces_diagnostics() {
    let fixture = Fixture::new(&[b"AA", b"BB"]);
    let (coordinator, mut rx) = coordinator(FakeVideoTool::failing("Invalid data found when processing input"));

    let ticket = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    let outcome = ticket.finished().await;

    assert!(matches!(
        &outcome,
        JobOutcome::Failed(message) if message.contains("Invalid data found")
    ));
    assert!(!fixture.output().exists());
    assert_eq!(coordinator.job().status, JobStatus::Failed);

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::MergeError { message }) if message.contains("Invalid data found")
    ));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::MergeProgress { percent } if *percent >= 100)));
}

#[tokio::test]
async fn test_cancel_when_idle_is_noop() {
    let fixture = Fixture::new(&[b"AA"]);
    let (coordinator, _rx) = coordinator(FakeVideoTool::new());

    coordinator.cancel();
    assert_eq!(coordinator.job().status, JobStatus::Idle);

    // a cancel before the job must not leak into it
    let ticket = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    assert!(matches!(ticket.finished().await, JobOutcome::Finished(_)));
}

#[tokio::test]
async fn test_compress_reports_compress_progress() {
    let fixture = Fixture::new(&[b"clip"]);
    let (coordinator, mut rx) = coordinator(FakeVideoTool::new());
    let output = fixture.dir.path().join("small.mp4");

    let outcome = coordinator
        .compress(&fixture.segments[0], &output)
        .unwrap()
        .finished()
        .await;
    assert_eq!(outcome, JobOutcome::Finished(output.clone()));
    assert_eq!(fs::read(&output).unwrap(), b"clip-small");

    let events = drain(&mut rx);
    assert!(!events.is_empty());
    assert!(events
        .iter()
        .all(|e| matches!(e, SessionEvent::CompressProgress { percent } if *percent < 100)));
}

#[tokio::test]
async fn test_dispose_cancels_running_job() {
    let fixture = Fixture::new(&[b"AA"]);
    let tool = FakeVideoTool::held();
    let (coordinator, _rx) = coordinator(tool);

    let ticket = coordinator
        .merge(&fixture.output(), &fixture.segments, &fixture.manifest())
        .unwrap();
    coordinator.dispose();

    assert_eq!(ticket.finished().await, JobOutcome::Cancelled);
    assert!(!fixture.output().exists());
    assert!(matches!(
        coordinator.merge(&fixture.output(), &fixture.segments, &fixture.manifest()),
        Err(CaptureError::Cancelled)
    ));
}
