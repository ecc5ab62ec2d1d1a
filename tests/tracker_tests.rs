//! Load Tracker Tests
//!
//! Tests for:
//! - Progress ratio and the single Complete event
//! - Settle delay measured from completion detection
//! - Failure accounting and dropped handles
//! - Session sealing
//! - Concurrent settlement from worker threads

use std::thread;
use std::time::{Duration, Instant};

use lumen::assets::{LoadEvent, LoadTracker, ResourceKind};
use lumen::errors::AssetError;

fn drain(rx: &flume::Receiver<LoadEvent>) -> Vec<LoadEvent> {
    rx.try_iter().collect()
}

fn completes(events: &[LoadEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, LoadEvent::Complete(_)))
        .count()
}

// ============================================================================
// Progress & completion
// ============================================================================

#[test]
fn all_resolved_gives_full_ratio_and_one_complete() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let rx = tracker.subscribe();

    let handles: Vec<_> = (0..5)
        .map(|i| tracker.register(ResourceKind::Texture, format!("tex{i}")).unwrap())
        .collect();
    for h in handles {
        h.resolve();
    }

    let progress = tracker.progress();
    assert_eq!((progress.loaded, progress.total), (5, 5));
    assert!((progress.ratio() - 1.0).abs() < f32::EPSILON);

    let now = Instant::now();
    assert!(tracker.poll(now));
    for i in 1..10 {
        assert!(!tracker.poll(now + Duration::from_millis(i * 100)));
    }

    let events = drain(&rx);
    assert_eq!(completes(&events), 1);
    assert!(tracker.is_complete());
}

#[test]
fn progress_events_are_monotonic() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let rx = tracker.subscribe();
    let handles: Vec<_> = (0..4)
        .map(|_| tracker.register(ResourceKind::Mesh, "m").unwrap())
        .collect();
    for h in handles {
        h.resolve();
    }

    let ratios: Vec<f32> = drain(&rx)
        .into_iter()
        .filter_map(|e| match e {
            LoadEvent::Progress(p) => Some(p.ratio()),
            _ => None,
        })
        .collect();
    assert_eq!(ratios.len(), 4);
    assert!(ratios.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn empty_session_never_completes() {
    let tracker = LoadTracker::new(Duration::ZERO);
    assert!(!tracker.poll(Instant::now()));
    assert!(!tracker.is_complete());
}

#[test]
fn complete_waits_for_settle_delay() {
    let tracker = LoadTracker::new(Duration::from_millis(500));
    let rx = tracker.subscribe();
    tracker.register(ResourceKind::Texture, "a").unwrap().resolve();

    let t0 = Instant::now();
    assert!(!tracker.poll(t0));
    assert!(!tracker.poll(t0 + Duration::from_millis(499)));
    assert!(tracker.poll(t0 + Duration::from_millis(500)));
    assert_eq!(completes(&drain(&rx)), 1);
}

#[test]
fn pending_resource_blocks_completion() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let a = tracker.register(ResourceKind::Texture, "a").unwrap();
    let b = tracker.register(ResourceKind::Texture, "b").unwrap();
    a.resolve();
    assert!(!tracker.poll(Instant::now()));
    assert!((tracker.progress().ratio() - 0.5).abs() < f32::EPSILON);
    b.resolve();
    assert!(tracker.poll(Instant::now()));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failed_resource_counts_toward_completion() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let rx = tracker.subscribe();
    let ok = tracker.register(ResourceKind::Mesh, "helmet").unwrap();
    let bad = tracker.register(ResourceKind::CubeTexture, "env").unwrap();

    ok.resolve();
    bad.fail("404");

    let progress = tracker.progress();
    assert_eq!((progress.loaded, progress.failed, progress.total), (2, 1, 2));
    assert!(tracker.poll(Instant::now()));

    let events = drain(&rx);
    assert!(events.iter().any(|e| matches!(
        e,
        LoadEvent::Failed { label, kind: ResourceKind::CubeTexture, reason } if label == "env" && reason == "404"
    )));
}

#[test]
fn dropped_handle_counts_as_failure() {
    let tracker = LoadTracker::new(Duration::ZERO);
    {
        let _handle = tracker.register(ResourceKind::Texture, "lost").unwrap();
    }
    let progress = tracker.progress();
    assert_eq!((progress.loaded, progress.failed), (1, 1));
    assert!(tracker.poll(Instant::now()));
}

// ============================================================================
// Sealing
// ============================================================================

#[test]
fn registration_after_first_settle_is_rejected() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let a = tracker.register(ResourceKind::Texture, "a").unwrap();
    let _b = tracker.register(ResourceKind::Texture, "b").unwrap();
    assert!(!tracker.is_sealed());

    a.resolve();
    assert!(tracker.is_sealed());

    let late = tracker.register(ResourceKind::Mesh, "late");
    assert!(matches!(late, Err(AssetError::SessionSealed(label)) if label == "late"));
    assert_eq!(tracker.progress().total, 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_settlement_loses_no_updates() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let rx = tracker.subscribe();
    let handles: Vec<_> = (0..64)
        .map(|i| tracker.register(ResourceKind::Texture, format!("t{i}")).unwrap())
        .collect();

    let workers: Vec<_> = handles
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            thread::spawn(move || {
                if i % 8 == 0 {
                    h.fail("corrupt");
                } else {
                    h.resolve();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let progress = tracker.progress();
    assert_eq!((progress.loaded, progress.failed, progress.total), (64, 8, 64));
    assert!(tracker.poll(Instant::now()));
    assert!(!tracker.poll(Instant::now()));
    assert_eq!(completes(&drain(&rx)), 1);
}

#[test]
fn clones_share_one_session() {
    let tracker = LoadTracker::new(Duration::ZERO);
    let other = tracker.clone();
    other.register(ResourceKind::Mesh, "m").unwrap().resolve();
    assert_eq!(tracker.progress().loaded, 1);
    assert!(tracker.poll(Instant::now()));
    assert!(other.is_complete());
}
