//! Runtime tests
//!
//! Full runs with real threads and a compressed clock, for both coordinator
//! implementations.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use vigil_core::{
    ConfigError, GuardStatus, Protocol, RoomEvent, RoomObserver, RoomSnapshot, RunConfig,
    TimingConfig,
};
use vigil_runtime::{Runtime, RuntimeError};

// Test environment: real time, activities shortened 20x
#[derive(Clone)]
struct FastEnv;

impl vigil_core::Environment for FastEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration / 20);
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(RoomEvent, RoomSnapshot)>>,
}

impl RoomObserver for Recorder {
    fn on_event(&self, event: &RoomEvent, snapshot: &RoomSnapshot) {
        self.events.lock().expect("recorder poisoned").push((*event, *snapshot));
    }
}

fn config(num_students: usize, capacity: usize, num_checks: u32, protocol: Protocol) -> RunConfig {
    RunConfig { num_students, capacity, num_checks, protocol, ..RunConfig::default() }
}

fn run_recorded(config: RunConfig) -> (vigil_runtime::RunReport, Vec<(RoomEvent, RoomSnapshot)>) {
    let recorder = Arc::new(Recorder::default());
    let report = Runtime::new(config, FastEnv)
        .unwrap()
        .with_observer(Arc::clone(&recorder) as Arc<dyn RoomObserver>)
        .run()
        .unwrap();
    let events = recorder.events.lock().unwrap().clone();
    (report, events)
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let result = Runtime::new(config(3, 0, 1, Protocol::Condvar), FastEnv);
    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::ZeroCapacity))));

    let result = Runtime::new(config(3, 1, 0, Protocol::Gates), FastEnv);
    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::ZeroChecks))));
}

#[test]
fn guard_alone_never_waits() {
    for protocol in [Protocol::Condvar, Protocol::Gates] {
        let (report, events) = run_recorded(config(0, 5, 3, protocol));

        assert_eq!(report.inspections, 3);
        assert!(report.visits.is_empty());
        assert!(!events.iter().any(|(e, _)| *e == RoomEvent::GuardWaiting));
        assert_eq!(events.iter().filter(|(e, _)| *e == RoomEvent::GuardInspecting).count(), 3);
        assert!(events.iter().all(|(_, s)| s.occupancy == 0));
    }
}

#[test]
fn every_entry_is_matched_by_an_exit() {
    for protocol in [Protocol::Condvar, Protocol::Gates] {
        let (report, events) = run_recorded(config(5, 2, 2, protocol));

        let entered =
            events.iter().filter(|(e, _)| matches!(e, RoomEvent::StudentEntered { .. })).count();
        let left =
            events.iter().filter(|(e, _)| matches!(e, RoomEvent::StudentLeft { .. })).count();

        assert_eq!(entered, left, "{protocol}: a student stayed in the room");
        assert_eq!(report.total_visits(), left as u64);
        assert_eq!(report.visits.len(), 5);
    }
}

#[test]
fn snapshots_respect_room_invariants() {
    for protocol in [Protocol::Condvar, Protocol::Gates] {
        let (report, events) = run_recorded(config(6, 2, 3, protocol));

        assert_eq!(report.inspections, 3);
        for (event, snapshot) in &events {
            assert!(snapshot.is_consistent(), "{protocol}: {event} produced {snapshot:?}");
            if let RoomEvent::StudentEntered { .. } = event {
                assert_eq!(snapshot.guard_status, GuardStatus::Outside);
            }
        }
        assert_eq!(events.iter().filter(|(e, _)| *e == RoomEvent::Closed).count(), 1);

        // After the room closes, students may only leave.
        let closed_at = events.iter().position(|(e, _)| *e == RoomEvent::Closed).unwrap();
        assert!(
            events[closed_at..]
                .iter()
                .all(|(e, _)| matches!(e, RoomEvent::Closed | RoomEvent::StudentLeft { .. }))
        );
    }
}

#[test]
fn zero_length_activities_still_terminate() {
    for protocol in [Protocol::Condvar, Protocol::Gates] {
        let config = RunConfig {
            timing: TimingConfig::instant(),
            ..config(4, 1, 5, protocol)
        };
        let report = Runtime::new(config, FastEnv).unwrap().run().unwrap();
        assert_eq!(report.inspections, 5);
    }
}

// Test environment: student 1 collapses the first time it sleeps.
#[derive(Clone)]
struct CollapsingEnv;

impl vigil_core::Environment for CollapsingEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        assert_ne!(std::thread::current().name(), Some("student-1"), "student collapsed");
        std::thread::sleep(duration / 20);
    }
}

#[test]
fn panicking_student_fails_the_run_without_hanging() {
    for protocol in [Protocol::Condvar, Protocol::Gates] {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let result = Runtime::new(config(1, 1, 3, protocol), CollapsingEnv).unwrap().run();
            tx.send(result).unwrap();
        });

        let result = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(
            matches!(&result, Err(RuntimeError::ActorPanicked { actor }) if actor == "student-1"),
            "{protocol}: {result:?}"
        );
    }
}

#[test]
fn oversized_student_count_is_rejected() {
    let result = Runtime::new(config(usize::MAX, 1, 1, Protocol::Condvar), FastEnv);
    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::TooManyStudents { .. }))));
}
