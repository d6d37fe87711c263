// This file is only compiled during tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::drone::{DroneLink, MoveCommand, NavFrame};

/// Scriptable vehicle link. Every `frame_count` read reports a fresh
/// frame, so pollers never wait. The served frame is selected by how
/// many in-place turns have happened, which lets calibration tests
/// script one reading per stop; the last frame repeats. Motion calls
/// are recorded as named events for assertions, and `settle` returns
/// immediately.
pub struct MockDrone {
    frames: Vec<NavFrame>,
    counter: AtomicU64,
    turns: Mutex<Vec<(f64, f64)>>,
    events: Mutex<Vec<&'static str>>,
}

impl MockDrone {
    pub fn with_frame(frame: NavFrame) -> Self {
        Self::with_frames(vec![frame])
    }

    pub fn with_frames(frames: Vec<NavFrame>) -> Self {
        assert!(!frames.is_empty(), "mock needs at least one frame");
        Self {
            frames,
            counter: AtomicU64::new(0),
            turns: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn turns(&self) -> Vec<(f64, f64)> {
        self.turns.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl DroneLink for MockDrone {
    fn frame_count(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn frame(&self) -> NavFrame {
        let turn_count = self.turns.lock().unwrap().len();
        let index = turn_count.min(self.frames.len() - 1);
        self.frames[index]
    }

    fn execute(&self, _command: MoveCommand) {
        self.record("move");
    }

    fn hover(&self) {
        self.record("hover");
    }

    fn takeoff(&self) {
        self.record("takeoff");
    }

    fn land(&self) {
        self.record("land");
    }

    fn turn_angle(&self, degrees: f64, speed: f64) {
        self.turns.lock().unwrap().push((degrees, speed));
        self.record("turn");
    }

    fn trim(&self) {
        self.record("trim");
    }

    fn mag_trim(&self) {
        self.record("mag_trim");
    }

    fn settle(&self, _wait: Duration) {
        // Simulated settling is instant.
    }
}
