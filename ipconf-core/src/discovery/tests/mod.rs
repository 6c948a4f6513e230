mod memory_tests;

use crate::discovery::WatchHandler;
use std::sync::Mutex;

/// Helper: handler that records every callback as a line.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl WatchHandler for Recorder {
    fn on_set(&self, key: &str, value: &str) {
        self.seen.lock().unwrap().push(format!("set {key}={value}"));
    }

    fn on_delete(&self, key: &str, value: &str) {
        self.seen.lock().unwrap().push(format!("delete {key}={value}"));
    }

    fn on_watch_lost(&self, prefix: &str, reason: &str) {
        self.seen.lock().unwrap().push(format!("lost {prefix}: {reason}"));
    }
}
