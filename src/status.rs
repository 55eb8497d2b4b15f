//! Human-readable status lines for whatever UI is watching the recording
//!
//! Lines are mirrored to the `log` facade and kept in a short rolling
//! buffer. Writing a status line never fails and never affects control flow.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Local;

/// Number of lines retained for display
pub const STATUS_HISTORY: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, line: impl AsRef<str>) {
        self.record(log::Level::Info, line.as_ref());
    }

    pub fn warn(&self, line: impl AsRef<str>) {
        self.record(log::Level::Warn, line.as_ref());
    }

    pub fn debug(&self, line: impl AsRef<str>) {
        self.record(log::Level::Debug, line.as_ref());
    }

    pub fn record(&self, level: log::Level, line: &str) {
        log::log!(level, "{}", line);

        let stamped = format!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), line);
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() >= STATUS_HISTORY {
            lines.pop_front();
        }
        lines.push_back(stamped);
    }

    /// Snapshot of the retained lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().cloned().collect()
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().any(|l| l.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_timestamped() {
        let status = StatusLog::new();
        status.info("Finished recording");
        let lines = status.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" Finished recording"));
        assert!(lines[0].len() > "Finished recording".len());
    }

    #[test]
    fn test_history_is_bounded() {
        let status = StatusLog::new();
        for i in 0..(STATUS_HISTORY + 10) {
            status.debug(format!("line {}", i));
        }
        let lines = status.lines();
        assert_eq!(lines.len(), STATUS_HISTORY);
        assert!(lines[0].ends_with("line 10"));
        assert!(status.contains(&format!("line {}", STATUS_HISTORY + 9)));
    }

    #[test]
    fn test_clones_share_history() {
        let status = StatusLog::new();
        let ui = status.clone();
        status.warn("Dropped a video frame because writer was not ready");
        assert!(ui.contains("writer was not ready"));
    }
}
