//! Timers for the sync controller.
//!
//! All three are plain state machines driven by caller-supplied instants so
//! the controller can run under any clock.

use crate::document::DocumentId;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Trailing-edge debounce: each `schedule` restarts the wait
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline has passed. Firing clears the timer.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Outstanding self-write marks per document.
///
/// One mark is taken before each changing write and consumed by the
/// matching content-changed notification. Marks expire after `window` so a
/// store that never echoes cannot swallow a later outside change.
#[derive(Debug, Clone)]
pub struct EchoSuppressor {
    window: Duration,
    marks: HashMap<DocumentId, VecDeque<Instant>>,
}

impl EchoSuppressor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            marks: HashMap::new(),
        }
    }

    pub fn mark(&mut self, id: &DocumentId, now: Instant) {
        self.marks.entry(id.clone()).or_default().push_back(now);
    }

    /// Drop the newest mark for a write that did not happen
    pub fn unmark(&mut self, id: &DocumentId) {
        if let Some(marks) = self.marks.get_mut(id) {
            marks.pop_back();
            if marks.is_empty() {
                self.marks.remove(id);
            }
        }
    }

    /// Consume one live mark. True means the notification is our own echo.
    pub fn consume(&mut self, id: &DocumentId, now: Instant) -> bool {
        let Some(marks) = self.marks.get_mut(id) else {
            return false;
        };
        while let Some(&marked) = marks.front() {
            if now.saturating_duration_since(marked) > self.window {
                marks.pop_front();
            } else {
                break;
            }
        }
        let consumed = marks.pop_front().is_some();
        if marks.is_empty() {
            self.marks.remove(id);
        }
        consumed
    }

    pub fn pending(&self, id: &DocumentId) -> usize {
        self.marks.get(id).map(VecDeque::len).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

/// Ignores change notifications that land right after a refresh or an own
/// write
#[derive(Debug, Clone)]
pub struct RefreshGuard {
    window: Duration,
    last_refresh: Option<Instant>,
}

impl RefreshGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_refresh: None,
        }
    }

    pub fn refreshed(&mut self, now: Instant) {
        self.last_refresh = Some(now);
    }

    pub fn is_guarded(&self, now: Instant) -> bool {
        self.last_refresh
            .map(|at| now.saturating_duration_since(at) < self.window)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_debounce_restarts_on_schedule() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(300 * MS);

        debouncer.schedule(start);
        debouncer.schedule(start + 200 * MS);

        assert!(!debouncer.fire(start + 300 * MS));
        assert!(debouncer.fire(start + 500 * MS));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_echo_marks_are_consumed_once() {
        let start = Instant::now();
        let id = DocumentId::from("doc");
        let mut echoes = EchoSuppressor::new(2000 * MS);

        echoes.mark(&id, start);
        assert!(echoes.consume(&id, start + 10 * MS));
        assert!(!echoes.consume(&id, start + 20 * MS));
    }

    #[test]
    fn test_echo_marks_expire() {
        let start = Instant::now();
        let id = DocumentId::from("doc");
        let mut echoes = EchoSuppressor::new(2000 * MS);

        echoes.mark(&id, start);
        assert!(!echoes.consume(&id, start + 2500 * MS));
        assert_eq!(echoes.pending(&id), 0);
    }

    #[test]
    fn test_unmark_removes_latest() {
        let start = Instant::now();
        let id = DocumentId::from("doc");
        let mut echoes = EchoSuppressor::new(2000 * MS);

        echoes.mark(&id, start);
        echoes.mark(&id, start + MS);
        echoes.unmark(&id);
        assert_eq!(echoes.pending(&id), 1);
    }

    #[test]
    fn test_refresh_guard_window() {
        let start = Instant::now();
        let mut guard = RefreshGuard::new(100 * MS);
        assert!(!guard.is_guarded(start));

        guard.refreshed(start);
        assert!(guard.is_guarded(start + 50 * MS));
        assert!(!guard.is_guarded(start + 100 * MS));
    }
}
