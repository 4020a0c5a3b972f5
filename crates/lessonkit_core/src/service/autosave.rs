//! Debounce for whole-lesson saves.
//!
//! Each edit restarts the quiet period; a save is due only once no edit has
//! arrived for `delay`.

use crate::config::EditorConfig;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AutosaveDebouncer {
    delay: Duration,
    last_change: Option<Instant>,
}

impl AutosaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_change: None,
        }
    }

    /// Uses `editor.autosave_debounce_ms`.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.autosave_debounce())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records an edit at `now`.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// Whether the quiet period has elapsed since the last edit.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|changed| now.saturating_duration_since(changed) >= self.delay)
    }

    /// Returns true and clears the dirty flag when a save is due.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last_change = None;
            return true;
        }
        false
    }

    /// Forgets pending edits, e.g. after an explicit save.
    pub fn clear(&mut self) {
        self.last_change = None;
    }
}
