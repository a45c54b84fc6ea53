//! Debounced autosave as an explicit finite state machine.
//!
//! The machine never reads a clock. Every transition takes the current
//! [`Instant`] from the caller, so the debounce and display windows can be
//! driven by a real timer, a paused tokio clock, or plain arithmetic in tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Default inactivity window before a save.
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_secs(10);
/// Default time the "saved" indicator stays up.
pub const DEFAULT_SAVED_DISPLAY: Duration = Duration::from_secs(3);
/// Default time the "error" indicator stays up.
pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// Autosave timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Inactivity after the last mutation that triggers a save.
    pub idle_delay: Duration,
    /// How long `Saved` lasts before reverting to `Idle`.
    pub saved_display: Duration,
    /// How long `Error` lasts before unsaved edits are scheduled again.
    pub error_display: Duration,
    /// Persist unsaved edits when the session is torn down.
    pub flush_on_teardown: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            idle_delay: DEFAULT_IDLE_DELAY,
            saved_display: DEFAULT_SAVED_DISPLAY,
            error_display: DEFAULT_ERROR_DISPLAY,
            flush_on_teardown: false,
        }
    }
}

/// Observable autosave state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutosaveState {
    /// Nothing scheduled.
    Idle,
    /// Mutations seen; waiting for inactivity.
    Editing,
    /// A save is in flight.
    Saving,
    /// Last save succeeded.
    Saved,
    /// Last save failed.
    Error,
}

impl fmt::Display for AutosaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Work the caller must perform after [`AutosaveMachine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveAction {
    /// Persist the current snapshot, then call
    /// [`AutosaveMachine::complete_save`].
    Save,
}

/// Result of a save reported back to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The upsert succeeded.
    Success,
    /// The upsert failed; edits remain unsaved.
    Failure,
}

/// Autosave state machine for one editing session.
#[derive(Debug, Clone)]
pub struct AutosaveMachine {
    config: AutosaveConfig,
    state: AutosaveState,
    deadline: Option<Instant>,
    unsaved: bool,
    /// A mutation arrived while `Saving`; the in-flight save is stale.
    stale_save: bool,
}

impl AutosaveMachine {
    /// Create an idle machine.
    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            config,
            state: AutosaveState::Idle,
            deadline: None,
            unsaved: false,
            stale_save: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> AutosaveState {
        self.state
    }

    /// Configuration in effect.
    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Whether edits exist that no successful save has covered.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// When the machine next wants to be polled, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record a graph mutation at `now`.
    pub fn record_mutation(&mut self, now: Instant) {
        self.unsaved = true;
        match self.state {
            AutosaveState::Saving => {
                self.stale_save = true;
            }
            AutosaveState::Idle
            | AutosaveState::Editing
            | AutosaveState::Saved
            | AutosaveState::Error => {
                self.state = AutosaveState::Editing;
                self.deadline = Some(now + self.config.idle_delay);
            }
        }
    }

    /// Advance timers to `now`.
    ///
    /// Returns [`AutosaveAction::Save`] exactly when the inactivity window
    /// has fully elapsed since the last mutation.
    pub fn poll(&mut self, now: Instant) -> Option<AutosaveAction> {
        let due = matches!(self.deadline, Some(deadline) if now >= deadline);
        if !due {
            return None;
        }

        match self.state {
            AutosaveState::Editing => {
                self.state = AutosaveState::Saving;
                self.deadline = None;
                self.stale_save = false;
                Some(AutosaveAction::Save)
            }
            AutosaveState::Error if self.unsaved => {
                // Failed edits go back into the debounce cycle and retry.
                self.state = AutosaveState::Editing;
                self.deadline = Some(now + self.config.idle_delay);
                None
            }
            AutosaveState::Saved | AutosaveState::Error => {
                self.state = AutosaveState::Idle;
                self.deadline = None;
                None
            }
            AutosaveState::Idle | AutosaveState::Saving => None,
        }
    }

    /// Report the outcome of the save requested by the last `poll`.
    ///
    /// Ignored unless a save is in flight.
    pub fn complete_save(&mut self, now: Instant, outcome: SaveOutcome) {
        if self.state != AutosaveState::Saving {
            return;
        }

        match outcome {
            SaveOutcome::Success if self.stale_save => {
                self.state = AutosaveState::Editing;
                self.deadline = Some(now + self.config.idle_delay);
            }
            SaveOutcome::Success => {
                self.unsaved = false;
                self.state = AutosaveState::Saved;
                self.deadline = Some(now + self.config.saved_display);
            }
            SaveOutcome::Failure => {
                self.state = AutosaveState::Error;
                self.deadline = Some(now + self.config.error_display);
            }
        }
        self.stale_save = false;
    }

    /// Tear the session down: cancel any deadline and return to `Idle`.
    ///
    /// Returns whether unsaved edits existed at teardown.
    pub fn teardown(&mut self) -> bool {
        self.deadline = None;
        self.state = AutosaveState::Idle;
        self.stale_save = false;
        self.unsaved
    }
}

impl Default for AutosaveMachine {
    fn default() -> Self {
        Self::new(AutosaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_mutation_rearms_debounce() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();

        m.record_mutation(t0);
        assert_eq!(m.state(), AutosaveState::Editing);

        // 9.9 s of quiet, then another edit: no save
        assert_eq!(m.poll(t0 + ms(9_900)), None);
        m.record_mutation(t0 + ms(9_900));

        // 10 s after the first edit is only 0.1 s after the last one
        assert_eq!(m.poll(t0 + ms(10_000)), None);
        assert_eq!(m.poll(t0 + ms(19_899)), None);
        assert_eq!(m.poll(t0 + ms(19_900)), Some(AutosaveAction::Save));
        assert_eq!(m.state(), AutosaveState::Saving);
    }

    #[test]
    fn test_saved_reverts_to_idle() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);
        m.poll(t0 + ms(10_000));

        m.complete_save(t0 + ms(10_100), SaveOutcome::Success);
        assert_eq!(m.state(), AutosaveState::Saved);
        assert!(!m.has_unsaved_changes());

        m.poll(t0 + ms(13_000));
        assert_eq!(m.state(), AutosaveState::Saved);
        m.poll(t0 + ms(13_100));
        assert_eq!(m.state(), AutosaveState::Idle);
        assert_eq!(m.next_deadline(), None);
    }

    #[test]
    fn test_error_keeps_unsaved_flag() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);
        m.poll(t0 + ms(10_000));

        m.complete_save(t0 + ms(10_000), SaveOutcome::Failure);
        assert_eq!(m.state(), AutosaveState::Error);

        m.poll(t0 + ms(15_000));
        assert!(m.has_unsaved_changes());

        // A mutation during the error window starts a fresh cycle
        let mut edited = AutosaveMachine::default();
        edited.record_mutation(t0);
        edited.poll(t0 + ms(10_000));
        edited.complete_save(t0 + ms(10_000), SaveOutcome::Failure);
        edited.record_mutation(t0 + ms(12_000));
        assert_eq!(edited.state(), AutosaveState::Editing);
        assert_eq!(edited.poll(t0 + ms(22_000)), Some(AutosaveAction::Save));
    }

    #[test]
    fn test_failed_save_retries_without_new_edits() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);
        m.poll(t0 + ms(10_000));
        m.complete_save(t0 + ms(10_000), SaveOutcome::Failure);

        // Error window ends: back to waiting for the next save cycle
        assert_eq!(m.poll(t0 + ms(15_000)), None);
        assert_eq!(m.state(), AutosaveState::Editing);
        assert_eq!(m.next_deadline(), Some(t0 + ms(25_000)));

        assert_eq!(m.poll(t0 + ms(24_999)), None);
        assert_eq!(m.poll(t0 + ms(25_000)), Some(AutosaveAction::Save));

        m.complete_save(t0 + ms(25_000), SaveOutcome::Success);
        assert_eq!(m.state(), AutosaveState::Saved);
        assert!(!m.has_unsaved_changes());
    }

    #[test]
    fn test_mutation_during_save_schedules_another() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);
        m.poll(t0 + ms(10_000));

        m.record_mutation(t0 + ms(10_050));
        assert_eq!(m.state(), AutosaveState::Saving);

        m.complete_save(t0 + ms(10_100), SaveOutcome::Success);
        assert_eq!(m.state(), AutosaveState::Editing);
        assert!(m.has_unsaved_changes());
        assert_eq!(m.poll(t0 + ms(20_100)), Some(AutosaveAction::Save));
    }

    #[test]
    fn test_mutation_cancels_saved_window() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);
        m.poll(t0 + ms(10_000));
        m.complete_save(t0 + ms(10_000), SaveOutcome::Success);

        m.record_mutation(t0 + ms(11_000));
        assert_eq!(m.state(), AutosaveState::Editing);
        assert_eq!(m.next_deadline(), Some(t0 + ms(21_000)));
    }

    #[test]
    fn test_teardown_clears_deadline() {
        let t0 = Instant::now();
        let mut m = AutosaveMachine::default();
        m.record_mutation(t0);

        assert!(m.teardown());
        assert_eq!(m.next_deadline(), None);
        assert_eq!(m.poll(t0 + ms(60_000)), None);
    }

    #[test]
    fn test_stray_completion_is_ignored() {
        let mut m = AutosaveMachine::default();
        m.complete_save(Instant::now(), SaveOutcome::Success);
        assert_eq!(m.state(), AutosaveState::Idle);
    }
}
