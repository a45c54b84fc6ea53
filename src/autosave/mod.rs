//! Debounced autosave of the live graph as the author's version.
//!
//! - [`AutosaveMachine`]: the pure state machine over caller-supplied instants
//! - [`AutosaveScheduler`]: runs the machine against a [`VersionStore`](crate::store::VersionStore)
//! - `spawn_autosave` (`runtime` feature): a tokio task fed by a watch channel

pub mod machine;
pub mod scheduler;

#[cfg(feature = "runtime")]
pub mod driver;

pub use machine::{
    AutosaveAction, AutosaveConfig, AutosaveMachine, AutosaveState, SaveOutcome,
    DEFAULT_ERROR_DISPLAY, DEFAULT_IDLE_DELAY, DEFAULT_SAVED_DISPLAY,
};
pub use scheduler::AutosaveScheduler;

#[cfg(feature = "runtime")]
pub use driver::{spawn_autosave, AutosaveHandle};
