//! Step view state machine
//!
//! Each step that talks to the analysis service owns one [`ViewState`]:
//! `idle → submitting → (succeeded | failed)`, with retries re-entering
//! `submitting`. Transitions are pure; I/O leaves as [`Effect`]s.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::ViewEvent;
pub use state::{FailureKind, RequestId, ViewState};
pub use transition::transition;
