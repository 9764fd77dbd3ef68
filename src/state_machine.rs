//! Offer flow state machine
//!
//! Pure state transitions over a single conversation's `FlowState`.

mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use event::{Action, Event};
pub use state::{
    CustomerProfile, Decision, FlowState, Offer, Stage, SubmissionReceipt, SubmissionStatus,
    UserIdentity,
};
pub use transition::{check, transition, TransitionError, MAX_SUBMIT_ATTEMPTS};
