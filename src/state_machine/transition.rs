//! Pure state transition function
//!
//! Given the same state and event, `transition` always yields the same
//! result. All I/O (stores, collaborators, clock) happens in the runtime.

use super::{Action, Event, FlowState, Stage};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Total submit attempts allowed before the conversation is parked for
/// manual recovery: the first try plus one retry.
pub const MAX_SUBMIT_ATTEMPTS: u32 = 2;

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Conversation has logged out; {tool} is no longer available (only get_flow_status is)")]
    Terminal { tool: &'static str },

    #[error("Flow error: {tool} requires stage {required}, conversation is at {current}")]
    OutOfOrder {
        tool: &'static str,
        required: Stage,
        current: Stage,
    },

    #[error("Submission failed {attempts} times; conversation is left at offer_prepared for manual recovery")]
    RetriesExhausted { attempts: u32 },

    #[error("No upgrade is available for the current plan; the offer can only be rejected")]
    NoUpgradeAvailable,
}

/// Stage a conversation must be at for `action` to run
pub fn required_stage(action: Action) -> Option<Stage> {
    match action {
        Action::DownloadInfo => Some(Stage::Authenticated),
        Action::PrepareOffer => Some(Stage::InfoDownloaded),
        Action::Submit { .. } => Some(Stage::OfferPrepared),
        // Any non-terminal stage
        Action::Logout => None,
    }
}

/// Validate that `action` may run against `state`.
///
/// Runs before collaborators are called so that a rejected call has no
/// side effects at all.
pub fn check(state: &FlowState, action: Action) -> Result<(), TransitionError> {
    let tool = action.tool_name();

    if state.stage.is_terminal() {
        return Err(TransitionError::Terminal { tool });
    }

    if let Some(required) = required_stage(action) {
        if state.stage != required {
            return Err(TransitionError::OutOfOrder {
                tool,
                required,
                current: state.stage,
            });
        }
    }

    if let Action::Submit { accept_offer } = action {
        if state.failed_submissions >= MAX_SUBMIT_ATTEMPTS {
            return Err(TransitionError::RetriesExhausted {
                attempts: state.failed_submissions,
            });
        }
        let upgrade = state.offer.as_ref().is_some_and(super::Offer::is_upgrade);
        if accept_offer && !upgrade {
            return Err(TransitionError::NoUpgradeAvailable);
        }
    }

    Ok(())
}

/// Apply `event` to `state`, producing the next state.
///
/// Identity is never touched; the offer is only ever written once since
/// `OfferPrepared` is accepted at a single stage.
pub fn transition(
    state: &FlowState,
    event: Event,
    now: DateTime<Utc>,
) -> Result<FlowState, TransitionError> {
    check(state, event.action())?;

    let mut next = state.clone();
    next.updated_at = now;

    match event {
        Event::InfoDownloaded { profile } => {
            next.profile = Some(profile);
            next.stage = Stage::InfoDownloaded;
        }
        Event::OfferPrepared { offer } => {
            next.offer = Some(offer);
            next.stage = Stage::OfferPrepared;
        }
        Event::Submitted { decision } => {
            next.decision = Some(decision);
            next.stage = Stage::Submitted;
        }
        Event::SubmissionFailed { .. } => {
            next.failed_submissions += 1;
        }
        Event::LoggedOut => {
            next.stage = Stage::LoggedOut;
        }
    }

    Ok(next)
}
