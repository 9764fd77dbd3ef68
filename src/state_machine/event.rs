//! Events and actions that drive the flow

use crate::state_machine::state::{CustomerProfile, Decision, Offer};

/// A tool call that wants to move a conversation forward.
///
/// Checked against the current state before any collaborator is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DownloadInfo,
    PrepareOffer,
    Submit { accept_offer: bool },
    Logout,
}

impl Action {
    /// Tool that performs this action
    pub fn tool_name(self) -> &'static str {
        match self {
            Action::DownloadInfo => "download_user_info",
            Action::PrepareOffer => "prepare_new_offer",
            Action::Submit { .. } => "submit_offer_to_external_service",
            Action::Logout => "logout",
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Profile fetched for the authenticated customer
    InfoDownloaded { profile: CustomerProfile },

    /// Offer computed from the customer's current plan
    OfferPrepared { offer: Offer },

    /// External service acknowledged the decision
    Submitted { decision: Decision },

    /// External service failed to persist the decision
    SubmissionFailed { accept_offer: bool },

    LoggedOut,
}

impl Event {
    /// The action this event completes
    pub fn action(&self) -> Action {
        match self {
            Event::InfoDownloaded { .. } => Action::DownloadInfo,
            Event::OfferPrepared { .. } => Action::PrepareOffer,
            Event::Submitted { decision } => Action::Submit {
                accept_offer: decision.accept_offer,
            },
            Event::SubmissionFailed { accept_offer } => Action::Submit {
                accept_offer: *accept_offer,
            },
            Event::LoggedOut => Action::Logout,
        }
    }
}
