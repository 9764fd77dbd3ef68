//! Flow state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Stage
// ============================================================================

/// Position of a conversation within the fixed tool-call sequence.
///
/// Variants are declared in flow order so the derived `Ord` matches the
/// order in which stages are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Authenticated,
    InfoDownloaded,
    OfferPrepared,
    Submitted,
    LoggedOut,
}

impl Stage {
    /// All stages in flow order
    #[cfg(test)]
    pub const ALL: [Stage; 5] = [
        Stage::Authenticated,
        Stage::InfoDownloaded,
        Stage::OfferPrepared,
        Stage::Submitted,
        Stage::LoggedOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Authenticated => "authenticated",
            Stage::InfoDownloaded => "info_downloaded",
            Stage::OfferPrepared => "offer_prepared",
            Stage::Submitted => "submitted",
            Stage::LoggedOut => "logged_out",
        }
    }

    #[cfg(test)]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == value)
    }

    /// No tool other than `get_flow_status` is accepted once terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::LoggedOut)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Snapshots written along the flow
// ============================================================================

/// Identity established at authentication. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub customer_id: String,
    pub name: String,
    pub phone_number: String,
    pub current_plan_mbps: u32,
}

/// Customer profile attached by `download_user_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub current_plan_mbps: u32,
}

/// Upgrade offer computed by `prepare_new_offer`. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: String,
    pub customer_id: String,
    pub current_plan_mbps: u32,
    /// `None` when no upgrade exists for the current plan
    pub offered_plan_mbps: Option<u32>,
    pub price_delta_czk: i64,
    pub description: String,
    pub valid_until: String,
}

impl Offer {
    pub fn is_upgrade(&self) -> bool {
        self.offered_plan_mbps.is_some()
    }
}

/// Outcome reported by the external service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Accepted,
    Rejected,
}

impl SubmissionStatus {
    pub fn from_acceptance(accept_offer: bool) -> Self {
        if accept_offer {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Acknowledgement returned by the submission sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: SubmissionStatus,
    pub external_reference: String,
    /// Generated row id, present only when the decision was persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub saved_to_db: bool,
    pub created_at: DateTime<Utc>,
}

/// Final decision recorded at submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub accept_offer: bool,
    pub persist_to_db: bool,
    pub receipt: SubmissionReceipt,
}

// ============================================================================
// Flow State
// ============================================================================

/// Authoritative record for one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub conversation_id: String,
    pub stage: Stage,
    pub identity: UserIdentity,
    #[serde(default)]
    pub profile: Option<CustomerProfile>,
    #[serde(default)]
    pub offer: Option<Offer>,
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Submissions that failed to persist; bounded by the retry policy
    #[serde(default)]
    pub failed_submissions: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlowState {
    /// State produced by a successful authentication
    pub fn authenticated(
        conversation_id: impl Into<String>,
        identity: UserIdentity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            stage: Stage::Authenticated,
            identity,
            profile: None,
            offer: None,
            decision: None,
            failed_submissions: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name of the tool the client should call next, if any
    pub fn next_step(&self) -> Option<&'static str> {
        match self.stage {
            Stage::Authenticated => Some("download_user_info"),
            Stage::InfoDownloaded => Some("prepare_new_offer"),
            Stage::OfferPrepared => Some("submit_offer_to_external_service"),
            Stage::Submitted => Some("logout"),
            Stage::LoggedOut => None,
        }
    }
}
