//! Trait abstractions for the flow's collaborators
//!
//! These traits let the flow machine run against mock implementations in
//! tests and the SQLite-backed ones in production.

use crate::db::{Database, DbError};
use crate::state_machine::{CustomerProfile, FlowState, Offer, SubmissionReceipt, UserIdentity};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a keyed state store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("State store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the external submission sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to record submission: {0}")]
    Db(#[from] DbError),
    #[error("External service unavailable: {0}")]
    Unavailable(String),
}

/// Why an identity lookup did not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Unknown user name.")]
    UnknownName,
    #[error("Invalid rodne_cislo_suffix.")]
    InvalidSuffix,
    #[error("Invalid phone_number.")]
    InvalidPhone,
}

// ============================================================================
// Storage
// ============================================================================

/// Keyed storage for conversation flow state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the stored state, `None` when the id is unknown
    async fn get_state(&self, conv_id: &str) -> Result<Option<FlowState>, StoreError>;

    /// Store the full state under its conversation id
    async fn put_state(&self, state: &FlowState) -> Result<(), StoreError>;

    /// Forget the conversation
    async fn delete_state(&self, conv_id: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Collaborators
// ============================================================================

/// Source of customer identities
pub trait IdentityProvider: Send + Sync {
    /// Match a customer by name, rodne cislo suffix and phone number
    fn lookup(
        &self,
        name: &str,
        rodne_cislo_suffix: &str,
        phone_number: &str,
    ) -> Result<UserIdentity, AuthFailure>;

    /// Full profile for an authenticated customer
    fn fetch_profile(&self, identity: &UserIdentity) -> Option<CustomerProfile>;
}

/// Computes upgrade offers
pub trait OfferEngine: Send + Sync {
    /// Proposed plan speed for a current plan speed, `None` when no upgrade exists
    fn upgrade_for(&self, current_plan_mbps: u32) -> Option<u32>;

    /// Build the offer presented to the customer
    fn prepare(&self, profile: &CustomerProfile) -> Offer;
}

/// A finalized decision handed to the external service
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub conversation_id: String,
    pub identity: UserIdentity,
    pub offer: Offer,
    pub accept_offer: bool,
    pub persist_to_db: bool,
}

/// The downstream system receiving final decisions
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, SinkError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn get_state(&self, conv_id: &str) -> Result<Option<FlowState>, StoreError> {
        (**self).get_state(conv_id).await
    }

    async fn put_state(&self, state: &FlowState) -> Result<(), StoreError> {
        (**self).put_state(state).await
    }

    async fn delete_state(&self, conv_id: &str) -> Result<(), StoreError> {
        (**self).delete_state(conv_id).await
    }
}

#[async_trait]
impl<T: SubmissionSink + ?Sized> SubmissionSink for Arc<T> {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
        (**self).submit(request).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as the durable conversation store
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn get_state(&self, conv_id: &str) -> Result<Option<FlowState>, StoreError> {
        Ok(self.db.get_conversation(conv_id)?)
    }

    async fn put_state(&self, state: &FlowState) -> Result<(), StoreError> {
        Ok(self.db.upsert_conversation(state)?)
    }

    async fn delete_state(&self, conv_id: &str) -> Result<(), StoreError> {
        self.db.delete_conversation(conv_id)?;
        Ok(())
    }
}
