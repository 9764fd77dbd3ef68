//! Flow machine: executes tool calls against one conversation
//!
//! Each operation resolves the conversation (registry, then durable store),
//! validates the requested step, calls the relevant collaborator, applies
//! the pure transition and writes the new state to both stores.

use super::error::FlowError;
use super::resolve::resolve;
use super::traits::{
    AuthFailure, IdentityProvider, OfferEngine, StateStore, StoreError, SubmissionRequest,
    SubmissionSink,
};
use crate::services::identity::normalize_phone;
use crate::state_machine::{
    check, transition, Action, Decision, Event, FlowState, Stage, TransitionError,
    MAX_SUBMIT_ATTEMPTS,
};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything the flow machine talks to
#[derive(Clone)]
pub struct FlowServices {
    pub registry: Arc<dyn StateStore>,
    pub durable: Arc<dyn StateStore>,
    pub identities: Arc<dyn IdentityProvider>,
    pub offers: Arc<dyn OfferEngine>,
    pub sink: Arc<dyn SubmissionSink>,
}

/// Owner of every flow state transition
pub struct FlowMachine {
    services: FlowServices,
    reference_phone: String,
    degraded_writes: AtomicU64,
}

impl FlowMachine {
    pub fn new(services: FlowServices, reference_phone: &str) -> Self {
        Self {
            services,
            reference_phone: normalize_phone(reference_phone),
            degraded_writes: AtomicU64::new(0),
        }
    }

    /// Phone number every authentication must match, digits only
    pub fn reference_phone(&self) -> &str {
        &self.reference_phone
    }

    /// Number of writes that reached the registry but not the durable store
    pub fn degraded_writes(&self) -> u64 {
        self.degraded_writes.load(Ordering::Relaxed)
    }

    // ==================== Operations ====================

    /// Verify the caller and open a new conversation
    pub async fn authenticate(
        &self,
        name: &str,
        rodne_cislo_suffix: &str,
        phone_number: &str,
    ) -> Result<FlowState, FlowError> {
        let identity = self
            .services
            .identities
            .lookup(name, rodne_cislo_suffix, phone_number)?;

        if normalize_phone(phone_number) != self.reference_phone {
            return Err(AuthFailure::InvalidPhone.into());
        }

        let conversation_id = new_conversation_id();
        let state = FlowState::authenticated(conversation_id, identity, Utc::now());
        self.commit(&state).await?;

        tracing::info!(
            conv_id = %state.conversation_id,
            customer_id = %state.identity.customer_id,
            "User authenticated"
        );
        Ok(state)
    }

    /// Attach the customer's profile
    pub async fn download_info(&self, conv_id: &str) -> Result<FlowState, FlowError> {
        let state = self.load(conv_id).await?;
        check(&state, Action::DownloadInfo)?;

        let profile = self
            .services
            .identities
            .fetch_profile(&state.identity)
            .ok_or_else(|| {
                FlowError::NotFound(format!("profile for customer {}", state.identity.customer_id))
            })?;

        self.advance(&state, Event::InfoDownloaded { profile }).await
    }

    /// Compute and store the upgrade offer
    pub async fn prepare_offer(&self, conv_id: &str) -> Result<FlowState, FlowError> {
        let state = self.load(conv_id).await?;
        check(&state, Action::PrepareOffer)?;

        let Some(profile) = state.profile.as_ref() else {
            return Err(TransitionError::OutOfOrder {
                tool: Action::PrepareOffer.tool_name(),
                required: Stage::InfoDownloaded,
                current: state.stage,
            }
            .into());
        };
        let offer = self.services.offers.prepare(profile);

        self.advance(&state, Event::OfferPrepared { offer }).await
    }

    /// Hand the customer's decision to the external service.
    ///
    /// A sink failure leaves the stage untouched and is always surfaced.
    /// Only `MAX_SUBMIT_ATTEMPTS` attempts are allowed per conversation.
    pub async fn submit(
        &self,
        conv_id: &str,
        accept_offer: bool,
        persist_to_db: bool,
    ) -> Result<FlowState, FlowError> {
        let state = self.load(conv_id).await?;
        let action = Action::Submit { accept_offer };
        check(&state, action)?;

        let Some(offer) = state.offer.clone() else {
            return Err(TransitionError::NoUpgradeAvailable.into());
        };
        let request = SubmissionRequest {
            conversation_id: state.conversation_id.clone(),
            identity: state.identity.clone(),
            offer,
            accept_offer,
            persist_to_db,
        };

        match self.services.sink.submit(&request).await {
            Ok(receipt) => {
                let decision = Decision {
                    accept_offer,
                    persist_to_db,
                    receipt,
                };
                let next = transition(&state, Event::Submitted { decision }, Utc::now())?;
                self.commit_recorded(&next).await?;

                tracing::info!(
                    conv_id = %next.conversation_id,
                    from = %state.stage,
                    to = %next.stage,
                    "Conversation advanced"
                );
                Ok(next)
            }
            Err(e) => {
                let failed =
                    transition(&state, Event::SubmissionFailed { accept_offer }, Utc::now())?;
                if let Err(commit_err) = self.commit(&failed).await {
                    tracing::warn!(
                        conv_id = %conv_id,
                        error = %commit_err,
                        "Could not record failed submission attempt"
                    );
                }

                let retries_left = MAX_SUBMIT_ATTEMPTS.saturating_sub(failed.failed_submissions);
                tracing::error!(
                    conv_id = %conv_id,
                    error = %e,
                    retries_left,
                    "Submission failed"
                );
                Err(FlowError::Persistence {
                    message: e.to_string(),
                    retries_left,
                })
            }
        }
    }

    /// Current state; never mutates
    pub async fn get_status(&self, conv_id: &str) -> Result<FlowState, FlowError> {
        self.load(conv_id).await
    }

    /// End the conversation
    pub async fn logout(&self, conv_id: &str) -> Result<FlowState, FlowError> {
        let state = self.load(conv_id).await?;
        self.advance(&state, Event::LoggedOut).await
    }

    // ==================== Internals ====================

    async fn load(&self, conv_id: &str) -> Result<FlowState, FlowError> {
        resolve(
            self.services.registry.as_ref(),
            self.services.durable.as_ref(),
            conv_id,
        )
        .await?
        .into_state()
        .ok_or_else(|| FlowError::NotFound(conv_id.to_string()))
    }

    async fn advance(&self, state: &FlowState, event: Event) -> Result<FlowState, FlowError> {
        let next = transition(state, event, Utc::now())?;
        self.commit(&next).await?;

        tracing::info!(
            conv_id = %next.conversation_id,
            from = %state.stage,
            to = %next.stage,
            "Conversation advanced"
        );
        Ok(next)
    }

    /// Write registry first, then the durable store.
    ///
    /// A durable failure after a registry success is counted and logged;
    /// the call still succeeds.
    async fn commit(&self, state: &FlowState) -> Result<(), FlowError> {
        self.services.registry.put_state(state).await?;

        if let Err(e) = self.services.durable.put_state(state).await {
            self.note_degraded(state, &e);
        }
        Ok(())
    }

    /// Commit a state whose external side effect has already happened.
    ///
    /// Succeeds if either store took the write. When only the durable store
    /// did, the stale registry entry is dropped so the next call resolves
    /// from the durable store instead.
    async fn commit_recorded(&self, state: &FlowState) -> Result<(), FlowError> {
        let registry = &self.services.registry;
        let conv_id = state.conversation_id.as_str();

        let Err(registry_err) = registry.put_state(state).await else {
            if let Err(e) = self.services.durable.put_state(state).await {
                self.note_degraded(state, &e);
            }
            return Ok(());
        };

        if let Err(e) = self.services.durable.put_state(state).await {
            tracing::error!(
                conv_id = %conv_id,
                registry_error = %registry_err,
                durable_error = %e,
                "Recorded submission could not be stored anywhere"
            );
            return Err(registry_err.into());
        }

        tracing::warn!(
            conv_id = %conv_id,
            error = %registry_err,
            "Registry write failed after submission; serving from durable store"
        );
        if let Err(e) = registry.delete_state(conv_id).await {
            tracing::warn!(conv_id = %conv_id, error = %e, "Could not drop stale registry entry");
        }
        Ok(())
    }

    fn note_degraded(&self, state: &FlowState, error: &StoreError) {
        let degraded = self.degraded_writes.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(
            conv_id = %state.conversation_id,
            stage = %state.stage,
            degraded_writes = degraded,
            error = %error,
            "Durable write failed; conversation will not survive a restart"
        );
    }
}

fn new_conversation_id() -> String {
    format!("conv-{}", uuid::Uuid::new_v4().simple())
}
