//! Registry-then-store resolution with read-repair
//!
//! The registry is consulted first. On a miss the durable store is read,
//! and a hit there is written back into the registry before it is returned.

use super::traits::{StateStore, StoreError};
use crate::state_machine::FlowState;

/// Where a conversation's state was found
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Served from the session registry
    Cached(FlowState),
    /// Served from the durable store and promoted into the registry
    Recovered(FlowState),
    /// Unknown to both stores
    Missing,
}

impl Resolution {
    pub fn into_state(self) -> Option<FlowState> {
        match self {
            Resolution::Cached(state) | Resolution::Recovered(state) => Some(state),
            Resolution::Missing => None,
        }
    }
}

/// Resolve `conv_id` against the registry, falling back to the durable store.
///
/// A registry failure is treated as a miss. A failed read-repair is logged
/// and the recovered state is still returned; the next call recovers again.
pub async fn resolve(
    registry: &dyn StateStore,
    durable: &dyn StateStore,
    conv_id: &str,
) -> Result<Resolution, StoreError> {
    match registry.get_state(conv_id).await {
        Ok(Some(state)) => return Ok(Resolution::Cached(state)),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(conv_id = %conv_id, error = %e, "Session registry read failed, trying durable store");
        }
    }

    let Some(state) = durable.get_state(conv_id).await? else {
        return Ok(Resolution::Missing);
    };

    if let Err(e) = registry.put_state(&state).await {
        tracing::warn!(conv_id = %conv_id, error = %e, "Read-repair into session registry failed");
    } else {
        tracing::info!(conv_id = %conv_id, stage = %state.stage, "Recovered conversation from durable store");
    }

    Ok(Resolution::Recovered(state))
}
