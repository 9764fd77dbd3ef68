//! In-memory session registry
//!
//! The fast path for resolving a conversation. Entries are spread across
//! independently locked shards so calls for different conversations do not
//! wait on each other. Losing an entry is always safe: the durable store
//! holds every confirmed write.

use super::traits::{StateStore, StoreError};
use crate::state_machine::FlowState;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const SHARD_COUNT: usize = 16;

struct Entry {
    state: FlowState,
    last_access: Instant,
}

type Shard = HashMap<String, Entry>;

/// Process-local map of live conversations
pub struct SessionRegistry {
    shards: Vec<Mutex<Shard>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, conv_id: &str) -> MutexGuard<'_, Shard> {
        let mut hasher = DefaultHasher::new();
        conv_id.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)] // Only the low bits pick a shard
        let index = hasher.finish() as usize % self.shards.len();
        // A poisoned shard still holds whole entries; keep serving them
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Live state for a conversation, refreshing its idle timer
    pub fn get(&self, conv_id: &str) -> Option<FlowState> {
        let mut shard = self.shard(conv_id);
        shard.get_mut(conv_id).map(|entry| {
            entry.last_access = Instant::now();
            entry.state.clone()
        })
    }

    pub fn insert(&self, state: FlowState) {
        let mut shard = self.shard(&state.conversation_id);
        shard.insert(
            state.conversation_id.clone(),
            Entry {
                state,
                last_access: Instant::now(),
            },
        );
    }

    /// Drop a single conversation; returns whether it was present
    pub fn evict(&self, conv_id: &str) -> bool {
        self.shard(conv_id).remove(conv_id).is_some()
    }

    #[allow(dead_code)] // Used in tests
    pub fn contains(&self, conv_id: &str) -> bool {
        self.shard(conv_id).contains_key(conv_id)
    }

    /// Drop every entry, as a process restart would
    #[allow(dead_code)] // Used in tests
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove entries not accessed within `ttl`; returns how many were dropped
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut evicted = 0;
        for shard in &self.shards {
            let mut shard = shard.lock().unwrap_or_else(PoisonError::into_inner);
            let before = shard.len();
            shard.retain(|_, entry| entry.last_access.elapsed() < ttl);
            evicted += before - shard.len();
        }
        evicted
    }

    /// Periodically evict idle entries for the lifetime of the process
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(ttl);
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        remaining = registry.len(),
                        "Evicted idle sessions"
                    );
                }
            }
        })
    }
}

#[async_trait]
impl StateStore for SessionRegistry {
    async fn get_state(&self, conv_id: &str) -> Result<Option<FlowState>, StoreError> {
        Ok(self.get(conv_id))
    }

    async fn put_state(&self, state: &FlowState) -> Result<(), StoreError> {
        self.insert(state.clone());
        Ok(())
    }

    async fn delete_state(&self, conv_id: &str) -> Result<(), StoreError> {
        self.evict(conv_id);
        Ok(())
    }
}
