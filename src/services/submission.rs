//! External submission sink
//!
//! Stands in for the downstream service that receives the customer's
//! decision. Persisted decisions become rows of `external_upgrade_requests`.

use crate::db::{Database, UpgradeRequest};
use crate::runtime::{SinkError, SubmissionRequest, SubmissionSink};
use crate::state_machine::{SubmissionReceipt, SubmissionStatus};
use async_trait::async_trait;
use chrono::Utc;

/// Sink that records persisted decisions in SQLite and mocks the rest
#[derive(Clone)]
pub struct DatabaseSink {
    db: Database,
}

impl DatabaseSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// `len` uppercase hex characters from a fresh uuid
fn reference_suffix(len: usize) -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(len)
        .collect()
}

#[async_trait]
impl SubmissionSink for DatabaseSink {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
        let status = SubmissionStatus::from_acceptance(request.accept_offer);
        let created_at = Utc::now();

        if !request.persist_to_db {
            return Ok(SubmissionReceipt {
                status,
                external_reference: format!("MOCK-{}", reference_suffix(8)),
                request_id: None,
                saved_to_db: false,
                created_at,
            });
        }

        let row = UpgradeRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            conversation_id: request.conversation_id.clone(),
            created_at,
            customer_id: request.identity.customer_id.clone(),
            customer_name: request.identity.name.clone(),
            current_plan_mbps: request.offer.current_plan_mbps,
            offered_plan_mbps: request.offer.offered_plan_mbps,
            status: status.as_str().to_string(),
            external_reference: format!("EXT-{}", reference_suffix(10)),
        };
        self.db.insert_upgrade_request(&row)?;

        tracing::info!(
            conv_id = %row.conversation_id,
            request_id = %row.request_id,
            status = %row.status,
            "Recorded upgrade request"
        );

        Ok(SubmissionReceipt {
            status,
            external_reference: row.external_reference,
            request_id: Some(row.request_id),
            saved_to_db: true,
            created_at,
        })
    }
}
