//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    stage TEXT NOT NULL,
    state TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations(updated_at DESC);

CREATE TABLE IF NOT EXISTS external_upgrade_requests (
    request_id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    customer_name TEXT NOT NULL,
    current_plan_mbps INTEGER NOT NULL,
    offered_plan_mbps INTEGER,
    status TEXT NOT NULL,
    external_reference TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_upgrade_requests_conversation
    ON external_upgrade_requests(conversation_id);
";

/// Row of `external_upgrade_requests`: one persisted decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRequest {
    pub request_id: String,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub customer_id: String,
    pub customer_name: String,
    pub current_plan_mbps: u32,
    pub offered_plan_mbps: Option<u32>,
    /// `accepted` or `rejected`
    pub status: String,
    pub external_reference: String,
}
