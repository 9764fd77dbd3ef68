//! Process configuration read from the environment

use crate::services::REFERENCE_PHONE;
use std::path::PathBuf;
use std::time::Duration;

/// Server and flow settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// SQLite file holding conversations and upgrade requests
    pub db_path: PathBuf,
    pub port: u16,
    /// Phone number every authentication must match
    pub reference_phone: String,
    /// Registry entries idle this long are evicted
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
}

impl FlowConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("OFFER_FLOW_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.offer-flow/offer_flow.db"))
            },
            PathBuf::from,
        );

        let port = lookup("OFFER_FLOW_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let reference_phone = lookup("OFFER_FLOW_REFERENCE_PHONE")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| REFERENCE_PHONE.to_string());

        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .filter(|&v| v > 0)
                .map_or(Duration::from_secs(default), Duration::from_secs)
        };

        Self {
            db_path,
            port,
            reference_phone,
            session_ttl: secs("OFFER_FLOW_SESSION_TTL_SECS", 3600),
            sweep_interval: secs("OFFER_FLOW_SWEEP_SECS", 60),
        }
    }
}
