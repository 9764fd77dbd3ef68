//! Mock implementations for testing
//!
//! These mocks let the flow machine and the resolution algorithm be
//! exercised without SQLite, with injectable failures.

use super::executor::{FlowMachine, FlowServices};
use super::registry::SessionRegistry;
use super::traits::*;
use crate::services::identity::{CustomerRecord, MockIdentityProvider};
use crate::services::offers::FixedUpgradeOffers;
use crate::state_machine::{
    CustomerProfile, FlowState, Offer, Stage, SubmissionReceipt, SubmissionStatus, UserIdentity,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixtures
// ============================================================================

pub fn sample_identity() -> UserIdentity {
    UserIdentity {
        customer_id: "u-1001".to_string(),
        name: "Jan Novak".to_string(),
        phone_number: "731527923".to_string(),
        current_plan_mbps: 100,
    }
}

/// Deterministic authenticated state (fixed timestamps)
pub fn sample_state(conv_id: &str) -> FlowState {
    let at = Utc
        .timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap_or_else(Utc::now);
    FlowState::authenticated(conv_id, sample_identity(), at)
}

/// `sample_state` advanced to an upgrade offer awaiting the customer's decision
pub fn offer_prepared_state(conv_id: &str) -> FlowState {
    let mut state = sample_state(conv_id);
    state.profile = Some(CustomerProfile {
        customer_id: "u-1001".to_string(),
        name: "Jan Novak".to_string(),
        phone_number: "731527923".to_string(),
        email: "jan.novak@example.com".to_string(),
        current_plan_mbps: 100,
    });
    state.offer = Some(Offer {
        offer_id: "offer-0000beef".to_string(),
        customer_id: "u-1001".to_string(),
        current_plan_mbps: 100,
        offered_plan_mbps: Some(250),
        price_delta_czk: 0,
        description: "Upgrade internet speed from 100 Mbps to 250 Mbps.".to_string(),
        valid_until: "2026-12-31".to_string(),
    });
    state.stage = Stage::OfferPrepared;
    state
}

// ============================================================================
// Call Log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Put,
    Delete,
}

/// One recorded store operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub store: &'static str,
    pub op: StoreOp,
    pub conv_id: String,
}

impl StoreCall {
    pub fn get(store: &'static str, conv_id: &str) -> Self {
        Self {
            store,
            op: StoreOp::Get,
            conv_id: conv_id.to_string(),
        }
    }

    pub fn put(store: &'static str, conv_id: &str) -> Self {
        Self {
            store,
            op: StoreOp::Put,
            conv_id: conv_id.to_string(),
        }
    }
}

/// Ordered log that several stores can share
#[derive(Debug, Default)]
pub struct CallLog {
    entries: Mutex<Vec<StoreCall>>,
}

impl CallLog {
    fn record(&self, call: StoreCall) {
        self.entries.lock().unwrap().push(call);
    }

    pub fn entries(&self) -> Vec<StoreCall> {
        self.entries.lock().unwrap().clone()
    }
}

// ============================================================================
// Mock State Store
// ============================================================================

/// In-memory state store with switchable failures and a call log
pub struct MockStateStore {
    name: &'static str,
    states: Mutex<HashMap<String, FlowState>>,
    log: Mutex<Arc<CallLog>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl MockStateStore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            states: Mutex::new(HashMap::new()),
            log: Mutex::new(Arc::new(CallLog::default())),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Insert a state without recording a call
    pub fn seed(&self, state: FlowState) {
        self.states
            .lock()
            .unwrap()
            .insert(state.conversation_id.clone(), state);
    }

    pub fn stored(&self, conv_id: &str) -> Option<FlowState> {
        self.states.lock().unwrap().get(conv_id).cloned()
    }

    pub fn holds(&self, conv_id: &str) -> bool {
        self.states.lock().unwrap().contains_key(conv_id)
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().unwrap().is_empty()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn shared_log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log.lock().unwrap())
    }

    /// Record into another store's log so ordering across stores is visible
    pub fn attach_log(&self, log: &Arc<CallLog>) {
        *self.log.lock().unwrap() = Arc::clone(log);
    }

    /// Calls made on this store only
    pub fn calls(&self) -> Vec<StoreCall> {
        self.shared_log()
            .entries()
            .into_iter()
            .filter(|call| call.store == self.name)
            .collect()
    }

    fn record(&self, op: StoreOp, conv_id: &str) {
        self.shared_log().record(StoreCall {
            store: self.name,
            op,
            conv_id: conv_id.to_string(),
        });
    }
}

#[async_trait]
impl StateStore for MockStateStore {
    async fn get_state(&self, conv_id: &str) -> Result<Option<FlowState>, StoreError> {
        self.record(StoreOp::Get, conv_id);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} read failed", self.name)));
        }
        Ok(self.stored(conv_id))
    }

    async fn put_state(&self, state: &FlowState) -> Result<(), StoreError> {
        self.record(StoreOp::Put, &state.conversation_id);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} write failed", self.name)));
        }
        self.seed(state.clone());
        Ok(())
    }

    // Deletes ignore `fail_writes`
    async fn delete_state(&self, conv_id: &str) -> Result<(), StoreError> {
        self.record(StoreOp::Delete, conv_id);
        self.states.lock().unwrap().remove(conv_id);
        Ok(())
    }
}

// ============================================================================
// Mock Submission Sink
// ============================================================================

/// Sink that acknowledges everything unless told to fail
#[derive(Default)]
pub struct MockSink {
    failing: AtomicBool,
    requests: Mutex<Vec<SubmissionRequest>>,
}

#[allow(dead_code)]
impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Every request that reached the sink, failed or not
    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionSink for MockSink {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, SinkError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("simulated write failure".to_string()));
        }
        Ok(SubmissionReceipt {
            status: SubmissionStatus::from_acceptance(request.accept_offer),
            external_reference: "MOCK-TEST0001".to_string(),
            request_id: request.persist_to_db.then(|| "req-test".to_string()),
            saved_to_db: request.persist_to_db,
            created_at: Utc::now(),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Flow machine wired to inspectable collaborators
pub struct TestHarness {
    pub machine: Arc<FlowMachine>,
    pub registry: Arc<SessionRegistry>,
    pub durable: Arc<MockStateStore>,
    pub sink: Arc<MockSink>,
}

/// Customers used by tests: the standard table plus one on a plan with no upgrade
pub fn test_customers(phone_number: &str) -> Vec<CustomerRecord> {
    let mut customers = crate::services::identity::default_customers(phone_number);
    customers.push(CustomerRecord {
        customer_id: "u-1003".to_string(),
        name: "Karel Dvorak".to_string(),
        rodne_cislo_suffix: "4321".to_string(),
        phone_number: phone_number.to_string(),
        email: "karel.dvorak@example.com".to_string(),
        current_plan_mbps: 1000,
    });
    customers
}

fn flow_services(
    registry: Arc<dyn StateStore>,
    durable: Arc<dyn StateStore>,
    sink: Arc<dyn SubmissionSink>,
    phone_number: &str,
) -> FlowServices {
    FlowServices {
        registry,
        durable,
        identities: Arc::new(MockIdentityProvider::new(test_customers(phone_number))),
        offers: Arc::new(FixedUpgradeOffers::default()),
        sink,
    }
}

pub fn test_machine() -> TestHarness {
    test_machine_with_phone("731527923")
}

/// Harness whose customers and reference phone are `phone_number`
pub fn test_machine_with_phone(phone_number: &str) -> TestHarness {
    let registry = Arc::new(SessionRegistry::new());
    let durable = Arc::new(MockStateStore::new("durable"));
    let sink = Arc::new(MockSink::new());

    let services = flow_services(registry.clone(), durable.clone(), sink.clone(), phone_number);

    TestHarness {
        machine: Arc::new(FlowMachine::new(services, phone_number)),
        registry,
        durable,
        sink,
    }
}

/// Flow machine whose registry is also a mock, both stores sharing one call log
pub struct LoggedHarness {
    pub machine: Arc<FlowMachine>,
    pub registry: Arc<MockStateStore>,
    pub durable: Arc<MockStateStore>,
    pub sink: Arc<MockSink>,
    pub log: Arc<CallLog>,
}

pub fn logged_machine() -> LoggedHarness {
    let registry = Arc::new(MockStateStore::new("registry"));
    let durable = Arc::new(MockStateStore::new("durable"));
    let log = durable.shared_log();
    registry.attach_log(&log);
    let sink = Arc::new(MockSink::new());

    let services = flow_services(registry.clone(), durable.clone(), sink.clone(), "731527923");

    LoggedHarness {
        machine: Arc::new(FlowMachine::new(services, "731527923")),
        registry,
        durable,
        sink,
        log,
    }
}
