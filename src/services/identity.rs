//! Mock identity provider backed by a fixed customer table

use crate::runtime::{AuthFailure, IdentityProvider};
use crate::state_machine::{CustomerProfile, UserIdentity};
use std::collections::HashMap;

/// Phone number the agent already knows for every mock customer
pub const REFERENCE_PHONE: &str = "731527923";

/// One row of the customer table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    pub rodne_cislo_suffix: String,
    pub phone_number: String,
    pub email: String,
    pub current_plan_mbps: u32,
}

impl CustomerRecord {
    fn identity(&self) -> UserIdentity {
        UserIdentity {
            customer_id: self.customer_id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            current_plan_mbps: self.current_plan_mbps,
        }
    }

    fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            customer_id: self.customer_id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            current_plan_mbps: self.current_plan_mbps,
        }
    }
}

/// The standard customer table, every customer reachable on `phone_number`
pub fn default_customers(phone_number: &str) -> Vec<CustomerRecord> {
    let phone_number = normalize_phone(phone_number);
    vec![
        CustomerRecord {
            customer_id: "u-1001".to_string(),
            name: "Jan Novak".to_string(),
            rodne_cislo_suffix: "1234".to_string(),
            phone_number: phone_number.clone(),
            email: "jan.novak@example.com".to_string(),
            current_plan_mbps: 100,
        },
        CustomerRecord {
            customer_id: "u-1002".to_string(),
            name: "Petra Svobodova".to_string(),
            rodne_cislo_suffix: "5678".to_string(),
            phone_number,
            email: "petra.svobodova@example.com".to_string(),
            current_plan_mbps: 100,
        },
    ]
}

/// Lowercase with runs of whitespace collapsed to one space
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digits only
pub fn normalize_phone(phone_number: &str) -> String {
    phone_number.chars().filter(char::is_ascii_digit).collect()
}

/// Identity provider over an in-memory customer table
pub struct MockIdentityProvider {
    by_name: HashMap<String, CustomerRecord>,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new(default_customers(REFERENCE_PHONE))
    }
}

impl MockIdentityProvider {
    pub fn new(customers: impl IntoIterator<Item = CustomerRecord>) -> Self {
        let by_name = customers
            .into_iter()
            .map(|record| (normalize_name(&record.name), record))
            .collect();
        Self { by_name }
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn lookup(
        &self,
        name: &str,
        rodne_cislo_suffix: &str,
        phone_number: &str,
    ) -> Result<UserIdentity, AuthFailure> {
        let record = self
            .by_name
            .get(&normalize_name(name))
            .ok_or(AuthFailure::UnknownName)?;

        if record.rodne_cislo_suffix != rodne_cislo_suffix.trim() {
            return Err(AuthFailure::InvalidSuffix);
        }
        if record.phone_number != normalize_phone(phone_number) {
            return Err(AuthFailure::InvalidPhone);
        }

        Ok(record.identity())
    }

    fn fetch_profile(&self, identity: &UserIdentity) -> Option<CustomerProfile> {
        self.by_name
            .values()
            .find(|record| record.customer_id == identity.customer_id)
            .map(CustomerRecord::profile)
    }
}
