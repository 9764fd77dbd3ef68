//! Mock collaborators behind the runtime traits

pub mod identity;
pub mod offers;
pub mod submission;

pub use identity::{MockIdentityProvider, REFERENCE_PHONE};
pub use offers::FixedUpgradeOffers;
pub use submission::DatabaseSink;
