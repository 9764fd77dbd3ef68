//! Runtime for executing the offer flow
//!
//! Wires the pure state machine to the session registry, the durable
//! conversation store and the external collaborators.

mod error;
mod executor;
mod registry;
mod resolve;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use error::FlowError;
pub use executor::{FlowMachine, FlowServices};
pub use registry::SessionRegistry;
#[allow(unused_imports)] // Public API re-exports
pub use resolve::{resolve, Resolution};
pub use traits::*;
