//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Store key derivation for an account
//! - `charge`: Charge results and outcomes
//! - `error`: Error types for the store and the authorizer

pub mod account;
pub mod charge;
pub mod error;

pub use account::AccountKeys;
pub use charge::{ChargeOutcome, ChargeResult};
pub use error::{ChargeError, StoreError};
