//! Charge Authorizer Library
//! # Overview
//!
//! This library authorizes charges against per-account balances kept in a
//! shared key-value store. Any number of stateless process instances may
//! serve charges for the same account at once; the store is the only place
//! balances live, and no charge is ever authorized that would take a balance
//! below zero.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (account keys, charge results, errors)
//! - [`store`] - The `BalanceStore` adapter and its Redis and in-memory backends
//! - [`core`] - Business logic components:
//!   - [`core::lock`] - Distributed lock with per-acquisition tokens
//!   - [`core::authorizer`] - Charge orchestration, retry, fail-closed mapping
//!   - [`core::reset`] - Administrative balance reset
//! - [`strategy`] - Interchangeable read-decide-write strategies
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Reset**: overwrite an account's balance with the default; fails only
//!   if the store is unavailable
//! - **Charge**: debit an amount if the balance covers it; never fails, every
//!   error becomes a declined result
//!
//! # Store Layout
//!
//! Per account, two keys:
//! - `<account>/balance`: the balance as a decimal integer
//! - `resource_lock_<account>/balance`: the lock token, with a TTL

// Module declarations
pub mod cli;
pub mod core;
pub mod store;
pub mod strategy;
pub mod types;

pub use crate::core::{AuthorizerConfig, ChargeAuthorizer, DistributedLock, LockToken};
pub use store::{BalanceStore, MemoryStore, RedisStore};
pub use strategy::{create_strategy, ChargeStrategy};
pub use types::{AccountKeys, ChargeError, ChargeOutcome, ChargeResult, StoreError};
