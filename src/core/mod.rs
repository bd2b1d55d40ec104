//! Core business logic module
//!
//! This module contains the charge authorization components:
//! - `config` - Lock TTL, retry policy, and default balance
//! - `lock` - Distributed lock on top of the shared store
//! - `authorizer` - Charge orchestration with bounded retry and fail-closed results
//! - `reset` - Administrative balance reset

pub mod authorizer;
pub mod config;
pub mod lock;
pub mod reset;

pub use authorizer::ChargeAuthorizer;
pub use config::{AuthorizerConfig, DEFAULT_BALANCE};
pub use lock::{DistributedLock, LockToken};
pub use reset::reset;
