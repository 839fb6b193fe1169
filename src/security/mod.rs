//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway pipeline:
//!     → rate_limit.rs (per-client request budget)
//!     → sensitivity.rs (tier lookup, admin-only checks)
//!         → capability.rs (signed / opaque capability tokens)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod capability;
pub mod rate_limit;
pub mod sensitivity;

pub use capability::{CapabilityVerifier, TokenClaims, TokenError, TokenGrant};
pub use rate_limit::{BudgetDecision, RateBudget, TokenBucketBudget};
pub use sensitivity::SensitivityGate;
