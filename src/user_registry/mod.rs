//! User registry
//!
//! ## Responsibilities
//!
//! - Principal model: human operators and synthetic service accounts
//! - Lookup by username / id / linked asset
//! - Idempotent provisioning of synthetic principals for device and
//!   health-exchange tokens
//!
//! Synthetic principals carry their own `PrincipalKind` variants; nothing in
//! the human login path can mint or match one.

mod repository;
mod service;
#[cfg(test)]
pub mod testing;
mod types;

pub use repository::{PrincipalStore, SqlPrincipalStore};
pub use service::PrincipalRegistry;
pub use types::{NewPrincipal, Principal, PrincipalKind, PrincipalSummary};
