//! Authentication gateway
//!
//! ## Responsibilities
//!
//! - Token validation against the three trust sources:
//!   1. Direct bearer (`Bearer <jwt>`) — HS256 against the service's own
//!      signing secret
//!   2. Middleware (`Middleware_Bearer <jwt>` + `X-Facility-Id`) — RS256
//!      against the facility middleware's published key set
//!   3. External health exchange — RS256 against the fixed exchange
//!      certificate endpoint
//! - Mapping validated claims to a durable principal, provisioning
//!   synthetic device/service accounts on first contact
//!
//! Verification failures never propagate raw causes: the underlying error
//! is logged here and the caller sees the typed authentication error only.

mod gateway;
mod keys;
mod types;
mod validator;

pub use gateway::{AuthContext, AuthGateway};
pub use keys::{HttpKeyFetcher, KeyFetcher};
pub use types::{TrustSource, ValidatedClaims};
pub use validator::TokenValidator;
