//! Authentication type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the three schemes validated the credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustSource {
    Direct,
    Middleware,
    HealthExchange,
}

/// Verified, decoded content of a presented token. Ephemeral, produced per
/// request; never persisted.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    pub source: TrustSource,
    /// Subject identifier embedded by the issuer (direct tokens)
    pub subject: Option<String>,
    /// Asset binding carried by middleware tokens
    pub asset_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Claims of a token minted by this service
#[derive(Debug, Serialize, Deserialize)]
pub struct DirectClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Claims accepted from a facility middleware
#[derive(Debug, Deserialize)]
pub struct MiddlewareClaims {
    pub asset_id: Option<String>,
    pub exp: i64,
}

/// Claims accepted from the health exchange
#[derive(Debug, Deserialize)]
pub struct ExchangeClaims {
    pub sub: Option<String>,
    pub exp: i64,
}
