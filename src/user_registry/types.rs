//! User registry type definitions

use serde::{Deserialize, Serialize};

/// Principal kind. Closed set: human roles plus the two synthetic kinds
/// used for auto-provisioned accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
pub enum PrincipalKind {
    Staff,
    Doctor,
    Nurse,
    Volunteer,
    /// Camera/device account provisioned from a middleware token
    AssetDevice,
    /// Health-exchange integration account
    ExchangeService,
}

impl PrincipalKind {
    /// Display name used in operator-facing notification text
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Doctor => "Doctor",
            Self::Nurse => "Nurse",
            Self::Volunteer => "Volunteer",
            Self::AssetDevice => "Device",
            Self::ExchangeService => "Service",
        }
    }

    /// True for auto-provisioned accounts that never log in directly
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::AssetDevice | Self::ExchangeService)
    }
}

/// An authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub external_id: String,
    pub username: String,
    pub full_name: String,
    pub kind: PrincipalKind,
    pub verified: bool,
    /// Set for AssetDevice principals: the asset this account is bound to
    pub asset_id: Option<i64>,
}

/// Insert payload for provisioning
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: String,
    pub full_name: String,
    pub kind: PrincipalKind,
    pub verified: bool,
    pub password_hash: String,
    pub asset_id: Option<i64>,
}

/// Minimal principal view for API responses and waiting-list listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalSummary {
    pub id: i64,
    pub external_id: String,
    pub username: String,
    pub full_name: String,
    pub kind: PrincipalKind,
}

impl From<&Principal> for PrincipalSummary {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            external_id: p.external_id.clone(),
            username: p.username.clone(),
            full_name: p.full_name.clone(),
            kind: p.kind,
        }
    }
}
