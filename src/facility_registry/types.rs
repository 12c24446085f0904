//! Facility registry type definitions

use serde::{Deserialize, Serialize};

/// A care facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    /// Hostname of the facility's on-premise middleware. A facility without
    /// one has no trust relationship for device tokens.
    pub middleware_address: Option<String>,
}

impl Facility {
    /// OpenID key-set URL of this facility's middleware, if configured.
    pub fn open_id_url(&self) -> Option<String> {
        self.middleware_address
            .as_ref()
            .map(|addr| format!("https://{}/.well-known/openid-configuration/", addr))
    }
}

/// A managed camera asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    /// Facility the asset currently belongs to
    pub facility_id: i64,
}
