//! User registry service - principal lookup and provisioning

use super::repository::PrincipalStore;
use super::types::{NewPrincipal, Principal, PrincipalKind};
use crate::error::Result;
use crate::facility_registry::Asset;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

/// Principal lookup and synthetic-account provisioning.
pub struct PrincipalRegistry {
    store: Arc<dyn PrincipalStore>,
}

impl PrincipalRegistry {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }

    pub async fn by_id(&self, id: i64) -> Result<Option<Principal>> {
        self.store.find_by_id(id).await
    }

    pub async fn by_username(&self, username: &str) -> Result<Option<Principal>> {
        self.store.find_by_username(username).await
    }

    /// Resolve a batch of ids preserving input order. Ids that no longer
    /// resolve are dropped from the result.
    pub async fn by_ids_ordered(&self, ids: &[i64]) -> Result<Vec<Principal>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(principal) = self.store.find_by_id(*id).await? {
                resolved.push(principal);
            }
        }
        Ok(resolved)
    }

    /// Device account bound 1:1 to an asset. Returns the existing account
    /// when one is already linked; otherwise provisions it. A concurrent
    /// provisioner losing the unique-key race falls back to re-reading, so
    /// both callers observe the same principal.
    pub async fn provision_for_asset(&self, asset: &Asset) -> Result<Principal> {
        if let Some(existing) = self.store.find_by_asset(asset.id).await? {
            return Ok(existing);
        }

        let new = NewPrincipal {
            username: format!("asset{}", asset.external_id),
            full_name: asset.name.clone(),
            kind: PrincipalKind::AssetDevice,
            verified: true,
            password_hash: throwaway_password_hash(),
            asset_id: Some(asset.id),
        };

        match self.store.insert(new).await {
            Ok(principal) => {
                info!(
                    principal_id = principal.id,
                    asset_external_id = %asset.external_id,
                    "Provisioned device principal"
                );
                Ok(principal)
            }
            Err(e) => match self.store.find_by_asset(asset.id).await? {
                Some(existing) => Ok(existing),
                None => Err(e),
            },
        }
    }

    /// Well-known integration account (e.g. the health-exchange service).
    /// Provisioned once, reused thereafter.
    pub async fn provision_service_account(&self, username: &str) -> Result<Principal> {
        if let Some(existing) = self.store.find_by_username(username).await? {
            return Ok(existing);
        }

        let new = NewPrincipal {
            username: username.to_string(),
            full_name: username.to_string(),
            kind: PrincipalKind::ExchangeService,
            verified: true,
            password_hash: throwaway_password_hash(),
            asset_id: None,
        };

        match self.store.insert(new).await {
            Ok(principal) => {
                info!(
                    principal_id = principal.id,
                    username = %principal.username,
                    "Provisioned service principal"
                );
                Ok(principal)
            }
            Err(e) => match self.store.find_by_username(username).await? {
                Some(existing) => Ok(existing),
                None => Err(e),
            },
        }
    }
}

/// Salted hash of a random password. The account can never present it;
/// synthetic kinds are rejected by type before any password check runs.
fn throwaway_password_hash() -> String {
    let mut rng = rand::thread_rng();
    let password: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let salt: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{}${:x}", salt, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_registry::testing::{staff, FakePrincipalStore};

    fn asset() -> Asset {
        Asset {
            id: 7,
            external_id: "cam-0007".to_string(),
            name: "Ward 3 camera".to_string(),
            facility_id: 1,
        }
    }

    #[tokio::test]
    async fn test_asset_provisioning_is_idempotent() {
        let store = Arc::new(FakePrincipalStore::new());
        let registry = PrincipalRegistry::new(store.clone());

        let first = registry.provision_for_asset(&asset()).await.unwrap();
        let second = registry.provision_for_asset(&asset()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.username, "assetcam-0007");
        assert_eq!(first.kind, PrincipalKind::AssetDevice);
        assert!(first.verified);
        assert_eq!(first.asset_id, Some(7));
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn test_service_account_provisioning_is_idempotent() {
        let store = Arc::new(FakePrincipalStore::new());
        let registry = PrincipalRegistry::new(store.clone());

        let first = registry.provision_service_account("hcx_service").await.unwrap();
        let second = registry.provision_service_account("hcx_service").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.kind, PrincipalKind::ExchangeService);
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn test_by_ids_ordered_drops_stale_and_keeps_order() {
        let store = Arc::new(FakePrincipalStore::new());
        let registry = PrincipalRegistry::new(store.clone());

        for id in [1i64, 2, 3] {
            store.seed(staff(id, &format!("user{id}"))).await;
        }

        let resolved = registry.by_ids_ordered(&[3, 99, 1]).await.unwrap();
        let ids: Vec<i64> = resolved.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_throwaway_hash_shape() {
        let hash = throwaway_password_hash();
        let (salt, digest) = hash.split_once('$').unwrap();
        assert_eq!(salt.len(), 16);
        assert_eq!(digest.len(), 64);
        assert_ne!(hash, throwaway_password_hash());
    }
}
