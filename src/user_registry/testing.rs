//! Test support: in-memory principal store

use super::repository::PrincipalStore;
use super::types::{NewPrincipal, Principal, PrincipalKind};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// In-memory store counting provisioning writes.
#[derive(Default)]
pub struct FakePrincipalStore {
    by_id: Mutex<HashMap<i64, Principal>>,
    next_id: AtomicI64,
    pub inserts: AtomicUsize,
}

impl FakePrincipalStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub async fn seed(&self, principal: Principal) {
        self.by_id.lock().await.insert(principal.id, principal);
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

/// Staff principal with the given id and username.
pub fn staff(id: i64, username: &str) -> Principal {
    Principal {
        id,
        external_id: format!("ext-{id}"),
        username: username.to_string(),
        full_name: format!("Test {username}"),
        kind: PrincipalKind::Staff,
        verified: true,
        asset_id: None,
    }
}

#[async_trait::async_trait]
impl PrincipalStore for FakePrincipalStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>> {
        Ok(self.by_id.lock().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>> {
        Ok(self
            .by_id
            .lock()
            .await
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn find_by_asset(&self, asset_id: i64) -> Result<Option<Principal>> {
        Ok(self
            .by_id
            .lock()
            .await
            .values()
            .find(|p| p.asset_id == Some(asset_id))
            .cloned())
    }

    async fn insert(&self, new: NewPrincipal) -> Result<Principal> {
        let mut by_id = self.by_id.lock().await;
        if by_id.values().any(|p| p.username == new.username) {
            return Err(Error::Database("duplicate username".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let principal = Principal {
            id,
            external_id: format!("ext-{id}"),
            username: new.username,
            full_name: new.full_name,
            kind: new.kind,
            verified: new.verified,
            asset_id: new.asset_id,
        };
        by_id.insert(id, principal.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(principal)
    }
}
