//! Usage coordinator - lock state machine over the shared cache

use super::types::{
    holder_key, waiting_key, AcquireOutcome, LockRecord, NotificationDispatcher,
    UsageNotification,
};
use crate::cache::UsageCache;
use crate::error::Result;
use crate::user_registry::{Principal, PrincipalRegistry};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Holder key as read back from the cache
enum HolderState {
    /// No record
    Vacant,
    /// Record present but past its expiry (or unreadable): logically vacant,
    /// the key itself still occupies the slot
    Stale,
    /// Live record
    Held(LockRecord),
}

/// Coordinates exclusive operator access to one camera at a time.
///
/// Invoked concurrently from independent request handlers with no shared
/// process memory; the cache is the only shared state. Acquisition of a
/// vacant lock is a single atomic conditional set, so two racing callers
/// cannot both believe they won. Waiting-list updates are best effort.
pub struct UsageCoordinator {
    cache: Arc<dyn UsageCache>,
    principals: Arc<PrincipalRegistry>,
    notifier: Arc<dyn NotificationDispatcher>,
    lease_secs: u64,
}

impl UsageCoordinator {
    pub fn new(
        cache: Arc<dyn UsageCache>,
        principals: Arc<PrincipalRegistry>,
        notifier: Arc<dyn NotificationDispatcher>,
        lease_secs: u64,
    ) -> Self {
        Self {
            cache,
            principals,
            notifier,
            lease_secs,
        }
    }

    fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    fn fresh_record(&self, holder_id: i64) -> Result<String> {
        let record = LockRecord {
            holder_id,
            expires_at: Utc::now() + ChronoDuration::seconds(self.lease_secs as i64),
        };
        Ok(serde_json::to_string(&record)?)
    }

    async fn read_holder(&self, asset_id: &str) -> Result<HolderState> {
        let Some(raw) = self.cache.get(&holder_key(asset_id)).await? else {
            return Ok(HolderState::Vacant);
        };

        let record: LockRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(asset_id = %asset_id, error = %e, "Unreadable holder record");
                return Ok(HolderState::Stale);
            }
        };

        // Lazy expiry: the record's own deadline wins over the cache TTL.
        if record.is_expired(Utc::now()) {
            return Ok(HolderState::Stale);
        }
        Ok(HolderState::Held(record))
    }

    /// Try to take the lock. The holder re-acquiring renews its lease; a
    /// vacant (or expired) lock is claimed with a single conditional set;
    /// anything else queues the caller.
    pub async fn acquire(&self, asset_id: &str, principal: &Principal) -> Result<AcquireOutcome> {
        let key = holder_key(asset_id);

        match self.read_holder(asset_id).await? {
            HolderState::Held(record) if record.holder_id == principal.id => {
                let value = self.fresh_record(principal.id)?;
                self.cache.set(&key, &value, self.lease_ttl()).await?;
                self.remove_from_waiting_list(asset_id, principal).await?;
                debug!(asset_id = %asset_id, principal_id = principal.id, "Lease renewed");
                return Ok(AcquireOutcome::Locked);
            }
            HolderState::Held(_) => return self.queue(asset_id, principal).await,
            HolderState::Stale => {
                // Clear the husk so the conditional set below can land.
                self.cache.delete(&key).await?;
            }
            HolderState::Vacant => {}
        }

        let value = self.fresh_record(principal.id)?;
        if self.cache.set_if_vacant(&key, &value, self.lease_ttl()).await? {
            self.remove_from_waiting_list(asset_id, principal).await?;
            info!(asset_id = %asset_id, principal_id = principal.id, "Camera locked");
            Ok(AcquireOutcome::Locked)
        } else {
            // Another caller's conditional set won the race.
            self.queue(asset_id, principal).await
        }
    }

    /// `acquire`, plus a best-effort nudge to the current holder when the
    /// caller ends up queued.
    pub async fn request_access(
        &self,
        asset_id: &str,
        principal: &Principal,
    ) -> Result<AcquireOutcome> {
        let outcome = self.acquire(asset_id, principal).await?;
        if !outcome.is_locked() {
            self.notify_holder_of_request(asset_id, principal).await;
        }
        Ok(outcome)
    }

    /// Release the lock. Only the current holder transitions the state;
    /// everyone queued is notified (FIFO) before the list is cleared. A
    /// non-holder caller leaves the lock untouched but exits the queue.
    pub async fn release(&self, asset_id: &str, principal: &Principal) -> Result<()> {
        if let HolderState::Held(record) = self.read_holder(asset_id).await? {
            if record.holder_id == principal.id {
                self.cache.delete(&holder_key(asset_id)).await?;
                info!(asset_id = %asset_id, principal_id = principal.id, "Camera released");

                self.notify_waiting_list(asset_id).await?;
                self.cache.list_clear(&waiting_key(asset_id)).await?;
            }
        }

        self.remove_from_waiting_list(asset_id, principal).await
    }

    /// True when the lock is vacant or held by this principal. Read-only.
    pub async fn has_access(&self, asset_id: &str, principal: &Principal) -> Result<bool> {
        Ok(match self.read_holder(asset_id).await? {
            HolderState::Held(record) => record.holder_id == principal.id,
            HolderState::Vacant | HolderState::Stale => true,
        })
    }

    /// Resolve the current holder for display. A holder id that no longer
    /// resolves clears the stale key.
    pub async fn current_holder(&self, asset_id: &str) -> Result<Option<Principal>> {
        let HolderState::Held(record) = self.read_holder(asset_id).await? else {
            return Ok(None);
        };

        match self.principals.by_id(record.holder_id).await? {
            Some(principal) => Ok(Some(principal)),
            None => {
                self.cache.delete(&holder_key(asset_id)).await?;
                Ok(None)
            }
        }
    }

    /// Queued principals in FIFO order. Ids that no longer resolve are
    /// dropped from the result; only acquire/release/cancel mutate the list.
    pub async fn waiting_list(&self, asset_id: &str) -> Result<Vec<Principal>> {
        let ids: Vec<i64> = self
            .cache
            .list_range(&waiting_key(asset_id))
            .await?
            .iter()
            .filter_map(|raw| raw.parse().ok())
            .collect();
        self.principals.by_ids_ordered(&ids).await
    }

    /// Leave the waiting list without touching the lock.
    pub async fn cancel_request(&self, asset_id: &str, principal: &Principal) -> Result<()> {
        self.remove_from_waiting_list(asset_id, principal).await
    }

    async fn queue(&self, asset_id: &str, principal: &Principal) -> Result<AcquireOutcome> {
        let queue_length = self
            .cache
            .list_push_if_absent(&waiting_key(asset_id), &principal.id.to_string())
            .await?;
        debug!(
            asset_id = %asset_id,
            principal_id = principal.id,
            queue_length,
            "Camera busy, caller queued"
        );
        Ok(AcquireOutcome::Queued { queue_length })
    }

    async fn remove_from_waiting_list(&self, asset_id: &str, principal: &Principal) -> Result<()> {
        self.cache
            .list_remove(&waiting_key(asset_id), &principal.id.to_string())
            .await
    }

    /// One availability notification per queued principal, FIFO. Sequential
    /// and not transactional with the list clear that follows; a crash
    /// mid-loop means missed or duplicate notifications, which best-effort
    /// delivery tolerates.
    async fn notify_waiting_list(&self, asset_id: &str) -> Result<()> {
        for principal in self.waiting_list(asset_id).await? {
            self.notifier
                .send(
                    &principal.username,
                    UsageNotification::availability(asset_id),
                )
                .await;
        }
        Ok(())
    }

    /// Tell the holder someone wants the camera. Every failure here is
    /// swallowed: a missing holder or requester skips the notification.
    async fn notify_holder_of_request(&self, asset_id: &str, requester: &Principal) {
        let holder = match self.current_holder(asset_id).await {
            Ok(Some(holder)) => holder,
            Ok(None) => return,
            Err(e) => {
                warn!(asset_id = %asset_id, error = %e, "Holder lookup failed, skipping notification");
                return;
            }
        };

        self.notifier
            .send(
                &holder.username,
                UsageNotification::access_request(asset_id, requester),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_usage::types::UsageAction;
    use crate::cache::MemoryCache;
    use crate::user_registry::testing::{staff, FakePrincipalStore};
    use tokio::sync::Mutex;

    const ASSET: &str = "cam-0042";

    #[derive(Default)]
    struct RecordingDispatcher {
        sent: Mutex<Vec<(String, UsageNotification)>>,
    }

    impl RecordingDispatcher {
        async fn sent(&self) -> Vec<(String, UsageNotification)> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        async fn send(&self, username: &str, notification: UsageNotification) {
            self.sent
                .lock()
                .await
                .push((username.to_string(), notification));
        }
    }

    struct Harness {
        coordinator: UsageCoordinator,
        cache: Arc<MemoryCache>,
        dispatcher: Arc<RecordingDispatcher>,
    }

    async fn harness() -> Harness {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(FakePrincipalStore::new());
        for (id, name) in [(1, "alice"), (2, "bala"), (3, "chitra")] {
            store.seed(staff(id, name)).await;
        }
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let coordinator = UsageCoordinator::new(
            cache.clone(),
            Arc::new(PrincipalRegistry::new(store.clone())),
            dispatcher.clone(),
            300,
        );
        Harness {
            coordinator,
            cache,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_acquire_vacant_then_idempotent_reacquire() {
        let h = harness().await;
        let alice = staff(1, "alice");

        assert_eq!(
            h.coordinator.acquire(ASSET, &alice).await.unwrap(),
            AcquireOutcome::Locked
        );
        assert!(h.coordinator.has_access(ASSET, &alice).await.unwrap());

        // Re-acquire renews, does not queue the holder
        assert_eq!(
            h.coordinator.acquire(ASSET, &alice).await.unwrap(),
            AcquireOutcome::Locked
        );
        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_contender_queues_exactly_once() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();

        assert_eq!(
            h.coordinator.acquire(ASSET, &bala).await.unwrap(),
            AcquireOutcome::Queued { queue_length: 1 }
        );
        assert!(!h.coordinator.has_access(ASSET, &bala).await.unwrap());

        // Second attempt does not duplicate the entry
        assert_eq!(
            h.coordinator.acquire(ASSET, &bala).await.unwrap(),
            AcquireOutcome::Queued { queue_length: 1 }
        );
        assert_eq!(
            h.cache.list_range(&waiting_key(ASSET)).await.unwrap(),
            vec!["2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_acquisition_removes_caller_from_waiting_list() {
        let h = harness().await;
        let alice = staff(1, "alice");

        h.cache
            .list_push_if_absent(&waiting_key(ASSET), "1")
            .await
            .unwrap();

        h.coordinator.acquire(ASSET, &alice).await.unwrap();
        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_release_by_non_holder_keeps_lock_but_dequeues_caller() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();
        h.coordinator.acquire(ASSET, &bala).await.unwrap();

        h.coordinator.release(ASSET, &bala).await.unwrap();

        assert!(h.coordinator.has_access(ASSET, &alice).await.unwrap());
        assert!(!h.coordinator.has_access(ASSET, &bala).await.unwrap());
        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());
        assert!(h.dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_release_notifies_waiting_list_in_fifo_order_then_clears() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");
        let chitra = staff(3, "chitra");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();
        h.coordinator.acquire(ASSET, &bala).await.unwrap();
        h.coordinator.acquire(ASSET, &chitra).await.unwrap();

        h.coordinator.release(ASSET, &alice).await.unwrap();

        let sent = h.dispatcher.sent().await;
        let recipients: Vec<&str> = sent.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(recipients, vec!["bala", "chitra"]);
        for (_, notification) in &sent {
            assert_eq!(notification.action, UsageAction::CameraAvailability);
            assert_eq!(notification.asset_id, ASSET);
        }

        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());
        assert!(h.coordinator.has_access(ASSET, &bala).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_record_reads_as_vacant() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        // Record past its own deadline while the cache entry is still live:
        // the record's expiry must win.
        let expired = LockRecord {
            holder_id: alice.id,
            expires_at: Utc::now() - ChronoDuration::seconds(5),
        };
        h.cache
            .set(
                &holder_key(ASSET),
                &serde_json::to_string(&expired).unwrap(),
                Duration::from_secs(300),
            )
            .await
            .unwrap();

        assert!(h.coordinator.has_access(ASSET, &bala).await.unwrap());
        assert_eq!(
            h.coordinator.acquire(ASSET, &bala).await.unwrap(),
            AcquireOutcome::Locked
        );
        assert!(!h.coordinator.has_access(ASSET, &alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_request_access_notifies_holder() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();

        let outcome = h.coordinator.request_access(ASSET, &bala).await.unwrap();
        assert!(!outcome.is_locked());

        let sent = h.dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice");
        assert_eq!(sent[0].1.action, UsageAction::CameraAccessRequest);
        assert!(sent[0].1.message.contains("bala"));
    }

    #[tokio::test]
    async fn test_request_access_on_vacant_lock_just_locks() {
        let h = harness().await;
        let bala = staff(2, "bala");

        let outcome = h.coordinator.request_access(ASSET, &bala).await.unwrap();
        assert!(outcome.is_locked());
        assert!(h.dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_waiting_list_drops_stale_ids_without_mutating() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();
        h.coordinator.acquire(ASSET, &bala).await.unwrap();
        // An id with no surviving principal
        h.cache
            .list_push_if_absent(&waiting_key(ASSET), "999")
            .await
            .unwrap();
        h.coordinator.acquire(ASSET, &staff(3, "chitra")).await.unwrap();

        let waiting = h.coordinator.waiting_list(ASSET).await.unwrap();
        let usernames: Vec<&str> = waiting.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(usernames, vec!["bala", "chitra"]);

        // The stale entry stays in the underlying list
        assert_eq!(
            h.cache.list_range(&waiting_key(ASSET)).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_current_holder_clears_dangling_record() {
        let h = harness().await;

        let record = LockRecord {
            holder_id: 999,
            expires_at: Utc::now() + ChronoDuration::seconds(300),
        };
        h.cache
            .set(
                &holder_key(ASSET),
                &serde_json::to_string(&record).unwrap(),
                Duration::from_secs(300),
            )
            .await
            .unwrap();

        assert!(h.coordinator.current_holder(ASSET).await.unwrap().is_none());
        assert!(h.cache.get(&holder_key(ASSET)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_request_leaves_queue_only() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        h.coordinator.acquire(ASSET, &alice).await.unwrap();
        h.coordinator.acquire(ASSET, &bala).await.unwrap();

        h.coordinator.cancel_request(ASSET, &bala).await.unwrap();

        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());
        assert!(h.coordinator.has_access(ASSET, &alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_record_is_reclaimable() {
        let h = harness().await;
        let bala = staff(2, "bala");

        h.cache
            .set(&holder_key(ASSET), "not json", Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(
            h.coordinator.acquire(ASSET, &bala).await.unwrap(),
            AcquireOutcome::Locked
        );
    }

    #[tokio::test]
    async fn test_scenario_acquire_request_release() {
        let h = harness().await;
        let alice = staff(1, "alice");
        let bala = staff(2, "bala");

        // acquire(A) on vacant camera
        assert!(h.coordinator.acquire(ASSET, &alice).await.unwrap().is_locked());

        // request_access(B): queued, A notified
        assert!(!h
            .coordinator
            .request_access(ASSET, &bala)
            .await
            .unwrap()
            .is_locked());

        // release(A): vacant again, B notified, list empty
        h.coordinator.release(ASSET, &alice).await.unwrap();

        assert!(h.coordinator.has_access(ASSET, &bala).await.unwrap());
        assert!(h
            .cache
            .list_range(&waiting_key(ASSET))
            .await
            .unwrap()
            .is_empty());

        let sent = h.dispatcher.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "alice");
        assert_eq!(sent[0].1.action, UsageAction::CameraAccessRequest);
        assert_eq!(sent[1].0, "bala");
        assert_eq!(sent[1].1.action, UsageAction::CameraAvailability);
    }
}
