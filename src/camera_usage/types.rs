//! Camera usage type definitions

use crate::user_registry::{Principal, PrincipalSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache key of the holder record for an asset
pub fn holder_key(asset_external_id: &str) -> String {
    format!("lock:holder:{asset_external_id}")
}

/// Cache key of the waiting list for an asset
pub fn waiting_key(asset_external_id: &str) -> String {
    format!("lock:waiting:{asset_external_id}")
}

/// Holder record stored at `lock:holder:<asset>`.
///
/// `expires_at` is authoritative: a record past it is treated as vacant by
/// the next operation that reads it, regardless of the cache TTL riding on
/// the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub holder_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of an acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Caller holds the lock (fresh lease)
    Locked,
    /// Lock held by someone else; caller is on the waiting list
    Queued { queue_length: usize },
}

impl AcquireOutcome {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Notification action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageAction {
    CameraAvailability,
    CameraAccessRequest,
}

/// Event pushed to an operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub asset_id: String,
    pub message: String,
    pub action: UsageAction,
}

impl UsageNotification {
    pub fn availability(asset_external_id: &str) -> Self {
        Self {
            kind: "MESSAGE".to_string(),
            asset_id: asset_external_id.to_string(),
            message: "Camera is now available".to_string(),
            action: UsageAction::CameraAvailability,
        }
    }

    pub fn access_request(asset_external_id: &str, requester: &Principal) -> Self {
        Self {
            kind: "MESSAGE".to_string(),
            asset_id: asset_external_id.to_string(),
            message: format!(
                "{}, {} ({}) has requested access to the camera",
                requester.kind.display_name(),
                requester.full_name,
                requester.username
            ),
            action: UsageAction::CameraAccessRequest,
        }
    }
}

/// Delivery channel consumed by the coordinator. Fire and forget: no
/// delivery guarantee, no retry, and the coordinator never blocks on a
/// confirmation.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, username: &str, notification: UsageNotification);
}

/// Usage state of an asset, for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatus {
    pub asset_id: String,
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_holder: Option<PrincipalSummary>,
    pub waiting: Vec<PrincipalSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_registry::testing::staff;

    #[test]
    fn test_notification_wire_shape() {
        let json = serde_json::to_value(UsageNotification::availability("cam-0042")).unwrap();
        assert_eq!(json["type"], "MESSAGE");
        assert_eq!(json["asset_id"], "cam-0042");
        assert_eq!(json["action"], "CAMERA_AVAILABILITY");
        assert_eq!(json["message"], "Camera is now available");
    }

    #[test]
    fn test_access_request_message_names_requester() {
        let requester = staff(5, "dr_rao");
        let n = UsageNotification::access_request("cam-0042", &requester);
        assert_eq!(
            n.message,
            "Staff, Test dr_rao (dr_rao) has requested access to the camera"
        );
        assert_eq!(
            serde_json::to_value(&n).unwrap()["action"],
            "CAMERA_ACCESS_REQUEST"
        );
    }

    #[test]
    fn test_lock_record_expiry() {
        let now = Utc::now();
        let live = LockRecord {
            holder_id: 1,
            expires_at: now + chrono::Duration::seconds(30),
        };
        let stale = LockRecord {
            holder_id: 1,
            expires_at: now - chrono::Duration::seconds(1),
        };
        assert!(!live.is_expired(now));
        assert!(stale.is_expired(now));
    }
}
