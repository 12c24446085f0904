//! Camera usage coordination
//!
//! ## Responsibilities
//!
//! - Single-holder lock per camera asset, leased, stored in the shared cache
//! - FIFO waiting list per asset, no duplicates
//! - Availability / access-request notifications through the dispatcher
//!
//! Lock state never lives in process memory: every server instance operates
//! on the same cache keys, so each transition is expressed as an atomic
//! per-key cache operation. Contention is a normal return value, not an
//! error.

mod coordinator;
mod types;

pub use coordinator::UsageCoordinator;
pub use types::{
    holder_key, waiting_key, AcquireOutcome, LockRecord, NotificationDispatcher, UsageAction,
    UsageNotification, UsageStatus,
};
