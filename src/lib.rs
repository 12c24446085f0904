//! CamGate - camera access gateway for care facilities
//!
//! ## Architecture
//!
//! 1. AuthGateway - bearer validation for three trust sources + principal
//!    resolution
//! 2. UserRegistry - durable principals, synthetic account provisioning
//! 3. FacilityRegistry - facilities, assets, middleware trust endpoints
//! 4. UsageCoordinator - single-holder camera lock with FIFO waiting list
//! 5. Cache - shared lock-state backend (Redis, or in-process fallback)
//! 6. RealtimeHub - WebSocket delivery of usage events
//! 7. WebAPI - REST endpoints
//!
//! ## Design Principles
//!
//! - Lock state lives only in the shared cache; server instances hold no
//!   lock state in memory
//! - Every external collaborator (cache, stores, key fetch, notification
//!   delivery) sits behind a trait so services run against fakes in tests
//! - Contention is data, not an error

pub mod auth;
pub mod cache;
pub mod camera_usage;
pub mod error;
pub mod facility_registry;
pub mod models;
pub mod realtime_hub;
pub mod state;
pub mod user_registry;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
