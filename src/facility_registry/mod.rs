//! Facility registry
//!
//! ## Responsibilities
//!
//! - Facility lookup by external id (middleware trust endpoint lives here)
//! - Asset (camera) lookup by external id, with its owning facility
//!
//! The store is a trait so the auth gateway can be exercised against an
//! in-memory directory in tests.

mod repository;
mod types;

pub use repository::{DirectoryStore, SqlDirectoryStore};
pub use types::{Asset, Facility};
