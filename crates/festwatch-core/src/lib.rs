//! festwatch-core - Core library for festwatch
//!
//! This crate contains the shared watchlist models, the client for the
//! watchlist service, device-local persistence, and the offline-first
//! synchronization state used by festwatch clients and the API service.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{SyncCode, UserId, Watchlist};
pub use state::{LoadPhase, MutationOutcome};
pub use sync::WatchlistManager;
