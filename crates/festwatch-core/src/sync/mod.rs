//! Offline-first watchlist synchronization.
//!
//! [`WatchlistManager`] owns the in-memory watchlist of one client session. It
//! keeps a local snapshot for instant startup, merges it with the service copy
//! on load, applies mutations optimistically and rolls them back when the
//! service write fails, and exchanges sync codes with other devices.

mod manager;

pub use manager::{WatchlistManager, MAX_CODE_ATTEMPTS};
