//! Data models for festwatch

mod sync_code;
mod user;
mod watchlist;
pub mod wire;

pub use sync_code::{SyncCode, SYNC_CODE_ALPHABET, SYNC_CODE_LENGTH, SYNC_CODE_TTL};
pub use user::UserId;
pub use watchlist::Watchlist;
