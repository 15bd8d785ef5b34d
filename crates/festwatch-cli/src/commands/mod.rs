pub mod check;
pub mod code;
pub mod common;
pub mod film;
pub mod list;
pub mod whoami;
