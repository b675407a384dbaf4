//! Domain models for the storefront web layer.

pub mod session;

pub use session::{claim_silent_check, keys as session_keys, load_wallet, save_wallet};
