//! Core client logic for the Celo notes dApp.
//! This crate owns the wallet session and the on-chain note mirror.

pub mod config;
pub mod format;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod service;
pub mod view;

pub use config::{AppConfig, ConfigError, DEFAULT_CONTRACT_ADDRESS};
pub use format::{format_balance, format_last_modified, truncate_address};
pub use gateway::{
    ChainClient, GatewayError, GatewayResult, NotesContract, TotalBalance, WalletProvider,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDecodeError, NoteId, RawNote, Visibility};
pub use service::note_store::{NoteStore, NoteStoreError, NoteStoreResult};
pub use service::session_manager::{
    SessionError, SessionManager, SessionResult, SessionState, INSTALL_WALLET_MESSAGE,
};
pub use view::{ActionResponse, NoteRow, NotesDapp, ViewSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
