//! Chain gateway contracts.
//!
//! # Responsibility
//! - Define the seams between core services and the wallet/contract endpoints.
//! - Keep JSON-RPC and ABI details inside gateway implementations.
//!
//! # Invariants
//! - Gateway handles are write-once: services clone `Arc`s, never mutate them.
//! - State-changing calls resolve only after the transaction has a receipt.
//! - Raw note records are returned undecoded; decoding belongs to the model.
//!
//! # See also
//! - `service::session_manager`, `service::note_store`

use crate::model::note::{NoteId, RawNote};
use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod rpc;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by a wallet provider, chain client or contract handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The wallet refused to grant access or sign.
    Rejected(String),
    /// RPC transport or node failure.
    Transport(String),
    /// Contract call could not be built or was refused by the node.
    Contract(String),
    /// Transaction was mined but reverted, or was dropped before mining.
    Reverted(TxHash),
    /// The endpoint answered with a value of unexpected shape.
    InvalidResponse(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "wallet rejected request: {reason}"),
            Self::Transport(reason) => write!(f, "rpc transport failure: {reason}"),
            Self::Contract(reason) => write!(f, "contract call failed: {reason}"),
            Self::Reverted(hash) => write!(f, "transaction {hash:#x} did not succeed"),
            Self::InvalidResponse(reason) => write!(f, "unexpected gateway response: {reason}"),
        }
    }
}

impl Error for GatewayError {}

/// Account balance across the native currency and known stable tokens.
///
/// All amounts are base units (18 decimals).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalBalance {
    /// Native CELO balance.
    pub celo: U256,
    /// Stable-token balances keyed by symbol, e.g. `cUSD`.
    pub stable: BTreeMap<String, U256>,
}

/// Wallet endpoint injected into the client environment.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests permission to use the wallet's accounts.
    async fn enable(&self) -> GatewayResult<()>;
    /// Derives a chain client bound to this provider.
    fn client(&self) -> GatewayResult<Arc<dyn ChainClient>>;
}

/// Client handle derived from an enabled wallet provider.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns authorized accounts; the first entry is the active account.
    async fn accounts(&self) -> GatewayResult<Vec<Address>>;
    /// Returns the total balance held by `address`.
    async fn total_balance(&self, address: Address) -> GatewayResult<TotalBalance>;
    /// Binds the notes contract deployed at `address`.
    fn notes_contract(&self, address: Address) -> GatewayResult<Arc<dyn NotesContract>>;
}

/// Contract-bound handle for the notes contract methods.
#[async_trait]
pub trait NotesContract: Send + Sync {
    /// Returns every stored note record in contract order.
    async fn get_notes(&self) -> GatewayResult<Vec<RawNote>>;
    /// Submits `addNote(title, note, tag)` signed by `from`.
    async fn add_note(
        &self,
        from: Address,
        title: &str,
        note: &str,
        tag: &str,
    ) -> GatewayResult<TxHash>;
    /// Submits `setCompleted(noteId)` signed by `from`.
    async fn set_completed(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash>;
    /// Submits `deleteNote(noteId)` signed by `from`.
    async fn delete_note(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash>;
}
