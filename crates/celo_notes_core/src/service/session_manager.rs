//! Wallet session lifecycle.
//!
//! # Responsibility
//! - Obtain wallet authorization and a client handle from the injected provider.
//! - Track the active account, its CELO balance and the bound notes contract.
//!
//! # Invariants
//! - Address and client handle are present together or not at all.
//! - `Disconnected -> Connecting -> Connected` on success; any failure while
//!   connecting returns to `Disconnected`.
//! - Balance and contract failures never tear the session down.

use crate::gateway::{ChainClient, GatewayError, NotesContract, WalletProvider};
use ethers::types::{Address, U256};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Instruction shown when no wallet provider is available.
pub const INSTALL_WALLET_MESSAGE: &str =
    "Please install CeloExtensionWallet to continue with this app";

pub type SessionResult<T> = Result<T, SessionError>;

/// Session lifecycle error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No wallet provider is injected; carries nothing, the fix is user action.
    MissingProvider,
    /// Operation requires an established session.
    NotConnected,
    /// Wallet granted access but exposed no accounts.
    NoAccounts,
    Gateway(GatewayError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingProvider => f.write_str(INSTALL_WALLET_MESSAGE),
            Self::NotConnected => f.write_str("wallet is not connected"),
            Self::NoAccounts => f.write_str("wallet exposed no accounts"),
            Self::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for SessionError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

/// Connection state of the wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

struct ConnectedSession {
    address: Address,
    client: Arc<dyn ChainClient>,
}

/// Owner of the wallet session and the handles derived from it.
pub struct SessionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    contract_address: Address,
    state: SessionState,
    session: Option<ConnectedSession>,
    balance: Option<U256>,
    contract: Option<Arc<dyn NotesContract>>,
}

impl SessionManager {
    /// Creates a disconnected manager.
    ///
    /// `provider` is `None` when no wallet is injected into the environment.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, contract_address: Address) -> Self {
        Self {
            provider,
            contract_address,
            state: SessionState::Disconnected,
            session: None,
            balance: None,
            contract: None,
        }
    }

    /// Requests wallet permission and activates the first authorized account.
    ///
    /// Calling this on a connected session returns the active address.
    ///
    /// # Errors
    /// - `MissingProvider` when no wallet is injected.
    /// - `Gateway` when permission is denied or the provider fails.
    /// - `NoAccounts` when the wallet exposes no accounts.
    pub async fn connect(&mut self) -> SessionResult<Address> {
        if let Some(session) = &self.session {
            return Ok(session.address);
        }

        let Some(provider) = self.provider.clone() else {
            warn!("event=wallet_connect module=session status=error reason=missing_provider");
            return Err(SessionError::MissingProvider);
        };

        self.state = SessionState::Connecting;
        match establish(provider.as_ref()).await {
            Ok(session) => {
                let address = session.address;
                self.session = Some(session);
                self.state = SessionState::Connected;
                info!("event=wallet_connect module=session status=ok address={address:?}");
                Ok(address)
            }
            Err(err) => {
                self.state = SessionState::Disconnected;
                error!("event=wallet_connect module=session status=error error={err}");
                Err(err)
            }
        }
    }

    /// Binds the notes contract on first use, then reads the CELO balance of
    /// the active account.
    ///
    /// The contract stays bound even when the balance query fails.
    ///
    /// # Errors
    /// - `NotConnected` before `connect()` succeeds.
    /// - `Gateway` when contract binding or the balance query fails; the
    ///   balance stays at its previous value.
    pub async fn fetch_balance(&mut self) -> SessionResult<U256> {
        let Some(session) = &self.session else {
            return Err(SessionError::NotConnected);
        };
        let address = session.address;
        let client = session.client.clone();

        if self.contract.is_none() {
            match client.notes_contract(self.contract_address) {
                Ok(contract) => {
                    self.contract = Some(contract);
                    info!(
                        "event=contract_bind module=session status=ok contract={:?}",
                        self.contract_address
                    );
                }
                Err(err) => {
                    error!("event=contract_bind module=session status=error error={err}");
                    return Err(err.into());
                }
            }
        }

        let total = match client.total_balance(address).await {
            Ok(total) => total,
            Err(err) => {
                error!("event=balance_fetch module=session status=error error={err}");
                return Err(err.into());
            }
        };

        self.balance = Some(total.celo);
        info!(
            "event=balance_fetch module=session status=ok stable_tokens={}",
            total.stable.len()
        );
        Ok(total.celo)
    }

    /// Drops the session and every handle derived from it.
    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            info!("event=wallet_disconnect module=session status=ok");
        }
        self.balance = None;
        self.contract = None;
        self.state = SessionState::Disconnected;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Active account address.
    pub fn address(&self) -> Option<Address> {
        self.session.as_ref().map(|session| session.address)
    }

    /// Last fetched CELO balance in base units.
    pub fn balance(&self) -> Option<U256> {
        self.balance
    }

    /// Bound notes contract handle.
    pub fn contract(&self) -> Option<Arc<dyn NotesContract>> {
        self.contract.clone()
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }
}

async fn establish(provider: &dyn WalletProvider) -> SessionResult<ConnectedSession> {
    provider.enable().await?;
    let client = provider.client()?;
    let accounts = client.accounts().await?;
    let address = accounts.first().copied().ok_or(SessionError::NoAccounts)?;
    Ok(ConnectedSession { address, client })
}
