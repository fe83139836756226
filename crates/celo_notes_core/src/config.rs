//! Runtime configuration loaded from the environment.
//!
//! # Responsibility
//! - Read `CELO_NOTES_*` variables (optionally from a `.env` file).
//! - Validate addresses and token lists before any network call.
//! - Build the wallet provider the session manager is injected with.
//!
//! # Invariants
//! - A missing private key means "no wallet provider", never an error.
//! - The contract address defaults to the deployed notes contract.

use crate::gateway::rpc::RpcWalletProvider;
use crate::gateway::{GatewayError, WalletProvider};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// Deployed notes contract on Celo Alfajores.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x8216E0B0B9b7ddcD36e22A23e3B33fE1b9409685";
pub const DEFAULT_RPC_URL: &str = "https://alfajores-forno.celo-testnet.org";
pub const DEFAULT_CHAIN_ID: u64 = 44787;

const ENV_PREFIX: &str = "CELO_NOTES_";

/// Configuration failure.
#[derive(Debug)]
pub enum ConfigError {
    Env(envy::Error),
    DotEnv(dotenvy::Error),
    InvalidAddress { field: &'static str, value: String },
    InvalidTokenEntry(String),
    Wallet(GatewayError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env(err) => write!(f, "invalid environment: {err}"),
            Self::DotEnv(err) => write!(f, "cannot read env file: {err}"),
            Self::InvalidAddress { field, value } => {
                write!(f, "`{field}` is not a valid address: `{value}`")
            }
            Self::InvalidTokenEntry(entry) => {
                write!(f, "stable token entry must be SYMBOL=0xADDRESS, got `{entry}`")
            }
            Self::Wallet(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Env(err) => Some(err),
            Self::DotEnv(err) => Some(err),
            Self::Wallet(err) => Some(err),
            Self::InvalidAddress { .. } | Self::InvalidTokenEntry(_) => None,
        }
    }
}

impl From<envy::Error> for ConfigError {
    fn from(value: envy::Error) -> Self {
        Self::Env(value)
    }
}

impl From<dotenvy::Error> for ConfigError {
    fn from(value: dotenvy::Error) -> Self {
        Self::DotEnv(value)
    }
}

impl From<GatewayError> for ConfigError {
    fn from(value: GatewayError) -> Self {
        Self::Wallet(value)
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_contract_address() -> String {
    DEFAULT_CONTRACT_ADDRESS.to_string()
}

fn default_log_level() -> String {
    crate::logging::default_log_level().to_string()
}

/// Application settings.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    /// Hex signing key. Absent when no wallet is available.
    pub private_key: Option<String>,
    /// Comma-separated `SYMBOL=0xADDRESS` pairs, e.g. `cUSD=0x...`.
    pub stable_tokens: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Absolute directory for rotating log files; stderr when absent.
    pub log_dir: Option<String>,
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("contract_address", &self.contract_address)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("stable_tokens", &self.stable_tokens)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads settings from the process environment, reading `.env` first
    /// when one exists in the working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }
        Self::from_vars(std::env::vars())
    }

    /// Loads settings from an explicit env file plus the process environment.
    ///
    /// Exported variables take precedence over the file's entries.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_env_file_with(path, std::env::vars())
    }

    fn from_env_file_with<I>(path: &Path, overrides: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: BTreeMap<String, String> = dotenvy::from_path_iter(path)?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        vars.extend(overrides);
        Self::from_vars(vars)
    }

    /// Loads settings from `CELO_NOTES_*` pairs in `vars`.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.contract_address()?;
        config.stable_tokens()?;
        Ok(config)
    }

    /// Parsed notes contract address.
    pub fn contract_address(&self) -> Result<Address, ConfigError> {
        parse_address("contract_address", &self.contract_address)
    }

    /// Parsed stable-token list in declaration order.
    pub fn stable_tokens(&self) -> Result<Vec<(String, Address)>, ConfigError> {
        let Some(raw) = self.stable_tokens.as_deref() else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (symbol, address) = entry
                    .split_once('=')
                    .ok_or_else(|| ConfigError::InvalidTokenEntry(entry.to_string()))?;
                let symbol = symbol.trim();
                if symbol.is_empty() {
                    return Err(ConfigError::InvalidTokenEntry(entry.to_string()));
                }
                Ok((symbol.to_string(), parse_address("stable_tokens", address)?))
            })
            .collect()
    }

    /// Builds the injected wallet provider, or `None` without a signing key.
    pub fn wallet_provider(&self) -> Result<Option<Arc<dyn WalletProvider>>, ConfigError> {
        let Some(private_key) = self
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        else {
            return Ok(None);
        };

        let mut provider = RpcWalletProvider::try_new(&self.rpc_url, private_key, self.chain_id)?;
        for (symbol, address) in self.stable_tokens()? {
            provider = provider.with_stable_token(symbol, address);
        }
        let provider: Arc<dyn WalletProvider> = Arc::new(provider);
        Ok(Some(provider))
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        })
}
