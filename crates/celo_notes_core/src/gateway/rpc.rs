//! JSON-RPC gateway backed by `ethers`.
//!
//! # Responsibility
//! - Stand in for the browser wallet: a local signing key plus an RPC node.
//! - Call the notes contract through its bundled ABI.
//!
//! # Invariants
//! - The signing key never leaves this module and is never logged.
//! - `enable()` grants access only when the node serves the configured chain.
//! - Writes resolve after a successful receipt; reverted or dropped
//!   transactions are reported as `GatewayError::Reverted`.

use crate::gateway::{
    ChainClient, GatewayError, GatewayResult, NotesContract, TotalBalance, WalletProvider,
};
use crate::model::note::{NoteId, RawNote};
use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::contract::{Contract, ContractCall, ContractError};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, TxHash, U256, U64};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Arc;

static NOTES_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../abi/todo.abi.json")).expect("valid notes abi")
});
static ERC20_BALANCE_ABI: Lazy<Abi> = Lazy::new(|| {
    ethers::abi::parse_abi(&["function balanceOf(address) external view returns (uint256)"])
        .expect("valid erc20 abi")
});

/// Wallet provider that signs locally and talks to one RPC node.
pub struct RpcWalletProvider {
    provider: Provider<Http>,
    wallet: LocalWallet,
    chain_id: u64,
    stable_tokens: BTreeMap<String, Address>,
}

impl RpcWalletProvider {
    /// Builds a provider from an RPC URL and a hex private key.
    ///
    /// # Errors
    /// - `Transport` when `rpc_url` is not a valid URL.
    /// - `Rejected` when `private_key` is not a valid secp256k1 key.
    pub fn try_new(rpc_url: &str, private_key: &str, chain_id: u64) -> GatewayResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|err| GatewayError::Transport(format!("invalid rpc url `{rpc_url}`: {err}")))?;
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|_| GatewayError::Rejected("signing key is not valid".to_string()))?
            .with_chain_id(chain_id);

        Ok(Self {
            provider,
            wallet,
            chain_id,
            stable_tokens: BTreeMap::new(),
        })
    }

    /// Registers an ERC-20 stable token reported in `TotalBalance::stable`.
    pub fn with_stable_token(mut self, symbol: impl Into<String>, address: Address) -> Self {
        self.stable_tokens.insert(symbol.into(), address);
        self
    }

    /// Address of the local signing account.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn enable(&self) -> GatewayResult<()> {
        let remote_chain = self
            .provider
            .get_chainid()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        if remote_chain != U256::from(self.chain_id) {
            return Err(GatewayError::Rejected(format!(
                "wallet is configured for chain {} but node serves chain {remote_chain}",
                self.chain_id
            )));
        }
        info!(
            "event=wallet_enable module=gateway status=ok chain_id={}",
            self.chain_id
        );
        Ok(())
    }

    fn client(&self) -> GatewayResult<Arc<dyn ChainClient>> {
        let client = SignerMiddleware::new(self.provider.clone(), self.wallet.clone());
        let client: Arc<dyn ChainClient> = Arc::new(RpcChainClient {
            client: Arc::new(client),
            stable_tokens: self.stable_tokens.clone(),
        });
        Ok(client)
    }
}

struct RpcChainClient<M> {
    client: Arc<M>,
    stable_tokens: BTreeMap<String, Address>,
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for RpcChainClient<M> {
    async fn accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.client.default_sender().into_iter().collect())
    }

    async fn total_balance(&self, address: Address) -> GatewayResult<TotalBalance> {
        let celo = self
            .client
            .get_balance(address, None)
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let mut stable = BTreeMap::new();
        for (symbol, token) in &self.stable_tokens {
            let erc20: Contract<M> =
                Contract::new(*token, ERC20_BALANCE_ABI.clone(), self.client.clone());
            let amount: U256 = erc20
                .method::<_, U256>("balanceOf", address)
                .map_err(|err| GatewayError::Contract(err.to_string()))?
                .call()
                .await
                .map_err(contract_error)?;
            stable.insert(symbol.clone(), amount);
        }

        Ok(TotalBalance { celo, stable })
    }

    fn notes_contract(&self, address: Address) -> GatewayResult<Arc<dyn NotesContract>> {
        let contract: Arc<dyn NotesContract> = Arc::new(RpcNotesContract {
            contract: Contract::new(address, NOTES_ABI.clone(), self.client.clone()),
        });
        Ok(contract)
    }
}

struct RpcNotesContract<M> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> RpcNotesContract<M> {
    fn call<A: ethers::abi::Tokenize>(
        &self,
        method: &str,
        args: A,
        from: Address,
    ) -> GatewayResult<ContractCall<M, ()>> {
        self.contract
            .method::<_, ()>(method, args)
            .map(|call| call.from(from))
            .map_err(|err| GatewayError::Contract(format!("{method}: {err}")))
    }

    async fn submit(
        &self,
        method: &str,
        call: ContractCall<M, ()>,
    ) -> GatewayResult<TxHash> {
        let pending = call.send().await.map_err(contract_error)?;
        let tx_hash = pending.tx_hash();
        debug!("event=tx_submitted module=gateway method={method} tx={tx_hash:#x}");

        let receipt = pending
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        confirmed(tx_hash, receipt)
    }
}

#[async_trait]
impl<M: Middleware + 'static> NotesContract for RpcNotesContract<M> {
    async fn get_notes(&self) -> GatewayResult<Vec<RawNote>> {
        let records: Token = self
            .contract
            .method::<_, Token>("getNotes", ())
            .map_err(|err| GatewayError::Contract(format!("getNotes: {err}")))?
            .call()
            .await
            .map_err(contract_error)?;

        note_records(records)
    }

    async fn add_note(
        &self,
        from: Address,
        title: &str,
        note: &str,
        tag: &str,
    ) -> GatewayResult<TxHash> {
        let call = self.call(
            "addNote",
            (title.to_string(), note.to_string(), tag.to_string()),
            from,
        )?;
        self.submit("addNote", call).await
    }

    async fn set_completed(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash> {
        let call = self.call("setCompleted", note_id, from)?;
        self.submit("setCompleted", call).await
    }

    async fn delete_note(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash> {
        let call = self.call("deleteNote", note_id, from)?;
        self.submit("deleteNote", call).await
    }
}

fn note_records(records: Token) -> GatewayResult<Vec<RawNote>> {
    match records {
        Token::Array(items) | Token::FixedArray(items) => Ok(items),
        other => Err(GatewayError::InvalidResponse(format!(
            "getNotes returned `{other}` instead of an array"
        ))),
    }
}

/// Maps a mined receipt to the write outcome; a dropped tx has no receipt.
fn confirmed(tx_hash: TxHash, receipt: Option<TransactionReceipt>) -> GatewayResult<TxHash> {
    match receipt {
        Some(receipt) if receipt.status == Some(U64::from(1)) => Ok(tx_hash),
        _ => Err(GatewayError::Reverted(tx_hash)),
    }
}

fn contract_error<M: Middleware>(err: ContractError<M>) -> GatewayError {
    GatewayError::Contract(err.to_string())
}
