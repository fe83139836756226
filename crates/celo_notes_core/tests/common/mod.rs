//! In-memory gateway shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use celo_notes_core::{
    ChainClient, GatewayError, GatewayResult, Note, NoteId, NotesContract, RawNote, TotalBalance,
    Visibility, WalletProvider,
};
use ethers::abi::Token;
use ethers::types::{Address, TxHash, U256};
use std::sync::{Arc, Mutex};

pub const CONTRACT: Address = Address::repeat_byte(0xC0);
pub const START_EPOCH_SECONDS: u64 = 1_700_000_000;

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn celo(whole: u64, hundredths: u64) -> U256 {
    U256::from(whole) * U256::exp10(18) + U256::from(hundredths) * U256::exp10(16)
}

#[derive(Debug, Clone)]
struct StoredNote {
    id: U256,
    title: String,
    note: String,
    completed: bool,
    last_modified: u64,
    tag: String,
}

impl StoredNote {
    fn to_token(&self) -> Token {
        Note {
            id: self.id,
            title: self.title.clone(),
            body: self.note.clone(),
            completed: self.completed,
            last_modified: self.last_modified,
            visibility: Visibility::from(self.tag.clone()),
        }
        .to_raw()
    }
}

#[derive(Default)]
struct ChainState {
    notes: Vec<StoredNote>,
    next_id: u64,
    clock: u64,
    tx_count: u64,
    extra_raw: Vec<Token>,
    fail_next_write: Option<GatewayError>,
    fail_reads: Option<GatewayError>,
    senders: Vec<Address>,
    reads: usize,
}

/// Notes contract held in memory; ids start at 1, order is insertion order.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores a note directly, as another client would.
    pub fn insert(&self, title: &str, note: &str) -> U256 {
        let mut state = self.state.lock().unwrap();
        push_note(&mut state, title, note, "public")
    }

    /// Appends a raw record to every `getNotes()` answer.
    pub fn inject_raw(&self, token: Token) {
        self.state.lock().unwrap().extra_raw.push(token);
    }

    pub fn fail_next_write(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_next_write = Some(err);
    }

    pub fn fail_reads(&self, err: Option<GatewayError>) {
        self.state.lock().unwrap().fail_reads = err;
    }

    pub fn senders(&self) -> Vec<Address> {
        self.state.lock().unwrap().senders.clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn note_count(&self) -> usize {
        self.state.lock().unwrap().notes.len()
    }

    fn write<F>(&self, from: Address, apply: F) -> GatewayResult<TxHash>
    where
        F: FnOnce(&mut ChainState) -> GatewayResult<()>,
    {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_write.take() {
            return Err(err);
        }
        apply(&mut state)?;
        state.senders.push(from);
        state.tx_count += 1;
        Ok(TxHash::from_low_u64_be(state.tx_count))
    }
}

fn push_note(state: &mut ChainState, title: &str, note: &str, tag: &str) -> U256 {
    state.next_id += 1;
    state.clock += 1;
    let id = U256::from(state.next_id);
    state.notes.push(StoredNote {
        id,
        title: title.to_string(),
        note: note.to_string(),
        completed: false,
        last_modified: START_EPOCH_SECONDS + state.clock,
        tag: tag.to_string(),
    });
    id
}

fn missing(note_id: NoteId) -> GatewayError {
    GatewayError::Contract(format!("execution reverted: note {note_id} not found"))
}

#[async_trait]
impl NotesContract for FakeChain {
    async fn get_notes(&self) -> GatewayResult<Vec<RawNote>> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if let Some(err) = state.fail_reads.clone() {
            return Err(err);
        }
        let mut records: Vec<Token> = state.notes.iter().map(StoredNote::to_token).collect();
        records.extend(state.extra_raw.iter().cloned());
        Ok(records)
    }

    async fn add_note(
        &self,
        from: Address,
        title: &str,
        note: &str,
        tag: &str,
    ) -> GatewayResult<TxHash> {
        self.write(from, |state| {
            push_note(state, title, note, tag);
            Ok(())
        })
    }

    async fn set_completed(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash> {
        self.write(from, |state| {
            state.clock += 1;
            let now = START_EPOCH_SECONDS + state.clock;
            let stored = state
                .notes
                .iter_mut()
                .find(|stored| stored.id == note_id)
                .ok_or_else(|| missing(note_id))?;
            stored.completed = true;
            stored.last_modified = now;
            Ok(())
        })
    }

    async fn delete_note(&self, from: Address, note_id: NoteId) -> GatewayResult<TxHash> {
        self.write(from, |state| {
            let position = state
                .notes
                .iter()
                .position(|stored| stored.id == note_id)
                .ok_or_else(|| missing(note_id))?;
            state.notes.remove(position);
            Ok(())
        })
    }
}

/// Chain client handed out by `FakeWallet`.
pub struct FakeClient {
    accounts: Vec<Address>,
    balance: Option<TotalBalance>,
    chain: Arc<FakeChain>,
}

#[async_trait]
impl ChainClient for FakeClient {
    async fn accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn total_balance(&self, _address: Address) -> GatewayResult<TotalBalance> {
        self.balance
            .clone()
            .ok_or_else(|| GatewayError::Transport("balance endpoint unavailable".to_string()))
    }

    fn notes_contract(&self, address: Address) -> GatewayResult<Arc<dyn NotesContract>> {
        if address != CONTRACT {
            return Err(GatewayError::Contract(format!(
                "no contract at {address:?}"
            )));
        }
        let contract: Arc<dyn NotesContract> = self.chain.clone();
        Ok(contract)
    }
}

/// Wallet that grants or denies access on demand.
pub struct FakeWallet {
    pub grant: bool,
    pub accounts: Vec<Address>,
    pub balance: Option<TotalBalance>,
    pub chain: Arc<FakeChain>,
}

impl FakeWallet {
    pub fn granting(chain: Arc<FakeChain>, accounts: Vec<Address>) -> Self {
        Self {
            grant: true,
            accounts,
            balance: Some(TotalBalance {
                celo: celo(2, 50),
                ..TotalBalance::default()
            }),
            chain,
        }
    }

    pub fn into_provider(self) -> Option<Arc<dyn WalletProvider>> {
        let provider: Arc<dyn WalletProvider> = Arc::new(self);
        Some(provider)
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn enable(&self) -> GatewayResult<()> {
        if self.grant {
            Ok(())
        } else {
            Err(GatewayError::Rejected("user denied account access".to_string()))
        }
    }

    fn client(&self) -> GatewayResult<Arc<dyn ChainClient>> {
        Ok(Arc::new(FakeClient {
            accounts: self.accounts.clone(),
            balance: self.balance.clone(),
            chain: self.chain.clone(),
        }))
    }
}
