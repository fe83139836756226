//! Presentation façade for view layers.
//!
//! # Responsibility
//! - Drive the mount sequence: connect, fetch balance, bind notes, load.
//! - Render session and note state into display-ready strings.
//! - Forward user intents and report outcomes as response envelopes.
//!
//! # Invariants
//! - No method panics or returns `Err`; failures become `ok == false`.
//! - A failed intent never blocks later intents.
//! - Mutation intents are refused until the note store is bound.

use crate::format::{format_balance, format_last_modified, truncate_address};
use crate::model::note::{Note, NoteId};
use crate::service::note_store::NoteStore;
use crate::service::session_manager::{SessionError, SessionManager, SessionState};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use log::warn;

const BALANCE_SYMBOL: &str = "CELO";

/// Outcome envelope for one user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable outcome for status lines.
    pub message: String,
    /// Hash of the submitted transaction, for mutation intents.
    pub tx_hash: Option<String>,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            tx_hash: None,
        }
    }

    fn submitted(message: impl Into<String>, tx_hash: String) -> Self {
        Self {
            ok: true,
            message: message.into(),
            tx_hash: Some(tx_hash),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            tx_hash: None,
        }
    }
}

/// Display row for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    /// Decimal note id, accepted back by `complete_note`/`delete_note`.
    pub id: String,
    pub title: String,
    pub body: String,
    pub completed: bool,
    /// `Completed` or `Active`.
    pub status: &'static str,
    /// `HH:MM:SS` (UTC) of the last on-chain change.
    pub last_modified: String,
}

impl From<&Note> for NoteRow {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            title: note.title.clone(),
            body: note.body.clone(),
            completed: note.completed,
            status: if note.completed { "Completed" } else { "Active" },
            last_modified: format_last_modified(note.last_modified),
        }
    }
}

/// Everything a view needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub state: SessionState,
    /// Checksummed active address.
    pub address: Option<String>,
    /// Address shortened for headers, e.g. `0x8216...9685`.
    pub short_address: Option<String>,
    /// Balance with two decimals and symbol, e.g. `2.50 CELO`.
    pub balance: Option<String>,
    pub notes: Vec<NoteRow>,
    /// Message that needs the user's attention, such as a missing wallet.
    pub notice: Option<String>,
}

/// Application façade combining the session and the note store.
pub struct NotesDapp {
    session: SessionManager,
    store: Option<NoteStore>,
    notice: Option<String>,
}

impl NotesDapp {
    pub fn new(session: SessionManager) -> Self {
        Self {
            session,
            store: None,
            notice: None,
        }
    }

    /// Runs the startup sequence.
    ///
    /// Connects the wallet, fetches the balance (which binds the notes
    /// contract), binds the note store and performs the initial load. A
    /// balance failure does not stop the notes from loading.
    pub async fn mount(&mut self) -> ActionResponse {
        match self.session.connect().await {
            Ok(_) => self.notice = None,
            Err(SessionError::MissingProvider) => {
                self.notice = Some(SessionError::MissingProvider.to_string());
                return ActionResponse::failure(SessionError::MissingProvider.to_string());
            }
            Err(err) => return ActionResponse::failure(format!("wallet not connected: {err}")),
        }

        let balance_error = self.session.fetch_balance().await.err();

        if self.store.is_none() {
            match NoteStore::bind(&self.session) {
                Ok(store) => self.store = Some(store),
                Err(err) => return ActionResponse::failure(err.to_string()),
            }
        }

        let reload = self.reload_notes().await;
        match (balance_error, reload) {
            (_, Err(message)) => ActionResponse::failure(message),
            (Some(err), Ok(count)) => ActionResponse::success(format!(
                "loaded {count} notes; balance unavailable: {err}"
            )),
            (None, Ok(count)) => ActionResponse::success(format!("loaded {count} notes")),
        }
    }

    /// Re-reads balance and notes.
    pub async fn refresh(&mut self) -> ActionResponse {
        if !self.session.is_connected() {
            return ActionResponse::failure(SessionError::NotConnected.to_string());
        }
        if let Err(err) = self.session.fetch_balance().await {
            warn!("event=view_refresh module=view status=error error={err}");
        }
        match self.reload_notes().await {
            Ok(count) => ActionResponse::success(format!("loaded {count} notes")),
            Err(message) => ActionResponse::failure(message),
        }
    }

    /// Adds a note with `title` and `body` as typed.
    pub async fn add_note(&mut self, title: &str, body: &str) -> ActionResponse {
        let Some(store) = self.store.as_mut() else {
            return not_ready();
        };
        match store.add(title, body).await {
            Ok(tx) => ActionResponse::submitted("note added", format!("{tx:#x}")),
            Err(err) => ActionResponse::failure(err.to_string()),
        }
    }

    /// Marks the note with decimal id `note_id` as completed.
    pub async fn complete_note(&mut self, note_id: &str) -> ActionResponse {
        let id = match parse_note_id(note_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        let Some(store) = self.store.as_mut() else {
            return not_ready();
        };
        match store.set_completed(id).await {
            Ok(tx) => ActionResponse::submitted("note completed", format!("{tx:#x}")),
            Err(err) => ActionResponse::failure(err.to_string()),
        }
    }

    /// Deletes the note with decimal id `note_id`.
    pub async fn delete_note(&mut self, note_id: &str) -> ActionResponse {
        let id = match parse_note_id(note_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        let Some(store) = self.store.as_mut() else {
            return not_ready();
        };
        match store.delete(id).await {
            Ok(tx) => ActionResponse::submitted("note deleted", format!("{tx:#x}")),
            Err(err) => ActionResponse::failure(err.to_string()),
        }
    }

    /// Drops the session and the cached notes.
    pub fn disconnect(&mut self) -> ActionResponse {
        self.session.disconnect();
        self.store = None;
        ActionResponse::success("disconnected")
    }

    /// Renders the current state.
    pub fn snapshot(&self) -> ViewSnapshot {
        let address = self.session.address().map(display_address);
        ViewSnapshot {
            state: self.session.state(),
            short_address: address.as_deref().map(truncate_address),
            address,
            balance: self.session.balance().map(display_balance),
            notes: self
                .store
                .as_ref()
                .map(|store| store.notes().iter().map(NoteRow::from).collect())
                .unwrap_or_default(),
            notice: self.notice.clone(),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn store(&self) -> Option<&NoteStore> {
        self.store.as_ref()
    }

    async fn reload_notes(&mut self) -> Result<usize, String> {
        let Some(store) = self.store.as_mut() else {
            return Err(not_ready().message);
        };
        store
            .reload()
            .await
            .map(|notes| notes.len())
            .map_err(|err| err.to_string())
    }
}

fn display_address(address: Address) -> String {
    to_checksum(&address, None)
}

fn display_balance(amount: U256) -> String {
    format!("{} {BALANCE_SYMBOL}", format_balance(amount))
}

fn not_ready() -> ActionResponse {
    ActionResponse::failure("notes are not loaded yet; connect a wallet first")
}

fn parse_note_id(value: &str) -> Result<NoteId, ActionResponse> {
    U256::from_dec_str(value.trim())
        .map_err(|_| ActionResponse::failure(format!("invalid note id `{value}`")))
}
