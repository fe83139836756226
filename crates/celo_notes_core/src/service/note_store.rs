//! Local mirror of the on-chain note list.
//!
//! # Responsibility
//! - Load and decode the full note list from the notes contract.
//! - Submit note mutations and re-sync by full reload afterwards.
//!
//! # Invariants
//! - The contract is the single source of truth; no optimistic updates.
//! - A reload replaces the whole list or leaves it untouched, never partially.
//! - Mutations reload only after their transaction succeeded.
//! - Title and body are submitted as given; visibility is always `public`.

use crate::gateway::{GatewayError, NotesContract};
use crate::logging::sanitize_message;
use crate::model::note::{Note, NoteDecodeError, NoteId, Visibility};
use crate::service::session_manager::SessionManager;
use ethers::types::{Address, TxHash};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const MAX_LOGGED_TITLE_CHARS: usize = 32;

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Note store error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStoreError {
    /// Session has no address or contract handle yet.
    NotBound,
    Gateway(GatewayError),
    /// Record at `index` of the `getNotes()` result could not be decoded.
    Decode {
        index: usize,
        source: NoteDecodeError,
    },
    /// Transaction `tx` succeeded but the follow-up reload failed.
    StaleAfterWrite {
        tx: TxHash,
        source: Box<NoteStoreError>,
    },
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotBound => f.write_str("notes contract is not bound to a connected session"),
            Self::Gateway(err) => write!(f, "{err}"),
            Self::Decode { index, source } => write!(f, "note #{index}: {source}"),
            Self::StaleAfterWrite { tx, source } => write!(
                f,
                "transaction {tx:#x} succeeded but notes could not be reloaded: {source}"
            ),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotBound => None,
            Self::Gateway(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::StaleAfterWrite { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<GatewayError> for NoteStoreError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

/// Read-only cache of the notes contract plus its mutation entry points.
pub struct NoteStore {
    contract: Arc<dyn NotesContract>,
    sender: Address,
    notes: Vec<Note>,
}

impl NoteStore {
    /// Binds a store to a connected session with a bound contract.
    ///
    /// The list starts empty; call `reload()` for the initial load.
    ///
    /// # Errors
    /// - `NotBound` when the session is disconnected or its contract handle is
    ///   not bound yet (see `SessionManager::fetch_balance`).
    pub fn bind(session: &SessionManager) -> NoteStoreResult<Self> {
        let sender = session.address().ok_or(NoteStoreError::NotBound)?;
        let contract = session.contract().ok_or(NoteStoreError::NotBound)?;
        Ok(Self::new(contract, sender))
    }

    /// Creates a store over an explicit contract handle and sending account.
    pub fn new(contract: Arc<dyn NotesContract>, sender: Address) -> Self {
        Self {
            contract,
            sender,
            notes: Vec::new(),
        }
    }

    /// Replaces the local list with the contract's current list.
    ///
    /// On failure the previous list is kept.
    pub async fn reload(&mut self) -> NoteStoreResult<&[Note]> {
        match self.fetch().await {
            Ok(notes) => {
                debug!(
                    "event=notes_reload module=note_store status=ok count={}",
                    notes.len()
                );
                self.notes = notes;
                Ok(&self.notes)
            }
            Err(err) => {
                error!("event=notes_reload module=note_store status=error error={err}");
                Err(err)
            }
        }
    }

    /// Adds a public note, then reloads.
    pub async fn add(&mut self, title: &str, body: &str) -> NoteStoreResult<TxHash> {
        let result = self
            .contract
            .add_note(self.sender, title, body, Visibility::Public.as_tag())
            .await;
        let title = sanitize_message(title, MAX_LOGGED_TITLE_CHARS);
        self.after_write("note_add", &format!("title={title}"), result)
            .await
    }

    /// Marks a note as completed, then reloads.
    pub async fn set_completed(&mut self, note_id: NoteId) -> NoteStoreResult<TxHash> {
        let result = self.contract.set_completed(self.sender, note_id).await;
        self.after_write("note_complete", &format!("note_id={note_id}"), result)
            .await
    }

    /// Deletes a note, then reloads.
    pub async fn delete(&mut self, note_id: NoteId) -> NoteStoreResult<TxHash> {
        let result = self.contract.delete_note(self.sender, note_id).await;
        self.after_write("note_delete", &format!("note_id={note_id}"), result)
            .await
    }

    /// Notes as of the last successful reload, in contract order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Looks up one cached note by id.
    pub fn get(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    /// Account that signs mutations.
    pub fn sender(&self) -> Address {
        self.sender
    }

    async fn fetch(&self) -> NoteStoreResult<Vec<Note>> {
        let raw = self.contract.get_notes().await?;
        raw.iter()
            .enumerate()
            .map(|(index, record)| {
                Note::from_raw(record).map_err(|source| NoteStoreError::Decode { index, source })
            })
            .collect()
    }

    async fn after_write(
        &mut self,
        event: &str,
        details: &str,
        submitted: Result<TxHash, GatewayError>,
    ) -> NoteStoreResult<TxHash> {
        let tx = match submitted {
            Ok(tx) => tx,
            Err(err) => {
                error!("event={event} module=note_store status=error {details} error={err}");
                return Err(err.into());
            }
        };
        info!("event={event} module=note_store status=ok {details} tx={tx:#x}");

        self.reload()
            .await
            .map(|_| tx)
            .map_err(|source| NoteStoreError::StaleAfterWrite {
                tx,
                source: Box::new(source),
            })
    }
}
