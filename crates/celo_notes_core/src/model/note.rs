//! Note domain model.
//!
//! # Responsibility
//! - Define the local, read-only copy of an on-chain note.
//! - Decode raw ABI records returned by `getNotes()` into `Note`.
//!
//! # Invariants
//! - A raw record is a 6-field tuple:
//!   `(noteId uint256, title string, note string, completed bool,
//!   lastModified uint256, tag string)`.
//! - Decoding never guesses: any missing or mistyped field is an error.
//! - Field values are not range-checked beyond what `Note` can hold;
//!   any tag string is kept, and `last_modified` must fit in `u64`.

use ethers::abi::Token;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// On-chain note identifier (`uint256`).
pub type NoteId = U256;

/// Raw ABI value for one note record as returned by the contract.
pub type RawNote = Token;

const RAW_NOTE_FIELDS: usize = 6;

/// Visibility tag stored with each note.
///
/// This client only writes `public`; tags written by other clients are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Other(String),
}

impl Visibility {
    /// Tag string sent to and read from the contract.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for Visibility {
    fn from(value: String) -> Self {
        match value.as_str() {
            "public" => Self::Public,
            _ => Self::Other(value),
        }
    }
}

impl From<Visibility> for String {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Public => "public".to_string(),
            Visibility::Other(tag) => tag,
        }
    }
}

/// Local copy of one note owned by the notes contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    pub completed: bool,
    /// Unix epoch seconds of the last on-chain change.
    pub last_modified: u64,
    pub visibility: Visibility,
}

/// Raw record decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteDecodeError {
    /// Record is not a tuple, or has the wrong number of fields.
    Shape(String),
    /// Field at the named position has the wrong ABI type.
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    TimestampOutOfRange(U256),
}

impl Display for NoteDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shape(details) => write!(f, "malformed note record: {details}"),
            Self::FieldType { field, expected } => {
                write!(f, "note field `{field}` must be {expected}")
            }
            Self::TimestampOutOfRange(value) => {
                write!(f, "note lastModified {value} does not fit epoch seconds")
            }
        }
    }
}

impl Error for NoteDecodeError {}

impl Note {
    /// Decodes one raw contract record.
    ///
    /// # Errors
    /// - `Shape` when the token is not a 6-field tuple.
    /// - `FieldType` when a field carries the wrong ABI type.
    /// - `TimestampOutOfRange` when `lastModified` exceeds `u64`.
    pub fn from_raw(raw: &RawNote) -> Result<Self, NoteDecodeError> {
        let fields = match raw {
            Token::Tuple(fields) => fields,
            other => {
                return Err(NoteDecodeError::Shape(format!(
                    "expected tuple, got `{other}`"
                )))
            }
        };
        if fields.len() != RAW_NOTE_FIELDS {
            return Err(NoteDecodeError::Shape(format!(
                "expected {RAW_NOTE_FIELDS} fields, got {}",
                fields.len()
            )));
        }

        let id = uint_field(&fields[0], "noteId")?;
        let title = string_field(&fields[1], "title")?;
        let body = string_field(&fields[2], "note")?;
        let completed = match &fields[3] {
            Token::Bool(value) => *value,
            _ => {
                return Err(NoteDecodeError::FieldType {
                    field: "completed",
                    expected: "bool",
                })
            }
        };
        let last_modified_raw = uint_field(&fields[4], "lastModified")?;
        if last_modified_raw > U256::from(u64::MAX) {
            return Err(NoteDecodeError::TimestampOutOfRange(last_modified_raw));
        }
        let visibility = Visibility::from(string_field(&fields[5], "tag")?);

        Ok(Self {
            id,
            title,
            body,
            completed,
            last_modified: last_modified_raw.as_u64(),
            visibility,
        })
    }

    /// Encodes this note back into the contract's record shape.
    pub fn to_raw(&self) -> RawNote {
        Token::Tuple(vec![
            Token::Uint(self.id),
            Token::String(self.title.clone()),
            Token::String(self.body.clone()),
            Token::Bool(self.completed),
            Token::Uint(U256::from(self.last_modified)),
            Token::String(self.visibility.as_tag().to_string()),
        ])
    }
}

fn uint_field(token: &Token, field: &'static str) -> Result<U256, NoteDecodeError> {
    match token {
        Token::Uint(value) => Ok(*value),
        _ => Err(NoteDecodeError::FieldType {
            field,
            expected: "uint256",
        }),
    }
}

fn string_field(token: &Token, field: &'static str) -> Result<String, NoteDecodeError> {
    match token {
        Token::String(value) => Ok(value.clone()),
        _ => Err(NoteDecodeError::FieldType {
            field,
            expected: "string",
        }),
    }
}
