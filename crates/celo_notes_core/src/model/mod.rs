//! Domain model for notes mirrored from the notes contract.
//!
//! # Invariants
//! - Notes are owned by the contract; local values are read-only copies.

pub mod note;
