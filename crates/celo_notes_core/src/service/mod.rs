//! Core use-case services.
//!
//! # Responsibility
//! - Own the wallet session and the note mirror built on top of it.
//! - Keep the presentation layer decoupled from gateway details.

pub mod note_store;
pub mod session_manager;
