//! phrasebook - client for the phrasebook service
//!
//! This library provides the authenticated request pipeline used for every
//! service call, the QR code login handshake, and the CLI built on top of
//! both.

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod login;

pub use error::{PhraseError, Result};
