//! Core functionality for phrasebook
//!
//! This module contains the collaborators shared by the request pipeline and
//! the QR login:
//! - Application configuration and endpoint selection
//! - Session credential storage
//! - Analytics events

pub mod config;
pub mod credentials;
pub mod telemetry;

pub use config::{ClientIdentity, Config, Endpoints, Mode};
pub use credentials::{CredentialStore, KeyringCredentialStore, TokenInfo, TokenLookup};
pub use telemetry::{Telemetry, TelemetryEvent, TracingTelemetry};
