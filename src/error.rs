//! Custom error types for phrasebook
//!
//! User-friendly error messages for failures outside the request pipeline.
//! Pipeline failures are values (`RequestResult`), not errors.

use thiserror::Error;

/// Main error type for the phrasebook client
#[derive(Error, Debug)]
pub enum PhraseError {
    /// No stored session
    #[error("You are not logged in.\n\n  → Run 'phrasebook login' and scan the QR code.")]
    NotAuthenticated,

    /// The QR handshake ended without a credential
    #[error("QR login did not complete (final state: {0}).\n\n  → Run 'phrasebook login' again and scan the code before it expires.")]
    LoginFailed(String),

    /// A handshake is already running on this state machine
    #[error("A QR login is already in progress (state: {0}).")]
    LoginInProgress(String),

    /// A service request settled as a failure
    #[error("Request failed ({0}).")]
    RequestFailed(String),

    /// Credential storage error
    #[error("Cannot access secure storage: {0}\n\n  → On macOS: Make sure Keychain Access is available.\n  → On Linux: Ensure a secret service (like gnome-keyring) is running.")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// Login socket error
    #[error("Login socket failed: {0}\n\n  → Check your internet connection.")]
    Socket(String),

    /// JSON serialization/deserialization error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

impl From<keyring::Error> for PhraseError {
    fn from(err: keyring::Error) -> Self {
        PhraseError::Credential(err.to_string())
    }
}

impl From<toml::de::Error> for PhraseError {
    fn from(err: toml::de::Error) -> Self {
        PhraseError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for PhraseError {
    fn from(err: toml::ser::Error) -> Self {
        PhraseError::Toml(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for PhraseError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        PhraseError::Socket(err.to_string())
    }
}

/// Result type alias using PhraseError
pub type Result<T> = std::result::Result<T, PhraseError>;
