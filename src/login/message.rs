//! Inbound QR login frames
//!
//! Frames are decoded byte-for-byte into characters (Latin-1 style, each
//! byte becomes the char with the same code point), not as UTF-8. The prefix
//! checks below and the image re-encoding both depend on that decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::credentials::TokenInfo;

/// Frames starting with this carry the issued credential
pub const TOKEN_PREFIX: &str = "{\"token\":";

/// Frames starting with this are server notices and are ignored
pub const ERROR_PREFIX: &str = "{err";

/// Decode each byte as one character code
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// QR code image as delivered by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    bytes: Vec<u8>,
}

impl QrImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw JPEG bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:` URL suitable for an `<img>` source
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum LoginFrame {
    /// Credential issued after the code was scanned
    Token(TokenInfo),
    /// Server notice, carries the decoded text
    Error(String),
    /// Anything else is the QR image
    Image(QrImage),
}

impl LoginFrame {
    /// Classify a frame by its decoded prefix
    ///
    /// A token-prefixed frame that does not parse into a credential is
    /// downgraded to [`LoginFrame::Error`].
    pub fn classify(bytes: &[u8]) -> Self {
        let text = latin1_decode(bytes);

        if text.starts_with(TOKEN_PREFIX) {
            return match serde_json::from_str::<TokenInfo>(&text) {
                Ok(info) => LoginFrame::Token(info),
                Err(e) => {
                    tracing::warn!("Ignoring malformed token frame: {}", e);
                    LoginFrame::Error(text)
                }
            };
        }

        if text.starts_with(ERROR_PREFIX) {
            return LoginFrame::Error(text);
        }

        LoginFrame::Image(QrImage::new(bytes.to_vec()))
    }
}
