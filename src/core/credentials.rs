//! Session credential storage
//!
//! The request pipeline reads the session token through [`CredentialStore`]
//! and the QR login writes it back. [`KeyringCredentialStore`] keeps the
//! token in the system keyring (macOS Keychain, Linux Secret Service) with an
//! in-memory cache to minimize keychain prompts.
//!
//! ## Environment Variable Fallback
//!
//! For development and CI, `PHRASEBOOK_TOKEN` supplies the token directly.
//!
//! Priority: env var > cache > keyring

use std::sync::RwLock;

use async_trait::async_trait;
use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{PhraseError, Result};

const SERVICE_NAME: &str = "phrasebook";
const TOKEN_INFO_KEY: &str = "token_info";

/// Environment variable holding a ready-made session token
pub const TOKEN_ENV: &str = "PHRASEBOOK_TOKEN";

/// Marker returned when no session has ever been stored
pub const NEED_LOGIN: &str = "needLogin";
/// Marker returned when the stored session is no longer usable
pub const NEED_RELOGIN: &str = "needRelogin";

/// Credential payload delivered by the QR login socket and persisted as JSON
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Opaque session token, sent verbatim as `Authorization`
    pub token: String,
    /// Identity marker of the logged-in user
    #[serde(default)]
    pub openid: String,
}

impl std::fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenInfo")
            .field("token", &"<redacted>")
            .field("openid", &self.openid)
            .finish()
    }
}

/// Outcome of reading the session credential
#[derive(Debug, Clone)]
pub enum TokenLookup {
    /// A usable session token
    Token(SecretString),
    /// Nothing stored, the user never logged in
    NeedLogin,
    /// Something stored but unusable
    NeedRelogin,
}

impl TokenLookup {
    /// The wire marker for the "no session" outcomes
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            TokenLookup::Token(_) => None,
            TokenLookup::NeedLogin => Some(NEED_LOGIN),
            TokenLookup::NeedRelogin => Some(NEED_RELOGIN),
        }
    }
}

/// Source and sink of the session credential
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current session token
    async fn fetch_token(&self) -> TokenLookup;

    /// Persist a freshly issued credential; resolves once storage completed
    async fn persist_token(&self, info: &TokenInfo) -> Result<()>;
}

/// Credential store backed by the system keyring
pub struct KeyringCredentialStore {
    service: String,
    // Option<Option<T>>:
    //   - None = not yet fetched from keyring
    //   - Some(None) = fetched, but no credential exists
    //   - Some(Some(value)) = fetched and cached
    cache: RwLock<Option<Option<SecretString>>>,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keyring service name
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            cache: RwLock::new(None),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Ok(Entry::new(&self.service, TOKEN_INFO_KEY)?)
    }

    /// Read the raw stored JSON. Priority: cache > keyring
    fn stored_json(&self) -> Result<Option<SecretString>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached_value) = cache.as_ref() {
                return Ok(cached_value.clone());
            }
        }

        let result = match self.entry()?.get_password() {
            Ok(json) => Some(SecretString::from(json)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                return Err(PhraseError::Credential(format!(
                    "Cannot access system keychain. Make sure your keyring is unlocked. ({})",
                    e
                )))
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(result.clone());
        }

        Ok(result)
    }

    /// Write the credential synchronously. Updates both keyring and cache.
    pub fn store(&self, info: &TokenInfo) -> Result<()> {
        let json = serde_json::to_string(info)?;
        self.entry()?.set_password(&json)?;

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(Some(SecretString::from(json)));
        }

        Ok(())
    }

    /// Look up the token without going through the async trait
    pub fn lookup(&self) -> TokenLookup {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return TokenLookup::Token(SecretString::from(token));
            }
        }

        match self.stored_json() {
            Ok(Some(json)) => classify_stored(json.expose_secret()),
            Ok(None) => TokenLookup::NeedLogin,
            Err(e) => {
                tracing::warn!("Treating unreadable keyring as logged out: {}", e);
                TokenLookup::NeedLogin
            }
        }
    }

    /// Identity marker of the stored session, if any
    pub fn stored_identity(&self) -> Result<Option<String>> {
        let Some(json) = self.stored_json()? else {
            return Ok(None);
        };
        Ok(serde_json::from_str::<TokenInfo>(json.expose_secret())
            .ok()
            .map(|info| info.openid))
    }

    /// Delete the stored credential
    ///
    /// Clears both the keyring and the in-memory cache.
    pub fn clear(&self) -> Result<()> {
        let result = match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(PhraseError::Credential(e.to_string())),
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(None);
        }

        result
    }

    /// Get a masked version of a token for display (shows first 4 and last 4 chars)
    pub fn mask_token(token: &SecretString) -> String {
        let exposed = token.expose_secret();
        let chars: Vec<char> = exposed.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn fetch_token(&self) -> TokenLookup {
        self.lookup()
    }

    async fn persist_token(&self, info: &TokenInfo) -> Result<()> {
        self.store(info)
    }
}

/// Map stored JSON to a lookup outcome
fn classify_stored(json: &str) -> TokenLookup {
    match serde_json::from_str::<TokenInfo>(json) {
        Ok(info) if !info.token.is_empty() => TokenLookup::Token(SecretString::from(info.token)),
        Ok(_) => TokenLookup::NeedRelogin,
        Err(e) => {
            tracing::warn!("Stored session is not valid JSON: {}", e);
            TokenLookup::NeedRelogin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        let short = SecretString::from("abc");
        assert_eq!(KeyringCredentialStore::mask_token(&short), "***");

        let long = SecretString::from("tok_1234567890abcdef");
        assert_eq!(KeyringCredentialStore::mask_token(&long), "tok_...cdef");
    }

    #[test]
    fn test_classify_stored_token() {
        match classify_stored(r#"{"token":"abc","openid":"u1"}"#) {
            TokenLookup::Token(token) => assert_eq!(token.expose_secret(), "abc"),
            other => panic!("unexpected lookup: {:?}", other),
        }
    }

    #[test]
    fn test_classify_stored_empty_token_needs_relogin() {
        let lookup = classify_stored(r#"{"token":"","openid":"u1"}"#);
        assert_eq!(lookup.marker(), Some(NEED_RELOGIN));
    }

    #[test]
    fn test_classify_stored_garbage_needs_relogin() {
        assert_eq!(classify_stored("not json").marker(), Some(NEED_RELOGIN));
    }

    #[test]
    fn test_token_info_ignores_extra_fields() {
        let info: TokenInfo =
            serde_json::from_str(r#"{"token":"abc","openid":"u1","expire":3600}"#).unwrap();
        assert_eq!(
            info,
            TokenInfo {
                token: "abc".to_string(),
                openid: "u1".to_string()
            }
        );
    }

    #[test]
    fn test_token_info_debug_redacts_token() {
        let info = TokenInfo {
            token: "supersecret".to_string(),
            openid: "u1".to_string(),
        };
        let rendered = format!("{:?}", info);
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("u1"));
    }

    #[test]
    fn test_markers() {
        assert_eq!(TokenLookup::NeedLogin.marker(), Some("needLogin"));
        assert_eq!(TokenLookup::NeedRelogin.marker(), Some("needRelogin"));
        assert_eq!(
            TokenLookup::Token(SecretString::from("x")).marker(),
            None
        );
    }
}
