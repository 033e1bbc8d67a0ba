//! Application configuration management
//!
//! Handles loading and saving client settings including:
//! - Environment mode (production or local test server)
//! - Client identity sent with every request
//!
//! `Endpoints` is derived from the loaded config once at startup and shared
//! immutably with the request pipeline and the QR login session.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PhraseError, Result};

/// Environment variable that overrides the configured mode
pub const MODE_ENV: &str = "PHRASEBOOK_MODE";

const PRODUCTION_BASE: &str = "www.fishfit.fun:8080/p";
const TEST_BASE: &str = "localhost:8080/p";

/// Path of the QR login socket, relative to the endpoint base
const LOGIN_QR_PATH: &str = "/user/login_qr";

/// Deployment the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Hosted service over TLS (default)
    #[default]
    Production,
    /// Local development server without TLS
    Test,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Test => "test",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "test" | "jest" => Some(Mode::Test),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheme and host selection for HTTP and socket traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http_scheme: &'static str,
    ws_scheme: &'static str,
    base: String,
}

impl Endpoints {
    /// Endpoints for the given mode
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Production => Self::with_base(mode, PRODUCTION_BASE),
            Mode::Test => Self::with_base(mode, TEST_BASE),
        }
    }

    /// Mode's schemes with a custom `host:port/path` base
    pub fn with_base(mode: Mode, base: &str) -> Self {
        let (http_scheme, ws_scheme) = match mode {
            Mode::Production => ("https://", "wss://"),
            Mode::Test => ("http://", "ws://"),
        };
        Self {
            http_scheme,
            ws_scheme,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Fully qualified HTTP URL for a path suffix such as `/phrase`
    pub fn http_url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.http_scheme, self.base, suffix)
    }

    /// Fully qualified socket URL for a path suffix
    pub fn ws_url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.ws_scheme, self.base, suffix)
    }

    /// Socket URL of the QR login handshake
    pub fn login_qr_url(&self) -> String {
        self.ws_url(LOGIN_QR_PATH)
    }
}

/// Identity headers attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Sent as header `c`
    pub client: String,
    /// Sent as header `cv`
    pub version: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Which deployment to talk to
    #[serde(default)]
    pub mode: Mode,

    /// Client identifier sent as the `c` header
    #[serde(default = "default_client")]
    pub client: String,

    /// Client version sent as the `cv` header
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Replaces the mode's `host:port/path` base, schemes are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_override: Option<String>,
}

fn default_client() -> String {
    "phrasebook-cli".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            client: default_client(),
            client_version: default_client_version(),
            base_override: None,
        }
    }
}

impl Config {
    /// Load configuration from the default file, or defaults if it does not exist
    ///
    /// `PHRASEBOOK_MODE` overrides the stored mode.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    ///
    /// `PHRASEBOOK_CONFIG` points at an explicit file.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("PHRASEBOOK_CONFIG") {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let project_dirs = ProjectDirs::from("fun", "fishfit", "phrasebook")
            .ok_or_else(|| PhraseError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(MODE_ENV) {
            match Mode::from_str(&value) {
                Some(mode) => self.mode = mode,
                None => tracing::warn!("Ignoring unknown {}={}", MODE_ENV, value),
            }
        }
    }

    /// Endpoints selected by this configuration
    pub fn endpoints(&self) -> Endpoints {
        match &self.base_override {
            Some(base) => Endpoints::with_base(self.mode, base),
            None => Endpoints::for_mode(self.mode),
        }
    }

    /// Check a `host[:port][/path]` base and return it in canonical form
    pub fn parse_base(base: &str) -> Result<String> {
        let trimmed = base.trim().trim_end_matches('/');
        if trimmed.contains("://") {
            return Err(PhraseError::InvalidInput(format!(
                "Base '{}' must not include a scheme, the mode selects it",
                base
            )));
        }

        let parsed = Url::parse(&format!("http://{}", trimmed))
            .map_err(|e| PhraseError::InvalidInput(format!("Invalid base '{}': {}", base, e)))?;
        if parsed.host_str().map_or(true, str::is_empty)
            || parsed.query().is_some()
            || parsed.fragment().is_some()
        {
            return Err(PhraseError::InvalidInput(format!(
                "Invalid base '{}': expected host[:port][/path]",
                base
            )));
        }

        Ok(trimmed.to_string())
    }

    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity {
            client: self.client.clone(),
            version: self.client_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from_str("production"), Some(Mode::Production));
        assert_eq!(Mode::from_str("TEST"), Some(Mode::Test));
        assert_eq!(Mode::from_str("jest"), Some(Mode::Test));
        assert_eq!(Mode::from_str("staging"), None);
    }

    #[test]
    fn test_production_endpoints() {
        let endpoints = Endpoints::for_mode(Mode::Production);
        assert_eq!(
            endpoints.http_url("/phrase"),
            "https://www.fishfit.fun:8080/p/phrase"
        );
        assert_eq!(
            endpoints.login_qr_url(),
            "wss://www.fishfit.fun:8080/p/user/login_qr"
        );
    }

    #[test]
    fn test_test_endpoints() {
        let endpoints = Endpoints::for_mode(Mode::Test);
        assert_eq!(endpoints.http_url("/phrase"), "http://localhost:8080/p/phrase");
        assert_eq!(
            endpoints.login_qr_url(),
            "ws://localhost:8080/p/user/login_qr"
        );
    }

    #[test]
    fn test_base_override_keeps_schemes() {
        let config = Config {
            mode: Mode::Test,
            base_override: Some("127.0.0.1:9000/p/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.endpoints().http_url("/phrase"),
            "http://127.0.0.1:9000/p/phrase"
        );
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.client, "phrasebook-cli");
        assert_eq!(config.client_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            mode: Mode::Test,
            client: "ext".to_string(),
            client_version: "2.1.0".to_string(),
            base_override: None,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_base_override_keeps_mode_schemes() {
        let config = Config {
            mode: Mode::Test,
            base_override: Some("127.0.0.1:9000/p".to_string()),
            ..Config::default()
        };
        let endpoints = config.endpoints();
        assert_eq!(endpoints.http_url("/phrase"), "http://127.0.0.1:9000/p/phrase");
        assert_eq!(endpoints.login_qr_url(), "ws://127.0.0.1:9000/p/user/login_qr");
    }

    #[test]
    fn test_parse_base() {
        assert_eq!(
            Config::parse_base("localhost:8080/p/").unwrap(),
            "localhost:8080/p"
        );
        assert_eq!(Config::parse_base("example.com").unwrap(), "example.com");
        assert!(Config::parse_base("https://example.com/p").is_err());
        assert!(Config::parse_base("").is_err());
        assert!(Config::parse_base("host:notaport").is_err());
        assert!(Config::parse_base("host/p?x=1").is_err());
    }
}
