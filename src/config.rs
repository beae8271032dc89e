//! payqr runtime configuration handling

use crate::error::{Error, Result};
use crate::portal::TokenRule;
use crate::qr;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayqrConfig {
    /// Portal endpoints and markup contract
    pub portal: PortalOptions,
    /// Account credentials supplied via file or environment
    pub credentials: CredentialOptions,
    /// QR rendering configuration
    pub render: RenderOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl PayqrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No payqr.toml / payqr.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["payqr.toml", "payqr.yaml", "payqr.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("payqr");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.portal.apply_env_overrides();
        self.credentials.apply_env_overrides();
        self.render.apply_env_overrides();
        self.logging.apply_env_overrides();
    }
}

/// Portal endpoints and the markup contract used to locate the card token.
///
/// The defaults describe the reference portal; every field can be overridden
/// when the upstream layout changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalOptions {
    /// Portal origin, e.g. `https://mon-espace.izly.fr`
    pub base_url: String,
    /// Path of the CSRF-protected login form
    pub login_path: String,
    /// Path of the post-login account page carrying the card token
    pub account_path: String,
    /// Name of the hidden CSRF input on the login form
    pub csrf_field: String,
    /// Login form field carrying the username
    pub username_field: String,
    /// Login form field carrying the password
    pub password_field: String,
    /// Session cookie the portal issues on successful login
    pub auth_cookie: String,
    /// CSS selector matching the token element on the account page
    pub token_selector: String,
    /// Attribute holding the token; the element's text when unset
    pub token_attribute: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            base_url: "https://mon-espace.izly.fr".to_string(),
            login_path: "/Home/Logon".to_string(),
            account_path: "/".to_string(),
            csrf_field: "__RequestVerificationToken".to_string(),
            username_field: "UserName".to_string(),
            password_field: "Password".to_string(),
            auth_cookie: ".ASPXAUTH".to_string(),
            token_selector: "[data-card-token]".to_string(),
            token_attribute: Some("data-card-token".to_string()),
            timeout_secs: 30,
        }
    }
}

impl PortalOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("PAYQR_PORTAL_URL") {
            self.base_url = url;
        }
        if let Ok(path) = env::var("PAYQR_LOGIN_PATH") {
            self.login_path = path;
        }
        if let Ok(path) = env::var("PAYQR_ACCOUNT_PATH") {
            self.account_path = path;
        }
        if let Ok(selector) = env::var("PAYQR_TOKEN_SELECTOR") {
            self.token_selector = selector;
        }
        if let Ok(attribute) = env::var("PAYQR_TOKEN_ATTR") {
            if attribute.trim().is_empty() {
                self.token_attribute = None;
            } else {
                self.token_attribute = Some(attribute);
            }
        }
    }

    /// The markup rule used to locate the card token on the account page.
    pub fn token_rule(&self) -> TokenRule {
        TokenRule {
            selector: self.token_selector.clone(),
            attribute: self.token_attribute.clone(),
        }
    }
}

/// Account credentials sourced from the config file or `PAYQR_*` environment
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialOptions {
    /// Portal account username
    pub username: Option<String>,
    /// Portal account password
    pub password: Option<String>,
}

impl CredentialOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(username) = env::var("PAYQR_USERNAME") {
            self.username = Some(username);
        }
        if let Ok(password) = env::var("PAYQR_PASSWORD") {
            self.password = Some(password);
        }
    }
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOptions")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// QR rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pixel size of each rendered QR code
    pub size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: qr::DEFAULT_SIZE,
        }
    }
}

impl RenderOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("PAYQR_QR_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.size = parsed;
            }
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `PAYQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("PAYQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("PAYQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("PAYQR_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("PAYQR_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}
