//! Connection settings for OQTOPUS Cloud.
//!
//! Settings are resolved in this order:
//!
//! 1. `OQTOPUS_URL` + `OQTOPUS_API_TOKEN` (+ optional `OQTOPUS_PROXY`)
//!    environment variables, when both URL and token are present.
//! 2. A section of the INI file at `~/.oqtopus` (`default` unless named).
//!
//! ```ini
//! [default]
//! url=https://api.oqtopus.example
//! api_token=xxxx
//!
//! [staging]
//! url=https://staging.oqtopus.example
//! api_token=yyyy
//! proxy=http://proxy.internal:3128
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use crate::error::{OqtopusError, OqtopusResult};

/// Environment variable holding the API endpoint.
pub const ENV_URL: &str = "OQTOPUS_URL";
/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "OQTOPUS_API_TOKEN";
/// Environment variable holding an optional proxy URL.
pub const ENV_PROXY: &str = "OQTOPUS_PROXY";

/// Section read when none is named.
pub const DEFAULT_SECTION: &str = "default";

/// Endpoint, credentials and proxy for one OQTOPUS Cloud account.
#[derive(Clone, PartialEq, Eq)]
pub struct OqtopusConfig {
    url: String,
    api_token: String,
    proxy: Option<String>,
}

impl OqtopusConfig {
    /// Create a configuration from explicit values.
    pub fn new(
        url: impl Into<String>,
        api_token: impl Into<String>,
        proxy: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_token: api_token.into(),
            proxy,
        }
    }

    /// API endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// API token sent as `q-api-token`.
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Proxy URL, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Read the configuration from the process environment.
    ///
    /// Returns `None` unless both `OQTOPUS_URL` and `OQTOPUS_API_TOKEN` are set.
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)?;
        let api_token = lookup(ENV_API_TOKEN)?;
        Some(Self::new(url, api_token, lookup(ENV_PROXY)))
    }

    /// Default configuration file location (`~/.oqtopus`).
    pub fn default_path() -> OqtopusResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OqtopusError::Config("Could not determine home directory".into()))?;
        Ok(home.join(".oqtopus"))
    }

    /// Read a section of an INI configuration file.
    ///
    /// `section` defaults to `default`. The section must define `url` and
    /// `api_token`; `proxy` is optional.
    pub fn from_file(path: impl AsRef<Path>, section: Option<&str>) -> OqtopusResult<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| {
            OqtopusError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        debug!("Loaded configuration file {}", path.display());
        Self::from_ini(&ini, section)
    }

    /// Parse a section out of INI text.
    pub fn from_ini_str(text: &str, section: Option<&str>) -> OqtopusResult<Self> {
        let ini = Ini::load_from_str(text)
            .map_err(|e| OqtopusError::Config(format!("Malformed configuration: {e}")))?;
        Self::from_ini(&ini, section)
    }

    fn from_ini(ini: &Ini, section: Option<&str>) -> OqtopusResult<Self> {
        let name = section.unwrap_or(DEFAULT_SECTION);
        let props = ini
            .section(Some(name))
            .ok_or_else(|| OqtopusError::Config(format!("Section '{name}' not found")))?;

        let required = |key: &str| {
            props.get(key).map(str::to_string).ok_or_else(|| {
                OqtopusError::Config(format!("Key '{key}' not found in section '{name}'"))
            })
        };

        let url = required("url")?;
        let api_token = required("api_token")?;
        let proxy = props.get("proxy").map(str::to_string);

        Ok(Self::new(url, api_token, proxy))
    }

    /// Resolve the configuration: environment first, then `~/.oqtopus`.
    pub fn load(section: Option<&str>) -> OqtopusResult<Self> {
        if let Some(config) = Self::from_env() {
            debug!("Using OQTOPUS configuration from environment");
            return Ok(config);
        }
        Self::from_file(Self::default_path()?, section)
    }
}

impl fmt::Debug for OqtopusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OqtopusConfig")
            .field("url", &self.url)
            .field("api_token", &"[REDACTED]")
            .field("proxy", &self.proxy)
            .finish()
    }
}
