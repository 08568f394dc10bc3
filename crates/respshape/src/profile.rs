//! Connection profile for the management server.
//!
//! Loaded from `~/.config/respshape/config.toml` when present, or from the
//! path given with `--config`. Command-line flags always take precedence.
//!
//! ## Example Profile
//!
//! ```toml
//! mgmt_server = "https://api.enterprise.apigee.com"
//! organization = "my-org"
//! username = "ops@example.com"
//!
//! [http]
//! connect_timeout_secs = 10
//! timeout_secs = 300
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use respshape_common::HttpSettings;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Defaults for the connection options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Management server base URL
    #[serde(default)]
    pub mgmt_server: Option<String>,

    /// Organization name
    #[serde(default)]
    pub organization: Option<String>,

    /// Management API username
    #[serde(default)]
    pub username: Option<String>,

    /// Transport timeouts
    #[serde(default)]
    pub http: HttpSettings,
}

impl ConnectionProfile {
    /// Loads the profile.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// location is used if the file is there and an empty profile otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit path doesn't exist
    /// - The file can't be read
    /// - Deserialization fails
    pub fn load(explicit: Option<&Path>) -> Result<Self, ProfileError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ProfileError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No connection profile found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads and parses a profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ProfileError> {
        let contents = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self = toml::from_str(&contents)?;
        debug!("Loaded connection profile from {}", path.display());
        Ok(profile)
    }

    /// Returns the default profile path, if a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("respshape").join("config.toml"))
    }
}
