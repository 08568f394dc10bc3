//! Option resolution: flags + environment + profile into validated settings.
//!
//! Nothing here talks to the network. A [`UsageError`] returned from
//! [`resolve`] means the run must stop before a session is opened.

use std::fmt;
use std::path::PathBuf;

use log::info;
use respshape_common::config::{DEFAULT_BUNDLE_DIR, DEFAULT_MGMT_SERVER, DEFAULT_SECRETS_MAP};
use respshape_common::{Auth, ConnectionSettings, ProvisionConfig, UpstreamCredentials};
use secrecy::SecretString;

use crate::error::UsageError;
use crate::profile::ConnectionProfile;

/// Environment variable fallback for the upstream client id.
pub const ENV_CLIENT_ID: &str = "amadeus_client_id";
/// Environment variable fallback for the upstream client secret.
pub const ENV_CLIENT_SECRET: &str = "amadeus_client_secret";
/// Environment variable fallback for the management API password.
pub const ENV_PASSWORD: &str = "APIGEE_PASSWORD";
/// Environment variable fallback for the management API token.
pub const ENV_TOKEN: &str = "APIGEE_TOKEN";

/// Options as parsed from the command line, before validation.
#[derive(Clone, Default)]
pub struct RawOptions {
    pub environment: Option<String>,
    pub reset: bool,
    pub secrets_map: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub organization: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub mgmt_server: Option<String>,
    pub bundle_dir: Option<PathBuf>,
}

fn redacted(value: Option<&str>) -> Option<&'static str> {
    value.map(|_| "[REDACTED]")
}

// Custom Debug implementation to avoid exposing credentials
impl fmt::Debug for RawOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawOptions")
            .field("environment", &self.environment)
            .field("reset", &self.reset)
            .field("secrets_map", &self.secrets_map)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(self.client_secret.as_deref()))
            .field("organization", &self.organization)
            .field("username", &self.username)
            .field("password", &redacted(self.password.as_deref()))
            .field("token", &redacted(self.token.as_deref()))
            .field("mgmt_server", &self.mgmt_server)
            .field("bundle_dir", &self.bundle_dir)
            .finish()
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub provision: ProvisionConfig,
    pub connection: ConnectionSettings,
}

/// Treats empty strings the same as absent values.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validates `raw` and fills gaps from `profile` and `env`.
///
/// `env` looks up environment variables; the binary passes
/// `|k| std::env::var(k).ok()`.
///
/// # Errors
///
/// Returns a [`UsageError`] if:
/// - No environment is given
/// - Not resetting, and the upstream client id or secret is missing from both
///   flags and environment
/// - No organization is given by flag or profile
/// - Neither a token nor a username with a password is available
pub fn resolve(
    raw: RawOptions,
    profile: &ConnectionProfile,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ResolvedOptions, UsageError> {
    let environment = present(raw.environment).ok_or(UsageError::MissingEnvironment)?;

    let credentials = if raw.reset {
        None
    } else {
        let client_id = present(raw.client_id).or_else(|| present(env(ENV_CLIENT_ID)));
        let client_secret =
            present(raw.client_secret).or_else(|| present(env(ENV_CLIENT_SECRET)));
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Some(UpstreamCredentials::new(id, secret)),
            _ => return Err(UsageError::MissingUpstreamCredentials),
        }
    };

    let secrets_map = present(raw.secrets_map).unwrap_or_else(|| {
        info!("defaulting to secrets map: {DEFAULT_SECRETS_MAP}");
        DEFAULT_SECRETS_MAP.to_string()
    });

    let organization = present(raw.organization)
        .or_else(|| present(profile.organization.clone()))
        .ok_or(UsageError::MissingOrganization)?;

    let auth = resolve_auth(
        present(raw.token).or_else(|| present(env(ENV_TOKEN))),
        present(raw.username).or_else(|| present(profile.username.clone())),
        present(raw.password).or_else(|| present(env(ENV_PASSWORD))),
    )?;

    let mgmt_server = present(raw.mgmt_server)
        .or_else(|| present(profile.mgmt_server.clone()))
        .unwrap_or_else(|| DEFAULT_MGMT_SERVER.to_string());

    Ok(ResolvedOptions {
        provision: ProvisionConfig {
            environment,
            secrets_map,
            credentials,
            reset: raw.reset,
            bundle_dir: raw
                .bundle_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BUNDLE_DIR)),
        },
        connection: ConnectionSettings::new(organization, auth)
            .with_mgmt_server(mgmt_server)
            .with_http(profile.http),
    })
}

/// A token wins over basic credentials when both are present.
fn resolve_auth(
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<Auth, UsageError> {
    if let Some(token) = token {
        return Ok(Auth::Bearer(SecretString::new(token.into())));
    }
    match (username, password) {
        (Some(username), Some(password)) => Ok(Auth::Basic {
            username,
            password: SecretString::new(password.into()),
        }),
        _ => Err(UsageError::MissingManagementCredentials),
    }
}
