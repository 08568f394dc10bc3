use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default Apigee Edge management server.
pub const DEFAULT_MGMT_SERVER: &str = "https://api.enterprise.apigee.com";

/// Default name of the key-value map holding the upstream credentials.
pub const DEFAULT_SECRETS_MAP: &str = "secrets";

/// Default location of the proxy bundle, relative to the working directory.
pub const DEFAULT_BUNDLE_DIR: &str = "bundle";

/// Client id/secret pair for the upstream (Amadeus test) APIs.
///
/// These are written into the secrets map so the deployed proxy can call the
/// upstream service.
#[derive(Clone)]
pub struct UpstreamCredentials {
    /// Upstream client id.
    pub client_id: String,
    /// Upstream client secret.
    pub client_secret: SecretString,
}

impl UpstreamCredentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into().into()),
        }
    }
}

impl fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// The resolved, validated configuration for one run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Target environment (e.g. `test`, `prod`).
    pub environment: String,
    /// Name of the key-value map that receives the upstream credentials.
    pub secrets_map: String,
    /// Upstream credentials. Always present outside of reset mode.
    pub credentials: Option<UpstreamCredentials>,
    /// Delete previously provisioned assets instead of creating them.
    pub reset: bool,
    /// Directory containing the `apiproxy/` bundle to import.
    pub bundle_dir: PathBuf,
}

/// How requests to the management server are authenticated.
#[derive(Clone)]
pub enum Auth {
    /// HTTP basic authentication with an Edge user.
    Basic {
        /// Edge username (usually an email address).
        username: String,
        /// Edge password.
        password: SecretString,
    },
    /// A pre-obtained OAuth access token.
    Bearer(SecretString),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"[REDACTED]").finish(),
        }
    }
}

/// Transport timeouts for the management client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds (default: 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpSettings {
    /// Connection timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_connect_timeout_secs() -> u64 {
    30
}

const fn default_timeout_secs() -> u64 {
    120 // bundle imports can be slow
}

/// Everything needed to open a session against the management server.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Base URL of the management server, without the `/v1` suffix.
    pub mgmt_server: String,
    /// Apigee organization name.
    pub organization: String,
    /// Credentials for the management API.
    pub auth: Auth,
    /// Transport timeouts.
    pub http: HttpSettings,
}

impl ConnectionSettings {
    /// Creates settings for `organization` on the default management server.
    #[must_use]
    pub fn new(organization: impl Into<String>, auth: Auth) -> Self {
        Self {
            mgmt_server: DEFAULT_MGMT_SERVER.to_string(),
            organization: organization.into(),
            auth,
            http: HttpSettings::default(),
        }
    }

    /// Overrides the management server base URL.
    #[must_use]
    pub fn with_mgmt_server(mut self, mgmt_server: impl Into<String>) -> Self {
        self.mgmt_server = mgmt_server.into();
        self
    }

    /// Overrides the transport timeouts.
    #[must_use]
    pub const fn with_http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    /// Base URL for organization-scoped calls, e.g.
    /// `https://api.enterprise.apigee.com/v1/o/my-org`.
    #[must_use]
    pub fn org_url(&self) -> String {
        format!(
            "{}/v1/o/{}",
            self.mgmt_server.trim_end_matches('/'),
            self.organization
        )
    }
}
