use std::path::PathBuf;

use respshape_client::ClientError;
use thiserror::Error;

/// Missing or inconsistent command-line configuration.
///
/// Always detected before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("you must specify an environment.")]
    MissingEnvironment,

    #[error("you must specify credentials for Amadeus test APIs.")]
    MissingUpstreamCredentials,

    #[error("you must specify an organization.")]
    MissingOrganization,

    #[error("you must specify a token, or a username and password, for the management API.")]
    MissingManagementCredentials,
}

/// Failures while loading the connection profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read profile {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures on the provisioning path.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A developer app came back without any credential.
    #[error("developer app {app} has no credentials")]
    MissingCredential { app: String },

    /// No response filter is defined for this app index.
    #[error("no developer app with index {0}")]
    UnknownApp(u8),

    /// The proxy has no deployed revision to undeploy.
    #[error("proxy {0} has no deployments")]
    NoDeployment(String),

    /// A call returned a record of a different kind than requested.
    #[error("unexpected record: {0}")]
    UnexpectedRecord(String),
}

/// Result type alias using `ProvisionError`.
pub type Result<T> = std::result::Result<T, ProvisionError>;
