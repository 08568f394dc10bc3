//! # respshape
//!
//! Provisions the assets of the Apigee response-shaping demo, or deletes them
//! again.
//!
//! A forward run ensures, in order:
//!
//! 1. an encrypted key-value map holding the upstream API credentials
//! 2. a new revision of the `response-shaping` proxy, deployed
//! 3. the API product, the developer and two developer apps
//!
//! and prints the consumer keys of both apps with sample requests. Entities
//! that already exist are reused, so the run can be repeated.
//!
//! A reset run deletes the same assets on a best-effort basis.
//!
//! ## Example
//!
//! ```no_run
//! use respshape::options::RawOptions;
//! use respshape::profile::ConnectionProfile;
//! use respshape_client::EdgeConnector;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let raw = RawOptions {
//!     environment: Some("test".to_string()),
//!     organization: Some("my-org".to_string()),
//!     token: Some("ya29.token".to_string()),
//!     client_id: Some("client".to_string()),
//!     client_secret: Some("secret".to_string()),
//!     ..RawOptions::default()
//! };
//!
//! respshape::launch(
//!     raw,
//!     &ConnectionProfile::default(),
//!     &|k: &str| std::env::var(k).ok(),
//!     &EdgeConnector,
//!     &mut std::io::stdout(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use log::info;
use respshape_client::{Connector, ManagementApi};
use respshape_common::ProvisionConfig;
use respshape_common::discriminators::{self, DEVELOPER_APP_COUNT};

pub mod error;
pub mod options;
pub mod profile;
pub mod provisioner;
pub mod proxy;
pub mod report;
pub mod reset;
pub mod secrets;

#[cfg(test)]
mod testing;

pub use error::{ProfileError, ProvisionError, UsageError};
pub use options::{RawOptions, ResolvedOptions};
pub use profile::ConnectionProfile;
pub use report::ProvisionSummary;
pub use reset::{ResetOrchestrator, ResetReport, ResetStep};

use crate::provisioner::{CreationContext, EntityProvisioner};
use crate::proxy::ProxyDeployer;
use crate::secrets::SecretsProvisioner;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Provisioned(ProvisionSummary),
    Reset(ResetReport),
}

/// Runs the forward sequence against an open session.
///
/// `note` is stamped on every entity created by this run.
///
/// # Errors
///
/// Stops at the first failed phase; the error carries the phase as context.
pub async fn provision(
    api: &dyn ManagementApi,
    config: &ProvisionConfig,
    note: &str,
) -> anyhow::Result<ProvisionSummary> {
    let credentials = config
        .credentials
        .as_ref()
        .ok_or(ProvisionError::Usage(UsageError::MissingUpstreamCredentials))?;

    let secrets = SecretsProvisioner::new(api, &config.environment, &config.secrets_map);
    secrets
        .ensure_map(true)
        .await
        .with_context(|| format!("failed to ensure key-value map {}", config.secrets_map))?;
    secrets
        .store_credentials(credentials)
        .await
        .context("failed to store upstream credentials")?;

    ProxyDeployer::new(api, &config.environment, &config.bundle_dir)
        .import_and_deploy()
        .await
        .context("failed to import and deploy proxy")?;

    let ctx = CreationContext::new(&config.environment, note);
    let (entities, _) = EntityProvisioner::new(api, ctx)
        .ensure_product()
        .await
        .context("failed to ensure product")?;
    let (entities, _) = entities
        .ensure_developer()
        .await
        .context("failed to ensure developer")?;

    let mut app_keys = Vec::with_capacity(usize::from(DEVELOPER_APP_COUNT));
    for index in 1..=DEVELOPER_APP_COUNT {
        let name = discriminators::developer_app_name(index);
        let app = entities
            .ensure_app(index)
            .await
            .with_context(|| format!("failed to ensure developer app {name}"))?;
        let key = provisioner::consumer_key(&app)?;
        info!("Developer app {name} ready");
        app_keys.push(key.to_string());
    }

    Ok(ProvisionSummary { app_keys })
}

/// Resolves options, connects, and runs the forward or reset sequence.
///
/// Options are validated before the connector is touched, so a
/// [`UsageError`] (recoverable with `downcast_ref`) means nothing remote
/// happened. On the forward path the summary is written to `out`.
///
/// # Errors
///
/// Returns usage errors, connection failures and forward-path failures.
/// Reset steps never fail the run.
pub async fn launch(
    raw: RawOptions,
    profile: &ConnectionProfile,
    env: &dyn Fn(&str) -> Option<String>,
    connector: &dyn Connector,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let resolved = options::resolve(raw, profile, env)?;

    info!("start");
    let organization = resolved.connection.organization.clone();
    let api = connector
        .connect(resolved.connection)
        .await
        .with_context(|| format!("failed to connect to organization {organization}"))?;
    info!("connected");

    if resolved.provision.reset {
        let report = ResetOrchestrator::new(api.as_ref()).run().await;
        return Ok(Outcome::Reset(report));
    }

    let note = discriminators::creation_note(Utc::now());
    let summary = provision(api.as_ref(), &resolved.provision, &note).await?;
    summary
        .write_to(out)
        .context("failed to write summary")?;
    Ok(Outcome::Provisioned(summary))
}
