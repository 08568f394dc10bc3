//! Secrets store provisioning.

use log::{debug, info};
use respshape_client::{ManagementApi, Result};
use respshape_common::UpstreamCredentials;
use respshape_common::discriminators::{SECRET_CLIENT_ID_KEY, SECRET_CLIENT_SECRET_KEY};
use secrecy::ExposeSecret;

/// Ensures the secrets map exists and writes the upstream credentials into it.
pub struct SecretsProvisioner<'a> {
    api: &'a dyn ManagementApi,
    environment: &'a str,
    map: &'a str,
}

impl<'a> SecretsProvisioner<'a> {
    #[must_use]
    pub fn new(api: &'a dyn ManagementApi, environment: &'a str, map: &'a str) -> Self {
        Self {
            api,
            environment,
            map,
        }
    }

    /// Creates the map unless the environment already lists it.
    ///
    /// Returns the listing fetched before any creation.
    ///
    /// # Errors
    ///
    /// Returns any error from listing or creating the map.
    pub async fn ensure_map(&self, encrypted: bool) -> Result<Vec<String>> {
        let maps = self.api.list_kvms(self.environment).await?;
        if maps.iter().any(|m| m == self.map) {
            debug!("Key-value map {} already present in {}", self.map, self.environment);
        } else {
            info!(
                "Creating key-value map {} in {} (encrypted: {encrypted})",
                self.map, self.environment
            );
            self.api
                .create_kvm(self.environment, self.map, encrypted)
                .await?;
        }
        Ok(maps)
    }

    /// Writes the client id and secret, overwriting previous values.
    ///
    /// # Errors
    ///
    /// Returns the first failed write.
    pub async fn store_credentials(&self, credentials: &UpstreamCredentials) -> Result<()> {
        self.api
            .put_kvm_entry(
                self.environment,
                self.map,
                SECRET_CLIENT_ID_KEY,
                &credentials.client_id,
            )
            .await?;
        self.api
            .put_kvm_entry(
                self.environment,
                self.map,
                SECRET_CLIENT_SECRET_KEY,
                credentials.client_secret.expose_secret(),
            )
            .await?;
        info!("Stored upstream credentials in {}", self.map);
        Ok(())
    }
}
