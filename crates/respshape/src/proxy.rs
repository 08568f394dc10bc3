//! Proxy import and deployment.

use std::path::Path;

use log::info;
use respshape_client::bundle::package_bundle;
use respshape_client::{ManagementApi, Result};
use respshape_common::ImportedRevision;
use respshape_common::discriminators::PROXY;

/// Imports the local bundle as a new proxy revision and deploys it.
///
/// Every call creates a new revision; nothing checks whether an identical
/// revision is already deployed.
pub struct ProxyDeployer<'a> {
    api: &'a dyn ManagementApi,
    environment: &'a str,
    bundle_dir: &'a Path,
}

impl<'a> ProxyDeployer<'a> {
    #[must_use]
    pub fn new(api: &'a dyn ManagementApi, environment: &'a str, bundle_dir: &'a Path) -> Self {
        Self {
            api,
            environment,
            bundle_dir,
        }
    }

    /// Imports, then deploys exactly the revision the import returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle can't be packaged, or if import or
    /// deployment fails.
    pub async fn import_and_deploy(&self) -> Result<ImportedRevision> {
        let bundle = package_bundle(self.bundle_dir)?;
        let imported = self.api.import_proxy(PROXY, bundle).await?;
        info!("Imported {} revision {}", imported.name, imported.revision);

        self.api
            .deploy_proxy(self.environment, &imported.name, &imported.revision)
            .await?;
        info!(
            "Deployed {} revision {} to {}",
            imported.name, imported.revision, self.environment
        );
        Ok(imported)
    }
}
