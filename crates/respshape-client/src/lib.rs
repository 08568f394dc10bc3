//! # respshape-client
//!
//! Client library for the Apigee Edge management API.
//!
//! The [`ManagementApi`] trait is the seam between the provisioning logic and
//! the transport. [`EdgeClient`] implements it over HTTP; tests substitute an
//! in-memory implementation.
//!
//! ## Example
//!
//! ```no_run
//! use respshape_client::{EdgeClient, ManagementApi};
//! use respshape_common::{Auth, ConnectionSettings};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), respshape_client::ClientError> {
//! let settings = ConnectionSettings::new(
//!     "my-org",
//!     Auth::Bearer(SecretString::new("ya29.token".into())),
//! );
//!
//! let client = EdgeClient::connect(settings).await?;
//! let products = client.list_products().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use respshape_common::{
    ApiProduct, ApiProxy, ConnectionSettings, Deployments, Developer, DeveloperApp,
    ImportedRevision, KeyValueEntry, NewApiProduct, NewDeveloper, NewDeveloperApp,
};

pub mod bundle;
pub mod edge;
pub mod error;

pub use edge::EdgeClient;
pub use error::ClientError;

/// Result alias for management API calls.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Operations the provisioning tool needs from the management API.
///
/// Collections are grouped the way the management API groups them:
/// key-value maps (environment scoped), proxies, products, developers and
/// developer apps (scoped to a developer). List calls return names only.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Names of the key-value maps in `environment`.
    async fn list_kvms(&self, environment: &str) -> Result<Vec<String>>;

    /// Creates an empty key-value map.
    async fn create_kvm(&self, environment: &str, name: &str, encrypted: bool) -> Result<()>;

    /// Writes `key = value` into `map`, overwriting an existing value.
    async fn put_kvm_entry(
        &self,
        environment: &str,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<()>;

    /// Reads a single entry back from `map`.
    async fn get_kvm_entry(&self, environment: &str, map: &str, key: &str)
    -> Result<KeyValueEntry>;

    /// Imports a zipped bundle as a new revision of proxy `name`.
    async fn import_proxy(&self, name: &str, bundle: Vec<u8>) -> Result<ImportedRevision>;

    /// Deploys `revision` of proxy `name` to `environment`.
    async fn deploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()>;

    /// Undeploys `revision` of proxy `name` from `environment`.
    async fn undeploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()>;

    /// Fetches the proxy definition.
    async fn get_proxy(&self, name: &str) -> Result<ApiProxy>;

    /// Fetches where the proxy is currently deployed.
    async fn get_proxy_deployments(&self, name: &str) -> Result<Deployments>;

    /// Deletes the proxy definition and all its revisions.
    async fn delete_proxy(&self, name: &str) -> Result<()>;

    async fn list_products(&self) -> Result<Vec<String>>;
    async fn create_product(&self, product: &NewApiProduct) -> Result<ApiProduct>;
    async fn delete_product(&self, name: &str) -> Result<()>;

    /// Emails of all developers in the organization.
    async fn list_developers(&self) -> Result<Vec<String>>;
    async fn create_developer(&self, developer: &NewDeveloper) -> Result<Developer>;
    async fn delete_developer(&self, email: &str) -> Result<()>;

    /// Names of the apps registered by `developer_email`.
    async fn list_developer_apps(&self, developer_email: &str) -> Result<Vec<String>>;

    /// Fetches the full app record, including credentials.
    async fn get_developer_app(&self, developer_email: &str, name: &str) -> Result<DeveloperApp>;

    async fn create_developer_app(
        &self,
        developer_email: &str,
        app: &NewDeveloperApp,
    ) -> Result<DeveloperApp>;

    async fn delete_developer_app(&self, developer_email: &str, name: &str) -> Result<()>;
}

/// Opens authenticated sessions against a management server.
///
/// Kept separate from [`ManagementApi`] so callers can prove that nothing was
/// contacted when option validation fails.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates and returns a session handle.
    async fn connect(&self, settings: ConnectionSettings) -> Result<Arc<dyn ManagementApi>>;
}

/// [`Connector`] producing [`EdgeClient`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeConnector;

#[async_trait]
impl Connector for EdgeConnector {
    async fn connect(&self, settings: ConnectionSettings) -> Result<Arc<dyn ManagementApi>> {
        let client = EdgeClient::connect(settings).await?;
        Ok(Arc::new(client))
    }
}
