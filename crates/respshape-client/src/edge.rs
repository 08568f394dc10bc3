//! HTTP client for the Apigee Edge v1 management API.
//!
//! All calls are organization scoped: `{mgmt_server}/v1/o/{org}/...`.
//!
//! # Authentication
//!
//! Requests carry either HTTP basic credentials or a bearer token, depending on
//! [`Auth`]. Both are held as `secrecy` values and are never included in
//! `Debug` output or logs.
//!
//! # Error Handling
//!
//! - **401/403**: [`ClientError::AuthenticationError`]
//! - **404**: [`ClientError::NotFound`]
//! - **409**: [`ClientError::Conflict`]
//! - anything else non-2xx: [`ClientError::ApiError`]
//!
//! There is no retry layer; every failure surfaces to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use respshape_common::{
    ApiProduct, ApiProxy, Auth, ConnectionSettings, Deployments, Developer, DeveloperApp,
    ImportedRevision, KeyValueEntry, NewApiProduct, NewDeveloper, NewDeveloperApp,
};

use crate::error::{ClientError, ErrorResponse};
use crate::{ManagementApi, Result};

/// Client for one organization on an Edge management server.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct EdgeClient {
    client: reqwest::Client,
    org_url: Url,
    settings: Arc<ConnectionSettings>,
}

// Custom Debug implementation to avoid exposing credentials
impl std::fmt::Debug for EdgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeClient")
            .field("org_url", &self.org_url.as_str())
            .field("auth", &self.settings.auth)
            .finish_non_exhaustive()
    }
}

/// Body for creating a key-value map.
#[derive(Serialize)]
struct NewKeyValueMap<'a> {
    name: &'a str,
    encrypted: bool,
    entry: [KeyValueEntry; 0],
}

impl EdgeClient {
    /// Creates a client without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the management server URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        if settings.organization.trim().is_empty() {
            return Err(ClientError::ConfigurationError(
                "organization is required".to_string(),
            ));
        }

        let raw = settings.org_url();
        let org_url = Url::parse(&raw)
            .map_err(|e| ClientError::ConfigurationError(format!("Invalid URL '{raw}': {e}")))?;
        if org_url.cannot_be_a_base() {
            return Err(ClientError::ConfigurationError(format!(
                "management server URL cannot be used as a base: {raw}"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.http.connect_timeout())
            .timeout(settings.http.timeout())
            .build()?;

        Ok(Self {
            client,
            org_url,
            settings: Arc::new(settings),
        })
    }

    /// Creates a client and verifies the organization is reachable with the
    /// supplied credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthenticationError`] if the credentials are
    /// rejected, or any transport error.
    pub async fn connect(settings: ConnectionSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        let _: serde_json::Value = Self::send_json(client.request(Method::GET, &[])?).await?;
        debug!("Connected to organization {}", client.settings.organization);
        Ok(client)
    }

    /// The organization this client is bound to.
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.settings.organization
    }

    /// Builds `{org_url}/{segments...}`, percent-encoding every segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.org_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::ConfigurationError(format!(
                    "management server URL cannot be used as a base: {}",
                    self.org_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!("{method} {url}");

        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");

        Ok(match &self.settings.auth {
            Auth::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Auth::Bearer(token) => builder.bearer_auth(token.expose_secret()),
        })
    }

    /// Sends a request and turns any non-success status into a [`ClientError`].
    async fn send(builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.map_err(|e| {
            warn!("Failed to read error response body: {e}");
            ClientError::NetworkError(e)
        })?;

        // Extract the error message from structured response or use raw text
        let error_message = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(parsed) => {
                debug!("Parsed structured error response (code {:?})", parsed.code);
                parsed.message
            }
            Err(parse_err) => {
                debug!(
                    "Failed to parse error response as JSON: {parse_err}. Using raw text instead."
                );
                error_text
            }
        };

        error!(
            "Management API request failed with status {}: {}",
            status.as_u16(),
            error_message
        );

        Err(ClientError::from_status(status, error_message))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = Self::send(builder).await?;
        let response_text = response.text().await?;
        // Bodies can carry key-value map secrets, so only the size is logged.
        debug!("API response: {} bytes", response_text.len());
        serde_json::from_str(&response_text).map_err(ClientError::SerializationError)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<()> {
        Self::send(builder).await.map(drop)
    }
}

#[async_trait]
impl ManagementApi for EdgeClient {
    async fn list_kvms(&self, environment: &str) -> Result<Vec<String>> {
        let req = self.request(Method::GET, &["e", environment, "keyvaluemaps"])?;
        Self::send_json(req).await
    }

    async fn create_kvm(&self, environment: &str, name: &str, encrypted: bool) -> Result<()> {
        let req = self
            .request(Method::POST, &["e", environment, "keyvaluemaps"])?
            .json(&NewKeyValueMap {
                name,
                encrypted,
                entry: [],
            });
        Self::send_empty(req).await
    }

    async fn put_kvm_entry(
        &self,
        environment: &str,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let entry = KeyValueEntry {
            name: key.to_string(),
            value: value.to_string(),
        };

        let update = self
            .request(
                Method::POST,
                &["e", environment, "keyvaluemaps", map, "entries", key],
            )?
            .json(&entry);

        match Self::send_empty(update).await {
            Err(ClientError::NotFound(_)) => {
                debug!("Entry {key} absent from {map}, creating it");
                let create = self
                    .request(Method::POST, &["e", environment, "keyvaluemaps", map, "entries"])?
                    .json(&entry);
                Self::send_empty(create).await
            }
            other => other,
        }
    }

    async fn get_kvm_entry(
        &self,
        environment: &str,
        map: &str,
        key: &str,
    ) -> Result<KeyValueEntry> {
        let req = self.request(
            Method::GET,
            &["e", environment, "keyvaluemaps", map, "entries", key],
        )?;
        Self::send_json(req).await
    }

    async fn import_proxy(&self, name: &str, bundle: Vec<u8>) -> Result<ImportedRevision> {
        let part = Part::bytes(bundle)
            .file_name("apiproxy.zip")
            .mime_str("application/octet-stream")?;
        let req = self
            .request(Method::POST, &["apis"])?
            .query(&[("action", "import"), ("name", name), ("validate", "false")])
            .multipart(Form::new().part("file", part));
        Self::send_json(req).await
    }

    async fn deploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()> {
        let req = self
            .request(
                Method::POST,
                &["e", environment, "apis", name, "revisions", revision, "deployments"],
            )?
            .form(&[("override", "true")]);
        Self::send_empty(req).await
    }

    async fn undeploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()> {
        let req = self.request(
            Method::DELETE,
            &["e", environment, "apis", name, "revisions", revision, "deployments"],
        )?;
        Self::send_empty(req).await
    }

    async fn get_proxy(&self, name: &str) -> Result<ApiProxy> {
        let req = self.request(Method::GET, &["apis", name])?;
        Self::send_json(req).await
    }

    async fn get_proxy_deployments(&self, name: &str) -> Result<Deployments> {
        let req = self.request(Method::GET, &["apis", name, "deployments"])?;
        Self::send_json(req).await
    }

    async fn delete_proxy(&self, name: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["apis", name])?;
        Self::send_empty(req).await
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let req = self.request(Method::GET, &["apiproducts"])?;
        Self::send_json(req).await
    }

    async fn create_product(&self, product: &NewApiProduct) -> Result<ApiProduct> {
        let req = self.request(Method::POST, &["apiproducts"])?.json(product);
        Self::send_json(req).await
    }

    async fn delete_product(&self, name: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["apiproducts", name])?;
        Self::send_empty(req).await
    }

    async fn list_developers(&self) -> Result<Vec<String>> {
        let req = self.request(Method::GET, &["developers"])?;
        Self::send_json(req).await
    }

    async fn create_developer(&self, developer: &NewDeveloper) -> Result<Developer> {
        let req = self.request(Method::POST, &["developers"])?.json(developer);
        Self::send_json(req).await
    }

    async fn delete_developer(&self, email: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["developers", email])?;
        Self::send_empty(req).await
    }

    async fn list_developer_apps(&self, developer_email: &str) -> Result<Vec<String>> {
        let req = self.request(Method::GET, &["developers", developer_email, "apps"])?;
        Self::send_json(req).await
    }

    async fn get_developer_app(&self, developer_email: &str, name: &str) -> Result<DeveloperApp> {
        let req = self.request(Method::GET, &["developers", developer_email, "apps", name])?;
        Self::send_json(req).await
    }

    async fn create_developer_app(
        &self,
        developer_email: &str,
        app: &NewDeveloperApp,
    ) -> Result<DeveloperApp> {
        let req = self
            .request(Method::POST, &["developers", developer_email, "apps"])?
            .json(app);
        Self::send_json(req).await
    }

    async fn delete_developer_app(&self, developer_email: &str, name: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["developers", developer_email, "apps", name])?;
        Self::send_empty(req).await
    }
}
