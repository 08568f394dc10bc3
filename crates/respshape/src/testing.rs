//! In-memory management API used by the unit tests.
//!
//! Keeps just enough state to behave like Edge for the calls this crate makes,
//! and records every call in order.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use respshape_client::{ClientError, Connector, ManagementApi, Result};
use respshape_common::{
    ApiProduct, ApiProxy, AppCredential, ConnectionSettings, CredentialProduct, Deployments,
    Developer, DeveloperApp, EnvironmentDeployment, ImportedRevision, KeyValueEntry,
    NewApiProduct, NewDeveloper, NewDeveloperApp, RevisionRef,
};
use smallvec::SmallVec;

/// One recorded call. Arguments are kept only where tests assert on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListKvms,
    CreateKvm(String),
    PutEntry(String, String),
    GetEntry,
    ImportProxy,
    DeployProxy(String, String),
    UndeployProxy(String, String),
    GetProxy,
    GetDeployments,
    DeleteProxy,
    ListProducts,
    CreateProduct(String),
    DeleteProduct,
    ListDevelopers,
    CreateDeveloper,
    DeleteDeveloper,
    ListApps,
    GetApp(String),
    CreateApp(String),
    DeleteApp(String),
}

#[derive(Debug, Default)]
struct Kvm {
    encrypted: bool,
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    kvms: BTreeMap<(String, String), Kvm>,
    proxy_revisions: Option<Vec<String>>,
    deployed: BTreeMap<String, String>,
    products: BTreeMap<String, ApiProduct>,
    developers: BTreeMap<String, Developer>,
    apps: BTreeMap<(String, String), DeveloperApp>,
    keys_issued: usize,
}

/// Recording fake of [`ManagementApi`].
#[derive(Debug, Default)]
pub struct MockManagementApi {
    state: Mutex<State>,
    lowercase_emails: bool,
    no_credentials: bool,
    fail_deployments: bool,
}

fn not_found(what: &str) -> ClientError {
    ClientError::NotFound(format!("{what} does not exist"))
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores developer emails lowercased, as Edge does.
    pub fn with_lowercased_developer_emails(mut self) -> Self {
        self.lowercase_emails = true;
        self
    }

    /// Creates apps without any credential.
    pub fn without_app_credentials(mut self) -> Self {
        self.no_credentials = true;
        self
    }

    /// Answers every deployments lookup with a server error.
    pub fn failing_deployments(mut self) -> Self {
        self.fail_deployments = true;
        self
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn kvm_encrypted(&self, environment: &str, map: &str) -> Option<bool> {
        self.state
            .lock()
            .unwrap()
            .kvms
            .get(&(environment.to_string(), map.to_string()))
            .map(|kvm| kvm.encrypted)
    }

    /// `(environment, revision)` pairs currently deployed.
    pub fn deployed(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .deployed
            .iter()
            .map(|(env, rev)| (env.clone(), rev.clone()))
            .collect()
    }

    pub fn proxy_exists(&self) -> bool {
        self.state.lock().unwrap().proxy_revisions.is_some()
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    pub fn developer_count(&self) -> usize {
        self.state.lock().unwrap().developers.len()
    }

    pub fn app_count(&self) -> usize {
        self.state.lock().unwrap().apps.len()
    }

    fn developer_key(email: &str) -> String {
        email.to_ascii_lowercase()
    }
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn list_kvms(&self, environment: &str) -> Result<Vec<String>> {
        let state = self.record(Call::ListKvms);
        Ok(state
            .kvms
            .keys()
            .filter(|(env, _)| env == environment)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn create_kvm(&self, environment: &str, name: &str, encrypted: bool) -> Result<()> {
        let mut state = self.record(Call::CreateKvm(name.to_string()));
        let key = (environment.to_string(), name.to_string());
        if state.kvms.contains_key(&key) {
            return Err(ClientError::Conflict(format!("map {name} already exists")));
        }
        state.kvms.insert(
            key,
            Kvm {
                encrypted,
                ..Kvm::default()
            },
        );
        Ok(())
    }

    async fn put_kvm_entry(
        &self,
        environment: &str,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.record(Call::PutEntry(map.to_string(), key.to_string()));
        let kvm = state
            .kvms
            .get_mut(&(environment.to_string(), map.to_string()))
            .ok_or_else(|| not_found(map))?;
        kvm.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_kvm_entry(
        &self,
        environment: &str,
        map: &str,
        key: &str,
    ) -> Result<KeyValueEntry> {
        let state = self.record(Call::GetEntry);
        state
            .kvms
            .get(&(environment.to_string(), map.to_string()))
            .and_then(|kvm| kvm.entries.get(key))
            .map(|value| KeyValueEntry {
                name: key.to_string(),
                value: value.clone(),
            })
            .ok_or_else(|| not_found(key))
    }

    async fn import_proxy(&self, name: &str, _bundle: Vec<u8>) -> Result<ImportedRevision> {
        let mut state = self.record(Call::ImportProxy);
        let revisions = state.proxy_revisions.get_or_insert_with(Vec::new);
        let revision = (revisions.len() + 1).to_string();
        revisions.push(revision.clone());
        Ok(ImportedRevision {
            name: name.to_string(),
            revision,
        })
    }

    async fn deploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()> {
        let mut state = self.record(Call::DeployProxy(
            environment.to_string(),
            revision.to_string(),
        ));
        let known = state
            .proxy_revisions
            .as_ref()
            .is_some_and(|revs| revs.iter().any(|r| r == revision));
        if !known {
            return Err(not_found(&format!("{name} revision {revision}")));
        }
        state
            .deployed
            .insert(environment.to_string(), revision.to_string());
        Ok(())
    }

    async fn undeploy_proxy(&self, environment: &str, name: &str, revision: &str) -> Result<()> {
        let mut state = self.record(Call::UndeployProxy(
            environment.to_string(),
            revision.to_string(),
        ));
        if state.deployed.get(environment).map(String::as_str) != Some(revision) {
            return Err(not_found(&format!(
                "deployment of {name} revision {revision} in {environment}"
            )));
        }
        state.deployed.remove(environment);
        Ok(())
    }

    async fn get_proxy(&self, name: &str) -> Result<ApiProxy> {
        let state = self.record(Call::GetProxy);
        state
            .proxy_revisions
            .as_ref()
            .map(|revisions| ApiProxy {
                name: name.to_string(),
                revision: revisions.clone(),
            })
            .ok_or_else(|| not_found(name))
    }

    async fn get_proxy_deployments(&self, name: &str) -> Result<Deployments> {
        let state = self.record(Call::GetDeployments);
        if self.fail_deployments {
            return Err(ClientError::from_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "deployments unavailable".to_string(),
            ));
        }
        if state.proxy_revisions.is_none() {
            return Err(not_found(name));
        }
        Ok(Deployments {
            name: Some(name.to_string()),
            environment: state
                .deployed
                .iter()
                .map(|(env, rev)| EnvironmentDeployment {
                    name: env.clone(),
                    revision: vec![RevisionRef {
                        name: rev.clone(),
                        state: Some("deployed".to_string()),
                    }],
                })
                .collect(),
        })
    }

    async fn delete_proxy(&self, name: &str) -> Result<()> {
        let mut state = self.record(Call::DeleteProxy);
        if state.proxy_revisions.is_none() {
            return Err(not_found(name));
        }
        if !state.deployed.is_empty() {
            return Err(ClientError::from_status(
                StatusCode::BAD_REQUEST,
                format!("proxy {name} has deployed revisions"),
            ));
        }
        state.proxy_revisions = None;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let state = self.record(Call::ListProducts);
        Ok(state.products.keys().cloned().collect())
    }

    async fn create_product(&self, product: &NewApiProduct) -> Result<ApiProduct> {
        let mut state = self.record(Call::CreateProduct(product.name.clone()));
        if state.products.contains_key(&product.name) {
            return Err(ClientError::Conflict(format!(
                "product {} already exists",
                product.name
            )));
        }
        let created = ApiProduct {
            name: product.name.clone(),
            display_name: Some(product.display_name.clone()),
            description: Some(product.description.clone()),
            proxies: product.proxies.clone(),
            environments: product.environments.clone(),
            approval_type: Some(product.approval_type.clone()),
            attributes: product.attributes.clone(),
        };
        state.products.insert(product.name.clone(), created.clone());
        Ok(created)
    }

    async fn delete_product(&self, name: &str) -> Result<()> {
        let mut state = self.record(Call::DeleteProduct);
        state
            .products
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    async fn list_developers(&self) -> Result<Vec<String>> {
        let state = self.record(Call::ListDevelopers);
        Ok(state.developers.values().map(|d| d.email.clone()).collect())
    }

    async fn create_developer(&self, developer: &NewDeveloper) -> Result<Developer> {
        let mut state = self.record(Call::CreateDeveloper);
        let key = Self::developer_key(&developer.email);
        if state.developers.contains_key(&key) {
            return Err(ClientError::Conflict(format!(
                "developer {} already exists",
                developer.email
            )));
        }
        let email = if self.lowercase_emails {
            key.clone()
        } else {
            developer.email.clone()
        };
        let created = Developer {
            email,
            developer_id: Some(format!("dev-{}", state.developers.len() + 1)),
            first_name: Some(developer.first_name.clone()),
            last_name: Some(developer.last_name.clone()),
            user_name: Some(developer.user_name.clone()),
            status: Some("active".to_string()),
            attributes: developer.attributes.clone(),
        };
        state.developers.insert(key, created.clone());
        Ok(created)
    }

    async fn delete_developer(&self, email: &str) -> Result<()> {
        let mut state = self.record(Call::DeleteDeveloper);
        let key = Self::developer_key(email);
        if state.developers.remove(&key).is_none() {
            return Err(not_found(email));
        }
        state.apps.retain(|(developer, _), _| *developer != key);
        Ok(())
    }

    async fn list_developer_apps(&self, developer_email: &str) -> Result<Vec<String>> {
        let state = self.record(Call::ListApps);
        let key = Self::developer_key(developer_email);
        if !state.developers.contains_key(&key) {
            return Err(not_found(developer_email));
        }
        Ok(state
            .apps
            .keys()
            .filter(|(developer, _)| *developer == key)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn get_developer_app(&self, developer_email: &str, name: &str) -> Result<DeveloperApp> {
        let state = self.record(Call::GetApp(name.to_string()));
        state
            .apps
            .get(&(Self::developer_key(developer_email), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn create_developer_app(
        &self,
        developer_email: &str,
        app: &NewDeveloperApp,
    ) -> Result<DeveloperApp> {
        let mut state = self.record(Call::CreateApp(app.name.clone()));
        let developer = Self::developer_key(developer_email);
        if !state.developers.contains_key(&developer) {
            return Err(not_found(developer_email));
        }
        if let Some(missing) = app
            .api_products
            .iter()
            .find(|p| !state.products.contains_key(*p))
        {
            return Err(not_found(missing));
        }
        let key = (developer, app.name.clone());
        if state.apps.contains_key(&key) {
            return Err(ClientError::Conflict(format!(
                "app {} already exists",
                app.name
            )));
        }

        let mut credentials = SmallVec::new();
        if !self.no_credentials {
            state.keys_issued += 1;
            credentials.push(AppCredential {
                consumer_key: format!("key-{}", state.keys_issued),
                consumer_secret: Some(format!("secret-{}", state.keys_issued)),
                status: Some("approved".to_string()),
                expires_at: app.key_expires_in,
                api_products: app
                    .api_products
                    .iter()
                    .map(|p| CredentialProduct {
                        apiproduct: p.clone(),
                        status: Some("approved".to_string()),
                    })
                    .collect(),
            });
        }
        let created = DeveloperApp {
            name: app.name.clone(),
            app_id: Some(format!("app-{}", state.apps.len() + 1)),
            developer_id: state.developers.get(&key.0).and_then(|d| d.developer_id.clone()),
            status: Some("approved".to_string()),
            attributes: app.attributes.clone(),
            credentials,
        };
        state.apps.insert(key, created.clone());
        Ok(created)
    }

    async fn delete_developer_app(&self, developer_email: &str, name: &str) -> Result<()> {
        let mut state = self.record(Call::DeleteApp(name.to_string()));
        state
            .apps
            .remove(&(Self::developer_key(developer_email), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }
}

/// Connector handing out a shared [`MockManagementApi`].
#[derive(Debug, Default)]
pub struct MockConnector {
    pub api: Arc<MockManagementApi>,
    connects: AtomicUsize,
    reject: bool,
}

impl MockConnector {
    pub fn new(api: Arc<MockManagementApi>) -> Self {
        Self {
            api,
            ..Self::default()
        }
    }

    /// Fails every connect attempt with an authentication error.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _settings: ConnectionSettings) -> Result<Arc<dyn ManagementApi>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(ClientError::AuthenticationError(
                "invalid credentials".to_string(),
            ));
        }
        let api: Arc<dyn ManagementApi> = self.api.clone();
        Ok(api)
    }
}

/// Writes a minimal proxy bundle under `dir`.
pub fn write_bundle(dir: &Path) {
    let proxies = dir.join("apiproxy").join("proxies");
    fs::create_dir_all(&proxies).unwrap();
    fs::write(
        dir.join("apiproxy").join("response-shaping.xml"),
        "<APIProxy name=\"response-shaping\"/>",
    )
    .unwrap();
    fs::write(
        proxies.join("default.xml"),
        "<ProxyEndpoint name=\"default\"/>",
    )
    .unwrap();
}
