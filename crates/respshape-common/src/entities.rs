//! Remote entity records and creation payloads.
//!
//! Field names follow the Apigee Edge v1 management API (camelCase JSON).
//! Records are deserialized leniently: anything the tool does not rely on is
//! optional or defaulted.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use typed_builder::TypedBuilder;

/// A custom attribute as it travels on the wire: `{ "name": .., "value": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Looks up an attribute value by name.
#[must_use]
pub fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

/// An API product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub approval_type: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Payload for creating an API product.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct NewApiProduct {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub display_name: String,
    #[builder(setter(into))]
    pub description: String,
    #[builder(default = "auto".to_string(), setter(into))]
    pub approval_type: String,
    #[builder(default)]
    pub proxies: Vec<String>,
    #[builder(default)]
    pub environments: Vec<String>,
    #[builder(default)]
    pub api_resources: Vec<String>,
    #[builder(default)]
    pub attributes: Vec<Attribute>,
}

/// A developer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub email: String,
    #[serde(default)]
    pub developer_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Payload for creating a developer.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct NewDeveloper {
    #[builder(setter(into))]
    pub email: String,
    #[builder(setter(into))]
    pub first_name: String,
    #[builder(setter(into))]
    pub last_name: String,
    #[builder(setter(into))]
    pub user_name: String,
    #[builder(default)]
    pub attributes: Vec<Attribute>,
}

/// Product association of an app credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialProduct {
    pub apiproduct: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A consumer key/secret pair issued to a developer app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCredential {
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub api_products: Vec<CredentialProduct>,
}

/// A developer app record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperApp {
    pub name: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub developer_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub credentials: SmallVec<[AppCredential; 1]>,
}

impl DeveloperApp {
    /// Consumer key of the first credential, if the app has one.
    #[must_use]
    pub fn consumer_key(&self) -> Option<&str> {
        self.credentials.first().map(|c| c.consumer_key.as_str())
    }
}

/// Payload for creating a developer app.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct NewDeveloperApp {
    #[builder(setter(into))]
    pub name: String,
    #[builder(default)]
    pub api_products: Vec<String>,
    /// Credential lifetime in milliseconds.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_expires_in: Option<i64>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[builder(default)]
    pub attributes: Vec<Attribute>,
}

/// An API proxy definition and its revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiProxy {
    pub name: String,
    #[serde(default)]
    pub revision: Vec<String>,
}

/// Result of importing a proxy bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedRevision {
    pub name: String,
    /// Revision number assigned by the server. Edge reports it as a string.
    pub revision: String,
}

/// A deployed revision reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRef {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Deployment of a proxy within one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDeployment {
    pub name: String,
    #[serde(default)]
    pub revision: Vec<RevisionRef>,
}

/// Deployment status of a proxy across environments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployments {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub environment: Vec<EnvironmentDeployment>,
}

impl Deployments {
    /// The first listed `(environment, revision)` pair, if any.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &str)> {
        let env = self.environment.first()?;
        let rev = env.revision.first()?;
        Some((env.name.as_str(), rev.name.as_str()))
    }
}

/// A key-value map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueEntry {
    pub name: String,
    pub value: String,
}
