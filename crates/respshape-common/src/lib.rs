//! # respshape-common
//!
//! Shared types for provisioning the response-shaping demo against the Apigee
//! Edge management API.
//!
//! This crate provides:
//! - The resolved run configuration and connection settings
//! - Fixed discriminators (proxy, product, developer and app names) and the
//!   response-filter strings attached to products and apps
//! - Serializable shapes for the remote entities (products, developers,
//!   developer apps, deployments)
//!
//! ## Example
//!
//! ```
//! use respshape_common::discriminators::{self, developer_app_name};
//!
//! assert_eq!(developer_app_name(1), "Response-Shaping-App-1");
//! assert_eq!(discriminators::PROXY, "response-shaping");
//! ```

/// Run configuration and connection settings.
///
/// Built once at startup by the option resolver and never mutated afterwards.
pub mod config;
/// Fixed names, descriptions and response filters for the demo assets.
pub mod discriminators;
/// Remote entity records and creation payloads.
pub mod entities;

pub use config::{Auth, ConnectionSettings, HttpSettings, ProvisionConfig, UpstreamCredentials};
pub use entities::{
    ApiProduct, ApiProxy, AppCredential, Attribute, CredentialProduct, Deployments, Developer,
    DeveloperApp, EnvironmentDeployment, ImportedRevision, KeyValueEntry, NewApiProduct,
    NewDeveloper, NewDeveloperApp, RevisionRef, attribute,
};
