//! Create-if-absent provisioning of products, developers and developer apps.
//!
//! [`ensure_entity`] is the single routine behind all three kinds: list the
//! collection, look for the discriminator name, and either reuse or create.
//!
//! App creation references the product and developer by name, so they must
//! exist first. [`EntityProvisioner`] encodes that order in its type: an app can
//! only be ensured from the state reached after the developer, and the developer
//! only from the state reached after the product.
//!
//! # Examples
//!
//! ```no_run
//! use respshape::provisioner::{CreationContext, EntityProvisioner};
//! use respshape_client::ManagementApi;
//!
//! # async fn example(api: &dyn ManagementApi) -> respshape::error::Result<()> {
//! let ctx = CreationContext::new("test", "created today");
//! let (provisioner, _product) = EntityProvisioner::new(api, ctx).ensure_product().await?;
//! let (provisioner, _developer) = provisioner.ensure_developer().await?;
//! let app = provisioner.ensure_app(1).await?;
//! println!("{}", app.name);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;

use log::{debug, info};
use respshape_client::ManagementApi;
use respshape_common::discriminators::{
    self, APP_DESCRIPTION, DEVELOPER, DEVELOPER_FIRST_NAME, DEVELOPER_LAST_NAME,
    DEVELOPER_USER_NAME, PRODUCT, PRODUCT_DESCRIPTION, PRODUCT_RESPONSE_FILTER, PROXY,
};
use respshape_common::{
    ApiProduct, Attribute, Developer, DeveloperApp, NewApiProduct, NewDeveloper, NewDeveloperApp,
};

use crate::error::{ProvisionError, Result};

/// The entity kinds the provisioner manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Developer,
    /// Developer app `n` (1-based).
    DeveloperApp(u8),
}

impl EntityKind {
    /// The discriminator name this kind resolves to.
    #[must_use]
    pub fn item_name(self) -> String {
        match self {
            Self::Product => PRODUCT.to_string(),
            Self::Developer => DEVELOPER.to_string(),
            Self::DeveloperApp(index) => discriminators::developer_app_name(index),
        }
    }

    /// Whether `listed` names the same entity as `name`.
    ///
    /// Edge stores developer emails lowercased, so those compare without case.
    fn matches(self, listed: &str, name: &str) -> bool {
        match self {
            Self::Developer => listed.eq_ignore_ascii_case(name),
            Self::Product | Self::DeveloperApp(_) => listed == name,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Developer => write!(f, "developer"),
            Self::DeveloperApp(index) => write!(f, "developer app {index}"),
        }
    }
}

/// What [`ensure_entity`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    /// A product or developer that was already listed; the listing is returned
    /// as-is and the record is not fetched.
    AlreadyPresent { kind: EntityKind, listing: Vec<String> },
    Product(ApiProduct),
    Developer(Developer),
    /// A created or re-fetched app, always with its full credential list.
    DeveloperApp(DeveloperApp),
}

impl Provisioned {
    /// Whether this run created the entity.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        match self {
            Self::AlreadyPresent { .. } => false,
            Self::Product(_) | Self::Developer(_) => true,
            // apps are re-fetched when present, so the record alone can't tell
            Self::DeveloperApp(_) => false,
        }
    }

    /// Unwraps an app record.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnexpectedRecord`] for any other variant.
    pub fn into_developer_app(self) -> Result<DeveloperApp> {
        match self {
            Self::DeveloperApp(app) => Ok(app),
            other => Err(ProvisionError::UnexpectedRecord(format!(
                "expected a developer app, got {other:?}"
            ))),
        }
    }
}

/// Inputs shared by every creation payload.
#[derive(Debug, Clone)]
pub struct CreationContext {
    environment: String,
    note: String,
}

impl CreationContext {
    #[must_use]
    pub fn new(environment: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            note: note.into(),
        }
    }

    fn product(&self) -> NewApiProduct {
        NewApiProduct::builder()
            .name(PRODUCT)
            .display_name(PRODUCT)
            .description(PRODUCT_DESCRIPTION)
            .approval_type("auto")
            .proxies(vec![PROXY.to_string()])
            .environments(vec![self.environment.clone()])
            .attributes(vec![
                Attribute::new("access", "public"),
                Attribute::new("note", &self.note),
                Attribute::new("response_filter", PRODUCT_RESPONSE_FILTER),
            ])
            .build()
    }

    fn developer(&self) -> NewDeveloper {
        NewDeveloper::builder()
            .email(DEVELOPER)
            .first_name(DEVELOPER_FIRST_NAME)
            .last_name(DEVELOPER_LAST_NAME)
            .user_name(DEVELOPER_USER_NAME)
            .attributes(vec![Attribute::new("note", &self.note)])
            .build()
    }

    fn developer_app(&self, index: u8) -> Result<NewDeveloperApp> {
        let filter =
            discriminators::app_response_filter(index).ok_or(ProvisionError::UnknownApp(index))?;
        Ok(NewDeveloperApp::builder()
            .name(discriminators::developer_app_name(index))
            .api_products(vec![PRODUCT.to_string()])
            .key_expires_in(discriminators::app_key_expiry_millis())
            .attributes(vec![
                Attribute::new("access", "public"),
                Attribute::new("note", &self.note),
                Attribute::new("Notes", APP_DESCRIPTION),
                Attribute::new("response_filter", filter),
            ])
            .build())
    }
}

/// Lists the collection for `kind` and creates the entity if its name is absent.
///
/// Apps found in the listing are re-fetched because only the full record
/// carries the consumer key.
///
/// # Errors
///
/// Returns [`ProvisionError::UnknownApp`] for an app index without a response
/// filter, before anything is sent; otherwise the first failed remote call.
pub async fn ensure_entity(
    api: &dyn ManagementApi,
    kind: EntityKind,
    ctx: &CreationContext,
) -> Result<Provisioned> {
    if let EntityKind::DeveloperApp(index) = kind
        && discriminators::app_response_filter(index).is_none()
    {
        return Err(ProvisionError::UnknownApp(index));
    }

    let listing = match kind {
        EntityKind::Product => api.list_products().await?,
        EntityKind::Developer => api.list_developers().await?,
        EntityKind::DeveloperApp(_) => api.list_developer_apps(DEVELOPER).await?,
    };

    let name = kind.item_name();
    if listing.iter().any(|listed| kind.matches(listed, &name)) {
        debug!("{kind} {name} already exists");
        return match kind {
            EntityKind::DeveloperApp(_) => Ok(Provisioned::DeveloperApp(
                api.get_developer_app(DEVELOPER, &name).await?,
            )),
            EntityKind::Product | EntityKind::Developer => {
                Ok(Provisioned::AlreadyPresent { kind, listing })
            }
        };
    }

    info!("Creating {kind} {name}");
    Ok(match kind {
        EntityKind::Product => Provisioned::Product(api.create_product(&ctx.product()).await?),
        EntityKind::Developer => {
            Provisioned::Developer(api.create_developer(&ctx.developer()).await?)
        }
        EntityKind::DeveloperApp(index) => Provisioned::DeveloperApp(
            api.create_developer_app(DEVELOPER, &ctx.developer_app(index)?)
                .await?,
        ),
    })
}

/// Type-state marker types for the provisioning order.
pub mod states {
    /// Nothing ensured yet.
    pub struct Start;
    /// The product exists.
    pub struct ProductReady;
    /// The product and the developer exist.
    pub struct DeveloperReady;
}

/// Provisions product, developer and apps in dependency order.
pub struct EntityProvisioner<'a, State> {
    api: &'a dyn ManagementApi,
    ctx: CreationContext,
    _state: PhantomData<State>,
}

impl<'a, State> EntityProvisioner<'a, State> {
    fn transition<Next>(self) -> EntityProvisioner<'a, Next> {
        EntityProvisioner {
            api: self.api,
            ctx: self.ctx,
            _state: PhantomData,
        }
    }
}

impl<'a> EntityProvisioner<'a, states::Start> {
    #[must_use]
    pub fn new(api: &'a dyn ManagementApi, ctx: CreationContext) -> Self {
        Self {
            api,
            ctx,
            _state: PhantomData,
        }
    }

    /// Ensures the product.
    ///
    /// # Errors
    ///
    /// Returns any remote failure.
    pub async fn ensure_product(
        self,
    ) -> Result<(EntityProvisioner<'a, states::ProductReady>, Provisioned)> {
        let product = ensure_entity(self.api, EntityKind::Product, &self.ctx).await?;
        Ok((self.transition(), product))
    }
}

impl<'a> EntityProvisioner<'a, states::ProductReady> {
    /// Ensures the developer.
    ///
    /// # Errors
    ///
    /// Returns any remote failure.
    pub async fn ensure_developer(
        self,
    ) -> Result<(EntityProvisioner<'a, states::DeveloperReady>, Provisioned)> {
        let developer = ensure_entity(self.api, EntityKind::Developer, &self.ctx).await?;
        Ok((self.transition(), developer))
    }
}

impl EntityProvisioner<'_, states::DeveloperReady> {
    /// Ensures developer app `index` and returns its full record.
    ///
    /// # Errors
    ///
    /// Returns any remote failure or [`ProvisionError::UnknownApp`].
    pub async fn ensure_app(&self, index: u8) -> Result<DeveloperApp> {
        ensure_entity(self.api, EntityKind::DeveloperApp(index), &self.ctx)
            .await?
            .into_developer_app()
    }
}

/// Consumer key of the app's first credential.
///
/// # Errors
///
/// Returns [`ProvisionError::MissingCredential`] if the app has none.
pub fn consumer_key(app: &DeveloperApp) -> Result<&str> {
    app.consumer_key()
        .ok_or_else(|| ProvisionError::MissingCredential {
            app: app.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use respshape_common::attribute;

    use super::*;
    use crate::testing::{Call, MockManagementApi};

    fn ctx() -> CreationContext {
        CreationContext::new("test", "created now for Response-Shaping Example")
    }

    #[tokio::test]
    async fn test_creates_product_with_filter() {
        let api = MockManagementApi::new();

        let result = ensure_entity(&api, EntityKind::Product, &ctx()).await.unwrap();
        assert!(result.was_created());

        let Provisioned::Product(product) = result else {
            unreachable!("expected a product");
        };
        assert_eq!(product.name, PRODUCT);
        assert_eq!(product.proxies, vec![PROXY.to_string()]);
        assert_eq!(product.environments, vec!["test".to_string()]);
        assert_eq!(product.approval_type.as_deref(), Some("auto"));
        assert_eq!(
            attribute(&product.attributes, "response_filter"),
            Some(PRODUCT_RESPONSE_FILTER)
        );
    }

    #[tokio::test]
    async fn test_existing_product_returns_listing() {
        let api = MockManagementApi::new();
        ensure_entity(&api, EntityKind::Product, &ctx()).await.unwrap();

        let again = ensure_entity(&api, EntityKind::Product, &ctx()).await.unwrap();
        assert_eq!(
            again,
            Provisioned::AlreadyPresent {
                kind: EntityKind::Product,
                listing: vec![PRODUCT.to_string()],
            }
        );
        assert_eq!(api.product_count(), 1);
    }

    #[tokio::test]
    async fn test_developer_listing_is_case_insensitive() {
        let api = MockManagementApi::new().with_lowercased_developer_emails();
        ensure_entity(&api, EntityKind::Developer, &ctx()).await.unwrap();

        let again = ensure_entity(&api, EntityKind::Developer, &ctx()).await.unwrap();
        assert!(!again.was_created());
        assert_eq!(api.developer_count(), 1);
    }

    #[tokio::test]
    async fn test_existing_app_is_refetched() {
        let api = MockManagementApi::new();
        let provisioner = EntityProvisioner::new(&api, ctx());
        let (provisioner, _) = provisioner.ensure_product().await.unwrap();
        let (provisioner, _) = provisioner.ensure_developer().await.unwrap();

        let created = provisioner.ensure_app(1).await.unwrap();
        let refetched = provisioner.ensure_app(1).await.unwrap();

        assert_eq!(created, refetched);
        assert_eq!(consumer_key(&refetched).unwrap(), "key-1");
        assert!(api.calls().ends_with(&[
            Call::ListApps,
            Call::GetApp("Response-Shaping-App-1".to_string()),
        ]));
        assert_eq!(
            attribute(&created.attributes, "response_filter"),
            discriminators::app_response_filter(1)
        );
    }

    #[tokio::test]
    async fn test_unknown_app_index() {
        let api = MockManagementApi::new();
        let err = ensure_entity(&api, EntityKind::DeveloperApp(3), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownApp(3)));
        assert!(api.calls().is_empty());

        let err = ensure_entity(&api, EntityKind::DeveloperApp(0), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownApp(0)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_app_without_credentials() {
        let api = MockManagementApi::new().without_app_credentials();
        let (p, _) = EntityProvisioner::new(&api, ctx())
            .ensure_product()
            .await
            .unwrap();
        let (p, _) = p.ensure_developer().await.unwrap();

        let app = p.ensure_app(2).await.unwrap();
        let err = consumer_key(&app).unwrap_err();
        assert!(
            matches!(err, ProvisionError::MissingCredential { ref app } if app == "Response-Shaping-App-2")
        );
    }

    #[tokio::test]
    async fn test_app_before_developer_is_rejected_remotely() {
        // The type-state API cannot express this order; the raw routine shows
        // what the remote side does with it.
        let api = MockManagementApi::new();
        let err = ensure_entity(&api, EntityKind::DeveloperApp(1), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Client(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_item_names() {
        assert_eq!(EntityKind::Product.item_name(), PRODUCT);
        assert_eq!(EntityKind::Developer.item_name(), DEVELOPER);
        assert_eq!(
            EntityKind::DeveloperApp(2).item_name(),
            "Response-Shaping-App-2"
        );
        assert_eq!(EntityKind::DeveloperApp(2).to_string(), "developer app 2");
    }
}
