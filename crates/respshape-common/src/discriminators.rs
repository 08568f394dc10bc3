//! Fixed identifiers for the demo assets.
//!
//! Every provisioning and reset run addresses remote entities by these names,
//! so they must stay stable across releases.

use chrono::{DateTime, Utc};

/// Name of the API proxy imported from the bundle.
pub const PROXY: &str = "response-shaping";

/// Name of the API product.
pub const PRODUCT: &str = "Response-Shaping-Example-Product";

/// Email (and identity) of the demo developer.
pub const DEVELOPER: &str = "Response-Shaping-Developer@example.com";

/// Prefix of the developer app names; app `n` is named `{prefix}{n}`.
pub const DEVELOPER_APP_PREFIX: &str = "Response-Shaping-App-";

/// Number of developer apps provisioned.
pub const DEVELOPER_APP_COUNT: u8 = 2;

pub const PRODUCT_DESCRIPTION: &str = "Test Product for Response Shaping Example";
pub const APP_DESCRIPTION: &str = "Test App for Response Shaping Example";

pub const DEVELOPER_FIRST_NAME: &str = "Response-Shaping-Example";
pub const DEVELOPER_LAST_NAME: &str = "Developer";
pub const DEVELOPER_USER_NAME: &str = "Response-Shaping-Example-Developer";

/// Lifetime of the app credentials, in days.
pub const APP_KEY_EXPIRY_DAYS: i64 = 210;

/// Key-value map entry holding the upstream client id.
pub const SECRET_CLIENT_ID_KEY: &str = "amadeus_test_client_id";

/// Key-value map entry holding the upstream client secret.
pub const SECRET_CLIENT_SECRET_KEY: &str = "amadeus_test_client_secret";

/// Response filter attached to the product.
pub const PRODUCT_RESPONSE_FILTER: &str =
    "include:data.name,data.iataCode,data.address.cityName,data.address.stateCode";

/// Response filters attached to app 1 and app 2, in that order.
pub const APP_RESPONSE_FILTERS: [&str; DEVELOPER_APP_COUNT as usize] = [
    "include:data.type,data.id,data.self.href,data.iataCode,data.name",
    "exclude:meta,data.type,data.address,data.self,data.detailedName,data.analytics",
];

/// Name of developer app `index` (1-based).
#[must_use]
pub fn developer_app_name(index: u8) -> String {
    format!("{DEVELOPER_APP_PREFIX}{index}")
}

/// Response filter for developer app `index` (1-based).
///
/// Returns `None` for indices outside `1..=DEVELOPER_APP_COUNT`.
#[must_use]
pub fn app_response_filter(index: u8) -> Option<&'static str> {
    usize::from(index)
        .checked_sub(1)
        .and_then(|i| APP_RESPONSE_FILTERS.get(i))
        .copied()
}

/// App credential lifetime in milliseconds, as the `keyExpiresIn` field wants it.
#[must_use]
pub fn app_key_expiry_millis() -> i64 {
    chrono::Duration::days(APP_KEY_EXPIRY_DAYS).num_milliseconds()
}

/// The `note` attribute stamped on every created entity.
#[must_use]
pub fn creation_note(at: DateTime<Utc>) -> String {
    format!(
        "created {} for Response-Shaping Example",
        at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    )
}
