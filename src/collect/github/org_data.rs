//! Collected GitHub organization data
//!
//! Minimal serde models with only the fields downstream posture checks need;
//! field names match the GitHub API exactly.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

/// One entry from the authenticated user's organization membership listing.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgMembership {
    pub role: Role,
    pub organization: Organization,
}

/// The credential's role on an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
    BillingManager,
    #[serde(other)]
    Unknown,
}

/// A GitHub organization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Organization {
    pub login: CompactString,
    pub id: u64,
    pub html_url: String,
}

/// Webhook configuration as returned by the hooks listing endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Webhook {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: WebhookConfig,
}

/// Delivery settings of a webhook.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub insecure_ssl: Option<String>,
}

/// An organization plus the enrichment gathered by its sub-collections.
///
/// Enrichment fields are `None` when the corresponding sub-collection failed;
/// the failure itself is recorded either as a permission finding or on the
/// run's error channel.
#[derive(Debug, Clone, Serialize)]
pub struct OrgInventory {
    pub organization: Organization,

    /// The credential's role on the organization.
    pub role: Role,

    /// Whether a SAML identity provider is configured.
    pub saml_enabled: Option<bool>,

    /// The organization's webhooks.
    pub hooks: Option<Vec<Webhook>>,
}
