//! GitHub platform collectors.

mod client;
mod org_data;
mod organization;

pub use client::Client;
pub use org_data::{OrgInventory, OrgMembership, Organization, Role, Webhook, WebhookConfig};
pub use organization::OrganizationCollector;
