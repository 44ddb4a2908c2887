//! Organization inventory collection.

use super::client::Client;
use super::org_data::{OrgInventory, OrgMembership, Webhook};
use crate::collect::api::ApiResult;
use crate::collect::cancel::CancelFlag;
use crate::collect::collector::Collector;
use crate::collect::group_waiter::GroupWaiter;
use crate::collect::pagination::{PageResult, paginate};
use crate::collect::permissions::{MissingPermission, Namespace, Permission};
use crate::collect::progress::Progress;
use crate::collect::session::{CollectionChannels, Session, wrapped_collection};
use compact_str::CompactString;
use serde::Deserialize;
use std::sync::Arc;

const LOG_TARGET: &str = "github";
const PAGE_SIZE: u8 = 100;

/// Identity-provider lookup; first: 1 is enough to learn whether any
/// external identities exist.
const ORG_SAML_QUERY: &str =
    "query($login: String!) { organization(login: $login) { samlIdentityProvider { externalIdentities(first: 1) { totalCount } } } }";

#[derive(Debug, Deserialize)]
struct SamlData {
    organization: Option<SamlOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamlOrganization {
    saml_identity_provider: Option<SamlIdentityProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamlIdentityProvider {
    external_identities: ExternalIdentities,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalIdentities {
    total_count: i64,
}

/// Whether the queried organization has a SAML identity provider with at
/// least one linked identity. A missing provider means SAML is not enabled.
fn saml_enabled_from(data: SamlData) -> bool {
    data.organization
        .and_then(|org| org.saml_identity_provider)
        .is_some_and(|provider| provider.external_identities.total_count > 0)
}

/// Collects the organizations visible to the credential in use, enriched
/// with webhook configuration and identity-provider status.
///
/// Discovery walks the authenticated user's membership listing; each
/// discovered organization then gets its own concurrent task performing the
/// two sub-collections. Cloning is cheap, all state is shared handles.
#[derive(Clone)]
pub struct OrganizationCollector {
    client: Client,
    reporter: Arc<dyn Progress>,
    cancel: Arc<CancelFlag>,
}

impl core::fmt::Debug for OrganizationCollector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrganizationCollector")
            .field("client", &self.client)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl OrganizationCollector {
    /// Create a new collector over the given client.
    pub fn new(client: Client, reporter: Arc<dyn Progress>, cancel: Arc<CancelFlag>) -> Self {
        Self { client, reporter, cancel }
    }

    /// Enumerate all organizations the credential is an active member of.
    async fn discover(&self) -> PageResult<OrgMembership> {
        let client = self.client.clone();
        let cancel = Arc::clone(&self.cancel);
        let first = format!("{}/user/memberships/orgs?state=active&per_page={PAGE_SIZE}", client.base_url());

        paginate(None, move |cursor| {
            let client = client.clone();
            let cancel = Arc::clone(&cancel);
            let first = first.clone();
            async move {
                if cancel.is_cancelled() {
                    return ApiResult::Failed(cancel.as_error());
                }

                let url = cursor.map_or(first, Into::into);
                client.get_page::<OrgMembership>(&url).await
            }
        })
        .await
    }

    /// Run both per-organization sub-collections and assemble the enriched
    /// entity. Sub-collection failures leave their field absent.
    async fn collect_extra_data(&self, session: &Session<OrgInventory>, membership: OrgMembership) -> OrgInventory {
        let OrgMembership { role, organization } = membership;
        let login = organization.login.clone();

        let (saml_enabled, hooks) = tokio::join!(
            self.collect_saml_enabled(session, &login),
            self.collect_webhooks(session, &login)
        );

        OrgInventory {
            organization,
            role,
            saml_enabled,
            hooks,
        }
    }

    async fn collect_webhooks(&self, session: &Session<OrgInventory>, org: &CompactString) -> Option<Vec<Webhook>> {
        let client = self.client.clone();
        let cancel = Arc::clone(&self.cancel);
        let first = format!("{}/orgs/{org}/hooks?per_page={PAGE_SIZE}", client.base_url());

        let result = paginate(None, move |cursor| {
            let client = client.clone();
            let cancel = Arc::clone(&cancel);
            let first = first.clone();
            async move {
                if cancel.is_cancelled() {
                    return ApiResult::Failed(cancel.as_error());
                }

                let url = cursor.map_or(first, Into::into);
                client.get_page::<Webhook>(&url).await
            }
        })
        .await;

        match result.failure {
            None => Some(result.collected),
            Some(failure) if failure.is_missing_access() => {
                session.issue_missing_permissions(MissingPermission::new(
                    Permission::OrgHookAdmin,
                    org.as_str(),
                    "cannot read organization webhooks",
                    Namespace::Organization,
                ));
                None
            }
            Some(failure) => {
                session.report_sub_failure(org.as_str(), "webhooks", failure.into_error());
                None
            }
        }
    }

    async fn collect_saml_enabled(&self, session: &Session<OrgInventory>, org: &CompactString) -> Option<bool> {
        if self.cancel.is_cancelled() {
            session.report_sub_failure(org.as_str(), "identity provider", self.cancel.as_error());
            return None;
        }

        // Query and variables are built per call; fan-out tasks share no
        // request state.
        let variables = serde_json::json!({ "login": org.as_str() });

        match self.client.graphql::<_, SamlData>(ORG_SAML_QUERY, variables).await {
            ApiResult::Success(data) => Some(saml_enabled_from(data)),
            ApiResult::MissingAccess(_) => {
                session.issue_missing_permissions(MissingPermission::new(
                    Permission::OrgAdmin,
                    org.as_str(),
                    "cannot read identity-provider configuration",
                    Namespace::Organization,
                ));
                None
            }
            ApiResult::Failed(e) => {
                session.report_sub_failure(org.as_str(), "identity provider", e);
                None
            }
        }
    }
}

impl Collector for OrganizationCollector {
    type Output = OrgInventory;

    fn namespace(&self) -> Namespace {
        Namespace::Organization
    }

    async fn collect_total_entities(&self) -> u64 {
        let discovered = self.discover().await;

        if let Some(failure) = discovered.failure {
            log::warn!(target: LOG_TARGET, "failed to estimate organization count: {:#}", failure.into_error());
            return 0;
        }

        discovered.collected.len() as u64
    }

    fn collect(&self) -> CollectionChannels<OrgInventory> {
        let this = self.clone();

        wrapped_collection(Namespace::Organization, Arc::clone(&self.reporter), move |session| async move {
            session.set_phase("Discovering");
            let discovered = this.discover().await;

            if let Some(failure) = discovered.failure {
                session.report_discovery_failure(failure.into_error());
                return;
            }

            session.set_total(discovered.collected.len() as u64);
            session.set_phase("Collecting");

            let mut gw = GroupWaiter::new();
            for membership in discovered.collected {
                let this = this.clone();
                let session = Arc::clone(&session);
                gw.spawn(async move {
                    let inventory = this.collect_extra_data(&session, membership).await;
                    let url = inventory.organization.html_url.clone();
                    let role = inventory.role.to_string().into();
                    session.collect_data(inventory, url, vec![role]);
                    session.change_by_one();
                });
            }
            gw.wait().await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SamlData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn saml_enabled_when_identities_exist() {
        let data = parse(r#"{"organization": {"samlIdentityProvider": {"externalIdentities": {"totalCount": 12}}}}"#);
        assert!(saml_enabled_from(data));
    }

    #[test]
    fn saml_disabled_when_no_identities() {
        let data = parse(r#"{"organization": {"samlIdentityProvider": {"externalIdentities": {"totalCount": 0}}}}"#);
        assert!(!saml_enabled_from(data));
    }

    #[test]
    fn saml_disabled_when_no_provider() {
        let data = parse(r#"{"organization": {"samlIdentityProvider": null}}"#);
        assert!(!saml_enabled_from(data));
    }

    #[test]
    fn saml_disabled_when_organization_missing() {
        let data = parse(r#"{"organization": null}"#);
        assert!(!saml_enabled_from(data));
    }
}
