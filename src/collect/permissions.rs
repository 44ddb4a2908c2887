//! Permission gap findings.

use compact_str::CompactString;
use serde::Serialize;
use strum::Display;

/// Namespace kinds an inventoried entity can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Organization,
    Repository,
}

/// A named capability a credential may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Ability to administer (and therefore read) organization webhooks.
    #[strum(serialize = "organization hook admin")]
    OrgHookAdmin,

    /// Organization-level administration, required for identity-provider
    /// configuration.
    #[strum(serialize = "organization admin")]
    OrgAdmin,

    /// Ability to administer repository webhooks.
    #[strum(serialize = "repository hook admin")]
    RepoHookAdmin,
}

/// A detected case where the credential in use lacks rights to read some
/// sub-resource.
///
/// This is a report of a gap observed during collection, never an
/// access-control mechanism: the affected field is simply absent on the
/// entity it was detected for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MissingPermission {
    /// The capability the credential lacks.
    pub permission: Permission,

    /// Identifier of the entity the capability was checked against.
    pub entity: CompactString,

    /// Human-readable explanation of what could not be read.
    pub explanation: CompactString,

    /// The namespace kind the capability applies to.
    pub namespace: Namespace,
}

impl MissingPermission {
    /// Create a new finding.
    pub fn new(
        permission: Permission,
        entity: impl Into<CompactString>,
        explanation: impl Into<CompactString>,
        namespace: Namespace,
    ) -> Self {
        Self {
            permission,
            entity: entity.into(),
            explanation: explanation.into(),
            namespace,
        }
    }
}

impl core::fmt::Display for MissingPermission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "missing '{}' permission for {} '{}': {}",
            self.permission, self.namespace, self.entity, self.explanation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_display_names() {
        assert_eq!(Permission::OrgHookAdmin.to_string(), "organization hook admin");
        assert_eq!(Permission::OrgAdmin.to_string(), "organization admin");
        assert_eq!(Permission::RepoHookAdmin.to_string(), "repository hook admin");
    }

    #[test]
    fn namespace_display_names() {
        assert_eq!(Namespace::Organization.to_string(), "organization");
        assert_eq!(Namespace::Repository.to_string(), "repository");
    }

    #[test]
    fn finding_display() {
        let finding = MissingPermission::new(
            Permission::OrgHookAdmin,
            "acme",
            "cannot read organization webhooks",
            Namespace::Organization,
        );

        assert_eq!(
            finding.to_string(),
            "missing 'organization hook admin' permission for organization 'acme': cannot read organization webhooks"
        );
    }

    #[test]
    fn identical_findings_are_equal() {
        let a = MissingPermission::new(Permission::OrgAdmin, "acme", "x", Namespace::Organization);
        let b = MissingPermission::new(Permission::OrgAdmin, "acme", "x", Namespace::Organization);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(b));
    }
}
