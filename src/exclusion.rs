use std::collections::BTreeSet;

use serde::Deserialize;

/// Resource types and user roles that bypass filtering.
///
/// Empty sets mean nothing is excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExclusionRules {
    /// Requested resource types (host components) that are never filtered.
    #[serde(alias = "component_exclude")]
    pub excluded_resource_types: BTreeSet<String>,
    /// Roles whose members are never filtered.
    #[serde(alias = "role_exclude")]
    pub excluded_roles: BTreeSet<String>,
}

impl ExclusionRules {
    /// Creates rules from any iterables of resource types and roles.
    pub fn new<R, G>(resource_types: R, roles: G) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            excluded_resource_types: resource_types.into_iter().map(Into::into).collect(),
            excluded_roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` when neither set has entries.
    pub fn is_empty(&self) -> bool {
        self.excluded_resource_types.is_empty() && self.excluded_roles.is_empty()
    }
}

/// Decides whether a request bypasses the reputation check.
///
/// True iff `resource_type` is an excluded resource type, or the user holds
/// at least one excluded role. Decided by set membership only.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use admission_gate::{is_excluded, ExclusionRules};
///
/// let rules = ExclusionRules::new(["com_ajax"], ["8"]);
/// let roles: BTreeSet<String> = ["2".to_string(), "8".to_string()].into();
///
/// assert!(is_excluded("com_content", &roles, &rules));
/// assert!(is_excluded("com_ajax", &BTreeSet::new(), &rules));
/// assert!(!is_excluded("com_content", &BTreeSet::new(), &rules));
/// ```
pub fn is_excluded(
    resource_type: &str,
    user_roles: &BTreeSet<String>,
    rules: &ExclusionRules,
) -> bool {
    if rules.excluded_resource_types.contains(resource_type) {
        return true;
    }

    !rules.excluded_roles.is_disjoint(user_roles)
}
