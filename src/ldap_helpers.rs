//! LDAP Helper Utilities
//!
//! The entry model returned by searches, plus the attribute names, filters and
//! attribute lists used by the PSO queries.

use ldap3::SearchEntry;
use std::collections::HashMap;

/// One directory object returned by a search.
///
/// Attributes are multi-valued; attribute names are matched case-insensitively
/// because Active Directory answers with canonical casing
/// (`msDS-MinimumPasswordLength`) regardless of how they were requested.
/// An entry may lack any attribute that was asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute insertion, appending to existing values.
    pub fn with_attr<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(name, values);
        self
    }

    pub fn insert<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attrs
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Values of an attribute, `None` if the attribute is absent.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// First value of an attribute (single-valued convenience access).
    pub fn get_optional_attr(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// First value parsed as `i64`; `None` if missing or not a number.
    pub fn get_optional_i64_attr(&self, name: &str) -> Option<i64> {
        self.get_optional_attr(name)
            .and_then(|v| v.trim().parse().ok())
    }

    /// All values of a multi-valued attribute, empty if missing.
    pub fn get_multi_attr(&self, name: &str) -> Vec<String> {
        self.values(name).map(<[String]>::to_vec).unwrap_or_default()
    }

    /// Check if attribute exists AND has at least one non-empty value
    pub fn has_values(&self, name: &str) -> bool {
        self.values(name)
            .map(|v| v.iter().any(|s| !s.is_empty()))
            .unwrap_or(false)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        let mut converted = DirectoryEntry::new(entry.dn);
        for (name, values) in entry.attrs {
            converted.insert(&name, values);
        }
        converted
    }
}

/// Attribute names used by the PSO queries
pub mod attrs {
    pub const SAM_ACCOUNT_NAME: &str = "sAMAccountName";
    pub const CN: &str = "cn";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";

    /// PSO in effect for a user after precedence resolution
    pub const RESULTANT_PSO: &str = "msDS-ResultantPSO";
    /// PSOs linked to a group
    pub const PSO_APPLIED: &str = "msDS-PSOApplied";

    pub const PSO_APPLIES_TO: &str = "msDS-PSOAppliesTo";
    pub const MINIMUM_PASSWORD_LENGTH: &str = "msDS-MinimumPasswordLength";
    pub const PASSWORD_HISTORY_LENGTH: &str = "msDS-PasswordHistoryLength";
    pub const LOCKOUT_THRESHOLD: &str = "msDS-LockoutThreshold";
    pub const LOCKOUT_OBSERVATION_WINDOW: &str = "msDS-LockoutObservationWindow";
    pub const LOCKOUT_DURATION: &str = "msDS-LockoutDuration";
    pub const PASSWORD_COMPLEXITY_ENABLED: &str = "msDS-PasswordComplexityEnabled";
    pub const MINIMUM_PASSWORD_AGE: &str = "msDS-MinimumPasswordAge";
    pub const MAXIMUM_PASSWORD_AGE: &str = "msDS-MaximumPasswordAge";
    pub const REVERSIBLE_ENCRYPTION_ENABLED: &str = "msDS-PasswordReversibleEncryptionEnabled";
    /// Lower value wins when several PSOs target the same principal
    pub const PASSWORD_SETTINGS_PRECEDENCE: &str = "msDS-PasswordSettingsPrecedence";
}

/// Object-class filters
pub mod filters {
    pub const ALL_USERS: &str = "(objectClass=user)";
    pub const ALL_GROUPS: &str = "(objectClass=group)";
    pub const PASSWORD_SETTINGS: &str = "(objectClass=msDS-PasswordSettings)";
}

/// Attribute lists requested by each query family
pub mod attr_lists {
    use super::attrs;

    pub const USER_PSO: &[&str] = &[attrs::SAM_ACCOUNT_NAME, attrs::RESULTANT_PSO];

    pub const GROUP_PSO: &[&str] = &[attrs::CN, attrs::PSO_APPLIED];

    pub const PSO_DETAIL: &[&str] = &[
        attrs::NAME,
        attrs::DESCRIPTION,
        attrs::LOCKOUT_THRESHOLD,
        attrs::PSO_APPLIES_TO,
        attrs::MINIMUM_PASSWORD_LENGTH,
        attrs::PASSWORD_HISTORY_LENGTH,
        attrs::LOCKOUT_OBSERVATION_WINDOW,
        attrs::LOCKOUT_DURATION,
        attrs::PASSWORD_SETTINGS_PRECEDENCE,
        attrs::PASSWORD_COMPLEXITY_ENABLED,
        attrs::REVERSIBLE_ENCRYPTION_ENABLED,
        attrs::MINIMUM_PASSWORD_AGE,
        attrs::MAXIMUM_PASSWORD_AGE,
    ];
}
