//! Fine-Grained Password Policy projections
//!
//! Turns raw search entries into display-ready rows: which users have a
//! resultant PSO, which groups have a PSO applied, and the full settings of
//! every Password Settings Object.
//!
//! When several PSOs target the same principal, the one with the lowest
//! `msDS-PasswordSettingsPrecedence` wins. The directory resolves this itself
//! (`msDS-ResultantPSO`); nothing here re-applies the rule.

use serde::Serialize;
use tracing::debug;

use crate::interval::decode_interval;
use crate::ldap_helpers::{attrs, DirectoryEntry};
use crate::ldap_utils::first_rdn_value;

/// Placeholder for attributes missing on an entry
pub const NOT_AVAILABLE: &str = "N/A";

/// A principal paired with the name of the PSO that targets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PsoAssignment {
    pub principal: String,
    pub pso: String,
}

/// PSO name from a PSO distinguished name; the raw DN if it has no RDN value.
pub fn pso_name_from_dn(dn: &str) -> String {
    first_rdn_value(dn).unwrap_or(dn).to_string()
}

/// Users whose `msDS-ResultantPSO` is set, in search order.
pub fn project_users(entries: &[DirectoryEntry]) -> Vec<PsoAssignment> {
    entries
        .iter()
        .filter_map(|entry| {
            let pso_dn = entry
                .values(attrs::RESULTANT_PSO)?
                .iter()
                .find(|v| !v.is_empty())?;
            let principal = entry
                .get_optional_attr(attrs::SAM_ACCOUNT_NAME)
                .unwrap_or(NOT_AVAILABLE);
            Some(PsoAssignment {
                principal: principal.to_string(),
                pso: pso_name_from_dn(pso_dn),
            })
        })
        .collect()
}

/// Groups with `msDS-PSOApplied` set, in search order. A group linked to
/// several PSOs yields one row per PSO.
pub fn project_groups(entries: &[DirectoryEntry]) -> Vec<PsoAssignment> {
    let mut rows = Vec::new();
    for entry in entries.iter().filter(|e| e.has_values(attrs::PSO_APPLIED)) {
        let principal = entry.get_optional_attr(attrs::CN).unwrap_or(NOT_AVAILABLE);
        for pso_dn in entry.get_multi_attr(attrs::PSO_APPLIED) {
            if pso_dn.is_empty() {
                continue;
            }
            rows.push(PsoAssignment {
                principal: principal.to_string(),
                pso: pso_name_from_dn(&pso_dn),
            });
        }
    }
    debug!("project_groups: {} of {} entries have a PSO applied", rows.len(), entries.len());
    rows
}

/// Settings of one Password Settings Object. `None` means the attribute was
/// not returned (or could not be parsed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyDetail {
    pub distinguished_name: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub minimum_password_length: Option<u32>,
    pub password_history_length: Option<u32>,
    pub lockout_threshold: Option<u32>,
    /// Decoded interval, e.g. `0 days 0 hours 30 minutes 0 seconds`
    pub lockout_observation_window: Option<String>,
    pub lockout_duration: Option<String>,
    pub complexity_enabled: Option<bool>,
    pub minimum_password_age: Option<String>,
    pub maximum_password_age: Option<String>,
    pub reversible_encryption_enabled: Option<bool>,
    /// Lower value wins when several PSOs apply to one principal
    pub precedence: Option<u32>,
    pub applies_to: Vec<String>,
}

fn parse_u32(entry: &DirectoryEntry, name: &str) -> Option<u32> {
    entry
        .get_optional_attr(name)
        .and_then(|v| v.trim().parse().ok())
}

fn parse_bool(entry: &DirectoryEntry, name: &str) -> Option<bool> {
    match entry.get_optional_attr(name)?.trim().to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

fn interval(entry: &DirectoryEntry, name: &str) -> Option<String> {
    entry.get_optional_i64_attr(name).map(decode_interval)
}

impl PolicyDetail {
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            distinguished_name: entry.dn.clone(),
            name: entry.get_optional_attr(attrs::NAME).map(str::to_string),
            description: entry.get_optional_attr(attrs::DESCRIPTION).map(str::to_string),
            minimum_password_length: parse_u32(entry, attrs::MINIMUM_PASSWORD_LENGTH),
            password_history_length: parse_u32(entry, attrs::PASSWORD_HISTORY_LENGTH),
            lockout_threshold: parse_u32(entry, attrs::LOCKOUT_THRESHOLD),
            lockout_observation_window: interval(entry, attrs::LOCKOUT_OBSERVATION_WINDOW),
            lockout_duration: interval(entry, attrs::LOCKOUT_DURATION),
            complexity_enabled: parse_bool(entry, attrs::PASSWORD_COMPLEXITY_ENABLED),
            minimum_password_age: interval(entry, attrs::MINIMUM_PASSWORD_AGE),
            maximum_password_age: interval(entry, attrs::MAXIMUM_PASSWORD_AGE),
            reversible_encryption_enabled: parse_bool(entry, attrs::REVERSIBLE_ENCRYPTION_ENABLED),
            precedence: parse_u32(entry, attrs::PASSWORD_SETTINGS_PRECEDENCE),
            applies_to: entry.get_multi_attr(attrs::PSO_APPLIES_TO),
        }
    }
}

/// Every PSO entry as a [`PolicyDetail`], in search order.
pub fn project_policy_detail(entries: &[DirectoryEntry]) -> Vec<PolicyDetail> {
    entries.iter().map(PolicyDetail::from_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT_DN: &str =
        "CN=StrictPolicy,CN=Password Settings Container,CN=System,DC=corp,DC=local";

    fn user(sam: &str, pso: Option<&str>) -> DirectoryEntry {
        let entry = DirectoryEntry::new(format!("CN={},CN=Users,DC=corp,DC=local", sam))
            .with_attr(attrs::SAM_ACCOUNT_NAME, [sam]);
        match pso {
            Some(dn) => entry.with_attr(attrs::RESULTANT_PSO, [dn]),
            None => entry,
        }
    }

    #[test]
    fn test_pso_name_from_dn() {
        assert_eq!(pso_name_from_dn(STRICT_DN), "StrictPolicy");
        assert_eq!(pso_name_from_dn("odd"), "odd");
    }

    #[test]
    fn test_project_users_extracts_name() {
        let rows = project_users(&[user("alice", Some(STRICT_DN))]);
        assert_eq!(
            rows,
            vec![PsoAssignment {
                principal: "alice".to_string(),
                pso: "StrictPolicy".to_string()
            }]
        );
    }

    #[test]
    fn test_project_users_skips_missing_attribute() {
        let rows = project_users(&[user("bob", None), user("alice", Some(STRICT_DN))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].principal, "alice");
    }

    #[test]
    fn test_project_users_skips_empty_value() {
        let entry = user("carol", None).with_attr(attrs::RESULTANT_PSO, [""]);
        assert!(project_users(&[entry]).is_empty());
    }

    #[test]
    fn test_project_users_uses_first_non_empty_value() {
        let entry = user("dave", None).with_attr(attrs::RESULTANT_PSO, ["", STRICT_DN]);
        let rows = project_users(&[entry]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pso, "StrictPolicy");
    }

    #[test]
    fn test_project_users_preserves_order_and_missing_name() {
        let nameless = DirectoryEntry::new("CN=svc,DC=corp,DC=local")
            .with_attr(attrs::RESULTANT_PSO, ["CN=ServicePSO,DC=corp,DC=local"]);
        let rows = project_users(&[user("zed", Some(STRICT_DN)), nameless, user("amy", Some(STRICT_DN))]);
        let principals: Vec<&str> = rows.iter().map(|r| r.principal.as_str()).collect();
        assert_eq!(principals, vec!["zed", NOT_AVAILABLE, "amy"]);
        assert_eq!(rows[1].pso, "ServicePSO");
    }

    #[test]
    fn test_project_groups() {
        let admins = DirectoryEntry::new("CN=Domain Admins,CN=Users,DC=corp,DC=local")
            .with_attr(attrs::CN, ["Domain Admins"])
            .with_attr(attrs::PSO_APPLIED, ["CN=AdminPSO,CN=Password Settings Container,CN=System,DC=corp,DC=local"]);
        let plain = DirectoryEntry::new("CN=Staff,DC=corp,DC=local").with_attr(attrs::CN, ["Staff"]);
        let rows = project_groups(&[plain, admins]);
        assert_eq!(
            rows,
            vec![PsoAssignment {
                principal: "Domain Admins".to_string(),
                pso: "AdminPSO".to_string()
            }]
        );
    }

    #[test]
    fn test_project_groups_multiple_psos() {
        let group = DirectoryEntry::new("CN=Ops,DC=corp,DC=local")
            .with_attr(attrs::CN, ["Ops"])
            .with_attr(attrs::PSO_APPLIED, ["CN=A,DC=corp,DC=local", "CN=B,DC=corp,DC=local"]);
        let rows = project_groups(&[group]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].pso, "B");
    }

    #[test]
    fn test_policy_detail_full() {
        let entry = DirectoryEntry::new(STRICT_DN)
            .with_attr("name", ["StrictPolicy"])
            .with_attr("description", ["Admins"])
            .with_attr("msDS-MinimumPasswordLength", ["14"])
            .with_attr("msDS-PasswordHistoryLength", ["24"])
            .with_attr("msDS-LockoutThreshold", ["5"])
            .with_attr("msDS-LockoutObservationWindow", ["-18000000000"])
            .with_attr("msDS-LockoutDuration", ["-18000000000"])
            .with_attr("msDS-PasswordComplexityEnabled", ["TRUE"])
            .with_attr("msDS-MinimumPasswordAge", ["-864000000000"])
            .with_attr("msDS-MaximumPasswordAge", ["-36288000000000"])
            .with_attr("msDS-PasswordReversibleEncryptionEnabled", ["FALSE"])
            .with_attr("msDS-PasswordSettingsPrecedence", ["10"])
            .with_attr("msDS-PSOAppliesTo", ["CN=Domain Admins,CN=Users,DC=corp,DC=local"]);

        let detail = PolicyDetail::from_entry(&entry);
        assert_eq!(detail.name.as_deref(), Some("StrictPolicy"));
        assert_eq!(detail.minimum_password_length, Some(14));
        assert_eq!(detail.lockout_threshold, Some(5));
        assert_eq!(
            detail.lockout_duration.as_deref(),
            Some("0 days 0 hours 30 minutes 0 seconds")
        );
        assert_eq!(
            detail.maximum_password_age.as_deref(),
            Some("42 days 0 hours 0 minutes 0 seconds")
        );
        assert_eq!(detail.complexity_enabled, Some(true));
        assert_eq!(detail.reversible_encryption_enabled, Some(false));
        assert_eq!(detail.precedence, Some(10));
        assert_eq!(detail.applies_to.len(), 1);
    }

    #[test]
    fn test_policy_detail_missing_attributes() {
        let entry = DirectoryEntry::new(STRICT_DN).with_attr("name", ["Bare"]);
        let detail = PolicyDetail::from_entry(&entry);
        assert_eq!(detail.name.as_deref(), Some("Bare"));
        assert_eq!(detail.description, None);
        assert_eq!(detail.lockout_duration, None);
        assert_eq!(detail.complexity_enabled, None);
        assert!(detail.applies_to.is_empty());
    }

    #[test]
    fn test_project_policy_detail_order() {
        let entries = vec![
            DirectoryEntry::new("CN=B,DC=x").with_attr("name", ["B"]),
            DirectoryEntry::new("CN=A,DC=x").with_attr("name", ["A"]),
        ];
        let names: Vec<_> = project_policy_detail(&entries)
            .into_iter()
            .filter_map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_policy_detail_serializes() {
        let detail = PolicyDetail {
            name: Some("P".to_string()),
            precedence: Some(1),
            ..Default::default()
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "P");
        assert_eq!(json["precedence"], 1);
        assert!(json["description"].is_null());
    }
}
