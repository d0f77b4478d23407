//! LDAP Utilities
//!
//! Distinguished-name helpers: search base derivation from a DNS domain name,
//! the password settings container path, and RDN value extraction.

/// Relative path of the container holding Password Settings Objects.
pub const PSO_CONTAINER_RDNS: &str = "CN=Password Settings Container,CN=System";

/// Convert a DNS domain name to an LDAP base DN
/// e.g., "corp.example.com" -> "DC=corp,DC=example,DC=com"
pub fn domain_to_base_dn(domain: &str) -> String {
    domain
        .split('.')
        .map(|part| format!("DC={}", part))
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`domain_to_base_dn`]: collects the `DC=` components of a DN
/// back into a dotted domain name.
pub fn base_dn_to_domain(base_dn: &str) -> String {
    base_dn
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.len() >= 3 && part[..3].eq_ignore_ascii_case("DC=") {
                Some(&part[3..])
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Search base of the password settings container for `domain`.
pub fn pso_container_dn(domain: &str) -> String {
    format!("{},{}", PSO_CONTAINER_RDNS, domain_to_base_dn(domain))
}

/// Value of the first RDN of a distinguished name.
///
/// `"CN=StrictPolicy,CN=Password Settings Container,..."` yields `"StrictPolicy"`.
/// Returns `None` if the first component has no `=`.
pub fn first_rdn_value(dn: &str) -> Option<&str> {
    let first = dn.split(',').next()?;
    first.split('=').nth(1).map(str::trim)
}

/// Down-level logon name (`DOMAIN\user`) used for NTLM binds.
///
/// A username already qualified as `OTHER\user` or `user@realm` is reduced to
/// its bare account name first; `domain` always supplies the qualifier.
pub fn down_level_logon_name(domain: &str, username: &str) -> String {
    let account = username.rsplit('\\').next().unwrap_or(username);
    let account = account.split('@').next().unwrap_or(account);
    format!("{}\\{}", domain, account)
}

/// Checks that `principal` is a well-formed `DOMAIN\user` name: exactly one
/// backslash, no `@`, both halves non-empty.
pub fn validate_down_level_name(principal: &str) -> Result<(), String> {
    if principal.contains('@') {
        return Err(format!("'{}' mixes down-level and UPN forms", principal));
    }
    match principal.split_once('\\') {
        Some((domain, user)) if !domain.is_empty() && !user.is_empty() && !user.contains('\\') => {
            Ok(())
        }
        _ => Err(format!("'{}' is not a DOMAIN\\user name", principal)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_to_base_dn() {
        assert_eq!(domain_to_base_dn("corp.example.com"), "DC=corp,DC=example,DC=com");
        assert_eq!(domain_to_base_dn("example.com"), "DC=example,DC=com");
        assert_eq!(domain_to_base_dn("local"), "DC=local");
    }

    #[test]
    fn test_base_dn_round_trip() {
        for domain in ["corp.local", "a.b.c", "eu.corp.contoso.com", "local"] {
            assert_eq!(base_dn_to_domain(&domain_to_base_dn(domain)), domain);
        }
    }

    #[test]
    fn test_base_dn_to_domain_ignores_other_rdns() {
        assert_eq!(
            base_dn_to_domain("CN=Password Settings Container,CN=System,DC=corp,dc=local"),
            "corp.local"
        );
    }

    #[test]
    fn test_pso_container_dn() {
        assert_eq!(
            pso_container_dn("corp.local"),
            "CN=Password Settings Container,CN=System,DC=corp,DC=local"
        );
    }

    #[test]
    fn test_first_rdn_value() {
        assert_eq!(
            first_rdn_value(
                "CN=StrictPolicy,CN=Password Settings Container,CN=System,DC=corp,DC=local"
            ),
            Some("StrictPolicy")
        );
        assert_eq!(first_rdn_value("CN=Solo"), Some("Solo"));
        assert_eq!(first_rdn_value("garbage"), None);
        assert_eq!(first_rdn_value(""), None);
    }

    #[test]
    fn test_down_level_logon_name() {
        assert_eq!(down_level_logon_name("corp.local", "jdoe"), "corp.local\\jdoe");
    }

    #[test]
    fn test_down_level_logon_name_strips_qualifiers() {
        assert_eq!(
            down_level_logon_name("corp.local", "auditor@corp.local"),
            "corp.local\\auditor"
        );
        assert_eq!(down_level_logon_name("corp.local", "CORP\\auditor"), "corp.local\\auditor");
    }

    #[test]
    fn test_validate_down_level_name() {
        assert!(validate_down_level_name("corp.local\\auditor").is_ok());
        assert!(validate_down_level_name("corp.local\\auditor@corp.local").is_err());
        assert!(validate_down_level_name("corp@local\\auditor").is_err());
        assert!(validate_down_level_name("a\\b\\c").is_err());
        assert!(validate_down_level_name("corp.local\\").is_err());
        assert!(validate_down_level_name("auditor").is_err());
    }
}
