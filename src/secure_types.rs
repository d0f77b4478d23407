//! Secure Types Module
//!
//! Credential storage types that zero sensitive data from memory when dropped.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ldap_utils::down_level_logon_name;

/// A secure string that automatically zeros its contents when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Creates a new SecureString, taking ownership of the original buffer.
    pub fn new(s: String) -> Self {
        Self { inner: s }
    }

    /// Temporarily exposes the secret as a string slice.
    ///
    /// # Security
    /// The returned reference should be used immediately and not stored.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Bind credentials and target, supplied once at startup.
///
/// The password is zeroed from memory when the credentials are dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    password: SecureString,
    /// Fully-qualified DNS domain name, e.g. `corp.local`
    domain: String,
    /// Explicit domain controller address; the domain name is used when absent
    controller: Option<String>,
}

impl Credentials {
    pub fn new(
        username: String,
        password: String,
        domain: String,
        controller: Option<String>,
    ) -> Self {
        Self {
            username,
            password: SecureString::new(password),
            domain,
            controller,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Temporarily exposes the password as a string slice.
    ///
    /// # Security
    /// Use this method only when needed for authentication.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    /// Host to connect to: the explicit controller, else the domain itself
    /// (resolved through the domain's published locator records).
    pub fn target_host(&self) -> &str {
        self.controller().unwrap_or(&self.domain)
    }

    /// Bind principal in `DOMAIN\username` form, as NTLM expects.
    pub fn principal(&self) -> String {
        down_level_logon_name(&self.domain, &self.username)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("controller", &self.controller)
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials(principal: {}, password: [REDACTED])", self.principal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(controller: Option<&str>) -> Credentials {
        Credentials::new(
            "auditor".to_string(),
            "s3cret!".to_string(),
            "corp.local".to_string(),
            controller.map(str::to_string),
        )
    }

    #[test]
    fn test_secure_string_debug() {
        let secret = SecureString::new("password123".to_string());
        let debug_output = format!("{:?}", secret);
        assert_eq!(debug_output, "SecureString([REDACTED])");
        assert!(!debug_output.contains("password123"));
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_credentials_principal() {
        assert_eq!(creds(None).principal(), "corp.local\\auditor");
    }

    #[test]
    fn test_target_host_prefers_controller() {
        assert_eq!(creds(Some("10.0.0.5")).target_host(), "10.0.0.5");
        assert_eq!(creds(None).target_host(), "corp.local");
    }

    #[test]
    fn test_credentials_redaction() {
        let c = creds(Some("10.0.0.5"));
        let debug_output = format!("{:?}", c);
        assert!(debug_output.contains("auditor"));
        assert!(!debug_output.contains("s3cret!"));
        let display_output = format!("{}", c);
        assert!(display_output.contains("corp.local\\auditor"));
        assert!(!display_output.contains("s3cret!"));
        assert_eq!(c.password(), "s3cret!");
    }

    #[test]
    fn test_zeroize_clears_password() {
        let mut c = creds(None);
        c.zeroize();
        assert!(c.password().is_empty());
        assert!(c.username().is_empty());
    }

    #[test]
    fn test_principal_from_qualified_username() {
        let c = Credentials::new(
            "CORP\\auditor".to_string(),
            "pw".to_string(),
            "corp.local".to_string(),
            None,
        );
        assert_eq!(c.principal(), "corp.local\\auditor");
    }
}
