//! Error handling module
//!
//! Structured error types for directory operations. Failures are classified
//! here so that each query family can report them at its own boundary.

use thiserror::Error;

/// Main error type for Active Directory operations
#[derive(Error, Debug)]
pub enum ADError {
    /// LDAP connection error
    #[error("LDAP connection failed: {0}")]
    ConnectionError(String),

    /// LDAP query/search error
    #[error("LDAP query failed: {0}")]
    QueryError(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Object (usually the search base) not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ADError {
    /// Classifies a non-success LDAP result code.
    pub fn from_result_code(rc: u32, text: &str) -> Self {
        match rc {
            // 49 = Invalid credentials
            49 => ADError::AuthError(format!("Invalid credentials: {}", text)),
            // 32 = No such object
            32 => ADError::NotFound(format!("Object not found: {}", text)),
            // 50 = Insufficient access rights
            50 => ADError::PermissionDenied(format!("Insufficient access rights: {}", text)),
            // 51 = Busy
            51 => ADError::Timeout(format!("Server is busy: {}", text)),
            // 52 = Unavailable
            52 => ADError::ConnectionError(format!("Server unavailable: {}", text)),
            // 53 = Unwilling to perform
            53 => ADError::PermissionDenied(format!(
                "Server unwilling to perform operation: {}",
                text
            )),
            _ => ADError::QueryError(format!("LDAP error code {}: {}", rc, text)),
        }
    }

    /// True when the error means the caller cannot see the requested container.
    pub fn is_visibility_error(&self) -> bool {
        matches!(self, ADError::NotFound(_) | ADError::PermissionDenied(_))
    }
}

impl From<ldap3::LdapError> for ADError {
    fn from(err: ldap3::LdapError) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => {
                ADError::from_result_code(result.rc, &result.text)
            }
            ldap3::LdapError::EndOfStream => {
                ADError::ConnectionError("Connection closed unexpectedly".to_string())
            }
            ldap3::LdapError::Io { source } => {
                ADError::ConnectionError(format!("I/O error: {}", source))
            }
            ldap3::LdapError::Timeout { elapsed: _ } => {
                ADError::Timeout("LDAP operation timed out".to_string())
            }
            _ => ADError::QueryError(format!("LDAP error: {}", err)),
        }
    }
}

impl From<std::io::Error> for ADError {
    fn from(err: std::io::Error) -> Self {
        ADError::ConnectionError(format!("I/O error: {}", err))
    }
}

/// Result type alias for AD operations
pub type Result<T> = std::result::Result<T, ADError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ADError::ConnectionError("test".to_string());
        assert_eq!(err.to_string(), "LDAP connection failed: test");

        let err = ADError::AuthError("bad password".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bad password");

        let err = ADError::NotFound("container".to_string());
        assert_eq!(err.to_string(), "Resource not found: container");
    }

    #[test]
    fn test_result_code_classification() {
        assert!(matches!(ADError::from_result_code(49, "x"), ADError::AuthError(_)));
        assert!(matches!(ADError::from_result_code(32, "x"), ADError::NotFound(_)));
        assert!(matches!(ADError::from_result_code(50, "x"), ADError::PermissionDenied(_)));
        assert!(matches!(ADError::from_result_code(53, "x"), ADError::PermissionDenied(_)));
        assert!(matches!(ADError::from_result_code(52, "x"), ADError::ConnectionError(_)));
        assert!(matches!(ADError::from_result_code(51, "x"), ADError::Timeout(_)));
        assert!(matches!(ADError::from_result_code(1, "x"), ADError::QueryError(_)));
    }

    #[test]
    fn test_visibility_errors() {
        assert!(ADError::NotFound("x".into()).is_visibility_error());
        assert!(ADError::PermissionDenied("x".into()).is_visibility_error());
        assert!(!ADError::QueryError("x".into()).is_visibility_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let ad_err: ADError = io_err.into();
        assert!(matches!(ad_err, ADError::ConnectionError(_)));
    }
}
