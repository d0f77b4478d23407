//! Session establishment for Active Directory
//!
//! Binds with NTLM using the down-level logon name (`DOMAIN\user`). The plain
//! LDAP endpoint (389) is tried first; on any failure a single LDAPS attempt
//! (636) follows. That fallback is the only retry in the tool.
//!
//! | Attempt | Transport | Port |
//! |---------|-----------|------|
//! | 1       | LDAP      | 389  |
//! | 2       | LDAPS     | 636  |

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::errors::ADError;
use crate::ldap_timeout::{ldap_connect_with_timeout, ldap_ntlm_bind_with_timeout};
use crate::ldap_utils::validate_down_level_name;
use crate::secure_types::Credentials;
use crate::session::{DirectorySession, LdapSession};

/// Transport of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls,
}

impl Transport {
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Plain => "ldap",
            Transport::Tls => "ldaps",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transport::Plain => "LDAP",
            Transport::Tls => "LDAPS",
        }
    }
}

/// A host/port pair reached over one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
}

impl Endpoint {
    pub fn ldap_url(&self) -> String {
        format!("{}://{}:{}", self.transport.scheme(), self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The plaintext endpoint followed by the encrypted one. The host is the
/// explicit controller address when given, else the domain name.
pub fn candidate_endpoints(credentials: &Credentials, config: &SessionConfig) -> [Endpoint; 2] {
    let host = credentials.target_host().to_string();
    [
        Endpoint {
            host: host.clone(),
            port: config.plain_port,
            transport: Transport::Plain,
        },
        Endpoint {
            host,
            port: config.tls_port,
            transport: Transport::Tls,
        },
    ]
}

/// Why one bind attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindFailure {
    /// No socket (or TLS channel) could be opened
    #[error("connection failed: {0}")]
    Connectivity(String),
    /// The socket opened but the bind was rejected
    #[error("bind rejected: {0}")]
    Authentication(String),
}

impl BindFailure {
    /// Classifies an error raised while binding on an open connection.
    pub fn from_bind_error(err: ADError) -> Self {
        match err {
            ADError::ConnectionError(msg) | ADError::Timeout(msg) => BindFailure::Connectivity(msg),
            other => BindFailure::Authentication(other.to_string()),
        }
    }
}

/// A failed attempt against one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub endpoint: Endpoint,
    pub failure: BindFailure,
}

impl FailedAttempt {
    /// User-facing diagnostic line for this attempt.
    pub fn diagnostic(&self) -> String {
        match &self.failure {
            BindFailure::Connectivity(_) => format!("Could not connect to {}", self.endpoint),
            BindFailure::Authentication(reason) => {
                format!("Failed to bind to {}: {}", self.endpoint, reason)
            }
        }
    }
}

/// Result of session establishment. A failed outcome never holds a session.
#[derive(Debug)]
pub enum SessionOutcome<S> {
    Established { session: S, endpoint: Endpoint },
    Failed { attempts: Vec<FailedAttempt> },
}

impl<S> SessionOutcome<S> {
    pub fn is_established(&self) -> bool {
        matches!(self, SessionOutcome::Established { .. })
    }

    pub fn into_session(self) -> Option<S> {
        match self {
            SessionOutcome::Established { session, .. } => Some(session),
            SessionOutcome::Failed { .. } => None,
        }
    }
}

/// Opens and binds sessions against single endpoints.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    type Session: DirectorySession;

    async fn connect_and_bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        password: &str,
    ) -> Result<Self::Session, BindFailure>;
}

/// Connector over ldap3 with NTLM binds.
#[derive(Debug, Clone)]
pub struct LdapConnector {
    config: SessionConfig,
}

impl LdapConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    type Session = LdapSession;

    async fn connect_and_bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        password: &str,
    ) -> Result<LdapSession, BindFailure> {
        // The NTLM layer cannot take a mixed `DOMAIN\user@realm` name
        validate_down_level_name(principal).map_err(BindFailure::Authentication)?;

        let url = endpoint.ldap_url();
        info!("Connecting to {} as {}", url, principal);

        if endpoint.transport == Transport::Plain {
            debug!("NTLM bind over plain LDAP to {}, traffic is not TLS protected", url);
        }

        let mut ldap = ldap_connect_with_timeout(
            &url,
            self.config.connect_timeout,
            self.config.skip_tls_verify,
        )
        .await
        .map_err(|e| BindFailure::Connectivity(e.to_string()))?;

        ldap_ntlm_bind_with_timeout(&mut ldap, principal, password, self.config.operation_timeout)
            .await
            .map_err(BindFailure::from_bind_error)?;

        info!("NTLM bind successful to {}", url);
        Ok(LdapSession::new(ldap, endpoint.clone(), self.config.operation_timeout))
    }
}

/// Establishes a bound session: plaintext first, then exactly one encrypted
/// attempt if that fails.
///
/// Diagnostic lines for each failed attempt are appended to `diagnostics`.
pub async fn establish<C>(
    connector: &C,
    credentials: &Credentials,
    config: &SessionConfig,
    diagnostics: &mut Vec<String>,
) -> SessionOutcome<C::Session>
where
    C: DirectoryConnector + ?Sized,
{
    let principal = credentials.principal();
    let [plain, tls] = candidate_endpoints(credentials, config);
    let mut attempts = Vec::with_capacity(2);

    for endpoint in [plain, tls] {
        match connector
            .connect_and_bind(&endpoint, &principal, credentials.password())
            .await
        {
            Ok(session) => {
                info!("Session established on {} ({})", endpoint, endpoint.transport.label());
                return SessionOutcome::Established { session, endpoint };
            }
            Err(failure) => {
                info!("{} attempt on {} failed: {}", endpoint.transport.label(), endpoint, failure);
                let attempt = FailedAttempt {
                    endpoint: endpoint.clone(),
                    failure,
                };
                diagnostics.push(attempt.diagnostic());
                if endpoint.transport == Transport::Plain {
                    diagnostics.push(format!(
                        "LDAP on port {} failed, trying LDAPS on port {}...",
                        config.plain_port, config.tls_port
                    ));
                }
                attempts.push(attempt);
            }
        }
    }

    diagnostics.push("Both LDAP and LDAPS connection attempts failed.".to_string());
    SessionOutcome::Failed { attempts }
}
