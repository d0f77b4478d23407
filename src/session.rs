//! Directory sessions and the search executor
//!
//! A session is one bound connection to one endpoint. It is created by
//! [`establish`](crate::auth::establish), used for any number of searches and
//! released with [`DirectorySession::unbind`].

use async_trait::async_trait;
use ldap3::Ldap;
use std::time::Duration;
use tracing::info;

use crate::auth::Endpoint;
use crate::errors::Result;
use crate::ldap_helpers::DirectoryEntry;
use crate::ldap_timeout::{ldap_search_with_timeout, ldap_unbind_with_timeout};

/// One subtree-scoped query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: impl Into<String>, filter: impl Into<String>, attributes: &[&str]) -> Self {
        Self {
            base: base.into(),
            filter: filter.into(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Entries returned by a search.
///
/// An empty result is not an error: it covers both "nothing matched" and
/// "caller may not read the container", which the protocol does not tell apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub entries: Vec<DirectoryEntry>,
    /// The server stopped at its size limit; `entries` is incomplete.
    pub truncated: bool,
}

impl SearchOutcome {
    pub fn complete(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            truncated: false,
        }
    }

    pub fn truncated(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            truncated: true,
        }
    }
}

/// A bound directory session.
#[async_trait]
pub trait DirectorySession: Send {
    /// Runs one subtree search.
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome>;

    /// Releases the session. Calling it more than once is harmless.
    async fn unbind(&mut self);
}

/// Runs `request` on `session`.
pub async fn search<S>(session: &mut S, request: &SearchRequest) -> Result<SearchOutcome>
where
    S: DirectorySession + ?Sized,
{
    info!(
        "search: base={} filter={} attributes={}",
        request.base,
        request.filter,
        request.attributes.join(",")
    );
    session.search(request).await
}

/// Session over a live ldap3 connection.
pub struct LdapSession {
    ldap: Ldap,
    endpoint: Endpoint,
    operation_timeout: Duration,
    bound: bool,
}

impl LdapSession {
    pub(crate) fn new(ldap: Ldap, endpoint: Endpoint, operation_timeout: Duration) -> Self {
        Self {
            ldap,
            endpoint,
            operation_timeout,
            bound: true,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome> {
        let attrs: Vec<&str> = request.attributes.iter().map(String::as_str).collect();
        ldap_search_with_timeout(
            &mut self.ldap,
            &request.base,
            &request.filter,
            &attrs,
            self.operation_timeout,
        )
        .await
    }

    async fn unbind(&mut self) {
        if self.bound {
            self.bound = false;
            info!("Unbinding from {}", self.endpoint);
            ldap_unbind_with_timeout(&mut self.ldap, self.operation_timeout).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_new() {
        let request = SearchRequest::new("DC=corp,DC=local", "(objectClass=user)", &["cn", "name"]);
        assert_eq!(request.base, "DC=corp,DC=local");
        assert_eq!(request.attributes, vec!["cn".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(!SearchOutcome::complete(Vec::new()).truncated);
        let partial = SearchOutcome::truncated(vec![DirectoryEntry::new("CN=x")]);
        assert!(partial.truncated);
        assert_eq!(partial.entries.len(), 1);
    }
}
