//! In-memory directory for testing without a domain controller
//!
//! Simulates connect/bind outcomes per transport and answers searches from
//! fixed entry sets keyed by object-class filter. Every attempt, search and
//! unbind is recorded so tests can assert on session lifecycle.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::{BindFailure, DirectoryConnector, Endpoint, Transport};
use crate::errors::{ADError, Result};
use crate::ldap_helpers::{filters, DirectoryEntry};
use crate::session::{DirectorySession, SearchOutcome, SearchRequest};

/// Simulated outcome of a connect-and-bind on one transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Connects and binds
    Accept,
    /// Socket cannot be opened
    RefuseConnection,
    /// Socket opens, credentials rejected (rc=49)
    RejectCredentials,
}

#[derive(Debug, Default)]
struct MockLog {
    attempts: Vec<Endpoint>,
    principals: Vec<String>,
    searches: Vec<SearchRequest>,
    unbinds: usize,
}

#[derive(Debug, Clone, Default)]
struct MockData {
    entries: HashMap<String, Vec<DirectoryEntry>>,
    failures: HashMap<String, (u32, String)>,
    truncated: Vec<String>,
}

/// Mock connector with canned directory content
#[derive(Debug, Clone)]
pub struct MockDirectory {
    plain: MockBehavior,
    tls: MockBehavior,
    data: Arc<MockData>,
    log: Arc<Mutex<MockLog>>,
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(log: &Mutex<MockLog>) -> MutexGuard<'_, MockLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn filter_key(filter: &str) -> String {
    filter.to_ascii_lowercase()
}

impl MockDirectory {
    /// A directory accepting binds on both transports, with no content.
    pub fn new() -> Self {
        Self {
            plain: MockBehavior::Accept,
            tls: MockBehavior::Accept,
            data: Arc::new(MockData::default()),
            log: Arc::new(Mutex::new(MockLog::default())),
        }
    }

    pub fn with_plain(mut self, behavior: MockBehavior) -> Self {
        self.plain = behavior;
        self
    }

    pub fn with_tls(mut self, behavior: MockBehavior) -> Self {
        self.tls = behavior;
        self
    }

    fn data_mut(&mut self) -> &mut MockData {
        Arc::make_mut(&mut self.data)
    }

    /// Entries returned for searches using `filter`.
    pub fn with_entries(mut self, filter: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.data_mut().entries.insert(filter_key(filter), entries);
        self
    }

    pub fn with_users(self, entries: Vec<DirectoryEntry>) -> Self {
        self.with_entries(filters::ALL_USERS, entries)
    }

    pub fn with_groups(self, entries: Vec<DirectoryEntry>) -> Self {
        self.with_entries(filters::ALL_GROUPS, entries)
    }

    pub fn with_password_settings(self, entries: Vec<DirectoryEntry>) -> Self {
        self.with_entries(filters::PASSWORD_SETTINGS, entries)
    }

    /// Searches using `filter` fail with LDAP result code `rc`.
    pub fn failing_search(mut self, filter: &str, rc: u32, text: &str) -> Self {
        self.data_mut()
            .failures
            .insert(filter_key(filter), (rc, text.to_string()));
        self
    }

    /// Searches using `filter` report sizeLimitExceeded.
    pub fn truncating_search(mut self, filter: &str) -> Self {
        self.data_mut().truncated.push(filter_key(filter));
        self
    }

    /// Endpoints tried, in order.
    pub fn attempts(&self) -> Vec<Endpoint> {
        lock(&self.log).attempts.clone()
    }

    /// Principals presented on each attempt.
    pub fn principals(&self) -> Vec<String> {
        lock(&self.log).principals.clone()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        lock(&self.log).searches.clone()
    }

    /// Number of sessions released.
    pub fn unbinds(&self) -> usize {
        lock(&self.log).unbinds
    }
}

#[async_trait]
impl DirectoryConnector for MockDirectory {
    type Session = MockSession;

    async fn connect_and_bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        _password: &str,
    ) -> std::result::Result<MockSession, BindFailure> {
        {
            let mut log = lock(&self.log);
            log.attempts.push(endpoint.clone());
            log.principals.push(principal.to_string());
        }

        let behavior = match endpoint.transport {
            Transport::Plain => self.plain,
            Transport::Tls => self.tls,
        };

        match behavior {
            MockBehavior::Accept => Ok(MockSession {
                data: Arc::clone(&self.data),
                log: Arc::clone(&self.log),
                bound: true,
            }),
            MockBehavior::RefuseConnection => Err(BindFailure::Connectivity(format!(
                "Failed to connect to {}: connection refused",
                endpoint.ldap_url()
            ))),
            MockBehavior::RejectCredentials => Err(BindFailure::Authentication(
                ADError::from_result_code(49, "80090308: LdapErr: DSID-0C09044E").to_string(),
            )),
        }
    }
}

/// Session handed out by [`MockDirectory`]
#[derive(Debug)]
pub struct MockSession {
    data: Arc<MockData>,
    log: Arc<Mutex<MockLog>>,
    bound: bool,
}

#[async_trait]
impl DirectorySession for MockSession {
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome> {
        lock(&self.log).searches.push(request.clone());

        let key = filter_key(&request.filter);
        if let Some((rc, text)) = self.data.failures.get(&key) {
            return Err(ADError::from_result_code(*rc, text));
        }

        let entries = self.data.entries.get(&key).cloned().unwrap_or_default();
        if self.data.truncated.contains(&key) {
            Ok(SearchOutcome::truncated(entries))
        } else {
            Ok(SearchOutcome::complete(entries))
        }
    }

    async fn unbind(&mut self) {
        if self.bound {
            self.bound = false;
            lock(&self.log).unbinds += 1;
        }
    }
}
