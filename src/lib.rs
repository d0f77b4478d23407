//! Fine-grained password policy (PSO) enumeration for Active Directory
//!
//! Reports which users and groups have a Password Settings Object applied
//! and the full settings of every PSO the caller can read.

pub mod ad_client;
pub mod auth;
pub mod config;
pub mod errors;
pub mod interval;
pub mod ldap_helpers;
pub mod ldap_timeout;
pub mod ldap_utils;
pub mod mock_session;
pub mod pso;
pub mod report;
pub mod secure_types;
pub mod session;

pub use ad_client::{AuditSummary, ExitStatus, FamilyReport, FamilyStatus, PsoAuditClient, QueryFamily};
pub use auth::LdapConnector;
pub use config::SessionConfig;
pub use errors::{ADError, Result};
pub use secure_types::Credentials;
