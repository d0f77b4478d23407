//! Timeout wrappers for LDAP operations
//!
//! Every network round-trip (connect, bind, search, unbind) is bounded by an
//! explicit duration taken from [`SessionConfig`](crate::config::SessionConfig),
//! so an unreachable or stalled domain controller cannot hang the run.

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::errors::{ADError, Result};
use crate::ldap_helpers::DirectoryEntry;
use crate::session::SearchOutcome;

/// sizeLimitExceeded
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;

/// Opens a connection (TCP, plus the TLS handshake for `ldaps://`) with a
/// timeout, and spawns the connection driver.
pub async fn ldap_connect_with_timeout(
    url: &str,
    connect_timeout: Duration,
    skip_tls_verify: bool,
) -> Result<Ldap> {
    let settings = LdapConnSettings::new()
        .set_conn_timeout(connect_timeout)
        .set_no_tls_verify(skip_tls_verify);

    let result = timeout(connect_timeout, LdapConnAsync::with_settings(settings, url)).await;

    let (conn, ldap) = match result {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            return Err(ADError::ConnectionError(format!(
                "Failed to connect to {}: {}",
                url, e
            )))
        }
        Err(_) => {
            return Err(ADError::Timeout(format!(
                "Server {} did not respond within {} seconds",
                url,
                connect_timeout.as_secs()
            )))
        }
    };

    tokio::spawn(async move {
        if let Err(e) = conn.drive().await {
            error!("LDAP connection error: {:?}", e);
        }
    });

    debug!("ldap_connect_with_timeout: connection to {} established", url);
    Ok(ldap)
}

/// Performs an NTLM bind with a timeout.
///
/// `principal` is the down-level logon name (`DOMAIN\user`).
pub async fn ldap_ntlm_bind_with_timeout(
    ldap: &mut Ldap,
    principal: &str,
    password: &str,
    bind_timeout: Duration,
) -> Result<()> {
    let result = timeout(bind_timeout, ldap.sasl_ntlm_bind(principal, password)).await;

    match result {
        Ok(Ok(ldap_result)) => {
            ldap_result.success()?;
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ADError::Timeout(format!(
            "Bind operation did not complete within {} seconds",
            bind_timeout.as_secs()
        ))),
    }
}

/// Performs a subtree search with a timeout.
///
/// No paging control is sent, so the server's default size limit applies.
/// sizeLimitExceeded (rc=4) returns the partial entries flagged as truncated;
/// any other non-zero result code is an error.
pub async fn ldap_search_with_timeout(
    ldap: &mut Ldap,
    base_dn: &str,
    filter: &str,
    attrs: &[&str],
    search_timeout: Duration,
) -> Result<SearchOutcome> {
    info!(
        "ldap_search_with_timeout: Starting search in {} with filter {} (timeout: {}s)",
        base_dn,
        filter,
        search_timeout.as_secs()
    );

    let result = timeout(
        search_timeout,
        ldap.search(base_dn, Scope::Subtree, filter, attrs.to_vec()),
    )
    .await;

    let SearchResult(raw_entries, ldap_result) = match result {
        Ok(Ok(search_result)) => search_result,
        Ok(Err(e)) => {
            error!("ldap_search_with_timeout: Search failed: {}", e);
            return Err(e.into());
        }
        Err(_) => {
            error!(
                "ldap_search_with_timeout: Search timed out after {}s",
                search_timeout.as_secs()
            );
            return Err(ADError::Timeout(format!(
                "Query did not complete within {} seconds",
                search_timeout.as_secs()
            )));
        }
    };

    let entries: Vec<DirectoryEntry> = raw_entries
        .into_iter()
        .map(|e| DirectoryEntry::from(SearchEntry::construct(e)))
        .collect();

    match ldap_result.rc {
        0 => {
            info!("ldap_search_with_timeout: Search returned {} entries", entries.len());
            Ok(SearchOutcome::complete(entries))
        }
        RC_SIZE_LIMIT_EXCEEDED => {
            warn!(
                "ldap_search_with_timeout: Size limit exceeded (rc=4), returning {} partial entries",
                entries.len()
            );
            Ok(SearchOutcome::truncated(entries))
        }
        rc => {
            error!(
                "ldap_search_with_timeout: Search failed with rc={}: {}",
                rc, ldap_result.text
            );
            Err(ADError::from_result_code(rc, &ldap_result.text))
        }
    }
}

/// Unbinds with a timeout. Failures are logged only; the connection is
/// dropped either way.
pub async fn ldap_unbind_with_timeout(ldap: &mut Ldap, unbind_timeout: Duration) {
    match timeout(unbind_timeout, ldap.unbind()).await {
        Ok(Ok(())) => debug!("ldap_unbind_with_timeout: unbound"),
        Ok(Err(e)) => warn!("Unbind failed: {}", e),
        Err(_) => warn!("Unbind timed out (connection will be dropped)"),
    }
}
