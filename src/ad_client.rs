//! PSO audit client
//!
//! Runs the three query families (groups, users, policy detail) one after
//! another. Each family opens its own session, performs one search and
//! releases the session on every path. A failure in one family is reported
//! at that family's boundary and never stops the others.

use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::auth::{establish, DirectoryConnector, SessionOutcome};
use crate::config::SessionConfig;
use crate::errors::ADError;
use crate::ldap_helpers::{attr_lists, filters};
use crate::ldap_utils::{domain_to_base_dn, pso_container_dn};
use crate::pso::{project_groups, project_policy_detail, project_users};
use crate::report::{
    render_policy_details, AssignmentTable, Painter, PRIVILEGE_WARNING, TRUNCATION_WARNING,
};
use crate::secure_types::Credentials;
use crate::session::{search, DirectorySession, SearchOutcome, SearchRequest};

/// Independent query families, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryFamily {
    Groups,
    Users,
    PolicyDetails,
}

impl QueryFamily {
    pub const ALL: [QueryFamily; 3] = [
        QueryFamily::Groups,
        QueryFamily::Users,
        QueryFamily::PolicyDetails,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            QueryFamily::Groups => "Groups with PSO applied:",
            QueryFamily::Users => "Users with PSO applied:",
            QueryFamily::PolicyDetails => "PSO Details:",
        }
    }
}

/// How a family ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FamilyStatus {
    Completed,
    /// Neither LDAP nor LDAPS produced a bound session
    NoSession,
    /// Bound, but the search failed
    SearchFailed,
}

/// Output of one query family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    pub family: QueryFamily,
    pub status: FamilyStatus,
    /// Diagnostics and rendered results, in print order
    pub lines: Vec<String>,
}

/// Process exit status derived from the family outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitStatus {
    Success,
    /// At least one family failed
    PartialFailure,
    /// No family could obtain a session
    ConnectivityFailure,
}

impl ExitStatus {
    /// Exit code. 2 is left to argument parsing errors.
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::PartialFailure => 1,
            ExitStatus::ConnectivityFailure => 3,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Reports of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub reports: Vec<FamilyReport>,
}

impl AuditSummary {
    pub fn report(&self, family: QueryFamily) -> Option<&FamilyReport> {
        self.reports.iter().find(|r| r.family == family)
    }

    pub fn exit_status(&self) -> ExitStatus {
        if !self.reports.is_empty()
            && self.reports.iter().all(|r| r.status == FamilyStatus::NoSession)
        {
            ExitStatus::ConnectivityFailure
        } else if self.reports.iter().any(|r| r.status != FamilyStatus::Completed) {
            ExitStatus::PartialFailure
        } else {
            ExitStatus::Success
        }
    }
}

/// Enumerates PSO assignments and settings for one domain.
pub struct PsoAuditClient<C: DirectoryConnector> {
    connector: C,
    credentials: Credentials,
    config: SessionConfig,
    painter: Box<dyn Painter>,
}

impl<C: DirectoryConnector> PsoAuditClient<C> {
    pub fn new(
        connector: C,
        credentials: Credentials,
        config: SessionConfig,
        painter: Box<dyn Painter>,
    ) -> Self {
        Self {
            connector,
            credentials,
            config,
            painter,
        }
    }

    /// Base DN of the domain, e.g. `DC=corp,DC=local`
    pub fn base_dn(&self) -> String {
        domain_to_base_dn(self.credentials.domain())
    }

    /// Runs all families in order: groups, users, policy detail.
    pub async fn run_all(&self) -> AuditSummary {
        let mut summary = AuditSummary::default();
        for family in QueryFamily::ALL {
            let report = self.run_family(family).await;
            info!("{:?} finished with {:?}", family, report.status);
            summary.reports.push(report);
        }
        summary
    }

    pub async fn run_family(&self, family: QueryFamily) -> FamilyReport {
        match family {
            QueryFamily::Groups => self.group_pso_report().await,
            QueryFamily::Users => self.user_pso_report().await,
            QueryFamily::PolicyDetails => self.pso_details_report().await,
        }
    }

    /// Groups with `msDS-PSOApplied`.
    pub async fn group_pso_report(&self) -> FamilyReport {
        let request = SearchRequest::new(self.base_dn(), filters::ALL_GROUPS, attr_lists::GROUP_PSO);
        self.execute(QueryFamily::Groups, request, |outcome, painter| {
            let rows = project_groups(&outcome.entries);
            AssignmentTable::groups(&rows).render(painter)
        })
        .await
    }

    /// Users with `msDS-ResultantPSO`.
    pub async fn user_pso_report(&self) -> FamilyReport {
        let request = SearchRequest::new(self.base_dn(), filters::ALL_USERS, attr_lists::USER_PSO);
        self.execute(QueryFamily::Users, request, |outcome, painter| {
            let rows = project_users(&outcome.entries);
            AssignmentTable::users(&rows).render(painter)
        })
        .await
    }

    /// Full settings of every PSO in the password settings container.
    pub async fn pso_details_report(&self) -> FamilyReport {
        let request = SearchRequest::new(
            pso_container_dn(self.credentials.domain()),
            filters::PASSWORD_SETTINGS,
            attr_lists::PSO_DETAIL,
        );
        self.execute(QueryFamily::PolicyDetails, request, |outcome, painter| {
            if outcome.entries.is_empty() {
                warn!("PSO container search returned no entries; likely insufficient privileges");
            }
            render_policy_details(&project_policy_detail(&outcome.entries), painter)
        })
        .await
    }

    /// Session lifecycle shared by all families: establish, search once,
    /// unbind, render.
    async fn execute<F>(&self, family: QueryFamily, request: SearchRequest, render: F) -> FamilyReport
    where
        F: FnOnce(&SearchOutcome, &dyn Painter) -> Vec<String>,
    {
        let mut lines = Vec::new();

        let mut session =
            match establish(&self.connector, &self.credentials, &self.config, &mut lines).await {
                SessionOutcome::Established { session, .. } => session,
                SessionOutcome::Failed { attempts } => {
                    error!("{:?}: no session after {} attempts", family, attempts.len());
                    return FamilyReport {
                        family,
                        status: FamilyStatus::NoSession,
                        lines,
                    };
                }
            };

        let result = search(&mut session, &request).await;
        session.unbind().await;

        match result {
            Ok(outcome) => {
                if outcome.truncated {
                    lines.push(TRUNCATION_WARNING.to_string());
                }
                lines.extend(render(&outcome, self.painter.as_ref()));
                FamilyReport {
                    family,
                    status: FamilyStatus::Completed,
                    lines,
                }
            }
            Err(e) => {
                if e.is_visibility_error() {
                    warn!("{:?}: {} is not readable by this account: {}", family, request.base, e);
                } else {
                    error!("{:?}: search in {} failed: {}", family, request.base, e);
                }
                lines.push(search_failure_message(family, &e));
                FamilyReport {
                    family,
                    status: FamilyStatus::SearchFailed,
                    lines,
                }
            }
        }
    }
}

fn search_failure_message(family: QueryFamily, err: &ADError) -> String {
    match family {
        QueryFamily::PolicyDetails => format!("{} Error: {}", PRIVILEGE_WARNING, err),
        QueryFamily::Groups => format!("Could not enumerate groups: {}", err),
        QueryFamily::Users => format!("Could not enumerate users: {}", err),
    }
}
