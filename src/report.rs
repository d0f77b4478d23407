//! Console rendering of PSO results
//!
//! Column-aligned tables for group/user assignments and labeled blocks for
//! policy detail. Highlighting goes through [`Painter`] so nothing outside
//! this module deals with terminal escape codes.

use colored::Colorize;

use crate::pso::{PolicyDetail, PsoAssignment, NOT_AVAILABLE};

/// Printed when the PSO container yields nothing readable
pub const PRIVILEGE_WARNING: &str =
    "Could not enumerate details, you likely do not have the privileges to do so!";

/// Printed when a search stopped at the server's size limit
pub const TRUNCATION_WARNING: &str =
    "Warning: the server's size limit was reached; results below are incomplete (no paging is performed).";

/// Highlighting applied to report fragments
pub trait Painter: Send + Sync {
    /// Principal column in the assignment tables
    fn principal(&self, text: &str) -> String;
    /// Policy name in the detail blocks
    fn policy_name(&self, text: &str) -> String;
    /// Numeric policy values
    fn value(&self, text: &str) -> String;
}

/// No highlighting (pipes, files, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPainter;

impl Painter for PlainPainter {
    fn principal(&self, text: &str) -> String {
        text.to_string()
    }

    fn policy_name(&self, text: &str) -> String {
        text.to_string()
    }

    fn value(&self, text: &str) -> String {
        text.to_string()
    }
}

/// ANSI colors for interactive terminals
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiPainter;

impl Painter for AnsiPainter {
    fn principal(&self, text: &str) -> String {
        text.bright_green().to_string()
    }

    fn policy_name(&self, text: &str) -> String {
        text.bright_blue().to_string()
    }

    fn value(&self, text: &str) -> String {
        text.bright_cyan().to_string()
    }
}

/// Two-column table of principal → PSO
pub struct AssignmentTable<'a> {
    pub principal_header: &'a str,
    pub pso_header: &'a str,
    pub rows: &'a [PsoAssignment],
}

impl<'a> AssignmentTable<'a> {
    pub fn users(rows: &'a [PsoAssignment]) -> Self {
        Self {
            principal_header: "Users",
            pso_header: "PSO",
            rows,
        }
    }

    pub fn groups(rows: &'a [PsoAssignment]) -> Self {
        Self {
            principal_header: "Groups",
            pso_header: "PSO",
            rows,
        }
    }

    /// Column widths: the longest cell or the header, whichever is wider.
    pub fn column_widths(&self) -> (usize, usize) {
        self.rows.iter().fold(
            (
                self.principal_header.chars().count(),
                self.pso_header.chars().count(),
            ),
            |(principal, pso), row| {
                (
                    principal.max(row.principal.chars().count()),
                    pso.max(row.pso.chars().count()),
                )
            },
        )
    }

    pub fn render(&self, painter: &dyn Painter) -> Vec<String> {
        let (pw, sw) = self.column_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format!(
            "| {:<pw$} | {:<sw$} |",
            self.principal_header, self.pso_header
        ));
        lines.push(format!("| {} | {} |", "-".repeat(pw), "-".repeat(sw)));
        for row in self.rows {
            let padded = format!("{:<pw$}", row.principal);
            lines.push(format!(
                "| {} | {:<sw$} |",
                painter.principal(&padded),
                row.pso
            ));
        }
        lines
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Labeled block for one PSO, terminated by a blank line.
pub fn render_policy_block(detail: &PolicyDetail, painter: &dyn Painter) -> Vec<String> {
    let mut lines = vec![format!(
        "Policy Name: {}",
        painter.policy_name(&or_na(detail.name.as_deref()))
    )];
    if let Some(description) = &detail.description {
        lines.push(format!("Description: {}", description));
    }
    lines.push(format!(
        "Minimum Password Length: {}",
        painter.value(&or_na(detail.minimum_password_length))
    ));
    lines.push(format!(
        "Password History Length: {}",
        painter.value(&or_na(detail.password_history_length))
    ));
    lines.push(format!(
        "Lockout Threshold: {}",
        painter.value(&or_na(detail.lockout_threshold))
    ));
    lines.push(format!(
        "Observation Window: {}",
        or_na(detail.lockout_observation_window.as_deref())
    ));
    lines.push(format!("Lockout Duration: {}", or_na(detail.lockout_duration.as_deref())));
    lines.push(format!("Complexity Enabled: {}", flag(detail.complexity_enabled)));
    lines.push(format!(
        "Minimum Password Age: {}",
        or_na(detail.minimum_password_age.as_deref())
    ));
    lines.push(format!(
        "Maximum Password Age: {}",
        or_na(detail.maximum_password_age.as_deref())
    ));
    lines.push(format!(
        "Reversible Encryption: {}",
        flag(detail.reversible_encryption_enabled)
    ));
    lines.push(format!("Precedence: {}", painter.value(&or_na(detail.precedence))));
    for dn in &detail.applies_to {
        lines.push(format!("Policy Applies to: {}", dn));
    }
    lines.push(String::new());
    lines
}

/// All policy blocks, or the privilege warning when there are none.
pub fn render_policy_details(details: &[PolicyDetail], painter: &dyn Painter) -> Vec<String> {
    if details.is_empty() {
        return vec![PRIVILEGE_WARNING.to_string()];
    }
    details
        .iter()
        .flat_map(|detail| render_policy_block(detail, painter))
        .collect()
}
