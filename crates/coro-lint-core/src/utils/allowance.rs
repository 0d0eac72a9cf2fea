//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // coro-lint: allow(GlobalScopeUsage) reason="app-wide logger flush"
//! ```
//!
//! A directive applies to its own line and to the line after it.

use std::collections::HashSet;

/// Result of checking for an allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Issue is not allowed.
    Denied,
    /// Issue is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Issue ids that are allowed.
    pub issues: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// Checks source code for an allowance comment covering `line`.
///
/// Issue ids are compared case-insensitively; `all` matches every issue.
///
/// # Arguments
///
/// * `content` - Source code content
/// * `line` - Line number to check (1-indexed)
/// * `issue_id` - Id of the issue to check for
#[must_use]
pub fn check_allow_with_reason(content: &str, line: usize, issue_id: &str) -> AllowCheck {
    let lines: Vec<&str> = content.lines().collect();

    for check_line in [line.saturating_sub(1), line] {
        if check_line == 0 || check_line > lines.len() {
            continue;
        }

        if let Some(directive) = parse_allow_directive(lines[check_line - 1]) {
            let hit = directive
                .issues
                .iter()
                .any(|i| i.eq_ignore_ascii_case(issue_id) || i == "all");
            if hit {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from a line, which may carry code before a
/// trailing `//` comment.
fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let comment_start = line.find("//")?;
    let comment = line[comment_start..].trim_start_matches('/').trim();

    let directive = comment.strip_prefix("coro-lint:")?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let issues: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if issues.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest.strip_prefix("reason=").and_then(|r| {
        let r = r.trim().strip_prefix('"')?;
        r.find('"').map(|end| r[..end].to_string())
    });

    Some(AllowDirective { issues, reason })
}
