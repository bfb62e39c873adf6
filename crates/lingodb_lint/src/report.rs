//! Lint report types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    /// Worth fixing, does not block anything.
    Warning,
    /// A defect in the translation content.
    Error,
}

impl fmt::Display for LintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintLevel::Warning => f.write_str("warning"),
            LintLevel::Error => f.write_str("error"),
        }
    }
}

/// One lint finding.
///
/// `message_id` and `variant_id` narrow the location when the rule can
/// point at a specific message or variant; bundle-level findings leave
/// them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    /// Id of the rule that produced this finding.
    pub rule_id: String,
    /// The affected bundle.
    pub bundle_id: String,
    /// The affected message, if the finding is message-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// The affected variant, if the finding is variant-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    /// Severity.
    pub level: LintLevel,
    /// Human-readable description.
    pub message: String,
}
