//! # lingodb Lint
//!
//! Quality checks over joined translation documents.
//!
//! Rules are referenced by validated descriptors (a JSON array checked
//! once at load time, with every problem collected into one error) and
//! run by the [`Linter`] over the documents of a composite adapter. The
//! [`LintPass`] plugs into the replication bridge as its post-push hook:
//! each successful push re-lints the project and republishes the
//! [`LintReportFeed`] without ever failing the push.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod linter;
mod report;
mod rules;

pub use linter::{LintPass, LintReportFeed, Linter};
pub use report::{LintLevel, LintReport};
pub use rules::{
    builtin_rules, load_rule_descriptors, EmptyPattern, LintRule, LintSettings, MissingTranslation,
    RuleConfigError, RuleDescriptor, TranslationDocument,
};
