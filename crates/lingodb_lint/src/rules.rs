//! Rule descriptors, descriptor validation, and the built-in rules.

use crate::report::{LintLevel, LintReport};
use lingodb_compose::CompositeDocument;
use lingodb_model::{Bundle, Message};
use serde_json::Value;
use thiserror::Error;

/// The document type the rules inspect.
pub type TranslationDocument = CompositeDocument<Bundle, Message>;

/// The locale surface a lint pass runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSettings {
    /// Locales every bundle is expected to cover.
    pub locales: Vec<String>,
    /// The locale translations originate from.
    pub base_locale: String,
}

impl LintSettings {
    /// Creates settings for the given locale set.
    pub fn new<S: Into<String>>(base_locale: impl Into<String>, locales: Vec<S>) -> Self {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            base_locale: base_locale.into(),
        }
    }
}

/// A lint rule over one joined document.
pub trait LintRule: Send + Sync {
    /// Stable rule id, referenced by descriptors and reports.
    fn id(&self) -> &'static str;

    /// Severity used when no descriptor overrides it.
    fn default_level(&self) -> LintLevel;

    /// Checks one document, reporting findings at `level`.
    fn check(
        &self,
        doc: &TranslationDocument,
        settings: &LintSettings,
        level: LintLevel,
    ) -> Vec<LintReport>;
}

/// Flags bundles that lack a message for a configured locale.
pub struct MissingTranslation;

impl LintRule for MissingTranslation {
    fn id(&self) -> &'static str {
        "missing_translation"
    }

    fn default_level(&self) -> LintLevel {
        LintLevel::Warning
    }

    fn check(
        &self,
        doc: &TranslationDocument,
        settings: &LintSettings,
        level: LintLevel,
    ) -> Vec<LintReport> {
        settings
            .locales
            .iter()
            .filter(|locale| !doc.children.iter().any(|m| &m.locale == *locale))
            .map(|locale| LintReport {
                rule_id: self.id().to_string(),
                bundle_id: doc.id().to_string(),
                message_id: None,
                variant_id: None,
                level,
                message: format!("bundle '{}' has no message for locale '{locale}'", doc.id()),
            })
            .collect()
    }
}

/// Flags variants whose pattern renders nothing.
pub struct EmptyPattern;

impl LintRule for EmptyPattern {
    fn id(&self) -> &'static str {
        "empty_pattern"
    }

    fn default_level(&self) -> LintLevel {
        LintLevel::Error
    }

    fn check(
        &self,
        doc: &TranslationDocument,
        _settings: &LintSettings,
        level: LintLevel,
    ) -> Vec<LintReport> {
        let mut reports = Vec::new();
        for message in &doc.children {
            for variant in &message.variants {
                if variant.pattern.is_empty() {
                    reports.push(LintReport {
                        rule_id: self.id().to_string(),
                        bundle_id: doc.id().to_string(),
                        message_id: Some(message.id.clone()),
                        variant_id: Some(variant.id.clone()),
                        level,
                        message: format!(
                            "variant '{}' of message '{}' has an empty pattern",
                            variant.id, message.id
                        ),
                    });
                }
            }
        }
        reports
    }
}

/// Returns every built-in rule.
pub fn builtin_rules() -> Vec<Box<dyn LintRule>> {
    vec![Box::new(MissingTranslation), Box::new(EmptyPattern)]
}

/// A validated reference to a rule, with an optional severity override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Id of a built-in rule.
    pub id: String,
    /// Severity override; `None` keeps the rule's default.
    pub level: Option<LintLevel>,
}

/// All validation failures found while loading rule descriptors.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid rule configuration: {}", .errors.join("; "))]
pub struct RuleConfigError {
    /// One entry per problem found, covering the whole input.
    pub errors: Vec<String>,
}

/// Validates a rule-descriptor configuration value.
///
/// Expects a JSON array of `{"id": <rule id>, "level": "warning"|"error"}`
/// objects (level optional). Validation runs over the whole array and
/// collects every problem instead of stopping at the first, so a config
/// author sees all mistakes at once.
pub fn load_rule_descriptors(config: &Value) -> Result<Vec<RuleDescriptor>, RuleConfigError> {
    let known: Vec<&str> = builtin_rules().iter().map(|r| r.id()).collect();

    let Some(entries) = config.as_array() else {
        return Err(RuleConfigError {
            errors: vec!["rule configuration must be an array".to_string()],
        });
    };

    let mut descriptors = Vec::new();
    let mut errors = Vec::new();
    for (position, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            errors.push(format!("entry {position}: must be an object"));
            continue;
        };

        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            Some(_) => {
                errors.push(format!("entry {position}: 'id' must not be empty"));
                continue;
            }
            None => {
                errors.push(format!("entry {position}: missing string field 'id'"));
                continue;
            }
        };
        if !known.contains(&id.as_str()) {
            errors.push(format!("entry {position}: unknown rule '{id}'"));
            continue;
        }

        let level = match object.get("level") {
            None => None,
            Some(value) => match serde_json::from_value::<LintLevel>(value.clone()) {
                Ok(level) => Some(level),
                Err(_) => {
                    errors.push(format!(
                        "entry {position}: 'level' must be \"warning\" or \"error\""
                    ));
                    continue;
                }
            },
        };

        descriptors.push(RuleDescriptor { id, level });
    }

    if errors.is_empty() {
        Ok(descriptors)
    } else {
        Err(RuleConfigError { errors })
    }
}
