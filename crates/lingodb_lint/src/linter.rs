//! The linter, the report feed, and the post-push lint pass.

use crate::report::{LintLevel, LintReport};
use crate::rules::{builtin_rules, LintRule, LintSettings, RuleDescriptor, TranslationDocument};
use lingodb_compose::CompositeAdapter;
use lingodb_model::{Bundle, Message};
use lingodb_replication::PushHook;
use lingodb_store::{ChangeFeed, Subscription};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Runs a fixed set of rules over joined documents.
pub struct Linter {
    rules: Vec<(Box<dyn LintRule>, LintLevel)>,
}

impl Linter {
    /// Creates a linter running every built-in rule at its default level.
    pub fn with_builtin_rules() -> Self {
        Self {
            rules: builtin_rules()
                .into_iter()
                .map(|rule| {
                    let level = rule.default_level();
                    (rule, level)
                })
                .collect(),
        }
    }

    /// Creates a linter running exactly the described rules.
    ///
    /// Descriptors come from [`load_rule_descriptors`](crate::load_rule_descriptors),
    /// so every id names a built-in rule.
    pub fn from_descriptors(descriptors: &[RuleDescriptor]) -> Self {
        let rules = descriptors
            .iter()
            .filter_map(|descriptor| {
                builtin_rules()
                    .into_iter()
                    .find(|rule| rule.id() == descriptor.id)
                    .map(|rule| {
                        let level = descriptor.level.unwrap_or_else(|| rule.default_level());
                        (rule, level)
                    })
            })
            .collect();
        Self { rules }
    }

    /// Lints every document, returning all findings.
    pub fn lint(&self, docs: &[TranslationDocument], settings: &LintSettings) -> Vec<LintReport> {
        let mut reports = Vec::new();
        for doc in docs {
            for (rule, level) in &self.rules {
                reports.extend(rule.check(doc, settings, *level));
            }
        }
        reports
    }
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|(rule, _)| rule.id()).collect();
        f.debug_struct("Linter").field("rules", &ids).finish()
    }
}

/// Republishes the latest lint pass to subscribers.
///
/// Late subscribers can read the most recent report set via
/// [`latest`](Self::latest) instead of waiting for the next pass.
#[derive(Default)]
pub struct LintReportFeed {
    latest: RwLock<Vec<LintReport>>,
    feed: ChangeFeed<Vec<LintReport>>,
}

impl LintReportFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the result of one lint pass.
    pub fn publish(&self, reports: Vec<LintReport>) {
        *self.latest.write() = reports.clone();
        self.feed.emit(reports);
    }

    /// Returns the most recently published report set.
    pub fn latest(&self) -> Vec<LintReport> {
        self.latest.read().clone()
    }

    /// Subscribes to future lint passes.
    pub fn subscribe(&self) -> Subscription<Vec<LintReport>> {
        self.feed.subscribe()
    }
}

/// A full lint pass over the joined documents of one adapter.
///
/// Wired into the replication bridge as its post-push hook: every
/// successful push re-lints the project and republishes the feed. The
/// pass runs detached from the push and its findings never fail it.
pub struct LintPass {
    adapter: Arc<CompositeAdapter<Bundle, Message>>,
    linter: Linter,
    settings: LintSettings,
    feed: Arc<LintReportFeed>,
}

impl LintPass {
    /// Creates a pass over the given adapter.
    pub fn new(
        adapter: Arc<CompositeAdapter<Bundle, Message>>,
        linter: Linter,
        settings: LintSettings,
    ) -> Self {
        Self {
            adapter,
            linter,
            settings,
            feed: Arc::new(LintReportFeed::new()),
        }
    }

    /// Returns the feed this pass publishes to.
    pub fn feed(&self) -> Arc<LintReportFeed> {
        Arc::clone(&self.feed)
    }

    /// Runs one pass and publishes the findings.
    pub fn run(&self) -> usize {
        let documents = self.adapter.read_all();
        let reports = self.linter.lint(&documents, &self.settings);
        let findings = reports.len();
        info!(documents = documents.len(), findings, "lint pass completed");
        self.feed.publish(reports);
        findings
    }
}

impl PushHook for LintPass {
    fn after_push(&self) {
        self.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::load_rule_descriptors;
    use lingodb_compose::CompositeDocument;
    use lingodb_model::Variant;
    use lingodb_store::{SlotStore, SlotStoreConfig};
    use serde_json::json;
    use tempfile::tempdir;

    fn settings() -> LintSettings {
        LintSettings::new("en", vec!["en", "de"])
    }

    fn document(locales: &[&str]) -> TranslationDocument {
        let children = locales
            .iter()
            .map(|locale| {
                Message::new(format!("greeting_{locale}"), "greeting", *locale)
                    .with_variant(Variant::text("v1", "Hello"))
            })
            .collect();
        CompositeDocument::new(Bundle::new("greeting"), children)
    }

    #[test]
    fn builtin_linter_runs_all_rules() {
        let mut doc = document(&["en"]);
        doc.children[0].variants.push(Variant {
            id: "v2".into(),
            matches: vec![],
            pattern: vec![],
        });

        let reports = Linter::with_builtin_rules().lint(&[doc], &settings());
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().any(|r| r.rule_id == "missing_translation"));
        assert!(reports.iter().any(|r| r.rule_id == "empty_pattern"));
    }

    #[test]
    fn descriptor_levels_override_defaults() {
        let descriptors = load_rule_descriptors(&json!([
            { "id": "missing_translation", "level": "error" },
        ]))
        .unwrap();

        let reports = Linter::from_descriptors(&descriptors).lint(&[document(&["en"])], &settings());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].level, LintLevel::Error);
    }

    #[test]
    fn descriptor_selection_drops_unlisted_rules() {
        let descriptors = load_rule_descriptors(&json!([{ "id": "empty_pattern" }])).unwrap();

        // The bundle misses 'de', but missing_translation is not listed.
        let reports = Linter::from_descriptors(&descriptors).lint(&[document(&["en"])], &settings());
        assert!(reports.is_empty());
    }

    #[test]
    fn feed_republishes_to_subscribers_and_late_readers() {
        let feed = LintReportFeed::new();
        let sub = feed.subscribe();

        let report = LintReport {
            rule_id: "missing_translation".into(),
            bundle_id: "greeting".into(),
            message_id: None,
            variant_id: None,
            level: LintLevel::Warning,
            message: "no message for locale 'de'".into(),
        };
        feed.publish(vec![report.clone()]);

        assert_eq!(sub.try_next(), Some(vec![report.clone()]));
        assert_eq!(feed.latest(), vec![report]);
    }

    #[test]
    fn pass_lints_the_adapter_documents() {
        let dir = tempdir().unwrap();
        let parents = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        let children = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        parents.connect(&dir.path().join("bundles")).unwrap();
        children.connect(&dir.path().join("messages")).unwrap();
        let adapter = Arc::new(CompositeAdapter::new(parents, children));

        adapter.apply(&document(&["en"])).unwrap();

        let pass = LintPass::new(Arc::clone(&adapter), Linter::with_builtin_rules(), settings());
        let feed = pass.feed();
        let sub = feed.subscribe();

        let findings = pass.run();
        assert_eq!(findings, 1);
        assert_eq!(feed.latest().len(), 1);
        assert_eq!(sub.try_next().unwrap().len(), 1);

        // Translating the missing locale clears the finding on the next
        // pass.
        adapter.apply(&document(&["en", "de"])).unwrap();
        pass.run();
        assert!(feed.latest().is_empty());
    }
}
