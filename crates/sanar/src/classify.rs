//! Failure classification.
//!
//! Every failure gets exactly one [`RootCauseCategory`] from a fixed-priority
//! rule cascade, evaluated over lower-cased error text, captured console
//! errors and captured network requests:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐   ┌────────┐
//! │ Environment  │──►│ Backend      │──►│ Frontend     │──►│ Data     │──►│ UI     │
//! │ refused/ssl/ │   │ status ≥ 400 │   │ console err/ │   │ expected │   │default │
//! │ timeout/crash│   │ or slow call │   │ uncaught ... │   │ received │   │        │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────┘   └────────┘
//! ```
//!
//! The cascade is pure. The generative collaborator is consulted afterwards
//! only for prose (reason and fix); when it is unavailable or its reply is
//! unusable the per-category defaults in [`CATEGORY_PROFILES`] are used.

use crate::config::ClassifierConfig;
use crate::llm::Generator;
use crate::model::{ExecutionResult, FailureRecord, NetworkEntry};
use crate::result::{SanarError, SanarResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Root-cause category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootCauseCategory {
    /// Element not found, visibility, layout
    #[serde(rename = "UI Issue")]
    Ui,
    /// Client-side script error
    #[serde(rename = "Frontend Issue")]
    Frontend,
    /// Failing or slow API call
    #[serde(rename = "Backend Issue")]
    Backend,
    /// Wrong or unexpected values
    #[serde(rename = "Data Issue")]
    Data,
    /// Connectivity, certificates, timeouts, crashes
    #[serde(rename = "Environment Issue")]
    Environment,
}

/// Evaluation order of the cascade; the last entry is the default.
pub const CATEGORY_PRIORITY: [RootCauseCategory; 5] = [
    RootCauseCategory::Environment,
    RootCauseCategory::Backend,
    RootCauseCategory::Frontend,
    RootCauseCategory::Data,
    RootCauseCategory::Ui,
];

impl RootCauseCategory {
    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ui => "UI Issue",
            Self::Frontend => "Frontend Issue",
            Self::Backend => "Backend Issue",
            Self::Data => "Data Issue",
            Self::Environment => "Environment Issue",
        }
    }

    /// Static profile row for this category
    #[must_use]
    pub fn profile(&self) -> &'static CategoryProfile {
        CATEGORY_PROFILES
            .iter()
            .find(|p| p.category == *self)
            .unwrap_or(&CATEGORY_PROFILES[0])
    }
}

impl fmt::Display for RootCauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Responsible role and fallback prose for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProfile {
    /// Category
    pub category: RootCauseCategory,
    /// Responsible role
    pub assignee: &'static str,
    /// Reason used when the model gives none
    pub default_reason: &'static str,
    /// Fix used when the model gives none
    pub default_fix: &'static str,
}

/// Per-category assignee and default templates
pub const CATEGORY_PROFILES: [CategoryProfile; 5] = [
    CategoryProfile {
        category: RootCauseCategory::Ui,
        assignee: "QA Engineer",
        default_reason: "The target element could not be found or was not in the expected state.",
        default_fix: "Verify the locator and wait for the element to become visible before interacting.",
    },
    CategoryProfile {
        category: RootCauseCategory::Frontend,
        assignee: "Frontend Developer",
        default_reason: "A client-side script error broke the page during the test.",
        default_fix: "Inspect the captured console errors and fix the failing script.",
    },
    CategoryProfile {
        category: RootCauseCategory::Backend,
        assignee: "Backend Developer",
        default_reason: "An API call returned an error status or responded too slowly.",
        default_fix: "Check the failing endpoint's server logs and response times.",
    },
    CategoryProfile {
        category: RootCauseCategory::Data,
        assignee: "QA / Data Team",
        default_reason: "The application showed a value different from the one the test expected.",
        default_fix: "Verify the test data and the expected values used by the assertion.",
    },
    CategoryProfile {
        category: RootCauseCategory::Environment,
        assignee: "DevOps / Environment Team",
        default_reason: "The test environment was unreachable, insecure, too slow or crashed.",
        default_fix: "Check that the target environment is up, reachable and correctly certified.",
    },
];

/// Error-text signatures meaning the environment itself failed
pub const ENVIRONMENT_SIGNATURES: &[(&str, &str)] = &[
    (
        r"net::err_connection_refused|econnrefused|connection refused",
        "connection refused",
    ),
    (
        r"net::err_ssl|net::err_cert|ssl_error|ssl routines|self[- ]signed certificate",
        "ssl error",
    ),
    (r"timeout|timed out", "timeout"),
    (
        r"page crashed|target crashed|browser has been closed|target closed",
        "page crash",
    ),
];

/// Error-text signatures of client-side script errors
pub const FRONTEND_SIGNATURES: &[(&str, &str)] = &[
    (r"uncaught", "uncaught exception"),
    (r"referenceerror", "reference error"),
    (r"typeerror", "type error"),
    (r"syntaxerror", "syntax error"),
];

/// Error-text signatures of wrong values
pub const DATA_SIGNATURES: &[(&str, &str)] = &[
    (r"(?s)expected.*(received|to be|to equal)", "expected/received mismatch"),
    (r"mismatch|wrong value", "value mismatch"),
];

/// What a rule inspects
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Regex over lower-cased error text
    ErrorText(Regex),
    /// Any request with status ≥ 400 or slower than the threshold
    NetworkFailure,
    /// Any console error captured
    ConsoleCaptured,
}

/// One (pattern, outcome) row of the cascade
#[derive(Debug, Clone)]
pub struct Rule {
    /// Category assigned on match
    pub category: RootCauseCategory,
    /// What is inspected
    pub kind: RuleKind,
    /// Short description of the signal
    pub label: &'static str,
}

/// Outcome of evaluating the cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Assigned category
    pub category: RootCauseCategory,
    /// Signal that decided it (`default` for UI fall-through)
    pub signal: String,
}

/// The compiled, ordered cascade
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    rules: Vec<Rule>,
    slow_response_ms: u64,
}

impl ClassificationRules {
    /// Compile the static signature tables in priority order
    pub fn compile(config: &ClassifierConfig) -> SanarResult<Self> {
        let mut rules = Vec::new();
        for category in CATEGORY_PRIORITY {
            match category {
                RootCauseCategory::Environment => {
                    push_text_rules(&mut rules, category, ENVIRONMENT_SIGNATURES)?;
                }
                RootCauseCategory::Backend => rules.push(Rule {
                    category,
                    kind: RuleKind::NetworkFailure,
                    label: "failing or slow API call",
                }),
                RootCauseCategory::Frontend => {
                    rules.push(Rule {
                        category,
                        kind: RuleKind::ConsoleCaptured,
                        label: "console error captured",
                    });
                    push_text_rules(&mut rules, category, FRONTEND_SIGNATURES)?;
                }
                RootCauseCategory::Data => push_text_rules(&mut rules, category, DATA_SIGNATURES)?,
                RootCauseCategory::Ui => {}
            }
        }
        Ok(Self {
            rules,
            slow_response_ms: config.slow_response_ms,
        })
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Evaluate the cascade; pure in its inputs
    #[must_use]
    pub fn evaluate(
        &self,
        error_text: &str,
        console_errors: &[String],
        network: &[NetworkEntry],
    ) -> Verdict {
        let error = error_text.to_lowercase();
        for rule in &self.rules {
            let hit = match &rule.kind {
                RuleKind::ErrorText(re) => re.is_match(&error),
                RuleKind::NetworkFailure => network
                    .iter()
                    .any(|n| n.is_error_status() || n.is_slow(self.slow_response_ms)),
                RuleKind::ConsoleCaptured => !console_errors.is_empty(),
            };
            if hit {
                return Verdict {
                    category: rule.category,
                    signal: rule.label.to_string(),
                };
            }
        }
        Verdict {
            category: RootCauseCategory::Ui,
            signal: "default".to_string(),
        }
    }
}

fn push_text_rules(
    rules: &mut Vec<Rule>,
    category: RootCauseCategory,
    table: &[(&str, &'static str)],
) -> SanarResult<()> {
    for &(pattern, label) in table {
        let re = Regex::new(pattern).map_err(|e| SanarError::invalid_pattern(pattern, &e))?;
        rules.push(Rule {
            category,
            kind: RuleKind::ErrorText(re),
            label,
        });
    }
    Ok(())
}

/// Diagnosis attached to a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCauseResult {
    /// Assigned category
    pub category: RootCauseCategory,
    /// One-sentence reason
    pub reason: String,
    /// Formatted API-call log
    pub api_log: String,
    /// One-sentence remediation
    pub suggested_fix: String,
    /// Responsible role
    pub assignee: String,
    /// Screenshot / DOM / console references
    pub evidence: Vec<String>,
    /// Signal that decided the category
    pub signal: String,
    /// Whether reason and fix came from the model
    pub generated: bool,
}

/// Reply shape requested from the model
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedDiagnosis {
    reason: Option<String>,
    #[serde(alias = "suggested_fix", alias = "suggestedFix")]
    fix: Option<String>,
}

const DIAGNOSIS_SYSTEM: &str = "You are a QA triage assistant. Reply with a single JSON object \
     {\"reason\": \"...\", \"fix\": \"...\"}: one sentence each, naming the concrete error or \
     endpoint. No other text.";

const MAX_PROSE_CHARS: usize = 300;

/// Assigns categories and prose to failures
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    rules: ClassificationRules,
    generator: Arc<dyn Generator>,
}

impl FailureClassifier {
    /// Create a classifier
    pub fn new(config: &ClassifierConfig, generator: Arc<dyn Generator>) -> SanarResult<Self> {
        Ok(Self {
            rules: ClassificationRules::compile(config)?,
            generator,
        })
    }

    /// The compiled cascade
    #[must_use]
    pub const fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Category only, without consulting the model
    #[must_use]
    pub fn categorize(&self, record: &FailureRecord) -> Verdict {
        self.rules
            .evaluate(&record.error, &record.console_errors, &record.network)
    }

    /// Full diagnosis for one failure
    pub async fn classify(&self, record: &FailureRecord) -> RootCauseResult {
        let verdict = self.categorize(record);
        let profile = verdict.category.profile();

        let prompt = diagnosis_prompt(record, verdict.category);
        let reply = match self.generator.complete(DIAGNOSIS_SYSTEM, &prompt).await {
            Ok(text) => parse_diagnosis(&text),
            Err(e) => {
                tracing::warn!(
                    title = %record.title,
                    error = %e,
                    "diagnosis unavailable, using defaults"
                );
                None
            }
        };
        let reason = resolve_reason(reply.as_ref(), profile);
        let fix = resolve_fix(reply.as_ref(), profile);
        let generated = reason.1 && fix.1;

        tracing::debug!(
            title = %record.title,
            category = %verdict.category,
            signal = %verdict.signal,
            generated,
            "classified"
        );
        RootCauseResult {
            category: verdict.category,
            reason: reason.0,
            api_log: format_api_log(&record.network, self.rules.slow_response_ms),
            suggested_fix: fix.0,
            assignee: profile.assignee.to_string(),
            evidence: evidence_refs(record),
            signal: verdict.signal,
            generated,
        }
    }

    /// Classify every failure of a result in order; returns how many
    pub async fn classify_all(&self, result: &mut ExecutionResult) -> usize {
        for record in &mut result.failures {
            let diagnosis = self.classify(record).await;
            record.root_cause = Some(diagnosis);
        }
        result.failures.len()
    }
}

fn diagnosis_prompt(record: &FailureRecord, category: RootCauseCategory) -> String {
    let mut prompt = format!(
        "Category: {}\nTest: {}\nFile: {}\nError: {}\n",
        category,
        record.title,
        record.file,
        record.error.chars().take(MAX_PROSE_CHARS).collect::<String>()
    );
    if !record.console_errors.is_empty() {
        prompt.push_str("Console errors:\n");
        for line in record.console_errors.iter().take(3) {
            prompt.push_str(&format!("- {line}\n"));
        }
    }
    let failing: Vec<&NetworkEntry> = record
        .network
        .iter()
        .filter(|n| n.is_error_status())
        .take(5)
        .collect();
    if !failing.is_empty() {
        prompt.push_str("Failing API calls:\n");
        for n in failing {
            prompt.push_str(&format!("- {} {} -> {}\n", n.method, n.url, n.status));
        }
    }
    prompt
}

fn parse_diagnosis(text: &str) -> Option<GeneratedDiagnosis> {
    let start = text.find('{')?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<GeneratedDiagnosis>()
        .next()
        .and_then(Result::ok)
}

fn usable(text: Option<&String>) -> Option<String> {
    let text = text?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(MAX_PROSE_CHARS).collect())
    }
}

fn resolve_reason(reply: Option<&GeneratedDiagnosis>, profile: &CategoryProfile) -> (String, bool) {
    usable(reply.and_then(|r| r.reason.as_ref())).map_or_else(
        || (profile.default_reason.to_string(), false),
        |text| (text, true),
    )
}

fn resolve_fix(reply: Option<&GeneratedDiagnosis>, profile: &CategoryProfile) -> (String, bool) {
    usable(reply.and_then(|r| r.fix.as_ref())).map_or_else(
        || (profile.default_fix.to_string(), false),
        |text| (text, true),
    )
}

/// `METHOD URL -> STATUS (N ms)` per captured request
#[must_use]
pub fn format_api_log(network: &[NetworkEntry], slow_response_ms: u64) -> String {
    if network.is_empty() {
        return "No API calls captured".to_string();
    }
    network
        .iter()
        .map(|n| {
            let flag = if n.is_error_status() {
                " [FAILED]"
            } else if n.is_slow(slow_response_ms) {
                " [SLOW]"
            } else {
                ""
            };
            format!("{} {} -> {} ({} ms){flag}", n.method, n.url, n.status, n.response_time)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn evidence_refs(record: &FailureRecord) -> Vec<String> {
    let mut refs = Vec::new();
    if let Some(shot) = &record.screenshot {
        refs.push(format!("screenshot: {}", shot.display()));
    }
    if record.dom_snapshot.is_some() {
        refs.push("dom snapshot captured".to_string());
    }
    if !record.console_errors.is_empty() {
        refs.push(format!("console errors: {}", record.console_errors.len()));
    }
    refs
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::llm::{DisabledGenerator, ScriptedGenerator};
    use proptest::prelude::*;

    fn classifier(generator: Arc<dyn Generator>) -> FailureClassifier {
        FailureClassifier::new(&ClassifierConfig::default(), generator).unwrap()
    }

    fn rules() -> ClassificationRules {
        ClassificationRules::compile(&ClassifierConfig::default()).unwrap()
    }

    #[test]
    fn test_rule_table_follows_priority() {
        let order: Vec<RootCauseCategory> = rules().iter().map(|r| r.category).collect();
        let mut dedup = order.clone();
        dedup.dedup();
        assert_eq!(
            dedup,
            vec![
                RootCauseCategory::Environment,
                RootCauseCategory::Backend,
                RootCauseCategory::Frontend,
                RootCauseCategory::Data,
            ]
        );
        assert_eq!(CATEGORY_PRIORITY.last(), Some(&RootCauseCategory::Ui));
    }

    #[test]
    fn test_every_category_has_a_profile() {
        for category in CATEGORY_PRIORITY {
            assert_eq!(category.profile().category, category);
        }
        assert_eq!(
            RootCauseCategory::Environment.profile().assignee,
            "DevOps / Environment Team"
        );
        assert_eq!(RootCauseCategory::Ui.profile().assignee, "QA Engineer");
    }

    #[test]
    fn test_connection_refused_is_environment() {
        let v = rules().evaluate("net::ERR_CONNECTION_REFUSED at http://localhost:3000", &[], &[]);
        assert_eq!(v.category, RootCauseCategory::Environment);
        assert_eq!(v.signal, "connection refused");
    }

    #[test]
    fn test_environment_beats_backend() {
        let network = vec![NetworkEntry::new("GET", "/api/items", 500, 20)];
        let v = rules().evaluate("Error: connect ECONNREFUSED 127.0.0.1:8080", &[], &network);
        assert_eq!(v.category, RootCauseCategory::Environment);
    }

    #[test]
    fn test_server_error_beats_ui_text() {
        let network = vec![NetworkEntry::new("GET", "/api/items", 500, 20)];
        let v = rules().evaluate("element not visible", &[], &network);
        assert_eq!(v.category, RootCauseCategory::Backend);
    }

    #[test]
    fn test_slow_call_is_backend() {
        let network = vec![NetworkEntry::new("GET", "/api/report", 200, 4500)];
        let v = rules().evaluate("element not visible", &[], &network);
        assert_eq!(v.category, RootCauseCategory::Backend);
        let fast = vec![NetworkEntry::new("GET", "/api/report", 200, 3000)];
        assert_eq!(
            rules().evaluate("element not visible", &[], &fast).category,
            RootCauseCategory::Ui
        );
    }

    #[test]
    fn test_backend_threshold_is_configurable() {
        let config = ClassifierConfig {
            slow_response_ms: 100,
        };
        let r = ClassificationRules::compile(&config).unwrap();
        let network = vec![NetworkEntry::new("GET", "/api", 200, 150)];
        assert_eq!(r.evaluate("x", &[], &network).category, RootCauseCategory::Backend);
    }

    #[test]
    fn test_console_error_is_frontend() {
        let v = rules().evaluate("locator not found", &["Failed to load chunk".into()], &[]);
        assert_eq!(v.category, RootCauseCategory::Frontend);
        let v = rules().evaluate("ReferenceError: cart is not defined", &[], &[]);
        assert_eq!(v.category, RootCauseCategory::Frontend);
    }

    #[test]
    fn test_expected_received_is_data() {
        let v = rules().evaluate("Expected: \"3 items\"\nReceived: \"2 items\"", &[], &[]);
        assert_eq!(v.category, RootCauseCategory::Data);
        let v = rules().evaluate("price mismatch on summary", &[], &[]);
        assert_eq!(v.category, RootCauseCategory::Data);
    }

    #[test]
    fn test_default_is_ui() {
        let v = rules().evaluate("strict mode violation: locator resolved to 0 elements", &[], &[]);
        assert_eq!(v.category, RootCauseCategory::Ui);
        assert_eq!(v.signal, "default");
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&RootCauseCategory::Backend).unwrap();
        assert_eq!(json, "\"Backend Issue\"");
    }

    #[test]
    fn test_api_log_format() {
        let log = format_api_log(&[
            NetworkEntry::new("POST", "/api/login", 500, 42),
            NetworkEntry::new("GET", "/api/me", 200, 3200),
            NetworkEntry::new("GET", "/api/ok", 200, 10),
        ], 3000);
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines[0], "POST /api/login -> 500 (42 ms) [FAILED]");
        assert!(lines[1].ends_with("[SLOW]"));
        assert!(!lines[2].contains('['));
        assert_eq!(format_api_log(&[], 3000), "No API calls captured");
    }

    #[tokio::test]
    async fn test_defaults_when_generator_disabled() {
        let c = classifier(Arc::new(DisabledGenerator));
        let record = FailureRecord::new("loads", "a.spec.ts", "net::ERR_CONNECTION_REFUSED");
        let rca = c.classify(&record).await;
        assert_eq!(rca.category, RootCauseCategory::Environment);
        assert_eq!(rca.assignee, "DevOps / Environment Team");
        assert_eq!(rca.reason, RootCauseCategory::Environment.profile().default_reason);
        assert!(!rca.generated);
    }

    #[tokio::test]
    async fn test_generated_prose_is_used() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "Sure!\n{\"reason\": \"POST /api/cart returned 500.\", \"fix\": \"Fix the cart service.\"}",
        ));
        let c = classifier(generator.clone());
        let mut record = FailureRecord::new("adds item", "cart.spec.ts", "element not visible");
        record.network = vec![NetworkEntry::new("POST", "/api/cart", 500, 30)];
        let rca = c.classify(&record).await;
        assert_eq!(rca.category, RootCauseCategory::Backend);
        assert_eq!(rca.reason, "POST /api/cart returned 500.");
        assert_eq!(rca.suggested_fix, "Fix the cart service.");
        assert!(rca.generated);
        assert!(generator.prompts()[0].contains("POST /api/cart -> 500"));
    }

    #[tokio::test]
    async fn test_partial_reply_resolves_fields_independently() {
        let c = classifier(Arc::new(ScriptedGenerator::replying(
            r#"{"reason": "Button hidden."}"#,
        )));
        let rca = c.classify(&FailureRecord::new("t", "f", "not visible")).await;
        assert_eq!(rca.reason, "Button hidden.");
        assert_eq!(rca.suggested_fix, RootCauseCategory::Ui.profile().default_fix);
        assert!(!rca.generated);
    }

    #[tokio::test]
    async fn test_malformed_reply_uses_defaults() {
        let c = classifier(Arc::new(ScriptedGenerator::replying("I think it is flaky")));
        let rca = c.classify(&FailureRecord::new("t", "f", "mismatch")).await;
        assert_eq!(rca.category, RootCauseCategory::Data);
        assert_eq!(rca.reason, RootCauseCategory::Data.profile().default_reason);
    }

    #[tokio::test]
    async fn test_classify_all_keeps_order_and_attaches() {
        let c = classifier(Arc::new(DisabledGenerator));
        let artifact =
            crate::model::TestArtifact::new("a.spec.ts", crate::model::ArtifactKind::E2e);
        let mut result = ExecutionResult::from_counts(
            &artifact,
            0,
            2,
            0,
            vec![
                FailureRecord::new("one", "f", "timeout 30000ms exceeded"),
                FailureRecord::new("two", "f", "not found"),
            ],
            std::time::Duration::ZERO,
        );
        assert_eq!(c.classify_all(&mut result).await, 2);
        let cats: Vec<_> = result
            .failures
            .iter()
            .map(|f| f.root_cause.as_ref().unwrap().category)
            .collect();
        assert_eq!(cats, vec![RootCauseCategory::Environment, RootCauseCategory::Ui]);
    }

    #[test]
    fn test_evidence_refs() {
        let mut record = FailureRecord::new("t", "f", "e").with_screenshot("s.png");
        record.dom_snapshot = Some("<div/>".into());
        record.console_errors = vec!["x".into()];
        let refs = evidence_refs(&record);
        assert_eq!(refs.len(), 3);
        assert!(refs[0].contains("s.png"));
    }

    fn arb_network() -> impl Strategy<Value = Vec<NetworkEntry>> {
        proptest::collection::vec(
            (prop_oneof![Just(200u16), Just(404), Just(500)], 0u64..6000)
                .prop_map(|(s, t)| NetworkEntry::new("GET", "/api", s, t)),
            0..4,
        )
    }

    proptest! {
        #[test]
        fn prop_cascade_is_deterministic(
            error in "[a-zA-Z :]{0,40}",
            console in proptest::collection::vec("[a-z]{1,8}", 0..3),
            network in arb_network(),
        ) {
            let r = rules();
            let first = r.evaluate(&error, &console, &network);
            let _ = r.evaluate("net::err_connection_refused", &[], &[]);
            let second = r.evaluate(&error, &console, &network);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_connection_refused_always_wins(
            prefix in "[a-z ]{0,20}",
            console in proptest::collection::vec("[a-z]{1,8}", 0..3),
            network in arb_network(),
        ) {
            let error = format!("{prefix} net::ERR_CONNECTION_REFUSED");
            let v = rules().evaluate(&error, &console, &network);
            prop_assert_eq!(v.category, RootCauseCategory::Environment);
        }
    }
}
