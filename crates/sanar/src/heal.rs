//! Locator healing.
//!
//! Brittle locating expressions (class selectors, bare id selectors and
//! positional paths passed to `page.locator(...)` and friends) are detected
//! in test source and rewritten into stable lookups. Each locator walks a
//! fixed tier ladder and stops at the first success:
//!
//! ```text
//! detect ─► tier 1 structural (0.95) ─► tier 2 semantic (0.80) ─► tier 3 generative (0.65)
//!           .x / #x / @id → getByTestId   quoted text → getByRole/Text   model reply, checked
//! ```
//!
//! A healing pass reads the whole source, computes the new text in memory
//! and writes the file at most once. [`LocatorHealer::heal_and_rerun`]
//! alternates passes with re-execution up to the configured bound.

use crate::config::HealerConfig;
use crate::execution::ExecutionRunner;
use crate::llm::Generator;
use crate::model::{ExecutionResult, TestArtifact};
use crate::result::{SanarError, SanarResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a selector is considered brittle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrittleKind {
    /// `.class` or `tag.class`
    Class,
    /// `#id` or `tag#id`
    Id,
    /// XPath or nth-based positional selector
    Positional,
}

impl BrittleKind {
    /// Short label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Id => "id",
            Self::Positional => "positional",
        }
    }
}

impl fmt::Display for BrittleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Selector shapes considered brittle, checked in order
pub const BRITTLE_SELECTORS: &[(&str, BrittleKind)] = &[
    (r"^(?:css=)?[A-Za-z0-9_-]*\.[A-Za-z_-][\w-]*", BrittleKind::Class),
    (r"^(?:css=)?[A-Za-z0-9_-]*#[A-Za-z_-][\w-]*", BrittleKind::Id),
    (
        r"^(?:xpath=)?\(*/|:nth-(?:child|of-type)\(|>>\s*nth=",
        BrittleKind::Positional,
    ),
];

/// Where a tier-1 token can be lifted from, checked in order
pub const STRUCTURAL_TOKENS: &[&str] = &[
    r"^(?:css=)?[A-Za-z0-9_-]*[.#](?P<token>[A-Za-z_][\w-]*)",
    r#"@(?:id|class)\s*=\s*['"](?P<token>[A-Za-z_][\w-]*)"#,
    r#"contains\(\s*@(?:class|id)\s*,\s*['"](?P<token>[A-Za-z_][\w-]*)"#,
];

/// Where a tier-2 text fragment can be lifted from, checked in order
pub const TEXT_FRAGMENTS: &[&str] = &[
    r#"text\(\)\s*=\s*['"](?P<text>[^'"]{3,40})['"]"#,
    r#"contains\(\s*(?:text\(\)|\.)\s*,\s*['"](?P<text>[^'"]{3,40})['"]"#,
    r#"has-text\(\s*['"](?P<text>[^'"]{3,40})['"]"#,
    r#"['"](?P<text>[^'"]{3,40})['"]"#,
];

/// Role query chosen from the text around a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticRole {
    /// `getByRole('button')`
    Button,
    /// `getByRole('textbox')`
    Input,
    /// `getByRole('link')`
    Link,
    /// `getByRole('heading')`
    Heading,
}

impl SemanticRole {
    /// ARIA role name
    #[must_use]
    pub const fn aria(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Input => "textbox",
            Self::Link => "link",
            Self::Heading => "heading",
        }
    }
}

/// Keyword families in priority order
pub const ROLE_FAMILIES: &[(&str, SemanticRole)] = &[
    (r"button|btn|submit", SemanticRole::Button),
    (r"input|field|textbox", SemanticRole::Input),
    (r"link|anchor|href", SemanticRole::Link),
    (r"heading|title", SemanticRole::Heading),
];

/// Healing tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealTier {
    /// Stable test-id lookup from a class/id token
    Structural,
    /// Role or text query from a quoted fragment
    Semantic,
    /// Replacement proposed by the generative collaborator
    Generative,
}

impl HealTier {
    /// Fixed confidence of a heal at this tier
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        match self {
            Self::Structural => 0.95,
            Self::Semantic => 0.80,
            Self::Generative => 0.65,
        }
    }

    /// Position in the ladder (1-based)
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Structural => 1,
            Self::Semantic => 2,
            Self::Generative => 3,
        }
    }
}

impl fmt::Display for HealTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Structural => "structural",
            Self::Semantic => "semantic",
            Self::Generative => "generative",
        };
        write!(f, "tier {} ({name})", self.number())
    }
}

/// A brittle locating expression found in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedLocator {
    /// Full expression as written, e.g. `page.locator('.submit-btn')`
    pub expression: String,
    /// Receiver the call was made on
    pub receiver: String,
    /// Selector argument without quotes
    pub selector: String,
    /// Why it is brittle
    pub kind: BrittleKind,
    /// 1-based line of the first occurrence
    pub line: usize,
}

/// Outcome of healing one locator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealResult {
    /// Original expression
    pub original: String,
    /// Replacement, or the original when healing failed
    pub healed: String,
    /// Tier that stopped the ladder
    pub tier: HealTier,
    /// Fixed per-tier confidence (0.0 on failure)
    pub confidence: f64,
    /// Tiers tried
    pub attempts: u8,
    /// Whether a replacement was produced
    pub success: bool,
    /// Source line
    pub line: usize,
    /// Brittleness kind
    pub kind: BrittleKind,
}

impl HealResult {
    fn healed_at(locator: &DetectedLocator, replacement: String, tier: HealTier) -> Self {
        Self {
            original: locator.expression.clone(),
            healed: replacement,
            tier,
            confidence: tier.confidence(),
            attempts: tier.number(),
            success: true,
            line: locator.line,
            kind: locator.kind,
        }
    }

    fn unhealed(locator: &DetectedLocator) -> Self {
        Self {
            original: locator.expression.clone(),
            healed: locator.expression.clone(),
            tier: HealTier::Generative,
            confidence: 0.0,
            attempts: HealTier::Generative.number(),
            success: false,
            line: locator.line,
            kind: locator.kind,
        }
    }
}

/// Results of one healing pass over one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealingReport {
    /// Source file
    pub artifact: PathBuf,
    /// Brittle locators detected
    pub total_locators: usize,
    /// Locators healed
    pub healed: usize,
    /// Locators left as they were
    pub failed: usize,
    /// Per-locator results in detection order
    pub results: Vec<HealResult>,
    /// Whether the file was rewritten
    pub rewritten: bool,
    /// Whether the pass ran without writing
    pub dry_run: bool,
}

impl HealingReport {
    fn new(artifact: &Path, results: Vec<HealResult>, rewritten: bool, dry_run: bool) -> Self {
        let healed = results.iter().filter(|r| r.success).count();
        Self {
            artifact: artifact.to_path_buf(),
            total_locators: results.len(),
            healed,
            failed: results.len() - healed,
            results,
            rewritten,
            dry_run,
        }
    }
}

/// Result of the heal-and-rerun loop
#[derive(Debug, Clone)]
pub struct HealOutcome {
    /// Latest execution result
    pub result: ExecutionResult,
    /// One report per completed pass
    pub reports: Vec<HealingReport>,
    /// Heal-and-execute cycles consumed
    pub attempts: u32,
}

impl HealOutcome {
    /// Locators healed across all passes
    #[must_use]
    pub fn healed_locators(&self) -> usize {
        self.reports.iter().map(|r| r.healed).sum()
    }
}

/// Finds brittle locating expressions
#[derive(Debug, Clone)]
pub struct LocatorDetector {
    call: Regex,
    kinds: Vec<(Regex, BrittleKind)>,
}

impl LocatorDetector {
    /// Build a detector for the given receivers
    pub fn new(receivers: &[String]) -> SanarResult<Self> {
        if receivers.iter().all(|r| r.trim().is_empty()) {
            return Err(SanarError::config("healer.receivers must name at least one receiver"));
        }
        let mut receivers: Vec<&str> = receivers
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect();
        receivers.sort_by_key(|r| std::cmp::Reverse(r.len()));
        let alternation = receivers
            .iter()
            .map(|r| regex::escape(r))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r#"\b(?P<recv>{alternation})\s*\.\s*(?:locator|\$\$|\$)\(\s*(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)'|`(?P<bt>[^`\n]*)`)\s*\)"#
        );
        let call = compile(&pattern)?;

        let kinds = BRITTLE_SELECTORS
            .iter()
            .map(|&(pattern, kind)| compile(pattern).map(|re| (re, kind)))
            .collect::<SanarResult<_>>()?;
        Ok(Self { call, kinds })
    }

    /// Brittleness of a bare selector, if any
    ///
    /// The element a CSS selector resolves to decides the kind, so
    /// `#form .submit` is a class locator. Ancestors count only when the
    /// target compound itself is not brittle.
    #[must_use]
    pub fn classify_selector(&self, selector: &str) -> Option<BrittleKind> {
        let selector = selector.trim();
        let subject = selector_subject(selector);
        [subject, selector].into_iter().find_map(|target| {
            self.kinds
                .iter()
                .find(|(re, _)| re.is_match(target))
                .map(|(_, kind)| *kind)
        })
    }

    /// All distinct brittle expressions in source order
    #[must_use]
    pub fn detect(&self, source: &str) -> Vec<DetectedLocator> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for caps in self.call.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            let selector = ["dq", "sq", "bt"]
                .iter()
                .find_map(|name| caps.name(name))
                .map_or("", |m| m.as_str());
            let Some(kind) = self.classify_selector(selector) else {
                continue;
            };
            let expression = whole.as_str().to_string();
            if !seen.insert(expression.clone()) {
                continue;
            }
            found.push(DetectedLocator {
                receiver: caps.name("recv").map_or("", |m| m.as_str()).to_string(),
                selector: selector.to_string(),
                kind,
                line: line_of(source, whole.start()),
                expression,
            });
        }
        found
    }
}

const HEAL_SYSTEM: &str = "You repair brittle Playwright locators. Reply with exactly one \
     replacement expression using getByRole, getByTestId, getByLabel or getByText on the same \
     receiver. No prose, no explanation.";

/// Detects and heals brittle locators
#[derive(Debug, Clone)]
pub struct LocatorHealer {
    detector: LocatorDetector,
    tokens: Vec<Regex>,
    fragments: Vec<Regex>,
    roles: Vec<(Regex, SemanticRole)>,
    config: HealerConfig,
    generator: Arc<dyn Generator>,
}

impl LocatorHealer {
    /// Create a healer
    pub fn new(config: &HealerConfig, generator: Arc<dyn Generator>) -> SanarResult<Self> {
        Ok(Self {
            detector: LocatorDetector::new(&config.receivers)?,
            tokens: STRUCTURAL_TOKENS
                .iter()
                .map(|p| compile(p))
                .collect::<SanarResult<_>>()?,
            fragments: TEXT_FRAGMENTS
                .iter()
                .map(|p| compile(p))
                .collect::<SanarResult<_>>()?,
            roles: ROLE_FAMILIES
                .iter()
                .map(|&(p, role)| compile(p).map(|re| (re, role)))
                .collect::<SanarResult<_>>()?,
            config: config.clone(),
            generator,
        })
    }

    /// Healer bounds
    #[must_use]
    pub const fn config(&self) -> &HealerConfig {
        &self.config
    }

    /// Brittle locators in `source`
    #[must_use]
    pub fn detect(&self, source: &str) -> Vec<DetectedLocator> {
        self.detector.detect(source)
    }

    /// Tier 1: test-id lookup from a class or id token of the target element
    #[must_use]
    pub fn heal_structural(&self, locator: &DetectedLocator) -> Option<String> {
        let subject = selector_subject(&locator.selector);
        let token = self
            .tokens
            .iter()
            .find_map(|re| re.captures(subject))
            .and_then(|caps| caps.name("token"))
            .map(|m| m.as_str().replace('-', "_"))?;
        Some(format!("{}.getByTestId('{token}')", locator.receiver))
    }

    /// Tier 2: role or exact-text query from a quoted fragment
    #[must_use]
    pub fn heal_semantic(&self, locator: &DetectedLocator, source: &str) -> Option<String> {
        let text = self
            .fragments
            .iter()
            .filter_map(|re| re.captures(&locator.selector))
            .filter_map(|caps| caps.name("text").map(|m| m.as_str().trim().to_string()))
            .find(|t| (3..=40).contains(&t.chars().count()))?;

        let surrounding = window(source, locator.line, self.config.semantic_window).to_lowercase();
        let receiver = &locator.receiver;
        let query = match self
            .roles
            .iter()
            .find(|(re, _)| re.is_match(&surrounding))
            .map(|(_, role)| *role)
        {
            Some(role) => format!("{receiver}.getByRole('{}', {{ name: '{text}' }})", role.aria()),
            None => format!("{receiver}.getByText('{text}', {{ exact: true }})"),
        };
        Some(query)
    }

    /// Tier 3: ask the generative collaborator, accept only a plausible reply
    pub async fn heal_generative(&self, locator: &DetectedLocator, source: &str) -> Option<String> {
        let context = window(source, locator.line, self.config.context_lines);
        let prompt = format!(
            "Brittle locator: {}\nReceiver: {}\nSource around line {}:\n```\n{context}\n```",
            locator.expression, locator.receiver, locator.line
        );
        let reply = match self.generator.complete(HEAL_SYSTEM, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    locator = %locator.expression,
                    error = %e,
                    "generative heal unavailable"
                );
                return None;
            }
        };
        let candidate = clean_reply(&reply);
        let prefix = format!("{}.", locator.receiver);
        let acceptable = candidate.starts_with(&prefix)
            && candidate.chars().count() < self.config.generated_max_len
            && !candidate.contains('\n')
            && candidate != locator.expression;
        if acceptable {
            Some(candidate)
        } else {
            tracing::warn!(
                locator = %locator.expression,
                reply = %reply,
                "generated locator rejected"
            );
            None
        }
    }

    /// Run the tier ladder for one locator
    pub async fn heal_locator(&self, locator: &DetectedLocator, source: &str) -> HealResult {
        let result = if let Some(healed) = self.heal_structural(locator) {
            HealResult::healed_at(locator, healed, HealTier::Structural)
        } else if let Some(healed) = self.heal_semantic(locator, source) {
            HealResult::healed_at(locator, healed, HealTier::Semantic)
        } else if let Some(healed) = self.heal_generative(locator, source).await {
            HealResult::healed_at(locator, healed, HealTier::Generative)
        } else {
            HealResult::unhealed(locator)
        };
        tracing::debug!(
            locator = %locator.expression,
            healed = %result.healed,
            tier = %result.tier,
            success = result.success,
            "locator processed"
        );
        result
    }

    /// Heal every brittle locator in memory; returns the new source
    pub async fn heal_source(&self, source: &str) -> (String, Vec<HealResult>) {
        let mut current = source.to_string();
        let mut results = Vec::new();
        for locator in self.detect(source) {
            let result = self.heal_locator(&locator, source).await;
            if result.success {
                current = current.replacen(&result.original, &result.healed, 1);
            }
            results.push(result);
        }
        (current, results)
    }

    /// One healing pass over a file; writes at most once unless `dry_run`
    pub async fn heal_file(&self, path: &Path, dry_run: bool) -> SanarResult<HealingReport> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SanarError::Source {
                path: path.to_path_buf(),
                source,
            })?;
        let (healed, results) = self.heal_source(&source).await;

        let changed = healed != source;
        let rewritten = changed && !dry_run;
        if rewritten {
            tokio::fs::write(path, healed)
                .await
                .map_err(|source| SanarError::Source {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let report = HealingReport::new(path, results, rewritten, dry_run);
        tracing::info!(
            path = %path.display(),
            locators = report.total_locators,
            healed = report.healed,
            failed = report.failed,
            rewritten,
            dry_run,
            "healing pass complete"
        );
        Ok(report)
    }

    /// Alternate healing passes and re-execution until green or out of attempts
    ///
    /// At most `max_attempts` execute cycles run. A pass that cannot read or
    /// write the source ends the loop early with the latest result.
    pub async fn heal_and_rerun(
        &self,
        runner: &ExecutionRunner,
        artifact: &TestArtifact,
        initial: ExecutionResult,
    ) -> SanarResult<HealOutcome> {
        let mut latest = initial;
        let mut reports = Vec::new();
        let mut attempts = 0;

        while latest.failed > 0 && attempts < self.config.max_attempts {
            let report = match self.heal_file(artifact.path(), false).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(
                        artifact = %artifact.path.display(),
                        error = %e,
                        "healing pass failed, stopping"
                    );
                    break;
                }
            };
            attempts += 1;
            reports.push(report);
            latest = runner.execute(artifact).await?;
            tracing::info!(
                artifact = %artifact.path.display(),
                attempt = attempts,
                failed = latest.failed,
                "re-executed after healing"
            );
        }

        latest.heal_attempts = attempts;
        latest.success = latest.failed == 0;
        if !latest.success {
            tracing::warn!(
                artifact = %artifact.path.display(),
                attempts,
                failed = latest.failed,
                "still failing after healing"
            );
        }
        Ok(HealOutcome {
            result: latest,
            reports,
            attempts,
        })
    }
}

fn compile(pattern: &str) -> SanarResult<Regex> {
    Regex::new(pattern).map_err(|e| SanarError::invalid_pattern(pattern, &e))
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// Lines `line - radius ..= line + radius` (1-based line)
fn window(source: &str, line: usize, radius: usize) -> String {
    let center = line.saturating_sub(1);
    let first = center.saturating_sub(radius);
    source
        .lines()
        .skip(first)
        .take((center - first).saturating_add(radius).saturating_add(1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last compound of a CSS selector, the element it actually resolves to
///
/// XPath and `>>` chains are returned whole.
fn selector_subject(selector: &str) -> &str {
    let selector = selector.trim();
    if selector.starts_with(['/', '('])
        || selector.starts_with("xpath=")
        || selector.contains(">>")
    {
        return selector;
    }
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in selector.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ' ' | '\t' | '>' | '+' | '~') if depth == 0 => start = i + 1,
            _ => {}
        }
    }
    match &selector[start..] {
        "" => selector,
        last => last,
    }
}

/// Strip whitespace, code fences and stray backticks from a model reply
fn clean_reply(reply: &str) -> String {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // fence may carry a language tag
        text = rest.split_once('\n').map_or(rest, |(_, body)| body);
        text = text.trim_end().trim_end_matches("```");
    }
    text.trim().trim_matches('`').trim().to_string()
}
