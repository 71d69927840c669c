//! Sanar: test-failure classification and self-healing locators
//!
//! Sanar (Spanish: "to heal") sits between an E2E test runner and the people
//! who triage its failures. It runs test artifacts, attaches the evidence
//! their instrumentation captured, assigns every failure a root-cause
//! category, and rewrites brittle locators before re-running.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        SANAR Pipeline                                │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────┐   ┌────────────┐   ┌──────────────┐  │
//! │  │ Execution │──►│ Evidence   │──►│ Failure    │──►│ Locator      │  │
//! │  │ Runner    │   │ Reconciler │   │ Classifier │   │ Healer       │  │
//! │  └─────▲─────┘   └────────────┘   └─────┬──────┘   └──────┬───────┘  │
//! │        │                                │ Generator       │          │
//! │        └──────────── re-run (bounded) ──┴─────────────────┘          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sanar::{ArtifactKind, Pipeline, SanarConfig, TestArtifact};
//!
//! # async fn demo() -> sanar::SanarResult<()> {
//! let config = SanarConfig::load_or_default("sanar.yaml".as_ref())?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let summary = pipeline
//!     .process_all(&[TestArtifact::new("tests/login.spec.ts", ArtifactKind::E2e)])
//!     .await?;
//! println!("{} passed, {} still failing", summary.passed, summary.still_failing);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Root-cause classification (rule cascade plus generated prose)
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod classify;

/// Engine configuration
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Evidence file lookup and overlay
pub mod evidence;

/// Runner invocation and output interpretation
#[allow(clippy::missing_errors_doc)]
pub mod execution;

/// Brittle locator detection, tiered healing and the heal loop
#[allow(
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::needless_raw_string_hashes
)]
pub mod heal;

/// Generative collaborator seam and HTTP client
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod llm;

/// Results, failures and network captures
#[allow(clippy::cast_precision_loss)]
pub mod model;

/// Sequential orchestration over artifacts
#[allow(clippy::missing_errors_doc)]
pub mod pipeline;

/// Runner JSON report model and tallying
#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod report;

mod result;

pub use classify::{
    format_api_log, CategoryProfile, ClassificationRules, FailureClassifier, RootCauseCategory,
    RootCauseResult, Verdict, CATEGORY_PRIORITY, CATEGORY_PROFILES,
};
pub use config::{
    ClassifierConfig, EvidenceConfig, HealerConfig, LlmConfig, RunnerConfig, SanarConfig,
    DEFAULT_MAX_HEAL_ATTEMPTS, DEFAULT_SLOW_RESPONSE_MS,
};
pub use evidence::{slugify, Evidence, EvidenceReconciler};
pub use execution::{CommandBackend, ExecutionRunner, RawRun, RunnerBackend};
pub use heal::{
    BrittleKind, DetectedLocator, HealOutcome, HealResult, HealTier, HealingReport,
    LocatorDetector, LocatorHealer,
};
pub use llm::{generator_from_config, DisabledGenerator, Generator, LlmClientError};
#[cfg(feature = "llm")]
pub use llm::LlmClient;
pub use model::{ArtifactKind, ExecutionResult, FailureRecord, NetworkEntry, TestArtifact};
pub use pipeline::{ArtifactOutcome, Pipeline, RunSummary};
pub use result::{SanarError, SanarResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
