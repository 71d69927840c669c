//! Engine configuration.
//!
//! A single [`SanarConfig`] value is built once (defaults, then an optional
//! YAML file, then caller overrides) and handed to each component's
//! constructor. Nothing in the engine reads ambient or global settings.

use crate::result::{SanarError, SanarResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default number of characters kept from a failure's error text
pub const DEFAULT_ERROR_EXCERPT_CHARS: usize = 500;

/// Default response time above which a request counts as a backend fault
pub const DEFAULT_SLOW_RESPONSE_MS: u64 = 3000;

/// Default bound on heal-and-rerun cycles
pub const DEFAULT_MAX_HEAL_ATTEMPTS: u32 = 3;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanarConfig {
    /// Test runner invocation
    pub runner: RunnerConfig,
    /// Evidence lookup
    pub evidence: EvidenceConfig,
    /// Failure classification thresholds
    pub classifier: ClassifierConfig,
    /// Locator healing bounds
    pub healer: HealerConfig,
    /// Generative collaborator endpoint (absent = disabled)
    pub llm: Option<LlmConfig>,
}

impl SanarConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(text: &str) -> SanarResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> SanarResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SanarError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> SanarResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> SanarResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> SanarResult<()> {
        if self.runner.program.trim().is_empty() {
            return Err(SanarError::config("runner.program must not be empty"));
        }
        if self.runner.error_excerpt_chars == 0 {
            return Err(SanarError::config(
                "runner.error_excerpt_chars must be greater than zero",
            ));
        }
        if self.healer.receivers.is_empty() {
            return Err(SanarError::config(
                "healer.receivers must name at least one locating receiver",
            ));
        }
        if self.healer.generated_max_len == 0 {
            return Err(SanarError::config(
                "healer.generated_max_len must be greater than zero",
            ));
        }
        if let Some(llm) = &self.llm {
            if llm.base_url.trim().is_empty() {
                return Err(SanarError::config("llm.base_url must not be empty"));
            }
        }
        Ok(())
    }

    /// Set max heal attempts
    #[must_use]
    pub const fn with_max_heal_attempts(mut self, attempts: u32) -> Self {
        self.healer.max_attempts = attempts;
        self
    }

    /// Set evidence directory
    #[must_use]
    pub fn with_evidence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.evidence.dir = dir.into();
        self
    }

    /// Set the generative collaborator endpoint
    #[must_use]
    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = Some(llm);
        self
    }
}

/// How the external test runner is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program to spawn
    pub program: String,
    /// Arguments placed before the artifact path
    pub args: Vec<String>,
    /// Flag selecting machine-readable (JSON) output, placed after the path
    pub reporter_flag: String,
    /// Working directory for the runner (None = inherit)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the runner
    pub env: BTreeMap<String, String>,
    /// Characters of error text kept per failure
    pub error_excerpt_chars: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["playwright".to_string(), "test".to_string()],
            reporter_flag: "--reporter=json".to_string(),
            working_dir: None,
            env: BTreeMap::new(),
            error_excerpt_chars: DEFAULT_ERROR_EXCERPT_CHARS,
        }
    }
}

/// Where artifact instrumentation writes per-failure evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Directory of `<slug>.json` evidence files
    pub dir: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test-results/evidence"),
        }
    }
}

/// Classification thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Response time (ms) above which a request is a backend fault
    pub slow_response_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            slow_response_ms: DEFAULT_SLOW_RESPONSE_MS,
        }
    }
}

/// Locator healing bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealerConfig {
    /// Maximum heal-and-rerun cycles per artifact
    pub max_attempts: u32,
    /// Lines of source either side of a locator sent to the generator
    pub context_lines: usize,
    /// Lines either side of a locator scanned for role keywords
    pub semantic_window: usize,
    /// Longest generated expression accepted
    pub generated_max_len: usize,
    /// Receivers whose locator calls are inspected (`page`, `this.page`)
    pub receivers: Vec<String>,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_HEAL_ATTEMPTS,
            context_lines: 5,
            semantic_window: 1,
            generated_max_len: 200,
            receivers: vec!["page".to_string(), "this.page".to_string()],
        }
    }
}

/// OpenAI-compatible endpoint for the generative collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL (e.g. `http://localhost:11434`)
    pub base_url: String,
    /// Model name sent with each request
    pub model: String,
    /// Environment variable holding a bearer token, if any
    pub api_key_env: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum tokens per reply
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key_env: None,
            timeout_secs: 60,
            max_tokens: 256,
        }
    }
}

impl LlmConfig {
    /// Create config for an endpoint and model
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Resolve the bearer token from the configured environment variable
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SanarConfig::default();
        assert_eq!(config.runner.program, "npx");
        assert_eq!(config.runner.error_excerpt_chars, 500);
        assert_eq!(config.classifier.slow_response_ms, 3000);
        assert_eq!(config.healer.max_attempts, 3);
        assert_eq!(config.healer.context_lines, 5);
        assert!(config.llm.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "healer:\n  max_attempts: 5\nevidence:\n  dir: out/evidence\n";
        let config = SanarConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.healer.max_attempts, 5);
        assert_eq!(config.healer.semantic_window, 1);
        assert_eq!(config.evidence.dir, PathBuf::from("out/evidence"));
        assert_eq!(config.runner.reporter_flag, "--reporter=json");
    }

    #[test]
    fn test_llm_section() {
        let yaml = "llm:\n  base_url: http://127.0.0.1:8081\n  model: qwen\n";
        let config = SanarConfig::from_yaml_str(yaml).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.model, "qwen");
        assert_eq!(llm.timeout_secs, 60);
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let yaml = "runner:\n  program: ''\n";
        let err = SanarConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("runner.program"));
    }

    #[test]
    fn test_validate_rejects_no_receivers() {
        let mut config = SanarConfig::default();
        config.healer.receivers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = SanarConfig::new()
            .with_max_heal_attempts(7)
            .with_evidence_dir("ev")
            .with_llm(LlmConfig::new("http://x", "m"));
        assert_eq!(config.healer.max_attempts, 7);
        assert_eq!(config.evidence.dir, PathBuf::from("ev"));
        assert_eq!(config.llm.unwrap().base_url, "http://x");
    }

    #[test]
    fn test_yaml_roundtrip_is_stable() {
        let config = SanarConfig::default().with_llm(LlmConfig::default());
        let yaml = config.to_yaml().unwrap();
        let back = SanarConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SanarConfig::load_or_default(&dir.path().join("sanar.yaml")).unwrap();
        assert_eq!(config, SanarConfig::default());
    }

    #[test]
    fn test_api_key_unset_env() {
        let mut llm = LlmConfig::default();
        llm.api_key_env = Some("SANAR_TEST_KEY_THAT_IS_NEVER_SET".to_string());
        assert!(llm.api_key().is_none());
    }
}
