//! Loop configuration (`ralph-loop.toml`).
//!
//! Configuration is assembled from layered TOML files in increasing priority:
//! built-in defaults < global file < project file < explicit `--config` file.
//! Each layer only needs the keys it overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const KNOWN_AI_CLIS: [&str; 2] = ["claude", "codex"];

/// Loop configuration (TOML).
///
/// Edited by humans; missing fields default to the values below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoopConfig {
    /// Assistant CLI used for implementation and validation (`claude` or `codex`).
    pub ai_cli: String,
    pub implementation_model: String,
    pub validation_model: String,

    pub max_iterations: u32,
    /// INADMISSIBLE verdicts tolerated before the loop exits.
    pub max_inadmissible: u32,
    /// Retries per assistant invocation, consumed by the orchestrator's backoff.
    pub max_retries: u32,
    pub max_turns: u32,
    /// Kill an assistant that produces no output for this long.
    pub inactivity_timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_plan_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_issue: Option<String>,

    pub learnings: LearningsConfig,
    pub cross_validation: CrossValidationConfig,
    pub final_plan: ReviewerConfig,
    pub tasks_validation: ReviewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LearningsConfig {
    pub enabled: bool,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub enabled: bool,
    /// Empty picks the CLI that is not `ai_cli`.
    pub ai: String,
    pub model: String,
}

/// AI/model pair for a reviewer phase. Empty values fall back to the orchestrator's choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReviewerConfig {
    pub ai: String,
    pub model: String,
}

impl Default for LearningsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: ".ralph-loop/learnings.md".to_string(),
        }
    }
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ai: String::new(),
            model: String::new(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            ai_cli: "claude".to_string(),
            implementation_model: "opus".to_string(),
            validation_model: "opus".to_string(),
            max_iterations: 20,
            max_inadmissible: 5,
            max_retries: 10,
            max_turns: 100,
            inactivity_timeout_secs: 30 * 60,
            tasks_file: None,
            original_plan_file: None,
            github_issue: None,
            learnings: LearningsConfig::default(),
            cross_validation: CrossValidationConfig::default(),
            final_plan: ReviewerConfig::default(),
            tasks_validation: ReviewerConfig::default(),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        check_ai_cli("ai_cli", &self.ai_cli)?;
        for (field, ai) in [
            ("cross_validation.ai", &self.cross_validation.ai),
            ("final_plan.ai", &self.final_plan.ai),
            ("tasks_validation.ai", &self.tasks_validation.ai),
        ] {
            if !ai.is_empty() {
                check_ai_cli(field, ai)?;
            }
        }
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.inactivity_timeout_secs == 0 {
            return Err(anyhow!("inactivity_timeout_secs must be > 0"));
        }
        if self.learnings.enabled && self.learnings.file.trim().is_empty() {
            return Err(anyhow!("learnings.file must be set when learnings are enabled"));
        }
        Ok(())
    }
}

fn check_ai_cli(field: &str, value: &str) -> Result<()> {
    if KNOWN_AI_CLIS.contains(&value) {
        return Ok(());
    }
    Err(anyhow!(
        "{field} must be one of {}, got '{value}'",
        KNOWN_AI_CLIS.join(", ")
    ))
}

/// Load config from a single TOML file.
///
/// If the file is missing, returns `LoopConfig::default()`.
pub fn load_config(path: &Path) -> Result<LoopConfig> {
    if !path.exists() {
        let cfg = LoopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LoopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Config file locations, lowest priority first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers<'a> {
    /// Per-user file; skipped when missing.
    pub global: Option<&'a Path>,
    /// Per-repository file; skipped when missing.
    pub project: Option<&'a Path>,
    /// File named on the command line; must exist.
    pub explicit: Option<&'a Path>,
}

/// Merge defaults with every present layer, later layers winning per key.
pub fn load_layered(layers: &ConfigLayers<'_>) -> Result<LoopConfig> {
    let mut merged = toml::Table::new();

    for (path, required) in [
        (layers.global, false),
        (layers.project, false),
        (layers.explicit, true),
    ] {
        let Some(path) = path else {
            continue;
        };
        if !path.exists() {
            if required {
                return Err(anyhow!("config file not found {}", path.display()));
            }
            debug!(path = %path.display(), "config layer missing, skipping");
            continue;
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let layer: toml::Table =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        debug!(path = %path.display(), keys = layer.len(), "applying config layer");
        merge_tables(&mut merged, layer);
    }

    let cfg: LoopConfig = toml::Value::Table(merged)
        .try_into()
        .context("decode merged config")?;
    cfg.validate()?;
    Ok(cfg)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LoopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace config {}", path.display()));
    }
    Ok(())
}
