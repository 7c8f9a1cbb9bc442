//! Session state storage (`.ralph-loop/current-state.json`).
//!
//! The state is a full snapshot: every save replaces the previous file. The
//! orchestrator owns phase transitions and writes the current phase here so a
//! resumed process knows where to re-enter.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::{debug, instrument};

use crate::io::config::LoopConfig;

pub const STATE_FILE_NAME: &str = "current-state.json";
pub const SCHEMA_VERSION: u32 = 2;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Interrupted,
    Complete,
    Cancelled,
}

/// Stage of the loop the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Implementation,
    Validation,
    CrossValidation,
    FinalPlanValidation,
    WaitingForSchedule,
}

/// Persisted snapshot of loop progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    pub schema_version: u32,
    pub session_id: String,
    /// RFC 3339.
    pub started_at: String,
    /// RFC 3339, refreshed by [`SessionState::touch`].
    pub last_updated: String,
    pub iteration: u32,
    pub status: SessionStatus,
    pub phase: Phase,
    pub verdict: String,
    pub tasks_file: String,
    /// Lowercase hex SHA-256 of the task list; empty skips the resume check.
    pub tasks_file_hash: String,
    pub ai_cli: String,
    #[serde(rename = "implementation_model")]
    pub impl_model: String,
    #[serde(rename = "validation_model")]
    pub val_model: String,
    pub max_iterations: u32,
    pub max_inadmissible: u32,
    pub original_plan_file: Option<String>,
    pub github_issue: Option<String>,
    pub learnings: LearningsState,
    pub cross_validation: CrossValidationState,
    pub final_plan_validation: ReviewerState,
    pub tasks_validation: ReviewerState,
    pub schedule: ScheduleState,
    pub retry_state: RetryState,
    pub inadmissible_count: u32,
    pub last_feedback: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LearningsState {
    #[serde(with = "int_flag")]
    pub enabled: bool,
    pub file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossValidationState {
    #[serde(with = "int_flag")]
    pub enabled: bool,
    pub ai: String,
    pub model: String,
    pub available: bool,
}

/// AI/model selection for the final-plan and tasks reviewers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewerState {
    pub ai: String,
    pub model: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleState {
    pub enabled: bool,
    pub target_epoch: i64,
    pub target_human: String,
}

/// Retry counters exposed to the orchestrator's backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryState {
    /// 1-indexed attempt number.
    pub attempt: u32,
    /// Current backoff delay in seconds.
    pub delay: u64,
}

impl Default for RetryState {
    fn default() -> Self {
        Self {
            attempt: 1,
            delay: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl SessionState {
    /// Fresh session seeded from `config`, starting at the implementation phase.
    pub fn new(
        config: &LoopConfig,
        tasks_file: &str,
        tasks_file_hash: &str,
        now: DateTime<Local>,
    ) -> Self {
        let timestamp = rfc3339(now);
        Self {
            schema_version: SCHEMA_VERSION,
            session_id: session_id(now),
            started_at: timestamp.clone(),
            last_updated: timestamp,
            iteration: 0,
            status: SessionStatus::InProgress,
            phase: Phase::Implementation,
            verdict: String::new(),
            tasks_file: tasks_file.to_string(),
            tasks_file_hash: tasks_file_hash.to_string(),
            ai_cli: config.ai_cli.clone(),
            impl_model: config.implementation_model.clone(),
            val_model: config.validation_model.clone(),
            max_iterations: config.max_iterations,
            max_inadmissible: config.max_inadmissible,
            original_plan_file: config.original_plan_file.clone(),
            github_issue: config.github_issue.clone(),
            learnings: LearningsState {
                enabled: config.learnings.enabled,
                file: config.learnings.file.clone(),
            },
            cross_validation: CrossValidationState {
                enabled: config.cross_validation.enabled,
                ai: config.cross_validation.ai.clone(),
                model: config.cross_validation.model.clone(),
                available: false,
            },
            final_plan_validation: ReviewerState {
                ai: config.final_plan.ai.clone(),
                model: config.final_plan.model.clone(),
                available: false,
            },
            tasks_validation: ReviewerState {
                ai: config.tasks_validation.ai.clone(),
                model: config.tasks_validation.model.clone(),
                available: false,
            },
            schedule: ScheduleState::default(),
            retry_state: RetryState::default(),
            inadmissible_count: 0,
            last_feedback: String::new(),
        }
    }

    /// Refresh `last_updated` before a save.
    pub fn touch(&mut self, now: DateTime<Local>) {
        self.last_updated = rfc3339(now);
    }
}

/// `ralph-YYYYMMDD-HHMMSS`.
pub fn session_id(now: DateTime<Local>) -> String {
    format!("ralph-{}", now.format("%Y%m%d-%H%M%S"))
}

fn rfc3339(now: DateTime<Local>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILE_NAME)
}

/// Load session state from `dir`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_state(dir: &Path) -> Result<SessionState> {
    let path = state_path(dir);
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("read session state {}", path.display()))?;
    let state: SessionState = serde_json::from_str(&contents)
        .with_context(|| format!("parse session state {}", path.display()))?;
    debug!(session_id = %state.session_id, iteration = state.iteration, phase = ?state.phase, "session state loaded");
    Ok(state)
}

/// Write session state to `dir` as 4-space indented JSON, replacing any previous file.
#[instrument(skip_all, fields(dir = %dir.display(), session_id = %state.session_id))]
pub fn save_state(state: &SessionState, dir: &Path) -> Result<()> {
    debug!(iteration = state.iteration, status = ?state.status, phase = ?state.phase, "writing session state");
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    state
        .serialize(&mut serializer)
        .context("serialize session state")?;
    buf.push(b'\n');
    write_atomic(&state_path(dir), &buf)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("session state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp session state {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace session state {}", path.display()));
    }
    Ok(())
}

/// Booleans persisted as `0`/`1`, matching existing state files.
mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_now, sample_state};
    use serde_json::json;

    /// Verifies save → load preserves every field, nested and nullable ones included.
    #[test]
    fn session_state_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = sample_state();

        save_state(&state, temp.path()).expect("save");
        let loaded = load_state(temp.path()).expect("load");
        assert_eq!(loaded, state);
    }

    #[test]
    fn null_optional_fields_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = SessionState {
            original_plan_file: None,
            github_issue: None,
            ..sample_state()
        };

        save_state(&state, temp.path()).expect("save");
        let contents = fs::read_to_string(state_path(temp.path())).expect("read");
        assert!(contents.contains("\"original_plan_file\": null"));
        assert_eq!(load_state(temp.path()).expect("load"), state);
    }

    #[test]
    fn save_uses_four_space_indent_and_wire_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        save_state(&sample_state(), temp.path()).expect("save");
        let contents = fs::read_to_string(state_path(temp.path())).expect("read");

        assert!(contents.starts_with("{\n    \"schema_version\": 2,\n"));
        assert!(contents.contains("\n    \"status\": \"INTERRUPTED\",\n"));
        assert!(contents.contains("\n    \"phase\": \"validation\",\n"));
        assert!(contents.contains("\n    \"implementation_model\": \"opus\",\n"));
        assert!(contents.contains("\n        \"enabled\": 1,\n"));
    }

    #[test]
    fn save_creates_directory_and_overwrites() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("nested/.ralph-loop");
        let mut state = sample_state();

        save_state(&state, &dir).expect("first save");
        state.iteration = 9;
        state.last_feedback = "second".to_string();
        save_state(&state, &dir).expect("second save");

        let loaded = load_state(&dir).expect("load");
        assert_eq!(loaded.iteration, 9);
        assert_eq!(loaded.last_feedback, "second");
        assert!(!dir.join("current-state.json.tmp").exists());
    }

    #[test]
    fn failed_replace_removes_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A non-empty directory at the target path makes the rename fail.
        let blocker = state_path(temp.path());
        fs::create_dir_all(blocker.join("occupied")).expect("blocker");

        let err = save_state(&sample_state(), temp.path()).expect_err("rename fails");
        assert!(err.to_string().contains("replace session state"));
        assert!(!temp.path().join("current-state.json.tmp").exists());
    }

    #[test]
    fn load_missing_state_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_state(temp.path()).expect_err("missing");
        assert!(err.to_string().contains("read session state"));
    }

    #[test]
    fn load_malformed_state_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(state_path(temp.path()), "{ not json").expect("write");
        let err = load_state(temp.path()).expect_err("malformed");
        assert!(err.to_string().contains("parse session state"));
    }

    #[test]
    fn new_session_uses_config_and_defaults() {
        let state = SessionState::new(&LoopConfig::default(), "/work/tasks.md", "ab12", fixed_now());

        assert_eq!(state.schema_version, SCHEMA_VERSION);
        assert_eq!(state.session_id, "ralph-20260130-143000");
        assert_eq!(state.started_at, state.last_updated);
        assert_eq!(state.status, SessionStatus::InProgress);
        assert_eq!(state.phase, Phase::Implementation);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.ai_cli, "claude");
        assert_eq!(state.max_iterations, 20);
        assert!(state.learnings.enabled);
        assert!(state.cross_validation.enabled);
        assert_eq!(state.retry_state, RetryState { attempt: 1, delay: 5 });
    }

    #[test]
    fn touch_refreshes_last_updated_only() {
        let mut state = SessionState::new(&LoopConfig::default(), "t.md", "", fixed_now());
        state.touch(fixed_now() + chrono::Duration::minutes(5));
        assert_ne!(state.started_at, state.last_updated);
        assert_eq!(state.session_id, "ralph-20260130-143000");
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(
            serde_json::to_value(SessionStatus::InProgress).expect("status"),
            json!("IN_PROGRESS")
        );
        assert_eq!(
            serde_json::to_value(Phase::FinalPlanValidation).expect("phase"),
            json!("final_plan_validation")
        );
        let err = serde_json::from_value::<SessionStatus>(json!("PENDING")).expect_err("closed set");
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn flags_read_integers() {
        let parsed: CrossValidationState = serde_json::from_value(
            json!({"enabled": 0, "ai": "codex", "model": "default", "available": true}),
        )
        .expect("cross validation");
        assert!(!parsed.enabled);
        assert!(parsed.available);
    }
}
