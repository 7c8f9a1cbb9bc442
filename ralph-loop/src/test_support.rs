//! Test-only fixtures for session state and task lists.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use tempfile::TempDir;

use crate::io::config::LoopConfig;
use crate::io::session_state::{Phase, SessionState, SessionStatus};
use crate::io::tasks::hash_bytes;

/// 2026-01-30 14:30:00 local time.
pub fn fixed_now() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 1, 30, 14, 30, 0)
        .single()
        .expect("unambiguous local time")
}

/// A session interrupted mid-validation with every optional field populated.
pub fn sample_state() -> SessionState {
    let config = LoopConfig {
        original_plan_file: Some("docs/plan.md".to_string()),
        github_issue: Some("https://github.com/acme/widgets/issues/42".to_string()),
        ..LoopConfig::default()
    };
    let mut state = SessionState::new(&config, "/work/tasks.md", &hash_bytes(b"tasks"), fixed_now());
    state.iteration = 3;
    state.status = SessionStatus::Interrupted;
    state.phase = Phase::Validation;
    state.verdict = "NEEDS_MORE_WORK".to_string();
    state.cross_validation.ai = "codex".to_string();
    state.cross_validation.model = "default".to_string();
    state.cross_validation.available = true;
    state.final_plan_validation.ai = "claude".to_string();
    state.final_plan_validation.model = "opus".to_string();
    state.retry_state.attempt = 2;
    state.retry_state.delay = 10;
    state.inadmissible_count = 1;
    state.last_feedback = "Task 2 has no tests.".to_string();
    state
}

/// A task list on disk with its expected hash.
pub struct TasksFixture {
    _dir: TempDir,
    pub path: PathBuf,
    pub hash: String,
}

impl TasksFixture {
    pub fn new(contents: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("create tasks tempdir")?;
        let path = dir.path().join("tasks.md");
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(Self {
            _dir: dir,
            path,
            hash: hash_bytes(contents.as_bytes()),
        })
    }

    /// Replace the file contents without updating `hash`.
    pub fn rewrite(&self, contents: &str) -> Result<()> {
        fs::write(&self.path, contents).with_context(|| format!("write {}", self.path.display()))
    }
}
