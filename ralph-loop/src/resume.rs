//! Resuming an interrupted session.
//!
//! A session may only continue against the task list it started with. The
//! hash recorded at start is compared to the file on disk; `--force` skips the
//! check when the user knowingly edited the list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::io::session_state::{SessionState, SessionStatus};
use crate::io::tasks::hash_bytes;

/// Reasons a saved session no longer matches the workspace.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("tasks file not found: {}", path.display())]
    TasksFileMissing { path: PathBuf },
    #[error("hash tasks file {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tasks file changed: expected hash {expected}, got {actual}")]
    TasksFileChanged { expected: String, actual: String },
}

/// Check that `tasks_file` still exists and, when a hash was recorded, that it is unchanged.
#[instrument(skip_all, fields(tasks_file = %tasks_file.display()))]
pub fn validate_state(state: &SessionState, tasks_file: &Path) -> Result<(), StateError> {
    if !tasks_file.exists() {
        return Err(StateError::TasksFileMissing {
            path: tasks_file.to_path_buf(),
        });
    }
    if state.tasks_file_hash.is_empty() {
        debug!("no recorded tasks hash, skipping comparison");
        return Ok(());
    }

    let contents = fs::read(tasks_file).map_err(|source| StateError::Hash {
        path: tasks_file.to_path_buf(),
        source,
    })?;
    let actual = hash_bytes(&contents);
    if actual != state.tasks_file_hash {
        return Err(StateError::TasksFileChanged {
            expected: state.tasks_file_hash.clone(),
            actual,
        });
    }
    Ok(())
}

/// Mark `state` as in progress so the loop can continue from its saved phase.
///
/// Validation runs unless `force` is set. Only `status` changes; iteration,
/// phase, and counters carry over as saved.
#[instrument(skip_all, fields(session_id = %state.session_id, force = force))]
pub fn resume_from_state(state: &mut SessionState, tasks_file: &Path, force: bool) -> Result<()> {
    if !force {
        validate_state(state, tasks_file).context("state validation failed")?;
    }
    info!(
        iteration = state.iteration,
        phase = ?state.phase,
        previous = ?state.status,
        "resuming session"
    );
    state.status = SessionStatus::InProgress;
    Ok(())
}
