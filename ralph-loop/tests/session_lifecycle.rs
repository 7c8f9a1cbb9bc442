//! End-to-end session lifecycle.
//!
//! Drives a captured validator stream through decode → verdict → outcome,
//! persists the resulting state, then resumes it in a "new process" by
//! reloading from disk.

use std::fs;

use serde_json::json;

use ralph_loop::core::outcome::{VerdictAction, VerdictInput, process_verdict};
use ralph_loop::core::stream::Grammar;
use ralph_loop::core::verdict::parse_validation;
use ralph_loop::exit_codes;
use ralph_loop::io::config::LoopConfig;
use ralph_loop::io::session_state::{Phase, SessionState, SessionStatus, load_state, save_state};
use ralph_loop::io::transcript::decode_file;
use ralph_loop::resume::{StateError, resume_from_state, validate_state};
use ralph_loop::test_support::{TasksFixture, fixed_now};

fn codex_stream(message: &str) -> String {
    [
        json!({"type": "thread.started", "thread_id": "t-1"}),
        json!({"type": "item.completed", "item": {"type": "function_call", "name": "shell", "arguments": "{\"cmd\":\"cargo test\"}"}}),
        json!({"type": "item.completed", "item": {"type": "agent_message", "text": message}}),
        json!({"type": "turn.completed"}),
    ]
    .iter()
    .map(|event| event.to_string())
    .collect::<Vec<_>>()
    .join("\n")
}

/// Interrupted during validation, resumed with the task list untouched.
#[test]
fn interrupted_session_resumes_after_reload() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_dir = temp.path().join(".ralph-loop");
    let tasks = TasksFixture::new("- [x] parse config\n- [ ] wire CLI\n").expect("tasks");

    let message = r#"Checked the work.
```json
{"RALPH_VALIDATION": {"verdict": "NEEDS_MORE_WORK", "feedback": "CLI not wired", "remaining": 1, "blocked_count": 0, "blocked_tasks": []}}
```"#;
    let raw = temp.path().join("validation.jsonl");
    fs::write(&raw, codex_stream(message)).expect("write raw");

    let transcript = decode_file(&raw, Grammar::CodexJsonl).expect("decode");
    assert!(transcript.starts_with("Called: shell("));
    let verdict = parse_validation(&transcript)
        .expect("well-formed")
        .expect("control block");
    assert_eq!(verdict.verdict, "NEEDS_MORE_WORK");
    assert_eq!(verdict.remaining, 1);

    let mut state = SessionState::new(
        &LoopConfig::default(),
        &tasks.path.display().to_string(),
        &tasks.hash,
        fixed_now(),
    );
    let outcome = process_verdict(&VerdictInput {
        verdict: verdict.verdict.clone(),
        feedback: verdict.feedback.clone(),
        remaining: verdict.remaining,
        blocked_count: verdict.blocked_count,
        inadmissible_count: state.inadmissible_count,
        max_inadmissible: state.max_inadmissible,
    });
    let VerdictAction::Continue { feedback } = outcome.action else {
        panic!("expected continue, got {:?}", outcome.action);
    };

    state.iteration = 1;
    state.phase = Phase::Validation;
    state.verdict = verdict.verdict;
    state.last_feedback = feedback;
    state.status = SessionStatus::Interrupted;
    save_state(&state, &state_dir).expect("save");

    let mut reloaded = load_state(&state_dir).expect("load");
    assert_eq!(reloaded, state);
    resume_from_state(&mut reloaded, &tasks.path, false).expect("resume");

    assert_eq!(reloaded.status, SessionStatus::InProgress);
    assert_eq!(reloaded.phase, Phase::Validation);
    assert_eq!(reloaded.iteration, 1);
    assert_eq!(reloaded.last_feedback, "CLI not wired");
}

/// Editing the task list between runs blocks the resume until forced.
#[test]
fn edited_task_list_blocks_resume() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tasks = TasksFixture::new("- [ ] one\n").expect("tasks");
    let mut state = SessionState::new(
        &LoopConfig::default(),
        &tasks.path.display().to_string(),
        &tasks.hash,
        fixed_now(),
    );
    state.status = SessionStatus::Interrupted;
    save_state(&state, temp.path()).expect("save");

    tasks.rewrite("- [ ] one\n- [ ] two\n").expect("edit");
    let mut reloaded = load_state(temp.path()).expect("load");

    assert!(matches!(
        validate_state(&reloaded, &tasks.path),
        Err(StateError::TasksFileChanged { .. })
    ));
    assert!(resume_from_state(&mut reloaded, &tasks.path, false).is_err());
    assert_eq!(reloaded.status, SessionStatus::Interrupted);

    resume_from_state(&mut reloaded, &tasks.path, true).expect("forced resume");
    assert_eq!(reloaded.status, SessionStatus::InProgress);
}

/// A COMPLETE verdict with nothing left ends the loop successfully.
#[test]
fn complete_claude_verdict_exits_successfully() {
    let temp = tempfile::tempdir().expect("tempdir");
    let block = r#"{"RALPH_VALIDATION": {"verdict": "COMPLETE", "feedback": "All done", "remaining": 0, "blocked_count": 0, "blocked_tasks": []}}"#;
    let line = json!({"type": "result", "result": format!("Summary.\n{block}\n")});
    let raw = temp.path().join("validation.jsonl");
    fs::write(&raw, line.to_string()).expect("write raw");

    let transcript = decode_file(&raw, Grammar::ClaudeStream).expect("decode");
    let verdict = parse_validation(&transcript)
        .expect("well-formed")
        .expect("control block");
    let outcome = process_verdict(&VerdictInput {
        verdict: verdict.verdict,
        remaining: verdict.remaining,
        blocked_count: verdict.blocked_count,
        max_inadmissible: 5,
        ..VerdictInput::default()
    });

    assert_eq!(
        outcome.action,
        VerdictAction::Exit {
            code: exit_codes::SUCCESS
        }
    );
}
