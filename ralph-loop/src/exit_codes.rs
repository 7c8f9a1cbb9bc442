//! Stable exit codes for the ralph loop and the `ralph-loop` CLI.

/// All tasks complete and validated.
pub const SUCCESS: i32 = 0;
/// Invalid arguments, missing files, misconfiguration or a failed resume.
pub const ERROR: i32 = 1;
/// Iteration limit reached.
pub const MAX_ITERATIONS: i32 = 2;
/// Validation requested human escalation.
pub const ESCALATE: i32 = 3;
/// Every remaining task is blocked on an external dependency.
pub const BLOCKED: i32 = 4;
/// Task list does not implement the original plan.
pub const TASKS_INVALID: i32 = 5;
/// Inadmissible-verdict threshold exceeded.
pub const INADMISSIBLE: i32 = 6;
/// SIGINT/SIGTERM received.
pub const INTERRUPTED: i32 = 130;

/// Human-readable name for an exit code.
pub fn name(code: i32) -> &'static str {
    match code {
        SUCCESS => "Success",
        ERROR => "Error",
        MAX_ITERATIONS => "MaxIterations",
        ESCALATE => "Escalate",
        BLOCKED => "Blocked",
        TASKS_INVALID => "TasksInvalid",
        INADMISSIBLE => "Inadmissible",
        INTERRUPTED => "Interrupted",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        assert_eq!(name(SUCCESS), "Success");
        assert_eq!(name(BLOCKED), "Blocked");
        assert_eq!(name(INTERRUPTED), "Interrupted");
        assert_eq!(name(42), "unknown");
    }
}
