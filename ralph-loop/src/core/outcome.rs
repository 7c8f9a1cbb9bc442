//! Classification of a validation verdict into a loop action.
//!
//! Pure: the caller owns the loop and decides what "continue" means.

use crate::exit_codes;

/// Inputs needed to classify a validation verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictInput {
    pub verdict: String,
    pub feedback: String,
    /// Unchecked tasks in the task list.
    pub remaining: i64,
    pub blocked_count: i64,
    pub inadmissible_count: u32,
    pub max_inadmissible: u32,
}

/// What the loop should do after a validation verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictAction {
    /// Run another implementation iteration, passing `feedback` along.
    Continue { feedback: String },
    /// Stop with the given exit code.
    Exit { code: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictOutcome {
    pub action: VerdictAction,
    pub inadmissible_count: u32,
}

pub fn process_verdict(input: &VerdictInput) -> VerdictOutcome {
    let doable = input.remaining.saturating_sub(input.blocked_count);
    let action = match input.verdict.as_str() {
        "COMPLETE" if input.remaining > 0 && doable > 0 => VerdictAction::Continue {
            feedback: format!(
                "Validation marked complete but {} tasks remain unchecked. Continuing implementation.",
                input.remaining
            ),
        },
        "COMPLETE" if input.remaining > 0 => exit(exit_codes::BLOCKED),
        "COMPLETE" => exit(exit_codes::SUCCESS),
        "NEEDS_MORE_WORK" => carry_on(input),
        "ESCALATE" => exit(exit_codes::ESCALATE),
        "INADMISSIBLE" => {
            let count = input.inadmissible_count.saturating_add(1);
            let action = if count > input.max_inadmissible {
                exit(exit_codes::INADMISSIBLE)
            } else {
                carry_on(input)
            };
            return VerdictOutcome {
                action,
                inadmissible_count: count,
            };
        }
        "BLOCKED" if doable > 0 => carry_on(input),
        "BLOCKED" => exit(exit_codes::BLOCKED),
        _ => exit(exit_codes::ERROR),
    };

    VerdictOutcome {
        action,
        inadmissible_count: input.inadmissible_count,
    }
}

fn carry_on(input: &VerdictInput) -> VerdictAction {
    VerdictAction::Continue {
        feedback: input.feedback.clone(),
    }
}

fn exit(code: i32) -> VerdictAction {
    VerdictAction::Exit { code }
}
