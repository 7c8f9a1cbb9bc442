//! Typed verdict results parsed from agent transcripts.
//!
//! Each phase asks its agent to emit a control block keyed by an anchor,
//! usually inside a fenced `json` block:
//!
//! ```text
//! {"RALPH_VALIDATION": {"verdict": "COMPLETE", "remaining": 0, ...}}
//! ```
//!
//! The parsers return `Ok(None)` when no real control block exists, an error
//! when the block is present but malformed, and a result otherwise (even if
//! every field is empty).

use serde::Serialize;

use crate::core::extract::{ExtractError, extract_json};
use crate::core::json::{
    Object, int_field, object_list_field, string_field, string_list_field,
};

pub const VALIDATION_KEY: &str = "RALPH_VALIDATION";
pub const CROSS_VALIDATION_KEY: &str = "RALPH_CROSS_VALIDATION";
pub const TASKS_VALIDATION_KEY: &str = "RALPH_TASKS_VALIDATION";
pub const FINAL_PLAN_KEY: &str = "RALPH_FINAL_PLAN_VALIDATION";

/// Validator assessment of the implementer's work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// COMPLETE, NEEDS_MORE_WORK, ESCALATE, BLOCKED or INADMISSIBLE.
    pub verdict: String,
    pub feedback: String,
    /// Unchecked tasks still pending.
    pub remaining: i64,
    pub blocked_count: i64,
    /// Blocked task identifiers, typically `T###: description`. Never absent.
    pub blocked_tasks: Vec<String>,
}

/// Independent reviewer's check of the validator's assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossValidationResult {
    /// CONFIRMED or REJECTED.
    pub verdict: String,
    pub tasks_verified: i64,
    pub discrepancies_found: i64,
    pub files_actually_read: Option<Vec<String>>,
    pub code_quotes: Option<Vec<Object>>,
    pub discrepancies: Option<Vec<Object>>,
    pub feedback: String,
}

/// Review of whether the task list covers the original plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TasksValidationResult {
    /// VALID or INVALID.
    pub verdict: String,
    pub feedback: String,
    pub missing_requirements: Option<Vec<String>>,
    pub out_of_scope_tasks: Option<Vec<String>>,
    pub vague_tasks: Option<Vec<String>>,
    pub quality_score: String,
}

/// Final check of the implementation against the original plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinalPlanResult {
    /// CONFIRMED or NOT_IMPLEMENTED once normalized.
    pub verdict: String,
    pub feedback: String,
}

/// Field container for one control block, recording whether any recognized
/// field was read.
struct Fields {
    container: Object,
    keyed: bool,
    hit: bool,
}

impl Fields {
    fn locate(text: &str, anchor: &str) -> Result<Option<Self>, ExtractError> {
        let Some(mut raw) = extract_json(text, anchor)? else {
            return Ok(None);
        };
        let fields = match raw.remove(anchor) {
            Some(serde_json::Value::Object(nested)) => Self {
                container: nested,
                keyed: true,
                hit: false,
            },
            other => {
                // Flat shape: the anchor was not a nested object.
                if let Some(value) = other {
                    raw.insert(anchor.to_string(), value);
                }
                Self {
                    container: raw,
                    keyed: false,
                    hit: false,
                }
            }
        };
        Ok(Some(fields))
    }

    fn track<T>(&mut self, value: Option<T>) -> Option<T> {
        self.hit |= value.is_some();
        value
    }

    fn string(&mut self, key: &str) -> String {
        let value = string_field(&self.container, key);
        self.track(value).unwrap_or_default()
    }

    fn int(&mut self, key: &str) -> i64 {
        let value = int_field(&self.container, key);
        self.track(value).unwrap_or_default()
    }

    fn strings(&mut self, key: &str) -> Option<Vec<String>> {
        let value = string_list_field(&self.container, key);
        self.track(value)
    }

    fn objects(&mut self, key: &str) -> Option<Vec<Object>> {
        let value = object_list_field(&self.container, key);
        self.track(value)
    }

    /// Drop results that only matched the anchor as loose text.
    fn finish<T>(self, result: T) -> Option<T> {
        (self.hit || self.keyed).then_some(result)
    }
}

pub fn parse_validation(text: &str) -> Result<Option<ValidationResult>, ExtractError> {
    let Some(mut fields) = Fields::locate(text, VALIDATION_KEY)? else {
        return Ok(None);
    };
    let result = ValidationResult {
        verdict: fields.string("verdict"),
        feedback: fields.string("feedback"),
        remaining: fields.int("remaining"),
        blocked_count: fields.int("blocked_count"),
        blocked_tasks: fields.strings("blocked_tasks").unwrap_or_default(),
    };
    Ok(fields.finish(result))
}

pub fn parse_cross_validation(text: &str) -> Result<Option<CrossValidationResult>, ExtractError> {
    let Some(mut fields) = Fields::locate(text, CROSS_VALIDATION_KEY)? else {
        return Ok(None);
    };
    let result = CrossValidationResult {
        verdict: fields.string("verdict"),
        tasks_verified: fields.int("tasks_verified"),
        discrepancies_found: fields.int("discrepancies_found"),
        files_actually_read: fields.strings("files_actually_read"),
        code_quotes: fields.objects("code_quotes"),
        discrepancies: fields.objects("discrepancies"),
        feedback: fields.string("feedback"),
    };
    Ok(fields.finish(result))
}

pub fn parse_tasks_validation(text: &str) -> Result<Option<TasksValidationResult>, ExtractError> {
    let Some(mut fields) = Fields::locate(text, TASKS_VALIDATION_KEY)? else {
        return Ok(None);
    };
    let result = TasksValidationResult {
        verdict: fields.string("verdict"),
        feedback: fields.string("feedback"),
        missing_requirements: fields.strings("missing_requirements"),
        out_of_scope_tasks: fields.strings("out_of_scope_tasks"),
        vague_tasks: fields.strings("vague_tasks"),
        quality_score: fields.string("quality_score"),
    };
    Ok(fields.finish(result))
}

/// Parse a final-plan block, normalizing `APPROVE`/`REJECT` verdicts.
pub fn parse_final_plan(text: &str) -> Result<Option<FinalPlanResult>, ExtractError> {
    let Some(mut fields) = Fields::locate(text, FINAL_PLAN_KEY)? else {
        return Ok(None);
    };
    let verdict = fields.string("verdict");
    let result = FinalPlanResult {
        verdict: normalize_final_plan_verdict(&verdict).to_string(),
        feedback: fields.string("feedback"),
    };
    Ok(fields.finish(result))
}

pub fn normalize_final_plan_verdict(verdict: &str) -> &str {
    match verdict {
        "APPROVE" => "CONFIRMED",
        "REJECT" => "NOT_IMPLEMENTED",
        other => other,
    }
}
