//! Decoding of assistant event streams into a plain-text transcript.
//!
//! Two line-oriented grammars are supported, chosen by the caller:
//!
//! - [`Grammar::ClaudeStream`]: Claude CLI `--output-format stream-json`.
//!   Text blocks are concatenated with no separator.
//! - [`Grammar::CodexJsonl`]: Codex CLI `--json`. Completed items are joined
//!   with `\n`.
//!
//! Blank lines, malformed JSON and events with missing fields are skipped.
//! Decoding never fails.

use serde_json::Value;

/// Event-stream grammar emitted by an assistant subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `{"type":"assistant","message":{"content":[...]}}` / `{"type":"result",...}` lines.
    ClaudeStream,
    /// `{"type":"item.completed","item":{...}}` lines.
    CodexJsonl,
}

/// Decode raw event text into a transcript.
pub fn decode(input: &str, grammar: Grammar) -> String {
    match grammar {
        Grammar::ClaudeStream => decode_claude_stream(input),
        Grammar::CodexJsonl => decode_codex_jsonl(input),
    }
}

fn events(input: &str) -> impl Iterator<Item = Value> + '_ {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
}

fn decode_claude_stream(input: &str) -> String {
    let mut transcript = String::new();
    for event in events(input) {
        match event.get("type").and_then(Value::as_str) {
            Some("assistant") => push_assistant_text(&event, &mut transcript),
            Some("result") => {
                if let Some(text) = event.get("result").and_then(Value::as_str) {
                    transcript.push_str(text);
                }
            }
            _ => {}
        }
    }
    transcript
}

fn push_assistant_text(event: &Value, transcript: &mut String) {
    let Some(content) = event
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for block in content {
        // tool_use and other block kinds carry no transcript text
        if block.get("type").and_then(Value::as_str) != Some("text") {
            continue;
        }
        if let Some(text) = block.get("text").and_then(Value::as_str) {
            transcript.push_str(text);
        }
    }
}

fn decode_codex_jsonl(input: &str) -> String {
    let segments: Vec<String> = events(input)
        .filter(|event| event.get("type").and_then(Value::as_str) == Some("item.completed"))
        .filter_map(|event| event.get("item").and_then(item_segment))
        .filter(|segment| !segment.is_empty())
        .collect();
    segments.join("\n")
}

fn item_segment(item: &Value) -> Option<String> {
    match item.get("type").and_then(Value::as_str)? {
        "agent_message" | "assistant_message" => {
            item.get("text").and_then(Value::as_str).map(str::to_string)
        }
        "function_call" => {
            let name = item.get("name").and_then(Value::as_str)?;
            let arguments = item.get("arguments").and_then(Value::as_str)?;
            Some(format!("Called: {name}({arguments})"))
        }
        _ => None,
    }
}
