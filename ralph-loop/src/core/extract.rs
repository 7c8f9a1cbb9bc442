//! Extraction of an anchored JSON control block from free-form transcript text.
//!
//! A fenced "```json" block containing the anchor key wins. Otherwise the
//! object enclosing the key is recovered by brace matching, first looking
//! backward from the key (best effort), then forward (authoritative).

use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Malformed control block: the anchor key is present but its JSON is unusable.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("json in code block: {0}")]
    FencedBlock(#[source] serde_json::Error),

    #[error("unmatched braces after key {key:?}")]
    UnmatchedBraces { key: String },

    #[error("bracket-matched json: {0}")]
    BracketMatched(#[source] serde_json::Error),
}

/// Locate and parse the JSON object associated with `key` in `text`.
///
/// Returns `Ok(None)` when `key` does not appear in `text` at all.
pub fn extract_json(text: &str, key: &str) -> Result<Option<Map<String, Value>>, ExtractError> {
    if !text.contains(key) {
        return Ok(None);
    }

    if let Some(object) = extract_from_fenced_block(text, key)? {
        return Ok(Some(object));
    }

    extract_by_brace_matching(text, key)
}

fn extract_from_fenced_block(
    text: &str,
    key: &str,
) -> Result<Option<Map<String, Value>>, ExtractError> {
    let mut remaining = text;

    while let Some(open) = remaining.find(JSON_FENCE) {
        let mut start = open + JSON_FENCE.len();
        if remaining[start..].starts_with('\n') {
            start += 1;
        }

        let Some(close) = remaining[start..].find(FENCE) else {
            break;
        };
        let block = &remaining[start..start + close];

        if block.contains(key) {
            return parse_object(block.trim())
                .map(Some)
                .map_err(ExtractError::FencedBlock);
        }

        remaining = &remaining[start + close + FENCE.len()..];
    }

    Ok(None)
}

fn extract_by_brace_matching(
    text: &str,
    key: &str,
) -> Result<Option<Map<String, Value>>, ExtractError> {
    let Some(key_idx) = text.find(key) else {
        return Ok(None);
    };

    // Backward: failures fall through to the forward attempt.
    if let Some(open) = text[..key_idx].rfind('{') {
        let raw = &text[open..];
        if let Some(end) = match_braces(raw) {
            let candidate = &raw[..=end];
            if candidate.contains(key)
                && let Ok(object) = parse_object(candidate)
            {
                return Ok(Some(object));
            }
        }
    }

    let Some(offset) = text[key_idx..].find('{') else {
        return Ok(None);
    };
    let raw = &text[key_idx + offset..];
    let end = match_braces(raw).ok_or_else(|| ExtractError::UnmatchedBraces {
        key: key.to_string(),
    })?;

    parse_object(&raw[..=end])
        .map(Some)
        .map_err(ExtractError::BracketMatched)
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Find the `}` closing the object that opens at byte 0 of `s`.
///
/// String literals (with backslash escapes) are skipped. Brace and bracket
/// depths are tracked separately; the object only closes on a `}` that
/// returns brace depth to zero while no array is open.
pub fn match_braces(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }

    let mut brace_depth: i64 = 0;
    let mut bracket_depth: i64 = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];

        if in_string {
            match ch {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match ch {
            b'"' => in_string = true,
            b'{' => brace_depth += 1,
            b'}' => {
                brace_depth -= 1;
                if brace_depth == 0 && bracket_depth == 0 {
                    return Some(i);
                }
            }
            b'[' => bracket_depth += 1,
            b']' => bracket_depth -= 1,
            _ => {}
        }
        i += 1;
    }

    None
}
