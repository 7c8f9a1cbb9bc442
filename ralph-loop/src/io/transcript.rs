//! Raw assistant output files and their decoded transcripts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::stream::{Grammar, decode};

/// Read a captured stream from `raw_path` and decode it.
#[instrument(skip_all, fields(raw = %raw_path.display(), grammar = ?grammar))]
pub fn decode_file(raw_path: &Path, grammar: Grammar) -> Result<String> {
    let raw = fs::read_to_string(raw_path).with_context(|| format!("read {}", raw_path.display()))?;
    let transcript = decode(&raw, grammar);
    debug!(
        raw_bytes = raw.len(),
        transcript_bytes = transcript.len(),
        "decoded stream"
    );
    Ok(transcript)
}

/// Write a decoded transcript, creating parent directories as needed.
pub fn write_transcript(path: &Path, transcript: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, transcript).with_context(|| format!("write {}", path.display()))
}
