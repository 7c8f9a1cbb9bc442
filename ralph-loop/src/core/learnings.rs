//! `RALPH_LEARNINGS:` block extraction from implementation transcripts.

const MARKER: &str = "RALPH_LEARNINGS:";

/// Extract the learnings an implementer reported, if any.
///
/// Content on the marker line wins. Otherwise lines after the marker are
/// collected until a blank line, a code fence, or the end of the transcript.
/// Blocks holding only whitespace or bare `-` bullets count as empty.
pub fn extract_learnings(transcript: &str) -> Option<String> {
    let mut lines = transcript.lines();

    let inline = lines.by_ref().find_map(|line| {
        line.find(MARKER)
            .map(|idx| line[idx + MARKER.len()..].trim())
    })?;
    if !inline.is_empty() {
        return Some(inline.to_string());
    }

    let collected: Vec<&str> = lines
        .take_while(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("```")
        })
        .collect();

    let joined = collected.join("\n");
    let learnings = joined.trim();
    let has_content = learnings.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && trimmed != "-"
    });

    has_content.then(|| learnings.to_string())
}
