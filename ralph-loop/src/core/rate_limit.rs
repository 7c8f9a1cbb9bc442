//! Rate-limit detection in assistant transcripts.
//!
//! Only detection lives here. Converting the reset time to an instant and
//! waiting for it belongs to the scheduling layer.

use std::sync::LazyLock;

use regex::Regex;

/// Transcripts longer than this are only checked against reset-time patterns,
/// so an agent discussing rate limits does not trip the bare phrases.
pub const BARE_PATTERN_MAX_LEN: usize = 500;

/// Reset-time patterns in priority order.
static RESET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "resets 6:30pm (America/Sao_Paulo)"
        r"(?i)resets?\s+(\d{1,2}:\d{2}\s*(?:am|pm))\s*\(([^)]+)\)",
        // "resets 6pm (America/Bahia)"
        r"(?i)resets?\s+(\d{1,2}\s*(?:am|pm))\s*\(([^)]+)\)",
        // "resets 18:00 (UTC)"
        r"(?i)resets?\s+(\d{1,2}:\d{2})\s*\(([^)]+)\)",
        // "resets Jan 1, 2026, 9am (UTC)"
        r"(?i)resets?\s+[A-Za-z]+\s+\d{1,2},?\s+\d{4},?\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm))\s*\(([^)]+)\)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid reset pattern"))
    .collect()
});

static BARE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)you'?ve hit your limit|rate limit exceeded|rate limited|too many requests")
        .expect("valid bare pattern")
});

/// A detected rate limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitHit {
    /// Reset time as written, e.g. `6:30pm`. `None` when only a bare phrase matched.
    pub reset_time: Option<String>,
    /// IANA timezone from the message, e.g. `America/Bahia`.
    pub timezone: Option<String>,
}

impl RateLimitHit {
    pub fn is_parseable(&self) -> bool {
        self.reset_time.is_some() && self.timezone.is_some()
    }
}

pub fn detect_rate_limit(transcript: &str) -> Option<RateLimitHit> {
    for pattern in RESET_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(transcript) {
            return Some(RateLimitHit {
                reset_time: caps.get(1).map(|m| m.as_str().trim().to_string()),
                timezone: caps.get(2).map(|m| m.as_str().trim().to_string()),
            });
        }
    }

    if transcript.len() <= BARE_PATTERN_MAX_LEN && BARE_PATTERN.is_match(transcript) {
        return Some(RateLimitHit {
            reset_time: None,
            timezone: None,
        });
    }

    None
}
