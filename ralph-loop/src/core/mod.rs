//! Pure transcript logic for the ralph loop.
//!
//! Nothing here touches the filesystem or spawns processes. Every function
//! takes text in and returns values out, so the orchestrator's decisions can
//! be tested on literal strings.

pub mod extract;
pub mod json;
pub mod learnings;
pub mod outcome;
pub mod rate_limit;
pub mod stream;
pub mod verdict;
