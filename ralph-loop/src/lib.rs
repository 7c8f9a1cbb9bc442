//! Transcript parsing and resumable session state for the ralph loop.
//!
//! The ralph loop alternates an implementing assistant with validating
//! assistants until the validators approve the task list. This crate holds the
//! parts that decide what happens next:
//!
//! - **[`core`]**: Pure logic. Stream decoding, JSON control-block extraction,
//!   typed verdicts and verdict-to-exit-code processing.
//! - **[`io`]**: Config, session state and task-list files.
//!
//! [`resume`] combines both to continue an interrupted session safely.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod resume;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
