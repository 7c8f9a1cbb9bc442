//! Filesystem helpers for config, session state, task lists and transcripts.

pub mod config;
pub mod session_state;
pub mod tasks;
pub mod transcript;
