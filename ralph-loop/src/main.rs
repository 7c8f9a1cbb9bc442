//! `ralph-loop` CLI.
//!
//! Exposes the transcript parsers and the session state file so loop scripts
//! and humans can inspect, start, resume or cancel a session.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;

use ralph_loop::core::stream::Grammar;
use ralph_loop::core::verdict::{
    parse_cross_validation, parse_final_plan, parse_tasks_validation, parse_validation,
};
use ralph_loop::exit_codes;
use ralph_loop::io::config::{ConfigLayers, LoopConfig, load_layered, write_config};
use ralph_loop::io::session_state::{SessionState, SessionStatus, load_state, save_state};
use ralph_loop::io::tasks::hash_file;
use ralph_loop::io::transcript::{decode_file, write_transcript};
use ralph_loop::logging;
use ralph_loop::resume::resume_from_state;

const PROJECT_CONFIG: &str = "ralph-loop.toml";

#[derive(Parser)]
#[command(
    name = "ralph-loop",
    version,
    about = "Transcript parsing and session state for the ralph loop"
)]
struct Cli {
    /// Directory holding `current-state.json`.
    #[arg(long, global = true, default_value = ".ralph-loop")]
    state_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a captured assistant event stream into a transcript.
    Decode {
        #[arg(long, value_enum)]
        grammar: GrammarArg,
        raw: PathBuf,
        /// Write the transcript here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse a control block from a transcript and print it as JSON.
    Verdict {
        #[arg(value_enum)]
        kind: VerdictKind,
        transcript: PathBuf,
    },
    /// Print the saved session.
    Status,
    /// Create a new session for a task list.
    Start {
        #[arg(long)]
        tasks_file: PathBuf,
        /// Config file overriding the global and project files.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reactivate the saved session after checking the task list is unchanged.
    Resume {
        /// Defaults to the task list recorded in the session.
        #[arg(long)]
        tasks_file: Option<PathBuf>,
        /// Skip the task-list hash check.
        #[arg(short, long)]
        force: bool,
    },
    /// Mark the saved session as cancelled.
    Cancel,
    /// Write a project config file with every default spelled out.
    InitConfig {
        #[arg(long, default_value = PROJECT_CONFIG)]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GrammarArg {
    Claude,
    Codex,
}

impl From<GrammarArg> for Grammar {
    fn from(value: GrammarArg) -> Self {
        match value {
            GrammarArg::Claude => Grammar::ClaudeStream,
            GrammarArg::Codex => Grammar::CodexJsonl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VerdictKind {
    Validation,
    CrossValidation,
    TasksValidation,
    FinalPlan,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let state_dir = cli.state_dir.as_path();
    match cli.command {
        Command::Decode { grammar, raw, out } => cmd_decode(grammar.into(), &raw, out.as_deref()),
        Command::Verdict { kind, transcript } => cmd_verdict(kind, &transcript),
        Command::Status => cmd_status(state_dir),
        Command::Start { tasks_file, config } => {
            cmd_start(state_dir, &tasks_file, config.as_deref())
        }
        Command::Resume { tasks_file, force } => cmd_resume(state_dir, tasks_file, force),
        Command::Cancel => cmd_cancel(state_dir),
        Command::InitConfig { path, force } => cmd_init_config(&path, force),
    }
}

fn cmd_decode(grammar: Grammar, raw: &Path, out: Option<&Path>) -> Result<i32> {
    let transcript = decode_file(raw, grammar)?;
    match out {
        Some(path) => write_transcript(path, &transcript)?,
        None => println!("{transcript}"),
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_verdict(kind: VerdictKind, transcript: &Path) -> Result<i32> {
    let text =
        fs::read_to_string(transcript).with_context(|| format!("read {}", transcript.display()))?;
    let printed = match kind {
        VerdictKind::Validation => print_json(parse_validation(&text)?)?,
        VerdictKind::CrossValidation => print_json(parse_cross_validation(&text)?)?,
        VerdictKind::TasksValidation => print_json(parse_tasks_validation(&text)?)?,
        VerdictKind::FinalPlan => print_json(parse_final_plan(&text)?)?,
    };
    if printed {
        Ok(exit_codes::SUCCESS)
    } else {
        eprintln!("no control block in {}", transcript.display());
        Ok(exit_codes::ERROR)
    }
}

fn print_json<T: Serialize>(result: Option<T>) -> Result<bool> {
    let Some(result) = result else {
        return Ok(false);
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serialize verdict")?
    );
    Ok(true)
}

fn cmd_status(state_dir: &Path) -> Result<i32> {
    let state = load_state(state_dir)?;
    println!("session:    {}", state.session_id);
    println!("status:     {:?}", state.status);
    println!("phase:      {:?}", state.phase);
    println!("iteration:  {}/{}", state.iteration, state.max_iterations);
    println!("tasks file: {}", state.tasks_file);
    println!("updated:    {}", state.last_updated);
    if !state.verdict.is_empty() {
        println!("verdict:    {}", state.verdict);
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_start(state_dir: &Path, tasks_file: &Path, config: Option<&Path>) -> Result<i32> {
    let global = global_config_path();
    let cfg = load_layered(&ConfigLayers {
        global: global.as_deref(),
        project: Some(Path::new(PROJECT_CONFIG)),
        explicit: config,
    })?;
    let hash = hash_file(tasks_file)?;
    let state = SessionState::new(&cfg, &tasks_file.display().to_string(), &hash, Local::now());
    save_state(&state, state_dir)?;
    println!("{}", state.session_id);
    Ok(exit_codes::SUCCESS)
}

fn cmd_resume(state_dir: &Path, tasks_file: Option<PathBuf>, force: bool) -> Result<i32> {
    let mut state = load_state(state_dir)?;
    let tasks_file = tasks_file.unwrap_or_else(|| PathBuf::from(&state.tasks_file));
    resume_from_state(&mut state, &tasks_file, force)?;
    state.touch(Local::now());
    save_state(&state, state_dir)?;
    println!(
        "resumed {} at iteration {} ({:?})",
        state.session_id, state.iteration, state.phase
    );
    Ok(exit_codes::SUCCESS)
}

fn cmd_cancel(state_dir: &Path) -> Result<i32> {
    let mut state = load_state(state_dir)?;
    state.status = SessionStatus::Cancelled;
    state.touch(Local::now());
    save_state(&state, state_dir)?;
    println!("cancelled {}", state.session_id);
    Ok(exit_codes::SUCCESS)
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        return Ok(exit_codes::ERROR);
    }
    write_config(path, &LoopConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::SUCCESS)
}

fn global_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    let path = PathBuf::from(home).join(".config/ralph-loop/config.toml");
    debug!(path = %path.display(), "global config path");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decode() {
        let cli = Cli::parse_from(["ralph-loop", "decode", "--grammar", "codex", "raw.jsonl"]);
        match cli.command {
            Command::Decode { grammar, raw, out } => {
                assert_eq!(grammar, GrammarArg::Codex);
                assert_eq!(raw, PathBuf::from("raw.jsonl"));
                assert!(out.is_none());
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn parse_verdict_kind() {
        let cli = Cli::parse_from(["ralph-loop", "verdict", "final-plan", "out.txt"]);
        assert!(matches!(
            cli.command,
            Command::Verdict {
                kind: VerdictKind::FinalPlan,
                ..
            }
        ));
    }

    #[test]
    fn parse_resume_force_with_state_dir() {
        let cli = Cli::parse_from(["ralph-loop", "resume", "--force", "--state-dir", "/tmp/s"]);
        assert_eq!(cli.state_dir, PathBuf::from("/tmp/s"));
        assert!(matches!(
            cli.command,
            Command::Resume {
                tasks_file: None,
                force: true
            }
        ));
    }

    #[test]
    fn parse_init_config_defaults_to_project_file() {
        let cli = Cli::parse_from(["ralph-loop", "init-config"]);
        match cli.command {
            Command::InitConfig { path, force } => {
                assert_eq!(path, PathBuf::from(PROJECT_CONFIG));
                assert!(!force);
            }
            _ => panic!("expected init-config"),
        }
    }

    #[test]
    fn state_dir_defaults_to_dot_ralph_loop() {
        let cli = Cli::parse_from(["ralph-loop", "status"]);
        assert_eq!(cli.state_dir, PathBuf::from(".ralph-loop"));
    }

    #[test]
    fn grammar_arg_maps_to_decoder_grammar() {
        assert_eq!(Grammar::from(GrammarArg::Claude), Grammar::ClaudeStream);
        assert_eq!(Grammar::from(GrammarArg::Codex), Grammar::CodexJsonl);
    }
}
