//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Registrador: CLI for Registro - test artifacts, variables and template strings
#[derive(Parser, Debug)]
#[command(name = "registrador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Context configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Artifacts base directory
    #[arg(long, env = "REGISTRO_ARTIFACTS_ROOT", global = true)]
    pub artifacts_root: Option<PathBuf>,

    /// Artifacts directory template [default without --config: "{artifacts-root}"]
    #[arg(long, global = true)]
    pub artifacts_path: Option<String>,

    /// Set a variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value, global = true)]
    pub vars: Vec<(String, String)>,

    /// Current test name, exposed as {test-name}
    #[arg(long, global = true)]
    pub test_name: Option<String>,

    /// Current test suite name, exposed as {test-suite-name}
    #[arg(long, global = true)]
    pub test_suite: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a template string and print it
    Resolve(ResolveArgs),

    /// Write an artifact into the artifacts directory
    Add(AddArgs),

    /// Check that an artifact exists
    Check(CheckArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Template containing {key} placeholders
    pub template: String,
}

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Path relative to the artifacts directory (may contain placeholders)
    pub path: String,

    /// Text content
    #[arg(long, conflicts_with = "from")]
    pub text: Option<String>,

    /// Copy content from this file (stdin when neither --text nor --from)
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Extension appended when the path has none
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Artifact type
    #[arg(long = "type")]
    pub artifact_type: Option<String>,

    /// Artifact title
    #[arg(long)]
    pub title: Option<String>,

    /// Print the artifact-added event as JSON instead of the path
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path relative to the artifacts directory
    pub path: String,

    /// Expect a directory instead of a file
    #[arg(long)]
    pub dir: bool,
}

/// Parse `KEY=VALUE`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{s}\"")),
    }
}
