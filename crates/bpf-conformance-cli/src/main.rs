//! BPF VM conformance runner
//!
//! Verifies every fixture of a corpus against a VM executable:
//! `bpf-conformance run --vm ./vm/test --corpus tests`.

mod commands;
mod output;
mod target;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use target::TargetArgs;

#[derive(Parser)]
#[command(name = "bpf-conformance")]
#[command(about = "Conformance test runner for BPF virtual machines", long_about = None)]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify fixtures against the VM
    Run {
        #[command(flatten)]
        target: TargetArgs,
        /// Fixture files to run instead of the whole corpus
        files: Vec<PathBuf>,
        /// Only run cases whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Stop after the first failure or error
        #[arg(long)]
        bail: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Reporter::Default)]
        reporter: Reporter,
        /// When to use colors (auto, always, never)
        #[arg(long, default_value = "auto")]
        color: String,
    },

    /// List the cases the corpus yields, without running them
    List {
        #[command(flatten)]
        target: TargetArgs,
        /// Only list cases whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Reporter {
    Default,
    Dot,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Run {
            target,
            files,
            filter,
            bail,
            reporter,
            color,
        } => {
            let ok = commands::run::execute(commands::run::RunArgs {
                target,
                files,
                filter,
                bail,
                reporter,
                color,
            })?;
            if !ok {
                std::process::exit(1);
            }
        }

        Commands::List { target, filter } => {
            commands::list::execute(&target, filter.as_deref())?;
        }
    }

    Ok(())
}
