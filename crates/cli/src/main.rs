//! rootbound CLI: the main entry point.
//!
//! `rootbound "<prompt>"` runs one agent loop against the configured working
//! directory and prints the answer. `--verbose` adds token usage and tool
//! results; `--confirm` asks before every tool call.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod approval;
mod render;
mod run;

#[derive(Parser)]
#[command(
    name = "rootbound",
    about = "rootbound: a file-tool agent confined to one working directory",
    version
)]
pub struct Cli {
    /// The initial prompt for the agent
    prompt: Option<String>,

    /// Print the prompt, token usage and tool results
    #[arg(short, long)]
    verbose: bool,

    /// Ask on stdin before executing each tool call
    #[arg(long)]
    confirm: bool,

    /// Override the working directory the tools are confined to
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Override the maximum number of model calls
    #[arg(long, value_name = "N")]
    max_iterations: Option<u32>,

    /// Override the model
    #[arg(long)]
    model: Option<String>,

    /// Override the provider (gemini, openai, ollama, ...)
    #[arg(long)]
    provider: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(prompt) = cli.prompt.clone() else {
        eprintln!("Error: Please provide a prompt");
        return ExitCode::FAILURE;
    };

    match run::run(&cli, prompt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
