//! Wire config, working root, tools, provider and agent together for one run.

use std::sync::Arc;

use rootbound_agent::{AgentLoop, TerminalState};
use rootbound_config::AppConfig;
use rootbound_core::error::{Error, ProviderError, Result};
use rootbound_core::root::WorkingRoot;
use rootbound_tools::{ToolSettings, default_registry};
use tracing::{info, warn};

use crate::Cli;
use crate::approval::StdinApprover;
use crate::render::Renderer;

pub async fn run(cli: &Cli, prompt: String) -> Result<()> {
    let mut config = AppConfig::load().map_err(config_error)?;
    apply_overrides(&mut config, cli);
    config.validate().map_err(config_error)?;

    // Check for an API key early so the error is clear
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...      (default provider)");
        eprintln!("    OPENAI_API_KEY=...      (with --provider openai)");
        eprintln!("    ROOTBOUND_API_KEY=...   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(ProviderError::NotConfigured(format!(
            "no API key for provider {}",
            config.default_provider
        ))
        .into());
    }

    let root =
        WorkingRoot::new(&config.tools.working_directory).map_err(|source| Error::WorkingRoot {
            path: config.tools.working_directory.clone(),
            source,
        })?;
    info!(root = %root, "Working root fixed for this run");

    let settings = ToolSettings {
        max_read_chars: config.tools.max_read_chars,
        script_interpreter: config.tools.script_interpreter.clone(),
        script_extension: config.tools.script_extension.clone(),
        script_timeout: config.tools.script_timeout(),
    };
    let tools = Arc::new(default_registry(root, &settings));

    // Build provider from config
    let router = rootbound_providers::build_from_config(&config);
    let provider = router.default().ok_or_else(|| {
        ProviderError::NotConfigured(format!("unknown provider {}", config.default_provider))
    })?;
    let model = resolve_model(&config, cli);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let renderer = Renderer::new(cli.verbose);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            for line in renderer.lines(&event) {
                println!("{line}");
            }
        }
    });

    let mut agent = AgentLoop::new(provider, model, tools)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_iterations(config.agent.max_iterations)
        .with_context_ceiling(config.agent.context_ceiling)
        .with_events(tx);
    if let Some(system_prompt) = &config.agent.system_prompt_override {
        agent = agent.with_system_prompt(system_prompt.clone());
    }
    if cli.confirm {
        agent = agent.with_approver(Arc::new(StdinApprover::new()));
    }

    if cli.verbose {
        println!("User prompt: {prompt}");
    }

    let outcome = agent.run(prompt).await;

    // Dropping the agent closes the event channel so the printer drains and exits.
    drop(agent);
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer task failed");
    }

    match outcome.status {
        TerminalState::Fault => eprintln!("Error: {}", outcome.text),
        _ => println!("{}", outcome.text),
    }

    if cli.verbose {
        println!(
            "Finished ({:?}) after {} iteration(s); total prompt tokens: {}, response tokens: {}",
            outcome.status,
            outcome.iterations,
            outcome.usage_total.prompt_tokens,
            outcome.usage_total.response_tokens
        );
    }

    Ok(())
}

fn config_error(e: rootbound_config::ConfigError) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}

/// CLI flags win over the file and the environment.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(dir) = &cli.workdir {
        config.tools.working_directory = dir.clone();
    }
    if let Some(max) = cli.max_iterations {
        config.agent.max_iterations = max;
    }
    if let Some(provider) = &cli.provider {
        config.default_provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.default_model = model.clone();
    }
}

/// `--model` first, then the provider table's own default, then `default_model`.
fn resolve_model(config: &AppConfig, cli: &Cli) -> String {
    if let Some(model) = &cli.model {
        return model.clone();
    }
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rootbound_config::ProviderConfig;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "rootbound",
            "do something",
            "--workdir",
            "/tmp/project",
            "--max-iterations",
            "5",
            "--provider",
            "openai",
            "--model",
            "gpt-4o-mini",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.tools.working_directory, std::path::PathBuf::from("/tmp/project"));
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.default_provider, "openai");
        assert_eq!(resolve_model(&config, &cli), "gpt-4o-mini");
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["rootbound", "hi"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.agent.max_iterations, 20);
        assert_eq!(resolve_model(&config, &cli), "gemini-2.0-flash-001");
    }

    #[test]
    fn provider_table_model_beats_global_default() {
        let cli = Cli::parse_from(["rootbound", "hi"]);
        let mut config = AppConfig::default();
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("gemini-2.5-pro".into()),
            },
        );
        assert_eq!(resolve_model(&config, &cli), "gemini-2.5-pro");
    }
}
