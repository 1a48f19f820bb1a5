use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use weatherbot_core::{Config, Orchestrator, ToolSet, config::API_KEY_ENV};

use crate::chat;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Weather chat assistant")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Gemini API key in the config file.
    Configure,

    /// Start an interactive weather chat.
    Chat(SessionArgs),

    /// Ask a single question and print the answer.
    Ask {
        /// The question, e.g. "Will it rain in Lisbon tomorrow?"
        question: String,

        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Declare only the forecast tool to the model.
    #[arg(long)]
    pub forecast_only: bool,

    /// Override the configured model name.
    #[arg(long)]
    pub model: Option<String>,
}

impl SessionArgs {
    fn apply(&self, config: &mut Config) {
        if self.forecast_only {
            config.model.tool_set = ToolSet::ForecastOnly;
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Chat(args) => {
                let Some(orchestrator) = build_orchestrator(&args)? else {
                    return Ok(());
                };
                chat::run_interactive(&orchestrator).await
            }
            Command::Ask { question, session } => {
                let Some(orchestrator) = build_orchestrator(&session)? else {
                    return Ok(());
                };
                chat::ask_once(&orchestrator, &question).await;
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Gemini API key:")
        .without_confirmation()
        .with_help_message("Create one at https://aistudio.google.com/apikey")
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// `None` when no credential is configured; the warning has been shown.
fn build_orchestrator(args: &SessionArgs) -> anyhow::Result<Option<Orchestrator>> {
    let mut config = Config::load()?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    args.apply(&mut config);

    if config.api_key().is_none() {
        chat::render_missing_credential(API_KEY_ENV);
        return Ok(None);
    }

    Orchestrator::from_config(&config).map(Some)
}
