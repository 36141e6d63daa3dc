//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

pub mod model_list;

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::cli::model_list::list_models;
use crate::core::config::{resolve_base_url, Config};
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "ollaterm")]
#[command(about = "A terminal chat client for local LLM inference servers")]
#[command(
    long_about = "Ollaterm is a full-screen terminal chat client for locally hosted LLM \
inference servers. It discovers available models, streams responses token by \
token, and lets you stop a response mid-flight.\n\n\
Server:\n\
  Talks to the server's native API (/api/tags, /api/generate) and falls back \
to the OpenAI-compatible surface (/v1/models, /v1/completions) when the \
native endpoints are unavailable.\n\n\
Environment Variables:\n\
  OLLAMA_HOST       Server base URL (optional, defaults to http://localhost:11434)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Esc               Stop the streaming response\n\
  Tab               Switch to the next model\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat, or list available models if no model specified
    #[arg(short = 'm', long, global = true, value_name = "MODEL", num_args = 0..=1, default_missing_value = "")]
    pub model: Option<String>,

    /// Enable transcript logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Override the inference server base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set configuration values
    Set {
        /// Configuration key to set (base-url, default-model)
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset (base-url, default-model)
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match (key.as_str(), value) {
                ("base-url", Some(url)) => {
                    config.base_url = Some(url.clone());
                    config.save()?;
                    println!("✅ Set base-url to: {url}");
                }
                ("default-model", Some(model)) => {
                    config.default_model = Some(model.clone());
                    config.save()?;
                    println!("✅ Set default-model to: {model}");
                }
                ("base-url", None) | ("default-model", None) => {
                    config.print_all();
                }
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "base-url" => {
                    config.base_url = None;
                    config.save()?;
                    println!("✅ Unset base-url");
                }
                "default-model" => {
                    config.default_model = None;
                    config.save()?;
                    println!("✅ Unset default-model");
                }
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Chat => {
            let config = Config::load()?;
            let base_url = resolve_base_url(args.base_url, &config);

            match args.model.as_deref() {
                Some("") => {
                    // -m was provided without a value, list available models
                    list_models(&base_url).await
                }
                Some(model) => run_chat(base_url, Some(model.to_string()), args.log).await,
                None => run_chat(base_url, config.default_model.clone(), args.log).await,
            }
        }
    }
}

/// Hook tracing output up to RUST_LOG when set. Kept off by default: the
/// subscriber writes to stderr, which the alternate screen would garble.
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}
