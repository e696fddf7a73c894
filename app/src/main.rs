#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use kaiwa_config::Config;
use kaiwa_conversation::{EngineConfig, TurnEngine};
use kaiwa_core::{ConversationStore, LLMProvider};
use kaiwa_line::{AppState, LineClient};
use kaiwa_providers::OpenAiClient;
use kaiwa_store::SurrealStore;

#[derive(Parser)]
#[command(name = "kaiwa")]
#[command(about = "AI conversation relay for LINE", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve,
    /// Provision the default rich menu (setup-time, run once)
    Richmenu {
        /// JPEG image shown behind the menu
        #[arg(short, long, default_value = "./richmenu.jpg")]
        image: PathBuf,

        /// Also link the menu to a single user id
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve().await?,
        Commands::Richmenu { image, user } => provision_rich_menu(image, user).await?,
        Commands::Version => {
            println!("kaiwa {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Build every client up front, then hand the wired state to the server.
///
/// Any failure here is fatal: the process exits before binding the
/// listener rather than serving traffic with a half-initialized stack.
async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env().context("configuration error")?;
    info!("Loaded configuration from environment");

    let provider: Arc<dyn LLMProvider> = Arc::new(
        OpenAiClient::new(config.openai.api_key.clone())
            .with_model(config.openai.model.clone())
            .with_max_tokens(config.openai.max_tokens)
            .with_temperature(config.openai.temperature)
            .with_timeout(config.openai.request_timeout()),
    );

    let store: Arc<dyn ConversationStore> = Arc::new(
        SurrealStore::connect(&config.store, config.chat.max_history_pairs)
            .await
            .context("conversation store unreachable")?,
    );

    let engine = TurnEngine::new(
        provider,
        store,
        EngineConfig {
            system_prompt: config.chat.system_prompt.clone(),
            reset_keyword: config.chat.reset_keyword.clone(),
            max_history_pairs: config.chat.max_history_pairs,
        },
    );

    let line = LineClient::new(config.line.channel_access_token.clone())
        .with_timeout(config.openai.request_timeout());

    let state = AppState::new(
        engine,
        line,
        config.line.channel_secret.clone(),
        config.chat.reset_keyword.clone(),
    );

    kaiwa_line::run(state, config.server.port)
        .await
        .context("webhook server failed")?;

    Ok(())
}

async fn provision_rich_menu(image: PathBuf, user: Option<String>) -> anyhow::Result<()> {
    let config = Config::from_env().context("configuration error")?;

    let line = LineClient::new(config.line.channel_access_token.clone())
        .with_timeout(config.openai.request_timeout());

    let rich_menu_id = line
        .create_rich_menu(&config.chat.reset_keyword, "こんにちは")
        .await
        .context("rich menu creation failed")?;
    info!(rich_menu_id, "Rich menu created");

    let image_bytes = std::fs::read(&image)
        .with_context(|| format!("failed to read rich menu image: {}", image.display()))?;
    line.upload_rich_menu_image(&rich_menu_id, image_bytes)
        .await
        .context("rich menu image upload failed")?;

    line.set_default_rich_menu(&rich_menu_id)
        .await
        .context("setting default rich menu failed")?;
    info!(rich_menu_id, "Rich menu set as default");

    if let Some(user_id) = user {
        line.link_rich_menu_to_user(&user_id, &rich_menu_id)
            .await
            .context("linking rich menu failed")?;
        info!(user_id, "Rich menu linked to user");
    }

    println!("richmenu_id: {rich_menu_id}");

    Ok(())
}
