// This is the entry point of the alliance bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files, configuration)
// - `discord/` = Discord-specific adapters (commands, panel, reminders)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Start the reminder sweep

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::storage::Database;
use crate::discord::reminders::ReminderDispatcher;
use crate::discord::{Data, Error};
use crate::infra::config::BotConfig;
use crate::infra::storage::JsonFileStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One database over the data directory, shared by every service.

    let database = Arc::new(Database::new(JsonFileStore::new(&config.data_dir)));
    database
        .ensure_defaults()
        .await
        .with_context(|| format!("Failed to prepare data directory {}", config.data_dir.display()))?;
    tracing::info!(data_dir = %config.data_dir.display(), "Data files ready");

    let data = Data::new(database, config.owner_id);

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let guild_id = config.guild_id;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(discord::guards::on_error(error)),
            // Every command user gets a record, like panel users do.
            pre_command: |ctx| {
                Box::pin(async move {
                    let user_id = ctx.author().id.get();
                    tracing::info!(
                        command = %ctx.command().qualified_name,
                        user_id,
                        "Command invoked"
                    );
                    if let Err(e) = ctx.data().users.ensure(user_id).await {
                        tracing::error!(user_id, error = %e, "Failed to create user record");
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match guild_id {
                    Some(id) => {
                        poise::builtins::register_in_guild(ctx, commands, serenity::GuildId::new(id))
                            .await?;
                        tracing::info!(guild_id = id, count = commands.len(), "Commands registered in guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands).await?;
                        tracing::info!(count = commands.len(), "Commands registered globally");
                    }
                }

                ReminderDispatcher::from_data(ctx.http.clone(), &data).spawn();
                tracing::info!("Reminder sweep started");

                Ok::<Data, Error>(data)
            })
        })
        .build();

    // Components and modals arrive through GUILDS; reminders go out by DM.
    let intents = serenity::GatewayIntents::non_privileged();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client stopped")?;
    Ok(())
}
