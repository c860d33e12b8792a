// Non-command gateway events.

use crate::discord::interactions::handle_interaction;
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "Connected to Discord"
            );
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            if let Err(e) = data
                .guilds
                .register(guild.id.get(), &guild.name, Utc::now())
                .await
            {
                tracing::error!(guild_id = guild.id.get(), error = %e, "Failed to register guild");
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            // Errors here have no poise context, so log them and keep going.
            if let Err(e) = handle_interaction(ctx, interaction, data).await {
                tracing::error!(error = %e, "Interaction handler failed");
            }
        }
        _ => {}
    }

    Ok(())
}
