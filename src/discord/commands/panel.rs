use crate::discord::embeds;
use crate::discord::guards::{admin_check, report, reply_private};
use crate::discord::interactions::components::panel_rows;
use crate::discord::{Context, Error};
use chrono::Utc;

/// Post the alliance control panel in this channel.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn panel(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;
    let guild_name = ctx
        .guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| guild_id.to_string());

    let alliance = data.alliance.info().await?;
    let rows = panel_rows(data.layout.layout().await?);
    if rows.is_empty() {
        return reply_private(ctx, "❌ Every panel button is disabled. Enable some with `/panelbutton`.").await;
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(embeds::panel_embed(alliance.name.as_deref()))
            .components(rows),
    )
    .await?;

    data.guilds
        .set_panel_channel(guild_id.get(), &guild_name, ctx.channel_id().get(), Utc::now())
        .await?;
    tracing::info!(
        guild_id = guild_id.get(),
        channel_id = ctx.channel_id().get(),
        "Panel posted"
    );
    Ok(())
}

/// Show or hide a button on future panels.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn panelbutton(
    ctx: Context<'_>,
    #[description = "Button action, e.g. schedule:view"]
    #[autocomplete = "autocomplete_action"]
    action: String,
    #[description = "Show the button?"] enabled: bool,
) -> Result<(), Error> {
    match ctx.data().layout.set_enabled(&action, enabled).await {
        Ok(()) => {
            let state = if enabled { "shown" } else { "hidden" };
            reply_private(
                ctx,
                format!("✅ `{}` is now {}. Post `/panel` again to apply.", action.trim(), state),
            )
            .await
        }
        Err(e) => report(ctx, e).await,
    }
}

async fn autocomplete_action(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let buttons = match ctx.data().layout.buttons().await {
        Ok(buttons) => buttons,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load panel buttons for autocomplete");
            return Vec::new();
        }
    };
    buttons
        .into_iter()
        .map(|b| b.action)
        .filter(|action| action.starts_with(partial))
        .collect()
}
