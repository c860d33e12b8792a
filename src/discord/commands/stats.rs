use crate::discord::embeds;
use crate::discord::guards::{admin_check, officer_check};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Alliance, booking and bot statistics.
#[poise::command(slash_command, guild_only)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let alliance = data.alliance.stats().await?;
    let bookings = data.bookings.stats().await?;
    let users = data.users.count().await?;
    let guilds = data.guilds.count().await?;

    let embed = embeds::stats_embed(&alliance, &bookings, users, guilds, data.started_at)
        .timestamp(serenity::Timestamp::now());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Recent entries of the alliance audit log.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn logs(
    ctx: Context<'_>,
    #[description = "Only entries about this user"] user: Option<serenity::User>,
    #[description = "How many entries (default 15)"]
    #[min = 1]
    #[max = 50]
    limit: Option<u32>,
) -> Result<(), Error> {
    let limit = limit.unwrap_or(15) as usize;
    let entries = ctx
        .data()
        .logs
        .recent(limit, user.map(|u| u.id.get()))
        .await?;
    ctx.send(
        poise::CreateReply::default()
            .embed(embeds::logs_embed(&entries))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Reload data files from disk and re-register commands in this server.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn refresh(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let dropped = data.database.cached_documents();
    data.database.invalidate();

    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;
    let commands = &ctx.framework().options().commands;
    poise::builtins::register_in_guild(ctx.serenity_context(), commands, guild_id).await?;

    tracing::info!(
        user_id = ctx.author().id.get(),
        guild_id = guild_id.get(),
        dropped,
        commands = commands.len(),
        "Refreshed cache and commands"
    );
    ctx.say(format!(
        "🔄 Dropped {} cached documents and re-registered {} commands.",
        dropped,
        commands.len()
    ))
    .await?;
    Ok(())
}
