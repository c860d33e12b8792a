use crate::discord::embeds;
use crate::discord::guards::{admin_check, report};
use crate::discord::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Alliance ministries and their ministers.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("list", "create", "appoint", "vacate", "remove")
)]
pub async fn ministries(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show every ministry.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let ministries = ctx.data().ministries.list().await?;
    ctx.send(poise::CreateReply::default().embed(embeds::ministries_embed(&ministries)))
        .await?;
    Ok(())
}

/// Create a new ministry.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Ministry name"] name: String,
    #[description = "What this ministry does"] description: Option<String>,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    let description = description.unwrap_or_default();
    match ctx
        .data()
        .ministries
        .create(actor_id, &name, &description)
        .await
    {
        Ok(ministry) => {
            tracing::info!(actor_id, ministry_id = %ministry.id, "Ministry created");
            ctx.say(format!(
                "🏛️ Created **{}** (`{}`).",
                ministry.name, ministry.id
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Appoint a minister, replacing any current one.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn appoint(
    ctx: Context<'_>,
    #[description = "Ministry name or id"] ministry: String,
    #[description = "New minister"] user: serenity::User,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    match ctx
        .data()
        .ministries
        .appoint(actor_id, &ministry, user.id.get(), Utc::now())
        .await
    {
        Ok((ministry, previous)) => {
            tracing::info!(actor_id, ministry_id = %ministry.id, minister_id = user.id.get(), "Minister appointed");
            let replaced = match previous {
                Some(old) if old != user.id.get() => format!(", replacing <@{}>", old),
                _ => String::new(),
            };
            ctx.say(format!(
                "✅ <@{}> now heads **{}**{}.",
                user.id, ministry.name, replaced
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Remove the current minister.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn vacate(
    ctx: Context<'_>,
    #[description = "Ministry name or id"] ministry: String,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    match ctx.data().ministries.vacate(actor_id, &ministry).await {
        Ok(previous) => {
            tracing::info!(actor_id, ministry = %ministry, previous, "Ministry vacated");
            ctx.say(format!(
                "🪑 <@{}> stepped down from **{}**.",
                previous,
                ministry.trim()
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Delete a ministry.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Ministry name or id"] ministry: String,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    match ctx.data().ministries.remove(actor_id, &ministry).await {
        Ok(removed) => {
            tracing::info!(actor_id, ministry_id = %removed.id, "Ministry removed");
            ctx.say(format!("🗑️ Removed **{}**.", removed.name)).await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}
