use crate::discord::guards::{admin_check, owner_check, report, reply_private};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Grant bot admin rights to a user (owner only).
#[poise::command(slash_command, guild_only, check = "owner_check")]
pub async fn addadmin(
    ctx: Context<'_>,
    #[description = "User to promote"] user: serenity::User,
) -> Result<(), Error> {
    if user.bot {
        return reply_private(ctx, "❌ Bots can't be admins.").await;
    }
    let actor_id = ctx.author().id.get();
    match ctx.data().permissions.add_admin(actor_id, user.id.get()).await {
        Ok(()) => {
            tracing::info!(actor_id, user_id = user.id.get(), "Admin added");
            ctx.say(format!("✅ <@{}> is now a bot admin.", user.id)).await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Revoke a user's bot admin rights (owner only).
#[poise::command(slash_command, guild_only, check = "owner_check")]
pub async fn removeadmin(
    ctx: Context<'_>,
    #[description = "Admin to demote"] user: serenity::User,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    match ctx
        .data()
        .permissions
        .remove_admin(actor_id, user.id.get())
        .await
    {
        Ok(()) => {
            tracing::info!(actor_id, user_id = user.id.get(), "Admin removed");
            ctx.say(format!("✅ <@{}> is no longer a bot admin.", user.id))
                .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Claim or assign the bot owner. Only works once.
///
/// When `OWNER_ID` is configured only that user may run it.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setowner(
    ctx: Context<'_>,
    #[description = "New owner (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    if target.bot {
        return reply_private(ctx, "❌ Bots can't own the bot.").await;
    }

    let permissions = &ctx.data().permissions;
    if let Some(fallback) = permissions.fallback_owner() {
        if fallback != actor_id {
            return reply_private(ctx, "⛔ Only the configured owner can do that.").await;
        }
    }

    match permissions.set_owner(actor_id, target.id.get()).await {
        Ok(()) => {
            tracing::info!(actor_id, owner_id = target.id.get(), "Bot owner set");
            ctx.say(format!("👑 <@{}> is now the bot owner.", target.id))
                .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// List the bot owner and admins.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn admins(ctx: Context<'_>) -> Result<(), Error> {
    let permissions = &ctx.data().permissions;
    let owner = permissions
        .owner()
        .await?
        .or(permissions.fallback_owner())
        .map(|id| format!("<@{}>", id))
        .unwrap_or_else(|| "Not set".to_string());
    let admins = permissions.admins().await?;
    let admin_list = if admins.is_empty() {
        "None".to_string()
    } else {
        admins
            .iter()
            .map(|id| format!("<@{}>", id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title("🔐 Bot permissions")
        .color(serenity::Colour::DARK_GREY)
        .field("Owner", owner, false)
        .field(format!("Admins ({})", admins.len()), admin_list, false);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
