// Permission checks and error replies shared by commands and interactions.

use crate::core::permissions::Authority;
use crate::core::storage::DomainError;
use crate::discord::{Context, Data, Error};

/// Bot tier combined with the user's alliance rank.
pub async fn authority_of(data: &Data, user_id: u64) -> Result<Authority, Error> {
    let rank = data.alliance.rank_of(user_id).await?;
    Ok(data.permissions.authority(user_id, rank).await?)
}

/// poise check: owner or admin.
pub async fn admin_check(ctx: Context<'_>) -> Result<bool, Error> {
    let authority = authority_of(ctx.data(), ctx.author().id.get()).await?;
    Ok(authority >= Authority::Admin)
}

/// poise check: the bot owner only.
pub async fn owner_check(ctx: Context<'_>) -> Result<bool, Error> {
    let authority = authority_of(ctx.data(), ctx.author().id.get()).await?;
    Ok(authority == Authority::Owner)
}

/// poise check: R4/R5 officers, admins and the owner.
pub async fn officer_check(ctx: Context<'_>) -> Result<bool, Error> {
    let authority = authority_of(ctx.data(), ctx.author().id.get()).await?;
    Ok(authority >= Authority::Officer)
}

/// Reply privately with a validation error, or hand storage errors to `on_error`.
pub async fn report<E: DomainError>(ctx: Context<'_>, error: E) -> Result<(), Error> {
    if error.is_storage() {
        return Err(Box::new(error));
    }
    tracing::debug!(
        command = %ctx.command().qualified_name,
        user_id = ctx.author().id.get(),
        error = %error,
        "Rejected command"
    );
    reply_private(ctx, format!("❌ {}", error)).await
}

pub async fn reply_private(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Framework error hook: log everything, answer the user with something generic.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            tracing::error!(error = %error, "Failed to start bot");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = ctx.author().id.get(),
                error = %error,
                "Command failed"
            );
            if let Err(e) = reply_private(ctx, "⚠️ Something went wrong. Please try again later.").await {
                tracing::error!(error = %e, "Failed to send error message");
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                tracing::error!(
                    command = %ctx.command().qualified_name,
                    error = %error,
                    "Permission check failed to run"
                );
            }
            if let Err(e) = reply_private(ctx, "⛔ You don't have permission to use this command.").await {
                tracing::error!(error = %e, "Failed to send permission message");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!(error = %e, "Error while handling error");
            }
        }
    }
}
