// Personal reminders and booking reminder settings.
//
// Personal reminders are stored with the user and delivered by DM from the
// reminder sweep, so they survive restarts.

use crate::core::bookings::{format_minutes, parse_duration};
use crate::core::reminders::HOUR_MS;
use crate::discord::embeds::{self, discord_time};
use crate::discord::guards::{admin_check, report, reply_private};
use crate::discord::reminders::ReminderDispatcher;
use crate::discord::{Context, Error};
use chrono::{Duration, Utc};
use poise::serenity_prelude as serenity;

#[poise::command(slash_command, subcommands("set", "list", "settings"))]
pub async fn remind(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Get a DM after the given time.
///
/// **Examples:**
/// - `/remind set message:"Shield up" after:"30m"`
/// - `/remind set message:"Bear trap" after:"2 hours"`
#[poise::command(slash_command)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "What to remind you about"] message: String,
    #[description = "When, e.g. 30m, 2h, 1d"] after: String,
) -> Result<(), Error> {
    let Some(delay) = parse_duration(&after) else {
        return reply_private(
            ctx,
            "❌ Invalid time. Use formats like `30m`, `2h`, `1d` or `2 hours`.",
        )
        .await;
    };
    if delay < Duration::minutes(1) || delay > Duration::days(30) {
        return reply_private(ctx, "❌ Reminders must be between 1 minute and 30 days away.")
            .await;
    }

    let data = ctx.data();
    let user_id = ctx.author().id.get();
    let now = Utc::now();
    match data
        .users
        .add_reminder(user_id, &message, now + delay, now)
        .await
    {
        Ok(reminder) => {
            tracing::info!(user_id, reminder_id = %reminder.id, "Personal reminder set");
            reply_private(
                ctx,
                format!(
                    "⏰ I'll DM you {} ({}).",
                    discord_time(reminder.remind_at, 'R'),
                    format_minutes(delay.num_minutes())
                ),
            )
            .await?;
            ReminderDispatcher::from_data(ctx.serenity_context().http.clone(), data)
                .sweep()
                .await;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Your pending reminders.
#[poise::command(slash_command)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let reminders = ctx
        .data()
        .users
        .pending_reminders(ctx.author().id.get())
        .await?;
    if reminders.is_empty() {
        return reply_private(ctx, "You have no pending reminders.").await;
    }

    let lines: Vec<String> = reminders
        .iter()
        .map(|r| {
            format!(
                "{}: {}",
                discord_time(r.remind_at, 'R'),
                embeds::clip(&r.message, 100)
            )
        })
        .collect();
    let embed = serenity::CreateEmbed::new()
        .title(format!("⏰ Pending reminders ({})", reminders.len()))
        .description(embeds::clip(&lines.join("\n"), 4000))
        .color(embeds::REMINDER_COLOR);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// `"24, 6h,3"` -> `[24, 6, 3]`. `None` if any entry isn't a whole number.
fn parse_hours(input: &str) -> Option<Vec<u64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_end_matches(|c: char| c == 'h' || c == 'H').parse::<u64>().ok())
        .collect()
}

/// Show or change booking reminder settings.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn settings(
    ctx: Context<'_>,
    #[description = "Send booking reminders at all"] enabled: Option<bool>,
    #[description = "Hours before start, comma separated, e.g. 24,6,3,1"] times: Option<String>,
) -> Result<(), Error> {
    let reminders = &ctx.data().reminders;

    if let Some(enabled) = enabled {
        if let Err(e) = reminders.set_enabled(enabled).await {
            return report(ctx, e).await;
        }
        tracing::info!(user_id = ctx.author().id.get(), enabled, "Booking reminders toggled");
    }

    if let Some(times) = times {
        let Some(hours) = parse_hours(&times) else {
            return reply_private(ctx, "❌ Times must be whole hours, e.g. `24,6,3,1`.").await;
        };
        if let Err(e) = reminders.set_times(&hours).await {
            return report(ctx, e).await;
        }
        tracing::info!(user_id = ctx.author().id.get(), ?hours, "Booking reminder times changed");
    }

    let current = reminders.settings().await?;
    let times = current
        .times
        .iter()
        .map(|ms| format!("{}h", ms / HOUR_MS))
        .collect::<Vec<_>>()
        .join(", ");
    let embed = serenity::CreateEmbed::new()
        .title("🔔 Booking reminders")
        .color(embeds::REMINDER_COLOR)
        .field(
            "Status",
            if current.enabled { "Enabled" } else { "Disabled" },
            true,
        )
        .field("Before start", times, true)
        .field("Armed now", reminders.armed_count().to_string(), true);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("24,6,3,1"), Some(vec![24, 6, 3, 1]));
        assert_eq!(parse_hours(" 12h, 2H ,"), Some(vec![12, 2]));
        assert_eq!(parse_hours(""), Some(vec![]));
        assert_eq!(parse_hours("1,soon"), None);
        assert_eq!(parse_hours("-3"), None);
    }
}
