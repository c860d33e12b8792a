// Bookings and alliance events. New bookings are made through the panel.

use crate::core::bookings::ResourceType;
use crate::core::permissions::Authority;
use crate::core::schedule::NewEvent;
use crate::discord::embeds;
use crate::discord::guards::{authority_of, officer_check, report};
use crate::discord::{Context, Error};
use chrono::Utc;

const BOOKINGS_SHOWN: usize = 30;
const EVENTS_SHOWN: usize = 10;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ResourceChoice {
    #[name = "Building"]
    Building,
    #[name = "Research"]
    Research,
    #[name = "Training"]
    Training,
}

impl From<ResourceChoice> for ResourceType {
    fn from(value: ResourceChoice) -> Self {
        match value {
            ResourceChoice::Building => ResourceType::Building,
            ResourceChoice::Research => ResourceType::Research,
            ResourceChoice::Training => ResourceType::Training,
        }
    }
}

/// Bookings and scheduled alliance events.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("bookings", "cancel", "events", "addevent", "removeevent")
)]
pub async fn schedule(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Upcoming bookings, optionally for one resource or only yours.
#[poise::command(slash_command, guild_only)]
pub async fn bookings(
    ctx: Context<'_>,
    #[description = "Only this resource"] resource: Option<ResourceChoice>,
    #[description = "Only your own bookings"] mine: Option<bool>,
) -> Result<(), Error> {
    let data = ctx.data();
    let resource = resource.map(ResourceType::from);
    let now = Utc::now();
    let mut list = match (mine.unwrap_or(false), resource) {
        (true, _) => data.bookings.list_for_user(ctx.author().id.get()).await?,
        (false, Some(resource)) => data
            .bookings
            .list(resource)
            .await?
            .into_iter()
            .filter(|b| b.is_active() && b.end_date > now)
            .take(BOOKINGS_SHOWN)
            .map(|b| (resource, b))
            .collect(),
        (false, None) => data.bookings.upcoming(now, BOOKINGS_SHOWN).await?,
    };
    if let Some(resource) = resource {
        list.retain(|(t, _)| *t == resource);
    }

    let title = match resource {
        Some(resource) => format!("📆 Upcoming {} bookings", resource.as_str()),
        None => "📆 Upcoming bookings".to_string(),
    };
    ctx.send(
        poise::CreateReply::default()
            .embed(embeds::bookings_embed(&title, &list))
            .ephemeral(mine.unwrap_or(false)),
    )
    .await?;
    Ok(())
}

/// Cancel a booking by id. Admins can cancel anyone's.
#[poise::command(slash_command, guild_only)]
pub async fn cancel(
    ctx: Context<'_>,
    #[description = "Booking id (shown in the booking footer)"] booking_id: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor_id = ctx.author().id.get();
    let privileged = authority_of(data, actor_id).await? >= Authority::Admin;

    match data.bookings.cancel(&booking_id, actor_id, privileged).await {
        Ok((resource, booking)) => {
            tracing::info!(actor_id, booking_id = %booking.id, resource = %resource, "Booking cancelled");
            let owner = if booking.user_id == actor_id {
                String::new()
            } else {
                format!(" (booked by <@{}>)", booking.user_id)
            };
            ctx.say(format!(
                "🗑️ Cancelled {} booking `{}`{}.",
                resource.as_str(),
                booking.id,
                owner
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Upcoming alliance events.
#[poise::command(slash_command, guild_only)]
pub async fn events(ctx: Context<'_>) -> Result<(), Error> {
    let events = ctx.data().schedule.upcoming(Utc::now(), EVENTS_SHOWN).await?;
    ctx.send(poise::CreateReply::default().embed(embeds::schedule_embed(&events)))
        .await?;
    Ok(())
}

/// Schedule an alliance event.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn addevent(
    ctx: Context<'_>,
    #[description = "Event title"] title: String,
    #[description = "Start, YYYY-MM-DD HH:MM (UTC)"] starts_at: String,
    #[description = "Repeat every N hours"]
    #[min = 1]
    #[max = 672]
    repeat_hours: Option<u32>,
    #[description = "Details"] description: Option<String>,
) -> Result<(), Error> {
    let request = NewEvent {
        title,
        description: description.unwrap_or_default(),
        starts_at,
        repeat_hours,
        created_by: ctx.author().id.get(),
    };
    match ctx.data().schedule.add_event(request, Utc::now()).await {
        Ok(event) => {
            ctx.say(format!(
                "📅 Scheduled **{}** for {} (`{}`).",
                event.title,
                embeds::discord_time(event.starts_at, 'F'),
                event.id
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Remove a scheduled event.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn removeevent(
    ctx: Context<'_>,
    #[description = "Event id"] event_id: String,
) -> Result<(), Error> {
    match ctx.data().schedule.remove_event(&event_id).await {
        Ok(event) => {
            tracing::info!(user_id = ctx.author().id.get(), event_id = %event.id, "Event removed");
            ctx.say(format!("🗑️ Removed **{}**.", event.title)).await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}
