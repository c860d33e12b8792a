use crate::core::alliance::{Alliance, AllianceLogEntry, AllianceMember, AllianceStats, Rank};
use crate::core::bookings::{format_minutes, Booking, BookingTypeStats, ResourceType};
use crate::core::ministries::Ministry;
use crate::core::schedule::ScheduledEvent;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

pub const BOOKING_COLOR: serenity::Colour = serenity::Colour::BLURPLE;
pub const ALLIANCE_COLOR: serenity::Colour = serenity::Colour::GOLD;
pub const REMINDER_COLOR: serenity::Colour = serenity::Colour::ORANGE;
pub const LOG_COLOR: serenity::Colour = serenity::Colour::LIGHT_GREY;

// Discord limits.
const DESCRIPTION_LIMIT: usize = 4000;
const FIELD_LIMIT: usize = 1000;
const MAX_FIELDS: usize = 25;

/// `<t:...:style>`: rendered in each reader's own timezone.
pub fn discord_time(at: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{}>", at.timestamp(), style)
}

/// Cut `text` to at most `max` characters, marking the cut.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn booking_line(booking: &Booking) -> String {
    let mut line = format!(
        "`{}` <@{}> {} → {} ({})",
        booking.id,
        booking.user_id,
        discord_time(booking.start_date, 'f'),
        discord_time(booking.end_date, 'f'),
        format_minutes(booking.duration)
    );
    if !booking.notes.is_empty() {
        line.push_str(&format!("\n> {}", clip(&booking.notes, 200)));
    }
    line
}

pub fn booking_created_embed(resource: ResourceType, booking: &Booking) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("✅ {} booked", resource.title()))
        .color(BOOKING_COLOR)
        .field("Start", discord_time(booking.start_date, 'F'), true)
        .field("End", discord_time(booking.end_date, 'F'), true)
        .field("Duration", format_minutes(booking.duration), true)
        .footer(CreateEmbedFooter::new(format!("Booking ID: {}", booking.id)));
    if !booking.notes.is_empty() {
        embed = embed.field("Notes", clip(&booking.notes, FIELD_LIMIT), false);
    }
    embed
}

/// Bookings grouped per resource type.
pub fn bookings_embed(title: &str, bookings: &[(ResourceType, Booking)]) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(title).color(BOOKING_COLOR);
    if bookings.is_empty() {
        return embed.description("No bookings yet.");
    }

    for resource in ResourceType::ALL {
        let lines: Vec<String> = bookings
            .iter()
            .filter(|(t, _)| *t == resource)
            .map(|(_, b)| booking_line(b))
            .collect();
        if !lines.is_empty() {
            embed = embed.field(resource.title(), clip(&lines.join("\n"), FIELD_LIMIT), false);
        }
    }
    embed
}

pub fn booking_reminder_embed(
    resource: ResourceType,
    booking_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    offset_ms: u64,
) -> CreateEmbed {
    let lead = format_minutes((offset_ms / 60_000) as i64);
    CreateEmbed::new()
        .title(format!("⏰ {} starts in {}", resource.title(), lead))
        .description(format!(
            "Your booking runs {} → {}.",
            discord_time(start, 'F'),
            discord_time(end, 'F')
        ))
        .color(REMINDER_COLOR)
        .footer(CreateEmbedFooter::new(format!("Booking ID: {}", booking_id)))
}

pub fn personal_reminder_embed(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("⏰ Reminder")
        .description(clip(message, DESCRIPTION_LIMIT))
        .color(REMINDER_COLOR)
        .timestamp(serenity::Timestamp::now())
}

pub fn alliance_embed(alliance: &Alliance, stats: &AllianceStats) -> CreateEmbed {
    let name = match (&alliance.name, &alliance.tag) {
        (Some(name), Some(tag)) => format!("[{}] {}", tag, name),
        (Some(name), None) => name.clone(),
        _ => "Unnamed alliance".to_string(),
    };
    let leader = alliance
        .leader
        .map(|id| format!("<@{}>", id))
        .unwrap_or_else(|| "Not set".to_string());

    let mut embed = CreateEmbed::new()
        .title(format!("🏰 {}", name))
        .color(ALLIANCE_COLOR)
        .field("Leader", leader, true)
        .field("Members", stats.member_count.to_string(), true)
        .field("Total power", stats.total_power.to_string(), true);
    if let Some(updated) = alliance.updated_at {
        embed = embed.field("Last updated", discord_time(updated, 'R'), true);
    }
    embed
}

/// Members grouped by rank, highest first.
pub fn members_embed(members: &[AllianceMember], leader: Option<u64>) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("👥 Alliance members ({})", members.len()))
        .color(ALLIANCE_COLOR);
    if members.is_empty() {
        return embed.description("No members yet. Add one with `/addmember`.");
    }

    for rank in Rank::ALL.into_iter().rev() {
        let lines: Vec<String> = members
            .iter()
            .filter(|m| m.rank == rank)
            .map(|m| {
                let crown = if leader == Some(m.id) { " 👑" } else { "" };
                format!(
                    "<@{}>{} · ⚡ {} · 🔥 {}",
                    m.id, crown, m.power, m.furnace_level
                )
            })
            .collect();
        if !lines.is_empty() {
            embed = embed.field(
                format!("{} {} ({})", rank.emoji(), rank, lines.len()),
                clip(&lines.join("\n"), FIELD_LIMIT),
                false,
            );
        }
    }
    embed
}

pub fn stats_embed(
    alliance: &AllianceStats,
    bookings: &[BookingTypeStats],
    users: usize,
    guilds: usize,
    started_at: DateTime<Utc>,
) -> CreateEmbed {
    let ranks = alliance
        .per_rank
        .iter()
        .map(|(rank, count)| format!("{} {}: **{}**", rank.emoji(), rank, count))
        .collect::<Vec<_>>()
        .join("\n");
    let booking_lines = bookings
        .iter()
        .map(|s| {
            format!(
                "{}: **{}** active, {} completed",
                s.resource.title(),
                s.active,
                s.completed
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    CreateEmbed::new()
        .title("📊 Statistics")
        .color(ALLIANCE_COLOR)
        .field("Ranks", ranks, true)
        .field(
            "Power",
            format!(
                "Total: **{}**\nAverage: **{}**\nAvg furnace: **{:.1}**",
                alliance.total_power, alliance.average_power, alliance.average_furnace_level
            ),
            true,
        )
        .field("Bookings", booking_lines, false)
        .field(
            "Bot",
            format!(
                "Users: **{}**\nServers: **{}**\nUp since {}",
                users,
                guilds,
                discord_time(started_at, 'R')
            ),
            false,
        )
}

pub fn logs_embed(entries: &[AllianceLogEntry]) -> CreateEmbed {
    let embed = CreateEmbed::new().title("📜 Alliance log").color(LOG_COLOR);
    if entries.is_empty() {
        return embed.description("Nothing logged yet.");
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            let target = e
                .target_id
                .map(|id| format!(" → <@{}>", id))
                .unwrap_or_default();
            format!(
                "{} **{}** by <@{}>{}\n{}",
                discord_time(e.timestamp, 'R'),
                e.action.title(),
                e.actor_id,
                target,
                e.details
            )
        })
        .collect();
    embed.description(clip(&lines.join("\n"), DESCRIPTION_LIMIT))
}

pub fn ministries_embed(ministries: &[Ministry]) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title("🏛️ Ministries").color(ALLIANCE_COLOR);
    if ministries.is_empty() {
        return embed.description("No ministries yet. Create one with `/ministries create`.");
    }

    for ministry in ministries.iter().take(MAX_FIELDS) {
        let minister = match (ministry.minister_id, ministry.appointed_at) {
            (Some(id), Some(at)) => format!("<@{}> since {}", id, discord_time(at, 'd')),
            (Some(id), None) => format!("<@{}>", id),
            _ => "*Vacant*".to_string(),
        };
        let mut value = minister;
        if !ministry.description.is_empty() {
            value.push_str(&format!("\n{}", ministry.description));
        }
        embed = embed.field(
            format!("{} (`{}`)", ministry.name, ministry.id),
            clip(&value, FIELD_LIMIT),
            false,
        );
    }
    embed
}

pub fn schedule_embed(events: &[(DateTime<Utc>, ScheduledEvent)]) -> CreateEmbed {
    let embed = CreateEmbed::new().title("📅 Upcoming events").color(BOOKING_COLOR);
    if events.is_empty() {
        return embed.description("No upcoming events.");
    }

    let lines: Vec<String> = events
        .iter()
        .map(|(at, event)| {
            let repeat = event
                .repeat_hours
                .map(|h| format!(" 🔁 every {}", format_minutes(i64::from(h) * 60)))
                .unwrap_or_default();
            let mut line = format!(
                "**{}** {} ({}){}\n`{}`",
                event.title,
                discord_time(*at, 'F'),
                discord_time(*at, 'R'),
                repeat,
                event.id
            );
            if !event.description.is_empty() {
                line.push_str(&format!(" {}", clip(&event.description, 200)));
            }
            line
        })
        .collect();
    embed.description(clip(&lines.join("\n\n"), DESCRIPTION_LIMIT))
}

pub fn panel_embed(alliance_name: Option<&str>) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!(
            "📋 {} control panel",
            alliance_name.unwrap_or("Alliance")
        ))
        .description(
            "Book a building, research or training slot, review your bookings, \
             check the event schedule or change your settings.\n\
             All times are UTC.",
        )
        .color(BOOKING_COLOR)
}
