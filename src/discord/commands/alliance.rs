// Alliance roster commands.
//
// Officers (R4/R5) can manage members ranked below them; bot admins and the
// owner can manage anyone. Alliance identity and leadership are admin-only.

use crate::core::alliance::{check_rank_authority, MemberUpdate, Rank};
use crate::discord::embeds;
use crate::discord::guards::{admin_check, authority_of, officer_check, report, reply_private};
use crate::discord::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RankChoice {
    #[name = "R1"]
    R1,
    #[name = "R2"]
    R2,
    #[name = "R3"]
    R3,
    #[name = "R4 (officer)"]
    R4,
    #[name = "R5 (leadership)"]
    R5,
}

impl From<RankChoice> for Rank {
    fn from(value: RankChoice) -> Self {
        match value {
            RankChoice::R1 => Rank::R1,
            RankChoice::R2 => Rank::R2,
            RankChoice::R3 => Rank::R3,
            RankChoice::R4 => Rank::R4,
            RankChoice::R5 => Rank::R5,
        }
    }
}

/// Replies with the reason and returns false when the caller may not touch
/// `target_id` (or grant `new_rank`).
async fn may_manage(
    ctx: Context<'_>,
    target_id: u64,
    new_rank: Option<Rank>,
) -> Result<bool, Error> {
    let data = ctx.data();
    let actor_id = ctx.author().id.get();
    let authority = authority_of(data, actor_id).await?;
    let actor_rank = data.alliance.rank_of(actor_id).await?;
    let target_rank = data.alliance.rank_of(target_id).await?;

    match check_rank_authority(authority, actor_rank, target_rank, new_rank) {
        Ok(()) => Ok(true),
        Err(e) => {
            report(ctx, e).await?;
            Ok(false)
        }
    }
}

/// Add a user to the alliance roster.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn addmember(
    ctx: Context<'_>,
    #[description = "User to add"] user: serenity::User,
    #[description = "Starting rank (default R1)"] rank: Option<RankChoice>,
) -> Result<(), Error> {
    if user.bot {
        return reply_private(ctx, "❌ Bots can't join the alliance.").await;
    }
    let rank: Rank = rank.map(Rank::from).unwrap_or(Rank::R1);
    if !may_manage(ctx, user.id.get(), Some(rank)).await? {
        return Ok(());
    }

    let actor_id = ctx.author().id.get();
    match ctx
        .data()
        .alliance
        .add_member(actor_id, user.id.get(), rank, Utc::now())
        .await
    {
        Ok(member) => {
            tracing::info!(actor_id, user_id = member.id, rank = %member.rank, "Member added");
            ctx.say(format!(
                "✅ <@{}> joined the alliance as {} {}.",
                member.id,
                member.rank.emoji(),
                member.rank
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Remove a user from the alliance roster.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn removemember(
    ctx: Context<'_>,
    #[description = "Member to remove"] user: serenity::User,
) -> Result<(), Error> {
    if !may_manage(ctx, user.id.get(), None).await? {
        return Ok(());
    }

    let actor_id = ctx.author().id.get();
    match ctx.data().alliance.remove_member(actor_id, user.id.get()).await {
        Ok(member) => {
            tracing::info!(actor_id, user_id = member.id, "Member removed");
            ctx.say(format!("👋 <@{}> was removed from the alliance.", member.id))
                .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Promote or demote a member.
#[poise::command(slash_command, guild_only, check = "officer_check")]
pub async fn changerank(
    ctx: Context<'_>,
    #[description = "Member to change"] user: serenity::User,
    #[description = "New rank"] rank: RankChoice,
) -> Result<(), Error> {
    let rank = Rank::from(rank);
    if !may_manage(ctx, user.id.get(), Some(rank)).await? {
        return Ok(());
    }

    let actor_id = ctx.author().id.get();
    match ctx
        .data()
        .alliance
        .change_rank(actor_id, user.id.get(), rank)
        .await
    {
        Ok(previous) => {
            tracing::info!(actor_id, user_id = user.id.get(), from = %previous, to = %rank, "Rank changed");
            let message = match rank_change_arrow(previous, rank) {
                Some(arrow) => format!(
                    "{} <@{}>: {} → {} {}",
                    arrow,
                    user.id,
                    previous,
                    rank.emoji(),
                    rank
                ),
                None => format!("➡️ <@{}> is already {} {}.", user.id, rank.emoji(), rank),
            };
            ctx.say(message).await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Up for a promotion, down for a demotion, nothing if the rank didn't move.
fn rank_change_arrow(previous: Rank, new: Rank) -> Option<&'static str> {
    match new.cmp(&previous) {
        Ordering::Greater => Some("⬆️"),
        Ordering::Less => Some("⬇️"),
        Ordering::Equal => None,
    }
}

/// Set the alliance name and tag.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn setalliance(
    ctx: Context<'_>,
    #[description = "Alliance name"] name: String,
    #[description = "Short tag, e.g. ABC (keeps the current one if empty)"] tag: Option<String>,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    let data = ctx.data();
    match data
        .alliance
        .set_alliance(actor_id, &name, tag.as_deref())
        .await
    {
        Ok(alliance) => {
            tracing::info!(actor_id, name = ?alliance.name, tag = ?alliance.tag, "Alliance updated");
            let stats = data.alliance.stats().await?;
            ctx.send(
                poise::CreateReply::default()
                    .content("✅ Alliance updated.")
                    .embed(embeds::alliance_embed(&alliance, &stats)),
            )
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Make a member the alliance leader. They are promoted to R5.
#[poise::command(slash_command, guild_only, check = "admin_check")]
pub async fn setleader(
    ctx: Context<'_>,
    #[description = "New leader"] user: serenity::User,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    match ctx.data().alliance.set_leader(actor_id, user.id.get()).await {
        Ok(previous) => {
            tracing::info!(actor_id, leader_id = user.id.get(), previous = ?previous, "Leader set");
            let handover = match previous {
                Some(old) if old != user.id.get() => format!(" (previously <@{}>)", old),
                _ => String::new(),
            };
            ctx.say(format!("👑 <@{}> now leads the alliance{}.", user.id, handover))
                .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

/// Show the alliance overview.
#[poise::command(slash_command, guild_only)]
pub async fn allianceinfo(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let alliance = data.alliance.info().await?;
    let stats = data.alliance.stats().await?;
    ctx.send(poise::CreateReply::default().embed(embeds::alliance_embed(&alliance, &stats)))
        .await?;
    Ok(())
}

/// List alliance members by rank.
#[poise::command(slash_command, guild_only)]
pub async fn members(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let leader = data.alliance.info().await?.leader;
    let members = data.alliance.members().await?;
    ctx.send(poise::CreateReply::default().embed(embeds::members_embed(&members, leader)))
        .await?;
    Ok(())
}

/// Update a member's game profile. Officers can update members below them.
#[poise::command(slash_command, guild_only)]
pub async fn update(
    ctx: Context<'_>,
    #[description = "Member to update (defaults to you)"] user: Option<serenity::User>,
    #[description = "Total power"] power: Option<u64>,
    #[description = "Furnace level"]
    #[min = 1]
    #[max = 100]
    furnace_level: Option<u32>,
    #[description = "In-game player id"] game_id: Option<String>,
) -> Result<(), Error> {
    let actor_id = ctx.author().id.get();
    let target_id = user.as_ref().map_or(actor_id, |u| u.id.get());
    if target_id != actor_id && !may_manage(ctx, target_id, None).await? {
        return Ok(());
    }

    let update = MemberUpdate {
        power,
        furnace_level,
        game_id,
    };
    match ctx
        .data()
        .alliance
        .update_member(actor_id, target_id, update)
        .await
    {
        Ok(member) => {
            tracing::info!(actor_id, user_id = member.id, "Member profile updated");
            let game_id = member.game_id.as_deref().unwrap_or("not set");
            ctx.say(format!(
                "✅ Updated <@{}>: ⚡ {} · 🔥 {} · 🎮 {}",
                member.id, member.power, member.furnace_level, game_id
            ))
            .await?;
            Ok(())
        }
        Err(e) => report(ctx, e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_change_arrow() {
        assert_eq!(rank_change_arrow(Rank::R2, Rank::R4), Some("⬆️"));
        assert_eq!(rank_change_arrow(Rank::R4, Rank::R1), Some("⬇️"));
        assert_eq!(rank_change_arrow(Rank::R3, Rank::R3), None);
    }
}
