// Button and modal handlers for the booking panel.
//
// One `match` over `PanelAction` picks exactly one handler. Handlers reply
// ephemerally. Validation errors are shown to the user; storage errors are
// logged and answered with a generic message.

use super::components::{
    booking_modal, cancel_rows, language_modal, modal_values, DURATION_FIELD, LANGUAGE_FIELD,
    NOTES_FIELD, START_FIELD,
};
use super::panel_action::PanelAction;
use crate::core::bookings::{NewBooking, ResourceType};
use crate::core::permissions::Authority;
use crate::core::storage::DomainError;
use crate::discord::embeds;
use crate::discord::guards::authority_of;
use crate::discord::reminders::ReminderDispatcher;
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// How many schedule entries the panel shows.
const SCHEDULE_LIMIT: usize = 10;

/// The two interaction kinds the panel produces.
pub enum PanelInteraction<'a> {
    Component(&'a serenity::ComponentInteraction),
    Modal(&'a serenity::ModalInteraction),
}

impl PanelInteraction<'_> {
    fn custom_id(&self) -> &str {
        match self {
            PanelInteraction::Component(c) => &c.data.custom_id,
            PanelInteraction::Modal(m) => &m.data.custom_id,
        }
    }

    fn user(&self) -> &serenity::User {
        match self {
            PanelInteraction::Component(c) => &c.user,
            PanelInteraction::Modal(m) => &m.user,
        }
    }

    async fn respond(
        &self,
        ctx: &serenity::Context,
        response: serenity::CreateInteractionResponse,
    ) -> Result<(), serenity::Error> {
        match self {
            PanelInteraction::Component(c) => c.create_response(ctx, response).await,
            PanelInteraction::Modal(m) => m.create_response(ctx, response).await,
        }
    }

    async fn reply(
        &self,
        ctx: &serenity::Context,
        message: serenity::CreateInteractionResponseMessage,
    ) -> Result<(), serenity::Error> {
        self.respond(
            ctx,
            serenity::CreateInteractionResponse::Message(message.ephemeral(true)),
        )
        .await
    }

    async fn say(&self, ctx: &serenity::Context, content: impl Into<String>) -> Result<(), Error> {
        self.reply(
            ctx,
            serenity::CreateInteractionResponseMessage::new().content(content),
        )
        .await?;
        Ok(())
    }

    /// Show a validation error, or propagate a storage error.
    async fn report<E: DomainError>(&self, ctx: &serenity::Context, error: E) -> Result<(), Error> {
        if error.is_storage() {
            return Err(Box::new(error));
        }
        self.say(ctx, format!("❌ {}", error)).await
    }
}

/// Entry point from the event handler.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    let panel = match interaction {
        serenity::Interaction::Component(component) => PanelInteraction::Component(component),
        serenity::Interaction::Modal(modal) => PanelInteraction::Modal(modal),
        // Slash commands go through poise.
        _ => return Ok(()),
    };

    if let Err(e) = dispatch(ctx, &panel, data).await {
        tracing::error!(
            custom_id = %panel.custom_id(),
            user_id = panel.user().id.get(),
            error = %e,
            "Panel interaction failed"
        );
        panel
            .say(ctx, "⚠️ Something went wrong. Please try again later.")
            .await?;
    }
    Ok(())
}

async fn dispatch(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let user_id = panel.user().id.get();
    data.users.ensure(user_id).await?;

    let Some(action) = PanelAction::parse(panel.custom_id()) else {
        tracing::warn!(custom_id = %panel.custom_id(), user_id, "Unknown interaction");
        return panel.say(ctx, "❓ Unknown action.").await;
    };
    tracing::debug!(?action, user_id, "Panel interaction");

    match action {
        PanelAction::OpenBooking(resource) => open_booking(ctx, panel, resource).await,
        PanelAction::SubmitBooking(resource) => submit_booking(ctx, panel, data, resource).await,
        PanelAction::MyBookings => my_bookings(ctx, panel, data).await,
        PanelAction::CancelBooking(id) => cancel_booking(ctx, panel, data, &id).await,
        PanelAction::ToggleNotifications => toggle_notifications(ctx, panel, data).await,
        PanelAction::OpenLanguage => open_language(ctx, panel, data).await,
        PanelAction::SubmitLanguage => submit_language(ctx, panel, data).await,
        PanelAction::ViewSchedule => view_schedule(ctx, panel, data).await,
    }
}

async fn open_booking(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    resource: ResourceType,
) -> Result<(), Error> {
    panel
        .respond(
            ctx,
            serenity::CreateInteractionResponse::Modal(booking_modal(resource)),
        )
        .await?;
    Ok(())
}

async fn submit_booking(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
    resource: ResourceType,
) -> Result<(), Error> {
    let PanelInteraction::Modal(modal) = panel else {
        return panel.say(ctx, "❓ Unknown action.").await;
    };
    let mut values = modal_values(modal);
    let user = panel.user();

    let request = NewBooking {
        resource,
        user_id: user.id.get(),
        user_name: user.global_name.clone().unwrap_or_else(|| user.name.clone()),
        start: values.remove(START_FIELD).unwrap_or_default(),
        duration: values.remove(DURATION_FIELD).unwrap_or_default(),
        notes: values.remove(NOTES_FIELD).unwrap_or_default(),
    };

    match data.bookings.create(request, Utc::now()).await {
        Ok(booking) => {
            panel
                .reply(
                    ctx,
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(embeds::booking_created_embed(resource, &booking)),
                )
                .await?;
            // Arm reminders for bookings that start within the hour.
            ReminderDispatcher::from_data(ctx.http.clone(), data).sweep().await;
            Ok(())
        }
        Err(e) => panel.report(ctx, e).await,
    }
}

async fn my_bookings(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let bookings = data.bookings.list_for_user(panel.user().id.get()).await?;
    panel
        .reply(
            ctx,
            serenity::CreateInteractionResponseMessage::new()
                .embed(embeds::bookings_embed("📋 Your bookings", &bookings))
                .components(cancel_rows(&bookings)),
        )
        .await?;
    Ok(())
}

async fn cancel_booking(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
    booking_id: &str,
) -> Result<(), Error> {
    let user_id = panel.user().id.get();
    let privileged = authority_of(data, user_id).await? >= Authority::Admin;

    match data.bookings.cancel(booking_id, user_id, privileged).await {
        Ok((resource, booking)) => {
            tracing::info!(booking_id = %booking.id, user_id, "Booking cancelled");
            panel
                .say(
                    ctx,
                    format!(
                        "🗑️ Cancelled the {} booking starting {}.",
                        resource.as_str(),
                        embeds::discord_time(booking.start_date, 'F')
                    ),
                )
                .await
        }
        Err(e) => panel.report(ctx, e).await,
    }
}

async fn toggle_notifications(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let enabled = data
        .users
        .toggle_notifications(panel.user().id.get())
        .await?;
    let message = if enabled {
        "🔔 Booking reminders are now **on**."
    } else {
        "🔕 Booking reminders are now **off**."
    };
    panel.say(ctx, message).await
}

async fn open_language(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let user = data.users.ensure(panel.user().id.get()).await?;
    panel
        .respond(
            ctx,
            serenity::CreateInteractionResponse::Modal(language_modal(&user.language)),
        )
        .await?;
    Ok(())
}

async fn submit_language(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let PanelInteraction::Modal(modal) = panel else {
        return panel.say(ctx, "❓ Unknown action.").await;
    };
    let language = modal_values(modal)
        .remove(LANGUAGE_FIELD)
        .unwrap_or_default();

    match data.users.set_language(panel.user().id.get(), &language).await {
        Ok(code) => panel.say(ctx, format!("🌐 Language set to `{}`.", code)).await,
        Err(e) => panel.report(ctx, e).await,
    }
}

async fn view_schedule(
    ctx: &serenity::Context,
    panel: &PanelInteraction<'_>,
    data: &Data,
) -> Result<(), Error> {
    let now = Utc::now();
    let events = data.schedule.upcoming(now, SCHEDULE_LIMIT).await?;
    let bookings = data.bookings.upcoming(now, SCHEDULE_LIMIT).await?;

    panel
        .reply(
            ctx,
            serenity::CreateInteractionResponseMessage::new().embeds(vec![
                embeds::schedule_embed(&events),
                embeds::bookings_embed("📆 Upcoming bookings", &bookings),
            ]),
        )
        .await?;
    Ok(())
}
