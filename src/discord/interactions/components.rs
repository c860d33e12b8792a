// Builders for the panel buttons and the forms they open.

use super::panel_action::PanelAction;
use crate::core::bookings::{Booking, ResourceType};
use crate::core::layout::{ButtonStyleKind, PanelButton};
use crate::core::users::SUPPORTED_LANGUAGES;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;

pub const START_FIELD: &str = "start";
pub const DURATION_FIELD: &str = "duration";
pub const NOTES_FIELD: &str = "notes";
pub const LANGUAGE_FIELD: &str = "language";

/// Cancel buttons shown under "My bookings".
const MAX_CANCEL_BUTTONS: usize = 20;

fn button_style(style: ButtonStyleKind) -> serenity::ButtonStyle {
    match style {
        ButtonStyleKind::Primary => serenity::ButtonStyle::Primary,
        ButtonStyleKind::Secondary => serenity::ButtonStyle::Secondary,
        ButtonStyleKind::Success => serenity::ButtonStyle::Success,
        ButtonStyleKind::Danger => serenity::ButtonStyle::Danger,
    }
}

/// Action rows for the `/panel` message. Buttons whose action doesn't
/// parse are skipped.
pub fn panel_rows(rows: Vec<Vec<PanelButton>>) -> Vec<serenity::CreateActionRow> {
    rows.into_iter()
        .filter_map(|row| {
            let buttons: Vec<serenity::CreateButton> = row
                .into_iter()
                .filter(|b| {
                    let known = PanelAction::parse(&b.action).is_some();
                    if !known {
                        tracing::warn!(action = %b.action, "Skipping unknown panel button");
                    }
                    known
                })
                .map(|b| {
                    serenity::CreateButton::new(b.action)
                        .label(b.label)
                        .style(button_style(b.style))
                })
                .collect();
            (!buttons.is_empty()).then(|| serenity::CreateActionRow::Buttons(buttons))
        })
        .collect()
}

/// One cancel button per booking, five to a row.
pub fn cancel_rows(bookings: &[(ResourceType, Booking)]) -> Vec<serenity::CreateActionRow> {
    let buttons: Vec<serenity::CreateButton> = bookings
        .iter()
        .take(MAX_CANCEL_BUTTONS)
        .map(|(resource, booking)| {
            serenity::CreateButton::new(PanelAction::CancelBooking(booking.id.clone()).custom_id())
                .label(format!(
                    "Cancel {} {}",
                    resource.as_str(),
                    booking.start_date.format("%m-%d %H:%M")
                ))
                .style(serenity::ButtonStyle::Danger)
        })
        .collect();

    buttons
        .chunks(5)
        .map(|chunk| serenity::CreateActionRow::Buttons(chunk.to_vec()))
        .collect()
}

fn text_row(
    style: serenity::InputTextStyle,
    label: &str,
    custom_id: &str,
    placeholder: &str,
    required: bool,
) -> serenity::CreateActionRow {
    serenity::CreateActionRow::InputText(
        serenity::CreateInputText::new(style, label, custom_id)
            .placeholder(placeholder)
            .required(required),
    )
}

pub fn booking_modal(resource: ResourceType) -> serenity::CreateModal {
    serenity::CreateModal::new(
        PanelAction::SubmitBooking(resource).custom_id(),
        format!("Book {}", resource.as_str()),
    )
    .components(vec![
        text_row(
            serenity::InputTextStyle::Short,
            "Start (UTC)",
            START_FIELD,
            "2024-03-01 18:00",
            true,
        ),
        text_row(
            serenity::InputTextStyle::Short,
            "Duration",
            DURATION_FIELD,
            "3d, 12h or 90m",
            true,
        ),
        text_row(
            serenity::InputTextStyle::Paragraph,
            "Notes",
            NOTES_FIELD,
            "Optional",
            false,
        ),
    ])
}

pub fn language_modal(current: &str) -> serenity::CreateModal {
    let codes = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join(", ");
    serenity::CreateModal::new(PanelAction::SubmitLanguage.custom_id(), "Language").components(
        vec![serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "Language code",
                LANGUAGE_FIELD,
            )
            .placeholder(codes)
            .value(current)
            .required(true),
        )],
    )
}

/// Submitted text inputs by custom id. Empty inputs are left out.
pub fn modal_values(modal: &serenity::ModalInteraction) -> HashMap<String, String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) => input
                .value
                .as_ref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (input.custom_id.clone(), v.clone())),
            _ => None,
        })
        .collect()
}
