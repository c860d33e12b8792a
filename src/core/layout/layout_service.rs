// Which buttons the `/panel` menu shows, and in which rows.
//
// The layout stores custom ids as plain strings; the Discord layer parses
// them when building the panel, so a bad entry is skipped rather than fatal.

use crate::core::storage::{Database, Document, DocumentKind, DocumentStore, DomainError, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Discord allows five action rows of five buttons each.
pub const MAX_ROWS: usize = 5;
pub const MAX_BUTTONS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyleKind {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelButton {
    pub action: String,
    pub label: String,
    #[serde(default)]
    pub style: ButtonStyleKind,
    #[serde(default)]
    pub row: u8,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PanelButton {
    fn new(action: &str, label: &str, style: ButtonStyleKind, row: u8) -> Self {
        Self {
            action: action.to_string(),
            label: label.to_string(),
            style,
            row,
            enabled: true,
        }
    }
}

/// `button_layout.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonLayout {
    #[serde(default)]
    pub buttons: Vec<PanelButton>,
}

impl Default for ButtonLayout {
    fn default() -> Self {
        use ButtonStyleKind::*;
        Self {
            buttons: vec![
                PanelButton::new("book:building", "🏗️ Book Building", Primary, 0),
                PanelButton::new("book:research", "🔬 Book Research", Primary, 0),
                PanelButton::new("book:training", "⚔️ Book Training", Primary, 0),
                PanelButton::new("bookings:mine", "📋 My Bookings", Secondary, 1),
                PanelButton::new("schedule:view", "📅 Schedule", Secondary, 1),
                PanelButton::new("settings:notifications", "🔔 Notifications", Success, 2),
                PanelButton::new("settings:language", "🌐 Language", Success, 2),
            ],
        }
    }
}

impl ButtonLayout {
    /// Enabled buttons grouped by row, in row order. Overflow is dropped.
    pub fn rows(&self) -> Vec<Vec<PanelButton>> {
        let mut rows: BTreeMap<u8, Vec<PanelButton>> = BTreeMap::new();
        for button in self.buttons.iter().filter(|b| b.enabled) {
            rows.entry(button.row).or_default().push(button.clone());
        }
        rows.into_values()
            .take(MAX_ROWS)
            .map(|mut row| {
                row.truncate(MAX_BUTTONS_PER_ROW);
                row
            })
            .collect()
    }
}

impl Document for ButtonLayout {
    const KIND: DocumentKind = DocumentKind::ButtonLayout;
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("No panel button with action `{0}`.")]
    UnknownAction(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for LayoutError {
    fn is_storage(&self) -> bool {
        matches!(self, LayoutError::Store(_))
    }
}

pub struct LayoutService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> LayoutService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    pub async fn layout(&self) -> Result<Vec<Vec<PanelButton>>, LayoutError> {
        let layout: ButtonLayout = self.db.read().await?;
        Ok(layout.rows())
    }

    pub async fn buttons(&self) -> Result<Vec<PanelButton>, LayoutError> {
        let layout: ButtonLayout = self.db.read().await?;
        Ok(layout.buttons)
    }

    pub async fn set_enabled(&self, action: &str, enabled: bool) -> Result<(), LayoutError> {
        let action = action.trim();
        self.db
            .try_update(|layout: &mut ButtonLayout| -> Result<_, LayoutError> {
                let button = layout
                    .buttons
                    .iter_mut()
                    .find(|b| b.action == action)
                    .ok_or_else(|| LayoutError::UnknownAction(action.to_string()))?;
                button.enabled = enabled;
                Ok(())
            })
            .await?;
        tracing::info!(action, enabled, "Panel button toggled");
        Ok(())
    }
}
