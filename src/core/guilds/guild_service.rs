// Servers the bot has joined, and where each one's booking panel lives.

use crate::core::storage::{Database, Document, DocumentKind, DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildRegistration {
    pub id: u64,
    pub name: String,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub panel_channel_id: Option<u64>,
}

/// `guilds.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildsDocument {
    #[serde(default)]
    pub guilds: HashMap<u64, GuildRegistration>,
}

impl Document for GuildsDocument {
    const KIND: DocumentKind = DocumentKind::Guilds;
}

pub struct GuildService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> GuildService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    /// Record a guild. Re-registering only refreshes the name.
    /// Returns true when the guild is new.
    pub async fn register(
        &self,
        guild_id: u64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let document: GuildsDocument = self.db.read().await?;
        if document
            .guilds
            .get(&guild_id)
            .is_some_and(|g| g.name == name)
        {
            return Ok(false);
        }

        let is_new = self
            .db
            .update(|doc: &mut GuildsDocument| match doc.guilds.get_mut(&guild_id) {
                Some(existing) => {
                    existing.name = name.to_string();
                    false
                }
                None => {
                    doc.guilds.insert(
                        guild_id,
                        GuildRegistration {
                            id: guild_id,
                            name: name.to_string(),
                            registered_at: now,
                            panel_channel_id: None,
                        },
                    );
                    true
                }
            })
            .await?;

        if is_new {
            tracing::info!(guild_id, guild_name = %name, "Registered guild");
        }
        Ok(is_new)
    }

    pub async fn get(&self, guild_id: u64) -> Result<Option<GuildRegistration>, StoreError> {
        let document: GuildsDocument = self.db.read().await?;
        Ok(document.guilds.get(&guild_id).cloned())
    }

    /// Remember the channel the panel was last posted in.
    pub async fn set_panel_channel(
        &self,
        guild_id: u64,
        guild_name: &str,
        channel_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.db
            .update(|doc: &mut GuildsDocument| {
                doc.guilds
                    .entry(guild_id)
                    .or_insert_with(|| GuildRegistration {
                        id: guild_id,
                        name: guild_name.to_string(),
                        registered_at: now,
                        panel_channel_id: None,
                    })
                    .panel_channel_id = Some(channel_id);
            })
            .await
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        let document: GuildsDocument = self.db.read().await?;
        Ok(document.guilds.len())
    }
}
