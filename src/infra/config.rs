// Runtime configuration from the environment (after `.env` is loaded).

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Register commands in this guild only, for fast iteration.
    pub guild_id: Option<u64>,
    /// Owner used until one is stored with `/setowner`.
    pub owner_id: Option<u64>,
    pub data_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;

        let parse_id = |key: &str| -> Result<Option<u64>> {
            get(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a numeric Discord id, got `{}`", key, raw))
                })
                .transpose()
        };

        Ok(Self {
            token,
            guild_id: parse_id("GUILD_ID")?,
            owner_id: parse_id("OWNER_ID")?,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.guild_id, None);
        assert_eq!(config.owner_id, None);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_all_values() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("GUILD_ID", "123"),
            ("OWNER_ID", " 456 "),
            ("DATA_DIR", "/var/lib/bot"),
        ]))
        .unwrap();

        assert_eq!(config.guild_id, Some(123));
        assert_eq!(config.owner_id, Some(456));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/bot"));
    }

    #[test]
    fn test_missing_token_and_bad_ids() {
        assert!(BotConfig::from_lookup(lookup(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])).is_err());

        let err = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc"), ("GUILD_ID", "x")]))
            .unwrap_err();
        assert!(err.to_string().contains("GUILD_ID"));
    }
}
