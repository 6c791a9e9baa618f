use std::time::Duration;

use anyhow::{Context, Result};
use platform_db::DatabaseSettings;
use products_hr::RosterSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub roster: RosterSettings,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut roster = RosterSettings::default();
        if let Some(key) = lookup("ROSTER_STORAGE_KEY").filter(|key| !key.trim().is_empty()) {
            roster.storage_key = key.trim().to_string();
        }
        if let Some(raw) = lookup("NOTIFICATION_DISMISS_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid NOTIFICATION_DISMISS_MS: {raw}"))?;
            roster.dismiss_after = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("NAME_MIN_LENGTH") {
            roster.name_min_len = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid NAME_MIN_LENGTH: {raw}"))?;
        }

        let database = match lookup("DATABASE_URL") {
            Some(url) => DatabaseSettings::with_url(url),
            None => DatabaseSettings::default(),
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            database,
            roster,
            cors_allowed_origins,
        })
    }
}
