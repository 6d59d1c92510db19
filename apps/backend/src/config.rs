//! Environment-driven configuration

use std::str::FromStr;

use anyhow::Context;
use vocab_core::Sm2;

/// Longest interval the service stores. Keeps due dates inside the range
/// SQLite compares correctly as text.
pub const DEFAULT_MAX_INTERVAL_DAYS: u32 = 36_500;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cards_per_session: usize,
    pub scheduler: Sm2,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/vocab.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            cards_per_session: 10,
            scheduler: Sm2 {
                maximum_interval: Some(DEFAULT_MAX_INTERVAL_DAYS),
                ..Sm2::default()
            },
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base = &defaults.scheduler;

        let scheduler = Sm2 {
            initial_ease: parse_or(&lookup, "DEFAULT_EASINESS_FACTOR", base.initial_ease)?,
            minimum_ease: parse_or(&lookup, "MIN_EASINESS_FACTOR", base.minimum_ease)?,
            maximum_ease: parse_or(&lookup, "MAX_EASINESS_FACTOR", base.maximum_ease)?,
            maximum_interval: Some(parse_or(
                &lookup,
                "MAX_INTERVAL_DAYS",
                DEFAULT_MAX_INTERVAL_DAYS,
            )?),
            ..base.clone()
        };
        scheduler
            .validate()
            .context("invalid spaced repetition settings")?;

        let cards_per_session = parse_or(
            &lookup,
            "DEFAULT_CARDS_PER_SESSION",
            defaults.cards_per_session,
        )?;
        if cards_per_session == 0 {
            anyhow::bail!("DEFAULT_CARDS_PER_SESSION must be at least 1");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            cards_per_session,
            scheduler,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        _ => Ok(default),
    }
}
