use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::admission::AdmissionDefaults;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Límites globales
    pub max_queue_size: usize,
    pub max_song_duration: u64, // En segundos

    // Caché de resoluciones
    pub cache_size: usize,
    pub cache_ttl: u64, // En segundos

    // Logging
    pub log_filter: String,
}

impl Config {
    /// Loads configuration from the process environment, reading `.env` first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to the values of [`Config::default`]. The
    /// resulting configuration is validated before it is returned.
    pub fn from_source<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            max_queue_size: match get("MAX_QUEUE_SIZE") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.max_queue_size,
            },
            max_song_duration: match get("MAX_SONG_DURATION") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.max_song_duration,
            },
            cache_size: match get("CACHE_SIZE") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.cache_size,
            },
            cache_ttl: match get("CACHE_TTL") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.cache_ttl,
            },
            log_filter: get("LOG_FILTER")
                .filter(|val| !val.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Queue and duration limits must be greater than zero
    /// - Cache size and TTL must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.max_song_duration == 0 {
            anyhow::bail!("Max song duration must be greater than 0");
        }

        if self.cache_size == 0 {
            anyhow::bail!("Cache size must be greater than 0");
        }

        if self.cache_ttl == 0 {
            anyhow::bail!("Cache TTL must be greater than 0");
        }

        Ok(())
    }

    /// Global limits used by the admission policy when a guild has no
    /// usable override or quota.
    pub fn admission_defaults(&self) -> AdmissionDefaults {
        AdmissionDefaults {
            queue_limit: self.max_queue_size,
            duration_limit: Duration::from_secs(self.max_song_duration),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Limits: {} queue, {} max duration\n  \
            Cache: {} entries, {} TTL\n  \
            Logging: {}",
            self.max_queue_size,
            humantime::format_duration(Duration::from_secs(self.max_song_duration)),
            self.cache_size,
            humantime::format_duration(self.cache_ttl()),
            self.log_filter,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            max_song_duration: 7200, // 2 horas

            cache_size: 1000,
            cache_ttl: 3600, // 1 hora

            log_filter: "music_loader=debug".to_string(),
        }
    }
}
