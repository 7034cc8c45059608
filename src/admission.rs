//! # Admission Policy
//!
//! Derives the per-guild admission limits (maximum queue size and maximum
//! track duration) from the guild's own settings, its quota tier and the
//! global defaults.
//!
//! Both limits are evaluated independently with the same precedence:
//!
//! 1. A non-zero guild override, unless it exceeds the global default and the
//!    guild has no premium quota.
//! 2. The premium guild quota.
//! 3. The paid-key ceiling ([`PAID_KEY_QUEUE_LIMIT`], [`PAID_KEY_DURATION_LIMIT`]).
//! 4. The global default.
//!
//! The evaluation is pure: no clock, no randomness, no shared state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::track::ResolvedTrack;

/// Queue ceiling for guilds holding a premium key. Kept above the global
/// default so the key keeps its perk.
pub const PAID_KEY_QUEUE_LIMIT: usize = 500;

/// Duration ceiling for guilds holding a premium key (6 hours).
pub const PAID_KEY_DURATION_LIMIT: Duration = Duration::from_secs(360 * 60);

/// Overrides configured by the guild itself. Zero means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    #[serde(default)]
    pub max_queue_size: usize,
    #[serde(default)]
    pub max_song_length: Duration,
}

/// Quota purchased for a specific guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumQuota {
    pub queue_size: usize,
    pub song_length: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuildTier {
    #[default]
    Default,
    PaidKey,
    PaidGuild(PremiumQuota),
}

impl GuildTier {
    /// Combina las dos fuentes de premium; la cuota de guild tiene prioridad.
    pub fn from_flags(key_premium: bool, quota: Option<PremiumQuota>) -> Self {
        match (quota, key_premium) {
            (Some(quota), _) => GuildTier::PaidGuild(quota),
            (None, true) => GuildTier::PaidKey,
            (None, false) => GuildTier::Default,
        }
    }

    fn quota(&self) -> Option<&PremiumQuota> {
        match self {
            GuildTier::PaidGuild(quota) => Some(quota),
            _ => None,
        }
    }
}

/// Global limits applied when nothing more specific is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDefaults {
    pub queue_limit: usize,
    pub duration_limit: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub max_queue_size: usize,
    pub max_item_duration: Duration,
}

impl AdmissionLimits {
    /// `true` while one more track fits. The queue counts as full once
    /// `size + 1` reaches the limit.
    pub fn has_room(&self, queue_size: usize) -> bool {
        queue_size.saturating_add(1) < self.max_queue_size
    }

    /// Streams never exceed the duration limit.
    pub fn exceeds_duration(&self, track: &ResolvedTrack) -> bool {
        !track.is_stream && track.duration > self.max_item_duration
    }

    pub fn queue_limit_display(&self) -> String {
        if self.max_queue_size == usize::MAX {
            "unlimited".to_string()
        } else {
            self.max_queue_size.to_string()
        }
    }

    pub fn duration_display(&self) -> String {
        humantime::format_duration(self.max_item_duration).to_string()
    }
}

/// Computes the admission limits for a guild.
pub fn limits(
    settings: &GuildSettings,
    tier: &GuildTier,
    defaults: &AdmissionDefaults,
) -> AdmissionLimits {
    let quota = tier.quota();

    let max_queue_size = resolve_limit(
        settings.max_queue_size,
        0,
        defaults.queue_limit,
        quota.map(|q| q.queue_size),
        *tier == GuildTier::PaidKey,
        PAID_KEY_QUEUE_LIMIT,
    );

    let max_item_duration = resolve_limit(
        settings.max_song_length,
        Duration::ZERO,
        defaults.duration_limit,
        quota.map(|q| q.song_length),
        *tier == GuildTier::PaidKey,
        PAID_KEY_DURATION_LIMIT,
    );

    AdmissionLimits {
        max_queue_size,
        max_item_duration,
    }
}

fn resolve_limit<T: PartialOrd + Copy>(
    configured: T,
    unset: T,
    default: T,
    quota: Option<T>,
    paid_key: bool,
    paid_key_ceiling: T,
) -> T {
    // Un override por encima del default solo vale con cuota de guild
    let invalid = quota.is_none() && configured > default;

    if configured != unset && !invalid {
        return configured;
    }

    match quota {
        Some(value) => value,
        None if paid_key => paid_key_ceiling,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE: Duration = Duration::from_secs(60);

    fn defaults() -> AdmissionDefaults {
        AdmissionDefaults {
            queue_limit: 350,
            duration_limit: 120 * MINUTE,
        }
    }

    fn quota() -> PremiumQuota {
        PremiumQuota {
            queue_size: 1000,
            song_length: 600 * MINUTE,
        }
    }

    #[test]
    fn test_default_tier_uses_global_defaults() {
        let limits = limits(&GuildSettings::default(), &GuildTier::Default, &defaults());

        assert_eq!(limits.max_queue_size, 350);
        assert_eq!(limits.max_item_duration, 120 * MINUTE);
    }

    #[test]
    fn test_override_within_default_is_honored() {
        let settings = GuildSettings {
            max_queue_size: 20,
            max_song_length: 10 * MINUTE,
        };

        let limits = limits(&settings, &GuildTier::Default, &defaults());

        assert_eq!(limits.max_queue_size, 20);
        assert_eq!(limits.max_item_duration, 10 * MINUTE);
    }

    #[test]
    fn test_override_above_default_is_ignored_without_quota() {
        let settings = GuildSettings {
            max_queue_size: 5000,
            max_song_length: 900 * MINUTE,
        };

        let default_limits = limits(&settings, &GuildTier::Default, &defaults());
        assert_eq!(default_limits.max_queue_size, 350);
        assert_eq!(default_limits.max_item_duration, 120 * MINUTE);

        // La llave premium no habilita overrides, pero sí su propio techo
        let key_limits = limits(&settings, &GuildTier::PaidKey, &defaults());
        assert_eq!(key_limits.max_queue_size, PAID_KEY_QUEUE_LIMIT);
        assert_eq!(key_limits.max_item_duration, PAID_KEY_DURATION_LIMIT);
    }

    #[test]
    fn test_paid_guild_allows_override_above_default() {
        let settings = GuildSettings {
            max_queue_size: 5000,
            max_song_length: Duration::ZERO,
        };

        let limits = limits(&settings, &GuildTier::PaidGuild(quota()), &defaults());

        assert_eq!(limits.max_queue_size, 5000);
        assert_eq!(limits.max_item_duration, 600 * MINUTE);
    }

    #[test]
    fn test_paid_guild_quota_replaces_default() {
        let limits = limits(
            &GuildSettings::default(),
            &GuildTier::PaidGuild(quota()),
            &defaults(),
        );

        assert_eq!(limits.max_queue_size, 1000);
        assert_eq!(limits.max_item_duration, 600 * MINUTE);
    }

    #[test]
    fn test_paid_key_applies_to_size_and_duration_independently() {
        let settings = GuildSettings {
            max_queue_size: 50,
            max_song_length: Duration::ZERO,
        };

        let limits = limits(&settings, &GuildTier::PaidKey, &defaults());

        assert_eq!(limits.max_queue_size, 50);
        assert_eq!(limits.max_item_duration, PAID_KEY_DURATION_LIMIT);
    }

    #[test]
    fn test_limits_are_deterministic() {
        let settings = GuildSettings {
            max_queue_size: 42,
            max_song_length: 7 * MINUTE,
        };
        let tier = GuildTier::PaidKey;

        assert_eq!(
            limits(&settings, &tier, &defaults()),
            limits(&settings, &tier, &defaults())
        );
    }

    #[test]
    fn test_tier_from_flags_prefers_guild_quota() {
        assert_eq!(GuildTier::from_flags(true, Some(quota())), GuildTier::PaidGuild(quota()));
        assert_eq!(GuildTier::from_flags(true, None), GuildTier::PaidKey);
        assert_eq!(GuildTier::from_flags(false, None), GuildTier::Default);
    }

    #[test]
    fn test_has_room_is_strict_at_capacity() {
        let limits = AdmissionLimits {
            max_queue_size: 5,
            max_item_duration: MINUTE,
        };

        assert!(limits.has_room(3));
        assert!(!limits.has_room(4));
        assert!(!limits.has_room(5));
    }

    #[test]
    fn test_limit_display() {
        let limits = AdmissionLimits {
            max_queue_size: usize::MAX,
            max_item_duration: 90 * MINUTE,
        };

        assert_eq!(limits.queue_limit_display(), "unlimited");
        assert_eq!(limits.duration_display(), "1h 30m");
        assert!(limits.has_room(usize::MAX - 2));
    }
}
