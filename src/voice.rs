//! # Voice Reachability
//!
//! Decides whether a guild can play audio before anything is admitted into
//! its queue. A guild is reachable when a voice connection already exists, or
//! when the requester sits in a voice channel the bot manages to join.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transporte de voz (songbird en producción).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Canal al que está conectada la guild, si lo hay.
    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId>;

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> bool;

    async fn disconnect(&self, guild_id: GuildId) -> anyhow::Result<()>;
}

/// Dónde está el usuario ahora mismo.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceLookup: Send + Sync {
    fn voice_channel(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    AlreadyConnected(ChannelId),
    Joined(ChannelId),
    /// The requester is no longer in any voice channel of the guild.
    RequesterLeft,
    ConnectFailed(ChannelId),
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::AlreadyConnected(_) | Reachability::Joined(_))
    }
}

pub struct VoiceReachability {
    gateway: Arc<dyn VoiceGateway>,
    presence: Arc<dyn PresenceLookup>,
}

impl VoiceReachability {
    pub fn new(gateway: Arc<dyn VoiceGateway>, presence: Arc<dyn PresenceLookup>) -> Self {
        Self { gateway, presence }
    }

    /// Idempotent: an existing connection is reused without touching the gateway.
    pub async fn ensure_reachable(&self, guild_id: GuildId, requester: UserId) -> Reachability {
        if let Some(channel_id) = self.gateway.current_channel(guild_id).await {
            return Reachability::AlreadyConnected(channel_id);
        }

        let Some(channel_id) = self.presence.voice_channel(guild_id, requester) else {
            debug!("👤 {} ya no está en un canal de voz de {}", requester, guild_id);
            return Reachability::RequesterLeft;
        };

        if self.gateway.connect(guild_id, channel_id).await {
            info!("🔗 Conectado al canal {} en guild {}", channel_id, guild_id);
            Reachability::Joined(channel_id)
        } else {
            warn!("❌ No se pudo conectar al canal {} en guild {}", channel_id, guild_id);
            Reachability::ConnectFailed(channel_id)
        }
    }
}
