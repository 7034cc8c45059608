//! # Discord Adapters
//!
//! Production implementations of the loader's collaborators:
//!
//! - [`SongbirdGateway`]: voice connections through Songbird
//! - [`CachePresence`]: requester voice state from Serenity's cache
//! - [`ChannelNotifier`]: notices posted as embeds to a text channel
//!
//! [`discord_loader`] wires them into a ready-to-use [`Loader`].

use async_trait::async_trait;
use serenity::{
    all::Colour,
    builder::{CreateEmbed, CreateEmbedFooter, CreateMessage},
    cache::Cache,
    http::Http,
    model::id::{ChannelId, GuildId, UserId},
};
use songbird::{error::JoinError, Songbird};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audio::manager::MusicManagers;
use crate::cache::{ResolutionCache, CLEANUP_INTERVAL};
use crate::config::Config;
use crate::loader::Loader;
use crate::notify::{NotificationSink, Notice};
use crate::resolver::Resolver;
use crate::voice::{PresenceLookup, VoiceGateway, VoiceReachability};

const NOTICE_COLOUR: u32 = 0x9570D3;

pub struct SongbirdGateway {
    songbird: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        Self { songbird }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let call = self.songbird.get(guild_id)?;
        let channel = call.lock().await.current_channel();
        channel.map(|channel| ChannelId::new(channel.0.get()))
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        match self.songbird.join(guild_id, channel_id).await {
            Ok(_) => true,
            Err(e) => {
                warn!("❌ Error al unirse al canal {} en {}: {:?}", channel_id, guild_id, e);
                false
            }
        }
    }

    async fn disconnect(&self, guild_id: GuildId) -> anyhow::Result<()> {
        match self.songbird.remove(guild_id).await {
            Ok(()) | Err(JoinError::NoCall) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("Error al salir del canal de voz: {:?}", e)),
        }
    }
}

pub struct CachePresence {
    cache: Arc<Cache>,
}

impl CachePresence {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

impl PresenceLookup for CachePresence {
    fn voice_channel(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        let guild = self.cache.guild(guild_id)?;
        let channel = guild.voice_states.get(&user_id).and_then(|state| state.channel_id);
        channel
    }
}

/// Publica los avisos en el canal de texto donde se pidió la canción.
pub struct ChannelNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn send(&self, notice: Notice) {
        let message = CreateMessage::new().embed(notice_embed(&notice));

        match self.channel_id.send_message(&*self.http, message).await {
            Ok(_) => debug!("📨 Aviso enviado a {}", self.channel_id),
            Err(e) => warn!("⚠️ No se pudo enviar aviso a {}: {:?}", self.channel_id, e),
        }
    }
}

fn notice_embed(notice: &Notice) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title(notice.title())
        .description(notice.to_string())
        .colour(Colour::new(NOTICE_COLOUR));

    match notice.footnote() {
        Some(footnote) => embed.footer(CreateEmbedFooter::new(footnote)),
        None => embed,
    }
}

/// Arma un [`Loader`] con los adaptadores de Discord.
///
/// El canal de avisos se elige por solicitud con [`ChannelNotifier`].
pub fn discord_loader(
    config: &Config,
    songbird: Arc<Songbird>,
    cache: Arc<Cache>,
    resolver: Arc<dyn Resolver>,
) -> Loader {
    let gateway: Arc<dyn VoiceGateway> = Arc::new(SongbirdGateway::new(songbird));
    let presence = Arc::new(CachePresence::new(cache));

    let cache = ResolutionCache::from_config(config);
    cache.start_cleanup_task(CLEANUP_INTERVAL);

    info!("🎵 Loader listo\n{}", config.summary());

    Loader::new(
        resolver,
        cache,
        Arc::new(MusicManagers::new(gateway.clone())),
        Arc::new(VoiceReachability::new(gateway, presence)),
        config.admission_defaults(),
    )
}
