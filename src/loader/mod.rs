//! # Loader Module
//!
//! Turns a user request into queued tracks.
//!
//! A [`LoadRequest`] is handed to [`Loader::load_item`], which builds a
//! [`LoadResultHandler`] and submits the identifier to the resolver. From
//! then on the handler reacts to whatever the resolver reports:
//!
//! - **Track**: voice check, capacity and duration checks, then enqueue
//! - **Collection**: voice check, duration filter, enqueue until the queue
//!   limit is hit, one summary notice
//! - **Failed**: sanitized error notice
//! - **NoMatches**: silent retries (up to [`MAX_LOAD_RETRIES`]), then a
//!   "nothing found" notice
//!
//! Every request ends with at most one notice to the user. All queue reads
//! and writes happen while holding the guild's queue lock, so concurrent
//! requests for the same guild cannot jointly overshoot the queue limit.

mod handler;
pub mod sanitize;

pub use handler::{LoadPhase, LoadResultHandler, MAX_LOAD_RETRIES};

use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{info, warn};

use crate::admission::{AdmissionDefaults, GuildSettings, GuildTier};
use crate::audio::manager::MusicManagers;
use crate::audio::track::{InsertionMode, TrackContext};
use crate::cache::ResolutionCache;
use crate::notify::NotificationSink;
use crate::resolver::{LoadOutcome, OutcomeHandler, Resolver};
use crate::voice::VoiceReachability;

/// Settings and quota tier of the guild a request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildProfile {
    pub settings: GuildSettings,
    pub tier: GuildTier,
}

/// Una solicitud de carga: vive hasta que se reporta su resultado final.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub identifier: Option<String>,
    pub guild_id: GuildId,
    pub mode: InsertionMode,
    /// Mezclar las pistas de una playlist antes de encolarlas
    pub shuffle: bool,
    pub footnote: Option<String>,
    pub context: TrackContext,
    pub profile: GuildProfile,
}

impl LoadRequest {
    pub fn new(guild_id: GuildId, identifier: impl Into<String>, context: TrackContext) -> Self {
        Self {
            identifier: Some(identifier.into()),
            guild_id,
            mode: InsertionMode::Append,
            shuffle: false,
            footnote: None,
            context,
            profile: GuildProfile::default(),
        }
    }

    pub fn play_next(mut self) -> Self {
        self.mode = InsertionMode::Next;
        self
    }

    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn with_footnote(mut self, footnote: impl Into<String>) -> Self {
        self.footnote = Some(footnote.into());
        self
    }

    pub fn with_profile(mut self, profile: GuildProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// Servicios compartidos por todos los handlers; se inyectan, no hay globales.
#[derive(Clone)]
pub(crate) struct LoadServices {
    pub resolver: Arc<dyn Resolver>,
    pub cache: ResolutionCache,
    pub managers: Arc<MusicManagers>,
    pub voice: Arc<VoiceReachability>,
    pub defaults: AdmissionDefaults,
}

pub struct Loader {
    services: LoadServices,
}

impl Loader {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        cache: ResolutionCache,
        managers: Arc<MusicManagers>,
        voice: Arc<VoiceReachability>,
        defaults: AdmissionDefaults,
    ) -> Self {
        Self {
            services: LoadServices {
                resolver,
                cache,
                managers,
                voice,
                defaults,
            },
        }
    }

    pub fn managers(&self) -> &Arc<MusicManagers> {
        &self.services.managers
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.services.cache
    }

    /// Envía la solicitud al resolver y devuelve su handler.
    ///
    /// Returns as soon as the first attempt is scheduled; the outcome and the
    /// user notice arrive later on a resolver worker.
    pub async fn load_item(
        &self,
        request: LoadRequest,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<LoadResultHandler> {
        let guild_id = request.guild_id;
        let handler = Arc::new(LoadResultHandler::new(request, self.services.clone(), sink));

        let Some(identifier) = handler.identifier().map(str::to_string) else {
            handler.clone().handle(LoadOutcome::NoMatches).await;
            return handler;
        };

        info!("🎵 Cargando `{}` en guild {}", identifier, guild_id);

        let dyn_handler: Arc<dyn OutcomeHandler> = handler.clone();
        if let Err(e) = self.services.resolver.submit(guild_id, &identifier, dyn_handler) {
            warn!("❌ No se pudo enviar `{}` al resolver: {}", identifier, e);
            handler.clone().handle(LoadOutcome::Failed(e.to_string())).await;
        }

        handler
    }
}
