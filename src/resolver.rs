//! # Resolver
//!
//! Contract between load requests and whatever turns an identifier into
//! tracks. Every submission produces exactly one [`LoadOutcome`], delivered
//! to the handler on a worker task, never on the task that submitted it.

use async_trait::async_trait;
use serenity::model::id::GuildId;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::debug;

use crate::audio::track::{LoadedItem, ResolvedTrack, TrackCollection};
use crate::cache::ResolutionCache;
use crate::error::ResolveError;

/// Resultado de un intento de resolución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Track(ResolvedTrack),
    Collection(TrackCollection),
    /// Raw failure reason as reported by the resolver.
    Failed(String),
    NoMatches,
}

impl From<LoadedItem> for LoadOutcome {
    fn from(item: LoadedItem) -> Self {
        match item {
            LoadedItem::Track(track) => LoadOutcome::Track(track),
            LoadedItem::Collection(collection) => LoadOutcome::Collection(collection),
        }
    }
}

#[async_trait]
pub trait OutcomeHandler: Send + Sync {
    async fn handle(self: Arc<Self>, outcome: LoadOutcome);
}

pub trait Resolver: Send + Sync {
    /// Fire-and-forget: returns once the attempt is scheduled.
    fn submit(
        &self,
        guild_id: GuildId,
        identifier: &str,
        handler: Arc<dyn OutcomeHandler>,
    ) -> Result<(), ResolveError>;
}

/// Búsqueda concreta de una pista (yt-dlp, Lavalink, etc.).
#[async_trait]
pub trait TrackLookup: Send + Sync + 'static {
    async fn lookup(&self, identifier: &str) -> LoadOutcome;
}

/// Resolver que ejecuta cada intento en su propia tarea de tokio.
pub struct SpawningResolver<L> {
    lookup: Arc<L>,
    closed: AtomicBool,
}

impl<L: TrackLookup> SpawningResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup: Arc::new(lookup),
            closed: AtomicBool::new(false),
        }
    }

    /// Rechaza nuevos envíos; los intentos en curso terminan normalmente.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl<L: TrackLookup> Resolver for SpawningResolver<L> {
    fn submit(
        &self,
        guild_id: GuildId,
        identifier: &str,
        handler: Arc<dyn OutcomeHandler>,
    ) -> Result<(), ResolveError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ResolveError::Closed);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ResolveError::NoRuntime)?;
        let lookup = self.lookup.clone();
        let identifier = identifier.to_string();

        runtime.spawn(async move {
            let outcome = lookup.lookup(&identifier).await;
            debug!("🔎 [{}] `{}` resuelto", guild_id, identifier);
            handler.handle(outcome).await;
        });

        Ok(())
    }
}

/// Responde desde el caché antes de consultar la búsqueda real.
pub struct CachedLookup<L> {
    inner: L,
    cache: ResolutionCache,
}

impl<L: TrackLookup> CachedLookup<L> {
    pub fn new(inner: L, cache: ResolutionCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<L: TrackLookup> TrackLookup for CachedLookup<L> {
    async fn lookup(&self, identifier: &str) -> LoadOutcome {
        if let Some(item) = self.cache.get(identifier) {
            debug!("⚡ Cache hit para `{}`", identifier);
            return item.into();
        }

        self.inner.lookup(identifier).await
    }
}
