use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use std::time::Duration;

/// Datos de la solicitud que acompañan a cada pista agregada a la cola.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackContext {
    pub requested_by: UserId,
    pub text_channel: ChannelId,
    pub requested_at: DateTime<Utc>,
}

impl TrackContext {
    pub fn new(requested_by: UserId, text_channel: ChannelId) -> Self {
        Self {
            requested_by,
            text_channel,
            requested_at: Utc::now(),
        }
    }
}

/// A single playable track as returned by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub title: String,
    pub uri: String,
    pub author: Option<String>,
    /// Nominal length. Meaningless for streams.
    pub duration: Duration,
    pub is_stream: bool,
    /// Set once the track is admitted into a queue.
    pub context: Option<TrackContext>,
}

impl ResolvedTrack {
    pub fn new(title: impl Into<String>, uri: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            author: None,
            duration,
            is_stream: false,
            context: None,
        }
    }

    pub fn as_stream(mut self) -> Self {
        self.is_stream = true;
        self
    }

    pub fn with_context(mut self, context: TrackContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Playlist, album or search result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCollection {
    pub name: String,
    pub tracks: Vec<ResolvedTrack>,
    /// Search results only contribute their first track.
    pub is_search_result: bool,
}

/// Cualquier resultado exitoso del resolver; también es lo que guarda el caché.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedItem {
    Track(ResolvedTrack),
    Collection(TrackCollection),
}

/// Where admitted tracks land in the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertionMode {
    #[default]
    Append,
    /// Al frente de la cola, para que suene a continuación.
    Next,
}
