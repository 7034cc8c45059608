use serenity::model::id::GuildId;
use std::{collections::VecDeque, time::Duration};
use tracing::{debug, info};

use super::track::{InsertionMode, ResolvedTrack};

/// Cola de reproducción de una guild.
///
/// Solo se modifica dentro de la sección exclusiva de su guild
/// (ver [`super::manager::MusicManagers`]).
#[derive(Debug)]
pub struct PlaybackQueue {
    guild_id: GuildId,
    items: VecDeque<ResolvedTrack>,
    current: Option<ResolvedTrack>,
    destroyed: bool,
}

impl PlaybackQueue {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            items: VecDeque::new(),
            current: None,
            destroyed: false,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Cantidad de pistas en espera (sin contar la actual)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Nada sonando y nada en espera
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.items.is_empty()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Agrega una pista según el modo de inserción
    pub fn enqueue(&mut self, track: ResolvedTrack, mode: InsertionMode) {
        match mode {
            InsertionMode::Append => self.enqueue_at(track, self.items.len()),
            InsertionMode::Next => self.enqueue_at(track, 0),
        }
    }

    /// Inserta en una posición concreta; fuera de rango agrega al final
    pub fn enqueue_at(&mut self, track: ResolvedTrack, position: usize) {
        let position = position.min(self.items.len());
        debug!("➕ [{}] {} en posición {}", self.guild_id, track.title, position);
        self.items.insert(position, track);
    }

    /// Avanza a la siguiente pista (FIFO) y la marca como actual
    pub fn next_track(&mut self) -> Option<&ResolvedTrack> {
        self.current = self.items.pop_front();
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&ResolvedTrack> {
        self.current.as_ref()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &ResolvedTrack> {
        self.items.iter()
    }

    pub fn total_duration(&self) -> Duration {
        self.items
            .iter()
            .chain(self.current.iter())
            .filter(|track| !track.is_stream)
            .map(|track| track.duration)
            .sum()
    }

    /// Libera la cola. Devuelve `false` si ya estaba destruida.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }

        self.destroyed = true;
        self.items.clear();
        self.current = None;
        info!("🗑️ Cola destruida para guild {}", self.guild_id);
        true
    }
}
