use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::queue::PlaybackQueue;
use crate::voice::VoiceGateway;

/// Acceso exclusivo a la cola de una guild.
///
/// Mientras exista el guard ninguna otra carga de la misma guild puede leer
/// ni modificar la cola; las demás guilds no se ven afectadas.
pub struct QueueGuard {
    queue: Arc<Mutex<PlaybackQueue>>,
    guard: OwnedMutexGuard<PlaybackQueue>,
}

impl Deref for QueueGuard {
    type Target = PlaybackQueue;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for QueueGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

/// Registro de colas por guild.
///
/// Nadie debe guardar una cola entre dos callbacks: después de un `stop` o
/// `leave` la cola vieja queda destruida y fuera del registro, y la siguiente
/// llamada a [`MusicManagers::lock`] crea una nueva.
pub struct MusicManagers {
    queues: DashMap<GuildId, Arc<Mutex<PlaybackQueue>>>,
    gateway: Arc<dyn VoiceGateway>,
}

impl MusicManagers {
    pub fn new(gateway: Arc<dyn VoiceGateway>) -> Self {
        Self {
            queues: DashMap::new(),
            gateway,
        }
    }

    /// Bloquea la cola de la guild, creándola si no existe.
    pub async fn lock(&self, guild_id: GuildId) -> QueueGuard {
        loop {
            let queue = self
                .queues
                .entry(guild_id)
                .or_insert_with(|| Arc::new(Mutex::new(PlaybackQueue::new(guild_id))))
                .value()
                .clone();

            let guard = queue.clone().lock_owned().await;
            if !guard.is_destroyed() {
                return QueueGuard { queue, guard };
            }

            // Destruida mientras esperábamos el lock
            debug!("🔁 Cola de {} destruida durante la espera, reintentando", guild_id);
            self.queues.remove_if(&guild_id, |_, q| Arc::ptr_eq(q, &queue));
        }
    }

    /// Bloquea la cola solo si existe y sigue viva.
    pub async fn lock_existing(&self, guild_id: GuildId) -> Option<QueueGuard> {
        let queue = self.queues.get(&guild_id)?.value().clone();
        let guard = queue.clone().lock_owned().await;

        if guard.is_destroyed() {
            None
        } else {
            Some(QueueGuard { queue, guard })
        }
    }

    /// Destruye la cola y libera la conexión de voz. Sin efecto si ya estaba destruida.
    pub async fn destroy(&self, guard: &mut QueueGuard) {
        if !guard.destroy() {
            return;
        }

        let guild_id = guard.guild_id();
        let queue = guard.queue.clone();
        self.queues.remove_if(&guild_id, |_, q| Arc::ptr_eq(q, &queue));

        if let Err(e) = self.gateway.disconnect(guild_id).await {
            warn!("⚠️ Error al desconectar voz de {}: {:?}", guild_id, e);
        }
    }

    /// Limpieza tras un fallo: solo se destruye una cola inactiva.
    pub async fn destroy_if_idle(&self, guard: &mut QueueGuard) -> bool {
        if guard.is_idle() {
            self.destroy(guard).await;
            true
        } else {
            false
        }
    }

    /// `stop`/`leave`: destruye la cola aunque esté reproduciendo.
    pub async fn shutdown(&self, guild_id: GuildId) -> bool {
        match self.lock_existing(guild_id).await {
            Some(mut guard) => {
                self.destroy(&mut guard).await;
                info!("⏹️ Sesión cerrada para guild {}", guild_id);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.queues.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::{InsertionMode, ResolvedTrack};
    use crate::voice::MockVoiceGateway;
    use std::time::Duration;

    fn managers(expected_disconnects: usize) -> MusicManagers {
        let mut gateway = MockVoiceGateway::new();
        gateway
            .expect_disconnect()
            .times(expected_disconnects)
            .returning(|_| Ok(()));
        MusicManagers::new(Arc::new(gateway))
    }

    fn track() -> ResolvedTrack {
        ResolvedTrack::new("song", "https://example.com/song", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_lock_creates_and_reuses_queue() {
        let managers = managers(0);
        let guild = GuildId::new(1);

        {
            let mut queue = managers.lock(guild).await;
            queue.enqueue(track(), InsertionMode::Append);
        }

        assert_eq!(managers.lock(guild).await.len(), 1);
        assert_eq!(managers.len(), 1);
    }

    #[tokio::test]
    async fn test_destroy_removes_queue_once() {
        let managers = managers(1);
        let guild = GuildId::new(1);

        let mut queue = managers.lock(guild).await;
        managers.destroy(&mut queue).await;
        managers.destroy(&mut queue).await;
        drop(queue);

        assert!(!managers.contains(guild));
        assert!(managers.lock_existing(guild).await.is_none());
    }

    #[tokio::test]
    async fn test_destroy_if_idle_keeps_active_queue() {
        let managers = managers(0);
        let guild = GuildId::new(1);

        let mut queue = managers.lock(guild).await;
        queue.enqueue(track(), InsertionMode::Append);

        assert!(!managers.destroy_if_idle(&mut queue).await);
        assert!(managers.contains(guild));
    }

    #[tokio::test]
    async fn test_lock_after_shutdown_gets_fresh_queue() {
        let managers = managers(1);
        let guild = GuildId::new(1);

        managers.lock(guild).await.enqueue(track(), InsertionMode::Append);
        assert!(managers.shutdown(guild).await);
        assert!(!managers.shutdown(guild).await);

        let queue = managers.lock(guild).await;
        assert!(queue.is_idle());
        assert!(!queue.is_destroyed());
    }
}
