//! Fakes compartidos por los tests de la crate.

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Notify;

use crate::audio::track::{ResolvedTrack, TrackCollection};
use crate::error::ResolveError;
use crate::notify::{NotificationSink, Notice};
use crate::resolver::{LoadOutcome, OutcomeHandler, Resolver};
use crate::voice::{PresenceLookup, VoiceGateway};

pub fn track(title: &str, secs: u64) -> ResolvedTrack {
    ResolvedTrack::new(title, format!("https://example.com/{title}"), Duration::from_secs(secs))
}

pub fn playlist(name: &str, count: usize, secs: u64) -> TrackCollection {
    TrackCollection {
        name: name.to_string(),
        tracks: (0..count).map(|i| track(&format!("{name}-{i}"), secs)).collect(),
        is_search_result: false,
    }
}

/// Guarda cada aviso enviado.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Gateway en memoria: `connect` tiene éxito salvo que se indique lo contrario.
pub struct FakeGateway {
    connected: Mutex<HashMap<GuildId, ChannelId>>,
    connect_succeeds: AtomicBool,
    connect_gate: Mutex<Option<Arc<Notify>>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            connected: Mutex::new(HashMap::new()),
            connect_succeeds: AtomicBool::new(true),
            connect_gate: Mutex::new(None),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }
}

impl FakeGateway {
    pub fn connect_now(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.connected.lock().insert(guild_id, channel_id);
    }

    pub fn fail_connects(&self) {
        self.connect_succeeds.store(false, Ordering::SeqCst);
    }

    /// Los `connect` siguientes esperan hasta que se notifique el `Notify` devuelto.
    pub fn hold_connects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.connect_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn is_connected(&self, guild_id: GuildId) -> bool {
        self.connected.lock().contains_key(&guild_id)
    }
}

#[async_trait]
impl VoiceGateway for FakeGateway {
    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.connected.lock().get(&guild_id).copied()
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let gate = self.connect_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let ok = self.connect_succeeds.load(Ordering::SeqCst);
        if ok {
            self.connected.lock().insert(guild_id, channel_id);
        }
        ok
    }

    async fn disconnect(&self, guild_id: GuildId) -> anyhow::Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.lock().remove(&guild_id);
        Ok(())
    }
}

/// El usuario está (o no) en un canal de voz.
#[derive(Default)]
pub struct FakePresence {
    channel: Mutex<Option<ChannelId>>,
}

impl FakePresence {
    pub fn join(&self, channel_id: ChannelId) {
        *self.channel.lock() = Some(channel_id);
    }

    pub fn leave(&self) {
        *self.channel.lock() = None;
    }
}

impl PresenceLookup for FakePresence {
    fn voice_channel(&self, _guild_id: GuildId, _user_id: UserId) -> Option<ChannelId> {
        *self.channel.lock()
    }
}

/// Resolver manual: guarda los envíos y el test decide cuándo y cómo responder.
#[derive(Default)]
pub struct ManualResolver {
    submitted: Mutex<Vec<(GuildId, String)>>,
    pending: Mutex<VecDeque<Arc<dyn OutcomeHandler>>>,
    failing: AtomicBool,
}

impl ManualResolver {
    pub fn submissions(&self) -> Vec<(GuildId, String)> {
        self.submitted.lock().clone()
    }

    pub fn fail_submits(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn take_pending(&self) -> Option<Arc<dyn OutcomeHandler>> {
        self.pending.lock().pop_front()
    }

    /// Responde a todos los intentos pendientes (incluidos los reintentos
    /// que se generen mientras tanto) con el resultado de `reply`.
    pub async fn drain_with<F>(&self, mut reply: F)
    where
        F: FnMut(usize) -> LoadOutcome,
    {
        let mut attempt = 0;
        while let Some(handler) = self.take_pending() {
            handler.handle(reply(attempt)).await;
            attempt += 1;
        }
    }
}

impl Resolver for ManualResolver {
    fn submit(
        &self,
        guild_id: GuildId,
        identifier: &str,
        handler: Arc<dyn OutcomeHandler>,
    ) -> Result<(), ResolveError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ResolveError::Closed);
        }

        self.submitted.lock().push((guild_id, identifier.to_string()));
        self.pending.lock().push_back(handler);
        Ok(())
    }
}
