use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::sanitize::friendlier_message;
use super::{LoadRequest, LoadServices};
use crate::admission::{self, AdmissionLimits};
use crate::audio::track::{InsertionMode, LoadedItem, ResolvedTrack, TrackCollection};
use crate::error::LoadError;
use crate::notify::{NotificationSink, Notice};
use crate::resolver::{LoadOutcome, OutcomeHandler};
use crate::voice::Reachability;

/// Reintentos silenciosos cuando el resolver no encuentra nada.
pub const MAX_LOAD_RETRIES: u8 = 2;

const MISSING_IDENTIFIER: &str = "(sin identificador)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Waiting for (or processing) the first outcome.
    Pending,
    /// A retry was submitted and its outcome has not arrived yet.
    Retrying,
    Admitted,
    Rejected,
    /// Every attempt came back empty.
    Exhausted,
}

impl LoadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Admitted | LoadPhase::Rejected | LoadPhase::Exhausted)
    }
}

#[derive(Debug)]
struct HandlerState {
    phase: LoadPhase,
    retry_count: u8,
}

/// Reacciona a los resultados del resolver para una única solicitud.
pub struct LoadResultHandler {
    request: LoadRequest,
    limits: AdmissionLimits,
    services: LoadServices,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<HandlerState>,
}

impl LoadResultHandler {
    pub(crate) fn new(
        request: LoadRequest,
        services: LoadServices,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let limits = admission::limits(
            &request.profile.settings,
            &request.profile.tier,
            &services.defaults,
        );

        Self {
            request,
            limits,
            services,
            sink,
            state: Mutex::new(HandlerState {
                phase: LoadPhase::Pending,
                retry_count: 0,
            }),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.lock().phase
    }

    pub fn retry_count(&self) -> u8 {
        self.state.lock().retry_count
    }

    pub fn identifier(&self) -> Option<&str> {
        self.request.identifier.as_deref()
    }

    pub fn limits(&self) -> AdmissionLimits {
        self.limits
    }

    fn cache(&self, item: LoadedItem) {
        if let Some(identifier) = self.identifier() {
            self.services.cache.put(identifier, item);
        }
    }

    async fn load_track(&self, track: ResolvedTrack) {
        if let Err(error) = self.check_voice().await {
            return self.reject(error).await;
        }

        let mut queue = self.services.managers.lock(self.request.guild_id).await;

        if !self.limits.has_room(queue.len()) {
            drop(queue);
            return self
                .reject(LoadError::CapacityRejected {
                    limit: self.limits.queue_limit_display(),
                })
                .await;
        }

        if self.limits.exceeds_duration(&track) {
            drop(queue);
            return self
                .reject(LoadError::DurationRejected {
                    limit: self.limits.duration_display(),
                })
                .await;
        }

        // Si no hay nada sonando la pista arranca sola; no hace falta avisar
        let immediate_play = queue.is_idle();
        let notice = Notice::Queued {
            title: track.title.clone(),
            uri: track.uri.clone(),
            footnote: self.request.footnote.clone(),
        };

        info!("➕ [{}] {}", self.request.guild_id, track.title);
        queue.enqueue(track.with_context(self.request.context.clone()), self.request.mode);
        drop(queue);

        self.finish(LoadPhase::Admitted, (!immediate_play).then_some(notice))
            .await;
    }

    async fn load_collection(&self, collection: TrackCollection) {
        if let Err(error) = self.check_voice().await {
            return self.reject(error).await;
        }

        let mut candidates: Vec<ResolvedTrack> = collection
            .tracks
            .into_iter()
            .filter(|track| !self.limits.exceeds_duration(track))
            .collect();

        if self.request.shuffle {
            candidates.shuffle(&mut rand::thread_rng());
        }

        let total = candidates.len();
        let mut added = 0;

        let mut queue = self.services.managers.lock(self.request.guild_id).await;

        for track in candidates {
            if !self.limits.has_room(queue.len()) {
                break;
            }

            let track = track.with_context(self.request.context.clone());
            match self.request.mode {
                InsertionMode::Append => queue.enqueue(track, InsertionMode::Append),
                // Al frente, pero respetando el orden de la playlist
                InsertionMode::Next => queue.enqueue_at(track, added),
            }
            added += 1;
        }
        drop(queue);

        let skipped = total - added;
        info!(
            "📋 [{}] `{}`: {} agregadas, {} omitidas",
            self.request.guild_id, collection.name, added, skipped
        );

        self.finish(
            LoadPhase::Admitted,
            Some(Notice::CollectionQueued {
                name: collection.name,
                added,
                skipped,
                footnote: self.request.footnote.clone(),
            }),
        )
        .await;
    }

    async fn load_failed(&self, reason: &str) {
        warn!("❌ [{}] Falló la carga: {}", self.request.guild_id, reason);
        self.cleanup_idle().await;
        self.reject(LoadError::ResolutionFailed(friendlier_message(reason)))
            .await;
    }

    async fn no_matches(self: &Arc<Self>) {
        let attempt = {
            let mut state = self.state.lock();
            if state.retry_count < MAX_LOAD_RETRIES && self.request.identifier.is_some() {
                state.retry_count += 1;
                state.phase = LoadPhase::Retrying;
                Some(state.retry_count)
            } else {
                None
            }
        };

        if let (Some(attempt), Some(identifier)) = (attempt, self.identifier()) {
            debug!(
                "🔁 [{}] Sin resultados para `{}`, reintento {}/{}",
                self.request.guild_id, identifier, attempt, MAX_LOAD_RETRIES
            );

            let handler: Arc<dyn OutcomeHandler> = self.clone();
            if let Err(e) = self
                .services
                .resolver
                .submit(self.request.guild_id, identifier, handler)
            {
                self.load_failed(&e.to_string()).await;
            }
            return;
        }

        self.cleanup_idle().await;
        let identifier = self
            .request
            .identifier
            .clone()
            .unwrap_or_else(|| MISSING_IDENTIFIER.to_string());
        self.finish(
            LoadPhase::Exhausted,
            Some(Notice::Rejected(LoadError::NotFound { identifier })),
        )
        .await;
    }

    /// Comprueba la conexión de voz; si el usuario ya no está, libera una cola inactiva.
    ///
    /// Corre sin el lock de la cola: un `join` lento no debe bloquear `stop`.
    async fn check_voice(&self) -> Result<(), LoadError> {
        let reachability = self
            .services
            .voice
            .ensure_reachable(self.request.guild_id, self.request.context.requested_by)
            .await;

        let error = match reachability {
            Reachability::AlreadyConnected(_) | Reachability::Joined(_) => return Ok(()),
            Reachability::RequesterLeft => LoadError::RequesterLeft,
            Reachability::ConnectFailed(_) => LoadError::VoiceConnectFailed,
        };

        self.cleanup_idle().await;
        Err(error)
    }

    /// La cola se vuelve a buscar: pudo destruirse mientras resolvíamos.
    async fn cleanup_idle(&self) {
        if let Some(mut queue) = self.services.managers.lock_existing(self.request.guild_id).await {
            self.services.managers.destroy_if_idle(&mut queue).await;
        }
    }

    async fn reject(&self, error: LoadError) {
        debug!("🚫 [{}] Rechazado: {:?}", self.request.guild_id, error);
        self.finish(LoadPhase::Rejected, Some(Notice::Rejected(error)))
            .await;
    }

    /// Marca el estado final; solo el primero cuenta y solo él avisa al usuario.
    async fn finish(&self, phase: LoadPhase, notice: Option<Notice>) {
        {
            let mut state = self.state.lock();
            if state.phase.is_terminal() {
                warn!(
                    "⚠️ [{}] Resultado tardío ignorado ({:?} ya era {:?})",
                    self.request.guild_id, phase, state.phase
                );
                return;
            }
            state.phase = phase;
        }

        if let Some(notice) = notice {
            self.sink.send(notice).await;
        }
    }
}

#[async_trait]
impl OutcomeHandler for LoadResultHandler {
    async fn handle(self: Arc<Self>, outcome: LoadOutcome) {
        {
            let mut state = self.state.lock();
            match state.phase {
                phase if phase.is_terminal() => {
                    warn!(
                        "⚠️ [{}] Resultado recibido tras finalizar ({:?}), ignorado",
                        self.request.guild_id, phase
                    );
                    return;
                }
                LoadPhase::Retrying => state.phase = LoadPhase::Pending,
                _ => {}
            }
        }

        match outcome {
            LoadOutcome::Track(track) => {
                self.cache(LoadedItem::Track(track.clone()));
                self.load_track(track).await;
            }
            LoadOutcome::Collection(collection) if collection.is_search_result => {
                match collection.tracks.into_iter().next() {
                    Some(first) => {
                        self.cache(LoadedItem::Track(first.clone()));
                        self.load_track(first).await;
                    }
                    None => self.no_matches().await,
                }
            }
            LoadOutcome::Collection(collection) => {
                self.cache(LoadedItem::Collection(collection.clone()));
                self.load_collection(collection).await;
            }
            LoadOutcome::Failed(reason) => self.load_failed(&reason).await,
            LoadOutcome::NoMatches => self.no_matches().await,
        }
    }
}
