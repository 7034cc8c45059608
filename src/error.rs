use thiserror::Error;

/// Motivos por los que una solicitud de carga termina sin agregar nada.
///
/// Ninguno es fatal: todos quedan contenidos en la solicitud que los produjo
/// y se muestran al usuario a través de [`crate::notify::Notice::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("No se pudo cargar la pista:\n`{0}`")]
    ResolutionFailed(String),

    #[error("No se encontró nada para `{identifier}`")]
    NotFound { identifier: String },

    #[error("La cola no puede superar {limit} canciones.")]
    CapacityRejected { limit: String },

    #[error("La pista no puede superar {limit}.")]
    DurationRejected { limit: String },

    #[error("Saliste del canal de voz antes de que la pista terminara de cargar.")]
    RequesterLeft,

    #[error("No pude conectarme a tu canal de voz.")]
    VoiceConnectFailed,
}

/// Errores al entregar un identificador al resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no hay un runtime de tokio activo para resolver la pista")]
    NoRuntime,

    #[error("el resolver está cerrado")]
    Closed,
}
