use async_trait::async_trait;
use std::fmt;

use crate::error::LoadError;

/// Mensaje final que recibe el usuario por cada solicitud de carga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Queued {
        title: String,
        uri: String,
        footnote: Option<String>,
    },
    CollectionQueued {
        name: String,
        added: usize,
        skipped: usize,
        footnote: Option<String>,
    },
    Rejected(LoadError),
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Queued { .. } | Notice::CollectionQueued { .. } => "🎶 Cola de música",
            Notice::Rejected(LoadError::ResolutionFailed(_))
            | Notice::Rejected(LoadError::NotFound { .. }) => "🔍 Resultados de carga",
            Notice::Rejected(_) => "🎶 Cola de música",
        }
    }

    pub fn footnote(&self) -> Option<&str> {
        match self {
            Notice::Queued { footnote, .. } | Notice::CollectionQueued { footnote, .. } => {
                footnote.as_deref()
            }
            Notice::Rejected(_) => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Queued { title, uri, .. } => {
                write!(f, "Agregado __**[{}]({})**__ a la cola.", title, uri)
            }
            Notice::CollectionQueued {
                name,
                added,
                skipped,
                ..
            } => {
                write!(f, "Agregadas `{}` canciones a la cola desde `{}`.", added, name)?;
                if *skipped > 0 {
                    write!(
                        f,
                        "\n`{}` canciones no se agregaron, porque la cola llegó a su límite o son demasiado largas.",
                        skipped
                    )?;
                }
                Ok(())
            }
            Notice::Rejected(error) => write!(f, "{}", error),
        }
    }
}

/// Destino de los avisos al usuario. Fire-and-forget: los errores de envío
/// se registran y no se propagan.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notice: Notice);
}
