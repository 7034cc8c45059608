use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global de `tracing`.
///
/// `RUST_LOG` tiene prioridad; `filter` (normalmente [`crate::config::Config::log_filter`])
/// se agrega encima junto con los niveles para serenity y songbird.
pub fn init(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(filter.parse()?)
        .add_directive("serenity=info".parse()?)
        .add_directive("songbird=info".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("No se pudo inicializar logging: {}", e))?;

    Ok(())
}
