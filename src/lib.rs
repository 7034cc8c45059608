//! # Music Loader
//!
//! Carga de pistas para bots de música en Discord: resuelve lo que pide el
//! usuario, valida los límites del servidor y lo agrega a la cola del guild.
//!
//! Punto de entrada: [`loader::Loader::load_item`]. Para armarlo con
//! Songbird y el caché de Serenity ver [`discord::discord_loader`].

pub mod admission;
pub mod audio;
pub mod cache;
pub mod config;
pub mod discord;
pub mod error;
pub mod loader;
pub mod logging;
pub mod notify;
pub mod resolver;
pub mod voice;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{LoadError, ResolveError};
pub use loader::{LoadRequest, Loader};
