//! # Audio Module
//!
//! Per-guild queue state for the loader.
//!
//! ### [`track`] - Track Model
//! - Resolved tracks, collections and the request context attached on admission
//!
//! ### [`queue`] - Playback Queue
//! - Ordered pending tracks plus the current one
//! - Idle detection and idempotent teardown
//!
//! ### [`manager`] - Queue Registry
//! - One queue per guild behind its own async mutex
//! - Teardown releases the voice connection as well
//!
//! Audio decoding and streaming live outside this crate; the external player
//! pulls tracks with [`queue::PlaybackQueue::next_track`].

pub mod manager;
pub mod queue;
pub mod track;
