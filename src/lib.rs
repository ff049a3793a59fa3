//! chanlist - TV channel list acquisition
//!
//! Resolves a playable channel list from a fallback chain (cache, external
//! playlist file, built-in definitions) and keeps the result behind a
//! time-boxed file cache.
//!
//! # Modules
//!
//! - `models` - Channel record, cache metadata, external source info
//! - `playlist` - Extended playlist parsing, rendering and ordering
//! - `cache` - File-backed snapshot cache with a validity window
//! - `builtin` - Bundled default channels
//! - `loader` - The fallback chain
//! - `config` - TOML configuration
//! - `cli` / `commands` - Command line surface

pub mod builtin;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod loader;
pub mod models;
pub mod playlist;

// Re-export commonly used types
pub use builtin::{BuiltinError, BuiltinSource};
pub use cache::{CacheError, CacheStore};
pub use config::Config;
pub use loader::{ChannelLoader, LoadOutcome};
pub use models::{AuthFields, CacheMetadata, Channel, ExternalSourceInfo, SourceKind};
