//! Core types for the Vista interface engine.
//!
//! This crate contains the data side of the engine, shared by every other crate:
//! - Configuration documents (list, detail and dashboard screens)
//! - The `Record` abstraction screens display
//! - Status tables and badge resolution
//! - Engine settings
//! - Error types

pub mod config;
mod error;
mod record;
mod settings;
mod status;

pub use error::{ActionError, ConfigError, QueryError};
pub use record::{display_value, has_field, BoardRecord, JsonRecord, Record, RecordId, EMPTY_DISPLAY};
pub use settings::{config_dir, settings_path, BoardSettings, EngineSettings, QuerySettings, SearchSettings};
pub use status::{ResolvedStatus, StatusConfig, StatusTable, NEUTRAL_COLOR};
