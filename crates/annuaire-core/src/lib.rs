//! Annuaire Core - Foundation crate for the annuaire directory harvester.
//!
//! This crate provides the shared record model, error handling and
//! configuration management that the browser, registry and harvest crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`RppsNumber`, `SearchScope`, `Timestamp`)
//! - [`record`] - Field descriptors and the flat/structured record shapes
//!
//! # Example
//!
//! ```rust
//! use annuaire_core::{Field, FieldValues, StructuredRecord};
//!
//! let mut values = FieldValues::new();
//! values.set(Field::Name, Some("Dr Jeanne Martin".to_string()));
//! values.set(Field::RppsNumber, Some("10101234567".to_string()));
//!
//! let structured = StructuredRecord::from_values(&values);
//! let flat = structured.to_flat();
//! assert_eq!(flat.get("rpps_number"), Some("10101234567"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, EnrichmentConfig, GeneralConfig, RetryConfig, SearchConfig,
    TierOrder,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use record::{Field, FieldOrigin, FieldValues, ProfileRecord, Section, StructuredRecord};
pub use types::{RppsNumber, SearchScope, Timestamp};
