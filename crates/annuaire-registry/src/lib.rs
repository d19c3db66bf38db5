//! Annuaire Registry - company enrichment from French business registries.
//!
//! Directory profiles sometimes carry a SIREN or SIRET. This crate
//! normalizes that identifier and asks two registries for the company's
//! NAF/APE code, creation date and head-office SIRET:
//!
//! - **INSEE Sirene 3.11** (`X-INSEE-Api-Key-Integration` header)
//! - **Pappers v2** (`api_token` query parameter)
//!
//! The [`EnrichmentResolver`] tries them in the configured order, each under
//! a time bound. Enrichment never fails a profile: when neither tier answers
//! the result is tagged [`EnrichmentSource::None`] and every field stays null.
//!
//! # Example
//!
//! ```rust,no_run
//! use annuaire_core::EnrichmentConfig;
//! use annuaire_registry::{Enricher, EnrichmentResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = EnrichmentResolver::from_config(&EnrichmentConfig::default())?;
//! let result = resolver.resolve(Some("123 456 789 00012")).await;
//! println!("{:?}: {:?}", result.source, result.fragment);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod common;
pub mod error;
pub mod normalize;
pub mod pappers;
pub mod provider;
pub mod resolver;
pub mod sirene;

pub use error::{RegistryError, Result};
pub use normalize::{normalize, normalize_siret, CompanyId};
pub use pappers::PappersProvider;
pub use provider::{CompanyFragment, RegistryProvider};
pub use resolver::{Enricher, EnrichmentResolver, EnrichmentResult, EnrichmentSource};
pub use sirene::SireneProvider;
