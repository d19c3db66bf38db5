use annuaire_browser::{BrowserError, InteractionFailure};
use annuaire_core::CoreError;
use annuaire_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("interaction failed: {0}")]
    Interaction(#[from] InteractionFailure),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("search could not be submitted: {0}")]
    SearchFailed(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HarvestError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
