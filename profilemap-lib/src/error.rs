use crate::storage::StorageError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Profile not found: {0}")]
    NotFound(String),
    /// The change was applied in memory but could not be written to storage.
    #[error("Profiles could not be saved")]
    Persistence {
        #[from]
        source: StorageError,
    },
}
