use thiserror::Error;

/// Failures at the datastore boundary. "Not found" is not an error here; lookups return
/// `Option` and the handler decides what a miss means.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),

    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}
