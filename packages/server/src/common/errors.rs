//! Infrastructure-level error kinds shared by every domain.

use relay::{Categorizable, SafeErrorCategory};
use thiserror::Error;

/// Persistence failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("content {content_id} is locked while under moderation")]
    ContentLocked { content_id: String },

    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("storage backend failed: {0}")]
    Backend(#[source] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Categorizable for RepositoryError {
    fn category(&self) -> SafeErrorCategory {
        match self {
            RepositoryError::NotFound { .. } => SafeErrorCategory::NotFound,
            RepositoryError::ContentLocked { .. } | RepositoryError::AlreadyExists { .. } => {
                SafeErrorCategory::Conflict
            }
            RepositoryError::Backend(_) => SafeErrorCategory::Unavailable,
        }
    }
}

/// Cache failure. A *missing* key is not an error, it is `None`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

impl Categorizable for CacheError {
    fn category(&self) -> SafeErrorCategory {
        SafeErrorCategory::Unavailable
    }
}

/// A moderation record could not be written to or read from its cached form.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Categorizable for SerializationError {
    fn category(&self) -> SafeErrorCategory {
        SafeErrorCategory::InternalError
    }
}
