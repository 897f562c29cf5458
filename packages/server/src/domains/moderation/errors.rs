use relay::{Categorizable, SafeErrorCategory};
use thiserror::Error;

use crate::common::SerializationError;

/// Aggregation or block-building failure.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("publication {pub_id} has no reviewable content blocks")]
    NoReviewableBlocks { pub_id: String },

    #[error("content {content_id} does not belong to publication {pub_id}")]
    ForeignContent { content_id: String, pub_id: String },

    #[error("content {content_id} of publication {pub_id} not found")]
    MissingContent { content_id: String, pub_id: String },

    #[error("moderation code {code} is not registered for publication {pub_id}")]
    UnknownBlock { pub_id: String, code: String },

    #[error("block {code} of publication {pub_id} already has a verdict")]
    VerdictAlreadySet { pub_id: String, code: String },

    #[error("{verdict} is not a valid verdict for block {code}")]
    InvalidVerdict { code: String, verdict: String },

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl Categorizable for ModerationError {
    fn category(&self) -> SafeErrorCategory {
        match self {
            ModerationError::NoReviewableBlocks { .. }
            | ModerationError::ForeignContent { .. }
            | ModerationError::UnknownBlock { .. }
            | ModerationError::InvalidVerdict { .. } => SafeErrorCategory::Validation,
            ModerationError::MissingContent { .. } => SafeErrorCategory::NotFound,
            ModerationError::VerdictAlreadySet { .. } => SafeErrorCategory::Conflict,
            ModerationError::Serialization(_) => SafeErrorCategory::InternalError,
        }
    }
}
