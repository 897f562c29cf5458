use relay::{Categorizable, SafeErrorCategory};
use thiserror::Error;

use super::models::PublicationKind;

/// Illegal lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublicationError {
    #[error("cannot {attempted} {kind} {id}: current state is {from}")]
    InvalidTransition {
        kind: PublicationKind,
        id: String,
        from: &'static str,
        attempted: &'static str,
    },
}

impl Categorizable for PublicationError {
    fn category(&self) -> SafeErrorCategory {
        SafeErrorCategory::Conflict
    }
}
