// Business domains
pub mod blog;
pub mod moderation;
pub mod notifications;

use relay::{Categorizable, HandlerError, SafeErrorCategory, UowError};

use crate::common::{CacheError, RepositoryError, SerializationError};
use blog::PublicationError;
use moderation::ModerationError;

/// Map a handler failure to the category an API layer may show to clients.
///
/// Unknown causes are internal errors.
pub fn categorize(err: &HandlerError) -> SafeErrorCategory {
    if let Some(e) = err.downcast_ref::<PublicationError>() {
        return e.category();
    }
    if let Some(e) = err.downcast_ref::<ModerationError>() {
        return e.category();
    }
    if let Some(e) = err.downcast_ref::<RepositoryError>() {
        return e.category();
    }
    if let Some(e) = err.downcast_ref::<CacheError>() {
        return e.category();
    }
    if let Some(e) = err.downcast_ref::<SerializationError>() {
        return e.category();
    }
    if let Some(UowError::Session(_)) = err.downcast_ref::<UowError>() {
        return SafeErrorCategory::Unavailable;
    }
    SafeErrorCategory::InternalError
}
