//! Moderation domain: moderation codes, control records, the moderator
//! service and the cache-backed record store.

pub mod commands;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod moderator;
pub mod record_store;

pub use errors::ModerationError;
pub use handlers::ModerationHandlers;
pub use moderator::ModeratorService;
pub use record_store::ModerationRecordStore;
