pub mod commands;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;

pub use errors::PublicationError;
pub use handlers::BlogHandlers;
