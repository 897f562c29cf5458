// Blog moderation core
//
// Posts and comments are split into content blocks that an external service
// reviews one by one. A command/event bus drives the publication state
// machine, a cached control record aggregates the verdicts as they arrive,
// and every handler writes through a unit of work so state changes and the
// events they emit succeed or fail together.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod messages;

pub use config::*;
