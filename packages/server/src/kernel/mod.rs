//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod memory_cache;
pub mod memory_storage;
pub mod server_kernel;
pub mod test_dependencies;
pub mod traits;
pub mod typed;

pub use deps::{settle, BlogUnitOfWork, ServerDeps};
pub use memory_cache::MemoryCache;
pub use memory_storage::{MemorySession, MemoryStorage};
pub use server_kernel::{build_bus, ServerKernel};
pub use test_dependencies::{RecordingModerationApi, RecordingNotifier, TestDependencies};
pub use traits::*;
pub use typed::{MessageHandler, TypedHandler};
