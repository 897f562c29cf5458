//! Typed key definitions for all domain entities.
//!
//! # Example
//!
//! ```rust
//! use blog_core::common::{AuthorId, PublicationId};
//!
//! let pub_id = PublicationId::from("p1");
//! let author_id = AuthorId::from("a1");
//!
//! // This would be a compile error:
//! // let wrong: PublicationId = author_id;
//! ```

pub use super::id::Key;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for publications (posts and comments share one key space).
pub struct Publication;

/// Marker type for content blocks (header, body, ...).
pub struct Content;

/// Marker type for authors.
pub struct Author;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed key for posts and comments.
pub type PublicationId = Key<Publication>;

/// Typed key for content blocks.
pub type ContentId = Key<Content>;

/// Typed key for authors.
pub type AuthorId = Key<Author>;
