pub mod comment;
pub mod content;
pub mod post;
pub mod publication;

pub use comment::{Comment, CommentState};
pub use content::{ContentRecord, ContentType};
pub use post::{Post, PostState};
pub use publication::{LifecycleState, Publication, PublicationKind, PublicationRecord};
