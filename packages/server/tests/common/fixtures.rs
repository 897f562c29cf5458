//! Test fixtures for creating test data.
//!
//! These fixtures go through the bus, so every record they create was
//! produced by the real handlers.

use anyhow::Result;
use blog_core::domains::blog::commands::{AddContentBlock, CreateComment, CreatePost, SaveDraft};
use blog_core::domains::blog::models::{ContentType, PublicationKind};
use blog_core::domains::moderation::commands::StartModeration;
use blog_core::kernel::ServerKernel;
use indexmap::IndexMap;

/// Create a post with one text block per `(content_id, text)` and save it
/// as a draft.
pub async fn create_draft_post(
    kernel: &ServerKernel,
    pub_id: &str,
    blocks: &[(&str, &str)],
) -> Result<()> {
    kernel
        .handle(CreatePost {
            pub_id: pub_id.into(),
            author_id: "a1".into(),
            title: format!("Post {}", pub_id),
        })
        .await?;
    for (content_id, text) in blocks {
        kernel
            .handle(AddContentBlock {
                pub_id: pub_id.into(),
                content_id: (*content_id).into(),
                kind: ContentType::Text,
                body: text.to_string(),
            })
            .await?;
    }
    kernel.handle(SaveDraft { pub_id: pub_id.into() }).await?;
    Ok(())
}

/// Submit the given text blocks of a post for moderation.
pub fn start_moderation(pub_id: &str, content_ids: &[&str]) -> StartModeration {
    StartModeration::builder()
        .pub_id(pub_id)
        .author_id("a1")
        .blocks(
            content_ids
                .iter()
                .map(|id| ((*id).into(), ContentType::Text))
                .collect::<IndexMap<_, _>>(),
        )
        .build()
}

/// A draft post `p1` with header `h1` and body `b1`, already in moderation.
pub async fn post_in_moderation(kernel: &ServerKernel, body: &str) -> Result<()> {
    create_draft_post(kernel, "p1", &[("h1", "Hello"), ("b1", body)]).await?;
    kernel.handle(start_moderation("p1", &["h1", "b1"])).await?;
    Ok(())
}

/// Create comment `pub_id` with a single text block on `post_id`.
pub async fn create_comment(
    kernel: &ServerKernel,
    pub_id: &str,
    post_id: &str,
    content_id: &str,
    text: &str,
) -> Result<()> {
    kernel
        .handle(CreateComment {
            pub_id: pub_id.into(),
            post_id: post_id.into(),
            author_id: "a2".into(),
            content_id: content_id.into(),
            body: text.to_string(),
        })
        .await?;
    Ok(())
}

/// Submit a comment's single block for moderation.
pub fn start_comment_moderation(pub_id: &str, content_id: &str) -> StartModeration {
    StartModeration::builder()
        .pub_id(pub_id)
        .author_id("a2")
        .blocks(IndexMap::from([(content_id.into(), ContentType::Text)]))
        .kind(PublicationKind::Comment)
        .build()
}
