// In-memory storage
//
// DashMap tables shared by every session. A session stages its writes and
// applies them on commit, so a rolled back unit of work leaves the tables
// untouched. Reads inside a session see its own staged writes first.

use anyhow::{bail, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use relay::{Session, SessionFactory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::{BlogSession, StorageSession};
use crate::common::{ContentId, PublicationId};
use crate::domains::blog::models::{Comment, ContentRecord, Post, Publication};

#[derive(Debug, Default)]
struct Tables {
    posts: DashMap<PublicationId, Post>,
    comments: DashMap<PublicationId, Comment>,
    contents: DashMap<ContentId, ContentRecord>,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_next_commit: AtomicBool,
}

/// Shared in-memory tables. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Tables>,
    counters: Arc<Counters>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, id: &PublicationId) -> Option<Post> {
        self.tables.posts.get(id).map(|p| p.value().clone())
    }

    pub fn comment(&self, id: &PublicationId) -> Option<Comment> {
        self.tables.comments.get(id).map(|c| c.value().clone())
    }

    pub fn content(&self, id: &ContentId) -> Option<ContentRecord> {
        self.tables.contents.get(id).map(|c| c.value().clone())
    }

    /// Committed content of a publication, ordered by content id.
    pub fn content_for(&self, pub_id: &PublicationId) -> Vec<ContentRecord> {
        let mut records: Vec<_> = self
            .tables
            .contents
            .iter()
            .filter(|c| &c.publication_id == pub_id)
            .map(|c| c.value().clone())
            .collect();
        records.sort_by(|a, b| a.content_id.cmp(&b.content_id));
        records
    }

    /// Make the next commit fail once.
    pub fn fail_next_commit(&self) {
        self.counters.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory<BlogSession> for MemoryStorage {
    async fn open(&self) -> Result<BlogSession> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            tables: self.tables.clone(),
            counters: self.counters.clone(),
            staged: Staged::default(),
        }))
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Default)]
struct Staged {
    posts: HashMap<PublicationId, Post>,
    comments: HashMap<PublicationId, Comment>,
    contents: HashMap<ContentId, ContentRecord>,
}

impl Staged {
    fn len(&self) -> usize {
        self.posts.len() + self.comments.len() + self.contents.len()
    }

    fn clear(&mut self) {
        self.posts.clear();
        self.comments.clear();
        self.contents.clear();
    }
}

pub struct MemorySession {
    tables: Arc<Tables>,
    counters: Arc<Counters>,
    staged: Staged,
}

#[async_trait]
impl Session for MemorySession {
    async fn commit(&mut self) -> Result<()> {
        if self.counters.fail_next_commit.swap(false, Ordering::SeqCst) {
            bail!("storage commit failed");
        }

        let writes = self.staged.len();
        for (id, post) in self.staged.posts.drain() {
            self.tables.posts.insert(id, post);
        }
        for (id, comment) in self.staged.comments.drain() {
            self.tables.comments.insert(id, comment);
        }
        for (id, record) in self.staged.contents.drain() {
            self.tables.contents.insert(id, record);
        }

        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        debug!(writes, "storage session committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let discarded = self.staged.len();
        self.staged.clear();
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        debug!(discarded, "storage session rolled back");
        Ok(())
    }
}

#[async_trait]
impl StorageSession for MemorySession {
    async fn load_post(&mut self, id: &PublicationId) -> Result<Option<Post>> {
        if let Some(post) = self.staged.posts.get(id) {
            return Ok(Some(post.clone()));
        }
        Ok(self.tables.posts.get(id).map(|p| p.value().clone()))
    }

    async fn save_post(&mut self, post: &Post) -> Result<()> {
        self.staged.posts.insert(post.id().clone(), post.clone());
        Ok(())
    }

    async fn load_comment(&mut self, id: &PublicationId) -> Result<Option<Comment>> {
        if let Some(comment) = self.staged.comments.get(id) {
            return Ok(Some(comment.clone()));
        }
        Ok(self.tables.comments.get(id).map(|c| c.value().clone()))
    }

    async fn save_comment(&mut self, comment: &Comment) -> Result<()> {
        self.staged
            .comments
            .insert(comment.id().clone(), comment.clone());
        Ok(())
    }

    async fn load_content(&mut self, id: &ContentId) -> Result<Option<ContentRecord>> {
        if let Some(record) = self.staged.contents.get(id) {
            return Ok(Some(record.clone()));
        }
        Ok(self.tables.contents.get(id).map(|c| c.value().clone()))
    }

    async fn save_content(&mut self, record: &ContentRecord) -> Result<()> {
        self.staged
            .contents
            .insert(record.content_id.clone(), record.clone());
        Ok(())
    }

    async fn content_for(&mut self, pub_id: &PublicationId) -> Result<Vec<ContentRecord>> {
        let mut merged: HashMap<ContentId, ContentRecord> = self
            .tables
            .contents
            .iter()
            .filter(|c| &c.publication_id == pub_id)
            .map(|c| (c.key().clone(), c.value().clone()))
            .collect();
        for (id, record) in &self.staged.contents {
            if &record.publication_id == pub_id {
                merged.insert(id.clone(), record.clone());
            }
        }

        let mut records: Vec<_> = merged.into_values().collect();
        records.sort_by(|a, b| a.content_id.cmp(&b.content_id));
        Ok(records)
    }

    async fn set_content_lock(
        &mut self,
        pub_id: &PublicationId,
        content_ids: Option<&[ContentId]>,
        locked: bool,
    ) -> Result<usize> {
        let mut changed = 0;
        for mut record in self.content_for(pub_id).await? {
            let selected = content_ids.map_or(true, |ids| ids.contains(&record.content_id));
            if selected && record.locked != locked {
                record.locked = locked;
                self.staged
                    .contents
                    .insert(record.content_id.clone(), record);
                changed += 1;
            }
        }
        Ok(changed)
    }
}
