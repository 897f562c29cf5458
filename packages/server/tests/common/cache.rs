//! Cache wrappers that reorder moderation record writes the way concurrent
//! callbacks can.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use blog_core::kernel::{BaseModerationCache, FieldWrite, MemoryCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Staging {
    /// Hold every report write back for a while.
    SlowReports(Duration),
    /// Drop the record hash just before a verdict field is written.
    DropBeforeVerdict,
    /// Drop the record hash right after a verdict field was written.
    DropAfterVerdict,
}

/// Delegates to a [`MemoryCache`] with one staged interference.
pub struct StagedCache {
    inner: Arc<MemoryCache>,
    staging: Staging,
}

impl StagedCache {
    pub fn slow_reports(inner: Arc<MemoryCache>, delay: Duration) -> Arc<dyn BaseModerationCache> {
        Arc::new(Self {
            inner,
            staging: Staging::SlowReports(delay),
        })
    }

    pub fn dropping_before_verdict(inner: Arc<MemoryCache>) -> Arc<dyn BaseModerationCache> {
        Arc::new(Self {
            inner,
            staging: Staging::DropBeforeVerdict,
        })
    }

    pub fn dropping_after_verdict(inner: Arc<MemoryCache>) -> Arc<dyn BaseModerationCache> {
        Arc::new(Self {
            inner,
            staging: Staging::DropAfterVerdict,
        })
    }

    async fn hold_report(&self, key: &str) {
        if let Staging::SlowReports(delay) = self.staging {
            if key.contains(":report:") {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl BaseModerationCache for StagedCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.hold_report(key).await;
        self.inner.set(key, value, ttl).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool> {
        self.hold_report(key).await;
        self.inner.set_nx(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.inner.hash_set(key, field, value).await
    }

    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<FieldWrite> {
        if self.staging == Staging::DropBeforeVerdict {
            self.inner.delete(key).await?;
        }
        let outcome = self.inner.hash_set_nx(key, field, value).await?;
        if self.staging == Staging::DropAfterVerdict {
            self.inner.delete(key).await?;
        }
        Ok(outcome)
    }

    async fn hash_get_all(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        self.inner.hash_get_all(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.inner.expire(key, ttl).await
    }
}
