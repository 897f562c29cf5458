//! Cache-backed storage for moderation control records.
//!
//! Layout per publication:
//!
//! ```text
//! mcr:{pub_id}                 hash, TTL = record expiry
//!   mcr        -> serialized record snapshot
//!   {code}     -> verdict of one block (written once, set-if-absent)
//! mcr:{pub_id}:report:{code}   free-text report, TTL = report expiry
//! mcr:{pub_id}:finalized       claim of the callback that emits the outcome,
//!                              TTL = record expiry, outlives the dropped hash
//! ```
//!
//! The snapshot is written once, at registration. Verdicts go to their own
//! fields with an atomic set-if-absent and [`ModerationRecordStore::load`]
//! overlays them on the snapshot, so two callbacks for the same publication
//! cannot overwrite each other and nothing rewrites a record after it was
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use super::models::{ModerationCode, ModerationControlRecord, Verdict};
use crate::common::{CacheError, PublicationId};
use crate::kernel::{BaseModerationCache, FieldWrite};

const SNAPSHOT_FIELD: &str = "mcr";

#[derive(Clone)]
pub struct ModerationRecordStore {
    cache: Arc<dyn BaseModerationCache>,
    report_ttl: Duration,
}

impl ModerationRecordStore {
    pub fn new(cache: Arc<dyn BaseModerationCache>, report_ttl: Duration) -> Self {
        Self { cache, report_ttl }
    }

    pub fn record_key(pub_id: &PublicationId) -> String {
        format!("mcr:{}", pub_id)
    }

    pub fn report_key(pub_id: &PublicationId, code: &ModerationCode) -> String {
        format!("mcr:{}:report:{}", pub_id, code)
    }

    pub fn finalized_key(pub_id: &PublicationId) -> String {
        format!("mcr:{}:finalized", pub_id)
    }

    /// Store a fresh record, replacing whatever an earlier round left behind.
    pub async fn register(&self, record: &ModerationControlRecord) -> Result<()> {
        let key = Self::record_key(record.pub_id());
        let snapshot = record.to_json()?;

        self.cache.delete(&key).await.map_err(CacheError::Unavailable)?;
        self.cache
            .delete(&Self::finalized_key(record.pub_id()))
            .await
            .map_err(CacheError::Unavailable)?;
        self.cache
            .hash_set(&key, SNAPSHOT_FIELD, &snapshot)
            .await
            .map_err(CacheError::Unavailable)?;
        self.cache
            .expire(&key, Duration::from_secs(record.expiry_seconds()))
            .await
            .map_err(CacheError::Unavailable)?;

        debug!(pub_id = %record.pub_id(), blocks = record.len(), "moderation record registered");
        Ok(())
    }

    /// Current state of the record, or `None` once it expired or was dropped.
    pub async fn load(&self, pub_id: &PublicationId) -> Result<Option<ModerationControlRecord>> {
        let key = Self::record_key(pub_id);
        let Some(fields) = self
            .cache
            .hash_get_all(&key)
            .await
            .map_err(CacheError::Unavailable)?
        else {
            return Ok(None);
        };

        // fields without a snapshot are not a record
        let Some(snapshot) = fields.get(SNAPSHOT_FIELD) else {
            warn!(%pub_id, fields = fields.len(), "moderation record without snapshot discarded");
            self.cache.delete(&key).await.map_err(CacheError::Unavailable)?;
            return Ok(None);
        };
        let mut record = ModerationControlRecord::from_json(snapshot)?;
        self.overlay_verdicts(&mut record, &fields).await?;
        Ok(Some(record))
    }

    async fn overlay_verdicts(
        &self,
        record: &mut ModerationControlRecord,
        fields: &HashMap<String, String>,
    ) -> Result<()> {
        let codes: Vec<ModerationCode> = record.codes().cloned().collect();

        for code in codes {
            if record.verdict(&code).is_some_and(|v| v.is_set()) {
                continue;
            }
            let Some(raw) = fields.get(code.as_str()) else {
                continue;
            };
            let verdict: Verdict = match raw.parse() {
                Ok(verdict) => verdict,
                Err(err) => {
                    warn!(pub_id = %record.pub_id(), %code, error = %err, "unreadable verdict field ignored");
                    continue;
                }
            };

            let report = self
                .cache
                .get(&Self::report_key(record.pub_id(), &code))
                .await
                .map_err(CacheError::Unavailable)?
                .unwrap_or_default();
            record.set(&code, verdict, report)?;
        }
        Ok(())
    }

    /// Write one verdict and its report.
    ///
    /// The report lands first, so whoever reads the verdict field can also
    /// read the report. A report written by a call whose verdict lost is
    /// removed again.
    pub async fn record_verdict(
        &self,
        pub_id: &PublicationId,
        code: &ModerationCode,
        verdict: Verdict,
        report: &str,
    ) -> Result<FieldWrite> {
        let report_key = Self::report_key(pub_id, code);
        let report_written = !report.is_empty()
            && self
                .cache
                .set_nx(&report_key, report, Some(self.report_ttl))
                .await
                .map_err(CacheError::Unavailable)?;

        let outcome = self
            .cache
            .hash_set_nx(&Self::record_key(pub_id), code.as_str(), verdict.as_str())
            .await
            .map_err(CacheError::Unavailable)?;

        if outcome != FieldWrite::Written && report_written {
            self.cache
                .delete(&report_key)
                .await
                .map_err(CacheError::Unavailable)?;
        }
        Ok(outcome)
    }

    /// Take the right to emit the final outcome of `record`. Exactly one
    /// caller wins, even if it arrives after the record was dropped.
    pub async fn claim_finalization(&self, record: &ModerationControlRecord) -> Result<bool> {
        self.cache
            .set_nx(
                &Self::finalized_key(record.pub_id()),
                "1",
                Some(Duration::from_secs(record.expiry_seconds())),
            )
            .await
            .map_err(|err| CacheError::Unavailable(err).into())
    }

    /// Remove the record and its reports. Returns whether it existed.
    ///
    /// The finalization claim stays until it expires or the next round is
    /// registered.
    pub async fn drop_record(&self, pub_id: &PublicationId) -> Result<bool> {
        let key = Self::record_key(pub_id);
        let codes: Vec<String> = self
            .cache
            .hash_get_all(&key)
            .await
            .map_err(CacheError::Unavailable)?
            .map(|fields| {
                fields
                    .into_keys()
                    .filter(|field| field != SNAPSHOT_FIELD)
                    .collect()
            })
            .unwrap_or_default();

        for code in codes {
            self.cache
                .delete(&Self::report_key(pub_id, &ModerationCode::from(code)))
                .await
                .map_err(CacheError::Unavailable)?;
        }
        Ok(self
            .cache
            .delete(&key)
            .await
            .map_err(CacheError::Unavailable)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::blog::models::PublicationKind;
    use crate::domains::moderation::models::ContentBlock;
    use crate::kernel::MemoryCache;
    use chrono::Utc;

    fn store() -> (ModerationRecordStore, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (
            ModerationRecordStore::new(cache.clone(), Duration::from_secs(60)),
            cache,
        )
    }

    fn record() -> ModerationControlRecord {
        let mut record =
            ModerationControlRecord::new("p1".into(), PublicationKind::Post, Utc::now(), 3600);
        record.register(&ContentBlock::new("h1".into(), "p1".into(), "Title", "code-h1".into()));
        record.register(&ContentBlock::new("b1".into(), "p1".into(), "Body", "code-b1".into()));
        record
    }

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let (store, _) = store();

        assert!(store.load(&"p1".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_then_load() {
        let (store, cache) = store();
        let record = record();

        store.register(&record).await.unwrap();

        let loaded = store.load(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(cache.ttl("mcr:p1").is_some());
    }

    #[tokio::test]
    async fn test_verdict_fields_overlay_snapshot() {
        let (store, _) = store();
        store.register(&record()).await.unwrap();

        let outcome = store
            .record_verdict(&"p1".into(), &"code-b1".into(), Verdict::Declined, "profanity")
            .await
            .unwrap();
        assert_eq!(outcome, FieldWrite::Written);

        let loaded = store.load(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(loaded.verdict(&"code-b1".into()), Some(Verdict::Declined));
        assert_eq!(loaded.verdict(&"code-h1".into()), Some(Verdict::NotSet));
        assert_eq!(loaded.resolved(), 1);
        assert_eq!(loaded.reports()[0].text, "profanity");
    }

    #[tokio::test]
    async fn test_second_verdict_for_same_block_is_refused() {
        let (store, cache) = store();
        store.register(&record()).await.unwrap();

        let first = store
            .record_verdict(&"p1".into(), &"code-h1".into(), Verdict::Accepted, "")
            .await
            .unwrap();
        let second = store
            .record_verdict(&"p1".into(), &"code-h1".into(), Verdict::Declined, "late")
            .await
            .unwrap();

        assert_eq!(first, FieldWrite::Written);
        assert_eq!(second, FieldWrite::Occupied);
        let loaded = store.load(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(loaded.verdict(&"code-h1".into()), Some(Verdict::Accepted));
        assert!(!cache.contains_key("mcr:p1:report:code-h1"));
    }

    #[tokio::test]
    async fn test_verdict_for_dropped_record_writes_nothing() {
        let (store, cache) = store();
        store.register(&record()).await.unwrap();
        store.drop_record(&"p1".into()).await.unwrap();

        let outcome = store
            .record_verdict(&"p1".into(), &"code-b1".into(), Verdict::Declined, "spam")
            .await
            .unwrap();

        assert_eq!(outcome, FieldWrite::MissingKey);
        assert!(!cache.contains_key("mcr:p1"));
        assert!(!cache.contains_key("mcr:p1:report:code-b1"));
    }

    #[tokio::test]
    async fn test_report_is_readable_once_the_verdict_is() {
        let (store, cache) = store();
        store.register(&record()).await.unwrap();

        store
            .record_verdict(&"p1".into(), &"code-b1".into(), Verdict::Declined, "profanity")
            .await
            .unwrap();

        assert_eq!(
            cache.get("mcr:p1:report:code-b1").await.unwrap().as_deref(),
            Some("profanity")
        );
        assert!(cache.ttl("mcr:p1:report:code-b1").is_some());
    }

    #[tokio::test]
    async fn test_only_one_finalization_claim_wins() {
        let (store, _) = store();
        store.register(&record()).await.unwrap();

        let record = record();
        assert!(store.claim_finalization(&record).await.unwrap());
        assert!(!store.claim_finalization(&record).await.unwrap());

        // a late claimer after the drop still loses
        store.drop_record(&"p1".into()).await.unwrap();
        assert!(!store.claim_finalization(&record).await.unwrap());

        // a new round starts unclaimed
        store.register(&record).await.unwrap();
        assert!(store.claim_finalization(&record).await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_removes_record_and_reports() {
        let (store, cache) = store();
        store.register(&record()).await.unwrap();
        store
            .record_verdict(&"p1".into(), &"code-b1".into(), Verdict::Declined, "spam")
            .await
            .unwrap();

        assert!(store.drop_record(&"p1".into()).await.unwrap());

        assert!(!cache.contains_key("mcr:p1"));
        assert!(!cache.contains_key("mcr:p1:report:code-b1"));
        assert!(store.load(&"p1".into()).await.unwrap().is_none());
        assert!(!store.drop_record(&"p1".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_leftover_verdict_fields_are_discarded() {
        let (store, cache) = store();
        cache.hash_set("mcr:p1", "code-h1", "accepted").await.unwrap();

        assert!(store.load(&"p1".into()).await.unwrap().is_none());
        assert!(!cache.contains_key("mcr:p1"));
    }
}
