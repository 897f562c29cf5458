use serde::{Deserialize, Serialize};

use super::code::ModerationCode;
use super::verdict::Verdict;
use crate::common::{ContentId, PublicationId};
use crate::domains::moderation::errors::ModerationError;

/// One independently reviewable unit of a publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub uid: ContentId,
    pub moderation_code: ModerationCode,
    pub publication_id: PublicationId,
    pub payload: String,
    verdict: Verdict,
}

impl ContentBlock {
    pub fn new(
        uid: ContentId,
        publication_id: PublicationId,
        payload: impl Into<String>,
        moderation_code: ModerationCode,
    ) -> Self {
        Self {
            uid,
            moderation_code,
            publication_id,
            payload: payload.into(),
            verdict: Verdict::NotSet,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Record the verdict. A block is judged once.
    pub fn set_verdict(&mut self, verdict: Verdict) -> Result<(), ModerationError> {
        if !verdict.is_set() {
            return Err(ModerationError::InvalidVerdict {
                code: self.moderation_code.to_string(),
                verdict: verdict.to_string(),
            });
        }
        if self.verdict.is_set() {
            return Err(ModerationError::VerdictAlreadySet {
                pub_id: self.publication_id.to_string(),
                code: self.moderation_code.to_string(),
            });
        }
        self.verdict = verdict;
        Ok(())
    }
}
