use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{ContentId, PublicationId, RepositoryError};

/// Kind of payload a content block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Video,
    Audio,
    Image,
}

impl ContentType {
    /// Only text can be sent to the external reviewer today.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, ContentType::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "video" => Ok(ContentType::Video),
            "audio" => Ok(ContentType::Audio),
            "image" => Ok(ContentType::Image),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// A stored content block together with its moderation lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub content_id: ContentId,
    pub publication_id: PublicationId,
    pub kind: ContentType,
    pub body: String,
    pub locked: bool,
}

impl ContentRecord {
    pub fn new(
        content_id: ContentId,
        publication_id: PublicationId,
        kind: ContentType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            content_id,
            publication_id,
            kind,
            body: body.into(),
            locked: false,
        }
    }

    /// Replace the body. Fails while the block is locked for moderation.
    pub fn update_body(&mut self, body: impl Into<String>) -> Result<(), RepositoryError> {
        if self.locked {
            return Err(RepositoryError::ContentLocked {
                content_id: self.content_id.to_string(),
            });
        }
        self.body = body.into();
        Ok(())
    }

    /// The persisted lock flag, `1` while under moderation.
    pub fn lock_flag(&self) -> u8 {
        u8::from(self.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_text_is_reviewable() {
        assert!(ContentType::Text.is_reviewable());
        assert!(!ContentType::Video.is_reviewable());
        assert!(!ContentType::Audio.is_reviewable());
        assert!(!ContentType::Image.is_reviewable());
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("image".parse::<ContentType>(), Ok(ContentType::Image));
        assert!("gif".parse::<ContentType>().is_err());
        assert_eq!(
            serde_json::to_string(&ContentType::Text).unwrap(),
            "\"text\""
        );
    }

    #[test]
    fn test_locked_content_rejects_edits() {
        let mut record = ContentRecord::new("h1".into(), "p1".into(), ContentType::Text, "Hello");
        record.locked = true;

        let err = record.update_body("Changed").unwrap_err();

        assert!(matches!(err, RepositoryError::ContentLocked { .. }));
        assert_eq!(record.body, "Hello");
        assert_eq!(record.lock_flag(), 1);
    }
}
