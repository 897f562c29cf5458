//! Author notifications for publication lifecycle events.
//!
//! Delivery is best-effort: a notifier failure is logged and the cascade
//! continues, so a mail outage can never undo a committed state change.

use async_trait::async_trait;
use relay::{Handler, HandlerError, Message};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::kernel::{BaseNotifier, Notification};
use crate::messages::{SystemKind, SystemMessage};

/// Event kinds that produce a notification to the author.
pub const NOTIFIED_KINDS: &[SystemKind] = &[
    SystemKind::ModerationStarted,
    SystemKind::PostAccepted,
    SystemKind::PostRejected,
    SystemKind::PostPublished,
    SystemKind::ActivateLater,
    SystemKind::PostRolledToDraft,
    SystemKind::PostDeleted,
    SystemKind::CommentModerationStarted,
    SystemKind::CommentPublished,
    SystemKind::CommentRejected,
    SystemKind::CommentDeleted,
];

pub struct NotificationHandler {
    notifier: Arc<dyn BaseNotifier>,
    sender: String,
}

impl NotificationHandler {
    pub fn new(notifier: Arc<dyn BaseNotifier>, sender: impl Into<String>) -> Self {
        Self {
            notifier,
            sender: sender.into(),
        }
    }

    /// Build the message for `event`, or `None` for kinds nobody is told about.
    pub fn compose(&self, event: &SystemMessage) -> Option<Notification> {
        let (recipient, pub_id, subject, body) = match event {
            SystemMessage::ModerationStarted(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post is being reviewed".to_string(),
                format!("\"{}\" was submitted for moderation.", e.pub_title),
            ),
            SystemMessage::PostAccepted(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post was accepted".to_string(),
                "Every block passed moderation. You can publish it now.".to_string(),
            ),
            SystemMessage::PostRejected(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post was rejected".to_string(),
                rejection_body("post", &e.reasons),
            ),
            SystemMessage::PostPublished(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post is live".to_string(),
                "The post is now visible to readers.".to_string(),
            ),
            SystemMessage::ActivateLater(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post is scheduled".to_string(),
                format!("The post becomes visible at {}.", e.activate_at.to_rfc3339()),
            ),
            SystemMessage::PostRolledToDraft(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post is a draft again".to_string(),
                "Edit the post and submit it for moderation when ready.".to_string(),
            ),
            SystemMessage::PostDeleted(e) => (
                &e.author_id,
                &e.pub_id,
                "Your post was deleted".to_string(),
                String::new(),
            ),
            SystemMessage::CommentModerationStarted(e) => (
                &e.author_id,
                &e.pub_id,
                "Your comment is being reviewed".to_string(),
                String::new(),
            ),
            SystemMessage::CommentPublished(e) => (
                &e.author_id,
                &e.pub_id,
                "Your comment is live".to_string(),
                format!("The comment on post {} is now visible.", e.post_id),
            ),
            SystemMessage::CommentRejected(e) => (
                &e.author_id,
                &e.pub_id,
                "Your comment needs changes".to_string(),
                rejection_body("comment", &e.reasons),
            ),
            SystemMessage::CommentDeleted(e) => (
                &e.author_id,
                &e.pub_id,
                "Your comment was deleted".to_string(),
                String::new(),
            ),
            _ => return None,
        };

        Some(Notification {
            sender: self.sender.clone(),
            recipient: recipient.clone(),
            pub_id: pub_id.clone(),
            subject,
            body,
        })
    }
}

fn rejection_body(what: &str, reasons: &[String]) -> String {
    if reasons.is_empty() {
        return format!("The {} did not pass moderation.", what);
    }
    format!(
        "The {} did not pass moderation:\n- {}",
        what,
        reasons.join("\n- ")
    )
}

#[async_trait]
impl Handler<SystemMessage> for NotificationHandler {
    fn name(&self) -> &'static str {
        "notify_author"
    }

    async fn handle(&self, message: SystemMessage) -> Result<Vec<SystemMessage>, HandlerError> {
        let Some(notification) = self.compose(&message) else {
            debug!(kind = %message.kind(), "no notification for event");
            return Ok(vec![]);
        };

        let recipient = notification.recipient.clone();
        if let Err(err) = self.notifier.notify(notification).await {
            warn!(kind = %message.kind(), %recipient, error = %err, "author notification failed");
        }
        Ok(vec![])
    }
}
