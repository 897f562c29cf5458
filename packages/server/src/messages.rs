//! The closed set of system messages routed by the bus.
//!
//! Commands are imperative (`StartModeration`), events are past tense
//! (`ModerationDoneSuccess`). Both are variants of [`SystemMessage`] and are
//! routed by their [`SystemKind`].

use relay::{Message, MessageRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::blog::commands::{
    AddContentBlock, CreateComment, CreatePost, LockContent, PublishPost, RemoveComment,
    RemovePost, RollbackPostToDraft, SaveDraft, UnlockContent, UpdateContentBlock,
};
use crate::domains::blog::events::{
    ActivateLater, CommentCreated, CommentDeleted, CommentModerationStarted, CommentPublished,
    CommentRejected, ModerationStarted, PostAccepted, PostCreated, PostDeleted, PostDrafted,
    PostPublished, PostRejected, PostRolledToDraft,
};
use crate::domains::moderation::commands::{
    DropModerationRecord, ModerateContent, RegisterModerationRecord, SetModerationResult,
    StartModeration,
};
use crate::domains::moderation::events::{
    ModerationDoneSuccess, ModerationFailed, ModerationProgressed,
};

/// A handler received a message of a kind it does not own.
#[derive(Debug, Error)]
#[error("expected {expected} but received {received:?}")]
pub struct UnexpectedMessage {
    pub expected: &'static str,
    pub received: SystemKind,
}

macro_rules! system_messages {
    (
        commands { $($command:ident),* $(,)? }
        events { $($event:ident),* $(,)? }
    ) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "payload")]
        pub enum SystemMessage {
            $($command($command),)*
            $($event($event),)*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SystemKind {
            $($command,)*
            $($event,)*
        }

        impl SystemKind {
            pub const ALL: &'static [SystemKind] = &[
                $(SystemKind::$command,)*
                $(SystemKind::$event,)*
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $(SystemKind::$command => stringify!($command),)*
                    $(SystemKind::$event => stringify!($event),)*
                }
            }
        }

        impl Message for SystemMessage {
            type Kind = SystemKind;

            fn kind(&self) -> SystemKind {
                match self {
                    $(SystemMessage::$command(_) => SystemKind::$command,)*
                    $(SystemMessage::$event(_) => SystemKind::$event,)*
                }
            }

            fn role(&self) -> MessageRole {
                match self {
                    $(SystemMessage::$command(_) => MessageRole::Command,)*
                    $(SystemMessage::$event(_) => MessageRole::Event,)*
                }
            }
        }

        $(
            impl From<$command> for SystemMessage {
                fn from(message: $command) -> Self {
                    SystemMessage::$command(message)
                }
            }

            impl TryFrom<SystemMessage> for $command {
                type Error = UnexpectedMessage;

                fn try_from(message: SystemMessage) -> Result<Self, Self::Error> {
                    match message {
                        SystemMessage::$command(inner) => Ok(inner),
                        other => Err(UnexpectedMessage {
                            expected: stringify!($command),
                            received: other.kind(),
                        }),
                    }
                }
            }
        )*

        $(
            impl From<$event> for SystemMessage {
                fn from(message: $event) -> Self {
                    SystemMessage::$event(message)
                }
            }

            impl TryFrom<SystemMessage> for $event {
                type Error = UnexpectedMessage;

                fn try_from(message: SystemMessage) -> Result<Self, Self::Error> {
                    match message {
                        SystemMessage::$event(inner) => Ok(inner),
                        other => Err(UnexpectedMessage {
                            expected: stringify!($event),
                            received: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

system_messages! {
    commands {
        // blog
        CreatePost,
        AddContentBlock,
        UpdateContentBlock,
        SaveDraft,
        PublishPost,
        RollbackPostToDraft,
        RemovePost,
        CreateComment,
        RemoveComment,
        LockContent,
        UnlockContent,
        // moderation
        StartModeration,
        SetModerationResult,
        ModerateContent,
        RegisterModerationRecord,
        DropModerationRecord,
    }
    events {
        // blog
        PostCreated,
        PostDrafted,
        ModerationStarted,
        PostAccepted,
        PostRejected,
        PostPublished,
        ActivateLater,
        PostRolledToDraft,
        PostDeleted,
        CommentCreated,
        CommentModerationStarted,
        CommentPublished,
        CommentRejected,
        CommentDeleted,
        // moderation
        ModerationProgressed,
        ModerationDoneSuccess,
        ModerationFailed,
    }
}

impl std::fmt::Display for SystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_follow_naming() {
        let command = SystemMessage::from(SaveDraft {
            pub_id: "p1".into(),
        });
        let event = SystemMessage::from(PostAccepted {
            pub_id: "p1".into(),
            author_id: "a1".into(),
        });

        assert_eq!(command.role(), MessageRole::Command);
        assert_eq!(event.role(), MessageRole::Event);
        assert_eq!(command.kind().name(), "SaveDraft");
    }

    #[test]
    fn test_try_from_wrong_variant() {
        let message = SystemMessage::from(SaveDraft {
            pub_id: "p1".into(),
        });

        let err = RemovePost::try_from(message).unwrap_err();

        assert_eq!(err.expected, "RemovePost");
        assert_eq!(err.received, SystemKind::SaveDraft);
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let message = SystemMessage::from(ModerationFailed {
            pub_id: "p1".into(),
            kind: Default::default(),
            reasons: vec!["profanity".into()],
        });

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "ModerationFailed");
        assert_eq!(json["payload"]["reasons"][0], "profanity");
    }
}
