//! Chat events and their translation into prompt envelopes.

use dovbo_common::ChatId;

use crate::envelope::PromptEnvelope;

/// Private-chat text that opens a conversation.
const START_COMMAND: &str = "/start";

/// Inbound events from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    PrivateMessage {
        chat_id: ChatId,
        text: String,
        user_name: String,
    },
    GroupMessage {
        chat_id: ChatId,
        text: String,
        user_name: String,
        group_name: String,
        /// Message to thread the reply under.
        reply_to_message_id: Option<i64>,
    },
    BotAddedToGroup {
        chat_id: ChatId,
        group_name: String,
    },
    MemberJoined {
        chat_id: ChatId,
        member_name: String,
        actor_name: String,
        /// Someone other than the member added them.
        invited: bool,
    },
    MemberLeft {
        chat_id: ChatId,
        member_name: String,
        actor_name: String,
        /// Someone other than the member removed them.
        kicked: bool,
    },
}

impl ChatEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            ChatEvent::PrivateMessage { chat_id, .. }
            | ChatEvent::GroupMessage { chat_id, .. }
            | ChatEvent::BotAddedToGroup { chat_id, .. }
            | ChatEvent::MemberJoined { chat_id, .. }
            | ChatEvent::MemberLeft { chat_id, .. } => *chat_id,
        }
    }

    pub fn reply_to(&self) -> Option<i64> {
        match self {
            ChatEvent::GroupMessage {
                reply_to_message_id,
                ..
            } => *reply_to_message_id,
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::PrivateMessage { .. } => "private_message",
            ChatEvent::GroupMessage { .. } => "group_message",
            ChatEvent::BotAddedToGroup { .. } => "bot_added_to_group",
            ChatEvent::MemberJoined { .. } => "member_joined",
            ChatEvent::MemberLeft { .. } => "member_left",
        }
    }
}

/// Situations the bot is prompted about, each with the names its phrase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Situation {
    BotSaysHi { user_name: String },
    BotJoinsChat { group_name: String },
    UserJoinsChat { user_name: String },
    UserLeavesChat { user_name: String },
    UserInvitedToChat { user_name: String, inviter_name: String },
    UserKickedFromChat { user_name: String, kicker_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhraseKey {
    BotSaysHi,
    BotJoinsChat,
    UserJoinsChat,
    UserLeavesChat,
    UserInvitedToChat,
    UserKickedFromChat,
}

impl PhraseKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PhraseKey::BotSaysHi => "bot_says_hi",
            PhraseKey::BotJoinsChat => "bot_joins_chat",
            PhraseKey::UserJoinsChat => "user_joins_chat",
            PhraseKey::UserLeavesChat => "user_leaves_chat",
            PhraseKey::UserInvitedToChat => "user_invited_to_chat",
            PhraseKey::UserKickedFromChat => "user_kicked_from_chat",
        }
    }
}

impl Situation {
    pub fn key(&self) -> PhraseKey {
        match self {
            Situation::BotSaysHi { .. } => PhraseKey::BotSaysHi,
            Situation::BotJoinsChat { .. } => PhraseKey::BotJoinsChat,
            Situation::UserJoinsChat { .. } => PhraseKey::UserJoinsChat,
            Situation::UserLeavesChat { .. } => PhraseKey::UserLeavesChat,
            Situation::UserInvitedToChat { .. } => PhraseKey::UserInvitedToChat,
            Situation::UserKickedFromChat { .. } => PhraseKey::UserKickedFromChat,
        }
    }

    /// Placeholder values available to this situation's template.
    fn values(&self) -> Vec<(&'static str, &str)> {
        match self {
            Situation::BotSaysHi { user_name }
            | Situation::UserJoinsChat { user_name }
            | Situation::UserLeavesChat { user_name } => vec![("user_name", user_name)],
            Situation::BotJoinsChat { group_name } => vec![("group_name", group_name)],
            Situation::UserInvitedToChat {
                user_name,
                inviter_name,
            } => vec![("user_name", user_name), ("inviter_name", inviter_name)],
            Situation::UserKickedFromChat {
                user_name,
                kicker_name,
            } => vec![("user_name", user_name), ("kicker_name", kicker_name)],
        }
    }
}

/// One template per situation, with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseBook {
    pub bot_says_hi: String,
    pub bot_joins_chat: String,
    pub user_joins_chat: String,
    pub user_leaves_chat: String,
    pub user_invited_to_chat: String,
    pub user_kicked_from_chat: String,
}

impl PhraseBook {
    pub fn template(&self, key: PhraseKey) -> &str {
        match key {
            PhraseKey::BotSaysHi => &self.bot_says_hi,
            PhraseKey::BotJoinsChat => &self.bot_joins_chat,
            PhraseKey::UserJoinsChat => &self.user_joins_chat,
            PhraseKey::UserLeavesChat => &self.user_leaves_chat,
            PhraseKey::UserInvitedToChat => &self.user_invited_to_chat,
            PhraseKey::UserKickedFromChat => &self.user_kicked_from_chat,
        }
    }

    /// Fill the situation's template. Unknown placeholders are left verbatim.
    pub fn render(&self, situation: &Situation) -> String {
        interpolate(self.template(situation.key()), &situation.values())
    }
}

/// Single-pass `{name}` substitution; substituted values are never rescanned.
fn interpolate(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Turns chat events into envelopes. Never touches session state.
#[derive(Debug, Clone)]
pub struct Translator {
    phrases: PhraseBook,
    bot_identity: String,
}

impl Translator {
    pub fn new(phrases: PhraseBook, bot_identity: impl Into<String>) -> Self {
        Self {
            phrases,
            bot_identity: bot_identity.into(),
        }
    }

    pub fn translate(&self, event: &ChatEvent) -> PromptEnvelope {
        match classify(event) {
            Translation::Say { sender, text } => PromptEnvelope::message(sender, text),
            Translation::Situation(situation) => {
                PromptEnvelope::prompt(&self.bot_identity, self.phrases.render(&situation))
            }
        }
    }
}

enum Translation<'a> {
    Say { sender: &'a str, text: &'a str },
    Situation(Situation),
}

fn classify(event: &ChatEvent) -> Translation<'_> {
    match event {
        ChatEvent::PrivateMessage {
            text, user_name, ..
        } => {
            let text = text.trim();
            if text.is_empty() || text == START_COMMAND {
                Translation::Situation(Situation::BotSaysHi {
                    user_name: user_name.clone(),
                })
            } else {
                Translation::Say {
                    sender: user_name,
                    text,
                }
            }
        }
        ChatEvent::GroupMessage {
            text, user_name, ..
        } => Translation::Say {
            sender: user_name,
            text: text.trim(),
        },
        ChatEvent::BotAddedToGroup { group_name, .. } => {
            Translation::Situation(Situation::BotJoinsChat {
                group_name: group_name.clone(),
            })
        }
        ChatEvent::MemberJoined {
            member_name,
            actor_name,
            invited,
            ..
        } => Translation::Situation(if *invited {
            Situation::UserInvitedToChat {
                user_name: member_name.clone(),
                inviter_name: actor_name.clone(),
            }
        } else {
            Situation::UserJoinsChat {
                user_name: member_name.clone(),
            }
        }),
        ChatEvent::MemberLeft {
            member_name,
            actor_name,
            kicked,
            ..
        } => Translation::Situation(if *kicked {
            Situation::UserKickedFromChat {
                user_name: member_name.clone(),
                kicker_name: actor_name.clone(),
            }
        } else {
            Situation::UserLeavesChat {
                user_name: member_name.clone(),
            }
        }),
    }
}
