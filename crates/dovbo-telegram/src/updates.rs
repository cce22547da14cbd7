//! Bot API update types and their mapping to chat events.

use dovbo_ai::{BotError, ChatEvent};
use dovbo_common::ChatId;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub my_chat_member: Option<ChatMemberUpdated>,
    #[serde(default)]
    pub chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }

    /// Username if set, otherwise the full name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) if !username.is_empty() => username.clone(),
            _ => self.full_name(),
        }
    }

    /// An HTML link that mentions the user.
    pub fn mention_html(&self) -> String {
        format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            self.id,
            escape_html(&self.full_name())
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberUpdated {
    #[serde(default)]
    pub chat: Option<Chat>,
    pub from: User,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: MemberStatus,
    pub user: User,
    #[serde(default)]
    pub is_member: Option<bool>,
}

impl ChatMember {
    pub fn is_present(&self) -> bool {
        match self.status {
            MemberStatus::Creator | MemberStatus::Administrator | MemberStatus::Member => true,
            MemberStatus::Restricted => self.is_member == Some(true),
            MemberStatus::Left | MemberStatus::Kicked | MemberStatus::Unknown => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    #[serde(other)]
    Unknown,
}

/// Membership change carried by a member update, or `None` if it did not change.
fn transition(update: &ChatMemberUpdated) -> Option<(bool, bool)> {
    let was = update.old_chat_member.is_present();
    let is = update.new_chat_member.is_present();
    (was != is).then_some((was, is))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn chat_of(chat: Option<&Chat>, update_id: i64) -> Result<&Chat, BotError> {
    chat.ok_or_else(|| BotError::Configuration(format!("update {update_id} has no chat id")))
}

fn is_group(kind: ChatKind) -> bool {
    matches!(kind, ChatKind::Group | ChatKind::Supergroup)
}

/// Map an update to the event the bot should answer, if any.
///
/// Returns `Ok(None)` for updates the bot ignores and
/// `BotError::Configuration` for updates missing their chat.
pub fn to_event(update: &Update) -> Result<Option<ChatEvent>, BotError> {
    if let Some(message) = &update.message {
        return message_event(message, update.update_id);
    }
    if let Some(member) = &update.my_chat_member {
        return bot_membership_event(member, update.update_id);
    }
    if let Some(member) = &update.chat_member {
        return member_event(member, update.update_id);
    }
    debug!(update_id = update.update_id, "ignoring update");
    Ok(None)
}

fn message_event(message: &Message, update_id: i64) -> Result<Option<ChatEvent>, BotError> {
    let chat = chat_of(message.chat.as_ref(), update_id)?;
    let (Some(text), Some(from)) = (&message.text, &message.from) else {
        debug!(update_id, "ignoring message without text or sender");
        return Ok(None);
    };
    let chat_id = ChatId(chat.id);

    let event = match chat.kind {
        ChatKind::Private => ChatEvent::PrivateMessage {
            chat_id,
            text: text.clone(),
            user_name: from.display_name(),
        },
        kind if is_group(kind) => ChatEvent::GroupMessage {
            chat_id,
            text: text.clone(),
            user_name: from.display_name(),
            group_name: chat.title.clone().unwrap_or_default(),
            reply_to_message_id: Some(message.message_id),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

fn bot_membership_event(
    update: &ChatMemberUpdated,
    update_id: i64,
) -> Result<Option<ChatEvent>, BotError> {
    let chat = chat_of(update.chat.as_ref(), update_id)?;
    let Some((was_member, is_member)) = transition(update) else {
        return Ok(None);
    };
    let cause = update.from.full_name();
    let title = chat.title.as_deref().unwrap_or_default();
    let joined = !was_member && is_member;

    match chat.kind {
        kind if is_group(kind) && joined => {
            info!(%cause, group = %title, "bot added to group");
            Ok(Some(ChatEvent::BotAddedToGroup {
                chat_id: ChatId(chat.id),
                group_name: title.to_string(),
            }))
        }
        kind if is_group(kind) => {
            info!(%cause, group = %title, "bot removed from group");
            Ok(None)
        }
        ChatKind::Private if joined => {
            info!(%cause, "user unblocked the bot");
            Ok(None)
        }
        ChatKind::Private => {
            info!(%cause, "user blocked the bot");
            Ok(None)
        }
        _ => {
            info!(%cause, channel = %title, joined, "bot channel membership changed");
            Ok(None)
        }
    }
}

fn member_event(
    update: &ChatMemberUpdated,
    update_id: i64,
) -> Result<Option<ChatEvent>, BotError> {
    let chat = chat_of(update.chat.as_ref(), update_id)?;
    let Some((was_member, _)) = transition(update) else {
        return Ok(None);
    };

    let member = &update.new_chat_member.user;
    let chat_id = ChatId(chat.id);
    let member_name = member.mention_html();
    let actor_name = update.from.mention_html();
    let by_other = update.from.id != member.id;

    let event = if was_member {
        ChatEvent::MemberLeft {
            chat_id,
            member_name,
            actor_name,
            kicked: by_other,
        }
    } else {
        ChatEvent::MemberJoined {
            chat_id,
            member_name,
            actor_name,
            invited: by_other,
        }
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    fn user(id: i64, first: &str, username: Option<&str>) -> serde_json::Value {
        json!({"id": id, "is_bot": false, "first_name": first, "username": username})
    }

    fn member_update(
        field: &str,
        chat: serde_json::Value,
        from: serde_json::Value,
        member: serde_json::Value,
        old: &str,
        new: &str,
    ) -> Update {
        update(json!({
            "update_id": 10,
            field: {
                "chat": chat,
                "from": from,
                "date": 0,
                "old_chat_member": {"status": old, "user": member},
                "new_chat_member": {"status": new, "user": member}
            }
        }))
    }

    #[test]
    fn private_text_message() {
        let update = update(json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "date": 0,
                "chat": {"id": 42, "type": "private", "first_name": "Alice"},
                "from": user(42, "Alice", Some("alice")),
                "text": "/start"
            }
        }));

        assert_eq!(
            to_event(&update).unwrap(),
            Some(ChatEvent::PrivateMessage {
                chat_id: ChatId(42),
                text: "/start".into(),
                user_name: "alice".into(),
            })
        );
    }

    #[test]
    fn group_message_replies_and_falls_back_to_full_name() {
        let update = update(json!({
            "update_id": 2,
            "message": {
                "message_id": 77,
                "chat": {"id": -100, "type": "supergroup", "title": "devs"},
                "from": {"id": 7, "first_name": "Bob", "last_name": "Stone"},
                "text": "hello"
            }
        }));

        assert_eq!(
            to_event(&update).unwrap(),
            Some(ChatEvent::GroupMessage {
                chat_id: ChatId(-100),
                text: "hello".into(),
                user_name: "Bob Stone".into(),
                group_name: "devs".into(),
                reply_to_message_id: Some(77),
            })
        );
    }

    #[test]
    fn non_text_and_channel_messages_are_ignored() {
        let sticker = update(json!({
            "update_id": 3,
            "message": {
                "message_id": 1,
                "chat": {"id": 42, "type": "private"},
                "from": user(42, "Alice", None)
            }
        }));
        assert_eq!(to_event(&sticker).unwrap(), None);

        let channel = update(json!({
            "update_id": 4,
            "message": {
                "message_id": 1,
                "chat": {"id": -5, "type": "channel", "title": "news"},
                "from": user(1, "Ann", None),
                "text": "post"
            }
        }));
        assert_eq!(to_event(&channel).unwrap(), None);
    }

    #[test]
    fn missing_chat_is_configuration_error() {
        let update = update(json!({
            "update_id": 5,
            "message": {"message_id": 1, "from": user(1, "Ann", None), "text": "hi"}
        }));
        assert!(matches!(to_event(&update), Err(BotError::Configuration(_))));
    }

    #[test]
    fn bot_added_to_group() {
        let update = member_update(
            "my_chat_member",
            json!({"id": -200, "type": "group", "title": "friends"}),
            user(1, "Ann", None),
            json!({"id": 999, "is_bot": true, "first_name": "dovbobot"}),
            "left",
            "member",
        );
        assert_eq!(
            to_event(&update).unwrap(),
            Some(ChatEvent::BotAddedToGroup {
                chat_id: ChatId(-200),
                group_name: "friends".into(),
            })
        );
    }

    #[test]
    fn bot_removed_or_blocked_is_logged_only() {
        let removed = member_update(
            "my_chat_member",
            json!({"id": -200, "type": "group", "title": "friends"}),
            user(1, "Ann", None),
            json!({"id": 999, "is_bot": true, "first_name": "dovbobot"}),
            "member",
            "kicked",
        );
        assert_eq!(to_event(&removed).unwrap(), None);

        let blocked = member_update(
            "my_chat_member",
            json!({"id": 1, "type": "private"}),
            user(1, "Ann", None),
            json!({"id": 999, "is_bot": true, "first_name": "dovbobot"}),
            "member",
            "kicked",
        );
        assert_eq!(to_event(&blocked).unwrap(), None);
    }

    #[test]
    fn member_joins_by_themselves() {
        let ann = user(1, "Ann", None);
        let update = member_update(
            "chat_member",
            json!({"id": -300, "type": "supergroup", "title": "club"}),
            ann.clone(),
            ann,
            "left",
            "member",
        );
        assert_eq!(
            to_event(&update).unwrap(),
            Some(ChatEvent::MemberJoined {
                chat_id: ChatId(-300),
                member_name: "<a href=\"tg://user?id=1\">Ann</a>".into(),
                actor_name: "<a href=\"tg://user?id=1\">Ann</a>".into(),
                invited: false,
            })
        );
    }

    #[test]
    fn member_kicked_by_admin() {
        let update = member_update(
            "chat_member",
            json!({"id": -300, "type": "supergroup", "title": "club"}),
            user(2, "Admin", None),
            user(1, "Ann", None),
            "member",
            "kicked",
        );
        let Some(ChatEvent::MemberLeft { kicked, .. }) = to_event(&update).unwrap() else {
            panic!("expected MemberLeft");
        };
        assert!(kicked);
    }

    #[test]
    fn promotion_is_not_a_transition() {
        let update = member_update(
            "chat_member",
            json!({"id": -300, "type": "supergroup", "title": "club"}),
            user(2, "Admin", None),
            user(1, "Ann", None),
            "member",
            "administrator",
        );
        assert_eq!(to_event(&update).unwrap(), None);
    }

    #[test]
    fn unrecognised_member_status_decodes_as_absent() {
        let update = member_update(
            "chat_member",
            json!({"id": -300, "type": "supergroup", "title": "club"}),
            user(2, "Admin", None),
            user(1, "Ann", None),
            "left",
            "ghost",
        );
        let changed = update.chat_member.as_ref().unwrap();
        assert_eq!(changed.new_chat_member.status, MemberStatus::Unknown);
        assert!(!changed.new_chat_member.is_present());
        assert_eq!(to_event(&update).unwrap(), None);
    }

    #[test]
    fn restricted_membership_follows_is_member() {
        let member = |is_member| ChatMember {
            status: MemberStatus::Restricted,
            user: User {
                id: 1,
                first_name: "Ann".into(),
                last_name: None,
                username: None,
            },
            is_member: Some(is_member),
        };
        assert!(member(true).is_present());
        assert!(!member(false).is_present());
    }

    #[test]
    fn mention_escapes_name() {
        let user = User {
            id: 3,
            first_name: "<Tom>".into(),
            last_name: Some("& Jerry".into()),
            username: Some("tj".into()),
        };
        assert_eq!(
            user.mention_html(),
            "<a href=\"tg://user?id=3\">&lt;Tom&gt; &amp; Jerry</a>"
        );
        assert_eq!(user.display_name(), "tj");
    }

    #[test]
    fn unrelated_update_is_ignored() {
        let update = update(json!({"update_id": 9, "edited_message": {}}));
        assert_eq!(to_event(&update).unwrap(), None);
    }
}
