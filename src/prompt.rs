//! Prompt assembly: the ordered message list sent to the model.

use serde::{Deserialize, Serialize};

use crate::conversation::{Role, Turn};

/// One entry of a chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Plain text, or a list of typed parts for vision requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        ChatMessage::text(turn.role, turn.content.clone())
    }
}

/// System instruction, then `history` in order, then `new_turn`.
///
/// No token accounting happens here; only the store's turn cap bounds the
/// payload.
pub fn build(system_prompt: &str, history: &[Turn], new_turn: &Turn) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        history
            .iter()
            // Stored system turns would break the single-leading-system shape.
            .filter(|turn| turn.role != Role::System)
            .map(ChatMessage::from),
    );
    messages.push(ChatMessage::from(new_turn));
    messages
}

/// Stateless vision request: system instruction plus one user entry holding
/// the caption and the inline image
pub fn build_vision(system_prompt: &str, caption: &str, image_data_url: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: caption.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_url.to_string(),
                    },
                },
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_orders_system_history_new_turn() {
        let history = vec![
            Turn::new(1, Role::User, "what is rust?"),
            Turn::new(1, Role::Assistant, "a language"),
        ];
        let new_turn = Turn::new(1, Role::User, "who made it?");

        let messages = build("be helpful", &history, &new_turn);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("be helpful"));
        assert_eq!(messages[1], ChatMessage::user("what is rust?"));
        assert_eq!(messages[2], ChatMessage::text(Role::Assistant, "a language"));
        assert_eq!(messages[3], ChatMessage::user("who made it?"));
    }

    #[test]
    fn test_build_has_exactly_one_leading_system_entry() {
        let history = vec![
            Turn::new(1, Role::System, "stale instruction"),
            Turn::new(1, Role::User, "hi"),
        ];
        let new_turn = Turn::new(1, Role::User, "again");

        let messages = build("current instruction", &history, &new_turn);

        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages.iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }

    #[test]
    fn test_build_with_empty_history() {
        let messages = build("sys", &[], &Turn::new(1, Role::User, "hello"));
        assert_eq!(
            messages,
            vec![ChatMessage::system("sys"), ChatMessage::user("hello")]
        );
    }

    #[test]
    fn test_vision_payload_shape() {
        let messages = build_vision("sys", "What is in this image?", "data:image/png;base64,AAAA");
        let value = serde_json::to_value(&messages).unwrap();

        assert_eq!(
            value,
            json!([
                {"role": "system", "content": "sys"},
                {"role": "user", "content": [
                    {"type": "text", "text": "What is in this image?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]}
            ])
        );
    }
}
