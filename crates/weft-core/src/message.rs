use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single typed part of a message. The executor only consumes text parts;
/// other kinds are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "data")]
    Data { data: serde_json::Value },

    #[serde(rename = "file")]
    File {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

/// A protocol message: ordered parts plus a role and an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn agent_text(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role: Role::Agent,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Text of the first text-typed part, or "" when the message has none.
    /// A message without text is not an error; it simply contributes no input.
    pub fn first_text(&self) -> &str {
        self.parts
            .iter()
            .find_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }
}
