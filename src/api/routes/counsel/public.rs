//! Public types for the counsel API
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::openai::{Message, Role};

/// One message of the transcript as the caller sent it. Fields other
/// than `role` and `content` are kept so they can be echoed back but
/// are never forwarded upstream.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TranscriptEntry {
    pub fn to_message(&self) -> Message {
        Message::new(self.role, &self.content)
    }
}

impl From<Message> for TranscriptEntry {
    fn from(msg: Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            extra: Map::new(),
        }
    }
}

/// Request to get the next counseling reply
#[derive(Debug, Deserialize)]
pub struct CounselRequest {
    pub prompts: Vec<TranscriptEntry>,
}

/// The caller's transcript with the assistant reply appended
#[derive(Debug, Serialize, Deserialize)]
pub struct CounselResponse {
    pub prompts: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
}
