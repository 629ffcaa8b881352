use anyhow::Result;

use super::rules::{Directives, Rule};
use crate::ai::prompt::{DIRECTIVE_MARKER, INJECTION_SENTINEL};
use crate::openai::{BoxedCompletionClient, Message, Role};

#[derive(Debug, thiserror::Error)]
pub enum CounselError {
    #[error("conversation has {turns} messages which exceeds the maximum of {max}")]
    ConversationTooLong { turns: usize, max: usize },
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// The assistant's reply after validation retries and truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReply {
    pub content: String,
    pub is_injection_flagged: bool,
    /// Rules that were violated and triggered a corrective retry, in
    /// the order they fired
    pub retried: Vec<Rule>,
}

impl ValidatedReply {
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
        }
    }
}

/// Runs one counseling turn: length guard, completion, validation
/// retries and post-processing. Holds no per-conversation state, the
/// caller always passes the full transcript.
pub struct Counselor {
    client: BoxedCompletionClient,
    system_message: Message,
    directives: Directives,
    max_turns: usize,
}

impl Counselor {
    pub fn new(
        client: BoxedCompletionClient,
        system_message: &str,
        max_turns: usize,
    ) -> Result<Self> {
        Ok(Self {
            client,
            system_message: Message::new(Role::System, system_message),
            directives: Directives::render()?,
            max_turns,
        })
    }

    /// Get the next assistant reply for `transcript`.
    ///
    /// Each rule in `Rule::ALL` that applies and fails triggers exactly
    /// one more completion with that rule's directive appended to the
    /// last caller message. The retried reply replaces the working
    /// reply and is not re-checked against the rule that caused it.
    pub async fn respond(&self, transcript: &[Message]) -> Result<ValidatedReply, CounselError> {
        if transcript.len() > self.max_turns {
            return Err(CounselError::ConversationTooLong {
                turns: transcript.len(),
                max: self.max_turns,
            });
        }

        let messages = self.outbound(transcript);
        let mut reply = self.client.complete(&messages).await?.content;
        let mut retried = Vec::new();

        for rule in Rule::ALL {
            if !rule.applies(transcript.len()) || rule.is_satisfied_by(&reply) {
                continue;
            }
            tracing::debug!("Reply violated the {} rule, retrying", rule);

            let corrected = with_directive(&messages, self.directives.for_rule(rule));
            reply = self.client.complete(&corrected).await?.content;
            retried.push(rule);
        }

        let is_injection_flagged = reply.contains(INJECTION_SENTINEL);
        if is_injection_flagged {
            tracing::warn!("Reply flagged a prompt injection attempt");
        }

        Ok(ValidatedReply {
            content: truncate_at_marker(&reply).to_string(),
            is_injection_flagged,
            retried,
        })
    }

    /// System message followed by the caller's messages.
    fn outbound(&self, transcript: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(self.system_message.clone());
        messages.extend_from_slice(transcript);
        messages
    }
}

/// Copy of `messages` with `directive` appended to the last caller
/// message. `messages` always starts with the system message so a
/// list of one has no caller message to append to and the directive
/// is sent on its own.
fn with_directive(messages: &[Message], directive: &str) -> Vec<Message> {
    let mut corrected = messages.to_vec();
    if corrected.len() > 1 {
        if let Some(last) = corrected.last_mut() {
            last.content = format!("{}\n\n{}", last.content, directive);
        }
    } else {
        corrected.push(Message::new(Role::User, directive));
    }
    corrected
}

/// Everything before the first echoed directive marker.
fn truncate_at_marker(reply: &str) -> &str {
    match reply.find(DIRECTIVE_MARKER) {
        Some(idx) => &reply[..idx],
        None => reply,
    }
}
