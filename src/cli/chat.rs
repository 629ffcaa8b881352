use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::prompt::FORCED_TERMINATION;
use crate::core::AppConfig;
use crate::counsel::{CounselError, Counselor};
use crate::openai::{Message, OpenAiClient, Role};

pub async fn run() -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let config = AppConfig::default();
    let client = OpenAiClient::new(
        &config.openai_api_hostname,
        &config.openai_api_key,
        &config.openai_model,
        config.max_output_tokens,
    );
    let counselor = Counselor::new(Box::new(client), &config.system_message, config.max_turns)?;

    // Same as the HTTP API, the system message is never part of the
    // transcript
    let mut history: Vec<Message> = Vec::new();

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                history.push(Message::new(Role::User, line.as_str()));
                match counselor.respond(&history).await {
                    Ok(reply) if reply.is_injection_flagged => {
                        println!("{}", FORCED_TERMINATION);
                        break;
                    }
                    Ok(reply) => {
                        let msg = reply.into_message();
                        println!("{}", msg.content);
                        history.push(msg);
                    }
                    Err(CounselError::ConversationTooLong { .. }) => {
                        println!("{}", FORCED_TERMINATION);
                        break;
                    }
                    Err(CounselError::Upstream(e)) => {
                        // Drop the message so it can be retried
                        history.pop();
                        println!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
