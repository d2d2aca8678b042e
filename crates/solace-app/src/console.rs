//! Interactive terminal chat.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use solace_chat::ChatbotEngine;
use solace_core::error::Result;

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

fn print_banner(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{:^70}", " Solace - Interactive Console ")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;
    writeln!(out, "Welcome! I'm here to support you using CBT techniques.")?;
    writeln!(out, "Type 'quit' or 'exit' to end the conversation.")?;
    writeln!(out, "Type 'help' for available commands.")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)
}

fn print_help(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "{:^70}", " Available Commands ")?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "  quit/exit   - End the conversation")?;
    writeln!(out, "  help        - Show this help message")?;
    writeln!(out, "  history     - Show conversation history")?;
    writeln!(out, "  clear       - Start a new session")?;
    writeln!(out, "  summary     - Show session summary")?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out)
}

/// Run the prompt loop until `quit`/`exit` or end of input.
pub async fn run_console<R, W>(engine: &ChatbotEngine, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    print_banner(out)?;

    let mut session_id = engine.create_session(None)?;
    tracing::debug!(session = %session_id, "Console session started");
    let mut lines = input.lines();

    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out, "\n\nTake care!")?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" | "exit" => {
                writeln!(
                    out,
                    "\nTake care! Remember, seeking professional help is always a good step."
                )?;
                break;
            }
            "help" => print_help(out)?,
            "history" => match engine.get_conversation_export(&session_id)? {
                Some(turns) if !turns.is_empty() => {
                    writeln!(out, "\nConversation History:")?;
                    for (i, turn) in turns.iter().enumerate() {
                        writeln!(out, "\n{}. You: {}", i + 1, turn.user)?;
                        writeln!(out, "   Bot: {}", turn.assistant)?;
                    }
                }
                _ => writeln!(out, "\nNo conversation history yet.")?,
            },
            "clear" => {
                session_id = engine.create_session(None)?;
                writeln!(out, "\nStarted new session.")?;
            }
            "summary" => {
                if let Some(summary) = engine.get_session_summary(&session_id)? {
                    writeln!(out, "\nSession Summary:")?;
                    writeln!(out, "   Messages: {}", summary.message_count)?;
                    writeln!(out, "   Duration: {} minutes", summary.duration_minutes)?;
                }
            }
            _ => match engine.process_message(Some(session_id), line).await {
                Ok(result) => {
                    session_id = result.session_id;
                    writeln!(out, "\nBot: {}", result.response)?;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Console message failed");
                    writeln!(out, "\nSorry, I encountered an error. Please try again.")?;
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use solace_backends::RuleBasedModel;
    use solace_chat::{CapabilityGuard, HybridResponseGenerator, MergePolicy, MockEmbedding};
    use solace_chat::{BackendError, TextGenerator};
    use solace_core::types::{HistoryEntry, SessionContext};

    struct EchoGeneral;

    #[async_trait::async_trait]
    impl TextGenerator for EchoGeneral {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            message: &str,
            _history: &[HistoryEntry],
            _context: &SessionContext,
        ) -> std::result::Result<String, BackendError> {
            Ok(format!("echo {}", message))
        }
    }

    fn engine() -> ChatbotEngine {
        ChatbotEngine::new(HybridResponseGenerator::new(
            Arc::new(RuleBasedModel::new()),
            Arc::new(EchoGeneral),
            Arc::new(MockEmbedding::new()),
            MergePolicy::default(),
            CapabilityGuard::new(Duration::from_secs(5)),
        ))
    }

    async fn run(engine: &ChatbotEngine, script: &str) -> String {
        let mut out = Vec::new();
        run_console(engine, script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_chat_then_history_and_summary() {
        let engine = engine();
        let out = run(&engine, "hello\n\nhistory\nsummary\nquit\n").await;

        assert!(out.contains("Bot: echo hello"));
        assert!(out.contains("1. You: hello"));
        assert!(out.contains("Messages: 1"));
        assert!(out.contains("seeking professional help"));
        assert_eq!(engine.session_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_starts_fresh_session() {
        let engine = engine();
        let out = run(&engine, "hello\nclear\nhistory\nexit\n").await;

        assert!(out.contains("Started new session."));
        assert!(out.contains("No conversation history yet."));
        assert_eq!(engine.session_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let engine = engine();
        let out = run(&engine, "HELP\n").await;
        assert!(out.contains("Available Commands"));
        assert!(out.trim_end().ends_with("Take care!"));
    }
}
