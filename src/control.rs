//! Operator control surface.
//!
//! Parses single-line console commands and runs them against the agent
//! registry. Chats are addressed by their index in registration order, as
//! listed by the help command.
//!
//! ```text
//! s <i> <text>   send text        p <i>         show preamble
//! P <i> <text>   set preamble     d <i>         delete last message
//! g <i>          generate now     h <i> [n]     show history
//! u <i>          pause            c <i>         continue
//! ?              help
//! ```

use std::sync::Arc;

use tracing::info;

use crate::agent::AgentRegistry;
use crate::error::{BaitError, Result};

/// Console help text.
pub const HELP: &str = "\
Commands:
    s <chat_index> <message>  - Send message
    p <chat_index>            - show Preamble
    P <chat_index> <preamble> - set Preamble
    d <chat_index>            - Delete previous message
    g <chat_index>            - Generate new message out of order
    h <chat_index> [n]        - show last n messages in History
    u <chat_index>            - paUse
    c <chat_index>            - Continue
    ?                         - Show this help";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Send arbitrary text
    Send { index: usize, text: String },
    /// Show the preamble
    ShowPreamble { index: usize },
    /// Replace the preamble
    SetPreamble { index: usize, text: String },
    /// Delete the last platform message and retract the last reply
    Delete { index: usize },
    /// Generate a reply now
    Generate { index: usize },
    /// Show the last `n` history entries, or all
    History { index: usize, n: Option<usize> },
    /// Stop the agent
    Pause { index: usize },
    /// Restart the agent
    Continue { index: usize },
    /// List commands and chats
    Help,
}

impl ControlCommand {
    /// Parses one console line.
    ///
    /// Returns `Ok(None)` for a blank line.
    ///
    /// # Errors
    /// Returns `BaitError::Config` for an unknown command, a bad index, or a
    /// missing argument.
    ///
    /// # Example
    /// ```
    /// use baitbot::control::ControlCommand;
    ///
    /// let cmd = ControlCommand::parse("s 0 Hello there").unwrap();
    /// assert_eq!(
    ///     cmd,
    ///     Some(ControlCommand::Send { index: 0, text: "Hello there".into() })
    /// );
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.trim().splitn(3, char::is_whitespace);
        let Some(cmd) = parts.next().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        if cmd == "?" {
            return Ok(Some(ControlCommand::Help));
        }

        let index = parse_index(parts.next())?;
        let args = parts.next().map(str::trim).unwrap_or("");

        let command = match cmd {
            "s" => ControlCommand::Send {
                index,
                text: required(args, "No message specified")?,
            },
            "p" => ControlCommand::ShowPreamble { index },
            "P" => ControlCommand::SetPreamble {
                index,
                text: required(args, "No preamble specified")?,
            },
            "d" => ControlCommand::Delete { index },
            "g" => ControlCommand::Generate { index },
            "h" => {
                let n = if args.is_empty() {
                    None
                } else {
                    Some(
                        args.parse::<usize>()
                            .map_err(|_| BaitError::Config(format!("Invalid number: {}", args)))?,
                    )
                };
                ControlCommand::History { index, n }
            }
            "u" => ControlCommand::Pause { index },
            "c" => ControlCommand::Continue { index },
            other => return Err(BaitError::Config(format!("Unknown command: {}", other))),
        };
        Ok(Some(command))
    }
}

fn parse_index(raw: Option<&str>) -> Result<usize> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BaitError::Config("Missing chat index".into()))?;
    raw.parse()
        .map_err(|_| BaitError::Config(format!("Invalid chat index: {}", raw)))
}

fn required(args: &str, missing: &str) -> Result<String> {
    if args.is_empty() {
        Err(BaitError::Config(missing.into()))
    } else {
        Ok(args.to_string())
    }
}

/// Runs console commands against the registry.
pub struct Controller {
    registry: Arc<AgentRegistry>,
}

impl Controller {
    /// Creates a controller for `registry`.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Help text followed by the chat list.
    pub async fn help(&self) -> String {
        let mut out = format!("{}\n\nChats:\n", HELP);
        for (i, chat) in self.registry.chats().await.iter().enumerate() {
            out.push_str(&format!("{}: {} - {}\n", i, chat.id, chat.title));
        }
        out
    }

    /// Executes a command and returns the text to show the operator.
    ///
    /// # Errors
    /// Returns `BaitError::NotFound` for an unknown chat index and propagates
    /// transport failures of send and delete.
    pub async fn execute(&self, command: ControlCommand) -> Result<String> {
        info!(?command, "Executing control command");
        match command {
            ControlCommand::Help => Ok(self.help().await),
            ControlCommand::Send { index, text } => {
                let agent = self.registry.get_by_index(index).await?;
                let id = agent.send_text(&text).await?;
                Ok(format!("Sent message {}", id))
            }
            ControlCommand::ShowPreamble { index } => {
                let agent = self.registry.get_by_index(index).await?;
                Ok(agent.preamble().await)
            }
            ControlCommand::SetPreamble { index, text } => {
                let agent = self.registry.get_by_index(index).await?;
                agent.set_preamble(&text).await;
                Ok("Preamble updated".to_string())
            }
            ControlCommand::Delete { index } => {
                let agent = self.registry.get_by_index(index).await?;
                agent.retract_last_reply().await?;
                Ok("Deleted last message".to_string())
            }
            ControlCommand::Generate { index } => {
                let agent = self.registry.get_by_index(index).await?;
                agent.generate_now().await;
                Ok("Reply scheduled".to_string())
            }
            ControlCommand::History { index, n } => {
                let agent = self.registry.get_by_index(index).await?;
                Ok(agent.history_lines(n).await.join("\n"))
            }
            ControlCommand::Pause { index } => {
                let agent = self.registry.get_by_index(index).await?;
                agent.stop().await;
                Ok("Paused".to_string())
            }
            ControlCommand::Continue { index } => {
                let agent = self.registry.get_by_index(index).await?;
                agent.start().await?;
                Ok("Continued".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentSettings;
    use crate::channels::MemoryTransport;
    use crate::providers::EchoGenerator;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(ControlCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ControlCommand::parse("?").unwrap(),
            Some(ControlCommand::Help)
        );
        assert_eq!(
            ControlCommand::parse("P 1 Be very polite.").unwrap(),
            Some(ControlCommand::SetPreamble {
                index: 1,
                text: "Be very polite.".into()
            })
        );
        assert_eq!(
            ControlCommand::parse("h 0").unwrap(),
            Some(ControlCommand::History { index: 0, n: None })
        );
        assert_eq!(
            ControlCommand::parse("h 0 5").unwrap(),
            Some(ControlCommand::History {
                index: 0,
                n: Some(5)
            })
        );
        assert_eq!(
            ControlCommand::parse("u 2").unwrap(),
            Some(ControlCommand::Pause { index: 2 })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ControlCommand::parse("x 0").is_err());
        assert!(ControlCommand::parse("g").is_err());
        assert!(ControlCommand::parse("g abc").is_err());
        assert!(ControlCommand::parse("s 0").is_err());
        assert!(ControlCommand::parse("h 0 many").is_err());
    }

    async fn controller() -> (Arc<MemoryTransport>, Arc<AgentRegistry>, Controller) {
        let transport = Arc::new(MemoryTransport::new("111"));
        transport.add_chat("1234567", "Hannah").await;
        let registry = Arc::new(AgentRegistry::new(
            transport.clone(),
            Arc::new(EchoGenerator::new()),
            "111",
            AgentSettings::default(),
        ));
        registry.register("Hannah", None).await.unwrap();
        let controller = Controller::new(Arc::clone(&registry));
        (transport, registry, controller)
    }

    #[tokio::test]
    async fn test_help_lists_chats() {
        let (_t, registry, controller) = controller().await;
        let help = controller.execute(ControlCommand::Help).await.unwrap();
        assert!(help.contains("0: 1234567 - Hannah"));
        registry.teardown().await;
    }

    #[tokio::test]
    async fn test_unknown_index_is_not_found() {
        let (_t, registry, controller) = controller().await;
        let result = controller
            .execute(ControlCommand::Generate { index: 3 })
            .await;
        assert!(matches!(result, Err(BaitError::NotFound(_))));
        registry.teardown().await;
    }

    #[tokio::test]
    async fn test_send_and_preamble_commands() {
        let (transport, registry, controller) = controller().await;
        controller
            .execute(ControlCommand::Send {
                index: 0,
                text: "hello".into(),
            })
            .await
            .unwrap();
        assert_eq!(transport.sent_texts("1234567").await, vec!["hello"]);

        controller
            .execute(ControlCommand::SetPreamble {
                index: 0,
                text: "Be brief.".into(),
            })
            .await
            .unwrap();
        let preamble = controller
            .execute(ControlCommand::ShowPreamble { index: 0 })
            .await
            .unwrap();
        assert_eq!(preamble, "Be brief.");
        registry.teardown().await;
    }

    #[tokio::test]
    async fn test_pause_and_continue() {
        let (_t, registry, controller) = controller().await;
        controller
            .execute(ControlCommand::Pause { index: 0 })
            .await
            .unwrap();
        assert!(!registry.get("1234567").await.unwrap().is_running());
        controller
            .execute(ControlCommand::Continue { index: 0 })
            .await
            .unwrap();
        assert!(registry.get("1234567").await.unwrap().is_running());
        registry.teardown().await;
    }
}
