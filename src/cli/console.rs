//! Interactive operator console on stdin.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use baitbot::control::{ControlCommand, Controller};

const PROMPT: &str = "\nCommand (? for help)> ";

/// Reads commands from stdin until EOF, printing each result.
///
/// Command failures are reported to the operator and never end the loop.
pub(crate) async fn run_console(controller: &Controller) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(controller.help().await.as_bytes()).await?;
    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("Console input closed");
            return Ok(());
        };

        let output = match ControlCommand::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => match controller.execute(command).await {
                Ok(text) => text,
                Err(e) => format!("Error: {}", e),
            },
            Err(e) => format!("Error: {}", e),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
}
