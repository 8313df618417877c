use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use taskdeck_core::api::ConfirmPrompt;

/// Asks on stderr and reads one line from stdin. Anything but y/yes declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, message: &str) -> bool {
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            write!(stderr, "{} [y/N] ", message)?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(err)) => {
                tracing::warn!(target: "taskdeck.confirm", error = %err, "prompt failed, declining");
                false
            }
            Err(err) => {
                tracing::warn!(target: "taskdeck.confirm", error = %err, "prompt task failed, declining");
                false
            }
        }
    }
}
