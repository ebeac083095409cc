use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::item::Item;
use crate::notify::{NotifyOutcome, NotifyResult, Notifier, format_message};

pub const DEFAULT_COMMAND: &str = "openclaw";

/// Sends messages through an external messaging CLI.
///
/// Runs `<program> message send --target <target> --message <text>` with each
/// value passed as its own argument. No shell is involved, so item text is
/// never interpreted.
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, target: &str, message: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["message", "send", "--target", target, "--message", message])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, items: &[Item], target: &str) -> NotifyResult<NotifyOutcome> {
        let mut outcome = NotifyOutcome::default();

        for item in items {
            let message = format_message(item);
            match self.command(target, &message).output().await {
                Ok(output) if output.status.success() => outcome.delivered += 1,
                Ok(output) => {
                    log::error!(
                        "{} exited with {} for {:?}: {}",
                        self.program,
                        output.status,
                        item.title,
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                    outcome.failed += 1;
                }
                Err(e) => {
                    log::error!("Failed to run {}: {e}", self.program);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
