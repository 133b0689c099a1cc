use anyhow::{Result, anyhow};
use playgate_core::PlayerControl;

use crate::app::{App, StatusLevel};

const HELP: &str = "Speak by typing. 'text @0.7' sets confidence, '!no-speech' simulates an error. \
     Commands: :seek <secs>, :play, :pause, :volume <0-100>, :confirm, :cancel, :status, :quit";

/// What the listen loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    Quit,
}

/// Command handler for the `:` prompt
pub struct CommandHandler;

impl CommandHandler {
    /// Parse and execute a command
    pub async fn execute(app: &App, command_str: &str) -> Result<CommandResult> {
        let parts: Vec<&str> = command_str.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim());

        match cmd.as_str() {
            "seek" | "s" => {
                let args = args.ok_or_else(|| anyhow!("Seek command requires a position argument"))?;
                let position = args
                    .parse::<f64>()
                    .map_err(|_| anyhow!("Invalid position: {}", args))?;
                Self::player(app)?.seek(position)?;
            }
            "play" | "p" => Self::player(app)?.play()?,
            "pause" => Self::player(app)?.pause()?,
            "volume" | "vol" | "v" => {
                let args = args.ok_or_else(|| anyhow!("Volume command requires a level argument (0-100)"))?;
                let volume = args
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| anyhow!("Invalid volume: {}", args))?;
                Self::player(app)?.set_volume(f64::from(volume) / 100.0)?;
            }
            "confirm" | "yes" | "y" => match app.processor.confirm().await {
                Some(outcome) => app.report_outcome(&outcome),
                None => app.set_status("Nothing to confirm", StatusLevel::Info),
            },
            "cancel" | "no" | "n" => match app.processor.cancel() {
                Some(command) => app.set_status(format!("Cancelled {}", command.command_type), StatusLevel::Info),
                None => app.set_status("Nothing to cancel", StatusLevel::Info),
            },
            "status" => {
                println!("{}", serde_json::to_string_pretty(&app.player.snapshot())?);
                let settings = app.settings.load()?;
                app.set_status(
                    format!(
                        "{} voice commands used, always listening {}",
                        settings.usage_count,
                        if settings.always_listening { "on" } else { "off" }
                    ),
                    StatusLevel::Info,
                );
            }
            "help" | "h" | "?" => app.set_status(HELP, StatusLevel::Info),
            "quit" | "q" | "exit" => return Ok(CommandResult::Quit),
            _ => return Err(anyhow!("Unknown command: {}", cmd)),
        }

        Ok(CommandResult::Continue)
    }

    fn player(app: &App) -> Result<std::sync::Arc<dyn PlayerControl>> {
        app.active.current().ok_or_else(|| anyhow!("No active player"))
    }
}
