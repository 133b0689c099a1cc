use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod app;
mod asr;
mod commands;
mod console;
mod probe;

use app::App;

/// Resolve video URLs, check playback eligibility and drive a player by voice
#[derive(Parser, Debug)]
#[command(name = "playgate", version, about)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a URL and show which player would handle it
    Detect {
        url: String,
        /// Membership tier: free, premium or pro
        #[arg(long, default_value = "free")]
        tier: String,
        #[arg(long, value_enum, default_value_t = PlatformArg::Web)]
        platform: PlatformArg,
        #[arg(long)]
        age_verified: bool,
    },
    /// Resolve a URL into a playable source
    Resolve {
        url: String,
        /// Also fetch title, duration and thumbnail
        #[arg(long)]
        metadata: bool,
    },
    /// Show the embed strategies for a social media post
    Embed {
        url: String,
        /// Load each strategy over HTTP until one succeeds
        #[arg(long)]
        probe: bool,
    },
    /// Parse a single utterance and run it against the console player
    Voice {
        text: String,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long, default_value_t = 1.0)]
        confidence: f32,
        /// Confirm automatically when the command lands in the confirmation band
        #[arg(long)]
        confirm: bool,
    },
    /// Read utterances from stdin as a continuous recognizer would
    Listen {
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Show or change persisted voice settings
    Settings {
        #[arg(long, value_enum)]
        always_listening: Option<Toggle>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlatformArg {
    Ios,
    Android,
    Web,
}

impl From<PlatformArg> for playgate_core::Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Self::Ios,
            PlatformArg::Android => Self::Android,
            PlatformArg::Web => Self::Web,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = App::new(cli.settings).context("Failed to initialise playgate")?;

    match cli.command {
        Command::Detect {
            url,
            tier,
            platform,
            age_verified,
        } => app.detect(&url, &tier, platform.into(), age_verified),
        Command::Resolve { url, metadata } => app.resolve(&url, metadata).await,
        Command::Embed { url, probe } => app.embed(&url, probe).await,
        Command::Voice {
            text,
            lang,
            confidence,
            confirm,
        } => app.voice(&text, &lang, confidence, confirm).await,
        Command::Listen { lang } => app.listen(&lang).await,
        Command::Settings { always_listening } => {
            app.settings(always_listening.map(|toggle| matches!(toggle, Toggle::On)))
        }
    }
}
