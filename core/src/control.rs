//! Generic player control surface and voice-command dispatch.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::voice::{ParsedVoiceCommand, VoiceCommandType};

pub const MIN_PLAYBACK_RATE: f64 = 0.25;
pub const MAX_PLAYBACK_RATE: f64 = 3.0;

/// Control surface every concrete player exposes.
///
/// All commands default to a no-op so a player only implements what it
/// supports; dispatch never fails just because a method is missing.
pub trait PlayerControl: Send + Sync {
    fn play(&self) -> Result<()> {
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }

    /// Seek to an absolute position in seconds
    fn seek(&self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    /// Volume in `0.0..=1.0`
    fn set_volume(&self, _volume: f64) -> Result<()> {
        Ok(())
    }

    fn mute(&self) -> Result<()> {
        Ok(())
    }

    fn unmute(&self) -> Result<()> {
        Ok(())
    }

    fn forward10(&self) -> Result<()> {
        Ok(())
    }

    fn rewind10(&self) -> Result<()> {
        Ok(())
    }

    /// Current position in seconds, if the player reports it
    fn position(&self) -> Option<f64> {
        None
    }

    fn volume(&self) -> Option<f64> {
        None
    }

    fn playback_rate(&self) -> Option<f64> {
        None
    }

    fn set_playback_rate(&self, _rate: f64) -> Result<()> {
        Ok(())
    }

    fn enter_fullscreen(&self) -> Result<()> {
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<()> {
        Ok(())
    }

    fn next(&self) -> Result<()> {
        Ok(())
    }

    fn previous(&self) -> Result<()> {
        Ok(())
    }

    fn add_bookmark(&self, _name: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn go_to_bookmark(&self, _name: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// Argument attached to a control payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSlot {
    Seconds(f64),
    Percent(f64),
    Rate(f64),
    Bookmark(String),
}

/// Normalised command handed to the active player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPayload {
    pub intent: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ControlSlot>,
}

impl ControlPayload {
    pub fn from_command(command: &ParsedVoiceCommand) -> Self {
        use VoiceCommandType::*;

        let intent = match command.command_type {
            Play | Pause | Stop | Replay => "playback",
            SeekForward | SeekBackward | JumpTo => "seek",
            VolumeUp | VolumeDown | Mute | Unmute => "volume",
            SpeedUp | SpeedDown | SpeedNormal => "speed",
            Fullscreen | ExitFullscreen => "display",
            Next | Previous => "navigation",
            AddBookmark | GoToBookmark => "bookmark",
            Unknown => "unknown",
        };

        let slot = match command.command_type {
            SeekForward | SeekBackward | JumpTo => command.value.map(ControlSlot::Seconds),
            VolumeUp | VolumeDown => command.value.map(ControlSlot::Percent),
            SpeedUp | SpeedDown => command.value.map(ControlSlot::Rate),
            AddBookmark | GoToBookmark => command.bookmark_name.clone().map(ControlSlot::Bookmark),
            _ => None,
        };

        Self {
            intent: intent.to_string(),
            action: command.command_type.as_str().to_string(),
            slot,
        }
    }
}

/// Run a parsed command against a player. Returns the payload that was
/// dispatched.
pub fn dispatch(player: &dyn PlayerControl, command: &ParsedVoiceCommand) -> Result<ControlPayload> {
    use VoiceCommandType::*;

    let payload = ControlPayload::from_command(command);
    debug!("Dispatching {} / {} ({:?})", payload.intent, payload.action, payload.slot);

    match command.command_type {
        Play => player.play()?,
        Pause => player.pause()?,
        Stop => player.stop()?,
        Replay => {
            player.seek(0.0)?;
            player.play()?;
        }
        SeekForward => match command.value.unwrap_or(10.0) {
            v if v == 10.0 => player.forward10()?,
            v => player.seek(current_position(player)? + v)?,
        },
        SeekBackward => match command.value.unwrap_or(10.0) {
            v if v == 10.0 => player.rewind10()?,
            v => player.seek((current_position(player)? - v).max(0.0))?,
        },
        JumpTo => {
            let target = command
                .value
                .ok_or_else(|| anyhow!("jump_to needs a position"))?;
            player.seek(target.max(0.0))?;
        }
        VolumeUp | VolumeDown => {
            let step = command.value.unwrap_or(10.0) / 100.0;
            let step = if command.command_type == VolumeDown { -step } else { step };
            let current = player.volume().unwrap_or(1.0);
            player.set_volume((current + step).clamp(0.0, 1.0))?;
        }
        Mute => player.mute()?,
        Unmute => player.unmute()?,
        SpeedUp | SpeedDown => {
            let step = command.value.unwrap_or(0.25);
            let step = if command.command_type == SpeedDown { -step } else { step };
            let current = player.playback_rate().unwrap_or(1.0);
            player.set_playback_rate((current + step).clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE))?;
        }
        SpeedNormal => player.set_playback_rate(1.0)?,
        Fullscreen => player.enter_fullscreen()?,
        ExitFullscreen => player.exit_fullscreen()?,
        Next => player.next()?,
        Previous => player.previous()?,
        AddBookmark => player.add_bookmark(command.bookmark_name.as_deref())?,
        GoToBookmark => player.go_to_bookmark(command.bookmark_name.as_deref())?,
        Unknown => return Err(anyhow!("cannot dispatch an unrecognised command")),
    }

    Ok(payload)
}

fn current_position(player: &dyn PlayerControl) -> Result<f64> {
    player
        .position()
        .ok_or_else(|| anyhow!("player does not report its position"))
}

/// The player that currently receives commands
#[derive(Default, Clone)]
pub struct ActivePlayer {
    inner: Arc<RwLock<Option<Arc<dyn PlayerControl>>>>,
}

impl ActivePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, player: Arc<dyn PlayerControl>) {
        *self.inner.write() = Some(player);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn current(&self) -> Option<Arc<dyn PlayerControl>> {
        self.inner.read().clone()
    }
}

impl std::fmt::Debug for ActivePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivePlayer")
            .field("active", &self.inner.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::parse_voice_command;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        position: Option<f64>,
        volume: Option<f64>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl PlayerControl for Recorder {
        fn play(&self) -> Result<()> {
            self.calls.lock().push("play".into());
            Ok(())
        }

        fn seek(&self, seconds: f64) -> Result<()> {
            self.calls.lock().push(format!("seek {seconds}"));
            Ok(())
        }

        fn forward10(&self) -> Result<()> {
            self.calls.lock().push("forward10".into());
            Ok(())
        }

        fn set_volume(&self, volume: f64) -> Result<()> {
            self.calls.lock().push(format!("volume {volume:.2}"));
            Ok(())
        }

        fn position(&self) -> Option<f64> {
            self.position
        }

        fn volume(&self) -> Option<f64> {
            self.volume
        }
    }

    struct Silent;
    impl PlayerControl for Silent {}

    #[test]
    fn test_missing_methods_are_noops() {
        for text in ["pause", "mute", "fullscreen", "next video", "normal speed"] {
            let command = parse_voice_command(text, "en", 0.9);
            assert_ne!(command.command_type, VoiceCommandType::Unknown, "{text}");
            dispatch(&Silent, &command).unwrap();
        }
    }

    #[test]
    fn test_seek_uses_position() {
        let player = Recorder {
            position: Some(100.0),
            ..Default::default()
        };
        let payload = dispatch(&player, &parse_voice_command("fast forward 30 seconds", "en", 0.9)).unwrap();
        assert_eq!(player.calls(), vec!["seek 130"]);
        assert_eq!(payload.intent, "seek");
        assert_eq!(payload.action, "seek_forward");
        assert_eq!(payload.slot, Some(ControlSlot::Seconds(30.0)));
    }

    #[test]
    fn test_ten_second_seek_uses_shortcut() {
        let player = Recorder::default();
        dispatch(&player, &parse_voice_command("skip forward", "en", 0.9)).unwrap();
        assert_eq!(player.calls(), vec!["forward10"]);
    }

    #[test]
    fn test_seek_without_position_fails() {
        let err = dispatch(&Silent, &parse_voice_command("rewind 45 seconds", "en", 0.9)).unwrap_err();
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn test_volume_is_clamped() {
        let player = Recorder {
            volume: Some(0.95),
            ..Default::default()
        };
        dispatch(&player, &parse_voice_command("volume up 20", "en", 0.9)).unwrap();
        assert_eq!(player.calls(), vec!["volume 1.00"]);
    }

    #[test]
    fn test_unknown_is_rejected() {
        let command = parse_voice_command("make me a sandwich", "en", 0.9);
        assert!(dispatch(&Silent, &command).is_err());
    }

    #[test]
    fn test_active_player_swap() {
        let active = ActivePlayer::new();
        assert!(active.current().is_none());

        let player: Arc<dyn PlayerControl> = Arc::new(Recorder::default());
        active.set(player.clone());
        assert!(Arc::ptr_eq(&active.current().unwrap(), &player));

        active.clear();
        assert!(active.current().is_none());
    }
}
