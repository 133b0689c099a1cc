use std::collections::HashMap;

use anyhow::{Result, anyhow};
use log::info;
use parking_lot::Mutex;
use playgate_core::PlayerControl;
use serde::Serialize;

/// Playback state tracked by the console player
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleState {
    pub position: f64,
    pub volume: f64,
    pub muted: bool,
    pub paused: bool,
    pub playback_rate: f64,
    pub fullscreen: bool,
    /// Index into the play queue
    pub track: usize,
    pub bookmarks: HashMap<String, f64>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            position: 0.0,
            volume: 1.0,
            muted: false,
            paused: true,
            playback_rate: 1.0,
            fullscreen: false,
            track: 0,
            bookmarks: HashMap::new(),
        }
    }
}

/// Player that only tracks state and prints what it would do.
/// Stands in for a real video surface when driving the engine from a shell.
#[derive(Debug, Default)]
pub struct ConsolePlayer {
    state: Mutex<ConsoleState>,
}

impl ConsolePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ConsoleState {
        self.state.lock().clone()
    }

    fn act(&self, action: &str, apply: impl FnOnce(&mut ConsoleState)) -> Result<()> {
        let mut state = self.state.lock();
        apply(&mut state);
        info!("player: {action}");
        println!(
            "▶ {action:<16} pos={:.1}s vol={:.0}%{} rate={}x{}",
            state.position,
            state.volume * 100.0,
            if state.muted { " (muted)" } else { "" },
            state.playback_rate,
            if state.paused { " [paused]" } else { "" }
        );
        Ok(())
    }
}

impl PlayerControl for ConsolePlayer {
    fn play(&self) -> Result<()> {
        self.act("play", |s| s.paused = false)
    }

    fn pause(&self) -> Result<()> {
        self.act("pause", |s| s.paused = true)
    }

    fn stop(&self) -> Result<()> {
        self.act("stop", |s| {
            s.paused = true;
            s.position = 0.0;
        })
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(anyhow!("invalid seek target {seconds}"));
        }
        self.act("seek", |s| s.position = seconds.max(0.0))
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        self.act("volume", |s| s.volume = volume.clamp(0.0, 1.0))
    }

    fn mute(&self) -> Result<()> {
        self.act("mute", |s| s.muted = true)
    }

    fn unmute(&self) -> Result<()> {
        self.act("unmute", |s| s.muted = false)
    }

    fn forward10(&self) -> Result<()> {
        self.act("forward 10s", |s| s.position += 10.0)
    }

    fn rewind10(&self) -> Result<()> {
        self.act("rewind 10s", |s| s.position = (s.position - 10.0).max(0.0))
    }

    fn position(&self) -> Option<f64> {
        Some(self.state.lock().position)
    }

    fn volume(&self) -> Option<f64> {
        Some(self.state.lock().volume)
    }

    fn playback_rate(&self) -> Option<f64> {
        Some(self.state.lock().playback_rate)
    }

    fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.act("speed", |s| s.playback_rate = rate)
    }

    fn enter_fullscreen(&self) -> Result<()> {
        self.act("fullscreen", |s| s.fullscreen = true)
    }

    fn exit_fullscreen(&self) -> Result<()> {
        self.act("exit fullscreen", |s| s.fullscreen = false)
    }

    fn next(&self) -> Result<()> {
        self.act("next", |s| {
            s.track += 1;
            s.position = 0.0;
        })
    }

    fn previous(&self) -> Result<()> {
        self.act("previous", |s| {
            s.track = s.track.saturating_sub(1);
            s.position = 0.0;
        })
    }

    fn add_bookmark(&self, name: Option<&str>) -> Result<()> {
        self.act("bookmark", |s| {
            let name = name
                .map(str::to_string)
                .unwrap_or_else(|| format!("bookmark {}", s.bookmarks.len() + 1));
            s.bookmarks.insert(name, s.position);
        })
    }

    fn go_to_bookmark(&self, name: Option<&str>) -> Result<()> {
        let target = {
            let state = self.state.lock();
            match name {
                Some(name) => state.bookmarks.get(name).copied(),
                // Furthest bookmark
                None => state.bookmarks.values().copied().reduce(f64::max),
            }
        };
        let target = target.ok_or_else(|| anyhow!("no bookmark named {:?}", name.unwrap_or("")))?;
        self.act("go to bookmark", |s| s.position = target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playgate_core::control::dispatch;
    use playgate_core::parse_voice_command;

    #[test]
    fn test_voice_commands_drive_state() {
        let player = ConsolePlayer::new();
        for text in ["play", "jump to 2:00", "fast forward 30 seconds", "turn it down by 50", "faster"] {
            dispatch(&player, &parse_voice_command(text, "en", 0.95)).unwrap();
        }

        let state = player.snapshot();
        assert!(!state.paused);
        assert_eq!(state.position, 150.0);
        assert_eq!(state.volume, 0.5);
        assert_eq!(state.playback_rate, 1.25);
    }

    #[test]
    fn test_bookmarks_round_trip() {
        let player = ConsolePlayer::new();
        player.seek(42.0).unwrap();
        player.add_bookmark(Some("intro")).unwrap();
        player.seek(100.0).unwrap();
        player.go_to_bookmark(Some("intro")).unwrap();
        assert_eq!(player.snapshot().position, 42.0);
        assert!(player.go_to_bookmark(Some("missing")).is_err());
    }
}
