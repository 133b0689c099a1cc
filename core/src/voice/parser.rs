use log::debug;

use super::patterns::{Capture, parse_number, parse_timestamp, patterns_for, resolve_language};
use super::{ParsedVoiceCommand, VoiceCommandType};

const DEFAULT_SEEK_SECONDS: f64 = 10.0;
const DEFAULT_VOLUME_PERCENT: f64 = 10.0;
const DEFAULT_SPEED_STEP: f64 = 0.25;

/// Parse a transcript into a command using the language's pattern table.
///
/// The first pattern that matches wins. `confidence` comes from the
/// recognizer and is passed through untouched, including for unknown
/// commands.
pub fn parse_voice_command(text: &str, language: &str, confidence: f32) -> ParsedVoiceCommand {
    let language = resolve_language(language);
    let normalized = text.trim().to_lowercase();

    let mut command = ParsedVoiceCommand {
        command_type: VoiceCommandType::Unknown,
        value: None,
        unit: None,
        bookmark_name: None,
        confidence,
        original_text: text.to_string(),
        language: language.to_string(),
    };

    let Some((pattern, captures)) = patterns_for(language)
        .iter()
        .find_map(|p| p.regex.captures(&normalized).map(|c| (p, c)))
    else {
        debug!("No {language} voice pattern matched {text:?}");
        return command;
    };

    command.command_type = pattern.command;
    let group = captures.get(1).map(|m| m.as_str().trim());

    match pattern.capture {
        Capture::None => {}
        Capture::Name => {
            command.bookmark_name = group.filter(|name| !name.is_empty()).map(str::to_string);
        }
        Capture::Seconds => {
            command.value = group.and_then(parse_number);
            command.unit = Some("seconds".to_string());
        }
        Capture::Minutes => {
            command.value = group.and_then(parse_number).map(|minutes| minutes * 60.0);
            command.unit = Some("seconds".to_string());
        }
        Capture::Timestamp => {
            command.value = group.and_then(parse_timestamp);
            command.unit = Some("seconds".to_string());
        }
        Capture::Percent => {
            command.value = group.and_then(parse_number);
            command.unit = Some("percent".to_string());
        }
        Capture::Rate => {
            command.value = group.and_then(parse_number);
            command.unit = Some("x".to_string());
        }
    }

    if command.value.is_none() {
        let default = match command.command_type {
            VoiceCommandType::SeekForward | VoiceCommandType::SeekBackward => {
                Some((DEFAULT_SEEK_SECONDS, "seconds"))
            }
            VoiceCommandType::VolumeUp | VoiceCommandType::VolumeDown => Some((DEFAULT_VOLUME_PERCENT, "percent")),
            VoiceCommandType::SpeedUp | VoiceCommandType::SpeedDown => Some((DEFAULT_SPEED_STEP, "x")),
            _ => None,
        };
        command.value = default.map(|(value, _)| value);
        command.unit = default.map(|(_, unit)| unit.to_string());
    }

    debug!(
        "Parsed {text:?} ({language}) as {} value={:?}",
        command.command_type, command.value
    );
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoiceCommandType::*;

    fn parse(text: &str, language: &str) -> ParsedVoiceCommand {
        parse_voice_command(text, language, 0.9)
    }

    #[test]
    fn test_english_seek_with_value() {
        let command = parse("fast forward 30 seconds", "en");
        assert_eq!(command.command_type, SeekForward);
        assert_eq!(command.value, Some(30.0));
        assert_eq!(command.unit.as_deref(), Some("seconds"));
        assert_eq!(command.confidence, 0.9);
    }

    #[test]
    fn test_chinese_numerals() {
        let command = parse("快轉二十秒", "zh-TW");
        assert_eq!(command.command_type, SeekForward);
        assert_eq!(command.value, Some(20.0));
        assert_eq!(command.unit.as_deref(), Some("seconds"));

        let command = parse("快退三十秒", "zh-CN");
        assert_eq!(command.command_type, SeekBackward);
        assert_eq!(command.value, Some(30.0));
    }

    #[test]
    fn test_unknown_keeps_confidence() {
        let command = parse_voice_command("what a lovely day", "en", 0.42);
        assert_eq!(command.command_type, Unknown);
        assert!(command.is_unknown());
        assert_eq!(command.value, None);
        assert_eq!(command.unit, None);
        assert_eq!(command.confidence, 0.42);
    }

    #[test]
    fn test_defaults_for_quantity_commands() {
        let seek = parse("rewind", "en");
        assert_eq!((seek.command_type, seek.value), (SeekBackward, Some(10.0)));

        let volume = parse("louder", "en");
        assert_eq!((volume.command_type, volume.value), (VolumeUp, Some(10.0)));
        assert_eq!(volume.unit.as_deref(), Some("percent"));

        let speed = parse("slow down", "en");
        assert_eq!((speed.command_type, speed.value), (SpeedDown, Some(0.25)));
    }

    #[test]
    fn test_multi_word_numbers() {
        for text in ["fast forward forty five seconds", "fast forward forty-five seconds"] {
            let command = parse(text, "en");
            assert_eq!((command.command_type, command.value), (SeekForward, Some(45.0)), "{text}");
        }
        assert_eq!(parse("rewind forty seconds", "en").value, Some(40.0));

        let es = parse("adelanta cuarenta y cinco segundos", "es");
        assert_eq!((es.command_type, es.value), (SeekForward, Some(45.0)));
        assert_eq!(parse("adelanta un minuto", "es").value, Some(60.0));
    }

    #[test]
    fn test_minutes_become_seconds() {
        let command = parse("skip ahead 2 minutes", "en");
        assert_eq!(command.command_type, SeekForward);
        assert_eq!(command.value, Some(120.0));
        assert_eq!(command.unit.as_deref(), Some("seconds"));
    }

    #[test]
    fn test_jump_to_timestamp() {
        let command = parse("jump to 1:30", "en");
        assert_eq!(command.command_type, JumpTo);
        assert_eq!(command.value, Some(90.0));
    }

    #[test]
    fn test_value_only_on_quantity_types() {
        for text in ["pause", "play", "mute", "unmute", "next video", "exit fullscreen", "replay"] {
            let command = parse(text, "en");
            assert!(!command.command_type.takes_value(), "{text}");
            assert_eq!(command.value, None, "{text}");
        }
    }

    #[test]
    fn test_specific_before_general() {
        assert_eq!(parse("unmute", "en").command_type, Unmute);
        assert_eq!(parse("exit full screen", "en").command_type, ExitFullscreen);
        assert_eq!(parse("play it again", "en").command_type, Replay);
        assert_eq!(parse("取消靜音", "zh-TW").command_type, Unmute);
        assert_eq!(parse("一時停止", "ja").command_type, Pause);
    }

    #[test]
    fn test_bookmarks() {
        let add = parse("add bookmark called the good part", "en");
        assert_eq!(add.command_type, AddBookmark);
        assert_eq!(add.bookmark_name.as_deref(), Some("the good part"));
        assert_eq!(add.value, None);

        let go = parse("go to bookmark intro", "en");
        assert_eq!(go.command_type, GoToBookmark);
        assert_eq!(go.bookmark_name.as_deref(), Some("intro"));
    }

    #[test]
    fn test_other_languages() {
        let es = parse("adelanta 15 segundos", "es-ES");
        assert_eq!((es.command_type, es.value), (SeekForward, Some(15.0)));
        assert_eq!(es.language, "es");

        let ja = parse("30秒早送り", "ja");
        assert_eq!((ja.command_type, ja.value), (SeekForward, Some(30.0)));

        let cn = parse("音量调低", "zh");
        assert_eq!((cn.command_type, cn.value), (VolumeDown, Some(10.0)));
    }

    #[test]
    fn test_unknown_language_uses_english() {
        let command = parse("pause", "de-DE");
        assert_eq!(command.command_type, Pause);
        assert_eq!(command.language, "en");
    }
}
