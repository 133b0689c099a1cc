//! Per-language command pattern tables.
//!
//! Tables are searched top to bottom and the first match wins, so more
//! specific phrasings sit above the general ones.

use once_cell::sync::Lazy;
use regex::Regex;

use super::VoiceCommandType;
use super::VoiceCommandType::*;

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "zh-TW", "zh-CN", "ja", "es"];

/// How the captured group of a pattern is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capture {
    None,
    Seconds,
    /// Normalised to seconds
    Minutes,
    /// `m:ss` or `h:mm:ss`, normalised to seconds
    Timestamp,
    Percent,
    Rate,
    /// Free text naming a bookmark
    Name,
}

#[derive(Debug)]
pub(crate) struct CommandPattern {
    pub regex: Regex,
    pub command: VoiceCommandType,
    pub capture: Capture,
}

// Multi-word numerals must precede their first word: alternation is leftmost-first.
const EN_NUM: &str = r"(\d+(?:\.\d+)?|forty[ -]five|one|two|three|five|ten|fifteen|twenty|thirty|forty|fifty|sixty|ninety)";
const ES_NUM: &str = r"(\d+(?:[.,]\d+)?|cuarenta y cinco|uno|una|un|dos|tres|cinco|diez|quince|veinte|treinta|cuarenta|cincuenta|sesenta)";
const CJK_NUM: &str = r"(\d+(?:\.\d+)?|[零一二兩两三四五六七八九十百]+)";

fn table(num: &str, entries: &[(&str, VoiceCommandType, Capture)]) -> Vec<CommandPattern> {
    entries
        .iter()
        .map(|(pattern, command, capture)| CommandPattern {
            regex: Regex::new(&format!("(?i){}", pattern.replace("NUM", num)))
                .expect("voice pattern must compile"),
            command: *command,
            capture: *capture,
        })
        .collect()
}

static EN: Lazy<Vec<CommandPattern>> = Lazy::new(|| {
    table(
        EN_NUM,
        &[
            (r"\b(?:go|jump|skip) to bookmark(?: (.+))?$", GoToBookmark, Capture::Name),
            (r"\b(?:add|set|create|save)(?: a)? bookmark(?: (?:called|named) (.+))?$", AddBookmark, Capture::Name),
            (r"\bbookmark this\b", AddBookmark, Capture::None),
            (r"\b(?:go|jump|skip) to (\d{1,2}(?::\d{2}){1,2})\b", JumpTo, Capture::Timestamp),
            (r"\b(?:go|jump|skip) to (?:minute )?NUM ?(?:minutes?|mins?)\b", JumpTo, Capture::Minutes),
            (r"\b(?:go|jump|skip) to (?:second )?NUM(?: ?(?:seconds?|secs?))?\b", JumpTo, Capture::Seconds),
            (r"\b(?:play )?next(?: video| one| episode)?\b", Next, Capture::None),
            (r"\b(?:play )?previous(?: video| one| episode)?\b|\blast video\b", Previous, Capture::None),
            (r"\b(?:fast forward|forward|skip ahead|skip forward|skip|go forward|ahead) (?:by )?NUM ?(?:minutes?|mins?)\b", SeekForward, Capture::Minutes),
            (r"\b(?:fast forward|forward|skip ahead|skip forward|skip|go forward|ahead) (?:by )?NUM(?: ?(?:seconds?|secs?))?\b", SeekForward, Capture::Seconds),
            (r"\b(?:fast forward|skip ahead|skip forward|go forward)\b", SeekForward, Capture::None),
            (r"\b(?:rewind|go back|skip back|back|backward) (?:by )?NUM ?(?:minutes?|mins?)\b", SeekBackward, Capture::Minutes),
            (r"\b(?:rewind|go back|skip back|back|backward) (?:by )?NUM(?: ?(?:seconds?|secs?))?\b", SeekBackward, Capture::Seconds),
            (r"\b(?:rewind|go back|skip back)\b", SeekBackward, Capture::None),
            (r"\b(?:normal speed|reset (?:the )?speed|speed normal|regular speed)\b", SpeedNormal, Capture::None),
            (r"\b(?:speed up|faster|increase (?:the )?speed)(?: by NUM)?\b", SpeedUp, Capture::Rate),
            (r"\b(?:slow down|slower|decrease (?:the )?speed)(?: by NUM)?\b", SpeedDown, Capture::Rate),
            (r"\b(?:volume up|turn (?:it |the volume )?up|louder|increase (?:the )?volume|raise (?:the )?volume)(?: (?:by )?NUM ?(?:%|percent)?)?", VolumeUp, Capture::Percent),
            (r"\b(?:volume down|turn (?:it |the volume )?down|quieter|decrease (?:the )?volume|lower (?:the )?volume)(?: (?:by )?NUM ?(?:%|percent)?)?", VolumeDown, Capture::Percent),
            (r"\b(?:unmute|sound on)\b", Unmute, Capture::None),
            (r"\b(?:mute|sound off|silence)\b", Mute, Capture::None),
            (r"\b(?:exit|leave|close) full ?screen\b", ExitFullscreen, Capture::None),
            (r"\bfull ?screen\b", Fullscreen, Capture::None),
            (r"\b(?:replay|restart|start over|play (?:it )?again)\b", Replay, Capture::None),
            (r"\bstop\b", Stop, Capture::None),
            (r"\b(?:pause|hold on|wait)\b", Pause, Capture::None),
            (r"\b(?:play|resume|continue|start)\b", Play, Capture::None),
        ],
    )
});

static ES: Lazy<Vec<CommandPattern>> = Lazy::new(|| {
    table(
        ES_NUM,
        &[
            (r"\b(?:ir|ve|volver) al marcador(?: (.+))?$", GoToBookmark, Capture::Name),
            (r"\b(?:agregar|añadir|guardar|crear)(?: un)? marcador(?: (?:llamado|con nombre) (.+))?$", AddBookmark, Capture::Name),
            (r"\b(?:ir|ve|salta|saltar) a(?:l)? (\d{1,2}(?::\d{2}){1,2})\b", JumpTo, Capture::Timestamp),
            (r"\b(?:ir|ve|salta|saltar) al minuto NUM\b", JumpTo, Capture::Minutes),
            (r"\b(?:ir|ve|salta|saltar) al segundo NUM\b", JumpTo, Capture::Seconds),
            (r"\b(?:siguiente|próximo) (?:video|vídeo)?|\bsiguiente\b", Next, Capture::None),
            (r"\banterior\b", Previous, Capture::None),
            (r"\b(?:adelanta|adelantar|avanza|avanzar) NUM minutos?\b", SeekForward, Capture::Minutes),
            (r"\b(?:adelanta|adelantar|avanza|avanzar) NUM(?: segundos?)?\b", SeekForward, Capture::Seconds),
            (r"\b(?:adelanta|adelantar|avanza|avanzar)\b", SeekForward, Capture::None),
            (r"\b(?:retrocede|retroceder|atrasa|atrasar) NUM minutos?\b", SeekBackward, Capture::Minutes),
            (r"\b(?:retrocede|retroceder|atrasa|atrasar) NUM(?: segundos?)?\b", SeekBackward, Capture::Seconds),
            (r"\b(?:retrocede|retroceder|atrasa|atrasar)\b", SeekBackward, Capture::None),
            (r"\bvelocidad normal\b", SpeedNormal, Capture::None),
            (r"(?:más rápido|mas rapido|acelera|acelerar)", SpeedUp, Capture::Rate),
            (r"(?:más lento|mas lento|despacio)", SpeedDown, Capture::Rate),
            (r"\b(?:sube|subir)(?: el)? volumen(?: NUM ?(?:%|por ciento)?)?", VolumeUp, Capture::Percent),
            (r"\b(?:baja|bajar)(?: el)? volumen(?: NUM ?(?:%|por ciento)?)?", VolumeDown, Capture::Percent),
            (r"\b(?:activar sonido|quitar silencio|con sonido)\b", Unmute, Capture::None),
            (r"\b(?:silenciar|silencio|sin sonido)\b", Mute, Capture::None),
            (r"\bsalir de pantalla completa\b", ExitFullscreen, Capture::None),
            (r"\bpantalla completa\b", Fullscreen, Capture::None),
            (r"\b(?:repetir|reiniciar|otra vez|de nuevo)\b", Replay, Capture::None),
            (r"\b(?:detener|detén|parar)\b", Stop, Capture::None),
            (r"\b(?:pausa|pausar|espera)\b", Pause, Capture::None),
            (r"\b(?:reproducir|reproduce|continuar|continúa|sigue|play)\b", Play, Capture::None),
        ],
    )
});

static ZH_TW: Lazy<Vec<CommandPattern>> = Lazy::new(|| {
    table(
        CJK_NUM,
        &[
            (r"(?:前往|跳到|回到)書籤\s*(.+)?$", GoToBookmark, Capture::Name),
            (r"(?:加入|新增|添加)書籤\s*(.+)?$", AddBookmark, Capture::Name),
            (r"(?:跳到|跳至|轉到)\s*(\d{1,2}(?::\d{2}){1,2})", JumpTo, Capture::Timestamp),
            (r"(?:跳到|跳至|轉到)(?:第)?\s*NUM\s*分(?:鐘)?", JumpTo, Capture::Minutes),
            (r"(?:跳到|跳至|轉到)(?:第)?\s*NUM\s*秒", JumpTo, Capture::Seconds),
            (r"下一(?:個|部|集)", Next, Capture::None),
            (r"上一(?:個|部|集)", Previous, Capture::None),
            (r"(?:快轉|快進|前進)\s*NUM\s*分(?:鐘)?", SeekForward, Capture::Minutes),
            (r"(?:快轉|快進|前進)\s*NUM\s*秒?", SeekForward, Capture::Seconds),
            (r"(?:快轉|快進|前進)", SeekForward, Capture::None),
            (r"(?:倒轉|倒退|後退)\s*NUM\s*分(?:鐘)?", SeekBackward, Capture::Minutes),
            (r"(?:倒轉|倒退|後退)\s*NUM\s*秒?", SeekBackward, Capture::Seconds),
            (r"(?:倒轉|倒退|後退)", SeekBackward, Capture::None),
            (r"(?:正常速度|恢復速度|一般速度)", SpeedNormal, Capture::None),
            (r"(?:加速|快一點|加快)", SpeedUp, Capture::Rate),
            (r"(?:減速|慢一點|放慢)", SpeedDown, Capture::Rate),
            (r"(?:音量調高|調高音量|大聲一點|大聲點|音量加大)\s*(?:NUM)?", VolumeUp, Capture::Percent),
            (r"(?:音量調低|調低音量|小聲一點|小聲點|音量減小)\s*(?:NUM)?", VolumeDown, Capture::Percent),
            (r"(?:取消靜音|解除靜音|開啟聲音)", Unmute, Capture::None),
            (r"(?:靜音|關閉聲音)", Mute, Capture::None),
            (r"(?:退出|離開|關閉)全螢幕", ExitFullscreen, Capture::None),
            (r"全螢幕", Fullscreen, Capture::None),
            (r"(?:重播|重新播放|從頭播放)", Replay, Capture::None),
            (r"(?:暫停)", Pause, Capture::None),
            (r"(?:停止)", Stop, Capture::None),
            (r"(?:播放|繼續)", Play, Capture::None),
        ],
    )
});

static ZH_CN: Lazy<Vec<CommandPattern>> = Lazy::new(|| {
    table(
        CJK_NUM,
        &[
            (r"(?:前往|跳到|回到)书签\s*(.+)?$", GoToBookmark, Capture::Name),
            (r"(?:加入|新增|添加)书签\s*(.+)?$", AddBookmark, Capture::Name),
            (r"(?:跳到|跳至|转到)\s*(\d{1,2}(?::\d{2}){1,2})", JumpTo, Capture::Timestamp),
            (r"(?:跳到|跳至|转到)(?:第)?\s*NUM\s*分(?:钟)?", JumpTo, Capture::Minutes),
            (r"(?:跳到|跳至|转到)(?:第)?\s*NUM\s*秒", JumpTo, Capture::Seconds),
            (r"下一(?:个|部|集)", Next, Capture::None),
            (r"上一(?:个|部|集)", Previous, Capture::None),
            (r"(?:快进|前进)\s*NUM\s*分(?:钟)?", SeekForward, Capture::Minutes),
            (r"(?:快进|前进)\s*NUM\s*秒?", SeekForward, Capture::Seconds),
            (r"(?:快进|前进)", SeekForward, Capture::None),
            (r"(?:快退|倒退|后退)\s*NUM\s*分(?:钟)?", SeekBackward, Capture::Minutes),
            (r"(?:快退|倒退|后退)\s*NUM\s*秒?", SeekBackward, Capture::Seconds),
            (r"(?:快退|倒退|后退)", SeekBackward, Capture::None),
            (r"(?:正常速度|恢复速度|一般速度)", SpeedNormal, Capture::None),
            (r"(?:加速|快一点|加快)", SpeedUp, Capture::Rate),
            (r"(?:减速|慢一点|放慢)", SpeedDown, Capture::Rate),
            (r"(?:音量调高|调高音量|大声一点|大声点|音量加大)\s*(?:NUM)?", VolumeUp, Capture::Percent),
            (r"(?:音量调低|调低音量|小声一点|小声点|音量减小)\s*(?:NUM)?", VolumeDown, Capture::Percent),
            (r"(?:取消静音|解除静音|打开声音)", Unmute, Capture::None),
            (r"(?:静音|关闭声音)", Mute, Capture::None),
            (r"(?:退出|离开|关闭)全屏", ExitFullscreen, Capture::None),
            (r"全屏", Fullscreen, Capture::None),
            (r"(?:重播|重新播放|从头播放)", Replay, Capture::None),
            (r"(?:暂停)", Pause, Capture::None),
            (r"(?:停止)", Stop, Capture::None),
            (r"(?:播放|继续)", Play, Capture::None),
        ],
    )
});

static JA: Lazy<Vec<CommandPattern>> = Lazy::new(|| {
    table(
        CJK_NUM,
        &[
            (r"ブックマーク\s*(.+?)?\s*(?:に移動|へ移動|に戻る)", GoToBookmark, Capture::Name),
            (r"ブックマーク(?:を)?(?:追加|登録|保存)", AddBookmark, Capture::None),
            (r"(\d{1,2}(?::\d{2}){1,2})\s*(?:に|へ)(?:移動|ジャンプ)", JumpTo, Capture::Timestamp),
            (r"NUM\s*分(?:に|へ)(?:移動|ジャンプ)", JumpTo, Capture::Minutes),
            (r"NUM\s*秒(?:に|へ)(?:移動|ジャンプ)", JumpTo, Capture::Seconds),
            (r"次の(?:動画|ビデオ)|次へ", Next, Capture::None),
            (r"前の(?:動画|ビデオ)", Previous, Capture::None),
            (r"NUM\s*分\s*(?:早送り|進めて|先へ)", SeekForward, Capture::Minutes),
            (r"NUM\s*秒\s*(?:早送り|進めて|先へ)|早送り\s*NUM\s*秒", SeekForward, Capture::Seconds),
            (r"早送り|先に進めて", SeekForward, Capture::None),
            (r"NUM\s*分\s*(?:巻き戻し|戻して|戻る)", SeekBackward, Capture::Minutes),
            (r"NUM\s*秒\s*(?:巻き戻し|戻して|戻る)|巻き戻し\s*NUM\s*秒", SeekBackward, Capture::Seconds),
            (r"巻き戻し|巻き戻して", SeekBackward, Capture::None),
            (r"通常(?:の)?速度|標準速度", SpeedNormal, Capture::None),
            (r"速く(?:して)?|スピードアップ", SpeedUp, Capture::Rate),
            (r"遅く(?:して)?|ゆっくり|スピードダウン", SpeedDown, Capture::Rate),
            (r"音量(?:を)?上げ|音を大きく", VolumeUp, Capture::Percent),
            (r"音量(?:を)?下げ|音を小さく", VolumeDown, Capture::Percent),
            (r"ミュート解除|消音解除", Unmute, Capture::None),
            (r"ミュート|消音", Mute, Capture::None),
            (r"全画面(?:表示)?(?:を)?(?:解除|終了)", ExitFullscreen, Capture::None),
            (r"全画面|フルスクリーン", Fullscreen, Capture::None),
            (r"もう一度|最初から|リプレイ", Replay, Capture::None),
            (r"一時停止|ポーズ", Pause, Capture::None),
            (r"停止|止めて|ストップ", Stop, Capture::None),
            (r"再生|続けて", Play, Capture::None),
        ],
    )
});

/// Table language used for a BCP-47 tag
pub fn resolve_language(tag: &str) -> &'static str {
    let tag = tag.trim();
    if let Some(exact) = SUPPORTED_LANGUAGES.iter().copied().find(|l| l.eq_ignore_ascii_case(tag)) {
        return exact;
    }

    let lower = tag.to_ascii_lowercase().replace('_', "-");
    let primary = lower.split('-').next().unwrap_or_default();
    match primary {
        "zh" if lower.contains("hant") || lower.ends_with("-tw") || lower.ends_with("-hk") || lower.ends_with("-mo") => "zh-TW",
        "zh" => "zh-CN",
        "ja" => "ja",
        "es" => "es",
        _ => "en",
    }
}

pub(crate) fn patterns_for(language: &str) -> &'static [CommandPattern] {
    match language {
        "zh-TW" => &ZH_TW,
        "zh-CN" => &ZH_CN,
        "ja" => &JA,
        "es" => &ES,
        _ => &EN,
    }
}

/// Fixed numeral lookup for spoken quantities. Not a general number parser.
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Ok(n) = token.replace(',', ".").parse::<f64>() {
        return Some(n);
    }

    let n = match token.to_lowercase().as_str() {
        "one" | "un" | "uno" | "una" | "一" => 1.0,
        "two" | "dos" | "二" | "兩" | "两" => 2.0,
        "three" | "tres" | "三" => 3.0,
        "四" => 4.0,
        "five" | "cinco" | "五" => 5.0,
        "六" => 6.0,
        "七" => 7.0,
        "八" => 8.0,
        "九" => 9.0,
        "ten" | "diez" | "十" => 10.0,
        "fifteen" | "quince" | "十五" => 15.0,
        "twenty" | "veinte" | "二十" => 20.0,
        "thirty" | "treinta" | "三十" => 30.0,
        "forty" | "cuarenta" | "四十" => 40.0,
        "forty five" | "forty-five" | "cuarenta y cinco" | "四十五" => 45.0,
        "fifty" | "cincuenta" | "五十" => 50.0,
        "sixty" | "sesenta" | "六十" => 60.0,
        "ninety" | "九十" => 90.0,
        "一百" | "百" => 100.0,
        _ => return None,
    };
    Some(n)
}

/// `1:30` → 90, `1:02:03` → 3723
pub(crate) fn parse_timestamp(token: &str) -> Option<f64> {
    token
        .split(':')
        .try_fold((0u32, 0.0), |(count, total), part| {
            let part: u32 = part.trim().parse().ok()?;
            Some((count + 1, total * 60.0 + f64::from(part)))
        })
        .filter(|(count, _)| (2..=3).contains(count))
        .map(|(_, total)| total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_fallback() {
        assert_eq!(resolve_language("zh-TW"), "zh-TW");
        assert_eq!(resolve_language("zh-tw"), "zh-TW");
        assert_eq!(resolve_language("zh-Hant"), "zh-TW");
        assert_eq!(resolve_language("zh-HK"), "zh-TW");
        assert_eq!(resolve_language("zh"), "zh-CN");
        assert_eq!(resolve_language("zh-Hans-CN"), "zh-CN");
        assert_eq!(resolve_language("ja-JP"), "ja");
        assert_eq!(resolve_language("es-MX"), "es");
        assert_eq!(resolve_language("fr-FR"), "en");
        assert_eq!(resolve_language(""), "en");
    }

    #[test]
    fn test_tables_compile() {
        for language in SUPPORTED_LANGUAGES {
            assert!(!patterns_for(language).is_empty());
        }
    }

    #[test]
    fn test_numerals() {
        assert_eq!(parse_number("二十"), Some(20.0));
        assert_eq!(parse_number("十"), Some(10.0));
        assert_eq!(parse_number("三十"), Some(30.0));
        assert_eq!(parse_number("Thirty"), Some(30.0));
        assert_eq!(parse_number("1,5"), Some(1.5));
        assert_eq!(parse_number("二十三"), None);
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(parse_timestamp("1:30"), Some(90.0));
        assert_eq!(parse_timestamp("1:02:03"), Some(3723.0));
        assert_eq!(parse_timestamp("90"), None);
        assert_eq!(parse_timestamp("a:b"), None);
    }
}
