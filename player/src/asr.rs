use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use playgate_core::error::AsrError;
use playgate_core::voice::{AsrAdapter, AsrErrorCode, AsrEvent, Transcript};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    /// `:command args`
    Command(String),
    /// `!code` simulates a recognizer error
    Error(AsrErrorCode),
    /// Anything else is heard as speech; `text @0.7` sets the confidence
    Speech { text: String, confidence: f32 },
    Empty,
}

impl InputLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return InputLine::Empty;
        }
        if let Some(command) = line.strip_prefix(':') {
            return InputLine::Command(command.trim().to_string());
        }
        if let Some(code) = line.strip_prefix('!') {
            return InputLine::Error(AsrErrorCode::from_code(code));
        }

        match line.rsplit_once('@') {
            Some((text, confidence)) => match confidence.trim().parse::<f32>() {
                Ok(confidence) => InputLine::Speech {
                    text: text.trim().to_string(),
                    confidence: confidence.clamp(0.0, 1.0),
                },
                Err(_) => InputLine::speech(line),
            },
            None => InputLine::speech(line),
        }
    }

    fn speech(text: &str) -> Self {
        InputLine::Speech {
            text: text.to_string(),
            confidence: 1.0,
        }
    }
}

#[derive(Default)]
struct Session {
    events: Mutex<Option<mpsc::UnboundedSender<AsrEvent>>>,
    listening: AtomicBool,
}

impl Session {
    fn end(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(events) = self.events.lock().take() {
            let _ = events.send(AsrEvent::Ended);
        }
    }

    fn send(&self, event: AsrEvent) -> bool {
        match self.events.lock().as_ref() {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }
}

/// Recognizer that "hears" lines typed on stdin.
///
/// Lines starting with `:` are forwarded to the command channel instead.
/// End of input is forwarded as `quit`.
pub struct StdinAsr {
    session: Arc<Session>,
    reader: JoinHandle<()>,
}

impl StdinAsr {
    /// Start reading stdin. With `single_utterance` a session ends after
    /// its first final transcript, like a one-shot browser recognizer.
    pub fn spawn(commands: mpsc::UnboundedSender<String>, single_utterance: bool) -> Self {
        let session = Arc::new(Session::default());
        let reader = tokio::spawn(read_lines(session.clone(), commands, single_utterance));
        Self { session, reader }
    }
}

impl Drop for StdinAsr {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_lines(session: Arc<Session>, commands: mpsc::UnboundedSender<String>, single_utterance: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {e}");
                break;
            }
        };

        match InputLine::parse(&line) {
            InputLine::Empty => {}
            InputLine::Command(command) => {
                if commands.send(command).is_err() {
                    return;
                }
            }
            InputLine::Error(code) => {
                if session.send(AsrEvent::Error(AsrError::new(code, "simulated from stdin"))) {
                    session.end();
                } else {
                    warn!("Recognizer not running, ignoring simulated {code}");
                }
            }
            InputLine::Speech { text, confidence } => {
                if !session.send(AsrEvent::Transcript(Transcript::final_result(text, confidence))) {
                    warn!("Recognizer not running, speech ignored");
                    continue;
                }
                if single_utterance {
                    session.end();
                }
            }
        }
    }

    debug!("stdin closed");
    let _ = commands.send("quit".to_string());
}

#[async_trait]
impl AsrAdapter for StdinAsr {
    async fn start(&self, language: &str, events: mpsc::UnboundedSender<AsrEvent>) -> Result<(), AsrError> {
        debug!("stdin recognizer listening ({language})");
        *self.session.events.lock() = Some(events);
        self.session.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.session.end();
    }

    fn is_listening(&self) -> bool {
        self.session.listening.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_lines() {
        assert_eq!(InputLine::parse("  "), InputLine::Empty);
        assert_eq!(InputLine::parse(":seek 30"), InputLine::Command("seek 30".into()));
        assert_eq!(InputLine::parse("!not-allowed"), InputLine::Error(AsrErrorCode::NotAllowed));
        assert_eq!(InputLine::parse("!whatever"), InputLine::Error(AsrErrorCode::Other));
        assert_eq!(
            InputLine::parse("pause @0.7"),
            InputLine::Speech {
                text: "pause".into(),
                confidence: 0.7
            }
        );
        assert_eq!(
            InputLine::parse("email me@home"),
            InputLine::Speech {
                text: "email me@home".into(),
                confidence: 1.0
            }
        );
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let session = Session::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(!session.send(AsrEvent::Ended));

        *session.events.lock() = Some(tx);
        session.listening.store(true, Ordering::SeqCst);
        assert!(session.send(AsrEvent::Transcript(Transcript::final_result("play", 0.9))));
        session.end();

        assert!(!session.listening.load(Ordering::SeqCst));
        assert!(matches!(rx.recv().await, Some(AsrEvent::Transcript(_))));
        assert!(matches!(rx.recv().await, Some(AsrEvent::Ended)));
        assert!(!session.send(AsrEvent::Ended));
    }
}
