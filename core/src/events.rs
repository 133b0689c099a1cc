use tokio::sync::broadcast;

use crate::classify::SocialPlatform;
use crate::voice::{AsrErrorCode, ParsedVoiceCommand};

/// Notifications from the voice pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// The command reached the active player
    Executed { command: ParsedVoiceCommand },
    /// Confidence is in the confirmation band; waiting for `confirm()`
    ConfirmationRequested { command: ParsedVoiceCommand },
    /// Confidence too low; the user should repeat themselves
    RetryRequested { text: String, confidence: f32 },
    /// Parsed and accepted but the player could not run it
    ExecutionFailed { command: ParsedVoiceCommand, reason: String },
    /// No pattern matched
    NotUnderstood { text: String, language: String },
    ListeningChanged { listening: bool },
    RecognitionError { code: AsrErrorCode, message: String },
}

/// Notifications from the social embed fallback chain
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedEvent {
    Attempt {
        platform: SocialPlatform,
        strategy: &'static str,
        index: usize,
    },
    Failed {
        platform: SocialPlatform,
        strategy: &'static str,
        http_status: Option<u16>,
        message: String,
    },
    Succeeded {
        platform: SocialPlatform,
        strategy: &'static str,
    },
    Exhausted {
        platform: SocialPlatform,
        attempted: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Voice(VoiceEvent),
    Embed(EmbedEvent),
}

impl From<VoiceEvent> for Event {
    fn from(event: VoiceEvent) -> Self {
        Event::Voice(event)
    }
}

impl From<EmbedEvent> for Event {
    fn from(event: EmbedEvent) -> Self {
        Event::Embed(event)
    }
}

/// Typed event bus shared by the embed chain and the voice pipeline.
///
/// Publishing is synchronous and never blocks; with no subscribers the event
/// is dropped. Slow subscribers see `RecvError::Lagged` instead of stalling
/// publishers.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(VoiceEvent::ListeningChanged { listening: true });
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(EmbedEvent::Succeeded {
            platform: SocialPlatform::Twitter,
            strategy: "twitter-publish",
        });

        for rx in [&mut a, &mut b] {
            assert!(matches!(
                rx.recv().await.unwrap(),
                Event::Embed(EmbedEvent::Succeeded { strategy: "twitter-publish", .. })
            ));
        }
    }
}
