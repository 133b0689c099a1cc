use serde::Serialize;

/// Below this the user is asked to repeat the command
pub const RETRY_THRESHOLD: f32 = 0.6;

/// At or above this the command runs without confirmation
pub const CONFIRM_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Retry,
    Confirm,
    Execute,
}

/// Route a recognizer confidence into one of three bands
pub fn gate(confidence: f32) -> GateDecision {
    // NaN lands in the retry band
    if confidence >= CONFIRM_THRESHOLD {
        GateDecision::Execute
    } else if confidence >= RETRY_THRESHOLD {
        GateDecision::Confirm
    } else {
        GateDecision::Retry
    }
}
