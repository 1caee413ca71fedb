//! Media stream frames as the telephony provider sends them

use serde_json::{Value, json};

pub const TEST_STREAM_SID: &str = "MZ123";
pub const TEST_CALL_SID: &str = "CA123";

pub fn connected_frame() -> Value {
    json!({"event": "connected", "protocol": "Call", "version": "1.0.0"})
}

pub fn start_frame(stream_sid: &str) -> Value {
    json!({
        "event": "start",
        "sequenceNumber": "1",
        "streamSid": stream_sid,
        "start": {
            "accountSid": "AC123",
            "streamSid": stream_sid,
            "callSid": TEST_CALL_SID,
            "tracks": ["inbound"],
            "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1},
            "customParameters": {}
        }
    })
}

/// Inbound audio chunk; the provider sends the timestamp as a string.
pub fn media_frame(timestamp_ms: u64, payload: &str) -> Value {
    json!({
        "event": "media",
        "sequenceNumber": "2",
        "media": {
            "track": "inbound",
            "chunk": "1",
            "timestamp": timestamp_ms.to_string(),
            "payload": payload
        },
        "streamSid": TEST_STREAM_SID
    })
}

pub fn mark_frame(name: &str) -> Value {
    json!({"event": "mark", "streamSid": TEST_STREAM_SID, "mark": {"name": name}})
}

pub fn stop_frame() -> Value {
    json!({
        "event": "stop",
        "streamSid": TEST_STREAM_SID,
        "stop": {"accountSid": "AC123", "callSid": TEST_CALL_SID}
    })
}
