//! Mock Provider Servers
//!
//! Simulates the realtime AI provider over a real WebSocket so the relay can be
//! exercised end to end without network access.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{MockRealtimeConnection, MockRealtimeServer, RecordedHandshake};
