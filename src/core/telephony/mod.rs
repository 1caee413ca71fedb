//! Telephony side of a call: media stream wire format and socket adapter.

pub mod link;
pub mod messages;

pub use link::telephony_link;
pub use messages::{RESPONSE_PART_MARK, TelephonyCommand, TelephonyInbound};
