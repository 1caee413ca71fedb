//! Per-call relay between the telephony link and the realtime AI link.
//!
//! A [`RelaySession`] owns the call state and runs one forwarding loop per
//! direction. Barge-in decisions live in [`interruption`], shutdown in
//! [`terminator`].

pub mod events;
pub mod interruption;
pub mod session;
pub mod state;
pub mod terminator;

pub use events::{AiEvent, CompletedResponse, ResponseOutput, TelephonyEvent};
pub use interruption::{BargeIn, plan_barge_in};
pub use session::{
    AiLink, CallSettings, CallSummary, DEFAULT_FAREWELL_PAYLOAD, RelayError, RelaySession,
    TelephonyLink,
};
pub use state::{InFlightResponse, RelayState};
pub use terminator::{CallSnapshot, CallTerminator, TerminationReason};
