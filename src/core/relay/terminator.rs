//! Exactly-once call shutdown.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::link::LinkSender;
use crate::core::realtime::ClientEvent;
use crate::core::telephony::TelephonyCommand;
use crate::core::transcript::{TranscriptLine, TranscriptSink};

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    CallerHangup,
    TelephonyDisconnected,
    GoodbyeDetected,
    IdleTimeout,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::CallerHangup => "callerHangup",
            TerminationReason::TelephonyDisconnected => "telephonyDisconnected",
            TerminationReason::GoodbyeDetected => "goodbyeDetected",
            TerminationReason::IdleTimeout => "idleTimeout",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the terminator needs from the call at the moment it ends.
#[derive(Debug, Clone, Default)]
pub struct CallSnapshot {
    pub stream_id: Option<String>,
    pub lines: Vec<TranscriptLine>,
}

/// Ends a call once: stops both loops, says goodbye if asked to, hands off the
/// transcript and closes both links.
pub struct CallTerminator {
    call_id: String,
    farewell_payload: String,
    reason: OnceLock<TerminationReason>,
    cancel: CancellationToken,
    sink: Arc<dyn TranscriptSink>,
    telephony: LinkSender<TelephonyCommand>,
    ai: LinkSender<ClientEvent>,
}

impl CallTerminator {
    pub fn new(
        call_id: impl Into<String>,
        farewell_payload: impl Into<String>,
        sink: Arc<dyn TranscriptSink>,
        telephony: LinkSender<TelephonyCommand>,
        ai: LinkSender<ClientEvent>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            farewell_payload: farewell_payload.into(),
            reason: OnceLock::new(),
            cancel: CancellationToken::new(),
            sink,
            telephony,
            ai,
        }
    }

    /// Token cancelled as the first step of termination.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason.get().copied()
    }

    /// Run the shutdown sequence. Returns false if the call had already ended.
    ///
    /// `snapshot` is taken after both loops have been told to stop. Every step is
    /// attempted even when an earlier one fails.
    pub async fn terminate<F>(&self, reason: TerminationReason, snapshot: F) -> bool
    where
        F: FnOnce() -> CallSnapshot,
    {
        if self.reason.set(reason).is_err() {
            debug!(call_id = %self.call_id, %reason, "Call already terminated");
            return false;
        }

        info!(call_id = %self.call_id, %reason, "Terminating call");
        self.cancel.cancel();

        let CallSnapshot { stream_id, lines } = snapshot();

        if reason == TerminationReason::GoodbyeDetected {
            self.say_farewell(stream_id.as_deref()).await;
        }

        if let Err(e) = self.sink.persist(&self.call_id, &lines).await {
            error!(call_id = %self.call_id, "Failed to persist transcript: {}", e);
        }

        if let Err(e) = self.ai.close().await {
            debug!(call_id = %self.call_id, "Realtime link already closed: {}", e);
        }
        if let Err(e) = self.telephony.close().await {
            debug!(call_id = %self.call_id, "Telephony link already closed: {}", e);
        }

        true
    }

    async fn say_farewell(&self, stream_id: Option<&str>) {
        let Some(stream_id) = stream_id else {
            warn!(call_id = %self.call_id, "No stream to send farewell on");
            return;
        };

        let farewell = TelephonyCommand::media(stream_id, self.farewell_payload.as_str());
        if let Err(e) = self.telephony.send(farewell).await {
            warn!(call_id = %self.call_id, "Failed to send farewell: {}", e);
        }
        if let Err(e) = self.telephony.send(TelephonyCommand::stop(stream_id)).await {
            warn!(call_id = %self.call_id, "Failed to send stop: {}", e);
        }
    }
}
