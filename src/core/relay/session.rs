//! One call: the AI handshake and the two forwarding loops.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::events::{AiEvent, TelephonyEvent};
use super::interruption::plan_barge_in;
use super::state::RelayState;
use super::terminator::{CallSnapshot, CallTerminator, TerminationReason};
use crate::core::link::{EventStream, Link, LinkError, LinkResult, LinkSender};
use crate::core::realtime::{ClientEvent, RealtimeError};
use crate::core::telephony::TelephonyCommand;
use crate::core::transcript::{
    DEFAULT_GOODBYE_KEYWORDS, GoodbyeDetector, ResponseOutcome, Speaker, TranscriptAssembler,
    TranscriptLine, TranscriptSink,
};

/// Media payload sent to the caller right before hanging up on a goodbye.
pub const DEFAULT_FAREWELL_PAYLOAD: &str = "Goodbye, call me back if you need help.";

pub type TelephonyLink = Link<TelephonyCommand, TelephonyEvent>;
pub type AiLink = Link<ClientEvent, AiEvent>;

/// Errors that abort a call before relaying starts.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to connect realtime session: {0}")]
    Connect(#[from] RealtimeError),

    #[error("Realtime handshake failed sending {event}: {source}")]
    Handshake {
        event: &'static str,
        #[source]
        source: LinkError,
    },
}

/// Per-call behaviour knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSettings {
    pub goodbye_keywords: Vec<String>,
    pub farewell_payload: String,
    /// End the call when the telephony side stays silent this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            goodbye_keywords: DEFAULT_GOODBYE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            farewell_payload: DEFAULT_FAREWELL_PAYLOAD.to_string(),
            idle_timeout: None,
        }
    }
}

/// How a call ended.
#[derive(Debug, Clone)]
pub struct CallSummary {
    pub call_id: String,
    pub stream_id: Option<String>,
    pub reason: Option<TerminationReason>,
    pub transcript: Vec<TranscriptLine>,
}

/// Relay for a single call.
pub struct RelaySession {
    call_id: String,
    settings: CallSettings,
    sink: Arc<dyn TranscriptSink>,
}

impl RelaySession {
    pub fn new(
        call_id: impl Into<String>,
        settings: CallSettings,
        sink: Arc<dyn TranscriptSink>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            settings,
            sink,
        }
    }

    /// Send the handshake on the AI link, then relay until the call ends.
    ///
    /// If any handshake event cannot be sent the telephony link is closed and the
    /// call is aborted.
    pub async fn start(
        self,
        telephony: TelephonyLink,
        ai: AiLink,
        handshake: Vec<ClientEvent>,
    ) -> Result<CallSummary, RelayError> {
        let (telephony_tx, telephony_events) = telephony.into_parts();
        let (ai_tx, ai_events) = ai.into_parts();

        for event in handshake {
            let kind = event.kind();
            if let Err(source) = ai_tx.send(event).await {
                error!(call_id = %self.call_id, "Realtime handshake failed at {}: {}", kind, source);
                if let Err(e) = telephony_tx.close().await {
                    debug!(call_id = %self.call_id, "Telephony link already closed: {}", e);
                }
                return Err(RelayError::Handshake {
                    event: kind,
                    source,
                });
            }
            debug!(call_id = %self.call_id, event = kind, "Handshake event sent");
        }

        let goodbye = GoodbyeDetector::new(&self.settings.goodbye_keywords);
        let terminator = CallTerminator::new(
            self.call_id.clone(),
            self.settings.farewell_payload.clone(),
            self.sink,
            telephony_tx.clone(),
            ai_tx.clone(),
        );
        let call = ActiveCall {
            cancel: terminator.token(),
            terminator,
            call_id: self.call_id,
            idle_timeout: self.settings.idle_timeout,
            shared: Mutex::new(CallShared {
                relay: RelayState::new(),
                transcript: TranscriptAssembler::new(goodbye),
            }),
            telephony: telephony_tx,
            ai: ai_tx,
        };

        info!(call_id = %call.call_id, "Relay session started");

        tokio::join!(
            call.forward_from_telephony(telephony_events),
            call.forward_from_ai(ai_events)
        );

        let shared = call.shared.lock();
        let summary = CallSummary {
            call_id: call.call_id.clone(),
            stream_id: shared.relay.stream_id().map(str::to_string),
            reason: call.terminator.reason(),
            transcript: shared.transcript.snapshot(),
        };

        info!(
            call_id = %summary.call_id,
            reason = ?summary.reason,
            lines = summary.transcript.len(),
            "Relay session finished"
        );
        Ok(summary)
    }
}

struct CallShared {
    relay: RelayState,
    transcript: TranscriptAssembler,
}

enum Inbound<T> {
    Event(LinkResult<T>),
    Ended,
    Idle,
}

/// State of a running call shared by both loops. Locks are never held across `.await`.
///
/// Once `cancel` fires neither loop consumes another event and no further
/// commands are relayed; only the terminator writes to the links.
struct ActiveCall {
    call_id: String,
    idle_timeout: Option<Duration>,
    shared: Mutex<CallShared>,
    terminator: CallTerminator,
    cancel: CancellationToken,
    telephony: LinkSender<TelephonyCommand>,
    ai: LinkSender<ClientEvent>,
}

impl ActiveCall {
    async fn forward_from_telephony(&self, mut events: EventStream<TelephonyEvent>) {
        loop {
            let inbound = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                inbound = next_inbound(&mut events, self.idle_timeout) => inbound,
            };

            if self.cancel.is_cancelled() {
                trace!(call_id = %self.call_id, "Call ended, dropping dequeued telephony event");
                break;
            }

            match inbound {
                Inbound::Event(Ok(event)) => {
                    trace!(call_id = %self.call_id, event = event.kind(), "Telephony event");
                    if self.on_telephony_event(event).await.is_break() {
                        break;
                    }
                }
                Inbound::Event(Err(e)) if !e.is_disconnect() => {
                    warn!(call_id = %self.call_id, "Skipping malformed telephony event: {}", e);
                }
                Inbound::Event(Err(e)) => {
                    warn!(call_id = %self.call_id, "Telephony link failed: {}", e);
                    self.terminate(TerminationReason::TelephonyDisconnected).await;
                    break;
                }
                Inbound::Ended => {
                    info!(call_id = %self.call_id, "Telephony link disconnected");
                    self.terminate(TerminationReason::TelephonyDisconnected).await;
                    break;
                }
                Inbound::Idle => {
                    warn!(call_id = %self.call_id, "No telephony events within idle timeout");
                    self.terminate(TerminationReason::IdleTimeout).await;
                    break;
                }
            }
        }
    }

    async fn on_telephony_event(&self, event: TelephonyEvent) -> ControlFlow<()> {
        match event {
            TelephonyEvent::CallStarted { stream_id, call_id } => {
                let recorded = self.shared.lock().relay.set_stream_id(stream_id.as_str());
                if recorded {
                    info!(
                        call_id = %self.call_id,
                        stream_id = %stream_id,
                        provider_call_id = call_id.as_deref().unwrap_or_default(),
                        "Incoming stream has started"
                    );
                } else {
                    warn!(call_id = %self.call_id, stream_id = %stream_id, "Stream already started, ignoring");
                }
            }
            TelephonyEvent::MediaReceived {
                timestamp_ms,
                payload,
            } => {
                self.shared.lock().relay.record_media(timestamp_ms);

                if self.ai.is_closed() {
                    trace!(call_id = %self.call_id, "Realtime link closed, dropping media");
                    return ControlFlow::Continue(());
                }
                let append = ClientEvent::InputAudioBufferAppend { audio: payload };
                if let Err(e) = self.relay(&self.ai, append).await {
                    trace!(call_id = %self.call_id, "Dropping media: {}", e);
                }
            }
            TelephonyEvent::AckReceived => {
                let acknowledged = self.shared.lock().relay.acknowledge();
                if !acknowledged {
                    trace!(call_id = %self.call_id, "Mark echo with no outstanding marks");
                }
            }
            TelephonyEvent::CallStopped => {
                info!(call_id = %self.call_id, "Caller hung up");
                self.terminate(TerminationReason::CallerHangup).await;
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    async fn forward_from_ai(&self, mut events: EventStream<AiEvent>) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = events.next() => next,
            };

            if self.cancel.is_cancelled() {
                trace!(call_id = %self.call_id, "Call ended, dropping dequeued realtime event");
                break;
            }

            match next {
                Some(Ok(event)) => {
                    if self.on_ai_event(event).await.is_break() {
                        break;
                    }
                }
                Some(Err(e)) if !e.is_disconnect() => {
                    warn!(call_id = %self.call_id, "Skipping malformed realtime event: {}", e);
                }
                Some(Err(e)) => {
                    error!(call_id = %self.call_id, "Realtime link failed: {}", e);
                    break;
                }
                None => {
                    info!(call_id = %self.call_id, "Realtime link closed");
                    break;
                }
            }
        }
    }

    async fn on_ai_event(&self, event: AiEvent) -> ControlFlow<()> {
        match event {
            AiEvent::SessionCreated { session_id } => {
                debug!(call_id = %self.call_id, session_id = %session_id, "Realtime session created");
            }
            AiEvent::AudioDelta {
                response_id,
                item_id,
                payload,
            } => {
                let commands = self
                    .shared
                    .lock()
                    .relay
                    .record_audio_delta(&response_id, &item_id, payload);

                for command in commands {
                    if let Err(e) = self.relay(&self.telephony, command).await {
                        debug!(call_id = %self.call_id, "Dropping assistant audio: {}", e);
                        break;
                    }
                }
            }
            AiEvent::SpeechStarted => {
                let barge_in = plan_barge_in(&mut self.shared.lock().relay);

                if let Some(barge_in) = barge_in {
                    info!(
                        call_id = %self.call_id,
                        response_id = %barge_in.response_id,
                        audio_end_ms = barge_in.audio_end_ms,
                        "Caller interrupted response"
                    );
                    if let Err(e) = self.relay(&self.ai, barge_in.truncate_command()).await {
                        warn!(call_id = %self.call_id, "Failed to send truncate: {}", e);
                    }
                    if let Some(clear) = barge_in.clear_command()
                        && let Err(e) = self.relay(&self.telephony, clear).await
                    {
                        warn!(call_id = %self.call_id, "Failed to send clear: {}", e);
                    }
                }
            }
            AiEvent::SpeechStopped => {
                self.shared.lock().transcript.flush_speech();
            }
            AiEvent::BufferCommitted => {
                self.shared.lock().transcript.record_commit();
            }
            AiEvent::InputTextFragment(fragment) => {
                self.shared.lock().transcript.push_speech_fragment(&fragment);
            }
            AiEvent::InputTranscriptCompleted(text) => {
                if !text.trim().is_empty() {
                    self.shared.lock().transcript.append(Speaker::User, &text);
                }
            }
            AiEvent::ResponseCompleted(response) => {
                let outcome = self.shared.lock().transcript.record_response(&response);

                if let ResponseOutcome::GoodbyeDetected { line } = outcome {
                    info!(call_id = %self.call_id, line = %line, "Goodbye detected");
                    self.terminate(TerminationReason::GoodbyeDetected).await;
                    return ControlFlow::Break(());
                }
            }
            AiEvent::RateLimitsUpdated => {}
            AiEvent::Error { message } => {
                error!(call_id = %self.call_id, "Realtime session error: {}", message);
            }
        }

        ControlFlow::Continue(())
    }

    /// Send a command unless the call ends first. A send still waiting for
    /// channel capacity is abandoned on termination.
    async fn relay<C>(&self, link: &LinkSender<C>, command: C) -> LinkResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LinkError::Closed),
            sent = link.send(command) => sent,
        }
    }

    async fn terminate(&self, reason: TerminationReason) {
        self.terminator
            .terminate(reason, || {
                let shared = self.shared.lock();
                CallSnapshot {
                    stream_id: shared.relay.stream_id().map(str::to_string),
                    lines: shared.transcript.snapshot(),
                }
            })
            .await;
    }
}

async fn next_inbound<T>(events: &mut EventStream<T>, idle: Option<Duration>) -> Inbound<T> {
    let next = match idle {
        Some(limit) => match tokio::time::timeout(limit, events.next()).await {
            Ok(next) => next,
            Err(_) => return Inbound::Idle,
        },
        None => events.next().await,
    };

    next.map_or(Inbound::Ended, Inbound::Event)
}
