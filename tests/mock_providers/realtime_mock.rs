//! WebSocket mock of the OpenAI Realtime API
//!
//! Every accepted connection is handed to the test as a
//! [`MockRealtimeConnection`]: the test reads the client events the relay sent
//! and scripts the server events it should receive.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Upgrade request details captured during the WebSocket handshake.
#[derive(Debug, Clone, Default)]
pub struct RecordedHandshake {
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

/// Listener accepting realtime connections on an ephemeral local port.
pub struct MockRealtimeServer {
    /// Endpoint to configure as the realtime URL
    pub url: String,
    connections: mpsc::UnboundedReceiver<MockRealtimeConnection>,
}

impl MockRealtimeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock realtime listener");
        let addr = listener.local_addr().unwrap();
        let (tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut handshake = RecordedHandshake::default();
                    let callback = |request: &Request, response: Response| {
                        handshake = record_handshake(request);
                        Ok::<Response, ErrorResponse>(response)
                    };
                    let Ok(socket) = accept_hdr_async(stream, callback).await else {
                        return;
                    };

                    let (received_tx, received) = mpsc::unbounded_channel();
                    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
                    let connection = MockRealtimeConnection {
                        handshake,
                        received,
                        outbound,
                    };
                    if tx.send(connection).is_err() {
                        return;
                    }

                    let (mut write, mut read) = socket.split();
                    loop {
                        tokio::select! {
                            frame = read.next() => match frame {
                                Some(Ok(Message::Text(text))) => {
                                    if let Ok(value) = serde_json::from_str::<Value>(text.as_str()) {
                                        let _ = received_tx.send(value);
                                    }
                                }
                                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(_)) => {}
                            },
                            outbound = outbound_rx.recv() => match outbound {
                                Some(message) => {
                                    let closing = matches!(message, Message::Close(_));
                                    if write.send(message).await.is_err() || closing {
                                        break;
                                    }
                                }
                                None => break,
                            },
                        }
                    }
                });
            }
        });

        Self {
            url: format!("ws://{addr}/v1/realtime"),
            connections,
        }
    }

    /// Wait for the next realtime connection.
    pub async fn accept(&mut self) -> MockRealtimeConnection {
        timeout(RECV_TIMEOUT, self.connections.recv())
            .await
            .expect("Timed out waiting for a realtime connection")
            .expect("Mock realtime listener stopped")
    }
}

fn record_handshake(request: &Request) -> RecordedHandshake {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RecordedHandshake {
        path_and_query: request
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        authorization: header("authorization"),
        openai_beta: header("openai-beta"),
    }
}

/// Server side of one realtime session.
pub struct MockRealtimeConnection {
    pub handshake: RecordedHandshake,
    received: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Message>,
}

impl MockRealtimeConnection {
    /// Next client event, or `None` once the client closed the socket.
    pub async fn recv(&mut self) -> Option<Value> {
        timeout(RECV_TIMEOUT, self.received.recv())
            .await
            .expect("Timed out waiting for a client event")
    }

    /// Next client event of type `kind`, skipping caller audio appends.
    pub async fn expect(&mut self, kind: &str) -> Value {
        loop {
            let event = self
                .recv()
                .await
                .unwrap_or_else(|| panic!("Socket closed while waiting for {kind}"));
            let event_type = event["type"].as_str().unwrap_or_default();
            if event_type == kind {
                return event;
            }
            if event_type != "input_audio_buffer.append" {
                panic!("Expected {kind}, got {event}");
            }
        }
    }

    /// Wait until the client closes the socket, discarding anything still in flight.
    pub async fn expect_closed(&mut self) {
        while self.recv().await.is_some() {}
    }

    pub fn send(&self, event: Value) {
        self.outbound
            .send(Message::Text(event.to_string().into()))
            .expect("Mock realtime connection gone");
    }

    pub fn send_raw(&self, text: &str) {
        self.outbound
            .send(Message::Text(text.to_string().into()))
            .expect("Mock realtime connection gone");
    }

    pub fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}

// =============================================================================
// Server Event Builders
// =============================================================================

pub fn session_created() -> Value {
    json!({
        "type": "session.created",
        "event_id": "event_1",
        "session": {"id": "sess_mock", "model": "gpt-4o-realtime-preview", "voice": "alloy"}
    })
}

pub fn audio_delta(response_id: &str, item_id: &str, delta: &str) -> Value {
    json!({
        "type": "response.audio.delta",
        "event_id": "event_2",
        "response_id": response_id,
        "item_id": item_id,
        "output_index": 0,
        "content_index": 0,
        "delta": delta
    })
}

pub fn speech_started(audio_start_ms: u64) -> Value {
    json!({
        "type": "input_audio_buffer.speech_started",
        "event_id": "event_3",
        "audio_start_ms": audio_start_ms,
        "item_id": "item_user"
    })
}

/// `response.done` carrying one spoken assistant message.
pub fn response_done(response_id: &str, transcript: &str) -> Value {
    json!({
        "type": "response.done",
        "event_id": "event_4",
        "response": {
            "id": response_id,
            "status": "completed",
            "output": [{
                "id": "item_out",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "audio", "transcript": transcript}]
            }]
        }
    })
}
