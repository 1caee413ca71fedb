//! OpenAI Realtime API client.
//!
//! Opens the WebSocket for one call and exposes it as a [`Link`] carrying
//! [`ClientEvent`]s out and relay [`AiEvent`]s in.
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: G.711 u-law by default, base64 encoded, matching telephony media streams

use futures::stream::{self, SplitStream};
use futures::{SinkExt, StreamExt};
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::config::{OPENAI_BETA_HEADER_VALUE, OpenAIRealtimeAudioFormat, OpenAIRealtimeVoice};
use super::messages::{
    ClientEvent, ConversationItem, InputAudioTranscription, ServerEvent, SessionConfig,
    TurnDetection,
};
use crate::core::link::{
    EventStream, LINK_CHANNEL_CAPACITY, Link, LinkError, LinkRoute, LinkSender,
};
use crate::core::realtime::base::{RealtimeError, RealtimeResult, RealtimeSettings};
use crate::core::relay::AiEvent;

type RealtimeSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Link to one OpenAI Realtime session.
pub type RealtimeLink = Link<ClientEvent, AiEvent>;

/// OpenAI Realtime API client for a single call.
#[derive(Debug, Clone)]
pub struct OpenAIRealtime {
    api_key: String,
    settings: RealtimeSettings,
    voice: OpenAIRealtimeVoice,
    audio_format: OpenAIRealtimeAudioFormat,
}

impl OpenAIRealtime {
    pub fn new(api_key: impl Into<String>, settings: RealtimeSettings) -> RealtimeResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        let voice = OpenAIRealtimeVoice::from_str_or_default(&settings.voice);
        let audio_format = OpenAIRealtimeAudioFormat::from_str_or_default(&settings.audio_format);

        Ok(Self {
            api_key,
            settings,
            voice,
            audio_format,
        })
    }

    /// Build the session configuration sent with `session.update`.
    pub fn build_session_config(&self) -> SessionConfig {
        let vad = &self.settings.turn_detection;

        SessionConfig {
            modalities: Some(
                super::config::RESPONSE_MODALITIES
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
            ),
            instructions: Some(self.settings.instructions.clone()),
            voice: Some(self.voice.as_str().to_string()),
            input_audio_format: Some(self.audio_format.as_str().to_string()),
            output_audio_format: Some(self.audio_format.as_str().to_string()),
            input_audio_transcription: self
                .settings
                .transcription_model
                .as_ref()
                .map(|model| InputAudioTranscription {
                    model: model.clone(),
                }),
            turn_detection: Some(TurnDetection::ServerVad {
                threshold: Some(vad.threshold),
                prefix_padding_ms: vad.prefix_padding_ms,
                silence_duration_ms: Some(vad.silence_duration_ms),
            }),
            temperature: Some(self.settings.temperature),
        }
    }

    /// Events that configure the session and make the assistant speak first.
    pub fn handshake(&self) -> Vec<ClientEvent> {
        let mut events = vec![ClientEvent::SessionUpdate {
            session: self.build_session_config(),
        }];

        if !self.settings.greeting_prompt.trim().is_empty() {
            events.push(ClientEvent::ConversationItemCreate {
                item: ConversationItem::user_text(self.settings.greeting_prompt.as_str()),
                previous_item_id: None,
            });
            events.push(ClientEvent::ResponseCreate);
        }

        events
    }

    /// Open the session WebSocket.
    pub async fn connect(&self) -> RealtimeResult<RealtimeLink> {
        let url = self.settings.endpoint();

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("{url}: {e}")))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| RealtimeError::AuthenticationFailed(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        request.headers_mut().insert(
            HeaderName::from_static("openai-beta"),
            HeaderValue::from_static(OPENAI_BETA_HEADER_VALUE),
        );

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        info!(model = %self.settings.model, "Connected to OpenAI Realtime API");

        Ok(realtime_link(socket))
    }
}

/// Split a connected socket into a writer task and an inbound event stream.
fn realtime_link(socket: RealtimeSocket) -> RealtimeLink {
    let (mut sink, receiver) = socket.split();
    let (sender, mut routes) = LinkSender::channel(LINK_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(route) = routes.recv().await {
            match route {
                LinkRoute::Command(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize realtime event: {}", e);
                            continue;
                        }
                    };

                    if let Err(e) = sink.send(Message::Text(json.into())).await {
                        warn!("Failed to send realtime event: {}", e);
                        break;
                    }
                }
                LinkRoute::Close => {
                    info!("Closing OpenAI Realtime connection");
                    if let Err(e) = sink.close().await {
                        debug!("Realtime socket close returned an error: {}", e);
                    }
                    break;
                }
            }
        }
    });

    Link::new(sender, inbound_events(receiver))
}

fn inbound_events(receiver: SplitStream<RealtimeSocket>) -> EventStream<AiEvent> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            let Some(frame) = receiver.next().await else {
                return None;
            };

            match frame {
                Ok(Message::Text(text)) => {
                    let event = match ServerEvent::parse(text.as_str()) {
                        Ok(event) => event,
                        Err(e) => {
                            return Some((Err(LinkError::Malformed(e.to_string())), receiver));
                        }
                    };

                    if event.is_logged() {
                        debug!(event = event.kind(), "Realtime event received");
                    }

                    match event.into_event() {
                        Ok(Some(event)) => return Some((Ok(event), receiver)),
                        Ok(None) => trace!("Realtime event not relayed"),
                        Err(reason) => {
                            return Some((Err(LinkError::Malformed(reason)), receiver));
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(?frame, "OpenAI Realtime connection closed by server");
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    return Some((Err(LinkError::Transport(e.to_string())), receiver));
                }
            }
        }
    })
    .boxed()
}
