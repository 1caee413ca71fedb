//! Telephony link over an accepted axum WebSocket.

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{self, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use super::messages::{TelephonyCommand, TelephonyInbound};
use crate::core::link::{
    EventStream, LINK_CHANNEL_CAPACITY, Link, LinkError, LinkRoute, LinkSender,
};
use crate::core::relay::TelephonyEvent;

/// Wrap a media stream socket into a [`Link`].
///
/// A writer task owns the socket sink and serializes queued commands; the
/// returned event stream parses inbound text frames. The stream ends when the
/// provider closes the socket.
pub fn telephony_link(socket: WebSocket) -> Link<TelephonyCommand, TelephonyEvent> {
    let (mut sink, receiver) = socket.split();
    let (sender, mut routes) = LinkSender::channel(LINK_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(route) = routes.recv().await {
            let should_close = matches!(route, LinkRoute::Close);

            let result = match route {
                LinkRoute::Command(command) => match serde_json::to_string(&command) {
                    Ok(json) => sink.send(Message::Text(json.into())).await,
                    Err(e) => {
                        error!("Failed to serialize telephony command: {}", e);
                        continue;
                    }
                },
                LinkRoute::Close => {
                    info!("Closing media stream WebSocket");
                    sink.send(Message::Close(None)).await
                }
            };

            if let Err(e) = result {
                warn!("Failed to write to media stream WebSocket: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    Link::new(sender, inbound_events(receiver))
}

fn inbound_events(receiver: SplitStream<WebSocket>) -> EventStream<TelephonyEvent> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            let Some(frame) = receiver.next().await else {
                return None;
            };

            match frame {
                Ok(Message::Text(text)) => match TelephonyInbound::parse(text.as_str()) {
                    Ok(message) => {
                        let kind = message.kind();
                        match message.into_event() {
                            Some(event) => return Some((Ok(event), receiver)),
                            None => debug!(event = kind, "Ignoring telephony event"),
                        }
                    }
                    Err(e) => {
                        return Some((Err(LinkError::Malformed(e.to_string())), receiver));
                    }
                },
                Ok(Message::Close(frame)) => {
                    info!(?frame, "Media stream closed by provider");
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
