//! Duplex link abstraction shared by the telephony and realtime transports.
//!
//! A [`Link`] is split into two halves:
//!
//! - [`LinkSender`]: a cloneable handle that queues outbound commands on a bounded
//!   channel. A writer task owned by the transport adapter drains the channel,
//!   serializes each command and writes it to the socket.
//! - an inbound event stream yielding `LinkResult<E>` items in arrival order.
//!
//! The relay core only ever sees these two halves, which keeps it independent of
//! the concrete socket types (axum server sockets on one side, tungstenite client
//! sockets on the other).

use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

/// Default capacity of the outbound command channel of a link.
pub const LINK_CHANNEL_CAPACITY: usize = 1024;

/// Errors surfaced by a link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The writer side of the link is gone; nothing more can be sent.
    #[error("Link closed")]
    Closed,

    /// The underlying transport failed while reading or writing.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single inbound payload could not be understood.
    #[error("Malformed event: {0}")]
    Malformed(String),
}

impl LinkError {
    /// Whether the error ends the inbound stream (as opposed to a skippable payload).
    pub fn is_disconnect(&self) -> bool {
        !matches!(self, LinkError::Malformed(_))
    }
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Message routed from a [`LinkSender`] to the transport writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkRoute<C> {
    /// Serialize and write a command.
    Command(C),
    /// Close the transport; the writer stops after handling this route.
    Close,
}

/// Outbound half of a link.
#[derive(Debug)]
pub struct LinkSender<C> {
    tx: mpsc::Sender<LinkRoute<C>>,
}

impl<C> Clone for LinkSender<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C> LinkSender<C> {
    /// Create a sender together with the receiver the writer task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LinkRoute<C>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a command for the writer task.
    pub async fn send(&self, command: C) -> LinkResult<()> {
        self.tx
            .send(LinkRoute::Command(command))
            .await
            .map_err(|_| LinkError::Closed)
    }

    /// Ask the writer task to close the transport.
    pub async fn close(&self) -> LinkResult<()> {
        self.tx
            .send(LinkRoute::Close)
            .await
            .map_err(|_| LinkError::Closed)
    }

    /// True once the writer task has stopped draining commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Inbound half of a link.
pub type EventStream<E> = BoxStream<'static, LinkResult<E>>;

/// A duplex link carrying commands of type `C` out and events of type `E` in.
pub struct Link<C, E> {
    pub sender: LinkSender<C>,
    pub events: EventStream<E>,
}

impl<C, E> Link<C, E> {
    pub fn new(sender: LinkSender<C>, events: EventStream<E>) -> Self {
        Self { sender, events }
    }

    /// Split into the outbound and inbound halves.
    pub fn into_parts(self) -> (LinkSender<C>, EventStream<E>) {
        (self.sender, self.events)
    }
}

/// Far end of a channel-backed link.
///
/// Whatever is pushed into `events` is observed by the link owner as inbound
/// events; every command the owner sends shows up on `commands`.
pub struct LinkPeer<C, E> {
    pub events: mpsc::Sender<LinkResult<E>>,
    pub commands: mpsc::Receiver<LinkRoute<C>>,
}

/// Build a link backed by in-process channels.
///
/// Dropping the peer's `events` sender ends the inbound stream, which the link
/// owner observes as a disconnect. Dropping `commands` closes the sender.
pub fn channel_link<C, E>(capacity: usize) -> (Link<C, E>, LinkPeer<C, E>)
where
    C: Send + 'static,
    E: Send + 'static,
{
    let (sender, commands) = LinkSender::channel(capacity);
    let (events_tx, events_rx) = mpsc::channel::<LinkResult<E>>(capacity);

    let events = stream::unfold(events_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();

    (
        Link::new(sender, events),
        LinkPeer {
            events: events_tx,
            commands,
        },
    )
}
