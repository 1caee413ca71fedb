//! HTTP and WebSocket request handlers
//!
//! - `api` - Status page
//! - `call` - Call setup instructions for the telephony provider
//! - `media_stream` - Media stream WebSocket, one call per connection

pub mod api;
pub mod call;
pub mod media_stream;

pub use call::incoming_call;
pub use media_stream::media_stream_handler;
