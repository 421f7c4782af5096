//! Gateway protocol definitions
//!
//! Inbound frames are `{"action": ..., "data": {...}}` requests; outbound frames
//! are `{"type": ..., "data": {...}}` envelopes. Both are UTF-8 JSON text.

mod envelope;
mod request;

pub use envelope::{Envelope, EnvelopeType, WELCOME_MESSAGE};
pub use request::{EditUserInfoPayload, InitUserPayload, MsgAllPayload, Request, MALFORMED_PAYLOAD};
