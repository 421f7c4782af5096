//! Event broadcasting
//!
//! Fans an encoded envelope out to every registered connection.

mod broadcaster;

pub use broadcaster::{BroadcastReport, Broadcaster};
