//! Connection management
//!
//! Tracks live WebSocket connections, the identity each one claimed, and the
//! per-identity locks that order association against teardown.

mod connection;
mod identity_lock;
mod registry;

pub use connection::{Association, Connection, ConnectionState, SendError};
pub use identity_lock::{IdentityGuard, IdentityLocks};
pub use registry::{ConnectionRegistry, Registration, Unregistration};
