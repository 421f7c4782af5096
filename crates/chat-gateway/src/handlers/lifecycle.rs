//! Connection teardown

use super::resolve_profile;
use crate::connection::{Connection, Unregistration};
use crate::protocol::Envelope;
use crate::server::GatewayState;

/// Runs the close sequence for a finished connection
pub struct LifecycleController;

impl LifecycleController {
    /// Remove the connection from the registry.
    ///
    /// When it was the identity's last connection, the identity leaves the
    /// roster and every remaining connection receives `close`. Calling this
    /// again for the same connection does nothing.
    pub async fn close(state: &GatewayState, connection: &Connection) {
        if !connection.mark_closed() {
            return;
        }

        let Some(identity) = connection.identity() else {
            tracing::info!(
                connection_id = %connection.id(),
                lifetime_ms = connection.age().as_millis(),
                "Connection closed before init_user"
            );
            return;
        };

        let _guard = state.identity_locks().acquire(&identity).await;

        match state.registry().unregister(connection) {
            Unregistration::AlreadyAbsent => {
                tracing::debug!(connection_id = %connection.id(), "Connection was not registered");
            }
            Unregistration::Remaining { identity, remaining } => {
                tracing::info!(
                    connection_id = %connection.id(),
                    identity = %identity,
                    remaining,
                    lifetime_ms = connection.age().as_millis(),
                    "Connection closed, identity still online"
                );
            }
            Unregistration::Vacated { identity } => {
                let user = resolve_profile(state, &identity).await;

                if let Err(e) = state.directory().remove_user(&identity).await {
                    tracing::warn!(identity = %identity, error = %e, code = e.code(), "Failed to remove user");
                }

                let report = state.broadcaster().broadcast(&Envelope::close(&user));
                tracing::info!(
                    connection_id = %connection.id(),
                    identity = %identity,
                    sent = report.delivered,
                    lifetime_ms = connection.age().as_millis(),
                    "Identity went offline"
                );
            }
        }
    }
}
