//! Session-level messages: handshake, wake-up and interrupt.

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::ServerConfig;

use super::messages::{AuthHandshakePayload, InterruptPayload, WakeUpPayload};
use super::state::ConnectionState;

/// Compare a presented credential with the configured one in constant time.
pub fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Authenticate the connection.
///
/// With no access token configured any credential is accepted. A failed
/// handshake is logged and otherwise ignored; the client may retry.
pub fn handle_auth_handshake(
    payload: AuthHandshakePayload,
    state: &ConnectionState,
    config: &ServerConfig,
) {
    if state.is_authenticated() {
        return;
    }

    let accepted = match config.access_token.as_deref() {
        Some(expected) if !expected.is_empty() => token_matches(&payload.access_token, expected),
        _ => {
            warn!(
                "No access token configured, accepting session {} without verification",
                state.session_id
            );
            true
        }
    };

    if accepted {
        state.set_authenticated();
        info!(
            "Session {} authenticated (client {})",
            state.session_id,
            payload.client_version.as_deref().unwrap_or("unknown")
        );
    } else {
        warn!("Session {} presented an invalid access token", state.session_id);
    }
}

pub fn handle_wake_up(payload: WakeUpPayload, state: &ConnectionState) {
    info!(
        "Session {} woke up: {}",
        state.session_id,
        payload.trigger_reason.as_deref().unwrap_or("unspecified")
    );
}

/// Supersede whatever the connection is doing. Nothing is sent back; every
/// in-flight step observes the new generation and goes quiet.
pub fn handle_interrupt(payload: InterruptPayload, state: &ConnectionState) {
    state.invalidate();
    warn!(
        "Session {} interrupted ({}), now at {}",
        state.session_id,
        payload.reason.as_deref().unwrap_or("no reason given"),
        state.generations().current()
    );
}
