use parley_core::{AuthHandshakeEvent, Jid, SessionRef};

use super::EventHandlers;
use crate::context::UiContext;

impl EventHandlers {
    /// Present the outcome of a shared-secret authentication step
    pub fn handle_auth_handshake(
        ctx: &mut UiContext,
        session: &SessionRef,
        peer: Jid,
        event: AuthHandshakeEvent,
    ) {
        let Some(view) = Self::open_conversation(ctx, session, &peer, "auth_handshake") else {
            return;
        };
        match event {
            AuthHandshakeEvent::SecretNeeded { question } => {
                view.show_auth_secret_prompt(question.as_deref())
            }
            AuthHandshakeEvent::Success => view.show_auth_success(),
            AuthHandshakeEvent::Failure => view.show_auth_failure(),
        }
    }
}
