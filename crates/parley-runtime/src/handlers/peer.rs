use parley_core::{AccountId, Jid, PeerEventKind, PeerSecurity, SessionRef};
use tracing::{debug, error, info};

use super::{current_security, EventHandlers};
use crate::context::UiContext;
use crate::conversation::ConversationView;
use crate::ui::SubscriptionResponse;

const PRIVATE_ENDED: &str = "Private conversation has ended.";
const PRIVATE_STARTED: &str = "Private conversation started.";
const UNVERIFIED_STARTED: &str = "Unverified conversation started.";
const PRIVATE_REFRESHED: &str = "Successfully refreshed the private conversation.";
const UNVERIFIED_REFRESHED: &str = "Successfully refreshed the unverified private conversation.";

impl EventHandlers {
    /// Security-state transitions and subscription traffic from one peer
    pub fn handle_peer(ctx: &mut UiContext, session: &SessionRef, event: PeerEventKind, from: Jid) {
        match event {
            PeerEventKind::IqReceived => info!("Received iq from {}", from),
            PeerEventKind::ConversationEnded => {
                let ended = ctx.surface.localize(PRIVATE_ENDED);
                Self::with_conversation(
                    ctx,
                    session,
                    &from,
                    "conversation_ended",
                    move |view, security| {
                        if !view.private_ended_shown() {
                            view.display_notification(&ended);
                        }
                        refresh_identity_warning(view, security);
                        view.mark_private_ended_shown();
                    },
                );
            }
            PeerEventKind::NewKeysEstablished => {
                let verified = ctx.surface.localize(PRIVATE_STARTED);
                let unverified = ctx.surface.localize(UNVERIFIED_STARTED);
                Self::with_conversation(
                    ctx,
                    session,
                    &from,
                    "new_keys_established",
                    move |view, security| {
                        view.display_verified_or_not(security, &verified, &unverified);
                        view.append_pending_delayed();
                        refresh_identity_warning(view, security);
                        view.mark_private_started_shown();
                    },
                );
            }
            PeerEventKind::KeysRenewed => {
                let verified = ctx.surface.localize(PRIVATE_REFRESHED);
                let unverified = ctx.surface.localize(UNVERIFIED_REFRESHED);
                Self::with_conversation(ctx, session, &from, "keys_renewed", move |view, security| {
                    view.display_verified_or_not(security, &verified, &unverified);
                    refresh_identity_warning(view, security);
                });
            }
            PeerEventKind::SubscriptionRequest => Self::confirm_subscription(ctx, session, &from),
            PeerEventKind::Subscribed | PeerEventKind::Unsubscribe => {
                let account = session
                    .upgrade()
                    .map(|live| live.config().account.to_string())
                    .unwrap_or_default();
                if event == PeerEventKind::Subscribed {
                    info!("[{}] Subscribed to {}", account, from);
                } else {
                    info!("[{}] Unsubscribed from {}", account, from);
                }
                ctx.surface.refresh_roster();
            }
        }
    }

    /// Run `action` on the peer's conversation now, or when it is created.
    /// Security state is read when the action runs.
    fn with_conversation<F>(
        ctx: &mut UiContext,
        session: &SessionRef,
        peer: &Jid,
        event: &str,
        action: F,
    ) where
        F: FnOnce(&mut ConversationView, PeerSecurity) + Send + 'static,
    {
        let Some(account) = ctx.accounts.resolve(session) else {
            ctx.stats.record_unresolved(session, event);
            return;
        };
        let session = session.clone();
        let peer_for_security = peer.clone();
        account.conversations.now_or_later(
            peer,
            Box::new(move |view| {
                let security = current_security(&session, &peer_for_security);
                action(view, security);
            }),
        );
    }

    /// Ask the user about a subscription request. A dismissed dialog sends
    /// nothing and leaves the request pending.
    fn confirm_subscription(ctx: &mut UiContext, session: &SessionRef, from: &Jid) {
        let Some(live) = session.upgrade() else {
            ctx.stats.record_unresolved(session, "subscription_request");
            return;
        };
        let account = AccountId::from(&live.config().account);

        let approve = match ctx.surface.confirm_subscription(&account, from) {
            SubscriptionResponse::Approve => true,
            SubscriptionResponse::Deny => false,
            SubscriptionResponse::Dismissed => {
                debug!("Subscription request from {} left pending", from);
                return;
            }
        };
        if let Err(e) = live.respond_to_subscription(from, approve) {
            error!("Could not answer subscription request from {}: {}", from, e);
        }
    }
}

fn refresh_identity_warning(view: &mut ConversationView, security: PeerSecurity) {
    view.update_security_warning(security);
    view.remove_identity_warning();
    view.show_identity_warning(security);
}
