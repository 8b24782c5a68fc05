use parley_core::{FileTransferElement, Inbound, Jid, SequenceCheck, SessionRef};
use tracing::{debug, warn};

use super::EventHandlers;
use crate::context::UiContext;

impl EventHandlers {
    /// Decode a file-transfer payload and apply it to the peer's conversation.
    /// Payloads that fail to decode are logged and change nothing.
    pub fn handle_file_transfer(
        ctx: &mut UiContext,
        session: &SessionRef,
        peer: Jid,
        payload: &str,
    ) {
        let element = match FileTransferElement::decode(payload) {
            Ok(element) => element,
            Err(e) => {
                warn!("Dropping file transfer payload from {}: {}", peer, e);
                return;
            }
        };

        let inbound = match element {
            FileTransferElement::Offer(offer) => {
                if let Some(view) = Self::open_conversation(ctx, session, &peer, "file_offer") {
                    debug!(
                        "File offer from {}: {:?} ({:?} bytes, starting at {})",
                        peer,
                        offer.name,
                        offer.size,
                        offer.start_offset()
                    );
                    view.file_transfer_offered(&offer);
                }
                return;
            }
            FileTransferElement::Ibb(element) => {
                let Some(account) = ctx.accounts.resolve(session) else {
                    ctx.stats.record_unresolved(session, "file_transfer");
                    return;
                };
                match account.transfers.observe(&peer, element) {
                    Ok(inbound) => inbound,
                    Err(e) => {
                        warn!("Rejected bytestream element from {}: {}", peer, e);
                        return;
                    }
                }
            }
        };

        let Some(view) = Self::open_conversation(ctx, session, &peer, "file_transfer") else {
            return;
        };
        match inbound {
            Inbound::Opened(open) => {
                debug!(
                    "Bytestream {} opened by {} with block size {}",
                    open.sid, peer, open.block_size
                );
                view.file_transfer_progress(&open.sid, 0);
            }
            Inbound::Data {
                data,
                sequence,
                received,
            } => {
                if let SequenceCheck::Unexpected { expected, actual } = sequence {
                    warn!(
                        "Bytestream {} from {}: expected seq {}, got {}",
                        data.sid, peer, expected, actual
                    );
                }
                view.file_transfer_progress(&data.sid, received);
            }
            Inbound::Closed { close, received } => {
                debug!("Bytestream {} closed after {} bytes", close.sid, received);
                view.file_transfer_closed(&close.sid, received);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        attach_test_account, create_recorded_context, PresenterCall, TestSession,
    };
    use parley_core::{AccountId, FileOffer, IbbSender};

    #[tokio::test]
    async fn test_offer_is_presented() {
        let (mut ctx, recorder) = create_recorded_context();
        let session = TestSession::arc("alice@example.org");
        let reference = attach_test_account(&mut ctx, &session);
        let bob = Jid::new("bob@example.org");
        let offer = FileOffer::new("notes.txt", 12).with_range(4, 8);

        EventHandlers::handle_file_transfer(
            &mut ctx,
            &reference,
            bob.clone(),
            &offer.to_xml(),
        );

        assert_eq!(
            recorder.presenter_calls(&bob),
            vec![PresenterCall::TransferOffered(Some("notes.txt".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_bytestream_progress_and_close() {
        let (mut ctx, recorder) = create_recorded_context();
        let session = TestSession::arc("alice@example.org");
        let reference = attach_test_account(&mut ctx, &session);
        let bob = Jid::new("bob@example.org");
        let mut sender = IbbSender::new("ft1", 4).unwrap();

        let mut payloads = vec![sender.open().to_xml()];
        payloads.extend(sender.chunk(b"abcdefghij").iter().map(|d| d.to_xml()));
        payloads.push(sender.close().to_xml());
        for payload in &payloads {
            EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), payload);
        }

        assert_eq!(
            recorder.presenter_calls(&bob),
            vec![
                PresenterCall::TransferProgress("ft1".to_string(), 0),
                PresenterCall::TransferProgress("ft1".to_string(), 4),
                PresenterCall::TransferProgress("ft1".to_string(), 8),
                PresenterCall::TransferProgress("ft1".to_string(), 10),
                PresenterCall::TransferClosed("ft1".to_string(), 10),
            ]
        );
        let account = ctx.accounts.get(&AccountId::new("alice@example.org")).unwrap();
        assert!(account.transfers.is_empty());
    }

    #[tokio::test]
    async fn test_stream_belongs_to_opening_peer() {
        let (mut ctx, recorder) = create_recorded_context();
        let session = TestSession::arc("alice@example.org");
        let reference = attach_test_account(&mut ctx, &session);
        let bob = Jid::new("bob@example.org");
        let mallory = Jid::new("mallory@example.org");
        let mut sender = IbbSender::new("ft1", 4).unwrap();
        let open = sender.open().to_xml();
        let first = sender.chunk(b"abcd")[0].to_xml();
        let close = sender.close().to_xml();

        EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), &open);
        EventHandlers::handle_file_transfer(&mut ctx, &reference, mallory.clone(), &first);
        EventHandlers::handle_file_transfer(&mut ctx, &reference, mallory.clone(), &close);

        assert!(recorder.presenter_calls(&mallory).is_empty());
        let account = ctx.accounts.get(&AccountId::new("alice@example.org")).unwrap();
        assert!(account.transfers.is_open(&bob, "ft1"));

        EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), &first);
        EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), &close);
        assert_eq!(
            recorder.presenter_calls(&bob),
            vec![
                PresenterCall::TransferProgress("ft1".to_string(), 0),
                PresenterCall::TransferProgress("ft1".to_string(), 4),
                PresenterCall::TransferClosed("ft1".to_string(), 4),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_payloads_change_nothing() {
        let (mut ctx, recorder) = create_recorded_context();
        let session = TestSession::arc("alice@example.org");
        let reference = attach_test_account(&mut ctx, &session);
        let bob = Jid::new("bob@example.org");
        let stray = IbbSender::new("unknown", 4).unwrap().close().to_xml();

        EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), "<not-closed>");
        EventHandlers::handle_file_transfer(&mut ctx, &reference, bob.clone(), &stray);

        assert!(recorder.presenter_calls(&bob).is_empty());
        assert!(recorder.surface_calls().is_empty());
    }
}
