//! In-band bytestream elements
//!
//! `open`, `data` and `close` carry a file over the messaging stream in
//! base64 blocks. [`IbbSessions`] tracks the receive side, [`IbbSender`]
//! produces the send side.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::xml::{self, Element};
use super::NS_IBB;
use crate::errors::{CodecError, CodecResult};
use crate::types::Jid;

// ----------------------------------------------------------------------------
// Wire Elements
// ----------------------------------------------------------------------------

/// Stanza type the data blocks travel in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StanzaKind {
    Iq,
    Message,
}

impl StanzaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StanzaKind::Iq => "iq",
            StanzaKind::Message => "message",
        }
    }

    fn parse(value: &str) -> CodecResult<Self> {
        match value {
            "iq" => Ok(StanzaKind::Iq),
            "message" => Ok(StanzaKind::Message),
            other => Err(CodecError::invalid_attribute("stanza", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbbOpen {
    pub block_size: u16,
    pub sid: String,
    pub stanza: Option<StanzaKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbbData {
    pub sid: String,
    pub seq: u16,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbbClose {
    pub sid: String,
}

impl IbbOpen {
    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }

    pub fn from_xml(input: &str) -> CodecResult<Self> {
        Self::from_element(&xml::parse(input)?)
    }

    fn to_element(&self) -> Element {
        Element::new("open")
            .with_namespace(NS_IBB)
            .with_attr("block-size", self.block_size)
            .with_attr("sid", &self.sid)
            .with_optional_attr("stanza", self.stanza.map(|s| s.as_str()))
    }

    fn from_element(element: &Element) -> CodecResult<Self> {
        element.expect("open", NS_IBB)?;
        let raw_block_size = element.required_attr("block-size")?;
        let block_size = element
            .parse_attr::<u16>("block-size")?
            .filter(|size| *size > 0)
            .ok_or_else(|| CodecError::invalid_attribute("block-size", raw_block_size))?;
        let stanza = match element.attr("stanza") {
            Some(value) => Some(StanzaKind::parse(value)?),
            None => None,
        };
        Ok(Self {
            block_size,
            sid: element.required_attr("sid")?.to_string(),
            stanza,
        })
    }
}

impl IbbData {
    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }

    pub fn from_xml(input: &str) -> CodecResult<Self> {
        Self::from_element(&xml::parse(input)?)
    }

    fn to_element(&self) -> Element {
        Element::new("data")
            .with_namespace(NS_IBB)
            .with_attr("sid", &self.sid)
            .with_attr("seq", self.seq)
            .with_text(&STANDARD.encode(&self.payload))
    }

    fn from_element(element: &Element) -> CodecResult<Self> {
        element.expect("data", NS_IBB)?;
        let raw_seq = element.required_attr("seq")?;
        let seq = element
            .parse_attr::<u16>("seq")?
            .ok_or_else(|| CodecError::invalid_attribute("seq", raw_seq))?;
        // Senders may wrap long base64 bodies
        let encoded: String = element
            .text()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        Ok(Self {
            sid: element.required_attr("sid")?.to_string(),
            seq,
            payload: STANDARD.decode(encoded)?,
        })
    }
}

impl IbbClose {
    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }

    pub fn from_xml(input: &str) -> CodecResult<Self> {
        Self::from_element(&xml::parse(input)?)
    }

    fn to_element(&self) -> Element {
        Element::new("close")
            .with_namespace(NS_IBB)
            .with_attr("sid", &self.sid)
    }

    fn from_element(element: &Element) -> CodecResult<Self> {
        element.expect("close", NS_IBB)?;
        Ok(Self {
            sid: element.required_attr("sid")?.to_string(),
        })
    }
}

/// Any in-band bytestream element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum IbbElement {
    Open(IbbOpen),
    Data(IbbData),
    Close(IbbClose),
}

impl IbbElement {
    pub fn sid(&self) -> &str {
        match self {
            IbbElement::Open(open) => &open.sid,
            IbbElement::Data(data) => &data.sid,
            IbbElement::Close(close) => &close.sid,
        }
    }

    pub fn to_xml(&self) -> String {
        match self {
            IbbElement::Open(open) => open.to_xml(),
            IbbElement::Data(data) => data.to_xml(),
            IbbElement::Close(close) => close.to_xml(),
        }
    }

    pub fn from_xml(input: &str) -> CodecResult<Self> {
        Self::from_element(&xml::parse(input)?)
    }

    pub(crate) fn from_element(element: &Element) -> CodecResult<Self> {
        match element.name.as_str() {
            "open" => IbbOpen::from_element(element).map(IbbElement::Open),
            "data" => IbbData::from_element(element).map(IbbElement::Data),
            "close" => IbbClose::from_element(element).map(IbbElement::Close),
            other => Err(CodecError::UnexpectedElement {
                expected: "open, data or close".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// Receive Side
// ----------------------------------------------------------------------------

/// Whether a data block carried the next expected sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    InOrder,
    Unexpected { expected: u16, actual: u16 },
}

/// Result of feeding one element into [`IbbSessions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Opened(IbbOpen),
    Data {
        data: IbbData,
        sequence: SequenceCheck,
        /// Payload bytes received on this stream so far, including this block
        received: u64,
    },
    Closed {
        close: IbbClose,
        received: u64,
    },
}

#[derive(Debug, Clone)]
struct InboundStream {
    block_size: u16,
    next_seq: u16,
    received: u64,
}

/// Streams one peer may hold open at the same time
pub const MAX_STREAMS_PER_PEER: usize = 8;

/// Open in-band bytestreams on the receiving side, keyed by the sending
/// peer's bare JID and the session id
///
/// Only the peer that opened a stream can feed or close it. Sequence numbers
/// are reported, not enforced: what to do with a gap or a duplicate is up to
/// the consumer.
#[derive(Debug, Default)]
pub struct IbbSessions {
    streams: HashMap<(Jid, String), InboundStream>,
}

impl IbbSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, peer: &Jid, input: &str) -> CodecResult<Inbound> {
        self.observe(peer, IbbElement::from_xml(input)?)
    }

    pub fn observe(&mut self, peer: &Jid, element: IbbElement) -> CodecResult<Inbound> {
        let peer = peer.bare();
        match element {
            IbbElement::Open(open) => {
                let key = (peer, open.sid.clone());
                if self.streams.contains_key(&key) {
                    return Err(CodecError::DuplicateSession { sid: open.sid });
                }
                if self.open_for(&key.0) >= MAX_STREAMS_PER_PEER {
                    return Err(CodecError::TooManyStreams {
                        peer: key.0,
                        limit: MAX_STREAMS_PER_PEER,
                    });
                }
                self.streams.insert(
                    key,
                    InboundStream {
                        block_size: open.block_size,
                        next_seq: 0,
                        received: 0,
                    },
                );
                Ok(Inbound::Opened(open))
            }
            IbbElement::Data(data) => {
                let stream = self
                    .streams
                    .get_mut(&(peer, data.sid.clone()))
                    .ok_or_else(|| CodecError::unknown_session(&data.sid))?;
                if data.payload.len() > usize::from(stream.block_size) {
                    return Err(CodecError::BlockSizeExceeded {
                        sid: data.sid,
                        size: data.payload.len(),
                        block_size: stream.block_size,
                    });
                }
                let sequence = if data.seq == stream.next_seq {
                    SequenceCheck::InOrder
                } else {
                    SequenceCheck::Unexpected {
                        expected: stream.next_seq,
                        actual: data.seq,
                    }
                };
                stream.next_seq = data.seq.wrapping_add(1);
                stream.received += data.payload.len() as u64;
                trace!(
                    "IBB {} seq {}: {} bytes, {} total",
                    data.sid,
                    data.seq,
                    data.payload.len(),
                    stream.received
                );
                Ok(Inbound::Data {
                    received: stream.received,
                    data,
                    sequence,
                })
            }
            IbbElement::Close(close) => {
                let stream = self
                    .streams
                    .remove(&(peer, close.sid.clone()))
                    .ok_or_else(|| CodecError::unknown_session(&close.sid))?;
                Ok(Inbound::Closed {
                    close,
                    received: stream.received,
                })
            }
        }
    }

    pub fn is_open(&self, peer: &Jid, sid: &str) -> bool {
        self.streams.contains_key(&(peer.bare(), sid.to_string()))
    }

    /// Streams currently open from `peer`
    pub fn open_for(&self, peer: &Jid) -> usize {
        let peer = peer.bare();
        self.streams.keys().filter(|(owner, _)| *owner == peer).count()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Forget every open stream, as when the account goes away
    pub fn clear(&mut self) {
        if !self.streams.is_empty() {
            trace!("Dropping {} open bytestreams", self.streams.len());
        }
        self.streams.clear();
    }
}

// ----------------------------------------------------------------------------
// Send Side
// ----------------------------------------------------------------------------

/// Splits outgoing bytes into numbered data blocks for one stream
#[derive(Debug, Clone)]
pub struct IbbSender {
    sid: String,
    block_size: u16,
    stanza: Option<StanzaKind>,
    next_seq: u16,
}

impl IbbSender {
    pub fn new(sid: impl Into<String>, block_size: u16) -> CodecResult<Self> {
        if block_size == 0 {
            return Err(CodecError::invalid_attribute("block-size", "0"));
        }
        Ok(Self {
            sid: sid.into(),
            block_size,
            stanza: None,
            next_seq: 0,
        })
    }

    pub fn with_stanza(mut self, stanza: StanzaKind) -> Self {
        self.stanza = Some(stanza);
        self
    }

    /// Continue numbering from `seq`
    pub fn starting_at(mut self, seq: u16) -> Self {
        self.next_seq = seq;
        self
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn next_sequence(&self) -> u16 {
        self.next_seq
    }

    pub fn open(&self) -> IbbOpen {
        IbbOpen {
            block_size: self.block_size,
            sid: self.sid.clone(),
            stanza: self.stanza,
        }
    }

    pub fn chunk(&mut self, bytes: &[u8]) -> Vec<IbbData> {
        bytes
            .chunks(usize::from(self.block_size))
            .map(|block| {
                let seq = self.next_seq;
                self.next_seq = seq.wrapping_add(1);
                IbbData {
                    sid: self.sid.clone(),
                    seq,
                    payload: block.to_vec(),
                }
            })
            .collect()
    }

    pub fn close(&self) -> IbbClose {
        IbbClose {
            sid: self.sid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bob() -> Jid {
        Jid::new("bob@example.org/desk")
    }

    fn open_stream(sessions: &mut IbbSessions, sid: &str, block_size: u16) {
        let open = IbbOpen {
            block_size,
            sid: sid.to_string(),
            stanza: None,
        };
        sessions.decode(&bob(), &open.to_xml()).unwrap();
    }

    #[test]
    fn test_open_wire_format() {
        let open = IbbOpen {
            block_size: 4096,
            sid: "i781hf64".to_string(),
            stanza: Some(StanzaKind::Iq),
        };
        assert_eq!(
            open.to_xml(),
            "<open xmlns=\"http://jabber.org/protocol/ibb\" \
             block-size=\"4096\" sid=\"i781hf64\" stanza=\"iq\"/>"
        );
        assert_eq!(IbbOpen::from_xml(&open.to_xml()).unwrap(), open);
    }

    #[test]
    fn test_data_body_is_base64() {
        let data = IbbData {
            sid: "s".to_string(),
            seq: 3,
            payload: b"hello".to_vec(),
        };
        assert_eq!(
            data.to_xml(),
            r#"<data xmlns="http://jabber.org/protocol/ibb" sid="s" seq="3">aGVsbG8=</data>"#
        );
    }

    #[test]
    fn test_sequence_wraps_without_error() {
        let mut sessions = IbbSessions::new();
        open_stream(&mut sessions, "wrap", 16);
        let mut sender = IbbSender::new("wrap", 16).unwrap().starting_at(65534);

        // Prime the receiver at the sender's position
        let first = sender.chunk(b"aaaa");
        let mut seqs = vec![first[0].seq];
        let primed = sessions
            .observe(&bob(), IbbElement::Data(first[0].clone()))
            .unwrap();
        assert!(matches!(
            primed,
            Inbound::Data {
                sequence: SequenceCheck::Unexpected {
                    expected: 0,
                    actual: 65534
                },
                ..
            }
        ));

        for payload in [&b"bbbb"[..], &b"cccc"[..], &b"dddd"[..]] {
            let blocks = sender.chunk(payload);
            let wire = blocks[0].to_xml();
            match sessions.decode(&bob(), &wire).unwrap() {
                Inbound::Data { data, sequence, .. } => {
                    assert_eq!(sequence, SequenceCheck::InOrder);
                    assert_eq!(data.sid, "wrap");
                    assert_eq!(data.payload, payload);
                    seqs.push(data.seq);
                }
                other => panic!("unexpected inbound: {:?}", other),
            }
        }
        assert_eq!(seqs, vec![65534, 65535, 0, 1]);
    }

    #[test]
    fn test_wrapped_sequence_numbers_decode() {
        for seq in [65534u16, 65535, 0, 1] {
            let data = IbbData {
                sid: "sid-1".to_string(),
                seq,
                payload: vec![seq as u8, 0xff, 0x00],
            };
            let decoded = IbbData::from_xml(&data.to_xml()).unwrap();
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn test_unknown_session_is_rejected() {
        let mut sessions = IbbSessions::new();
        let data = IbbData {
            sid: "nobody".to_string(),
            seq: 0,
            payload: vec![1],
        };
        assert!(matches!(
            sessions.decode(&bob(), &data.to_xml()),
            Err(CodecError::UnknownSession { .. })
        ));
        let close = IbbClose {
            sid: "nobody".to_string(),
        };
        assert!(matches!(
            sessions.decode(&bob(), &close.to_xml()),
            Err(CodecError::UnknownSession { .. })
        ));
    }

    #[test]
    fn test_other_peer_cannot_touch_stream() {
        let mut sessions = IbbSessions::new();
        open_stream(&mut sessions, "ft1", 8);
        let mallory = Jid::new("mallory@example.org/evil");
        let data = IbbData {
            sid: "ft1".to_string(),
            seq: 0,
            payload: b"junk".to_vec(),
        };
        let close = IbbClose {
            sid: "ft1".to_string(),
        };

        assert!(matches!(
            sessions.decode(&mallory, &data.to_xml()),
            Err(CodecError::UnknownSession { .. })
        ));
        assert!(matches!(
            sessions.decode(&mallory, &close.to_xml()),
            Err(CodecError::UnknownSession { .. })
        ));
        assert!(sessions.is_open(&bob(), "ft1"));

        // Any resource of the opening account may continue the stream
        let other_resource = Jid::new("bob@example.org/phone");
        match sessions.decode(&other_resource, &data.to_xml()).unwrap() {
            Inbound::Data { received, .. } => assert_eq!(received, 4),
            other => panic!("unexpected inbound: {:?}", other),
        }
    }

    #[test]
    fn test_same_sid_from_two_peers() {
        let mut sessions = IbbSessions::new();
        let carol = Jid::new("carol@example.org");
        open_stream(&mut sessions, "shared", 8);
        let open = IbbOpen {
            block_size: 8,
            sid: "shared".to_string(),
            stanza: None,
        };
        sessions.decode(&carol, &open.to_xml()).unwrap();
        assert_eq!(sessions.len(), 2);

        let close = IbbClose {
            sid: "shared".to_string(),
        };
        sessions.decode(&carol, &close.to_xml()).unwrap();
        assert!(sessions.is_open(&bob(), "shared"));
        assert!(!sessions.is_open(&carol, "shared"));
    }

    #[test]
    fn test_open_streams_are_capped_per_peer() {
        let mut sessions = IbbSessions::new();
        for index in 0..MAX_STREAMS_PER_PEER {
            open_stream(&mut sessions, &format!("s{}", index), 4);
        }
        assert_eq!(sessions.open_for(&bob()), MAX_STREAMS_PER_PEER);

        let one_more = IbbOpen {
            block_size: 4,
            sid: "overflow".to_string(),
            stanza: None,
        };
        assert!(matches!(
            sessions.decode(&bob(), &one_more.to_xml()),
            Err(CodecError::TooManyStreams { limit: MAX_STREAMS_PER_PEER, .. })
        ));

        // Other peers have their own allowance
        let carol = Jid::new("carol@example.org");
        sessions.decode(&carol, &one_more.to_xml()).unwrap();

        // Closing one frees a slot
        let close = IbbClose {
            sid: "s0".to_string(),
        };
        sessions.decode(&bob(), &close.to_xml()).unwrap();
        sessions.decode(&bob(), &one_more.to_xml()).unwrap();
        assert_eq!(sessions.len(), MAX_STREAMS_PER_PEER + 1);
    }

    #[test]
    fn test_duplicate_open_is_rejected() {
        let mut sessions = IbbSessions::new();
        open_stream(&mut sessions, "dup", 8);
        let again = IbbOpen {
            block_size: 8,
            sid: "dup".to_string(),
            stanza: None,
        };
        assert!(matches!(
            sessions.decode(&bob(), &again.to_xml()),
            Err(CodecError::DuplicateSession { .. })
        ));
    }

    #[test]
    fn test_oversized_block_is_rejected() {
        let mut sessions = IbbSessions::new();
        open_stream(&mut sessions, "small", 2);
        let data = IbbData {
            sid: "small".to_string(),
            seq: 0,
            payload: vec![0; 3],
        };
        assert!(matches!(
            sessions.observe(&bob(), IbbElement::Data(data)),
            Err(CodecError::BlockSizeExceeded { size: 3, .. })
        ));
    }

    #[test]
    fn test_close_reports_total_and_forgets_stream() {
        let mut sessions = IbbSessions::new();
        open_stream(&mut sessions, "t", 4);
        let mut sender = IbbSender::new("t", 4).unwrap();
        for block in sender.chunk(b"0123456789") {
            sessions.observe(&bob(), IbbElement::Data(block)).unwrap();
        }
        match sessions.decode(&bob(), &sender.close().to_xml()).unwrap() {
            Inbound::Closed { received, .. } => assert_eq!(received, 10),
            other => panic!("unexpected inbound: {:?}", other),
        }
        assert!(!sessions.is_open(&bob(), "t"));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_invalid_open_attributes() {
        let zero = format!(r#"<open xmlns="{}" block-size="0" sid="s"/>"#, NS_IBB);
        assert!(matches!(
            IbbOpen::from_xml(&zero),
            Err(CodecError::InvalidAttribute { .. })
        ));
        let stanza = format!(
            r#"<open xmlns="{}" block-size="10" sid="s" stanza="presence"/>"#,
            NS_IBB
        );
        assert!(matches!(
            IbbOpen::from_xml(&stanza),
            Err(CodecError::InvalidAttribute { .. })
        ));
        let missing = format!(r#"<open xmlns="{}" sid="s"/>"#, NS_IBB);
        assert!(matches!(
            IbbOpen::from_xml(&missing),
            Err(CodecError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_invalid_data_body_and_seq() {
        let body = format!(r#"<data xmlns="{}" sid="s" seq="1">!!not base64</data>"#, NS_IBB);
        assert!(matches!(
            IbbData::from_xml(&body),
            Err(CodecError::Base64(_))
        ));
        let seq = format!(r#"<data xmlns="{}" sid="s" seq="65536">AA==</data>"#, NS_IBB);
        assert!(matches!(
            IbbData::from_xml(&seq),
            Err(CodecError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_wrapped_base64_body() {
        let xml = format!(
            "<data xmlns=\"{}\" sid=\"s\" seq=\"0\">\n  aGVs\n  bG8=\n</data>",
            NS_IBB
        );
        assert_eq!(IbbData::from_xml(&xml).unwrap().payload, b"hello");
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        let mut sender = IbbSender::new("e", 4).unwrap();
        assert!(sender.chunk(&[]).is_empty());
        assert_eq!(sender.next_sequence(), 0);
        assert!(IbbSender::new("e", 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_chunked_stream_reassembles(
            bytes in proptest::collection::vec(any::<u8>(), 0..2048),
            block_size in 1u16..300,
            start in any::<u16>(),
        ) {
            let mut sender = IbbSender::new("prop", block_size).unwrap().starting_at(start);
            let mut sessions = IbbSessions::new();
            sessions.decode(&bob(), &sender.open().to_xml()).unwrap();

            let mut reassembled = Vec::new();
            for (index, block) in sender.chunk(&bytes).into_iter().enumerate() {
                match sessions.decode(&bob(), &block.to_xml()).unwrap() {
                    Inbound::Data { data, sequence, .. } => {
                        // Receivers start counting at zero
                        if index > 0 || start == 0 {
                            prop_assert_eq!(sequence, SequenceCheck::InOrder);
                        }
                        prop_assert!(data.payload.len() <= usize::from(block_size));
                        reassembled.extend_from_slice(&data.payload);
                    }
                    other => prop_assert!(false, "unexpected inbound: {:?}", other),
                }
            }
            prop_assert_eq!(reassembled, bytes);
        }
    }
}
