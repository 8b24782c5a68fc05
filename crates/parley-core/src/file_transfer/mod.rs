//! File-transfer wire data model
//!
//! Negotiation metadata (`<file/>` in the SI file-transfer profile) and the
//! in-band bytestream elements that carry the content.

mod ibb;
mod negotiation;
mod xml;

pub use ibb::{
    IbbClose, IbbData, IbbElement, IbbOpen, IbbSender, IbbSessions, Inbound, SequenceCheck,
    StanzaKind, MAX_STREAMS_PER_PEER,
};
pub use negotiation::{FileOffer, FileRange};

use crate::errors::{CodecError, CodecResult};

pub const NS_FILE_TRANSFER: &str = "http://jabber.org/protocol/si/profile/file-transfer";
pub const NS_IBB: &str = "http://jabber.org/protocol/ibb";

/// Any file-transfer element that can appear in an event payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTransferElement {
    Offer(FileOffer),
    Ibb(IbbElement),
}

impl FileTransferElement {
    /// Classify a payload by its root element and decode it
    pub fn decode(input: &str) -> CodecResult<Self> {
        let root = xml::parse(input)?;
        match root.name.as_str() {
            "file" => FileOffer::from_element(&root).map(FileTransferElement::Offer),
            "open" | "data" | "close" => {
                IbbElement::from_element(&root).map(FileTransferElement::Ibb)
            }
            other => Err(CodecError::UnexpectedElement {
                expected: "file, open, data or close".to_string(),
                found: other.to_string(),
            }),
        }
    }

    pub fn to_xml(&self) -> String {
        match self {
            FileTransferElement::Offer(offer) => offer.to_xml(),
            FileTransferElement::Ibb(element) => element.to_xml(),
        }
    }
}
