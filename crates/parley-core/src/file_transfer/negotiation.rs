//! File offer negotiation element
//!
//! `<file/>` in the SI file-transfer profile describes the offered file and,
//! when resuming, the byte range still wanted.

use serde::{Deserialize, Serialize};

use super::xml::{self, Element};
use super::NS_FILE_TRANSFER;
use crate::errors::{CodecError, CodecResult};

/// Byte range requested when resuming a partial transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRange {
    pub offset: u64,
    pub length: u64,
}

/// Metadata of an offered file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOffer {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub hash: Option<String>,
    pub date: Option<String>,
    pub desc: Option<String>,
    /// `None` means no resumption was requested
    pub range: Option<FileRange>,
}

impl FileOffer {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, offset: u64, length: u64) -> Self {
        self.range = Some(FileRange { offset, length });
        self
    }

    /// First byte the sender will transmit
    pub fn start_offset(&self) -> u64 {
        self.range.map(|r| r.offset).unwrap_or(0)
    }

    pub fn is_resumption(&self) -> bool {
        self.range.is_some()
    }

    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }

    pub fn from_xml(input: &str) -> CodecResult<Self> {
        Self::from_element(&xml::parse(input)?)
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("file")
            .with_namespace(NS_FILE_TRANSFER)
            .with_optional_attr("date", self.date.as_deref())
            .with_optional_attr("hash", self.hash.as_deref())
            .with_optional_attr("name", self.name.as_deref())
            .with_optional_attr("size", self.size);
        if let Some(desc) = &self.desc {
            element = element.with_child(
                Element::new("desc")
                    .with_namespace(NS_FILE_TRANSFER)
                    .with_text(desc),
            );
        }
        if let Some(range) = &self.range {
            element = element.with_child(
                Element::new("range")
                    .with_namespace(NS_FILE_TRANSFER)
                    .with_attr("offset", range.offset)
                    .with_attr("length", range.length),
            );
        }
        element
    }

    pub(crate) fn from_element(element: &Element) -> CodecResult<Self> {
        element.expect("file", NS_FILE_TRANSFER)?;

        let range = match element.child("range") {
            Some(range) => Some(decode_range(range)?),
            None => None,
        };
        let desc = match element.child("desc") {
            Some(desc) => {
                desc.expect("desc", NS_FILE_TRANSFER)?;
                Some(desc.text().to_string())
            }
            None => None,
        };

        Ok(Self {
            name: element.attr("name").map(str::to_string),
            size: element.parse_attr("size")?,
            hash: element.attr("hash").map(str::to_string),
            date: element.attr("date").map(str::to_string),
            desc,
            range,
        })
    }
}

fn decode_range(element: &Element) -> CodecResult<FileRange> {
    element.expect("range", NS_FILE_TRANSFER)?;
    let offset = element.parse_attr::<u64>("offset")?;
    let length = element.parse_attr::<u64>("length")?;
    match (offset, length) {
        (Some(offset), Some(length)) => Ok(FileRange { offset, length }),
        (Some(_), None) => Err(CodecError::malformed_range("offset without length")),
        (None, Some(_)) => Err(CodecError::malformed_range("length without offset")),
        (None, None) => Err(CodecError::malformed_range(
            "range element carries neither offset nor length",
        )),
    }
}
