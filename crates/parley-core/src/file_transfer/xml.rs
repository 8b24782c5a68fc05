//! Minimal element tree for the file-transfer wire elements
//!
//! The elements involved are small and shallow, so they are read into an
//! [`Element`] tree with a namespace-aware `quick-xml` reader and inspected
//! from there. Every element carries its resolved namespace, whether it was
//! declared as a default or through a prefix. Serialization writes the tree
//! back with default namespace declarations and escaped values.

use std::str::FromStr;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::errors::{CodecError, CodecResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds the attribute only when a value is present
    pub fn with_optional_attr<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_attr(key, value),
            None => self,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn required_attr(&self, key: &str) -> CodecResult<&str> {
        self.attr(key)
            .ok_or_else(|| CodecError::missing_attribute(&self.name, key))
    }

    /// Parse an optional attribute, failing on a present but unparsable value
    pub fn parse_attr<T: FromStr>(&self, key: &str) -> CodecResult<Option<T>> {
        match self.attr(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| CodecError::invalid_attribute(key, raw)),
            None => Ok(None),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Character data exactly as received
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check the element name and its resolved namespace
    pub fn expect(&self, name: &str, namespace: &str) -> CodecResult<()> {
        if self.name != name {
            return Err(CodecError::UnexpectedElement {
                expected: name.to_string(),
                found: self.name.clone(),
            });
        }
        if self.namespace.as_deref() != Some(namespace) {
            return Err(CodecError::WrongNamespace {
                element: self.name.clone(),
                expected: namespace.to_string(),
                found: self.namespace.clone(),
            });
        }
        Ok(())
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out, None);
        out
    }

    /// Declares a default namespace only where it differs from the parent's
    fn write_into(&self, out: &mut String, inherited: Option<&str>) {
        out.push('<');
        out.push_str(&self.name);
        let namespace = self.namespace.as_deref();
        if namespace != inherited {
            push_attribute(out, "xmlns", namespace.unwrap_or(""));
        }
        for (key, value) in &self.attributes {
            push_attribute(out, key, value);
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_into(out, namespace);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    fn from_start(start: &BytesStart<'_>, resolved: ResolveResult<'_>) -> CodecResult<Self> {
        let name = std::str::from_utf8(start.local_name().as_ref())
            .map_err(CodecError::xml)?
            .to_string();
        let mut element = Element::new(&name);
        element.namespace = resolved_namespace(resolved)?;
        for attribute in start.attributes() {
            let attribute = attribute.map_err(CodecError::xml)?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(CodecError::xml)?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(CodecError::xml)?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

fn resolved_namespace(resolved: ResolveResult<'_>) -> CodecResult<Option<String>> {
    match resolved {
        ResolveResult::Bound(namespace) => std::str::from_utf8(namespace.as_ref())
            .map(|ns| Some(ns.to_string()))
            .map_err(CodecError::xml),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(CodecError::xml(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn push_attribute(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

/// Parse a document holding exactly one root element
pub(crate) fn parse(input: &str) -> CodecResult<Element> {
    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event().map_err(CodecError::xml)? {
            (resolved, XmlEvent::Start(start)) => {
                stack.push(Element::from_start(&start, resolved)?)
            }
            (resolved, XmlEvent::Empty(start)) => {
                let element = Element::from_start(&start, resolved)?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, XmlEvent::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::xml("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, XmlEvent::Text(text)) => {
                let text = text.unescape().map_err(CodecError::xml)?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(CodecError::xml("text outside of root element")),
                }
            }
            (_, XmlEvent::CData(data)) => {
                let text = std::str::from_utf8(&data).map_err(CodecError::xml)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(text);
                }
            }
            (_, XmlEvent::Eof) => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CodecError::xml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or(CodecError::EmptyDocument)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> CodecResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(CodecError::xml("multiple root elements")),
    }
    Ok(())
}
