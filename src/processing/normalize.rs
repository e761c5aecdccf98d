//! # XML Normalization
//!
//! Converts the XML fragments returned by the ordering service into a generic
//! [`Node`] tree by walking the quick-xml event stream.
//!
//! ## Shape rules
//!
//! - An element with no attributes and no child elements becomes a
//!   [`Node::Scalar`] holding its text (`""` when empty).
//! - Any other element becomes a [`Node::Object`]:
//!   - attributes are gathered under the reserved `@attributes` key,
//!   - child elements are keyed by local name,
//!   - repeated siblings collapse into a [`Node::Array`] in document order,
//!   - non-blank text next to attributes or children lands under `#text`.
//! - A fragment is an object keyed by its top-level element names.
//!
//! ```ignore
//! let doc = normalize(r#"<Menu><Item id="1">Pizza</Item></Menu>"#)?;
//! let item = doc.field("Menu")?.field("Item")?;
//! assert_eq!(item.attributes()?["id"], "1");
//! ```
//!
//! Namespace prefixes are dropped from element names. Only unprefixed
//! attributes are kept; `xmlns` declarations and attributes such as
//! `diffgr:id` are skipped.
//!
//! Text is kept as written; chunks that are only whitespace (indentation
//! between elements) are dropped.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::{Result, ServiceError};

/// Reserved key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";

/// Reserved key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Attribute set of one element, lifted out of a normalized node.
pub type AttributeBag = BTreeMap<String, String>;

/// Normalized XML tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Object(BTreeMap<String, Node>),
    Array(Vec<Node>),
    Scalar(String),
}

impl Node {
    /// Child under `key`, if this is an object that has one.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Child under `key`, or [`ServiceError::MissingField`].
    pub fn field(&self, key: &str) -> Result<&Node> {
        self.get(key)
            .ok_or_else(|| ServiceError::MissingField(key.to_string()))
    }

    /// Text content: the scalar itself, or the `#text` entry of an object.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s.as_str()),
            Node::Object(map) => map.get(TEXT_KEY).and_then(Node::text),
            Node::Array(_) => None,
        }
    }

    /// Lifts the `@attributes` bag out of this node.
    ///
    /// Fails with [`ServiceError::MissingField`] when the element carried no
    /// attributes.
    pub fn attributes(&self) -> Result<AttributeBag> {
        match self.field(ATTRIBUTES_KEY)? {
            Node::Object(map) => Ok(map
                .iter()
                .filter_map(|(k, v)| v.text().map(|t| (k.clone(), t.to_string())))
                .collect()),
            _ => Err(ServiceError::MissingField(ATTRIBUTES_KEY.to_string())),
        }
    }

    /// Views this node as a list: array elements, or the node itself.
    ///
    /// A single `<order>` normalizes to an object rather than an array, so
    /// callers iterate through this instead of matching on [`Node::Array`].
    pub fn items(&self) -> Vec<&Node> {
        match self {
            Node::Array(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// First object entry named `name`, searched breadth-first.
    pub fn descendant(&self, name: &str) -> Option<&Node> {
        let mut queue = VecDeque::from([self]);

        while let Some(node) = queue.pop_front() {
            match node {
                Node::Object(map) => {
                    if let Some(found) = map.get(name) {
                        return Some(found);
                    }
                    queue.extend(
                        map.iter()
                            .filter(|(k, _)| k.as_str() != ATTRIBUTES_KEY)
                            .map(|(_, v)| v),
                    );
                }
                Node::Array(items) => queue.extend(items.iter()),
                Node::Scalar(_) => {}
            }
        }

        None
    }

    /// Like [`Node::descendant`], failing with [`ServiceError::MissingField`].
    pub fn find(&self, name: &str) -> Result<&Node> {
        self.descendant(name)
            .ok_or_else(|| ServiceError::MissingField(name.to_string()))
    }

    /// The single root element of a normalized document.
    pub fn root(&self) -> Result<&Node> {
        match self {
            Node::Object(map) if map.len() == 1 => Ok(map.values().next().unwrap_or(self)),
            Node::Object(map) => Err(ServiceError::Xml(format!(
                "expected a single root element, found {}",
                map.len()
            ))),
            _ => Err(ServiceError::Xml("document has no root element".to_string())),
        }
    }
}

/// Element under construction.
struct Frame {
    name: String,
    attributes: AttributeBag,
    children: Vec<(String, Node)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = AttributeBag::new();

        for attr in start.attributes() {
            let attr = attr?;
            // prefixed attributes (diffgr:id, msdata:rowOrder, xmlns:*) belong
            // to other vocabularies and never shadow the element's own
            if attr.key.prefix().is_some() || attr.key.as_ref() == b"xmlns" {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            attributes.insert(key, attr.unescape_value()?.into_owned());
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Node) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Node::Scalar(self.text));
        }

        let mut map = group(self.children);
        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .into_iter()
                .map(|(k, v)| (k, Node::Scalar(v)))
                .collect();
            map.insert(ATTRIBUTES_KEY.to_string(), Node::Object(attrs));
        }
        if !self.text.trim().is_empty() {
            map.insert(TEXT_KEY.to_string(), Node::Scalar(self.text));
        }

        (self.name, Node::Object(map))
    }
}

/// Keys sibling nodes by name, folding repeats into arrays.
fn group(children: Vec<(String, Node)>) -> BTreeMap<String, Node> {
    let mut map = BTreeMap::new();

    for (name, node) in children {
        match map.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Node::Array(items) => items.push(node),
                existing => {
                    let first = std::mem::replace(existing, Node::Array(Vec::new()));
                    *existing = Node::Array(vec![first, node]);
                }
            },
        }
    }

    map
}

fn attach(stack: &mut [Frame], top: &mut Vec<(String, Node)>, child: (String, Node)) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(child),
        None => top.push(child),
    }
}

/// Normalizes an XML document or fragment into a [`Node`] tree keyed by the
/// top-level element names.
///
/// # Errors
///
/// [`ServiceError::Xml`] when the input is not well-formed or has no element.
pub fn normalize(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Frame> = Vec::new();
    let mut top: Vec<(String, Node)> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::open(&e)?),
            Event::Empty(e) => {
                let element = Frame::open(&e)?.close();
                attach(&mut stack, &mut top, element);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ServiceError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut top, frame.close());
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    let raw = std::str::from_utf8(&c)
                        .map_err(|e| ServiceError::Xml(e.to_string()))?;
                    frame.text.push_str(raw);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ServiceError::Xml(format!("unclosed element <{}>", open.name)));
    }
    if top.is_empty() {
        return Err(ServiceError::Xml("document has no root element".to_string()));
    }

    Ok(Node::Object(group(top)))
}
