//! Owned element tree built from quick-xml events.
//!
//! OPDS documents are small and irregular: repeated elements may appear once
//! or many times, text may be bare or wrapped in typed/attributed elements.
//! Building a tiny tree up front lets the rest of the crate ask shape-neutral
//! questions (`children_named`, `text_content`) instead of matching raw events.
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum nesting depth accepted while building the tree.
const MAX_XML_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("unexpected end of document inside <{0}>")]
    Unclosed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element keyed by its local name (namespace prefixes dropped).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// All direct children with the given local name, in document order.
    ///
    /// Absent yields nothing, a single element yields one item; callers never
    /// need to distinguish the scalar and repeated cases.
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.elements().filter(move |element| element.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn has_child_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Text directly inside this element, ignoring nested elements.
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All text in this subtree, in document order, separated by single spaces.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        collect_text(self, &mut parts);
        parts.join(" ")
    }
}

fn collect_text<'a>(element: &'a Element, parts: &mut Vec<&'a str>) {
    for node in &element.children {
        match node {
            Node::Text(text) if !text.is_empty() => parts.push(text),
            Node::Text(_) => {}
            Node::Element(child) => collect_text(child, parts),
        }
    }
}

/// Parses an XML document and returns its root element.
///
/// SEC-002: quick-xml only resolves the five predefined entities; text with an
/// unknown entity reference is kept verbatim rather than expanded.
pub fn parse_document(xml: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                // SEC-003: Reject excessively nested documents
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(XmlError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                stack.push(start_element(&e, &reader));
            }
            Ok(Event::Empty(e)) => {
                let element = start_element(&e, &reader);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(e) => {
                        tracing::debug!(error = %e, "Keeping text with unresolved entity verbatim");
                        String::from_utf8_lossy(&t).into_owned()
                    }
                };
                push_text(&mut stack, text);
            }
            Ok(Event::CData(c)) => {
                push_text(&mut stack, String::from_utf8_lossy(&c).trim().to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlError::Parse(e.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    root.ok_or(XmlError::NoRoot)
}

fn start_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.local_name().as_ref()));

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed XML attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                tracing::debug!(attribute = %key, error = %e, "Keeping attribute value verbatim");
                String::from_utf8_lossy(&attr.value).into_owned()
            }
        };
        element.attributes.push((key, value));
    }

    element
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(stack: &mut [Element], text: String) {
    // Text outside the root element (or whitespace-only text) carries nothing
    if text.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Text(text));
    }
}
