//! Materialized XML result trees.
//!
//! A response page is parsed once into an owned [`Element`] tree; the
//! flattener then performs a pure in-memory walk over it. The tree is never
//! mutated after parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FlattenError, Result};

/// One node of a result tree: either an element or a run of character data.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// An element node with its tag name, attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    /// Parse a whole document into an owned tree, returning the root element.
    ///
    /// Whitespace in text is kept verbatim; the flattener decides what to
    /// strip. Anything before or after the root element is ignored.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| FlattenError::Parse(e.to_string()))?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| FlattenError::Parse("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let decoded = text
                            .decode()
                            .map_err(|e| FlattenError::Parse(e.to_string()))?;
                        parent.children.push(XmlNode::Text(decoded.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(raw));
                    }
                }
                Event::GeneralRef(gref) => {
                    if let Some(parent) = stack.last_mut() {
                        let name = String::from_utf8_lossy(&gref).into_owned();
                        parent.children.push(XmlNode::Text(resolve_reference(&name)));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(FlattenError::Parse("unclosed element".to_string()));
        }
        root.ok_or_else(|| FlattenError::Parse("document has no root element".to_string()))
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First element with the given tag, depth-first in document order,
    /// including this element itself.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(tag))
    }

    /// Every element with the given tag, depth-first in document order,
    /// including this element itself.
    pub fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_by_tag(tag, &mut out);
        out
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_by_tag(tag, out);
        }
    }

    /// Concatenated text of this element and all descendants, in document
    /// order. Mirrors DOM `getTextContent`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.append_text(&mut out);
        out
    }

    fn append_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(el) => el.append_text(out),
            }
        }
    }

    /// Text of the first element with the given tag, if present.
    pub fn first_text(&self, tag: &str) -> Option<String> {
        self.find(tag).map(Element::text_content)
    }
}

fn element_from_start(start: &BytesStart) -> Result<Element> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FlattenError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| FlattenError::Parse(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        tag,
        attrs,
        children: Vec::new(),
    })
}

/// Resolve a general reference name (the part between `&` and `;`) to its
/// replacement text. Unknown references are kept in their escaped form.
fn resolve_reference(name: &str) -> String {
    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        other => match other.strip_prefix('#').and_then(parse_char_ref) {
            Some(ch) => ch,
            None => format!("&{other};"),
        },
    }
}

fn parse_char_ref(code: &str) -> Option<String> {
    let value = if let Some(hex) = code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        code.parse().ok()?
    };
    char::from_u32(value).map(String::from)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
