//! SVG Document Model
//!
//! A small owned element tree built on quick-xml. Attribute values are kept
//! unescaped; text nodes keep their raw markup so they round-trip verbatim.

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("document has no root element")]
    Empty,

    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),

    #[error("unexpected content after the root element")]
    TrailingContent,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("missing viewBox and width/height on root element")]
    MissingViewBox,

    #[error("invalid viewBox \"{0}\"")]
    InvalidViewBox(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw character data, still escaped.
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Sets an attribute, replacing the value in place when it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos).value)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Depth-first visit of this element and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape(attr.value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => e.write_to(out),
        Node::Text(text) => out.push_str(text),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

/// Declared coordinate space of an icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse "min-x min-y width height", separated by whitespace and/or commas.
    pub fn parse(value: &str) -> Result<Self, SvgError> {
        let parts: Vec<f64> = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| SvgError::InvalidViewBox(value.to_string()))?;

        match parts.as_slice() {
            [left, top, width, height]
                if parts.iter().all(|v| v.is_finite()) && *width > 0.0 && *height > 0.0 =>
            {
                Ok(Self {
                    left: *left,
                    top: *top,
                    width: *width,
                    height: *height,
                })
            }
            _ => Err(SvgError::InvalidViewBox(value.to_string())),
        }
    }

    fn from_root(root: &Element) -> Result<Self, SvgError> {
        if let Some(vb) = root.attr("viewBox") {
            return Self::parse(vb);
        }
        match (root.attr("width"), root.attr("height")) {
            (Some(w), Some(h)) => {
                let size = format!("0 0 {} {}", strip_px(w), strip_px(h));
                Self::parse(&size)
            }
            _ => Err(SvgError::MissingViewBox),
        }
    }
}

fn strip_px(value: &str) -> &str {
    let value = value.trim();
    value.strip_suffix("px").unwrap_or(value)
}

/// A parsed icon: the `<svg>` root plus its resolved viewBox.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub root: Element,
    pub view_box: ViewBox,
}

impl SvgDocument {
    pub fn parse(source: &str) -> Result<Self, SvgError> {
        let root = parse_root(source)?;
        let local = root.name.rsplit(':').next().unwrap_or(&root.name);
        if local != "svg" {
            return Err(SvgError::NotSvg(root.name));
        }
        let view_box = ViewBox::from_root(&root)?;
        Ok(Self { root, view_box })
    }

    pub fn width(&self) -> f64 {
        self.view_box.width
    }

    pub fn height(&self) -> f64 {
        self.view_box.height
    }

    /// Inner markup of the root element, without the `<svg>` wrapper.
    pub fn body(&self) -> String {
        let mut out = String::new();
        for child in &self.root.children {
            write_node(child, &mut out);
        }
        out
    }
}

fn parse_root(source: &str) -> Result<Element, SvgError> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|source| SvgError::Xml {
            position: reader.error_position() as u64,
            source,
        })?;
        match event {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end names
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(t) => push_text(&mut stack, &String::from_utf8_lossy(&t))?,
            Event::GeneralRef(r) => {
                push_text(&mut stack, &format!("&{};", String::from_utf8_lossy(&r)))?
            }
            Event::CData(c) => push_text(
                &mut stack,
                &format!("<![CDATA[{}]]>", String::from_utf8_lossy(&c)),
            )?,
            Event::Comment(c) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Event::Eof => break,
            // declarations, doctypes and processing instructions
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(SvgError::Unclosed(open.name));
    }
    root.ok_or(SvgError::Empty)
}

fn element_from(start: &BytesStart) -> Result<Element, SvgError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SvgError::Attribute(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw)
            .map_err(|e| SvgError::Attribute(format!("{}: {}", key, e)))?
            .into_owned();
        element.set_attr(&key, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), SvgError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(SvgError::TrailingContent),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), SvgError> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(Node::Text(prev)) = parent.children.last_mut() {
                prev.push_str(text);
            } else {
                parent.children.push(Node::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SvgError::TrailingContent),
    }
}
