//! XML archives over a small element tree.
//!
//! Every block is an element named after the block. Primitive values in an
//! unordered block are attributes of its element; primitive values in an
//! array block are child elements carrying a `value` attribute:
//!
//! ```xml
//! <resource>
//!   <node _id="101">
//!     <attributes>
//!       <attribute name="Name" type="String" value="Apple"/>
//!     </attributes>
//!   </node>
//! </resource>
//! ```
//!
//! Documents are parsed with `quick-xml` into [`XmlElement`] trees and
//! written back the same way.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::archive::Archive;
use crate::error::ArchiveError;

/// Attribute name used for primitive values stored inside array blocks.
const ARRAY_VALUE_ATTRIBUTE: &str = "value";

/// One XML element with its attributes and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }
}

fn utf8(bytes: &[u8]) -> Result<String, ArchiveError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ArchiveError::Xml(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, ArchiveError> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ArchiveError::Xml(e.to_string()))?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ArchiveError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ArchiveError::Xml("document has more than one root".into())),
    }
    Ok(())
}

/// Parses an XML document into its root element. Text content is ignored.
pub fn parse_document(text: &str) -> Result<XmlElement, ArchiveError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ArchiveError::Xml("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ArchiveError::Xml("unclosed element at end of document".into()));
    }
    root.ok_or_else(|| ArchiveError::Xml("document has no root element".into()))
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: &XmlElement,
) -> Result<(), ArchiveError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in &element.children {
            write_element(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    }
    Ok(())
}

/// Writes an element tree as an indented XML document.
pub fn write_document(root: &XmlElement) -> Result<String, ArchiveError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_element(&mut writer, root)?;
    utf8(&writer.into_inner().into_inner())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Unordered,
    Array { expected: usize },
}

/// Builds an XML element tree.
#[derive(Default)]
pub struct XmlOutputArchive {
    stack: Vec<(XmlElement, BlockKind)>,
    root: Option<XmlElement>,
}

impl XmlOutputArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the archive and returns the root element.
    pub fn into_element(self) -> Result<XmlElement, ArchiveError> {
        if !self.stack.is_empty() {
            return Err(ArchiveError::UnbalancedBlock(format!(
                "{} blocks left open",
                self.stack.len()
            )));
        }
        self.root
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no root block was written".into()))
    }

    /// Consumes the archive and returns the document text.
    pub fn into_string(self) -> Result<String, ArchiveError> {
        write_document(&self.into_element()?)
    }

    fn begin(&mut self, name: &str, kind: BlockKind) -> Result<(), ArchiveError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ArchiveError::UnbalancedBlock(
                "archive already has a root block".into(),
            ));
        }
        self.stack.push((XmlElement::new(name), kind));
        Ok(())
    }

    fn emit(&mut self, name: &str, text: String) -> Result<(), ArchiveError> {
        let (element, kind) = self.stack.last_mut().ok_or_else(|| {
            ArchiveError::UnbalancedBlock(format!("element '{name}' written outside of a block"))
        })?;
        match kind {
            BlockKind::Unordered => element.attributes.push((name.to_owned(), text)),
            BlockKind::Array { .. } => {
                let mut item = XmlElement::new(name);
                item.attributes.push((ARRAY_VALUE_ATTRIBUTE.to_owned(), text));
                element.children.push(item);
            }
        }
        Ok(())
    }
}

impl Archive for XmlOutputArchive {
    fn is_input(&self) -> bool {
        false
    }

    fn is_human_readable(&self) -> bool {
        true
    }

    fn is_unordered_access_supported(&self) -> bool {
        true
    }

    fn has_element(&self, _name: &str) -> bool {
        false
    }

    fn begin_unordered_block(&mut self, name: &str) -> Result<(), ArchiveError> {
        self.begin(name, BlockKind::Unordered)
    }

    fn begin_array_block(&mut self, name: &str, size_hint: usize) -> Result<usize, ArchiveError> {
        self.begin(
            name,
            BlockKind::Array {
                expected: size_hint,
            },
        )?;
        Ok(size_hint)
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        let (element, kind) = self
            .stack
            .pop()
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no open block to close".into()))?;
        if let BlockKind::Array { expected } = kind {
            if element.children.len() != expected {
                return Err(ArchiveError::ArraySizeMismatch {
                    block: element.name,
                    expected,
                    actual: element.children.len(),
                });
            }
        }
        match self.stack.last_mut() {
            Some((parent, _)) => parent.children.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_u8(&mut self, name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_i32(&mut self, name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_u32(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_i64(&mut self, name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_u64(&mut self, name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_f32(&mut self, name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_f64(&mut self, name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        self.emit(name, value.to_string())
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        self.emit(name, value.clone())
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        self.emit(name, BASE64.encode(value))
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

enum InputFrame<'a> {
    Unordered(&'a XmlElement),
    Array { element: &'a XmlElement, next: usize },
}

/// Reads an XML element tree.
pub struct XmlInputArchive<'a> {
    root: &'a XmlElement,
    root_consumed: bool,
    stack: Vec<InputFrame<'a>>,
}

impl<'a> XmlInputArchive<'a> {
    pub fn new(root: &'a XmlElement) -> Self {
        Self {
            root,
            root_consumed: false,
            stack: Vec::new(),
        }
    }

    fn next_element(&mut self, name: &str) -> Result<&'a XmlElement, ArchiveError> {
        match self.stack.last_mut() {
            Some(InputFrame::Unordered(element)) => {
                let element: &'a XmlElement = *element;
                element
                    .child(name)
                    .ok_or_else(|| ArchiveError::ElementNotFound {
                        name: name.to_owned(),
                        block: element.name.clone(),
                    })
            }
            Some(InputFrame::Array { element, next }) => {
                let element: &'a XmlElement = *element;
                let child = element
                    .children
                    .get(*next)
                    .ok_or_else(|| ArchiveError::ArrayOverrun {
                        block: element.name.clone(),
                    })?;
                *next += 1;
                Ok(child)
            }
            None if !self.root_consumed => {
                if self.root.name != name {
                    return Err(ArchiveError::ElementNotFound {
                        name: name.to_owned(),
                        block: format!("<document root '{}'>", self.root.name),
                    });
                }
                self.root_consumed = true;
                Ok(self.root)
            }
            None => Err(ArchiveError::UnbalancedBlock(format!(
                "block '{name}' read after the root block was closed"
            ))),
        }
    }

    fn read_text(&mut self, name: &str) -> Result<&'a str, ArchiveError> {
        let unordered: Option<&'a XmlElement> = match self.stack.last() {
            Some(InputFrame::Unordered(element)) => Some(*element),
            Some(InputFrame::Array { .. }) => None,
            None => {
                return Err(ArchiveError::UnbalancedBlock(format!(
                    "element '{name}' read outside of a block"
                )));
            }
        };
        let (element, attribute) = match unordered {
            Some(element) => (element, name),
            None => (self.next_element(name)?, ARRAY_VALUE_ATTRIBUTE),
        };
        element
            .attribute(attribute)
            .ok_or_else(|| ArchiveError::ElementNotFound {
                name: name.to_owned(),
                block: element.name.clone(),
            })
    }

    fn parse<T>(&mut self, name: &str) -> Result<T, ArchiveError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let text = self.read_text(name)?;
        text.trim()
            .parse::<T>()
            .map_err(|e: T::Err| ArchiveError::invalid_value(name, format!("'{text}': {e}")))
    }
}

impl Archive for XmlInputArchive<'_> {
    fn is_input(&self) -> bool {
        true
    }

    fn is_human_readable(&self) -> bool {
        true
    }

    fn is_unordered_access_supported(&self) -> bool {
        true
    }

    fn has_element(&self, name: &str) -> bool {
        match self.stack.last() {
            Some(InputFrame::Unordered(element)) => {
                element.attribute(name).is_some() || element.child(name).is_some()
            }
            Some(InputFrame::Array { element, next }) => *next < element.children.len(),
            None => !self.root_consumed && self.root.name == name,
        }
    }

    fn begin_unordered_block(&mut self, name: &str) -> Result<(), ArchiveError> {
        let element = self.next_element(name)?;
        self.stack.push(InputFrame::Unordered(element));
        Ok(())
    }

    fn begin_array_block(&mut self, name: &str, _size_hint: usize) -> Result<usize, ArchiveError> {
        let element = self.next_element(name)?;
        self.stack.push(InputFrame::Array { element, next: 0 });
        Ok(element.children.len())
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no open block to close".into()))
    }

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_u8(&mut self, name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_i32(&mut self, name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_u32(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_i64(&mut self, name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_u64(&mut self, name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_f32(&mut self, name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_f64(&mut self, name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        *value = self.parse(name)?;
        Ok(())
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        *value = self.read_text(name)?.to_owned();
        Ok(())
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        let encoded = self.read_text(name)?;
        *value = BASE64
            .decode(encoded.trim())
            .map_err(|e| ArchiveError::invalid_value(name, e.to_string()))?;
        Ok(())
    }
}
