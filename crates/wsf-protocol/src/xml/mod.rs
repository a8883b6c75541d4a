//! XML serialization, canonicalization and lookup helpers.

mod c14n;
mod writer;

pub use c14n::{canonicalize, C14nTarget};
pub use writer::{escape_attr, escape_text, UnsignedXml, XmlWriter, XML_DECLARATION};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::WsFedResult;

/// Returns the text content of the first element with the given local name.
///
/// Nested markup is ignored; only character data is concatenated.
///
/// # Errors
///
/// Returns an error if the document is malformed before the element closes.
pub fn element_text(xml: &str, local_name: &str) -> WsFedResult<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut text: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if text.is_some() {
                    depth += 1;
                } else if e.local_name().as_ref() == local_name.as_bytes() {
                    text = Some(String::new());
                }
            }
            Event::Empty(e) => {
                if text.is_none() && e.local_name().as_ref() == local_name.as_bytes() {
                    return Ok(Some(String::new()));
                }
            }
            Event::Text(t) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = text.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if text.is_some() {
                    if depth == 0 {
                        return Ok(text);
                    }
                    depth -= 1;
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Returns an attribute of the first element with the given local name.
///
/// # Errors
///
/// Returns an error if the document is malformed before the element.
pub fn element_attribute(
    xml: &str,
    local_name: &str,
    attribute: &str,
) -> WsFedResult<Option<String>> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == attribute.as_bytes() {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
                return Ok(None);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
