//! Minimal XML serializer used to build tokens and metadata.

use std::borrow::Cow;

use crate::error::{WsFedError, WsFedResult};

/// The XML declaration emitted at the top of standalone documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Escapes character data.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, false)
}

/// Escapes an attribute value for use inside double quotes.
///
/// Whitespace other than a plain space is written as a character reference
/// so attribute-value normalization cannot alter it.
#[must_use]
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value, true)
}

fn escape(input: &str, attribute: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| match c {
        '&' | '<' | '>' | '\r' => true,
        '"' | '\t' | '\n' => attribute,
        _ => false,
    };

    if !input.chars().any(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            '"' if attribute => out.push_str("&quot;"),
            '\t' if attribute => out.push_str("&#x9;"),
            '\n' if attribute => out.push_str("&#xA;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// A document that is ready to be signed.
///
/// `signature_at` is the byte offset where the enveloped `Signature`
/// element belongs; `reference_id` is the `ID` of the signed element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedXml {
    /// Serialized document.
    pub xml: String,
    /// Insertion offset for the signature.
    pub signature_at: usize,
    /// ID of the element the signature references.
    pub reference_id: String,
}

/// Streaming element writer.
///
/// Elements are closed in LIFO order. Childless elements are written as a
/// start and end tag pair, which is also their canonical form.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    open: Vec<String>,
    mark: Option<usize>,
}

impl XmlWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that starts with the XML declaration.
    #[must_use]
    pub fn with_declaration() -> Self {
        Self {
            buf: XML_DECLARATION.to_string(),
            ..Self::default()
        }
    }

    /// Opens an element.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(name);
        for (key, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape_attr(value));
            self.buf.push('"');
        }
        self.buf.push('>');
        self.open.push(name.to_string());
        self
    }

    /// Closes the most recently opened element.
    pub fn end(&mut self) -> &mut Self {
        if let Some(name) = self.open.pop() {
            self.buf.push_str("</");
            self.buf.push_str(&name);
            self.buf.push('>');
        }
        self
    }

    /// Writes character data.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(&escape_text(text));
        self
    }

    /// Writes an element with text content.
    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> &mut Self {
        self.start(name, attrs).text(text).end()
    }

    /// Writes a childless element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start(name, attrs).end()
    }

    /// Appends pre-serialized, well-formed XML.
    pub fn raw(&mut self, xml: &str) -> &mut Self {
        self.buf.push_str(xml);
        self
    }

    /// Records the current position as the signature insertion point.
    pub fn mark_signature(&mut self) -> &mut Self {
        self.mark = Some(self.buf.len());
        self
    }

    /// Closes any open elements and returns the document.
    #[must_use]
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end();
        }
        self.buf
    }

    /// Closes any open elements and returns the document with its
    /// signature insertion point.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::Xml`] if [`mark_signature`](Self::mark_signature)
    /// was never called.
    pub fn finish_unsigned(self, reference_id: impl Into<String>) -> WsFedResult<UnsignedXml> {
        let signature_at = self
            .mark
            .ok_or_else(|| WsFedError::Xml("signature position was not marked".to_string()))?;
        Ok(UnsignedXml {
            xml: self.finish(),
            signature_at,
            reference_id: reference_id.into(),
        })
    }
}
