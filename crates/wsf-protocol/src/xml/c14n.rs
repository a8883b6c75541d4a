//! Exclusive XML Canonicalization 1.0 (without comments).
//!
//! Produces the canonical octets of one element subtree of a parsed
//! document: namespace declarations are emitted only where visibly
//! utilized, attributes are ordered, empty elements are expanded and
//! character data is re-escaped.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{WsFedError, WsFedResult};
use crate::types::XMLDSIG_NS;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Attribute names treated as element identifiers.
const ID_ATTRIBUTES: &[&str] = &["ID", "Id", "AssertionID"];

/// Which subtree to canonicalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nTarget<'a> {
    /// The document element.
    Root,
    /// The element whose `ID`, `Id` or `AssertionID` equals the value.
    Id(&'a str),
    /// The first element with the given local name.
    FirstNamed(&'a str),
}

/// Canonicalizes the target subtree of `xml`.
///
/// With `exclude_signature` set, the first `ds:Signature` child of the
/// target is omitted (the enveloped-signature transform).
///
/// # Errors
///
/// Returns [`WsFedError::Xml`] for malformed input and
/// [`WsFedError::Signature`] if the target is not present.
pub fn canonicalize(xml: &str, target: C14nTarget<'_>, exclude_signature: bool) -> WsFedResult<String> {
    let mut reader = Reader::from_str(xml);
    let mut state = Canonicalizer::new(target, exclude_signature);

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e, false)?,
            Event::Empty(e) => state.open(&e, true)?,
            Event::End(_) => state.close(),
            Event::Text(t) => {
                if state.emitting() {
                    let text = t.unescape()?;
                    state.out.push_str(&escape_c14n_text(&text));
                }
            }
            Event::CData(c) => {
                if state.emitting() {
                    let text = utf8(&c)?;
                    state.out.push_str(&escape_c14n_text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        if state.done {
            return Ok(state.out);
        }
    }

    Err(WsFedError::Signature(match target {
        C14nTarget::Root => "document has no root element".to_string(),
        C14nTarget::Id(id) => format!("no element with ID '{id}'"),
        C14nTarget::FirstNamed(name) => format!("no {name} element"),
    }))
}

type Bindings = Vec<(String, String)>;

struct Canonicalizer<'t> {
    target: C14nTarget<'t>,
    exclude_signature: bool,
    out: String,
    /// Declarations made by every open element of the document.
    in_scope: Vec<Bindings>,
    /// Qualified name and rendered declarations of every open output element.
    rendered: Vec<(String, Bindings)>,
    depth: usize,
    target_depth: Option<usize>,
    skip_depth: Option<usize>,
    signature_skipped: bool,
    done: bool,
}

impl<'t> Canonicalizer<'t> {
    fn new(target: C14nTarget<'t>, exclude_signature: bool) -> Self {
        Self {
            target,
            exclude_signature,
            out: String::new(),
            in_scope: Vec::new(),
            rendered: Vec::new(),
            depth: 0,
            target_depth: None,
            skip_depth: None,
            signature_skipped: false,
            done: false,
        }
    }

    fn emitting(&self) -> bool {
        self.target_depth.is_some() && self.skip_depth.is_none() && !self.done
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> WsFedResult<()> {
        self.in_scope.push(namespace_declarations(e)?);
        self.depth += 1;

        if self.skip_depth.is_none() {
            match self.target_depth {
                None => {
                    if self.is_target(e)? {
                        self.target_depth = Some(self.depth);
                        self.render_start(e)?;
                    }
                }
                Some(target_depth) => {
                    if self.depth == target_depth + 1 && self.is_enveloped_signature(e)? {
                        self.signature_skipped = true;
                        self.skip_depth = Some(self.depth);
                    } else {
                        self.render_start(e)?;
                    }
                }
            }
        }

        if empty {
            self.close();
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(skip) = self.skip_depth {
            if self.depth == skip {
                self.skip_depth = None;
            }
        } else if let Some(target_depth) = self.target_depth {
            if let Some((name, _)) = self.rendered.pop() {
                self.out.push_str("</");
                self.out.push_str(&name);
                self.out.push('>');
            }
            if self.depth == target_depth {
                self.done = true;
            }
        }
        self.in_scope.pop();
        self.depth = self.depth.saturating_sub(1);
    }

    fn is_target(&self, e: &BytesStart<'_>) -> WsFedResult<bool> {
        match self.target {
            C14nTarget::Root => Ok(true),
            C14nTarget::FirstNamed(local) => Ok(e.local_name().as_ref() == local.as_bytes()),
            C14nTarget::Id(id) => {
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = utf8(attr.key.as_ref())?;
                    if ID_ATTRIBUTES.contains(&key) && attr.unescape_value()? == id {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn is_enveloped_signature(&self, e: &BytesStart<'_>) -> WsFedResult<bool> {
        if !self.exclude_signature || self.signature_skipped {
            return Ok(false);
        }
        if e.local_name().as_ref() != b"Signature" {
            return Ok(false);
        }
        let name = e.name();
        let qname = utf8(name.as_ref())?;
        let (prefix, _) = split_qname(qname);
        Ok(self.resolve(prefix) == XMLDSIG_NS)
    }

    /// Namespace URI bound to `prefix` in the document; empty if unbound.
    fn resolve(&self, prefix: &str) -> &str {
        if prefix == "xml" {
            return XML_NS;
        }
        self.in_scope
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map_or("", |(_, uri)| uri.as_str())
    }

    /// Namespace URI most recently rendered for `prefix` by an output ancestor.
    fn rendered_binding(&self, prefix: &str) -> Option<&str> {
        self.rendered
            .iter()
            .rev()
            .flat_map(|(_, scope)| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn render_start(&mut self, e: &BytesStart<'_>) -> WsFedResult<()> {
        let qname = utf8(e.name().as_ref())?.to_string();
        let (element_prefix, _) = split_qname(&qname);

        let mut attributes: Vec<(String, String, String, String)> = Vec::new();
        let mut utilized: Vec<String> = vec![element_prefix.to_string()];

        for attr in e.attributes() {
            let attr = attr?;
            let key = utf8(attr.key.as_ref())?;
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let (prefix, local) = split_qname(key);
            let namespace = if prefix.is_empty() {
                String::new()
            } else {
                if prefix != "xml" && !utilized.iter().any(|p| p == prefix) {
                    utilized.push(prefix.to_string());
                }
                self.resolve(prefix).to_string()
            };
            let value = attr.unescape_value()?.into_owned();
            attributes.push((namespace, local.to_string(), key.to_string(), value));
        }

        let mut declarations: Bindings = Vec::new();
        for prefix in utilized {
            let uri = self.resolve(&prefix).to_string();
            let already = self.rendered_binding(&prefix);
            let needed = if prefix.is_empty() {
                already.unwrap_or("") != uri
            } else {
                already != Some(uri.as_str())
            };
            if needed {
                declarations.push((prefix, uri));
            }
        }

        declarations.sort_by(|a, b| a.0.cmp(&b.0));
        attributes.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

        self.out.push('<');
        self.out.push_str(&qname);
        for (prefix, uri) in &declarations {
            if prefix.is_empty() {
                self.out.push_str(" xmlns=\"");
            } else {
                self.out.push_str(" xmlns:");
                self.out.push_str(prefix);
                self.out.push_str("=\"");
            }
            self.out.push_str(&escape_c14n_attr(uri));
            self.out.push('"');
        }
        for (_, _, key, value) in &attributes {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape_c14n_attr(value));
            self.out.push('"');
        }
        self.out.push('>');

        self.rendered.push((qname, declarations));
        Ok(())
    }
}

fn namespace_declarations(e: &BytesStart<'_>) -> WsFedResult<Bindings> {
    let mut bindings = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?;
        if key == "xmlns" {
            bindings.push((String::new(), attr.unescape_value()?.into_owned()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((prefix.to_string(), attr.unescape_value()?.into_owned()));
        }
    }
    Ok(bindings)
}

fn split_qname(qname: &str) -> (&str, &str) {
    qname.split_once(':').unwrap_or(("", qname))
}

fn utf8(bytes: &[u8]) -> WsFedResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| WsFedError::Xml(format!("invalid UTF-8: {e}")))
}

fn escape_c14n_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '\r']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn escape_c14n_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '"', '\t', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
