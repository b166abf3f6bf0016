//! A push-driven serializer (§6.5 "Writer"): an [`EventSink`] that renders
//! the events it receives as XML text instead of handing them to user code.
//!
//! Grounded on `writer.rs` of the teacher crate for the overall shape (a
//! thin struct around a `W: Write`, an optional [`Indentation`] helper lifted
//! almost unchanged) but driven by trait-method calls rather than matching
//! an `Event` enum, since this crate's sink vocabulary is SAX-style.

use std::io::{self, Write};

use crate::attribute::Attribute;
use crate::errors::{Error, ReportedError, Result};
use crate::events::{ContentHandler, DtdHandler, ErrorHandler};

/// Writes XML text to a `Write` implementor as [`EventSink`](crate::events::EventSink)
/// calls arrive.
pub struct Writer<W: Write> {
    writer: W,
    indent: Option<Indentation>,
    /// Name of the most recently opened element, if its start tag has not
    /// yet been closed with `>` or `/>` (lookahead needed to tell whether it
    /// turns out to be empty).
    pending_open: Option<String>,
    expand_empty_elements: bool,
    last_was_inline: bool,
    /// The first I/O failure encountered. [`ContentHandler`] methods cannot
    /// return a `Result`, so a failing write is recorded here instead and
    /// must be checked with [`Self::check`].
    error: Option<Error>,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Writer {
            writer: inner,
            indent: None,
            pending_open: None,
            expand_empty_elements: false,
            last_was_inline: false,
            error: None,
        }
    }

    pub fn new_with_indent(inner: W, indent_char: u8, indent_size: usize) -> Self {
        Writer {
            writer: inner,
            indent: Some(Indentation::new(indent_char, indent_size)),
            pending_open: None,
            expand_empty_elements: false,
            last_was_inline: false,
            error: None,
        }
    }

    /// Controls whether an element with no content is written as `<a/>`
    /// (default) or as separate `<a></a>` start/end events.
    pub fn expand_empty_elements(&mut self, val: bool) -> &mut Self {
        self.expand_empty_elements = val;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn inner(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Returns the first write failure recorded so far, if any, clearing it.
    pub fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }

    fn raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    /// Closes a still-open start tag's `>` before any other markup is
    /// written, since [`Self::start_element`] withholds it to keep the
    /// option of collapsing to a self-closing tag open.
    fn close_pending_open(&mut self) -> io::Result<()> {
        if self.pending_open.take().is_some() {
            self.raw(b">")?;
        }
        Ok(())
    }

    fn write_indent(&mut self, depth: usize) -> io::Result<()> {
        if self.last_was_inline {
            return Ok(());
        }
        if let Some(indent) = self.indent.as_mut() {
            let bytes = indent.at_depth(depth).to_vec();
            self.raw(b"\n")?;
            self.raw(&bytes)?;
        }
        Ok(())
    }
}

impl<W: Write> ContentHandler for Writer<W> {
    fn start_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str, attributes: &[Attribute]) {
        let result = self.try_start_element(qname, attributes);
        self.record(result);
    }

    fn end_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str) {
        let result = self.try_end_element(qname);
        self.record(result);
    }

    fn characters(&mut self, chars: &str) {
        let result = self.close_pending_open().and_then(|_| self.raw(escape_text(chars).as_bytes())).map_err(Error::from);
        self.record(result);
        self.last_was_inline = true;
    }

    fn ignorable_whitespace(&mut self, chars: &str) {
        let result = self.close_pending_open().and_then(|_| self.raw(chars.as_bytes())).map_err(Error::from);
        self.record(result);
        self.last_was_inline = true;
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        let result = self.try_processing_instruction(target, data);
        self.record(result);
        self.last_was_inline = false;
    }

    fn comment(&mut self, chars: &str) {
        let result = self.try_comment(chars);
        self.record(result);
        self.last_was_inline = false;
    }

    fn start_cdata(&mut self) {
        let result = self.close_pending_open().and_then(|_| self.raw(b"<![CDATA[")).map_err(Error::from);
        self.record(result);
        self.last_was_inline = true;
    }

    fn end_cdata(&mut self) {
        let result = self.raw(b"]]>").map_err(Error::from);
        self.record(result);
    }
}

impl<W: Write> DtdHandler for Writer<W> {}
impl<W: Write> ErrorHandler for Writer<W> {
    fn fatal_error(&mut self, _error: &ReportedError) {}
}

impl<W: Write> Writer<W> {
    fn try_processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        let depth = self.indent.as_ref().map_or(0, |i| i.depth);
        self.close_pending_open()?;
        self.write_indent(depth)?;
        self.raw(b"<?")?;
        self.raw(target.as_bytes())?;
        if !data.is_empty() {
            self.raw(b" ")?;
            self.raw(sanitize_pi_data(data).as_bytes())?;
        }
        self.raw(b"?>")?;
        Ok(())
    }

    fn try_comment(&mut self, chars: &str) -> Result<()> {
        let depth = self.indent.as_ref().map_or(0, |i| i.depth);
        self.close_pending_open()?;
        self.write_indent(depth)?;
        self.raw(b"<!--")?;
        self.raw(sanitize_comment(chars).as_bytes())?;
        self.raw(b"-->")?;
        Ok(())
    }

    fn try_start_element(&mut self, qname: &str, attributes: &[Attribute]) -> Result<()> {
        self.close_pending_open()?;
        let depth = self.indent.as_ref().map_or(0, |i| i.depth);
        self.write_indent(depth)?;
        self.raw(b"<")?;
        self.raw(qname.as_bytes())?;
        for attr in attributes {
            self.raw(b" ")?;
            self.raw(attr.name.qname.as_bytes())?;
            self.raw(b"=\"")?;
            self.raw(escape_attr(&attr.value).as_bytes())?;
            self.raw(b"\"")?;
        }
        self.pending_open = Some(qname.to_string());
        if let Some(indent) = self.indent.as_mut() {
            indent.grow();
        }
        self.last_was_inline = false;
        Ok(())
    }

    fn try_end_element(&mut self, qname: &str) -> Result<()> {
        if let Some(indent) = self.indent.as_mut() {
            indent.shrink();
        }
        let was_empty = self.pending_open.as_deref() == Some(qname);
        if was_empty && !self.expand_empty_elements {
            self.pending_open = None;
            self.raw(b"/>")?;
            self.last_was_inline = false;
            return Ok(());
        }
        self.close_pending_open()?;
        let depth = self.indent.as_ref().map_or(0, |i| i.depth);
        if !was_empty {
            self.write_indent(depth)?;
        }
        self.raw(b"</")?;
        self.raw(qname.as_bytes())?;
        self.raw(b">")?;
        self.last_was_inline = false;
        Ok(())
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Attribute values additionally escape quotes and normalize raw whitespace
/// to character references, since an XML processor collapses literal
/// tab/newline/carriage-return bytes inside an attribute value to spaces on
/// read (XML 1.0 §3.3.3) and a reference is the only way to round-trip them.
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
    out
}

/// A comment may not contain `--` or end in `-`; a lone inserted space keeps
/// the text legible while staying well-formed.
fn sanitize_comment(text: &str) -> String {
    let mut out = text.replace("--", "- -");
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

/// A processing instruction's data may not contain `?>`.
fn sanitize_pi_data(text: &str) -> String {
    text.replace("?>", "? >")
}

#[derive(Clone)]
struct Indentation {
    indent_char: u8,
    indent_size: usize,
    depth: usize,
    scratch: Vec<u8>,
}

impl Indentation {
    fn new(indent_char: u8, indent_size: usize) -> Self {
        Indentation { indent_char, indent_size, depth: 0, scratch: Vec::new() }
    }

    fn grow(&mut self) {
        self.depth += 1;
    }

    fn shrink(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn at_depth(&mut self, depth: usize) -> &[u8] {
        let len = depth * self.indent_size;
        if self.scratch.len() < len {
            self.scratch.resize(len, self.indent_char);
        }
        &self.scratch[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeType;
    use crate::name::QName;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs
            .iter()
            .map(|(name, value)| Attribute {
                name: QName::unqualified(name),
                attribute_type: AttributeType::CData,
                value: value.to_string(),
                specified: true,
                declared: false,
            })
            .collect()
    }

    #[test]
    fn collapses_empty_element_to_self_closing() {
        let mut writer = Writer::new(Vec::new());
        writer.start_element(None, "a", "a", &attrs(&[("x", "1")]));
        writer.end_element(None, "a", "a");
        assert_eq!(std::str::from_utf8(&writer.into_inner()).unwrap(), r#"<a x="1"/>"#);
    }

    #[test]
    fn expand_empty_elements_writes_separate_tags() {
        let mut writer = Writer::new(Vec::new());
        writer.expand_empty_elements(true);
        writer.start_element(None, "a", "a", &[]);
        writer.end_element(None, "a", "a");
        assert_eq!(std::str::from_utf8(&writer.into_inner()).unwrap(), "<a></a>");
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let mut writer = Writer::new(Vec::new());
        writer.start_element(None, "a", "a", &attrs(&[("x", "1\"&2")]));
        writer.characters("<hi> & bye");
        writer.end_element(None, "a", "a");
        assert_eq!(
            std::str::from_utf8(&writer.into_inner()).unwrap(),
            r#"<a x="1&quot;&amp;2">&lt;hi&gt; &amp; bye</a>"#
        );
    }

    #[test]
    fn indents_nested_elements() {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.start_element(None, "a", "a", &[]);
        writer.start_element(None, "b", "b", &[]);
        writer.end_element(None, "b", "b");
        writer.end_element(None, "a", "a");
        assert_eq!(std::str::from_utf8(&writer.into_inner()).unwrap(), "<a>\n  <b/>\n</a>");
    }
}
