//! The external entity decoder (§4.1 "ExternalEntityDecoder"): converts a
//! byte stream into a normalized character stream, honoring BOM sniffing,
//! the XML/text declaration's `encoding` attribute, and XML's line-ending
//! normalization rules.
//!
//! Grounded on `parser/bom.rs` of the teacher crate for the BOM state
//! machine and on `encoding.rs` for the `Decoder` wrapper; the declaration
//! scan and line-ending normalization are this crate's own, since the
//! teacher buffers a whole document before decoding rather than decoding
//! incrementally against a declared-but-not-yet-applied encoding.

use crate::buffer::CompositeByteBuffer;
use crate::encoding::{sniff_bom, BomSniff, Charset};
use crate::errors::Error;
use crate::position::XmlVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    SeenBom,
    Content,
    Closed,
}

#[derive(Debug, Clone)]
pub struct DeclarationInfo {
    pub version: XmlVersion,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

enum DeclScan {
    Absent,
    Underflow,
    Malformed,
    Found { consumed_bytes: usize, info: DeclarationInfo },
}

/// Parses `version="1.0" encoding="UTF-8" standalone="yes"`-shaped attribute
/// lists, the interior of an XML or text declaration (§4.1 "Declaration").
fn parse_pseudo_attrs(body: &str) -> Option<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        let name_end = rest.find(|c: char| c.is_whitespace() || c == '=')?;
        let name = rest[..name_end].to_string();
        rest = rest[name_end..].trim_start();
        rest = rest.strip_prefix('=')?.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        rest = &rest[quote.len_utf8()..];
        let value_end = rest.find(quote)?;
        let value = rest[..value_end].to_string();
        rest = rest[value_end + quote.len_utf8()..].trim_start();
        attrs.push((name, value));
    }
    Some(attrs)
}

fn parse_declaration_body(body: &str) -> Option<DeclarationInfo> {
    let attrs = parse_pseudo_attrs(body)?;
    let mut version = None;
    let mut encoding = None;
    let mut standalone = None;
    for (name, value) in attrs {
        match name.as_str() {
            "version" => {
                if !value.starts_with("1.") || !value[2..].chars().all(|c| c.is_ascii_digit()) || value.len() < 3 {
                    return None;
                }
                version = XmlVersion::parse(&value);
            }
            "encoding" => encoding = Some(value),
            "standalone" => {
                standalone = match value.as_str() {
                    "yes" => Some(true),
                    "no" => Some(false),
                    _ => return None,
                }
            }
            _ => return None,
        }
    }
    Some(DeclarationInfo { version: version?, encoding, standalone })
}

/// Decodes `bytes` with a throwaway decoder for `charset`, leaving the
/// driving decoder's own stateful decoder untouched; used only to sniff
/// whether a complete `<?xml ... ?>` declaration is present yet.
fn scratch_decode(charset: &Charset, bytes: &[u8]) -> Option<String> {
    let encoding = encoding_rs::Encoding::for_label(charset.label().as_bytes())?;
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(bytes.len());
    let _ = decoder.decode_to_string(bytes, &mut out, false);
    Some(out)
}

fn scan_declaration(charset: &Charset, bytes: &[u8]) -> DeclScan {
    let Some(text) = scratch_decode(charset, bytes) else { return DeclScan::Malformed };
    const PREFIX: &str = "<?xml";
    if text.len() < PREFIX.len() {
        return DeclScan::Underflow;
    }
    if !text.starts_with(PREFIX) || !text[PREFIX.len()..].starts_with(|c: char| c.is_whitespace()) {
        return DeclScan::Absent;
    }
    let Some(end) = text.find("?>") else { return DeclScan::Underflow };
    let body = &text[PREFIX.len()..end];
    let Some(info) = parse_declaration_body(body) else { return DeclScan::Malformed };
    // The declaration is pure ASCII, so each decoded char maps to exactly
    // one "unit" of the charset (1 byte for UTF-8/Latin1/ASCII, 2 bytes for
    // UTF-16 variants); multiplying back gives the consumed byte count.
    let unit = if charset.label().starts_with("UTF-16") { 2 } else { 1 };
    let chars_consumed = text[..end + 2].chars().count();
    DeclScan::Found { consumed_bytes: chars_consumed * unit, info }
}

/// Converts bytes of one XML entity into normalized characters (§4.1).
pub struct ExternalEntityDecoder {
    state: State,
    raw: CompositeByteBuffer,
    charset: Charset,
    initial_charset: Option<String>,
    pending_cr: bool,
    xml_version: XmlVersion,
    declaration: Option<DeclarationInfo>,
    is_external_parsed_entity: bool,
}

impl ExternalEntityDecoder {
    pub fn new(is_external_parsed_entity: bool, initial_charset: Option<String>) -> Self {
        ExternalEntityDecoder {
            state: State::Init,
            raw: CompositeByteBuffer::new(),
            charset: Charset::utf8(),
            initial_charset,
            pending_cr: false,
            xml_version: XmlVersion::V10,
            declaration: None,
            is_external_parsed_entity,
        }
    }

    pub fn xml_version(&self) -> XmlVersion {
        self.xml_version
    }

    pub fn declaration(&self) -> Option<&DeclarationInfo> {
        self.declaration.as_ref()
    }

    pub fn close(&mut self) {
        self.state = State::Closed;
    }

    /// Feeds raw bytes in and returns as much normalized text as can be
    /// produced so far, retaining any undecodable suffix internally.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<String, Error> {
        if self.state == State::Closed {
            return Err(Error::UseAfterClose);
        }
        self.raw.put(bytes);
        let mut out = String::new();
        loop {
            match self.state {
                State::Init => {
                    match sniff_bom(self.raw.remaining()) {
                        BomSniff::NeedData => return Ok(out),
                        BomSniff::Found { charset, consumed } => {
                            tracing::trace!(charset = charset.label(), consumed, "BOM detected");
                            self.charset = charset;
                            self.raw.consume(consumed);
                            self.state = State::SeenBom;
                        }
                        BomSniff::None => {
                            self.charset = self
                                .initial_charset
                                .as_deref()
                                .and_then(Charset::by_label)
                                .unwrap_or_else(Charset::utf8);
                            tracing::trace!(charset = self.charset.label(), "no BOM, using initial charset");
                            self.state = State::SeenBom;
                        }
                    }
                }
                State::SeenBom => match scan_declaration(&self.charset, self.raw.remaining()) {
                    DeclScan::Underflow => return Ok(out),
                    DeclScan::Malformed => return Err(Error::Encoding("malformed XML/text declaration".to_string())),
                    DeclScan::Absent => {
                        // A text declaration's `encoding` is mandatory, but
                        // treating an absent declaration as such degrades to
                        // the sniffed/caller-supplied charset rather than
                        // failing the parse (§4.1 "treated as absent").
                        self.state = State::Content;
                    }
                    DeclScan::Found { consumed_bytes, mut info } => {
                        if self.is_external_parsed_entity {
                            // A text declaration never carries `standalone`;
                            // a stray one is dropped rather than failing the
                            // whole declaration (§4.1 "treated as absent").
                            info.standalone = None;
                        }
                        self.xml_version = info.version;
                        if let Some(encoding) = &info.encoding {
                            if let Some(new_charset) = Charset::by_label(encoding) {
                                if new_charset != self.charset {
                                    tracing::debug!(from = self.charset.label(), to = new_charset.label(), "declaration switched charset");
                                    self.charset = new_charset;
                                }
                            } else {
                                return Err(Error::Encoding(encoding.clone()));
                            }
                        }
                        self.declaration = Some(info);
                        self.raw.consume(consumed_bytes);
                        self.state = State::Content;
                    }
                },
                State::Content => {
                    let decoded = self.charset.decode(self.raw.remaining());
                    match decoded {
                        crate::encoding::DecodeOutcome::Ok { consumed, text } => {
                            self.raw.consume(consumed);
                            out.push_str(&self.normalize_line_endings(&text));
                            if consumed == 0 {
                                return Ok(out);
                            }
                        }
                        crate::encoding::DecodeOutcome::Underflow => return Ok(out),
                        crate::encoding::DecodeOutcome::Malformed | crate::encoding::DecodeOutcome::Unmappable => {
                            return Err(Error::Encoding(format!("invalid byte sequence for {}", self.charset.label())));
                        }
                    }
                }
                State::Closed => return Err(Error::UseAfterClose),
            }
        }
    }

    /// CR -> LF, CRLF -> LF, and (XML 1.1 only) NEL/LS -> LF (§4.1
    /// "Line-end normalization"). `pending_cr` lets a CR at the very end of
    /// one chunk still collapse with an LF that arrives at the start of the
    /// next.
    fn normalize_line_endings(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let is_11 = self.xml_version == XmlVersion::V11;
        for ch in text.chars() {
            if self.pending_cr {
                self.pending_cr = false;
                if ch == '\n' {
                    continue;
                }
            }
            match ch {
                '\r' => {
                    self.pending_cr = true;
                    out.push('\n');
                }
                '\u{85}' | '\u{2028}' if is_11 => out.push('\n'),
                other => out.push(other),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_plain_utf8_with_no_declaration() {
        let mut dec = ExternalEntityDecoder::new(false, None);
        let text = dec.receive(b"<a/>").unwrap();
        assert_eq!(text, "<a/>");
    }

    #[test]
    fn strips_utf8_bom_and_declaration() {
        let mut dec = ExternalEntityDecoder::new(false, None);
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>");
        let text = dec.receive(&bytes).unwrap();
        assert_eq!(text, "<a/>");
    }

    #[test]
    fn crlf_collapses_to_lf_even_when_split_across_chunks() {
        let mut dec = ExternalEntityDecoder::new(false, None);
        let mut out = dec.receive(b"<a>line1\r").unwrap();
        out.push_str(&dec.receive(b"\nline2</a>").unwrap());
        assert_eq!(out, "<a>line1\nline2</a>");
    }

    #[test]
    fn lone_cr_becomes_lf() {
        let mut dec = ExternalEntityDecoder::new(false, None);
        let out = dec.receive(b"a\rb").unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn declaration_spanning_chunks_is_detected_once_complete() {
        let mut dec = ExternalEntityDecoder::new(false, None);
        let first = dec.receive(b"<?xml vers").unwrap();
        assert_eq!(first, "");
        let second = dec.receive(b"ion=\"1.0\"?><a/>").unwrap();
        assert_eq!(second, "<a/>");
    }
}
