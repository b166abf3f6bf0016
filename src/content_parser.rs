//! The content parser (§4.3 "ContentParser"): the primary token consumer,
//! active everywhere outside a `<!DOCTYPE>` construct. Maintains the
//! element/namespace stacks, assembles attributes, resolves entity
//! references in text, and drives the prolog/body/epilog state machine.

use crate::attribute::{collapse_whitespace, Attribute, AttributeArena};
use crate::dtd::model::DtdModel;
use crate::errors::{Error, WfError};
use crate::events::EventSink;
use crate::name::{NamespaceResolver, QName};
use crate::position::XmlVersion;
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;

pub enum ContentOutcome {
    Continue,
    /// A `<!DOCTYPE` token arrived; the driver should switch the active
    /// token consumer to a fresh [`crate::dtd::DtdParser`] and replay this
    /// same token into it.
    EnterDtd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocState {
    BeforeRoot,
    InDocument,
    AfterRoot,
}

struct ElementFrame {
    qname: QName,
    element_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagPhase {
    AwaitName,
    Awaiting,
    AfterAttrName,
    AfterEq,
    InValue(char),
}

struct TagBuilder {
    is_end: bool,
    name: String,
    phase: TagPhase,
    attrs: AttributeArena,
    current_attr: String,
    current_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Dec,
    Hex,
}

enum PendingRef {
    AwaitKind,
    AwaitDigits(Radix),
    AwaitSemiGeneral(String),
    AwaitSemiChar(u32),
}

enum ResolvedEntity {
    /// One of the five predefined entities (`lt`, `gt`, `amp`, `apos`,
    /// `quot`): its replacement is always exactly one literal character,
    /// reported as `characters` directly rather than re-tokenized, since
    /// the whole point of e.g. `&lt;` is to produce a literal `<` that is
    /// *not* interpreted as the start of markup (§4.3, XML 1.0 §4.6).
    Literal(String),
    /// A `<!ENTITY name "...">`-declared internal general entity: its
    /// replacement text is re-tokenized as if substituted in place, so
    /// markup inside it produces real nested events (§4.3).
    Declared(String),
    SkippedExternal,
    Undeclared,
}

enum MarkupAccum {
    Pi { target: String, data: String },
}

pub struct ContentParser {
    namespaces: NamespaceResolver,
    stack: Vec<ElementFrame>,
    doc_state: DocState,
    tag: Option<TagBuilder>,
    pending_ref: Option<PendingRef>,
    markup: Option<MarkupAccum>,
    dtd_model: Option<DtdModel>,
    seen_doctype: bool,
    standalone: bool,
    trim_text: bool,
    xml_version: XmlVersion,
    expanding_general_entities: Vec<String>,
}

impl ContentParser {
    pub fn new(trim_text: bool) -> Self {
        ContentParser {
            namespaces: NamespaceResolver::new(),
            stack: Vec::new(),
            doc_state: DocState::BeforeRoot,
            tag: None,
            pending_ref: None,
            markup: None,
            dtd_model: None,
            seen_doctype: false,
            standalone: false,
            trim_text,
            xml_version: XmlVersion::V10,
            expanding_general_entities: Vec::new(),
        }
    }

    pub fn set_standalone(&mut self, standalone: bool) {
        self.standalone = standalone;
    }

    pub fn set_dtd_model(&mut self, model: DtdModel) {
        self.dtd_model = Some(model);
    }

    /// Records the document's declared XML version, affecting namespace
    /// undeclaration legality (§4.3) among other version-sensitive checks.
    pub fn set_xml_version(&mut self, version: XmlVersion) {
        self.xml_version = version;
    }

    pub fn is_done(&self) -> bool {
        self.doc_state == DocState::AfterRoot && self.stack.is_empty()
    }

    /// Called once at end-of-input; fatal if the root element was never
    /// closed or never seen (§5 "unexpected EOF").
    pub fn finish(&self, sink: &mut dyn EventSink) -> Result<(), Error> {
        if self.doc_state == DocState::BeforeRoot {
            return Err(Error::WellFormedness(WfError::NoRootElement));
        }
        if !self.stack.is_empty() {
            return Err(Error::WellFormedness(WfError::UnexpectedEof("open element")));
        }
        sink.end_document();
        Ok(())
    }

    pub fn receive(&mut self, token: &Token, sink: &mut dyn EventSink) -> Result<ContentOutcome, Error> {
        if token.kind == TokenKind::LtBangDoctype {
            if self.seen_doctype {
                return Err(Error::WellFormedness(WfError::SecondDoctype));
            }
            if self.doc_state != DocState::BeforeRoot {
                return Err(Error::WellFormedness(WfError::DoctypeAfterRoot));
            }
            self.seen_doctype = true;
            return Ok(ContentOutcome::EnterDtd);
        }
        if let Some(mut builder) = self.tag.take() {
            let outcome = self.receive_tag_token(&mut builder, token, sink)?;
            if outcome {
                self.tag = Some(builder);
            }
            return Ok(ContentOutcome::Continue);
        }
        if self.markup.is_some() {
            self.receive_markup_token(token, sink)?;
            return Ok(ContentOutcome::Continue);
        }
        if self.pending_ref.is_some() {
            self.receive_ref_token(token, sink)?;
            return Ok(ContentOutcome::Continue);
        }
        match token.kind {
            TokenKind::Lt => {
                if self.doc_state == DocState::AfterRoot {
                    return Err(Error::WellFormedness(WfError::ContentAfterRoot));
                }
                self.tag = Some(TagBuilder {
                    is_end: false,
                    name: String::new(),
                    phase: TagPhase::AwaitName,
                    attrs: AttributeArena::new(),
                    current_attr: String::new(),
                    current_value: String::new(),
                });
            }
            TokenKind::LtSlash => {
                if self.doc_state == DocState::AfterRoot {
                    return Err(Error::WellFormedness(WfError::ContentAfterRoot));
                }
                self.tag = Some(TagBuilder {
                    is_end: true,
                    name: String::new(),
                    phase: TagPhase::AwaitName,
                    attrs: AttributeArena::new(),
                    current_attr: String::new(),
                    current_value: String::new(),
                });
            }
            TokenKind::CharData => self.emit_text(&token.text, sink)?,
            TokenKind::Amp => {
                self.require_in_document()?;
                self.pending_ref = Some(PendingRef::AwaitKind);
            }
            TokenKind::LtBangDashDash => {}
            TokenKind::CommentText => sink.comment(&token.text),
            TokenKind::DashDashGt => {}
            TokenKind::LtBangCData => {
                self.require_in_document()?;
                sink.start_cdata();
            }
            TokenKind::CDataText => sink.characters(&token.text),
            TokenKind::CDataEnd => sink.end_cdata(),
            TokenKind::LtQuestion => {
                self.markup = Some(MarkupAccum::Pi { target: String::new(), data: String::new() });
            }
            _ => {}
        }
        Ok(ContentOutcome::Continue)
    }

    fn require_in_document(&self) -> Result<(), Error> {
        if self.doc_state != DocState::InDocument {
            return Err(Error::WellFormedness(WfError::ContentAfterRoot));
        }
        Ok(())
    }

    fn emit_text(&mut self, text: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        if self.doc_state != DocState::InDocument {
            if text.chars().all(char::is_whitespace) {
                return Ok(());
            }
            return Err(Error::WellFormedness(WfError::ContentAfterRoot));
        }
        let element_only = self.stack.last().map(|f| f.element_only).unwrap_or(false);
        let is_whitespace_only = text.chars().all(char::is_whitespace);
        if element_only && is_whitespace_only {
            sink.ignorable_whitespace(text);
        } else if self.trim_text && is_whitespace_only {
            // Outside an element-only model, whitespace-only runs are
            // reported as `characters` unless the caller opted into eliding
            // them entirely (§3 "trim_text").
        } else {
            sink.characters(text);
        }
        Ok(())
    }

    fn receive_markup_token(&mut self, token: &Token, sink: &mut dyn EventSink) -> Result<(), Error> {
        let Some(MarkupAccum::Pi { target, data }) = &mut self.markup else { return Ok(()) };
        match token.kind {
            TokenKind::PiTarget => *target = token.text.clone(),
            TokenKind::PiData => data.push_str(&token.text),
            TokenKind::QuestionGt => {
                let (target, data) = match self.markup.take() {
                    Some(MarkupAccum::Pi { target, data }) => (target, data),
                    None => (String::new(), String::new()),
                };
                sink.processing_instruction(&target, &data);
            }
            _ => {}
        }
        Ok(())
    }

    fn receive_ref_token(&mut self, token: &Token, sink: &mut dyn EventSink) -> Result<(), Error> {
        match (&self.pending_ref, token.kind) {
            (Some(PendingRef::AwaitKind), TokenKind::Hash) => {
                self.pending_ref = Some(PendingRef::AwaitDigits(Radix::Dec));
            }
            (Some(PendingRef::AwaitKind), TokenKind::HashX) => {
                self.pending_ref = Some(PendingRef::AwaitDigits(Radix::Hex));
            }
            (Some(PendingRef::AwaitKind), TokenKind::Name) => {
                self.pending_ref = Some(PendingRef::AwaitSemiGeneral(token.text.clone()));
            }
            (Some(PendingRef::AwaitDigits(radix)), TokenKind::Name) => {
                let radix = *radix;
                let value = u32::from_str_radix(&token.text, if radix == Radix::Hex { 16 } else { 10 })
                    .map_err(|_| Error::Syntax(crate::errors::SyntaxError::InvalidCharRef))?;
                self.pending_ref = Some(PendingRef::AwaitSemiChar(value));
            }
            (Some(_), TokenKind::Semi) => {
                let pending = self.pending_ref.take().unwrap();
                match pending {
                    PendingRef::AwaitSemiChar(value) => {
                        let ch = char::from_u32(value).ok_or(Error::Syntax(crate::errors::SyntaxError::InvalidCharRef))?;
                        let mut buf = [0u8; 4];
                        sink.characters(ch.encode_utf8(&mut buf));
                    }
                    PendingRef::AwaitSemiGeneral(name) => match self.resolve_general_entity(&name)? {
                        ResolvedEntity::Literal(text) => sink.characters(&text),
                        ResolvedEntity::Declared(text) => {
                            if self.expanding_general_entities.contains(&name) {
                                return Err(Error::WellFormedness(WfError::RecursiveEntity(name)));
                            }
                            sink.start_entity(&name);
                            self.expanding_general_entities.push(name.clone());
                            let result = self.replay_entity_text(&text, sink);
                            self.expanding_general_entities.pop();
                            result?;
                            sink.end_entity(&name);
                        }
                        ResolvedEntity::SkippedExternal => sink.skipped_entity(&name),
                        ResolvedEntity::Undeclared => {
                            if self.standalone {
                                return Err(Error::WellFormedness(WfError::UndeclaredEntityStandalone(name)));
                            }
                            sink.skipped_entity(&name);
                        }
                    },
                    _ => {}
                }
            }
            _ => return Err(Error::Syntax(crate::errors::SyntaxError::InvalidCharRef)),
        }
        Ok(())
    }

    /// Re-tokenizes an internal general entity's replacement text and feeds
    /// the resulting tokens back through content parsing, so markup inside
    /// a replacement text (e.g. `<!ENTITY e "<b>x</b>">`) produces real
    /// nested element events instead of literal characters (§4.3 "its
    /// replacement text is re-tokenized as if substituted in place").
    fn replay_entity_text(&mut self, text: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        tokenizer.feed(text, &mut tokens)?;
        for token in &tokens {
            self.receive(token, sink)?;
        }
        Ok(())
    }

    fn resolve_general_entity(&self, name: &str) -> Result<ResolvedEntity, Error> {
        match name {
            "lt" => return Ok(ResolvedEntity::Literal("<".to_string())),
            "gt" => return Ok(ResolvedEntity::Literal(">".to_string())),
            "amp" => return Ok(ResolvedEntity::Literal("&".to_string())),
            "apos" => return Ok(ResolvedEntity::Literal("'".to_string())),
            "quot" => return Ok(ResolvedEntity::Literal("\"".to_string())),
            _ => {}
        }
        let Some(model) = &self.dtd_model else { return Ok(ResolvedEntity::Undeclared) };
        match model.general_entities.get(name) {
            Some(decl) => match &decl.value {
                crate::dtd::model::EntityValue::Internal(text) => Ok(ResolvedEntity::Declared(text.clone())),
                crate::dtd::model::EntityValue::External { .. } => Ok(ResolvedEntity::SkippedExternal),
            },
            None => Ok(ResolvedEntity::Undeclared),
        }
    }

    /// Resolves an entity or character reference for use directly inside an
    /// attribute value, where (unlike content) an external/unparsed
    /// reference is a well-formedness error rather than something to skip
    /// (XML 1.0 §4.1).
    fn resolve_attr_entity(&self, name: &str) -> Result<String, Error> {
        match self.resolve_general_entity(name)? {
            ResolvedEntity::Literal(text) | ResolvedEntity::Declared(text) => Ok(text),
            ResolvedEntity::SkippedExternal | ResolvedEntity::Undeclared => {
                Err(Error::WellFormedness(WfError::UndeclaredEntityStandalone(name.to_string())))
            }
        }
    }

    fn receive_tag_token(&mut self, builder: &mut TagBuilder, token: &Token, sink: &mut dyn EventSink) -> Result<bool, Error> {
        match builder.phase {
            TagPhase::AwaitName => {
                if token.kind == TokenKind::Name {
                    builder.name = token.text.clone();
                    builder.phase = TagPhase::Awaiting;
                    return Ok(true);
                }
                Err(Error::Syntax(crate::errors::SyntaxError::ExpectedName))
            }
            TagPhase::Awaiting => match token.kind {
                TokenKind::S => Ok(true),
                TokenKind::Name => {
                    builder.current_attr = token.text.clone();
                    builder.phase = TagPhase::AfterAttrName;
                    Ok(true)
                }
                TokenKind::Eq => Err(Error::Syntax(crate::errors::SyntaxError::ExpectedName)),
                TokenKind::Gt => {
                    self.finish_start_tag(builder, false, sink)?;
                    Ok(false)
                }
                TokenKind::SlashGt => {
                    self.finish_start_tag(builder, true, sink)?;
                    Ok(false)
                }
                _ => Err(Error::Syntax(crate::errors::SyntaxError::UnexpectedChar('?'))),
            },
            TagPhase::AfterAttrName => match token.kind {
                TokenKind::S => Ok(true),
                TokenKind::Eq => {
                    builder.phase = TagPhase::AfterEq;
                    Ok(true)
                }
                _ => Err(Error::Syntax(crate::errors::SyntaxError::ExpectedEq)),
            },
            TagPhase::AfterEq => match token.kind {
                TokenKind::S => Ok(true),
                TokenKind::QuoteDouble => {
                    builder.current_value.clear();
                    builder.phase = TagPhase::InValue('"');
                    Ok(true)
                }
                TokenKind::QuoteSingle => {
                    builder.current_value.clear();
                    builder.phase = TagPhase::InValue('\'');
                    Ok(true)
                }
                _ => Err(Error::Syntax(crate::errors::SyntaxError::UnquotedAttributeValue)),
            },
            TagPhase::InValue(quote) => {
                if self.pending_ref.is_some() {
                    return self.receive_attr_ref_token(builder, token);
                }
                match token.kind {
                    TokenKind::AttrValueText => {
                        builder.current_value.push_str(&token.text);
                        Ok(true)
                    }
                    TokenKind::Amp => {
                        self.pending_ref = Some(PendingRef::AwaitKind);
                        Ok(true)
                    }
                    TokenKind::QuoteDouble | TokenKind::QuoteSingle => {
                        if (token.kind == TokenKind::QuoteDouble) != (quote == '"') {
                            return Err(Error::Syntax(crate::errors::SyntaxError::UnclosedAttributeValue));
                        }
                        if builder.attrs.contains_qname(&builder.current_attr) {
                            return Err(Error::WellFormedness(WfError::DuplicateAttribute(builder.current_attr.clone())));
                        }
                        builder.attrs.push(&builder.current_attr, &builder.current_value);
                        builder.phase = TagPhase::Awaiting;
                        Ok(true)
                    }
                    _ => Err(Error::Syntax(crate::errors::SyntaxError::UnclosedAttributeValue)),
                }
            }
        }
    }

    /// Resolves a pending `&`/`%` reference that arrived while inside an
    /// attribute value, appending its resolved text straight into the
    /// attribute's value buffer instead of emitting content events.
    fn receive_attr_ref_token(&mut self, builder: &mut TagBuilder, token: &Token) -> Result<bool, Error> {
        match (&self.pending_ref, token.kind) {
            (Some(PendingRef::AwaitKind), TokenKind::Hash) => {
                self.pending_ref = Some(PendingRef::AwaitDigits(Radix::Dec));
            }
            (Some(PendingRef::AwaitKind), TokenKind::HashX) => {
                self.pending_ref = Some(PendingRef::AwaitDigits(Radix::Hex));
            }
            (Some(PendingRef::AwaitKind), TokenKind::Name) => {
                self.pending_ref = Some(PendingRef::AwaitSemiGeneral(token.text.clone()));
            }
            (Some(PendingRef::AwaitDigits(radix)), TokenKind::Name) => {
                let radix = *radix;
                let value = u32::from_str_radix(&token.text, if radix == Radix::Hex { 16 } else { 10 })
                    .map_err(|_| Error::Syntax(crate::errors::SyntaxError::InvalidCharRef))?;
                self.pending_ref = Some(PendingRef::AwaitSemiChar(value));
            }
            (Some(_), TokenKind::Semi) => {
                let pending = self.pending_ref.take().unwrap();
                match pending {
                    PendingRef::AwaitSemiChar(value) => {
                        let ch = char::from_u32(value).ok_or(Error::Syntax(crate::errors::SyntaxError::InvalidCharRef))?;
                        builder.current_value.push(ch);
                    }
                    PendingRef::AwaitSemiGeneral(name) => {
                        builder.current_value.push_str(&self.resolve_attr_entity(&name)?);
                    }
                    _ => {}
                }
            }
            _ => return Err(Error::Syntax(crate::errors::SyntaxError::InvalidCharRef)),
        }
        Ok(true)
    }

    fn finish_start_tag(&mut self, builder: &TagBuilder, empty: bool, sink: &mut dyn EventSink) -> Result<(), Error> {
        if builder.is_end {
            return self.finish_end_tag(builder, sink);
        }
        self.namespaces.start_element();
        let mut declared = Vec::new();
        for (qname, value) in builder.attrs.iter() {
            if qname == "xmlns" {
                self.namespaces.declare("", value);
                declared.push((String::new(), value.to_string()));
            } else if let Some(prefix) = qname.strip_prefix("xmlns:") {
                if value.is_empty() && self.xml_version == XmlVersion::V10 {
                    return Err(Error::WellFormedness(WfError::EmptyNamespaceUriInXml10(prefix.to_string())));
                }
                self.namespaces.declare(prefix, value);
                declared.push((prefix.to_string(), value.to_string()));
            }
        }
        for (prefix, uri) in &declared {
            sink.start_prefix_mapping(prefix, uri);
        }
        let element_qname = self.namespaces.resolve(&builder.name, true).map_err(WfError::UnboundPrefix)?;
        let mut attributes = Vec::new();
        let mut seen_expanded_names = std::collections::HashSet::new();
        for (qname, raw_value) in builder.attrs.iter() {
            if qname == "xmlns" || qname.starts_with("xmlns:") {
                continue;
            }
            let resolved = self.namespaces.resolve(qname, false).map_err(WfError::UnboundPrefix)?;
            if !seen_expanded_names.insert((resolved.uri.clone(), resolved.local.clone())) {
                return Err(Error::WellFormedness(WfError::DuplicateExpandedAttribute(resolved.qname.clone())));
            }
            let attr_type = self
                .dtd_model
                .as_ref()
                .and_then(|m| m.attribute_decl(&builder.name, qname))
                .map(|d| d.attr_type.clone())
                .unwrap_or_default();
            let value = if attr_type.is_tokenized() { collapse_whitespace(raw_value) } else { raw_value.to_string() };
            let declared = self.dtd_model.as_ref().and_then(|m| m.attribute_decl(&builder.name, qname)).is_some();
            attributes.push(Attribute { name: resolved, attribute_type: attr_type, value, specified: true, declared });
        }
        if let Some(model) = &self.dtd_model {
            if let Some(attlist) = model.attlists.get(&builder.name) {
                for (attr_name, decl) in attlist {
                    if builder.attrs.contains_qname(attr_name) {
                        continue;
                    }
                    if let Some(default_value) = &decl.default_value {
                        let resolved = self.namespaces.resolve(attr_name, false).map_err(WfError::UnboundPrefix)?;
                        attributes.push(Attribute {
                            name: resolved,
                            attribute_type: decl.attr_type.clone(),
                            value: default_value.clone(),
                            specified: false,
                            declared: true,
                        });
                    }
                }
            }
        }
        sink.start_element(element_qname.uri.as_deref(), &element_qname.local, &element_qname.qname, &attributes);
        self.doc_state = DocState::InDocument;
        let element_only = self.dtd_model.as_ref().map(|m| m.is_element_only(&builder.name)).unwrap_or(false);
        self.stack.push(ElementFrame { qname: element_qname.clone(), element_only });
        if empty {
            self.pop_and_close(sink, &element_qname)?;
        }
        Ok(())
    }

    fn pop_and_close(&mut self, sink: &mut dyn EventSink, qname: &QName) -> Result<(), Error> {
        self.stack.pop();
        sink.end_element(qname.uri.as_deref(), &qname.local, &qname.qname);
        let ended = self.namespaces.end_element();
        for prefix in &ended {
            sink.end_prefix_mapping(prefix);
        }
        if self.stack.is_empty() {
            self.doc_state = DocState::AfterRoot;
        }
        Ok(())
    }

    fn finish_end_tag(&mut self, builder: &TagBuilder, sink: &mut dyn EventSink) -> Result<(), Error> {
        let frame = self.stack.last().ok_or_else(|| Error::WellFormedness(WfError::UnmatchedEndTag(builder.name.clone())))?;
        if frame.qname.qname != builder.name {
            return Err(Error::WellFormedness(WfError::TagMismatch {
                expected: frame.qname.qname.clone(),
                found: builder.name.clone(),
            }));
        }
        let qname = frame.qname.clone();
        self.pop_and_close(sink, &qname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContentHandler, DtdHandler, ErrorHandler};
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        starts: Vec<String>,
        ends: Vec<String>,
        text: String,
        skipped: Vec<String>,
    }
    impl ContentHandler for Recorder {
        fn start_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str, _attrs: &[Attribute]) {
            self.starts.push(qname.to_string());
        }
        fn end_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str) {
            self.ends.push(qname.to_string());
        }
        fn characters(&mut self, chars: &str) {
            self.text.push_str(chars);
        }
        fn skipped_entity(&mut self, name: &str) {
            self.skipped.push(name.to_string());
        }
    }
    impl DtdHandler for Recorder {}
    impl ErrorHandler for Recorder {}

    fn feed(cp: &mut ContentParser, xml: &str, sink: &mut Recorder) -> Result<(), Error> {
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        tokenizer.feed(xml, &mut tokens).expect("lexically valid fixture");
        for token in &tokens {
            cp.receive(token, sink)?;
        }
        Ok(())
    }

    #[test]
    fn parses_simple_element_with_text() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        feed(&mut cp, "<a>hello</a>", &mut sink).unwrap();
        assert_eq!(sink.starts, vec!["a".to_string()]);
        assert_eq!(sink.text, "hello");
        assert_eq!(sink.ends, vec!["a".to_string()]);
    }

    #[test]
    fn mismatched_end_tag_is_fatal() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, "<a></b>", &mut sink).is_err());
    }

    #[test]
    fn duplicate_attribute_is_fatal() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, r#"<a x="1" x="2"/>"#, &mut sink).is_err());
    }

    #[test]
    fn unbound_prefix_is_fatal() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, "<p:a/>", &mut sink).is_err());
    }

    #[test]
    fn undeclared_entity_in_content_is_skipped_when_not_standalone() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        feed(&mut cp, "<a>&mystery;</a>", &mut sink).unwrap();
        assert_eq!(sink.skipped, vec!["mystery".to_string()]);
        assert_eq!(sink.text, "");
    }

    #[test]
    fn undeclared_entity_in_content_is_fatal_when_standalone() {
        let mut cp = ContentParser::new(false);
        cp.set_standalone(true);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, "<a>&mystery;</a>", &mut sink).is_err());
    }

    #[test]
    fn builtin_entities_resolve_without_a_dtd() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        feed(&mut cp, "<a>&lt;&amp;&gt;</a>", &mut sink).unwrap();
        assert_eq!(sink.text, "<&>");
    }

    #[test]
    fn differently_prefixed_attributes_with_the_same_expanded_name_are_fatal() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, r#"<a xmlns:p="u" xmlns:q="u" p:x="1" q:x="2"/>"#, &mut sink).is_err());
    }

    #[test]
    fn content_after_the_root_element_is_fatal() {
        let mut cp = ContentParser::new(false);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, "<a/><b/>", &mut sink).is_err());
    }

    #[test]
    fn entity_replacement_text_containing_markup_is_retokenized() {
        use crate::dtd::model::{DtdModel, EntityDecl, EntityValue};
        let mut cp = ContentParser::new(false);
        let mut model = DtdModel::new();
        model
            .general_entities
            .insert("e".to_string(), EntityDecl { value: EntityValue::Internal("<b>x</b>".to_string()) });
        cp.set_dtd_model(model);
        let mut sink = Recorder::default();
        feed(&mut cp, "<a>&e;</a>", &mut sink).unwrap();
        assert_eq!(sink.starts, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sink.ends, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(sink.text, "x");
    }

    #[test]
    fn self_referential_entity_is_fatal() {
        use crate::dtd::model::{DtdModel, EntityDecl, EntityValue};
        let mut cp = ContentParser::new(false);
        let mut model = DtdModel::new();
        model.general_entities.insert("e".to_string(), EntityDecl { value: EntityValue::Internal("&e;".to_string()) });
        cp.set_dtd_model(model);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, "<a>&e;</a>", &mut sink).is_err());
    }

    #[test]
    fn empty_namespace_uri_undeclaration_is_fatal_under_xml_10() {
        let mut cp = ContentParser::new(false);
        cp.set_xml_version(XmlVersion::V10);
        let mut sink = Recorder::default();
        assert!(feed(&mut cp, r#"<a xmlns:p=""/>"#, &mut sink).is_err());
    }

    #[test]
    fn empty_namespace_uri_undeclaration_is_allowed_under_xml_11() {
        let mut cp = ContentParser::new(false);
        cp.set_xml_version(XmlVersion::V11);
        let mut sink = Recorder::default();
        feed(&mut cp, r#"<a xmlns:p="u"><b xmlns:p=""/></a>"#, &mut sink).unwrap();
        assert_eq!(sink.starts, vec!["a".to_string(), "b".to_string()]);
    }
}
