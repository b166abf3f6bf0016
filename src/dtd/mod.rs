//! The DTD parser (§4.4 "DTDParser (alternate token consumer)"): a second
//! consumer of the tokenizer's output, active from the `<!DOCTYPE` token
//! through the doctype's closing `>`, that builds a [`model::DtdModel`] and
//! emits the DTD-declaration events.
//!
//! Grounded on the teacher's sibling `quick-dtd` crate's incremental
//! `DtdParser`/declaration scanning for the general shape (a state machine
//! that reacts to one token/chunk at a time and reports a model), adapted
//! here to operate over the coarse-grained [`crate::token::TokenKind::DtdDeclBody`]
//! spans this crate's tokenizer produces instead of re-lexing each
//! declaration character by character.

pub mod entity_stack;
pub mod model;

use crate::attribute::AttributeType;
use crate::decoder::ExternalEntityDecoder;
use crate::errors::{Error, WfError};
use crate::events::EventSink;
use crate::position::XmlVersion;
use crate::resolver::EntityResolver;
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;
use entity_stack::EntityStack;
use model::{DefaultMode, DtdModel, EntityDecl, EntityValue, NotationDecl};

/// What the driver should do after handing a token to the DTD parser.
pub enum DtdOutcome {
    Continue,
    /// The doctype's closing `>` was consumed; control returns to the
    /// content parser.
    Finished,
}

/// A bracket-balance-only scan of a `<!DOCTYPE ...>` construct, used in
/// place of [`DtdParser`] when DTD parsing is disabled (SPEC_FULL.md
/// "when DTD parsing is disabled the doctype is skipped as opaque markup").
/// It keeps the tokenizer and content parser in sync with where the
/// construct ends without building a model, emitting events, or ever
/// calling the [`EntityResolver`] -- no external subset is fetched at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct DtdSkipScanner {
    subset_depth: u32,
}

impl DtdSkipScanner {
    pub fn new() -> Self {
        DtdSkipScanner::default()
    }

    /// Returns `true` once the doctype's top-level closing `>` has been
    /// consumed.
    pub fn receive(&mut self, token: &Token) -> bool {
        match token.kind {
            TokenKind::LBracket => {
                self.subset_depth += 1;
                false
            }
            TokenKind::RBracket => {
                self.subset_depth = self.subset_depth.saturating_sub(1);
                false
            }
            TokenKind::Gt => self.subset_depth == 0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingName,
    AfterName,
    AwaitingExternalLiteral(LiteralSlot),
    AfterExternalId,
    InSubset,
    /// After the subset's `]`, awaiting optional whitespace then `>`.
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralSlot {
    PublicId,
    SystemId,
}

/// A single DTD word- or literal-level token, produced by splitting a
/// [`TokenKind::DtdDeclBody`]'s text (§4.4 "the DTD parser performs its own
/// fine-grained decomposition").
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeclWord {
    Word(String),
    Literal(String),
}

fn lex_decl_words(body: &str) -> Vec<DeclWord> {
    let mut words = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if b == b'\'' || b == b'"' {
            let quote = b;
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && bytes[j] != quote {
                j += 1;
            }
            words.push(DeclWord::Literal(body[start..j.min(bytes.len())].to_string()));
            i = j + 1;
            continue;
        }
        if b == b'(' {
            let start = i;
            let mut depth = 0i32;
            let mut j = i;
            while j < bytes.len() {
                match bytes[j] {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            j += 1;
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            while j < bytes.len() && matches!(bytes[j], b'?' | b'*' | b'+') {
                j += 1;
            }
            words.push(DeclWord::Word(body[start..j].to_string()));
            i = j;
            continue;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        words.push(DeclWord::Word(body[start..i].to_string()));
    }
    words
}

fn word(w: &DeclWord) -> &str {
    match w {
        DeclWord::Word(s) => s.as_str(),
        DeclWord::Literal(s) => s.as_str(),
    }
}

fn parse_attr_type(text: &str) -> AttributeType {
    match text {
        "CDATA" => AttributeType::CData,
        "ID" => AttributeType::Id,
        "IDREF" => AttributeType::IdRef,
        "IDREFS" => AttributeType::IdRefs,
        "ENTITY" => AttributeType::Entity,
        "ENTITIES" => AttributeType::Entities,
        "NMTOKEN" => AttributeType::NmToken,
        "NMTOKENS" => AttributeType::NmTokens,
        other if other.starts_with('(') => {
            let inner = other.trim_start_matches('(').trim_end_matches(')');
            let values = inner.split('|').map(|s| s.trim().to_string()).collect();
            AttributeType::Enumeration(values)
        }
        other => AttributeType::Notation(vec![other.to_string()]),
    }
}

fn attr_type_decl_string(ty: &AttributeType) -> String {
    match ty {
        AttributeType::CData => "CDATA".to_string(),
        AttributeType::Id => "ID".to_string(),
        AttributeType::IdRef => "IDREF".to_string(),
        AttributeType::IdRefs => "IDREFS".to_string(),
        AttributeType::Entity => "ENTITY".to_string(),
        AttributeType::Entities => "ENTITIES".to_string(),
        AttributeType::NmToken => "NMTOKEN".to_string(),
        AttributeType::NmTokens => "NMTOKENS".to_string(),
        AttributeType::Enumeration(values) => format!("({})", values.join("|")),
        AttributeType::Notation(values) => format!("NOTATION({})", values.join("|")),
    }
}

/// Expands every `%name;` parameter-entity reference in `text` against
/// `model`'s internal parameter entities, guarded against recursion by
/// `stack` (§4.4 "parameter-entity expansion with recursion guard"). Only
/// internal parameter entities are expandable this way; an unresolvable
/// reference is left untouched, which will generally surface as a syntax
/// error from the subsequent declaration-body parse.
fn expand_parameter_entities(text: &str, model: &DtdModel, stack: &mut EntityStack) -> Result<String, Error> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pct) = rest.find('%') {
        out.push_str(&rest[..pct]);
        let after = &rest[pct + 1..];
        match after.find(';') {
            Some(semi) => {
                let name = &after[..semi];
                match model.parameter_entities.get(name) {
                    Some(value) => {
                        stack.enter(name).map_err(Error::WellFormedness)?;
                        let expanded = expand_parameter_entities(value, model, stack)?;
                        out.push_str(&expanded);
                        stack.exit(name);
                    }
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push(';');
                    }
                }
                rest = &after[semi + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// The alternate token consumer active for the lifetime of a `<!DOCTYPE>`
/// construct (§4.4).
pub struct DtdParser {
    phase: Phase,
    doc_name: String,
    public_id: Option<String>,
    system_id: Option<String>,
    model: DtdModel,
    entity_stack: EntityStack,
    pending_decl_keyword: Option<String>,
    pending_cond_keyword: Option<String>,
    /// The including document's own declared XML version, used to reject an
    /// XML 1.1 external entity pulled into an XML 1.0 document (§4.1).
    doc_version: XmlVersion,
}

impl DtdParser {
    pub fn new(max_pe_depth: usize, doc_version: XmlVersion) -> Self {
        DtdParser {
            phase: Phase::AwaitingName,
            doc_name: String::new(),
            public_id: None,
            system_id: None,
            model: DtdModel::new(),
            entity_stack: EntityStack::new(max_pe_depth),
            pending_decl_keyword: None,
            pending_cond_keyword: None,
            doc_version,
        }
    }

    pub fn model(&self) -> &DtdModel {
        &self.model
    }

    pub fn into_model(self) -> DtdModel {
        self.model
    }

    pub fn receive(
        &mut self,
        token: &Token,
        sink: &mut dyn EventSink,
        resolver: &mut dyn EntityResolver,
    ) -> Result<DtdOutcome, Error> {
        match self.phase {
            Phase::AwaitingName => self.receive_awaiting_name(token),
            Phase::AfterName => self.receive_after_name(token, sink, resolver),
            Phase::AwaitingExternalLiteral(slot) => self.receive_external_literal(token, slot, sink),
            Phase::AfterExternalId => self.receive_after_external_id(token, sink, resolver),
            Phase::InSubset => self.receive_in_subset(token, sink),
            Phase::Tail => self.receive_tail(token, sink),
        }
    }

    /// Fetches and merges the external subset, if a system identifier is
    /// known and the resolver can supply one (§4.4 "only the DTD parser
    /// fetches the external subset via the resolver"). Bracketed by the
    /// synthetic `[dtd]` entity per §4.4's event list.
    fn merge_external_subset(&mut self, sink: &mut dyn EventSink, resolver: &mut dyn EntityResolver) -> Result<(), Error> {
        let Some(system_id) = self.system_id.clone() else { return Ok(()) };
        let Some(source) = resolver.resolve_external(self.public_id.as_deref(), &system_id) else { return Ok(()) };
        let mut decoder = ExternalEntityDecoder::new(true, source.encoding_hint);
        let text = decoder.receive(&source.bytes)?;
        decoder.close();
        if self.doc_version == XmlVersion::V10 && decoder.xml_version() == XmlVersion::V11 {
            return Err(Error::WellFormedness(WfError::ExternalEntityVersionConflict(system_id)));
        }
        // Lex the fetched text through the same grammar as the internal
        // subset, primed just past where the internal subset's `[` would
        // have left it, so markup declarations and conditional sections
        // (`<![INCLUDE[`/`<![IGNORE[`) are recognized identically (§4.4).
        let mut tokenizer = Tokenizer::new();
        tokenizer.enter_dtd_subset();
        let mut tokens = Vec::new();
        tokenizer.feed(&text, &mut tokens)?;
        sink.start_entity("[dtd]");
        for token in &tokens {
            self.receive_in_subset(token, sink)?;
        }
        sink.end_entity("[dtd]");
        Ok(())
    }

    fn receive_awaiting_name(&mut self, token: &Token) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::LtBangDoctype | TokenKind::S => Ok(DtdOutcome::Continue),
            TokenKind::Name => {
                self.doc_name = token.text.clone();
                self.phase = Phase::AfterName;
                Ok(DtdOutcome::Continue)
            }
            _ => Err(Error::WellFormedness(WfError::UnexpectedEof("doctype name"))),
        }
    }

    fn receive_after_name(&mut self, token: &Token, sink: &mut dyn EventSink, resolver: &mut dyn EntityResolver) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::S => Ok(DtdOutcome::Continue),
            TokenKind::Name if token.text == "PUBLIC" => {
                self.phase = Phase::AwaitingExternalLiteral(LiteralSlot::PublicId);
                Ok(DtdOutcome::Continue)
            }
            TokenKind::Name if token.text == "SYSTEM" => {
                self.phase = Phase::AwaitingExternalLiteral(LiteralSlot::SystemId);
                Ok(DtdOutcome::Continue)
            }
            TokenKind::LBracket => {
                sink.start_dtd(&self.doc_name, self.public_id.as_deref(), self.system_id.as_deref());
                self.merge_external_subset(sink, resolver)?;
                self.phase = Phase::InSubset;
                Ok(DtdOutcome::Continue)
            }
            TokenKind::Gt => {
                sink.start_dtd(&self.doc_name, self.public_id.as_deref(), self.system_id.as_deref());
                self.merge_external_subset(sink, resolver)?;
                sink.end_dtd();
                Ok(DtdOutcome::Finished)
            }
            _ => Err(Error::WellFormedness(WfError::UnexpectedEof("doctype external id or subset"))),
        }
    }

    fn receive_external_literal(&mut self, token: &Token, slot: LiteralSlot, _sink: &mut dyn EventSink) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::S => Ok(DtdOutcome::Continue),
            TokenKind::QuoteDouble | TokenKind::QuoteSingle => Ok(DtdOutcome::Continue),
            TokenKind::AttrValueText => {
                match slot {
                    LiteralSlot::PublicId => {
                        self.public_id = Some(token.text.clone());
                        self.phase = Phase::AwaitingExternalLiteral(LiteralSlot::SystemId);
                    }
                    LiteralSlot::SystemId => {
                        self.system_id = Some(token.text.clone());
                        self.phase = Phase::AfterExternalId;
                    }
                }
                Ok(DtdOutcome::Continue)
            }
            // An empty literal ("" or '') never produces an AttrValueText
            // token; the closing quote arrives directly.
            _ => Ok(DtdOutcome::Continue),
        }
    }

    fn receive_after_external_id(&mut self, token: &Token, sink: &mut dyn EventSink, resolver: &mut dyn EntityResolver) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::S => Ok(DtdOutcome::Continue),
            TokenKind::LBracket => {
                sink.start_dtd(&self.doc_name, self.public_id.as_deref(), self.system_id.as_deref());
                self.merge_external_subset(sink, resolver)?;
                self.phase = Phase::InSubset;
                Ok(DtdOutcome::Continue)
            }
            TokenKind::Gt => {
                sink.start_dtd(&self.doc_name, self.public_id.as_deref(), self.system_id.as_deref());
                self.merge_external_subset(sink, resolver)?;
                sink.end_dtd();
                Ok(DtdOutcome::Finished)
            }
            _ => Err(Error::WellFormedness(WfError::UnexpectedEof("doctype subset or close"))),
        }
    }

    fn receive_tail(&mut self, token: &Token, sink: &mut dyn EventSink) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::S => Ok(DtdOutcome::Continue),
            TokenKind::Gt => {
                sink.end_dtd();
                Ok(DtdOutcome::Finished)
            }
            _ => Err(Error::WellFormedness(WfError::UnexpectedEof("doctype close"))),
        }
    }

    fn receive_in_subset(&mut self, token: &Token, sink: &mut dyn EventSink) -> Result<DtdOutcome, Error> {
        match token.kind {
            TokenKind::S | TokenKind::CommentText | TokenKind::LtBangDashDash | TokenKind::DashDashGt => Ok(DtdOutcome::Continue),
            TokenKind::LtQuestion | TokenKind::PiTarget | TokenKind::PiData | TokenKind::QuestionGt => Ok(DtdOutcome::Continue),
            TokenKind::Percent => Ok(DtdOutcome::Continue),
            TokenKind::Name | TokenKind::Semi => Ok(DtdOutcome::Continue),
            TokenKind::CondSectStart | TokenKind::CDataText => {
                if token.kind == TokenKind::CondSectStart {
                    self.pending_cond_keyword = Some(token.text.clone());
                    return Ok(DtdOutcome::Continue);
                }
                self.handle_conditional_body(&token.text, sink)?;
                Ok(DtdOutcome::Continue)
            }
            TokenKind::DtdMarkupDeclStart => {
                self.pending_decl_keyword = Some(token.text.clone());
                Ok(DtdOutcome::Continue)
            }
            TokenKind::DtdDeclBody => {
                let keyword = self.pending_decl_keyword.take().unwrap_or_default();
                self.handle_declaration(&keyword, &token.text, sink)?;
                Ok(DtdOutcome::Continue)
            }
            TokenKind::RBracket => {
                self.phase = Phase::Tail;
                Ok(DtdOutcome::Continue)
            }
            _ => Err(Error::WellFormedness(WfError::UnexpectedEof("dtd internal subset"))),
        }
    }

    fn handle_conditional_body(&mut self, inner: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let keyword = self.pending_cond_keyword.take().unwrap_or_default();
        if keyword == "IGNORE" {
            return Ok(());
        }
        // INCLUDE: re-parse the inner text as a run of declarations by
        // feeding it through a fresh lexical pass over the same grammar
        // (§4.4 "Conditional sections"). The inner text is a complete,
        // self-contained string, so no chunking concerns apply.
        let mut rest = inner;
        while let Some(start) = rest.find("<!") {
            rest = &rest[start..];
            let keyword_len = rest[2..].find(char::is_whitespace).map(|i| i + 2).unwrap_or(rest.len());
            let keyword = rest[2..keyword_len].to_string();
            let after_keyword = &rest[keyword_len..];
            match find_unquoted_close(after_keyword) {
                Some(end) => {
                    let body = after_keyword[..end].to_string();
                    self.handle_declaration(&keyword, &body, sink)?;
                    rest = &after_keyword[end + 1..];
                }
                None => break,
            }
        }
        Ok(())
    }

    fn handle_declaration(&mut self, keyword: &str, raw_body: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let body = expand_parameter_entities(raw_body, &self.model, &mut self.entity_stack)?;
        match keyword {
            "ELEMENT" => self.handle_element(&body, sink),
            "ATTLIST" => self.handle_attlist(&body, sink),
            "ENTITY" => self.handle_entity(&body, sink),
            "NOTATION" => self.handle_notation(&body, sink),
            _ => Ok(()),
        }
    }

    fn handle_element(&mut self, body: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let body = body.trim();
        let split = body.find(char::is_whitespace).ok_or(Error::Syntax(crate::errors::SyntaxError::ExpectedName))?;
        let name = body[..split].to_string();
        let spec_text = body[split..].trim();
        let model = model::parse_content_spec(spec_text);
        let decl_string = model.to_decl_string();
        self.model.elements.insert(name.clone(), model);
        sink.element_decl(&name, &decl_string);
        Ok(())
    }

    fn handle_attlist(&mut self, body: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let words = lex_decl_words(body);
        let mut iter = words.iter();
        let element = match iter.next() {
            Some(w) => word(w).to_string(),
            None => return Err(Error::Syntax(crate::errors::SyntaxError::ExpectedName)),
        };
        let attlist = self.model.attlists.entry(element.clone()).or_default();
        loop {
            let attr_name = match iter.next() {
                Some(w) => word(w).to_string(),
                None => break,
            };
            let attr_type_text = match iter.next() {
                Some(w) => word(w).to_string(),
                None => break,
            };
            let attr_type = parse_attr_type(&attr_type_text);
            let (default_mode, default_value) = match iter.next() {
                Some(DeclWord::Word(w)) if w == "#REQUIRED" => (DefaultMode::Required, None),
                Some(DeclWord::Word(w)) if w == "#IMPLIED" => (DefaultMode::Implied, None),
                Some(DeclWord::Word(w)) if w == "#FIXED" => {
                    let lit = iter.next().map(|w| word(w).to_string()).unwrap_or_default();
                    (DefaultMode::Fixed, Some(lit))
                }
                Some(DeclWord::Literal(lit)) => (DefaultMode::Default, Some(lit.clone())),
                _ => (DefaultMode::Implied, None),
            };
            let type_string = attr_type_decl_string(&attr_type);
            sink.attribute_decl(&element, &attr_name, &type_string, default_mode.as_str(), default_value.as_deref());
            attlist.insert(attr_name, model::AttributeDecl { attr_type, default_mode, default_value });
        }
        Ok(())
    }

    fn handle_entity(&mut self, body: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let words = lex_decl_words(body);
        let mut iter = words.iter().peekable();
        let is_parameter = matches!(iter.peek(), Some(DeclWord::Word(w)) if w == "%");
        if is_parameter {
            iter.next();
        }
        let name = match iter.next() {
            Some(w) => word(w).to_string(),
            None => return Err(Error::Syntax(crate::errors::SyntaxError::ExpectedName)),
        };
        match iter.next() {
            Some(DeclWord::Literal(value)) => {
                if is_parameter {
                    self.model.parameter_entities.insert(name, value.clone());
                } else {
                    sink.internal_entity_decl(&name, value);
                    self.model.general_entities.insert(name, EntityDecl { value: EntityValue::Internal(value.clone()) });
                }
            }
            Some(DeclWord::Word(w)) if w == "SYSTEM" => {
                let system_id = iter.next().map(|w| word(w).to_string()).unwrap_or_default();
                let notation = match iter.next() {
                    Some(DeclWord::Word(w)) if w == "NDATA" => iter.next().map(|w| word(w).to_string()),
                    _ => None,
                };
                if is_parameter {
                    // External parameter entities are not fetched by this
                    // crate (§4.4 "only the DTD parser fetches the external
                    // subset", not arbitrary external parameter entities).
                } else if let Some(notation) = notation {
                    sink.unparsed_entity_decl(&name, None, &system_id, &notation);
                    self.model.general_entities.insert(
                        name,
                        EntityDecl { value: EntityValue::External { public_id: None, system_id, notation: Some(notation) } },
                    );
                } else {
                    sink.external_entity_decl(&name, None, &system_id);
                    self.model.general_entities.insert(
                        name,
                        EntityDecl { value: EntityValue::External { public_id: None, system_id, notation: None } },
                    );
                }
            }
            Some(DeclWord::Word(w)) if w == "PUBLIC" => {
                let public_id = iter.next().map(|w| word(w).to_string());
                let system_id = iter.next().map(|w| word(w).to_string()).unwrap_or_default();
                let notation = match iter.next() {
                    Some(DeclWord::Word(w)) if w == "NDATA" => iter.next().map(|w| word(w).to_string()),
                    _ => None,
                };
                if !is_parameter {
                    if let Some(notation) = &notation {
                        sink.unparsed_entity_decl(&name, public_id.as_deref(), &system_id, notation);
                    } else {
                        sink.external_entity_decl(&name, public_id.as_deref(), &system_id);
                    }
                    self.model.general_entities.insert(
                        name,
                        EntityDecl { value: EntityValue::External { public_id, system_id, notation } },
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_notation(&mut self, body: &str, sink: &mut dyn EventSink) -> Result<(), Error> {
        let words = lex_decl_words(body);
        let mut iter = words.iter();
        let name = match iter.next() {
            Some(w) => word(w).to_string(),
            None => return Err(Error::Syntax(crate::errors::SyntaxError::ExpectedName)),
        };
        let (public_id, system_id) = match iter.next() {
            Some(DeclWord::Word(w)) if w == "PUBLIC" => {
                let pub_id = iter.next().map(|w| word(w).to_string());
                let sys_id = iter.next().map(|w| word(w).to_string());
                (pub_id, sys_id)
            }
            Some(DeclWord::Word(w)) if w == "SYSTEM" => {
                let sys_id = iter.next().map(|w| word(w).to_string());
                (None, sys_id)
            }
            _ => (None, None),
        };
        sink.notation_decl(&name, public_id.as_deref(), system_id.as_deref());
        self.model.notations.insert(name, NotationDecl { public_id, system_id });
        Ok(())
    }
}

fn find_unquoted_close(text: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in text.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContentHandler, DtdHandler, ErrorHandler};
    use crate::resolver::{NullResolver, StaticResolver};
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        elements: Vec<(String, String)>,
        attlists: Vec<(String, String, String, String)>,
        entities: Vec<(String, String)>,
        notations: Vec<(String, Option<String>, Option<String>)>,
    }
    impl ContentHandler for Recorder {}
    impl ErrorHandler for Recorder {}
    impl DtdHandler for Recorder {
        fn element_decl(&mut self, name: &str, content_model: &str) {
            self.elements.push((name.to_string(), content_model.to_string()));
        }
        fn attribute_decl(&mut self, element: &str, attribute: &str, attr_type: &str, default_mode: &str, _default_value: Option<&str>) {
            self.attlists
                .push((element.to_string(), attribute.to_string(), attr_type.to_string(), default_mode.to_string()));
        }
        fn internal_entity_decl(&mut self, name: &str, value: &str) {
            self.entities.push((name.to_string(), value.to_string()));
        }
        fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
            self.notations.push((name.to_string(), public_id.map(String::from), system_id.map(String::from)));
        }
    }

    fn feed(dtd: &mut DtdParser, xml: &str, sink: &mut Recorder, resolver: &mut dyn EntityResolver) -> DtdOutcome {
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        tokenizer.feed(xml, &mut tokens).expect("lexically valid fixture");
        let mut outcome = DtdOutcome::Continue;
        for token in &tokens {
            outcome = dtd.receive(token, sink, resolver).expect("well-formed fixture");
        }
        outcome
    }

    #[test]
    fn internal_subset_declarations_reach_the_sink() {
        let mut dtd = DtdParser::new(20, XmlVersion::V10);
        let mut sink = Recorder::default();
        let mut resolver = NullResolver;
        let xml = "<!DOCTYPE r [<!ELEMENT r EMPTY><!ATTLIST r id ID #IMPLIED><!ENTITY x 'y'>]>";
        let outcome = feed(&mut dtd, xml, &mut sink, &mut resolver);
        assert!(matches!(outcome, DtdOutcome::Finished));
        assert_eq!(sink.elements, vec![("r".to_string(), "EMPTY".to_string())]);
        assert_eq!(sink.attlists, vec![("r".to_string(), "id".to_string(), "ID".to_string(), "#IMPLIED".to_string())]);
        assert_eq!(sink.entities, vec![("x".to_string(), "y".to_string())]);
        assert!(dtd.model().is_element_only("r"));
    }

    #[test]
    fn external_subset_is_fetched_through_the_resolver() {
        let mut dtd = DtdParser::new(20, XmlVersion::V10);
        let mut sink = Recorder::default();
        let mut resolver = StaticResolver::new();
        resolver.insert("r.dtd", "<!ELEMENT r ANY>");
        let outcome = feed(&mut dtd, r#"<!DOCTYPE r SYSTEM "r.dtd">"#, &mut sink, &mut resolver);
        assert!(matches!(outcome, DtdOutcome::Finished));
        assert_eq!(sink.elements, vec![("r".to_string(), "ANY".to_string())]);
    }

    #[test]
    fn unresolvable_external_subset_degrades_gracefully() {
        let mut dtd = DtdParser::new(20, XmlVersion::V10);
        let mut sink = Recorder::default();
        let mut resolver = NullResolver;
        let outcome = feed(&mut dtd, r#"<!DOCTYPE r SYSTEM "missing.dtd">"#, &mut sink, &mut resolver);
        assert!(matches!(outcome, DtdOutcome::Finished));
        assert!(sink.elements.is_empty());
    }

    #[test]
    fn external_subset_conditional_sections_are_honored() {
        let mut dtd = DtdParser::new(20, XmlVersion::V10);
        let mut sink = Recorder::default();
        let mut resolver = StaticResolver::new();
        resolver.insert(
            "r.dtd",
            "<![INCLUDE[<!ELEMENT r ANY>]]><![IGNORE[<![IGNORE[<!ELEMENT ignored EMPTY>]]>]]>",
        );
        let outcome = feed(&mut dtd, r#"<!DOCTYPE r SYSTEM "r.dtd">"#, &mut sink, &mut resolver);
        assert!(matches!(outcome, DtdOutcome::Finished));
        assert_eq!(sink.elements, vec![("r".to_string(), "ANY".to_string())]);
    }

    #[test]
    fn xml_11_external_subset_in_xml_10_document_is_fatal() {
        let mut dtd = DtdParser::new(20, XmlVersion::V10);
        let mut sink = Recorder::default();
        let mut resolver = StaticResolver::new();
        resolver.insert("r.dtd", "<?xml version=\"1.1\"?><!ELEMENT r ANY>");
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        tokenizer.feed(r#"<!DOCTYPE r SYSTEM "r.dtd">"#, &mut tokens).unwrap();
        let mut result = Ok(DtdOutcome::Continue);
        for token in &tokens {
            result = dtd.receive(token, &mut sink, &mut resolver);
            if result.is_err() {
                break;
            }
        }
        assert!(result.is_err());
    }

    #[test]
    fn skip_scanner_finds_the_doctype_close_past_an_internal_subset() {
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        tokenizer.feed("<!DOCTYPE r [<!ELEMENT r EMPTY>]><r/>", &mut tokens).unwrap();
        let mut scanner = DtdSkipScanner::new();
        let mut finished_at = None;
        for (i, token) in tokens.iter().enumerate() {
            if scanner.receive(token) {
                finished_at = Some(i);
                break;
            }
        }
        let finished_at = finished_at.expect("scanner should find the doctype's closing '>'");
        // Everything after the doctype's `>` (the `<r/>` element) must still
        // be available for the content parser to pick up.
        assert!(tokens[finished_at + 1..].iter().any(|t| t.kind == TokenKind::Lt));
    }
}
