//! The top-level push parser (§6.1 "Parser"): wires the decoder, tokenizer,
//! content parser and DTD parser together and routes tokens between the
//! latter two.
//!
//! Grounded on the teacher's `Reader<B>`/`ReaderState` split (`reader.rs`,
//! `reader/state.rs`): a thin public-facing struct holding configuration and
//! delegating the actual byte-by-byte work to an inner state machine. Here
//! the "inner state machine" is itself composed of two token consumers
//! (§4.3, §4.4) instead of one, since this parser must switch which one is
//! active when a `<!DOCTYPE` construct starts and ends.

use crate::attribute::Attribute;
use crate::config::ParserConfig;
use crate::content_parser::{ContentOutcome, ContentParser};
use crate::decoder::ExternalEntityDecoder;
use crate::dtd::{DtdOutcome, DtdParser, DtdSkipScanner};
use crate::errors::{Error, ReportedError};
use crate::events::{ContentHandler, DtdHandler, ErrorHandler, EventSink, NullSink};
use crate::resolver::{EntityResolver, NullResolver};
use crate::token::Token;
use crate::tokenizer::Tokenizer;

/// Forwards [`ContentHandler`]/[`ErrorHandler`] events unconditionally but
/// drops [`DtdHandler`] events when DTD parsing is disabled in config
/// (§4.4 Non-goal boundary: declarations are still scanned, structurally,
/// to keep the tokenizer and content parser in sync, but never surfaced).
struct DtdGate<'a> {
    inner: &'a mut dyn EventSink,
    enabled: bool,
}

impl ContentHandler for DtdGate<'_> {
    fn start_document(&mut self) {
        self.inner.start_document()
    }
    fn end_document(&mut self) {
        self.inner.end_document()
    }
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        self.inner.start_prefix_mapping(prefix, uri)
    }
    fn end_prefix_mapping(&mut self, prefix: &str) {
        self.inner.end_prefix_mapping(prefix)
    }
    fn start_element(&mut self, uri: Option<&str>, local: &str, qname: &str, attributes: &[Attribute]) {
        self.inner.start_element(uri, local, qname, attributes)
    }
    fn end_element(&mut self, uri: Option<&str>, local: &str, qname: &str) {
        self.inner.end_element(uri, local, qname)
    }
    fn characters(&mut self, chars: &str) {
        self.inner.characters(chars)
    }
    fn ignorable_whitespace(&mut self, chars: &str) {
        self.inner.ignorable_whitespace(chars)
    }
    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.inner.processing_instruction(target, data)
    }
    fn comment(&mut self, chars: &str) {
        self.inner.comment(chars)
    }
    fn start_cdata(&mut self) {
        self.inner.start_cdata()
    }
    fn end_cdata(&mut self) {
        self.inner.end_cdata()
    }
    fn start_entity(&mut self, name: &str) {
        self.inner.start_entity(name)
    }
    fn end_entity(&mut self, name: &str) {
        self.inner.end_entity(name)
    }
    fn skipped_entity(&mut self, name: &str) {
        self.inner.skipped_entity(name)
    }
}

impl DtdHandler for DtdGate<'_> {
    fn start_dtd(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        if self.enabled {
            self.inner.start_dtd(name, public_id, system_id)
        }
    }
    fn end_dtd(&mut self) {
        if self.enabled {
            self.inner.end_dtd()
        }
    }
    fn element_decl(&mut self, name: &str, content_model: &str) {
        if self.enabled {
            self.inner.element_decl(name, content_model)
        }
    }
    fn attribute_decl(&mut self, element: &str, attribute: &str, attr_type: &str, default_mode: &str, default_value: Option<&str>) {
        if self.enabled {
            self.inner.attribute_decl(element, attribute, attr_type, default_mode, default_value)
        }
    }
    fn internal_entity_decl(&mut self, name: &str, value: &str) {
        if self.enabled {
            self.inner.internal_entity_decl(name, value)
        }
    }
    fn external_entity_decl(&mut self, name: &str, public_id: Option<&str>, system_id: &str) {
        if self.enabled {
            self.inner.external_entity_decl(name, public_id, system_id)
        }
    }
    fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        if self.enabled {
            self.inner.notation_decl(name, public_id, system_id)
        }
    }
    fn unparsed_entity_decl(&mut self, name: &str, public_id: Option<&str>, system_id: &str, notation: &str) {
        if self.enabled {
            self.inner.unparsed_entity_decl(name, public_id, system_id, notation)
        }
    }
}

impl ErrorHandler for DtdGate<'_> {
    fn warning(&mut self, error: &ReportedError) {
        self.inner.warning(error)
    }
    fn error(&mut self, error: &ReportedError) {
        self.inner.error(error)
    }
    fn fatal_error(&mut self, error: &ReportedError) {
        self.inner.fatal_error(error)
    }
}

/// Which token consumer is currently active; mirrors [`ContentOutcome`] and
/// [`DtdOutcome`]'s "switch control" signals (§4.3 "Consumer polymorphism").
enum Active {
    Content,
    Dtd(DtdParser),
    /// DTD parsing is disabled in config; the doctype is being skipped as
    /// opaque markup instead of being driven through a full [`DtdParser`]
    /// (§4.4 Non-goal boundary -- see [`DtdSkipScanner`]).
    SkippingDtd(DtdSkipScanner),
}

/// Drives a byte stream through decoding, tokenizing and event emission.
///
/// `S` is the sink events are reported to; use [`Parser::new`] for a
/// monomorphized sink or [`Parser::boxed`] to hold a `Box<dyn EventSink>`
/// when the sink type is only known at runtime.
pub struct Parser<S: EventSink> {
    config: ParserConfig,
    decoder: ExternalEntityDecoder,
    tokenizer: Tokenizer,
    content: ContentParser,
    active: Active,
    resolver: Box<dyn EntityResolver>,
    sink: S,
    started: bool,
    standalone_applied: bool,
    closed: bool,
}

impl<S: EventSink> Parser<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    pub fn with_config(sink: S, config: ParserConfig) -> Self {
        Parser {
            tokenizer: Tokenizer::new(),
            content: ContentParser::new(config.trim_text),
            decoder: ExternalEntityDecoder::new(false, config.initial_charset.map(str::to_string)),
            active: Active::Content,
            resolver: Box::new(NullResolver),
            sink,
            started: false,
            standalone_applied: false,
            closed: false,
            config,
        }
    }

    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    pub fn set_resolver(&mut self, resolver: impl EntityResolver + 'static) {
        self.resolver = Box::new(resolver);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Unwraps the parser, returning the sink (useful once parsing is
    /// complete and the accumulated events are all that is wanted).
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Feeds the next chunk of raw bytes. May be called any number of times
    /// with arbitrarily sized chunks, including chunks that split a
    /// multi-byte character, a line ending, or a token in half (§2, §8).
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.closed {
            return Err(Error::UseAfterClose);
        }
        if !self.started {
            self.sink.start_document();
            self.started = true;
        }

        let text = self.decoder.receive(bytes)?;
        self.content.set_xml_version(self.decoder.xml_version());
        if !self.standalone_applied {
            if let Some(decl) = self.decoder.declaration() {
                if let Some(standalone) = decl.standalone {
                    self.content.set_standalone(standalone);
                }
                self.standalone_applied = true;
            }
        }

        let mut tokens = Vec::new();
        self.tokenizer.feed(&text, &mut tokens)?;
        for token in &tokens {
            self.dispatch(token)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, token: &Token) -> Result<(), Error> {
        let enable_dtd = self.config.enable_dtd;
        match &mut self.active {
            Active::Content => {
                let mut gate = DtdGate { inner: &mut self.sink, enabled: enable_dtd };
                match self.content.receive(token, &mut gate)? {
                    ContentOutcome::Continue => Ok(()),
                    ContentOutcome::EnterDtd if !enable_dtd => {
                        tracing::debug!("DTD parsing disabled, skipping doctype as opaque markup");
                        let mut scanner = DtdSkipScanner::new();
                        if scanner.receive(token) {
                            self.active = Active::Content;
                        } else {
                            self.active = Active::SkippingDtd(scanner);
                        }
                        Ok(())
                    }
                    ContentOutcome::EnterDtd => {
                        tracing::debug!("entering DTD subset");
                        let mut dtd = DtdParser::new(self.config.max_entity_expansion_depth, self.decoder.xml_version());
                        let mut gate = DtdGate { inner: &mut self.sink, enabled: enable_dtd };
                        dtd.receive(token, &mut gate, self.resolver.as_mut())?;
                        self.active = Active::Dtd(dtd);
                        Ok(())
                    }
                }
            }
            Active::Dtd(dtd) => {
                let mut gate = DtdGate { inner: &mut self.sink, enabled: enable_dtd };
                match dtd.receive(token, &mut gate, self.resolver.as_mut())? {
                    DtdOutcome::Continue => Ok(()),
                    DtdOutcome::Finished => {
                        tracing::debug!("DTD subset finished, returning to content");
                        let Active::Dtd(dtd) = std::mem::replace(&mut self.active, Active::Content) else {
                            unreachable!()
                        };
                        self.content.set_dtd_model(dtd.into_model());
                        Ok(())
                    }
                }
            }
            Active::SkippingDtd(scanner) => {
                if scanner.receive(token) {
                    tracing::debug!("finished skipping disabled doctype");
                    self.active = Active::Content;
                }
                Ok(())
            }
        }
    }

    /// Signals end-of-input; validates that the document was well-formed to
    /// its close (root element present and closed) and reports
    /// [`crate::events::ContentHandler::end_document`].
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::UseAfterClose);
        }
        tracing::trace!("closing parser");
        self.closed = true;
        self.decoder.close();
        self.content.finish(&mut self.sink)
    }
}

impl Parser<Box<dyn EventSink>> {
    /// Convenience constructor for callers who only have a trait object
    /// (§6.1 "a `Box<dyn EventSink>` convenience constructor").
    pub fn boxed(sink: Box<dyn EventSink>) -> Self {
        Parser::new(sink)
    }
}

impl Parser<NullSink> {
    /// A parser useful only for checking well-formedness; every event is
    /// discarded (§6.1).
    pub fn well_formedness_only() -> Self {
        Parser::new(NullSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::events::{ContentHandler, DtdHandler, ErrorHandler};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        starts: Vec<String>,
        text: String,
        ended: bool,
    }
    impl ContentHandler for Recorder {
        fn start_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str, _attrs: &[Attribute]) {
            self.starts.push(qname.to_string());
        }
        fn characters(&mut self, chars: &str) {
            self.text.push_str(chars);
        }
        fn end_document(&mut self) {
            self.ended = true;
        }
    }
    impl DtdHandler for Recorder {}
    impl ErrorHandler for Recorder {}

    #[test]
    fn parses_minimal_document_across_chunks() {
        let mut parser = Parser::new(Recorder::default());
        parser.receive(b"<?xml versi").unwrap();
        parser.receive(b"on=\"1.0\"?><a>hel").unwrap();
        parser.receive(b"lo</a>").unwrap();
        parser.close().unwrap();
        assert_eq!(parser.sink().starts, vec!["a".to_string()]);
        assert_eq!(parser.sink().text, "hello");
        assert!(parser.sink().ended);
    }

    #[test]
    fn unclosed_root_is_fatal_at_close() {
        let mut parser = Parser::new(Recorder::default());
        parser.receive(b"<a>").unwrap();
        assert!(parser.close().is_err());
    }

    #[test]
    fn use_after_close_is_rejected() {
        let mut parser = Parser::new(Recorder::default());
        parser.receive(b"<a/>").unwrap();
        parser.close().unwrap();
        assert!(parser.receive(b"<b/>").is_err());
    }

    #[derive(Clone, Default)]
    struct CountingResolver {
        calls: std::rc::Rc<std::cell::Cell<u32>>,
    }
    impl EntityResolver for CountingResolver {
        fn resolve_external(&mut self, _public_id: Option<&str>, _system_id: &str) -> Option<crate::resolver::ExternalSource> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    #[test]
    fn disabled_dtd_never_invokes_the_resolver() {
        let mut parser = Parser::new(Recorder::default());
        parser.config_mut().enable_dtd(false);
        let resolver = CountingResolver::default();
        let calls = resolver.calls.clone();
        parser.set_resolver(resolver);
        parser.receive(br#"<!DOCTYPE r SYSTEM "ext.dtd" [<!ELEMENT r EMPTY>]><r/>"#).unwrap();
        parser.close().unwrap();
        assert_eq!(parser.sink().starts, vec!["r".to_string()]);
        assert_eq!(calls.get(), 0);
    }
}
