//! The SAX-style event sink vocabulary (§6.2 "EventSink").
//!
//! Grounded in the classic SAX2 `ContentHandler`/`DTDHandler`/`ErrorHandler`
//! decomposition, which the teacher crate's own split between its `reader`
//! module (content events) and DTD-adjacent modules mirrors in spirit. Each
//! sub-trait carries default no-op method bodies, matching the corpus's
//! liberal use of default trait methods, so a host implements only what it
//! cares about.

pub use crate::attribute::Attribute;
use crate::errors::ReportedError;

/// Document structure, elements, text, and miscellaneous markup (§6.2).
pub trait ContentHandler {
    fn start_document(&mut self) {}
    fn end_document(&mut self) {}

    fn start_prefix_mapping(&mut self, _prefix: &str, _uri: &str) {}
    fn end_prefix_mapping(&mut self, _prefix: &str) {}

    fn start_element(&mut self, _uri: Option<&str>, _local: &str, _qname: &str, _attributes: &[Attribute]) {}
    fn end_element(&mut self, _uri: Option<&str>, _local: &str, _qname: &str) {}

    /// Character data. May arrive split across multiple calls at chunk
    /// boundaries; never merged across an intervening tag (§8).
    fn characters(&mut self, _chars: &str) {}

    /// Whitespace between child elements of an element the DTD declares
    /// `element-only` (§4.3 "Content-model dispatch").
    fn ignorable_whitespace(&mut self, _chars: &str) {}

    fn processing_instruction(&mut self, _target: &str, _data: &str) {}

    fn comment(&mut self, _chars: &str) {}
    fn start_cdata(&mut self) {}
    fn end_cdata(&mut self) {}

    /// Brackets a general entity's replacement text being re-tokenized in
    /// place (§4.3 "Ambient addition"), including the synthetic `[dtd]`
    /// entity around the external subset.
    fn start_entity(&mut self, _name: &str) {}
    fn end_entity(&mut self, _name: &str) {}

    /// An external or unparsed general entity reference in content, which
    /// this crate does not fetch (§4.3 Open Question resolution).
    fn skipped_entity(&mut self, _name: &str) {}
}

/// DTD declarations (§6.2, §4.4 "Events emitted to the sink").
pub trait DtdHandler {
    fn start_dtd(&mut self, _name: &str, _public_id: Option<&str>, _system_id: Option<&str>) {}
    fn end_dtd(&mut self) {}

    fn element_decl(&mut self, _name: &str, _content_model: &str) {}
    fn attribute_decl(&mut self, _element: &str, _attribute: &str, _attr_type: &str, _default_mode: &str, _default_value: Option<&str>) {}
    fn internal_entity_decl(&mut self, _name: &str, _value: &str) {}
    fn external_entity_decl(&mut self, _name: &str, _public_id: Option<&str>, _system_id: &str) {}
    fn notation_decl(&mut self, _name: &str, _public_id: Option<&str>, _system_id: Option<&str>) {}
    fn unparsed_entity_decl(&mut self, _name: &str, _public_id: Option<&str>, _system_id: &str, _notation: &str) {}
}

/// Diagnostics (§7). Every call receives a fully formed [`ReportedError`];
/// the default implementation discards everything except (implicitly, via
/// the parser's own `Result`) fatal errors, which always also abort parsing
/// regardless of what this trait does.
pub trait ErrorHandler {
    fn warning(&mut self, _error: &ReportedError) {}
    fn error(&mut self, _error: &ReportedError) {}
    fn fatal_error(&mut self, _error: &ReportedError) {}
}

/// The full sink a [`crate::parser::Parser`] drives (§6.2). Blanket-implemented
/// for any type that implements all three parts, mirroring the corpus's
/// preference for monomorphized, zero-cost handlers over one fat interface.
pub trait EventSink: ContentHandler + DtdHandler + ErrorHandler {}

impl<T: ContentHandler + DtdHandler + ErrorHandler> EventSink for T {}

/// A sink that discards every event; useful for well-formedness-only checks
/// (§6.1 "a `Parser::new` convenience").
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ContentHandler for NullSink {}
impl DtdHandler for NullSink {}
impl ErrorHandler for NullSink {}

/// Lets a boxed trait object stand in for `S: EventSink` (§6.1 "a
/// `Box<dyn EventSink>` convenience constructor"), so `Parser` does not need
/// a second generic shape for callers who want dynamic dispatch.
impl ContentHandler for Box<dyn EventSink> {
    fn start_document(&mut self) {
        (**self).start_document()
    }
    fn end_document(&mut self) {
        (**self).end_document()
    }
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        (**self).start_prefix_mapping(prefix, uri)
    }
    fn end_prefix_mapping(&mut self, prefix: &str) {
        (**self).end_prefix_mapping(prefix)
    }
    fn start_element(&mut self, uri: Option<&str>, local: &str, qname: &str, attributes: &[Attribute]) {
        (**self).start_element(uri, local, qname, attributes)
    }
    fn end_element(&mut self, uri: Option<&str>, local: &str, qname: &str) {
        (**self).end_element(uri, local, qname)
    }
    fn characters(&mut self, chars: &str) {
        (**self).characters(chars)
    }
    fn ignorable_whitespace(&mut self, chars: &str) {
        (**self).ignorable_whitespace(chars)
    }
    fn processing_instruction(&mut self, target: &str, data: &str) {
        (**self).processing_instruction(target, data)
    }
    fn comment(&mut self, chars: &str) {
        (**self).comment(chars)
    }
    fn start_cdata(&mut self) {
        (**self).start_cdata()
    }
    fn end_cdata(&mut self) {
        (**self).end_cdata()
    }
    fn start_entity(&mut self, name: &str) {
        (**self).start_entity(name)
    }
    fn end_entity(&mut self, name: &str) {
        (**self).end_entity(name)
    }
    fn skipped_entity(&mut self, name: &str) {
        (**self).skipped_entity(name)
    }
}

impl DtdHandler for Box<dyn EventSink> {
    fn start_dtd(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        (**self).start_dtd(name, public_id, system_id)
    }
    fn end_dtd(&mut self) {
        (**self).end_dtd()
    }
    fn element_decl(&mut self, name: &str, content_model: &str) {
        (**self).element_decl(name, content_model)
    }
    fn attribute_decl(&mut self, element: &str, attribute: &str, attr_type: &str, default_mode: &str, default_value: Option<&str>) {
        (**self).attribute_decl(element, attribute, attr_type, default_mode, default_value)
    }
    fn internal_entity_decl(&mut self, name: &str, value: &str) {
        (**self).internal_entity_decl(name, value)
    }
    fn external_entity_decl(&mut self, name: &str, public_id: Option<&str>, system_id: &str) {
        (**self).external_entity_decl(name, public_id, system_id)
    }
    fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        (**self).notation_decl(name, public_id, system_id)
    }
    fn unparsed_entity_decl(&mut self, name: &str, public_id: Option<&str>, system_id: &str, notation: &str) {
        (**self).unparsed_entity_decl(name, public_id, system_id, notation)
    }
}

impl ErrorHandler for Box<dyn EventSink> {
    fn warning(&mut self, error: &ReportedError) {
        (**self).warning(error)
    }
    fn error(&mut self, error: &ReportedError) {
        (**self).error(error)
    }
    fn fatal_error(&mut self, error: &ReportedError) {
        (**self).fatal_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        starts: Vec<String>,
    }

    impl ContentHandler for Recorder {
        fn start_element(&mut self, _uri: Option<&str>, _local: &str, qname: &str, _attributes: &[Attribute]) {
            self.starts.push(qname.to_string());
        }
    }
    impl DtdHandler for Recorder {}
    impl ErrorHandler for Recorder {}

    #[test]
    fn default_methods_are_no_ops_unless_overridden() {
        let mut r = Recorder::default();
        r.end_document();
        r.comment("x");
        r.start_element(None, "a", "a", &[]);
        assert_eq!(r.starts, vec!["a".to_string()]);
    }
}
