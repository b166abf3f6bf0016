//! Integration tests driving the full decode -> tokenize -> parse pipeline
//! through the public [`xevent_xml::Parser`] API, one chunking strategy at a
//! time (§8 "Universal properties" and "Concrete scenarios").

use pretty_assertions::assert_eq;
use xevent_xml::events::{Attribute, ContentHandler, DtdHandler, ErrorHandler};
use xevent_xml::{Parser, StaticResolver};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    StartDocument,
    EndDocument,
    StartPrefixMapping(String, String),
    EndPrefixMapping(String),
    StartElement(String, String, Vec<(String, String)>),
    EndElement(String, String),
    Characters(String),
    IgnorableWhitespace(String),
    Pi(String, String),
    Comment(String),
    StartCdata,
    EndCdata,
    StartDtd(String, Option<String>, Option<String>),
    EndDtd,
    ElementDecl(String, String),
    AttributeDecl(String, String, String, String, Option<String>),
    FatalError,
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

fn attr_pairs(attrs: &[Attribute]) -> Vec<(String, String)> {
    attrs.iter().map(|a| (a.name.qname.clone(), a.value.clone())).collect()
}

impl ContentHandler for Recorder {
    fn start_document(&mut self) {
        self.events.push(Event::StartDocument);
    }
    fn end_document(&mut self) {
        self.events.push(Event::EndDocument);
    }
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        self.events.push(Event::StartPrefixMapping(prefix.to_string(), uri.to_string()));
    }
    fn end_prefix_mapping(&mut self, prefix: &str) {
        self.events.push(Event::EndPrefixMapping(prefix.to_string()));
    }
    fn start_element(&mut self, uri: Option<&str>, _local: &str, qname: &str, attributes: &[Attribute]) {
        self.events
            .push(Event::StartElement(uri.unwrap_or("").to_string(), qname.to_string(), attr_pairs(attributes)));
    }
    fn end_element(&mut self, uri: Option<&str>, _local: &str, qname: &str) {
        self.events.push(Event::EndElement(uri.unwrap_or("").to_string(), qname.to_string()));
    }
    fn characters(&mut self, chars: &str) {
        self.events.push(Event::Characters(chars.to_string()));
    }
    fn ignorable_whitespace(&mut self, chars: &str) {
        self.events.push(Event::IgnorableWhitespace(chars.to_string()));
    }
    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.events.push(Event::Pi(target.to_string(), data.to_string()));
    }
    fn comment(&mut self, chars: &str) {
        self.events.push(Event::Comment(chars.to_string()));
    }
    fn start_cdata(&mut self) {
        self.events.push(Event::StartCdata);
    }
    fn end_cdata(&mut self) {
        self.events.push(Event::EndCdata);
    }
}

impl DtdHandler for Recorder {
    fn start_dtd(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        self.events
            .push(Event::StartDtd(name.to_string(), public_id.map(String::from), system_id.map(String::from)));
    }
    fn end_dtd(&mut self) {
        self.events.push(Event::EndDtd);
    }
    fn element_decl(&mut self, name: &str, content_model: &str) {
        self.events.push(Event::ElementDecl(name.to_string(), content_model.to_string()));
    }
    fn attribute_decl(&mut self, element: &str, attribute: &str, attr_type: &str, default_mode: &str, default_value: Option<&str>) {
        self.events.push(Event::AttributeDecl(
            element.to_string(),
            attribute.to_string(),
            attr_type.to_string(),
            default_mode.to_string(),
            default_value.map(String::from),
        ));
    }
}

impl ErrorHandler for Recorder {
    fn fatal_error(&mut self, _error: &xevent_xml::ReportedError) {
        self.events.push(Event::FatalError);
    }
}

/// Feeds `xml` through a [`Parser`] one byte at a time, the most adversarial
/// chunking a caller could choose, and returns the recorded event log.
fn parse_byte_by_byte(xml: &str) -> Vec<Event> {
    let mut parser = Parser::new(Recorder::default());
    for byte in xml.as_bytes() {
        parser.receive(&[*byte]).unwrap();
    }
    parser.close().unwrap();
    parser.into_sink().events
}

fn parse_whole(xml: &str) -> Vec<Event> {
    let mut parser = Parser::new(Recorder::default());
    parser.receive(xml.as_bytes()).unwrap();
    parser.close().unwrap();
    parser.into_sink().events
}

#[test]
fn scenario_minimal_document() {
    let events = parse_whole(r#"<?xml version="1.0"?><a/>"#);
    assert_eq!(
        events,
        vec![
            Event::StartDocument,
            Event::StartElement(String::new(), "a".to_string(), vec![]),
            Event::EndElement(String::new(), "a".to_string()),
            Event::EndDocument,
        ]
    );
}

#[test]
fn scenario_entity_reference_in_content() {
    let events = parse_whole("<a>x&amp;y</a>");
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Characters(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "x&y");
}

#[test]
fn scenario_namespace_propagation() {
    let events = parse_whole(r#"<a xmlns="u"><b/></a>"#);
    assert_eq!(
        events,
        vec![
            Event::StartDocument,
            Event::StartPrefixMapping(String::new(), "u".to_string()),
            Event::StartElement("u".to_string(), "a".to_string(), vec![]),
            Event::StartElement("u".to_string(), "b".to_string(), vec![]),
            Event::EndElement("u".to_string(), "b".to_string()),
            Event::EndElement("u".to_string(), "a".to_string()),
            Event::EndPrefixMapping(String::new()),
            Event::EndDocument,
        ]
    );
}

#[test]
fn scenario_duplicate_attribute_is_fatal() {
    let mut parser = Parser::new(Recorder::default());
    let result = parser.receive(br#"<a x="1" x="2"/>"#);
    assert!(result.is_err());
    assert!(!parser.into_sink().events.iter().any(|e| matches!(e, Event::StartElement(..))));
}

#[test]
fn scenario_doctype_with_attlist() {
    let events = parse_whole(r#"<!DOCTYPE r [<!ELEMENT r EMPTY><!ATTLIST r id ID #IMPLIED>]><r id="k"/>"#);
    assert_eq!(
        events,
        vec![
            Event::StartDocument,
            Event::StartDtd("r".to_string(), None, None),
            Event::ElementDecl("r".to_string(), "EMPTY".to_string()),
            Event::AttributeDecl("r".to_string(), "id".to_string(), "ID".to_string(), "#IMPLIED".to_string(), None),
            Event::EndDtd,
            Event::StartElement(String::new(), "r".to_string(), vec![("id".to_string(), "k".to_string())]),
            Event::EndElement(String::new(), "r".to_string()),
            Event::EndDocument,
        ]
    );
}

#[test]
fn chunking_is_irrelevant_to_the_event_stream() {
    let xml = r#"<?xml version="1.0"?><root a="1"><child>hello &amp; goodbye</child><!--note--></root>"#;
    assert_eq!(parse_whole(xml), parse_byte_by_byte(xml));
}

#[test]
fn crlf_and_lone_cr_normalize_to_lf() {
    let events = parse_whole("<a>line1\r\nline2\rline3</a>");
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Characters(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "line1\nline2\nline3");
}

#[test]
fn split_crlf_across_chunks_still_collapses() {
    let mut parser = Parser::new(Recorder::default());
    parser.receive(b"<a>line1\r").unwrap();
    parser.receive(b"\nline2</a>").unwrap();
    parser.close().unwrap();
    let events = parser.into_sink().events;
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Characters(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "line1\nline2");
}

#[test]
fn split_multibyte_character_across_chunks() {
    // U+1F600 (4-byte UTF-8 GRINNING FACE) split after its first byte.
    let full = "<a>\u{1F600}</a>";
    let bytes = full.as_bytes();
    let split_at = 4; // "<a>" (3 bytes) + first byte of the 4-byte char
    let mut parser = Parser::new(Recorder::default());
    parser.receive(&bytes[..split_at]).unwrap();
    parser.receive(&bytes[split_at..]).unwrap();
    parser.close().unwrap();
    let events = parser.into_sink().events;
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Characters(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "\u{1F600}");
}

#[test]
fn utf8_bom_is_accepted_and_not_reported_as_characters() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"<a>hi</a>");
    let mut parser = Parser::new(Recorder::default());
    parser.receive(&bytes).unwrap();
    parser.close().unwrap();
    let events = parser.into_sink().events;
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Characters(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "hi");
}

#[test]
fn declaration_spanning_a_chunk_boundary_does_not_fail() {
    let mut parser = Parser::new(Recorder::default());
    parser.receive(b"<?xml versi").unwrap();
    parser.receive(b"on=\"1.0\"?><r/>").unwrap();
    parser.close().unwrap();
    assert!(parser.sink().events.contains(&Event::StartElement(String::new(), "r".to_string(), vec![])));
}

#[test]
fn namespace_redeclaration_shadows_and_restores() {
    let events = parse_whole(r#"<a xmlns:p="u1"><b xmlns:p="u2"><p:e/></b></a>"#);
    let inner = events
        .iter()
        .find(|e| matches!(e, Event::StartElement(_, qname, _) if qname == "p:e"))
        .unwrap();
    match inner {
        Event::StartElement(uri, _, _) => assert_eq!(uri, "u2"),
        _ => unreachable!(),
    }
}

#[test]
fn disabling_dtd_suppresses_dtd_events_but_still_parses_content() {
    let mut parser = Parser::new(Recorder::default());
    parser.config_mut().enable_dtd(false);
    parser.receive(br#"<!DOCTYPE r [<!ELEMENT r EMPTY>]><r/>"#).unwrap();
    parser.close().unwrap();
    let events = parser.into_sink().events;
    assert!(!events.iter().any(|e| matches!(e, Event::StartDtd(..) | Event::ElementDecl(..))));
    assert!(events.contains(&Event::StartElement(String::new(), "r".to_string(), vec![])));
}

#[test]
fn unresolved_external_subset_degrades_gracefully() {
    let mut parser = Parser::new(Recorder::default());
    parser.set_resolver(StaticResolver::new());
    parser.receive(br#"<!DOCTYPE r SYSTEM "missing.dtd"><r/>"#).unwrap();
    parser.close().unwrap();
    assert!(parser.sink().events.contains(&Event::StartElement(String::new(), "r".to_string(), vec![])));
}

#[test]
fn comment_and_processing_instruction_in_prolog() {
    let events = parse_whole("<?xml version=\"1.0\"?><!--hello--><?pi data?><a/>");
    assert!(events.contains(&Event::Comment("hello".to_string())));
    assert!(events.contains(&Event::Pi("pi".to_string(), "data".to_string())));
}
