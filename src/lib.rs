//! A push-driven, non-blocking XML 1.0 / 1.1 parser.
//!
//! ## Description
//!
//! - [`Parser`]: feed it byte chunks of arbitrary size as they arrive — from
//!   a socket, a file read in pieces, anywhere — and it reports SAX-style
//!   events to an [`EventSink`] as soon as they're recognized. It never
//!   blocks on I/O and never requires the whole document to be buffered.
//! - [`Writer`]: the inverse direction, an [`EventSink`] that serializes the
//!   events it receives back out as XML text.
//!
//! ## Examples
//!
//! ### Parsing
//!
//! ```rust
//! use xevent_xml::events::{ContentHandler, DtdHandler, ErrorHandler};
//! use xevent_xml::Parser;
//!
//! #[derive(Default)]
//! struct Titles(Vec<String>);
//!
//! impl ContentHandler for Titles {
//!     fn characters(&mut self, chars: &str) {
//!         self.0.push(chars.to_string());
//!     }
//! }
//! impl DtdHandler for Titles {}
//! impl ErrorHandler for Titles {}
//!
//! let mut parser = Parser::new(Titles::default());
//! // chunks may split tags, declarations or characters anywhere
//! parser.receive(b"<book><ti").unwrap();
//! parser.receive(b"tle>Hyperion</title></book>").unwrap();
//! parser.close().unwrap();
//!
//! assert_eq!(parser.into_sink().0, vec!["Hyperion".to_string()]);
//! ```
//!
//! ### Writing
//!
//! ```rust
//! use xevent_xml::events::ContentHandler;
//! use xevent_xml::Writer;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.start_element(None, "book", "book", &[]);
//! writer.characters("Hyperion");
//! writer.end_element(None, "book", "book");
//! writer.check().unwrap();
//!
//! assert_eq!(writer.into_inner(), b"<book>Hyperion</book>");
//! ```

mod attribute;
mod buffer;
mod charclass;
mod config;
mod content_parser;
mod decoder;
mod dtd;
mod encoding;
mod errors;
pub mod events;
mod name;
mod parser;
mod position;
mod resolver;
mod token;
mod tokenizer;
mod writer;

pub use config::ParserConfig;
pub use decoder::{DeclarationInfo, ExternalEntityDecoder};
pub use errors::{Error, ReportedError, Result, Severity, SyntaxError, WfError};
pub use parser::Parser;
pub use position::{Locator, Position, XmlVersion};
pub use resolver::{EntityResolver, ExternalSource, NullResolver, StaticResolver};
pub use writer::Writer;

pub use attribute::{Attribute, AttributeType};
pub use name::QName;
