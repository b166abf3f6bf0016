//! Document position tracking shared by the decoder, tokenizer and parsers.

/// A position within the normalized character stream of one entity: the byte
/// offset of the *decoded* (not source-encoded) stream, the 1-based line and
/// the 0-based column (the first character consumed on a line brings the
/// column to 1, matching the locator contract in the external interfaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub byte: u64,
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub const fn start() -> Self {
        Position { byte: 0, line: 1, column: 0 }
    }

    /// Advances the position by a single (already normalized) character.
    pub fn advance(&mut self, ch: char) {
        self.byte += ch.len_utf8() as u64;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

/// Everything a sink needs to render a useful diagnostic: where we are, and
/// which entity we are in.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    pub position: Position,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub encoding: Option<&'static str>,
    pub xml_version: XmlVersion,
}

/// The declared (or assumed) XML version of the entity currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlVersion {
    #[default]
    V10,
    V11,
}

impl XmlVersion {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1.0" => Some(XmlVersion::V10),
            _ if text.starts_with("1.") => Some(XmlVersion::V11),
            _ => None,
        }
    }
}
