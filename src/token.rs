//! Lexical tokens produced by the [`crate::tokenizer::Tokenizer`] (§3 "Token").
//!
//! The distilled spec describes a token as "a tag identifying the lexical
//! kind ... plus a character range within the current character buffer".
//! This crate decodes chunks into owned `String`s and compacts them between
//! `receive` calls (see [`crate::buffer`]), so a borrowed range would not
//! outlive the call that produced it; tokens therefore carry their text
//! directly as an owned `String`. This is a deliberate generalization of the
//! teacher crate's zero-copy `Cow`-backed events to the push/reentrant
//! setting this parser operates in (recorded in DESIGN.md).

use crate::position::Position;

/// The lexical kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of `NAME_START NAME_CONT*` characters.
    Name,
    /// A run of whitespace characters.
    S,
    /// `<`, starting a start tag.
    Lt,
    /// `</`, starting an end tag.
    LtSlash,
    /// `>`, closing a start or end tag, or a declaration.
    Gt,
    /// `/>`, closing an empty-element tag.
    SlashGt,
    /// `=` between an attribute name and its value.
    Eq,
    /// `"` delimiting a double-quoted value.
    QuoteDouble,
    /// `'` delimiting a single-quoted value.
    QuoteSingle,
    /// The literal text inside a quoted attribute or literal value.
    AttrValueText,
    /// A run of character data (text content outside of markup).
    CharData,
    /// `<!--`, opening a comment.
    LtBangDashDash,
    /// The text between `<!--` and `-->`.
    CommentText,
    /// `-->`, closing a comment.
    DashDashGt,
    /// `<![CDATA[`, opening a CDATA section.
    LtBangCData,
    /// The text between `<![CDATA[` and `]]>`.
    CDataText,
    /// `]]>`, closing a CDATA section or conditional section.
    CDataEnd,
    /// `<?`, opening a processing instruction.
    LtQuestion,
    /// The processing instruction's target (first name after `<?`).
    PiTarget,
    /// The processing instruction's data, if any (text after the target).
    PiData,
    /// `?>`, closing a processing instruction.
    QuestionGt,
    /// `&`, starting a general entity or character reference.
    Amp,
    /// `%`, starting a parameter entity reference.
    Percent,
    /// `#`, starting a decimal character reference (`&#ddd;`).
    Hash,
    /// `#x`, starting a hexadecimal character reference (`&#xhhh;`).
    HashX,
    /// `;`, closing an entity or character reference.
    Semi,
    /// `<!DOCTYPE` (case-insensitive).
    LtBangDoctype,
    /// `[`, opening the DTD internal subset. `PUBLIC`/`SYSTEM`/`NDATA`
    /// keywords inside a doctype header or declaration body are not lexed
    /// specially; they surface as plain `Name`/`DtdDeclBody` text and the
    /// DTD parser matches them by string comparison.
    LBracket,
    /// `]`, closing the DTD internal subset.
    RBracket,
    /// `<!ELEMENT` / `<!ATTLIST` / `<!ENTITY` / `<!NOTATION`; the token text
    /// carries the keyword (without `<!`).
    DtdMarkupDeclStart,
    /// The raw, quote-aware text of a DTD markup declaration's body, i.e.
    /// everything between the keyword and the matching unquoted `>`. The
    /// DTD parser performs its own fine-grained decomposition of this text
    /// (see DESIGN.md for why declaration bodies are tokenized as one span
    /// rather than name/type/default sub-tokens).
    DtdDeclBody,
    /// `<![INCLUDE[` / `<![IGNORE[`; text carries the keyword.
    CondSectStart,
    /// End of input for the current entity (emitted once, at `close()`).
    Eof,
}

/// One lexical token: its kind, the text it covers (empty for pure
/// punctuation kinds), and the position its first character was at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token { kind, text: text.into(), position }
    }
}
