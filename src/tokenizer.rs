//! The lexical state machine (§4.2 "Tokenizer").
//!
//! Grounded on `parser/mod.rs` of the teacher crate: a `State` enum advanced
//! byte-by-byte (here, character-by-character) that returns `NeedData`
//! (this crate's [`ReadResult::Underflow`]) when a token's boundary cannot
//! yet be determined, and on `quick-dtd`'s `PiParser`/`QuotedParser`, whose
//! "remember how much of the delimiter we've already matched" trick is
//! generalized here into [`split_before_delimiter`] so it works for any
//! multi-character terminator (`-->`, `]]>`, `?>`).
//!
//! Unlike the teacher's `Parser`, which returns one `FeedResult` per `feed`
//! call and expects the caller to resume scanning from an offset, this
//! tokenizer owns a retained `pending: String` (see [`crate::buffer`]) and
//! drains zero or more complete [`Token`]s per [`Tokenizer::feed`] call,
//! which matches the push parser's "runs to quiescence" contract (§5).

use crate::charclass::{is_whitespace, CharClass};
use crate::errors::SyntaxError;
use crate::position::Position;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Element,
    Doctype,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Dec,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefReturn {
    Content,
    AttrValue(char, TagKind),
    DtdSubset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PiSub {
    AwaitingTarget,
    AfterTarget,
    InData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Content,
    AfterAmp(RefReturn),
    AfterPercent,
    InCharRef(Radix, RefReturn),
    AfterRefName(RefReturn),
    InTag(TagKind),
    InAttrValue(char, TagKind),
    InComment,
    InCData,
    InPi(PiSub),
    InDtdSubset,
    InDtdDeclBody,
    InCondSectRaw,
}

/// Finds `needle` in `text`, returning `(safe_prefix_len, found)`.
///
/// If `needle` occurs, `safe_prefix_len` is its byte offset and `found` is
/// `true`. Otherwise `safe_prefix_len` is the longest prefix of `text` that
/// cannot possibly be the start of an occurrence of `needle` straddling the
/// chunk boundary -- the remaining suffix (at most `needle.len() - 1` bytes)
/// must be retained as `pending` until more input resolves the ambiguity.
fn split_before_delimiter(text: &str, needle: &str) -> (usize, bool) {
    // `needle` (`-->`, `?>`, `]]>`) is always pure ASCII, so a byte match can
    // never land inside a multi-byte UTF-8 sequence; memchr's substring
    // search is noticeably faster here than `str::find`'s Unicode-aware one.
    if let Some(idx) = memchr::memmem::find(text.as_bytes(), needle.as_bytes()) {
        return (idx, true);
    }
    let max_check = needle.len().saturating_sub(1).min(text.len());
    for k in (1..=max_check).rev() {
        if text.ends_with(&needle[..k]) {
            return (text.len() - k, false);
        }
    }
    (text.len(), false)
}

fn contains_double_hyphen(text: &str) -> bool {
    text.as_bytes().windows(2).any(|w| w == b"--")
}

/// Scans for the first unquoted `>`um, treating `'` and `"` as toggling a
/// quoted region (§9 "Mutable shared buffer"/`quoted.rs` in the teacher's
/// sibling DTD lexer). Since callers only invoke this over text that has not
/// yet been consumed, replaying from `Outside` on every call is correct: the
/// quote state is always fully re-derivable from the untouched prefix.
fn find_unquoted_gt(text: &str) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Outside,
        Single,
        Double,
    }
    let mut mode = Mode::Outside;
    for (i, b) in text.bytes().enumerate() {
        match (mode, b) {
            (Mode::Outside, b'>') => return Some(i),
            (Mode::Outside, b'\'') => mode = Mode::Single,
            (Mode::Outside, b'"') => mode = Mode::Double,
            (Mode::Single, b'\'') => mode = Mode::Outside,
            (Mode::Double, b'"') => mode = Mode::Outside,
            _ => {}
        }
    }
    None
}

/// Finds the end of a (possibly nested) conditional section body, i.e. the
/// byte offset of the `]]>` that balances the opening this section started
/// with. Nested `<![` opens increase the depth so an inner section's
/// closing marker does not prematurely end the outer one (§4.4 "nested
/// IGNORE sections are matched by counting `<![` and `]]>` pairs").
fn find_cond_sect_end(text: &str) -> Option<usize> {
    let mut depth: u32 = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"<![") {
            depth += 1;
            i += 3;
        } else if bytes[i..].starts_with(b"]]>") {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
            i += 3;
        } else {
            i += 1;
        }
    }
    None
}

fn lex_name_len(text: &str, class: CharClass) -> Option<usize> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !class.is_name_start(first) {
        return None;
    }
    let mut end = first.len_utf8();
    for (idx, ch) in chars {
        if class.is_name_char(ch) {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    Some(end)
}

/// The character-level tokenizer (§4.2). Owns its own retained text so it
/// can be fed arbitrarily small chunks of already-decoded, already
/// line-normalized characters from the [`crate::decoder::ExternalEntityDecoder`].
#[derive(Debug)]
pub struct Tokenizer {
    pending: String,
    state: LexState,
    position: Position,
    char_class: CharClass,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer {
            pending: String::new(),
            state: LexState::Content,
            position: Position::start(),
            char_class: CharClass::default(),
        }
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_char_class(&mut self, class: CharClass) {
        self.char_class = class;
    }

    /// Primes this tokenizer as if positioned just after the internal
    /// subset's `[`, so a fully-fetched external subset can be lexed
    /// through the same DTD-declaration/conditional-section grammar as the
    /// internal subset (§4.4).
    pub(crate) fn enter_dtd_subset(&mut self) {
        self.state = LexState::InDtdSubset;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// `true` once every pending character has been turned into a token;
    /// used by `close()` to detect a truncated document (§5 "Cancellation").
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && matches!(self.state, LexState::Content)
    }

    fn take(&mut self, n: usize) -> String {
        let text: String = self.pending.drain(..n).collect();
        for ch in text.chars() {
            self.position.advance(ch);
        }
        text
    }

    fn emit(&mut self, kind: TokenKind, text: String, start: Position) -> Token {
        Token::new(kind, text, start)
    }

    /// Appends newly decoded text and drains every complete token it can
    /// produce into `out`, stopping at the first underflow. Mirrors the
    /// teacher's `Parser::feed` loop over a byte slice, generalized to the
    /// retained-buffer push model (§4.2 "Underflow handling").
    pub fn feed(&mut self, text: &str, out: &mut Vec<Token>) -> Result<(), SyntaxError> {
        self.pending.push_str(text);
        loop {
            let start = self.position;
            match self.step(start)? {
                Some(token) => out.push(token),
                None => break,
            }
        }
        Ok(())
    }

    /// Notifies the tokenizer that no more input is coming. Returns an error
    /// if a token was left incomplete (§5 "unexpected EOF").
    pub fn at_eof(&self) -> bool {
        self.is_idle()
    }

    fn step(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        match self.state {
            LexState::Content => self.step_content(start),
            LexState::AfterAmp(ret) => self.step_after_amp(start, ret),
            LexState::AfterPercent => self.step_after_percent(start),
            LexState::InCharRef(radix, ret) => self.step_in_char_ref(start, radix, ret),
            LexState::AfterRefName(ret) => self.step_after_ref_name(start, ret),
            LexState::InTag(kind) => self.step_in_tag(start, kind),
            LexState::InAttrValue(quote, kind) => self.step_in_attr_value(start, quote, kind),
            LexState::InComment => self.step_in_comment(start),
            LexState::InCData => self.step_in_cdata(start),
            LexState::InPi(sub) => self.step_in_pi(start, sub),
            LexState::InDtdSubset => self.step_in_dtd_subset(start),
            LexState::InDtdDeclBody => self.step_in_dtd_decl_body(start),
            LexState::InCondSectRaw => self.step_in_cond_sect(start),
        }
    }

    fn step_content(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let first = self.pending.as_bytes()[0];
        if first == b'<' {
            return self.step_markup_open(start, TagKind::Element);
        }
        if first == b'&' {
            self.take(1);
            self.state = LexState::AfterAmp(RefReturn::Content);
            return Ok(Some(self.emit(TokenKind::Amp, "&".into(), start)));
        }
        // Plain character data: flush up to the next '<' or '&', or all of
        // it if neither appears yet (text legitimately spans chunks, §8).
        let idx = self.pending.find(['<', '&']).unwrap_or(self.pending.len());
        if idx == 0 {
            return Ok(None);
        }
        let text = self.take(idx);
        Ok(Some(self.emit(TokenKind::CharData, text, start)))
    }

    /// Shared lookahead for `<` in a context where `<!--`, `<![CDATA[`,
    /// `<!DOCTYPE`, `<?`, `</` and a bare start tag are all in play. `kind`
    /// distinguishes `Content` (document body) from `Doctype` is not used
    /// here directly -- conditional sections and DTD declarations are only
    /// reachable from [`Self::step_in_dtd_subset`], which has its own
    /// lookahead.
    fn step_markup_open(&mut self, start: Position, _kind: TagKind) -> Result<Option<Token>, SyntaxError> {
        let bytes = self.pending.as_bytes();
        match bytes.get(1) {
            None => Ok(None),
            Some(b'?') => {
                self.take(2);
                self.state = LexState::InPi(PiSub::AwaitingTarget);
                Ok(Some(self.emit(TokenKind::LtQuestion, "<?".into(), start)))
            }
            Some(b'/') => {
                self.take(2);
                self.state = LexState::InTag(TagKind::Element);
                Ok(Some(self.emit(TokenKind::LtSlash, "</".into(), start)))
            }
            Some(b'!') => self.step_bang_in_content(start),
            Some(_) => {
                self.take(1);
                self.state = LexState::InTag(TagKind::Element);
                Ok(Some(self.emit(TokenKind::Lt, "<".into(), start)))
            }
        }
    }

    fn step_bang_in_content(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        let text = self.pending.as_str();
        if text.len() < 2 {
            return Ok(None);
        }
        if text.starts_with("<!--") {
            self.take(4);
            self.state = LexState::InComment;
            return Ok(Some(self.emit(TokenKind::LtBangDashDash, "<!--".into(), start)));
        }
        if "<!--".starts_with(text) {
            return Ok(None);
        }
        const CDATA: &str = "<![CDATA[";
        if text.starts_with(CDATA) {
            self.take(CDATA.len());
            self.state = LexState::InCData;
            return Ok(Some(self.emit(TokenKind::LtBangCData, CDATA.into(), start)));
        }
        if CDATA.starts_with(text) {
            return Ok(None);
        }
        const DOCTYPE: &str = "<!DOCTYPE";
        if text.len() >= DOCTYPE.len() {
            if text[..DOCTYPE.len()].eq_ignore_ascii_case(DOCTYPE) {
                let consumed = self.take(DOCTYPE.len());
                self.state = LexState::InTag(TagKind::Doctype);
                return Ok(Some(self.emit(TokenKind::LtBangDoctype, consumed, start)));
            }
        } else if DOCTYPE[..text.len()].eq_ignore_ascii_case(text) {
            return Ok(None);
        }
        Err(SyntaxError::InvalidBangMarkup(text.chars().nth(2).unwrap_or('\0')))
    }

    fn step_after_amp(&mut self, start: Position, ret: RefReturn) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let first = self.pending.chars().next().unwrap();
        if first == '#' {
            let bytes = self.pending.as_bytes();
            match bytes.get(1) {
                None => Ok(None),
                Some(b'x') | Some(b'X') => {
                    let text = self.take(2);
                    self.state = LexState::InCharRef(Radix::Hex, ret);
                    Ok(Some(self.emit(TokenKind::HashX, text, start)))
                }
                Some(_) => {
                    let text = self.take(1);
                    self.state = LexState::InCharRef(Radix::Dec, ret);
                    Ok(Some(self.emit(TokenKind::Hash, text, start)))
                }
            }
        } else if self.char_class.is_name_start(first) {
            let len = lex_name_len(&self.pending, self.char_class).unwrap();
            let text = self.take(len);
            self.state = LexState::AfterRefName(ret);
            Ok(Some(self.emit(TokenKind::Name, text, start)))
        } else {
            Err(SyntaxError::InvalidCharRef)
        }
    }

    fn step_after_percent(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let first = self.pending.chars().next().unwrap();
        if self.char_class.is_name_start(first) {
            let len = lex_name_len(&self.pending, self.char_class).unwrap();
            let text = self.take(len);
            self.state = LexState::AfterRefName(RefReturn::DtdSubset);
            Ok(Some(self.emit(TokenKind::Name, text, start)))
        } else {
            Err(SyntaxError::ExpectedName)
        }
    }

    fn step_in_char_ref(&mut self, start: Position, radix: Radix, ret: RefReturn) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let is_digit = |c: char| match radix {
            Radix::Dec => c.is_ascii_digit(),
            Radix::Hex => c.is_ascii_hexdigit(),
        };
        let end = self.pending.char_indices().find(|(_, c)| !is_digit(*c)).map(|(i, _)| i).unwrap_or(self.pending.len());
        if end == 0 {
            // No digits consumed yet: either malformed, or genuinely no
            // more input -- only Underflow if the buffer is truly empty,
            // which is handled above, so this is a real error.
            return Err(SyntaxError::InvalidCharRef);
        }
        let text = self.take(end);
        self.state = LexState::AfterRefName(ret);
        Ok(Some(self.emit(TokenKind::Name, text, start)))
    }

    fn step_after_ref_name(&mut self, start: Position, ret: RefReturn) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        if self.pending.as_bytes()[0] == b';' {
            let text = self.take(1);
            self.state = match ret {
                RefReturn::Content => LexState::Content,
                RefReturn::AttrValue(q, k) => LexState::InAttrValue(q, k),
                RefReturn::DtdSubset => LexState::InDtdSubset,
            };
            Ok(Some(self.emit(TokenKind::Semi, text, start)))
        } else {
            Err(SyntaxError::InvalidCharRef)
        }
    }

    fn step_in_tag(&mut self, start: Position, kind: TagKind) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let first = self.pending.chars().next().unwrap();
        if is_whitespace(first) {
            let end = self.pending.char_indices().find(|(_, c)| !is_whitespace(*c)).map(|(i, _)| i).unwrap_or(self.pending.len());
            let text = self.take(end);
            return Ok(Some(self.emit(TokenKind::S, text, start)));
        }
        if self.char_class.is_name_start(first) {
            let len = lex_name_len(&self.pending, self.char_class).unwrap();
            let text = self.take(len);
            return Ok(Some(self.emit(TokenKind::Name, text, start)));
        }
        match first {
            '=' => {
                let text = self.take(1);
                Ok(Some(self.emit(TokenKind::Eq, text, start)))
            }
            '"' | '\'' => {
                let quote = first;
                let text = self.take(1);
                self.state = LexState::InAttrValue(quote, kind);
                let token_kind = if quote == '"' { TokenKind::QuoteDouble } else { TokenKind::QuoteSingle };
                Ok(Some(self.emit(token_kind, text, start)))
            }
            '/' if kind == TagKind::Element => {
                if self.pending.len() < 2 {
                    return Ok(None);
                }
                if self.pending.as_bytes()[1] == b'>' {
                    let text = self.take(2);
                    self.state = LexState::Content;
                    Ok(Some(self.emit(TokenKind::SlashGt, text, start)))
                } else {
                    Err(SyntaxError::UnexpectedChar('/'))
                }
            }
            '>' => {
                let text = self.take(1);
                self.state = LexState::Content;
                Ok(Some(self.emit(TokenKind::Gt, text, start)))
            }
            '[' if kind == TagKind::Doctype => {
                let text = self.take(1);
                self.state = LexState::InDtdSubset;
                Ok(Some(self.emit(TokenKind::LBracket, text, start)))
            }
            other => Err(SyntaxError::UnexpectedChar(other)),
        }
    }

    fn step_in_attr_value(&mut self, start: Position, quote: char, kind: TagKind) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let idx = self.pending.find([quote, '&']).unwrap_or(self.pending.len());
        if idx > 0 {
            let text = self.take(idx);
            return Ok(Some(self.emit(TokenKind::AttrValueText, text, start)));
        }
        let ch = self.pending.chars().next().unwrap();
        if ch == quote {
            let text = self.take(1);
            self.state = LexState::InTag(kind);
            let token_kind = if quote == '"' { TokenKind::QuoteDouble } else { TokenKind::QuoteSingle };
            Ok(Some(self.emit(token_kind, text, start)))
        } else {
            let text = self.take(1);
            self.state = LexState::AfterAmp(RefReturn::AttrValue(quote, kind));
            Ok(Some(self.emit(TokenKind::Amp, text, start)))
        }
    }

    fn step_in_comment(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let (safe_len, found) = split_before_delimiter(&self.pending, "-->");
        if found && safe_len == 0 {
            let text = self.take(3);
            self.state = LexState::Content;
            return Ok(Some(self.emit(TokenKind::DashDashGt, text, start)));
        }
        if safe_len > 0 {
            if contains_double_hyphen(&self.pending[..safe_len]) {
                return Err(SyntaxError::CommentDoubleHyphen);
            }
            let text = self.take(safe_len);
            return Ok(Some(self.emit(TokenKind::CommentText, text, start)));
        }
        Ok(None)
    }

    fn step_in_cdata(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let (safe_len, found) = split_before_delimiter(&self.pending, "]]>");
        if found && safe_len == 0 {
            let text = self.take(3);
            self.state = LexState::Content;
            return Ok(Some(self.emit(TokenKind::CDataEnd, text, start)));
        }
        if safe_len > 0 {
            let text = self.take(safe_len);
            return Ok(Some(self.emit(TokenKind::CDataText, text, start)));
        }
        Ok(None)
    }

    fn step_in_pi(&mut self, start: Position, sub: PiSub) -> Result<Option<Token>, SyntaxError> {
        match sub {
            PiSub::AwaitingTarget => {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                match lex_name_len(&self.pending, self.char_class) {
                    Some(len) => {
                        let text = self.take(len);
                        self.state = LexState::InPi(PiSub::AfterTarget);
                        Ok(Some(self.emit(TokenKind::PiTarget, text, start)))
                    }
                    None => Err(SyntaxError::InvalidPiTarget(self.pending.clone())),
                }
            }
            PiSub::AfterTarget => {
                if self.pending.starts_with("?>") {
                    let text = self.take(2);
                    self.state = LexState::Content;
                    return Ok(Some(self.emit(TokenKind::QuestionGt, text, start)));
                }
                if "?>".starts_with(self.pending.as_str()) && !self.pending.is_empty() {
                    return Ok(None);
                }
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let first = self.pending.chars().next().unwrap();
                if is_whitespace(first) {
                    self.take(1);
                    self.state = LexState::InPi(PiSub::InData);
                    self.step_in_pi(start, PiSub::InData)
                } else {
                    Err(SyntaxError::InvalidPiTarget(self.pending.clone()))
                }
            }
            PiSub::InData => {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let (safe_len, found) = split_before_delimiter(&self.pending, "?>");
                if found && safe_len == 0 {
                    let text = self.take(2);
                    self.state = LexState::Content;
                    return Ok(Some(self.emit(TokenKind::QuestionGt, text, start)));
                }
                if safe_len > 0 {
                    let text = self.take(safe_len);
                    return Ok(Some(self.emit(TokenKind::PiData, text, start)));
                }
                Ok(None)
            }
        }
    }

    fn step_in_dtd_subset(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let first = self.pending.chars().next().unwrap();
        if is_whitespace(first) {
            let end = self.pending.char_indices().find(|(_, c)| !is_whitespace(*c)).map(|(i, _)| i).unwrap_or(self.pending.len());
            let text = self.take(end);
            return Ok(Some(self.emit(TokenKind::S, text, start)));
        }
        if first == '%' {
            let text = self.take(1);
            self.state = LexState::AfterPercent;
            return Ok(Some(self.emit(TokenKind::Percent, text, start)));
        }
        if first == ']' {
            let text = self.take(1);
            self.state = LexState::InTag(TagKind::Doctype);
            return Ok(Some(self.emit(TokenKind::RBracket, text, start)));
        }
        if first == '<' {
            return self.step_bang_in_subset(start);
        }
        Err(SyntaxError::UnexpectedChar(first))
    }

    fn step_bang_in_subset(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        let text = self.pending.as_str();
        if text.len() < 2 {
            return Ok(None);
        }
        if text.as_bytes()[1] == b'?' {
            self.take(2);
            self.state = LexState::InPi(PiSub::AwaitingTarget);
            return Ok(Some(self.emit(TokenKind::LtQuestion, "<?".into(), start)));
        }
        if text.as_bytes()[1] != b'!' {
            return Err(SyntaxError::UnexpectedChar(text.chars().nth(1).unwrap()));
        }
        if text.starts_with("<!--") {
            self.take(4);
            self.state = LexState::InComment;
            return Ok(Some(self.emit(TokenKind::LtBangDashDash, "<!--".into(), start)));
        }
        if "<!--".starts_with(text) {
            return Ok(None);
        }
        if text.starts_with("<![") {
            const INCLUDE: &str = "<![INCLUDE[";
            const IGNORE: &str = "<![IGNORE[";
            if text.starts_with(INCLUDE) {
                self.take(INCLUDE.len());
                self.state = LexState::InCondSectRaw;
                return Ok(Some(self.emit(TokenKind::CondSectStart, "INCLUDE".into(), start)));
            }
            if text.starts_with(IGNORE) {
                self.take(IGNORE.len());
                self.state = LexState::InCondSectRaw;
                return Ok(Some(self.emit(TokenKind::CondSectStart, "IGNORE".into(), start)));
            }
            if INCLUDE.starts_with(text) || IGNORE.starts_with(text) {
                return Ok(None);
            }
            return Err(SyntaxError::UnexpectedChar('['));
        }
        if "<![".starts_with(text) {
            return Ok(None);
        }
        for keyword in ["ELEMENT", "ATTLIST", "ENTITY", "NOTATION"] {
            let full = format!("<!{keyword}");
            if text.len() >= full.len() {
                if text.starts_with(&full) {
                    self.take(full.len());
                    self.state = LexState::InDtdDeclBody;
                    return Ok(Some(self.emit(TokenKind::DtdMarkupDeclStart, keyword.into(), start)));
                }
            } else if full.starts_with(text) {
                return Ok(None);
            }
        }
        Err(SyntaxError::InvalidBangMarkup(text.chars().nth(2).unwrap_or('\0')))
    }

    fn step_in_dtd_decl_body(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        match find_unquoted_gt(&self.pending) {
            Some(idx) => {
                let text = self.take(idx);
                self.take(1); // the '>' itself, not part of the body
                self.state = LexState::InDtdSubset;
                Ok(Some(self.emit(TokenKind::DtdDeclBody, text, start)))
            }
            None => Ok(None),
        }
    }

    fn step_in_cond_sect(&mut self, start: Position) -> Result<Option<Token>, SyntaxError> {
        match find_cond_sect_end(&self.pending) {
            Some(idx) => {
                let text = self.take(idx);
                self.take(3); // the "]]>" itself
                self.state = LexState::InDtdSubset;
                Ok(Some(self.emit(TokenKind::CDataText, text, start)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        tok.feed(src, &mut out).unwrap();
        out.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_element_tokenizes() {
        assert_eq!(kinds("<a/>"), vec![Lt, Name, SlashGt]);
    }

    #[test]
    fn start_and_end_tag_with_text() {
        assert_eq!(
            kinds("<a>x</a>"),
            vec![Lt, Name, Gt, CharData, LtSlash, Name, Gt]
        );
    }

    #[test]
    fn attribute_with_entity_reference() {
        assert_eq!(
            kinds(r#"<a b="x&amp;y"/>"#),
            vec![Lt, Name, S, Name, Eq, QuoteDouble, AttrValueText, Amp, Name, Semi, AttrValueText, QuoteDouble, SlashGt]
        );
    }

    #[test]
    fn comment_is_tokenized_whole() {
        assert_eq!(kinds("<!--hi-->"), vec![LtBangDashDash, CommentText, DashDashGt]);
    }

    #[test]
    fn cdata_section() {
        assert_eq!(kinds("<![CDATA[a]]b]]>"), vec![LtBangCData, CDataText, CDataEnd]);
    }

    #[test]
    fn processing_instruction_with_data() {
        assert_eq!(kinds("<?t d?>"), vec![LtQuestion, PiTarget, PiData, QuestionGt]);
    }

    #[test]
    fn processing_instruction_without_data() {
        assert_eq!(kinds("<?t?>"), vec![LtQuestion, PiTarget, QuestionGt]);
    }

    #[test]
    fn declaration_spanning_chunks_underflows_without_error() {
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        tok.feed("<?xml versi", &mut out).unwrap();
        assert_eq!(out.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![LtQuestion, PiTarget]);
        out.clear();
        tok.feed("on=\"1.0\"?>", &mut out).unwrap();
        assert!(out.iter().any(|t| t.kind == QuestionGt));
    }

    #[test]
    fn split_comment_terminator_across_chunks() {
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        tok.feed("<!--abc-", &mut out).unwrap();
        tok.feed("->", &mut out).unwrap();
        assert_eq!(out.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![LtBangDashDash, CommentText, DashDashGt]);
        let text: String = out.iter().filter(|t| t.kind == CommentText).map(|t| t.text.clone()).collect();
        assert_eq!(text, "abc");
    }

    #[test]
    fn double_hyphen_inside_comment_is_rejected() {
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        let err = tok.feed("<!--a--b-->", &mut out);
        assert!(err.is_err());
    }

    #[test]
    fn doctype_with_internal_subset() {
        assert_eq!(
            kinds("<!DOCTYPE r [<!ELEMENT r EMPTY>]>"),
            vec![
                LtBangDoctype, S, Name, S, LBracket, DtdMarkupDeclStart, S, DtdDeclBody, RBracket, Gt
            ]
        );
    }

    #[test]
    fn conditional_section_nested() {
        let toks = kinds("<!DOCTYPE r [<![IGNORE[<![IGNORE[x]]>]]>]>");
        assert!(toks.contains(&CondSectStart));
        assert!(toks.contains(&CDataText));
    }
}
