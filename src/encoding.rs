//! Charset detection and decoding (§3 "Charset", §4.1 BOM sniffing).
//!
//! Grounded on `parser/bom.rs` (BOM sniffing state machine) and `encoding.rs`
//! (`Decoder` wrapping `encoding_rs`) of the teacher crate. `encoding_rs` is
//! the teacher's own choice for non-UTF-8 charset support (its `encoding`
//! feature), kept here as an always-on dependency because the spec requires
//! at least UTF-8, UTF-16LE/BE, ISO-8859-1 and US-ASCII out of the box.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// Byte order marks recognized during BOM sniffing.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
pub const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
pub const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Outcome of sniffing a BOM out of the first bytes of an entity.
#[derive(Debug, PartialEq, Eq)]
pub enum BomSniff {
    /// Not enough bytes yet to decide.
    NeedData,
    /// A BOM of the given charset was found; `consumed` bytes should be
    /// dropped before decoding continues.
    Found { charset: Charset, consumed: usize },
    /// No BOM matched; proceed with the caller-supplied initial charset.
    None,
}

/// Inspects up to the first 3 bytes of an entity for a byte-order mark.
pub fn sniff_bom(bytes: &[u8]) -> BomSniff {
    if bytes.starts_with(UTF16_BE_BOM) {
        return BomSniff::Found { charset: Charset::utf16be(), consumed: 2 };
    }
    if bytes.starts_with(UTF16_LE_BOM) {
        return BomSniff::Found { charset: Charset::utf16le(), consumed: 2 };
    }
    if bytes.starts_with(UTF8_BOM) {
        return BomSniff::Found { charset: Charset::utf8(), consumed: 3 };
    }
    // A prefix of the UTF-8 BOM: wait for more data before giving up.
    if !bytes.is_empty() && UTF8_BOM.starts_with(bytes) {
        return BomSniff::NeedData;
    }
    // `FF` or `FE` alone could still grow into a UTF-16 BOM.
    if bytes.len() == 1 && (bytes[0] == 0xFF || bytes[0] == 0xFE) {
        return BomSniff::NeedData;
    }
    BomSniff::None
}

/// Outcome of feeding bytes into a [`Charset`] decoder (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// `consumed` bytes were turned into `text`.
    Ok { consumed: usize, text: String },
    /// The trailing bytes are an incomplete multi-byte sequence; not an
    /// error. Retry once more bytes have arrived.
    Underflow,
    /// The bytes are not valid in this charset.
    Malformed,
    /// The bytes are valid but denote a code point this charset cannot map
    /// (only possible for non-Unicode charsets; `encoding_rs` targets are
    /// all Unicode-mapped, so this is unreachable for the charsets this
    /// crate ships, but is kept distinct per §3 to match the host contract).
    Unmappable,
}

/// A named charset plus the decoder state needed to consume bytes from it.
///
/// `encoding_rs::Decoder` already tracks mid-sequence state across calls, so
/// this wraps it directly rather than re-implementing incremental decoding.
pub struct Charset {
    label: &'static str,
    inner: encoding_rs::Decoder,
}

impl std::fmt::Debug for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Charset").field("label", &self.label).finish()
    }
}

impl Charset {
    fn from_encoding(encoding: &'static Encoding) -> Self {
        Charset { label: encoding.name(), inner: encoding.new_decoder_without_bom_handling() }
    }

    pub fn utf8() -> Self {
        Self::from_encoding(UTF_8)
    }

    pub fn utf16le() -> Self {
        Self::from_encoding(UTF_16LE)
    }

    pub fn utf16be() -> Self {
        Self::from_encoding(UTF_16BE)
    }

    /// Looks up a charset by the label found in an XML/text declaration
    /// (case-insensitive, per the IANA charset registry convention that
    /// `encoding_rs` already follows).
    pub fn by_label(label: &str) -> Option<Self> {
        let encoding = Encoding::for_label(label.as_bytes())?;
        // UTF-16 without an explicit endianness in the label defaults to the
        // platform the BOM already established; callers always look this up
        // only to *confirm* a charset already chosen by BOM sniffing in that
        // case, so a plain "UTF-16" label resolving to UTF-16LE here is a
        // reasonable default when there was no earlier BOM.
        Some(Self::from_encoding(encoding))
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_utf8_compatible(&self) -> bool {
        self.label.eq_ignore_ascii_case("UTF-8")
    }

    /// Decodes as much of `bytes` as forms complete characters. Never
    /// consumes a trailing incomplete multi-byte sequence (§3: "Underflow
    /// ... is never an error").
    pub fn decode(&mut self, bytes: &[u8]) -> DecodeOutcome {
        if bytes.is_empty() {
            return DecodeOutcome::Ok { consumed: 0, text: String::new() };
        }
        let mut text = String::with_capacity(bytes.len());
        let (result, consumed) =
            self.inner.decode_to_string_without_replacement(bytes, &mut text, false);
        use encoding_rs::DecoderResult;
        match result {
            DecoderResult::InputEmpty => DecodeOutcome::Ok { consumed, text },
            DecoderResult::OutputFull => DecodeOutcome::Ok { consumed, text },
            DecoderResult::Malformed(_, _) => {
                if consumed == 0 && text.is_empty() {
                    // Nothing usable was produced before the malformed byte:
                    // could still be a legitimate underflow at chunk end for
                    // some multi-byte encodings, but `encoding_rs` already
                    // reports that case as `InputEmpty`, so a `Malformed`
                    // result here always denotes a real encoding error.
                    DecodeOutcome::Malformed
                } else {
                    DecodeOutcome::Ok { consumed, text }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sniff_utf8_bom() {
        assert_eq!(
            sniff_bom(&[0xEF, 0xBB, 0xBF, b'<']),
            BomSniff::Found { charset: Charset::utf8(), consumed: 3 }
        );
    }

    #[test]
    fn sniff_needs_more_data_for_ambiguous_prefix() {
        assert_eq!(sniff_bom(&[0xEF]), BomSniff::NeedData);
        assert_eq!(sniff_bom(&[0xFF]), BomSniff::NeedData);
    }

    #[test]
    fn sniff_no_bom() {
        assert_eq!(sniff_bom(b"<?xml"), BomSniff::None);
    }

    #[test]
    fn decode_split_multibyte_char_underflows_without_error() {
        let mut cs = Charset::utf8();
        // '€' = E2 82 AC, fed one byte short.
        match cs.decode(&[0xE2, 0x82]) {
            DecodeOutcome::Ok { consumed, text } => {
                assert_eq!(consumed, 0);
                assert!(text.is_empty());
            }
            other => panic!("expected Ok(0, \"\"), got {other:?}"),
        }
    }
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.label.eq_ignore_ascii_case(other.label)
    }
}
impl Eq for Charset {}
