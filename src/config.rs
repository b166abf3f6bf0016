//! Parser configuration (SPEC_FULL.md "Ambient addition — Config").
//!
//! Grounded on the `Parser`/`Reader` builder-setter pattern of the teacher
//! crate (`reader/parser.rs`, `reader.rs`): a plain struct of flags with
//! sane defaults, mutated through chainable `&mut self -> &mut Self`
//! setters rather than a separate builder type.

/// User-settable options that affect how a [`crate::parser::Parser`]
/// behaves, independent of the document being parsed.
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// Trims whitespace-only text outside element-only content instead of
    /// reporting it as `characters`.
    pub(crate) trim_text: bool,
    /// Charset assumed when no BOM is present and no XML/text declaration
    /// specifies one.
    pub(crate) initial_charset: Option<&'static str>,
    /// Upper bound on parameter- and general-entity expansion depth, guarding
    /// against entity-expansion ("billion laughs") attacks.
    pub(crate) max_entity_expansion_depth: usize,
    /// Whether a `<!DOCTYPE` construct is parsed at all; when `false` it is
    /// skipped as opaque markup and no `DtdHandler` callbacks fire.
    pub(crate) enable_dtd: bool,
    /// Whether self-closing elements are reported as a single `Empty`-style
    /// pair or synthesized as separate start/end events by consumers that
    /// ask for it (used by [`crate::writer::Writer`], not the parser itself).
    pub(crate) expand_empty_elements: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            trim_text: false,
            initial_charset: None,
            max_entity_expansion_depth: 20,
            enable_dtd: true,
            expand_empty_elements: false,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes whether whitespace-only text outside element-only content is
    /// dropped instead of reported.
    pub fn trim_text(&mut self, val: bool) -> &mut Self {
        self.trim_text = val;
        self
    }

    /// Sets the charset assumed in the absence of a BOM or declared
    /// `encoding`. Defaults to UTF-8.
    pub fn initial_charset(&mut self, label: &'static str) -> &mut Self {
        self.initial_charset = Some(label);
        self
    }

    /// Bounds how deeply parameter and general entities may nest.
    pub fn max_entity_expansion_depth(&mut self, depth: usize) -> &mut Self {
        self.max_entity_expansion_depth = depth;
        self
    }

    /// Enables or disables DTD parsing entirely.
    pub fn enable_dtd(&mut self, val: bool) -> &mut Self {
        self.enable_dtd = val;
        self
    }

    /// Changes whether a [`crate::writer::Writer`] serializes an empty
    /// element as `<a/>` (false, default) or `<a></a>` (true).
    pub fn expand_empty_elements(&mut self, val: bool) -> &mut Self {
        self.expand_empty_elements = val;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ParserConfig::default();
        assert!(!config.trim_text);
        assert!(config.enable_dtd);
        assert_eq!(config.max_entity_expansion_depth, 20);
    }

    #[test]
    fn setters_chain_and_mutate() {
        let mut config = ParserConfig::new();
        config.trim_text(true).enable_dtd(false).max_entity_expansion_depth(4);
        assert!(config.trim_text);
        assert!(!config.enable_dtd);
        assert_eq!(config.max_entity_expansion_depth, 4);
    }
}
