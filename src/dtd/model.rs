//! The in-memory DTD model (§4.4 "DTD model"): element, attribute-list,
//! entity, and notation declarations, referenced later by the content
//! parser for attribute defaulting, attribute type reporting, and the
//! element-only/mixed content-model distinction that drives
//! `characters` vs `ignorable_whitespace` dispatch.
//!
//! Content models are parsed into a small tree (§4.4: "Stored as a tree for
//! later content-model enforcement; enforcement itself may be out of scope
//! for the core") -- this crate only ever reads `is_element_only` off the
//! tree, it does not validate document structure against it.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    fn from_suffix(text: &str) -> (Occurrence, &str) {
        if let Some(rest) = text.strip_suffix('?') {
            (Occurrence::Optional, rest)
        } else if let Some(rest) = text.strip_suffix('*') {
            (Occurrence::ZeroOrMore, rest)
        } else if let Some(rest) = text.strip_suffix('+') {
            (Occurrence::OneOrMore, rest)
        } else {
            (Occurrence::One, text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Particle {
    Name(String, Occurrence),
    Seq(Vec<Particle>, Occurrence),
    Choice(Vec<Particle>, Occurrence),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModel {
    Empty,
    Any,
    /// `(#PCDATA)` or `(#PCDATA | a | b)*`; the names are the allowed child
    /// elements interspersed with text.
    Mixed(Vec<String>),
    Children(Particle),
}

impl ContentModel {
    /// Whether whitespace directly inside an element with this content
    /// model is reported as `ignorable_whitespace` rather than `characters`
    /// (§4.3 "Content-model dispatch"). `EMPTY` elements have no children to
    /// separate, but are included for completeness; only `Children` models
    /// actually exclude character data.
    pub fn is_element_only(&self) -> bool {
        matches!(self, ContentModel::Children(_) | ContentModel::Empty)
    }

    /// Renders the model back to its declaration text, used for the
    /// `element_decl` event's `content_model` string (§6.2).
    pub fn to_decl_string(&self) -> String {
        match self {
            ContentModel::Empty => "EMPTY".to_string(),
            ContentModel::Any => "ANY".to_string(),
            ContentModel::Mixed(names) if names.is_empty() => "(#PCDATA)".to_string(),
            ContentModel::Mixed(names) => format!("(#PCDATA|{})*", names.join("|")),
            ContentModel::Children(p) => particle_to_string(p),
        }
    }
}

fn particle_to_string(p: &Particle) -> String {
    fn suffix(o: Occurrence) -> &'static str {
        match o {
            Occurrence::One => "",
            Occurrence::Optional => "?",
            Occurrence::ZeroOrMore => "*",
            Occurrence::OneOrMore => "+",
        }
    }
    match p {
        Particle::Name(n, o) => format!("{n}{}", suffix(*o)),
        Particle::Seq(items, o) => {
            let inner = items.iter().map(particle_to_string).collect::<Vec<_>>().join(",");
            format!("({inner}){}", suffix(*o))
        }
        Particle::Choice(items, o) => {
            let inner = items.iter().map(particle_to_string).collect::<Vec<_>>().join("|");
            format!("({inner}){}", suffix(*o))
        }
    }
}

/// Parses an `<!ELEMENT>` content-spec (the text after the element name).
/// Best-effort: malformed input degrades to a single opaque `Children` name
/// particle rather than erroring, since the core never enforces content
/// models against the document (§4.4 "out of scope for the core").
pub fn parse_content_spec(text: &str) -> ContentModel {
    let text = text.trim();
    if text == "EMPTY" {
        return ContentModel::Empty;
    }
    if text == "ANY" {
        return ContentModel::Any;
    }
    if let Some(inner) = text.strip_prefix('(') {
        if inner.trim_start().starts_with("#PCDATA") {
            let close = inner.rfind(')').unwrap_or(inner.len());
            let body = &inner[..close];
            let names: Vec<String> = body
                .split('|')
                .skip(1)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            return ContentModel::Mixed(names);
        }
    }
    match parse_particle(text) {
        Some(p) => ContentModel::Children(p),
        None => ContentModel::Children(Particle::Name(text.to_string(), Occurrence::One)),
    }
}

fn parse_particle(text: &str) -> Option<Particle> {
    let text = text.trim();
    let (occ, body) = Occurrence::from_suffix(text);
    let body = body.trim();
    if let Some(inner) = body.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        let depth_split = |sep: char| -> Option<Vec<&str>> {
            let mut parts = Vec::new();
            let mut depth = 0i32;
            let mut start = 0usize;
            let bytes = inner.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                match b {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    b if b as char == sep && depth == 0 => {
                        parts.push(&inner[start..i]);
                        start = i + 1;
                    }
                    _ => {}
                }
            }
            parts.push(&inner[start..]);
            if parts.len() > 1 {
                Some(parts)
            } else {
                None
            }
        };
        if let Some(parts) = depth_split('|') {
            let items = parts.iter().map(|p| parse_particle(p)).collect::<Option<Vec<_>>>()?;
            return Some(Particle::Choice(items, occ));
        }
        if let Some(parts) = depth_split(',') {
            let items = parts.iter().map(|p| parse_particle(p)).collect::<Option<Vec<_>>>()?;
            return Some(Particle::Seq(items, occ));
        }
        return parse_particle(inner);
    }
    if body.is_empty() {
        return None;
    }
    Some(Particle::Name(body.to_string(), occ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultMode {
    Required,
    Implied,
    Fixed,
    /// A plain default literal with no `#REQUIRED`/`#IMPLIED`/`#FIXED` marker.
    Default,
}

impl DefaultMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DefaultMode::Required => "#REQUIRED",
            DefaultMode::Implied => "#IMPLIED",
            DefaultMode::Fixed => "#FIXED",
            DefaultMode::Default => "#DEFAULT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub attr_type: crate::attribute::AttributeType,
    pub default_mode: DefaultMode,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntityDecl {
    pub value: EntityValue,
}

#[derive(Debug, Clone)]
pub enum EntityValue {
    Internal(String),
    External { public_id: Option<String>, system_id: String, notation: Option<String> },
}

#[derive(Debug, Clone)]
pub struct NotationDecl {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// The accumulated model built by [`crate::dtd::DtdParser`] (§4.4).
#[derive(Debug, Default)]
pub struct DtdModel {
    pub elements: HashMap<String, ContentModel>,
    pub attlists: HashMap<String, HashMap<String, AttributeDecl>>,
    pub general_entities: HashMap<String, EntityDecl>,
    pub parameter_entities: HashMap<String, String>,
    pub notations: HashMap<String, NotationDecl>,
}

impl DtdModel {
    pub fn new() -> Self {
        DtdModel::default()
    }

    pub fn is_element_only(&self, element: &str) -> bool {
        self.elements.get(element).map(ContentModel::is_element_only).unwrap_or(false)
    }

    pub fn attribute_decl(&self, element: &str, attribute: &str) -> Option<&AttributeDecl> {
        self.attlists.get(element).and_then(|m| m.get(attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_empty_and_any() {
        assert_eq!(parse_content_spec("EMPTY"), ContentModel::Empty);
        assert_eq!(parse_content_spec("ANY"), ContentModel::Any);
    }

    #[test]
    fn parses_mixed_content() {
        let m = parse_content_spec("(#PCDATA|a|b)*");
        assert_eq!(m, ContentModel::Mixed(vec!["a".to_string(), "b".to_string()]));
        assert!(!m.is_element_only());
    }

    #[test]
    fn parses_children_model_and_reports_element_only() {
        let m = parse_content_spec("(a,b+,(c|d)?)");
        assert!(m.is_element_only());
        assert_eq!(m.to_decl_string(), "(a,b+,(c|d)?)");
    }
}
