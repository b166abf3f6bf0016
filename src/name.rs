//! Qualified names and namespace resolution (§3 "QName", "NamespaceScope";
//! §4.3 namespace resolution invariants).
//!
//! Grounded on `name.rs` of the teacher crate (`NamespaceResolver`, a stack of
//! bindings tagged with the nesting level at which they were declared, popped
//! in bulk on `end_element`). The teacher indexes into a shared byte buffer;
//! here bindings own their `String`s instead, because a push parser must keep
//! namespace URIs alive past the chunk whose bytes produced them (the byte
//! buffer they came from is compacted away as soon as the owning `receive`
//! call returns).

/// The canonical namespace URI bound to the `xml` prefix (§3).
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";
/// The URI reserved for `xmlns` declarations themselves.
pub const XMLNS_NS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// A resolved qualified name: namespace URI (if any), local name, and the
/// original qualified-name text as it appeared in the document (preserved
/// for reporting even though SAX equality is by URI+local only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub uri: Option<String>,
    pub local: String,
    pub qname: String,
}

impl QName {
    pub fn unqualified(qname: &str) -> Self {
        QName { uri: None, local: qname.to_string(), qname: qname.to_string() }
    }

    /// Splits `prefix:local` into its parts; returns `(None, qname)` for an
    /// unprefixed name.
    pub fn split_prefix(qname: &str) -> (Option<&str>, &str) {
        match qname.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() => (Some(prefix), local),
            _ => (None, qname),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    prefix: String,
    uri: Option<String>,
    /// Nesting level (number of currently-open elements, the declaring
    /// element included) at which this binding was pushed.
    level: u32,
}

/// A stack of `prefix -> URI` bindings, scoped to element nesting (§3
/// "NamespaceScope", §9 "Namespace stack with scoped pop").
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    bindings: Vec<Binding>,
    level: u32,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        NamespaceResolver { bindings: Vec::new(), level: 0 }
    }

    /// Begins a new element scope. Returns the length `bindings` had before
    /// this element's own declarations are pushed with [`Self::declare`], so
    /// [`Self::end_element`] knows how much to retain for the shadow case
    /// (kept for symmetry with the teacher's level-based pop; unused because
    /// this crate pops by level, but documents the scope boundary).
    pub fn start_element(&mut self) -> u32 {
        self.level += 1;
        self.level
    }

    /// Declares `xmlns[:prefix]="uri"` for the currently open element.
    /// An empty `uri` with a non-empty `prefix` undeclares that prefix for
    /// XML 1.1 documents (§4.3); callers are responsible for rejecting that
    /// combination under XML 1.0 before calling this.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        self.bindings.push(Binding {
            prefix: prefix.to_string(),
            uri: if uri.is_empty() { None } else { Some(uri.to_string()) },
            level: self.level,
        });
    }

    /// Pops every binding declared at the current (deepest) level, returning
    /// them in declaration order so the caller can emit matching
    /// `end_prefix_mapping` events in reverse.
    pub fn end_element(&mut self) -> Vec<String> {
        let level = self.level;
        let mut ended = Vec::new();
        while matches!(self.bindings.last(), Some(b) if b.level == level) {
            ended.push(self.bindings.pop().unwrap().prefix);
        }
        self.level = self.level.saturating_sub(1);
        ended
    }

    /// Resolves a prefix to its currently bound URI, walking from the most
    /// recently declared binding. `xml` and `xmlns` are always resolvable.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS_URI);
        }
        if prefix == "xmlns" {
            return Some(XMLNS_NS_URI);
        }
        self.bindings.iter().rev().find(|b| b.prefix == prefix).and_then(|b| b.uri.as_deref())
    }

    /// Resolves a (possibly prefixed) qualified name into a [`QName`].
    /// `use_default` controls whether an unprefixed name inherits the
    /// current default namespace (true for elements, false for attributes,
    /// per §4.3).
    pub fn resolve(&self, qname: &str, use_default: bool) -> Result<QName, String> {
        let (prefix, local) = QName::split_prefix(qname);
        match prefix {
            Some(p) => match self.resolve_prefix(p) {
                Some(uri) => {
                    Ok(QName { uri: Some(uri.to_string()), local: local.to_string(), qname: qname.to_string() })
                }
                None => Err(p.to_string()),
            },
            None => {
                let uri = if use_default { self.resolve_prefix("") } else { None };
                Ok(QName {
                    uri: uri.map(str::to_string),
                    local: qname.to_string(),
                    qname: qname.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_namespace_applies_to_elements_only() {
        let mut ns = NamespaceResolver::new();
        ns.start_element();
        ns.declare("", "urn:u");
        let elem = ns.resolve("e", true).unwrap();
        assert_eq!(elem.uri.as_deref(), Some("urn:u"));

        let attr = ns.resolve("a", false).unwrap();
        assert_eq!(attr.uri, None);
    }

    #[test]
    fn redeclaration_shadows_then_restores() {
        let mut ns = NamespaceResolver::new();
        ns.start_element(); // <a>
        ns.declare("p", "u1");
        ns.start_element(); // <b>
        ns.declare("p", "u2");
        assert_eq!(ns.resolve_prefix("p"), Some("u2"));
        ns.end_element(); // </b>
        assert_eq!(ns.resolve_prefix("p"), Some("u1"));
        ns.end_element(); // </a>
        assert_eq!(ns.resolve_prefix("p"), None);
    }

    #[test]
    fn xml_prefix_always_bound() {
        let ns = NamespaceResolver::new();
        assert_eq!(ns.resolve_prefix("xml"), Some(XML_NS_URI));
    }

    #[test]
    fn unbound_prefix_is_an_error() {
        let ns = NamespaceResolver::new();
        assert!(ns.resolve("p:e", true).is_err());
    }
}
