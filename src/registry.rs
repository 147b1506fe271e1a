//! Identifier registry: entity name → graph identifier, per session.
//!
//! Identifiers are IRIs in the scene namespace with local name
//! `{name}_{session_tag}_{counter}`. The counter is drawn from a per-session
//! monotonically increasing sequence, so two mints never share a final
//! segment and distinct names can never collide within a session. The random
//! session tag keeps identifiers from different sessions apart in practice.

use std::collections::HashMap;

use oxigraph::model::NamedNode;

use crate::error::StatementError;
use crate::vocab::Namespace;

/// Result of [`IdentifierRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub iri: NamedNode,
    /// Whether this call minted the identifier.
    pub created: bool,
}

/// Session-scoped name → identifier map.
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    namespace: Namespace,
    session_tag: String,
    next: u64,
    entries: HashMap<String, NamedNode>,
}

impl IdentifierRegistry {
    /// Create an empty registry with a random session tag.
    pub fn new(namespace: Namespace) -> Self {
        let tag = rand::random::<u32>() & 0x00ff_ffff;
        Self::with_session_tag(namespace, format!("{tag:06x}"))
    }

    /// Create an empty registry with a fixed session tag.
    pub fn with_session_tag(namespace: Namespace, session_tag: impl Into<String>) -> Self {
        Self {
            namespace,
            session_tag: session_tag.into(),
            next: 1,
            entries: HashMap::new(),
        }
    }

    pub fn session_tag(&self) -> &str {
        &self.session_tag
    }

    /// Draw the next disambiguator.
    pub fn disambiguator(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// Build the identifier for `name` with a given disambiguator.
    pub fn identifier(&self, name: &str, disambiguator: u64) -> Result<NamedNode, StatementError> {
        self.namespace
            .iri(&format!("{name}_{}_{disambiguator}", self.session_tag))
    }

    /// Mint a fresh identifier for `name` without recording it.
    pub fn mint(&mut self, name: &str) -> Result<NamedNode, StatementError> {
        let n = self.disambiguator();
        self.identifier(name, n)
    }

    /// Return the identifier recorded for `name`, minting and recording one
    /// on first use.
    pub fn resolve(&mut self, name: &str) -> Result<Resolved, StatementError> {
        if let Some(iri) = self.entries.get(name) {
            return Ok(Resolved {
                iri: iri.clone(),
                created: false,
            });
        }
        let iri = self.mint(name)?;
        self.entries.insert(name.to_string(), iri.clone());
        Ok(Resolved { iri, created: true })
    }

    /// Look up a recorded identifier.
    pub fn get(&self, name: &str) -> Option<&NamedNode> {
        self.entries.get(name)
    }

    /// Number of recorded names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::DEFAULT_NAMESPACE;

    fn registry() -> IdentifierRegistry {
        IdentifierRegistry::with_session_tag(Namespace::default(), "abc123")
    }

    #[test]
    fn resolve_is_stable() {
        let mut reg = registry();
        let first = reg.resolve("Bicycle1").unwrap();
        let second = reg.resolve("Bicycle1").unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.iri, second.iri);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_names_get_distinct_identifiers() {
        let mut reg = registry();
        let a = reg.resolve("Bicycle1").unwrap().iri;
        let b = reg.resolve("Bicycle2").unwrap().iri;
        assert_ne!(a, b);
    }

    #[test]
    fn suffix_concatenation_cannot_collide() {
        // "Bicycle1" + counter 1 and "Bicycle" + counter 11 would collide
        // without the separators.
        let mut reg = registry();
        let mut seen = std::collections::HashSet::new();
        assert!(seen.insert(reg.resolve("Bicycle1").unwrap().iri));
        for _ in 0..20 {
            assert!(seen.insert(reg.mint("Bicycle").unwrap()));
        }
    }

    #[test]
    fn identifier_shape() {
        let mut reg = registry();
        let iri = reg.resolve("Car1").unwrap().iri;
        assert_eq!(iri.as_str(), format!("{DEFAULT_NAMESPACE}Car1_abc123_1"));
        assert_eq!(reg.get("Car1"), Some(&iri));
        assert_eq!(reg.get("Car2"), None);
    }

    #[test]
    fn mint_is_never_recorded() {
        let mut reg = registry();
        let a = reg.mint("Scene").unwrap();
        let b = reg.mint("Scene").unwrap();
        assert_ne!(a, b);
        assert!(reg.is_empty());
    }

    #[test]
    fn random_session_tags_are_hex() {
        let reg = IdentifierRegistry::new(Namespace::default());
        assert_eq!(reg.session_tag().len(), 6);
        assert!(reg.session_tag().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
