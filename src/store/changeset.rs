//! Buffered graph changes.
//!
//! Scene assembly never writes to the store directly. Additions accumulate in
//! a [`ChangeSet`] (viewed together with the store through [`StagedGraph`]) and
//! are committed in one step once the whole scene has been built, so a failure
//! halfway through leaves the store untouched.

use std::collections::HashSet;

use crate::error::StoreResult;

use super::{Triple, TripleStore};

/// Ordered, de-duplicated set of pending triple additions.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    added: Vec<Triple>,
    index: HashSet<Triple>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the triple is pending.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.index.contains(triple)
    }

    /// Queue a triple. Returns `false` if it was already queued.
    pub fn push(&mut self, triple: Triple) -> bool {
        if !self.index.insert(triple.clone()) {
            return false;
        }
        self.added.push(triple);
        true
    }

    /// Pending triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.added.iter()
    }

    pub fn len(&self) -> usize {
        self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }

    /// Write every pending triple to the store.
    ///
    /// If an insertion fails, the triples inserted so far are removed again
    /// before the error is returned.
    pub fn commit<S: TripleStore + ?Sized>(self, store: &mut S) -> StoreResult<Commit> {
        let mut inserted = Vec::with_capacity(self.added.len());
        for triple in self.added {
            match store.add_triple(&triple) {
                Ok(true) => inserted.push(triple),
                Ok(false) => {}
                Err(e) => {
                    Commit { inserted }.rollback(store)?;
                    return Err(e);
                }
            }
        }
        tracing::debug!(inserted = inserted.len(), "committed change set");
        Ok(Commit { inserted })
    }
}

/// Triples actually inserted by a [`ChangeSet::commit`].
#[derive(Debug, Clone, Default)]
pub struct Commit {
    inserted: Vec<Triple>,
}

impl Commit {
    pub fn len(&self) -> usize {
        self.inserted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.inserted
    }

    /// Remove the committed triples from the store again.
    pub fn rollback<S: TripleStore + ?Sized>(self, store: &mut S) -> StoreResult<()> {
        for triple in self.inserted.iter().rev() {
            store.remove_triple(triple)?;
        }
        tracing::debug!(removed = self.inserted.len(), "rolled back change set");
        Ok(())
    }
}

/// A read-only store with pending additions layered on top.
pub struct StagedGraph<'a, S: TripleStore + ?Sized> {
    store: &'a S,
    changes: ChangeSet,
}

impl<'a, S: TripleStore + ?Sized> StagedGraph<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            changes: ChangeSet::new(),
        }
    }

    /// Whether the triple is in the store or pending.
    pub fn contains(&self, triple: &Triple) -> StoreResult<bool> {
        if self.changes.contains(triple) {
            return Ok(true);
        }
        self.store.has_triple(triple)
    }

    /// Stage a triple unless it is already present. Returns `true` if staged.
    pub fn add(&mut self, triple: Triple) -> StoreResult<bool> {
        if self.contains(&triple)? {
            return Ok(false);
        }
        Ok(self.changes.push(triple))
    }

    /// Pending additions so far.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }
}
