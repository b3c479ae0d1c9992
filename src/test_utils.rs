//! Shared test scaffolding: an arena plus id generator bundled together
//! so unit tests across modules can build small artifact trees without
//! repeating boilerplate.

#![cfg(test)]

use typed_arena::Arena;

use crate::artifact::{Artifact, IdGen, Revision, Kind};

pub struct ArenaCtx<'a> {
    pub arena: Arena<Artifact<'a>>,
    pub id_gen: IdGen,
}

impl<'a> ArenaCtx<'a> {
    pub fn new() -> Self {
        Self { arena: Arena::new(), id_gen: IdGen::new() }
    }

    pub fn leaf(&'a self, revision: Revision, kind: Kind, payload: &'a str) -> &'a Artifact<'a> {
        Artifact::new(&self.arena, &self.id_gen, revision, kind, Vec::new(), Some(payload), false)
    }

    pub fn node(
        &'a self,
        revision: Revision,
        kind: Kind,
        children: Vec<&'a Artifact<'a>>,
        unordered: bool,
    ) -> &'a Artifact<'a> {
        Artifact::new(&self.arena, &self.id_gen, revision, kind, children, None, unordered)
    }
}
