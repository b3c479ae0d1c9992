//! [`MergeScenario`]: a mapping from revision name to its root artifact
//! (spec §3). Immutable after construction.

use crate::artifact::{Artifact, Revision};

#[derive(Debug, Clone)]
pub struct MergeScenario<'a> {
    revisions: Vec<(Revision, &'a Artifact<'a>)>,
}

impl<'a> MergeScenario<'a> {
    /// Arity 2 or 3 for ordinary merges, >= 2 for n-way (spec §3).
    pub fn new(revisions: Vec<(Revision, &'a Artifact<'a>)>) -> Self {
        assert!(revisions.len() >= 2, "a merge scenario needs at least two revisions");
        Self { revisions }
    }

    pub fn three_way(
        base: &'a Artifact<'a>,
        left: &'a Artifact<'a>,
        right: &'a Artifact<'a>,
    ) -> Self {
        Self::new(vec![
            (Revision::Base, base),
            (Revision::Left, left),
            (Revision::Right, right),
        ])
    }

    pub fn arity(&self) -> usize {
        self.revisions.len()
    }

    pub fn get(&self, revision: Revision) -> Option<&'a Artifact<'a>> {
        self.revisions
            .iter()
            .find(|(rev, _)| *rev == revision)
            .map(|(_, art)| *art)
    }

    pub fn base(&self) -> Option<&'a Artifact<'a>> {
        self.get(Revision::Base)
    }

    pub fn left(&self) -> Option<&'a Artifact<'a>> {
        self.get(Revision::Left)
    }

    pub fn right(&self) -> Option<&'a Artifact<'a>> {
        self.get(Revision::Right)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Revision, &'a Artifact<'a>)> + '_ {
        self.revisions.iter().copied()
    }

    /// Ordered list of non-BASE revisions, used by the n-way driver
    /// (spec §4.7) when folding revisions one at a time.
    pub fn variants(&self) -> Vec<(Revision, &'a Artifact<'a>)> {
        self.revisions
            .iter()
            .filter(|(rev, _)| *rev != Revision::Base)
            .copied()
            .collect()
    }
}
