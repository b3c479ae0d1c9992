//! A scored correspondence between two artifact trees (spec §3, §4.3,
//! §4.4): collections of [`MatchEdge`]s form a [`Matching`], indexed
//! both ways for O(1) lookup from either side.

use rustc_hash::FxHashMap;

use crate::artifact::Artifact;

/// Where a particular edge came from, kept purely for diagnostic
/// output (spec §3: "a *color* used only for diagnostic output").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchColor {
    /// Produced by the ordered (sequence) matcher.
    Ordered,
    /// Produced by the unordered (bipartite) matcher.
    Unordered,
    /// Produced by the optional cost-model matcher.
    CostModel,
    /// Derived by composing two other matchings (e.g. LEFT↔RIGHT
    /// inferred from BASE↔LEFT and BASE↔RIGHT).
    Composed,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchEdge<'a> {
    pub left: &'a Artifact<'a>,
    pub right: &'a Artifact<'a>,
    pub score: i64,
    pub color: MatchColor,
}

/// A one-to-one relation between nodes of two trees, indexed in both
/// directions by artifact id.
#[derive(Debug, Default, Clone)]
pub struct Matching<'a> {
    left_to_right: FxHashMap<usize, MatchEdge<'a>>,
    right_to_left: FxHashMap<usize, MatchEdge<'a>>,
}

impl<'a> Matching<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    pub fn get_from_left(&self, left: &Artifact<'_>) -> Option<&MatchEdge<'a>> {
        self.left_to_right.get(&left.id)
    }

    pub fn get_from_right(&self, right: &Artifact<'_>) -> Option<&MatchEdge<'a>> {
        self.right_to_left.get(&right.id)
    }

    pub fn are_matched(&self, left: &Artifact<'_>, right: &Artifact<'_>) -> bool {
        self.get_from_left(left).is_some_and(|edge| edge.right.id == right.id)
    }

    /// Whether adding `(left, right)` would keep the matching a valid
    /// one-to-one relation (spec §4.3 at-most-one condition).
    pub fn can_be_matched(&self, left: &Artifact<'_>, right: &Artifact<'_>) -> bool {
        !self.left_to_right.contains_key(&left.id) && !self.right_to_left.contains_key(&right.id)
    }

    pub fn add(&mut self, left: &'a Artifact<'a>, right: &'a Artifact<'a>, score: i64, color: MatchColor) {
        let edge = MatchEdge { left, right, score, color };
        self.left_to_right.insert(left.id, edge);
        self.right_to_left.insert(right.id, edge);
    }

    pub fn add_edge(&mut self, edge: MatchEdge<'a>) {
        self.left_to_right.insert(edge.left.id, edge);
        self.right_to_left.insert(edge.right.id, edge);
    }

    pub fn extend(&mut self, other: &Matching<'a>) {
        for edge in other.left_to_right.values() {
            self.add_edge(*edge);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEdge<'a>> {
        self.left_to_right.values()
    }

    /// Commit every pair in this matching to the artifacts themselves
    /// via [`Artifact::set_match`], making the correspondence queryable
    /// directly from either node (spec §4.1 `set_match`/`get_match`).
    pub fn commit(&self) {
        for edge in self.left_to_right.values() {
            edge.left.set_match(edge.right);
        }
    }

    /// Compose two matchings sharing a common middle tree: if `self`
    /// maps BASE→LEFT and `other` maps BASE→RIGHT, the result
    /// approximates LEFT→RIGHT, used to seed the unordered/ordered
    /// matcher for left_right comparisons (mirrors `mergiraf`'s
    /// `Matching::compose`).
    pub fn compose_through_common(&self, other: &Matching<'a>) -> Matching<'a> {
        let mut result = Matching::new();
        for edge in self.left_to_right.values() {
            if let Some(base_to_right) = other.get_from_left(edge.left) {
                result.add(edge.right, base_to_right.right, edge.score, MatchColor::Composed);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Kind, Revision};
    use crate::test_utils::ArenaCtx;

    #[test]
    fn add_and_lookup() {
        let ctx = ArenaCtx::new();
        let l = ctx.leaf(Revision::Left, Kind("stmt"), "x");
        let r = ctx.leaf(Revision::Right, Kind("stmt"), "x");
        let mut m = Matching::new();
        assert!(m.can_be_matched(l, r));
        m.add(l, r, 1, MatchColor::Ordered);
        assert!(m.are_matched(l, r));
        assert!(!m.can_be_matched(l, r));
        assert_eq!(m.len(), 1);
    }
}
