//! The artifact model: a generic, revision-tagged tree with stable
//! identity and ownership semantics (spec §3, §4.1).
//!
//! An [`Artifact`] plays the role that `mergiraf`'s `AstNode` plays for
//! tree-sitter syntax trees, but it is not tied to any particular
//! parser: its `kind` is an opaque tag declared by whichever parser
//! collaborator produced the tree (see [`crate::parser`]).

use std::{
    cell::{Cell, UnsafeCell},
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use rustc_hash::FxHashMap;
use typed_arena::Arena;

use crate::fxhasher;

/// Which version of the artifact tree a node belongs to.
///
/// `Numbered` is used by the n-way/variant driver (spec §4.7) when no
/// explicit BASE/LEFT/RIGHT role applies to a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    Base,
    Left,
    Right,
    Merge,
    Numbered(u32),
}

impl Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Base => write!(f, "BASE"),
            Revision::Left => write!(f, "LEFT"),
            Revision::Right => write!(f, "RIGHT"),
            Revision::Merge => write!(f, "MERGE"),
            Revision::Numbered(n) => write!(f, "v{n}"),
        }
    }
}

/// The semantic role of a node, as declared by the parser collaborator.
///
/// This is a tagged variant rather than a type hierarchy, per the
/// "runtime polymorphism across kinds" design note (spec §9): strategies
/// and capabilities (is this kind's children order-significant? is it a
/// method-scoped kind for conditional-merge purposes?) are looked up by
/// name instead of dispatched through inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kind(pub &'static str);

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags carried by a synthesized artifact (spec §3).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactFlags {
    /// A conflict artifact has exactly two content children (LEFT, RIGHT)
    /// and no ordinary payload (spec §3 invariant).
    pub conflict: bool,
    /// A choice artifact has one content child per named variant.
    pub choice: bool,
    /// Set on artifacts which have no BASE correspondent.
    pub added: bool,
    /// Set on artifacts which were produced by recursively merging
    /// matched children from two sides, as opposed to being a verbatim
    /// clone of one side.
    pub merged: bool,
}

/// A node in the generic artifact tree.
///
/// Ownership: a node exclusively owns its `children` vector. `parent`
/// and `matches` are non-owning relations. Per the "cyclic
/// back-references" design note (spec §9), they are conceptually
/// `(revision, identity)` pairs resolved through the arena; we store
/// them directly as pointers for ergonomics, which is sound because
/// every artifact that can appear in `matches` or `parent` is allocated
/// from the same arena and therefore lives exactly as long as `'a`.
pub struct Artifact<'a> {
    pub revision: Revision,
    /// Stable identity, unique within `revision` (spec §3 invariant).
    /// Carries no meaning across revisions.
    pub id: usize,
    pub kind: Kind,
    pub children: Vec<&'a Artifact<'a>>,
    /// Payload for leaves (text content) or structural attributes for
    /// inner nodes, as raw source text either way.
    pub payload: Option<&'a str>,
    /// A structural hash, invariant under re-identification, used by
    /// the matchers as a cheap equality prefilter.
    pub hash: u64,
    /// Whether this node's *children* should be treated as an unordered
    /// (set-valued) collection rather than a sequence. Declared by the
    /// parser collaborator's kind capability table.
    pub unordered_children: bool,
    descendant_count: usize,
    parent: UnsafeCell<Option<&'a Artifact<'a>>>,
    matches: UnsafeCell<FxHashMap<Revision, &'a Artifact<'a>>>,
    flags: Cell<ArtifactFlags>,
}

// SAFETY: `parent` and `matches` are only mutated single-threadedly,
// right after construction (`set_parent_on_children`) or during the
// (single-threaded, per merge-pair) matching phase via `set_match`.
// Nothing reads them concurrently with a write. This mirrors the
// justification `mergiraf` gives for `AstNode`'s own `UnsafeCell`.
unsafe impl Sync for Artifact<'_> {}
unsafe impl Send for Artifact<'_> {}

/// Monotonic id allocator, shared across all revisions participating in
/// one merge run so that `Revision::Merge` output gets fresh ids that
/// cannot collide with any input revision's ids.
#[derive(Debug, Default)]
pub struct IdGen(Cell<usize>);

impl IdGen {
    pub fn new() -> Self {
        Self(Cell::new(1))
    }

    pub fn next(&self) -> usize {
        let id = self.0.get();
        self.0.set(id + 1);
        id
    }
}

impl<'a> Artifact<'a> {
    /// Construct a leaf or inner node directly. Prefer
    /// [`crate::tree_builder::TreeBuilder`] when synthesizing a merged
    /// tree incrementally (that is the `add_child`-style API spec §4.1
    /// refers to).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: &'a Arena<Artifact<'a>>,
        id_gen: &IdGen,
        revision: Revision,
        kind: Kind,
        children: Vec<&'a Artifact<'a>>,
        payload: Option<&'a str>,
        unordered_children: bool,
    ) -> &'a Artifact<'a> {
        let mut hasher = fxhasher();
        kind.0.hash(&mut hasher);
        if children.is_empty() {
            payload.hash(&mut hasher);
        } else if unordered_children {
            let mut child_hashes = children.iter().map(|c| c.hash).collect_vec();
            child_hashes.sort_unstable();
            child_hashes.hash(&mut hasher);
        } else {
            children.iter().map(|c| c.hash).collect_vec().hash(&mut hasher);
        }

        let descendant_count = 1 + children.iter().map(|c| c.descendant_count).sum::<usize>();

        let node = arena.alloc(Artifact {
            revision,
            id: id_gen.next(),
            kind,
            children,
            payload,
            hash: hasher.finish(),
            unordered_children,
            descendant_count,
            parent: UnsafeCell::new(None),
            matches: UnsafeCell::new(FxHashMap::default()),
            flags: Cell::new(ArtifactFlags::default()),
        });
        node.set_parent_on_children();
        node
    }

    fn set_parent_on_children(&'a self) {
        for child in &self.children {
            unsafe { *child.parent.get() = Some(self) };
        }
    }

    /// Convenience accessor; returns the owned children slice.
    pub fn children(&self) -> &[&'a Artifact<'a>] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn parent(&'a self) -> Option<&'a Artifact<'a>> {
        unsafe { *self.parent.get() }
    }

    pub fn size(&self) -> usize {
        self.descendant_count
    }

    pub fn flags(&self) -> ArtifactFlags {
        self.flags.get()
    }

    pub fn set_flags(&self, flags: ArtifactFlags) {
        self.flags.set(flags);
    }

    pub fn mark_conflict(&self) {
        let mut flags = self.flags.get();
        flags.conflict = true;
        self.flags.set(flags);
    }

    pub fn mark_choice(&self) {
        let mut flags = self.flags.get();
        flags.choice = true;
        self.flags.set(flags);
    }

    pub fn mark_added(&self) {
        let mut flags = self.flags.get();
        flags.added = true;
        self.flags.set(flags);
    }

    pub fn mark_merged(&self) {
        let mut flags = self.flags.get();
        flags.merged = true;
        self.flags.set(flags);
    }

    /// Symmetric match registration (spec §3 invariant: if `a.matches[r]
    /// = b` then `b.matches[s] = a`).
    pub fn set_match(&'a self, other: &'a Artifact<'a>) {
        unsafe {
            (*self.matches.get()).insert(other.revision, other);
            (*other.matches.get()).insert(self.revision, self);
        }
    }

    pub fn get_match(&self, revision: Revision) -> Option<&'a Artifact<'a>> {
        unsafe { (*self.matches.get()).get(&revision).copied() }
    }

    pub fn has_match_in(&self, revision: Revision) -> bool {
        self.get_match(revision).is_some()
    }

    /// Kind + payload + ordered children equality, ignoring identity and
    /// matches (spec §4.1). For nodes whose children are unordered, the
    /// comparison is order-insensitive, since "equal" should mean "the
    /// same multiset of children", matching what `unordered_children`
    /// promises matchers and the merge driver elsewhere.
    pub fn equals_structurally(&self, other: &Artifact<'_>) -> bool {
        if self.hash != other.hash || self.kind != other.kind {
            return false;
        }
        if self.children.is_empty() != other.children.is_empty() {
            return false;
        }
        if self.children.is_empty() {
            return self.payload == other.payload;
        }
        if self.children.len() != other.children.len() {
            return false;
        }
        if self.unordered_children {
            let mut remaining: Vec<&Artifact> = other.children.clone();
            'outer: for child in &self.children {
                for (idx, candidate) in remaining.iter().enumerate() {
                    if child.equals_structurally(candidate) {
                        remaining.swap_remove(idx);
                        continue 'outer;
                    }
                }
                return false;
            }
            true
        } else {
            self.children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.equals_structurally(b))
        }
    }

    /// Clone a subtree, minting fresh identities. If `target_revision`
    /// differs from `self.revision`, the clone is re-tagged and its
    /// matches map is cleared, per the "deep cloning" design note (spec
    /// §9): matches are never deep-cloned.
    pub fn clone_deep(
        &'a self,
        target_revision: Revision,
        arena: &'a Arena<Artifact<'a>>,
        id_gen: &IdGen,
    ) -> &'a Artifact<'a> {
        let children = self
            .children
            .iter()
            .map(|c| c.clone_deep(target_revision, arena, id_gen))
            .collect();
        let node = arena.alloc(Artifact {
            revision: target_revision,
            id: id_gen.next(),
            kind: self.kind,
            children,
            payload: self.payload,
            hash: self.hash,
            unordered_children: self.unordered_children,
            descendant_count: self.descendant_count,
            parent: UnsafeCell::new(None),
            matches: UnsafeCell::new(FxHashMap::default()),
            flags: Cell::new(ArtifactFlags::default()),
        });
        node.set_parent_on_children();
        node
    }

    /// Depth-first, pre-order traversal.
    pub fn dfs(&'a self) -> impl Iterator<Item = &'a Artifact<'a>> {
        DfsIter { stack: vec![self] }
    }
}

struct DfsIter<'a> {
    stack: Vec<&'a Artifact<'a>>,
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = &'a Artifact<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl Hash for Artifact<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
        self.id.hash(state);
        self.revision.hash(state);
    }
}

impl PartialEq for Artifact<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.revision == other.revision
    }
}

impl Eq for Artifact<'_> {}

impl Display for Artifact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.revision, self.kind, self.id)
    }
}

impl fmt::Debug for Artifact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("revision", &self.revision)
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("children", &self.children.len())
            .field("payload", &self.payload)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ArenaCtx;

    #[test]
    fn structural_equality_ignores_identity() {
        let ctx = ArenaCtx::new();
        let a = ctx.leaf(Revision::Left, Kind("stmt"), "x = 1");
        let b = ctx.leaf(Revision::Right, Kind("stmt"), "x = 1");
        assert!(a.equals_structurally(b));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn set_match_is_symmetric() {
        let ctx = ArenaCtx::new();
        let a = ctx.leaf(Revision::Base, Kind("stmt"), "x");
        let b = ctx.leaf(Revision::Left, Kind("stmt"), "x");
        a.set_match(b);
        assert_eq!(a.get_match(Revision::Left), Some(b));
        assert_eq!(b.get_match(Revision::Base), Some(a));
    }

    #[test]
    fn unordered_equality_ignores_order() {
        let ctx = ArenaCtx::new();
        let a1 = ctx.leaf(Revision::Left, Kind("import"), "a");
        let a2 = ctx.leaf(Revision::Left, Kind("import"), "b");
        let left = ctx.node(Revision::Left, Kind("imports"), vec![a1, a2], true);

        let b1 = ctx.leaf(Revision::Right, Kind("import"), "b");
        let b2 = ctx.leaf(Revision::Right, Kind("import"), "a");
        let right = ctx.node(Revision::Right, Kind("imports"), vec![b1, b2], true);

        assert!(left.equals_structurally(right));
    }

    #[test]
    fn clone_deep_mints_fresh_ids_and_clears_matches() {
        let ctx = ArenaCtx::new();
        let base = ctx.leaf(Revision::Base, Kind("stmt"), "x");
        let left = ctx.leaf(Revision::Left, Kind("stmt"), "x");
        base.set_match(left);

        let cloned = base.clone_deep(Revision::Merge, &ctx.arena, &ctx.id_gen);
        assert_ne!(cloned.id, base.id);
        assert_eq!(cloned.revision, Revision::Merge);
        assert_eq!(cloned.get_match(Revision::Left), None);
    }
}
