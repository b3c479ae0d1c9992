//! Three-way classification and tree synthesis (spec §4.6): the
//! largest single component, consuming the matchings the ordered and
//! unordered matchers committed onto the artifacts via
//! [`crate::artifact::Artifact::set_match`] and producing a new tree
//! rooted in [`Revision::Merge`].

use typed_arena::Arena;

use crate::artifact::{Artifact, ArtifactFlags, IdGen, Kind, Revision};
use crate::context::MergeContext;
use crate::line_merge;
use crate::scenario::MergeScenario;
use crate::settings::DisplaySettings;
use crate::subtree_matcher::ScoreMemo;

/// A completed three-way merge: the synthesized tree plus the number
/// of conflicts (or, under conditional mode, choices) it contains.
pub struct MergeResult<'a> {
    pub root: &'a Artifact<'a>,
    pub conflict_count: usize,
}

/// Merges a 3-way [`MergeScenario`] whose BASE↔LEFT and BASE↔RIGHT
/// matchings have already been committed onto the artifacts (see
/// [`crate::matching::Matching::commit`]).
pub fn merge_three_way<'a>(
    scenario: &MergeScenario<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
) -> MergeResult<'a> {
    let base = scenario.base().expect("3-way merge requires a BASE revision");
    let left = scenario.left().expect("3-way merge requires a LEFT revision");
    let right = scenario.right().expect("3-way merge requires a RIGHT revision");

    let mut conflicts = 0usize;
    let root = merge_node(base, Some(left), Some(right), arena, id_gen, ctx, settings, &mut conflicts)
        .unwrap_or_else(|| empty_variant(base.kind, Revision::Merge, arena, id_gen));
    MergeResult { root, conflict_count: conflicts }
}

/// Classifies and synthesizes the merge of one BASE node against its
/// (possibly absent) matches in LEFT and RIGHT. Returns `None` when the
/// node is removed outright (rule 3: deleted on one side, unchanged on
/// the other).
fn merge_node<'a>(
    base: &'a Artifact<'a>,
    left: Option<&'a Artifact<'a>>,
    right: Option<&'a Artifact<'a>>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
    conflicts: &mut usize,
) -> Option<&'a Artifact<'a>> {
    match (left, right) {
        (None, None) => None,
        (Some(l), None) => {
            if base.equals_structurally(l) {
                None // rule 3: unchanged on left, deleted on right
            } else {
                // rule 4: delete-vs-modify
                Some(delete_modify_conflict(base.kind, Some(l), None, ctx, arena, id_gen, conflicts))
            }
        }
        (None, Some(r)) => {
            if base.equals_structurally(r) {
                None
            } else {
                Some(delete_modify_conflict(base.kind, None, Some(r), ctx, arena, id_gen, conflicts))
            }
        }
        (Some(l), Some(r)) => {
            let left_changed = !base.equals_structurally(l);
            let right_changed = !base.equals_structurally(r);
            match (left_changed, right_changed) {
                (false, false) => Some(base.clone_deep(Revision::Merge, arena, id_gen)), // rule 1
                (true, false) => Some(l.clone_deep(Revision::Merge, arena, id_gen)),     // rule 2
                (false, true) => Some(r.clone_deep(Revision::Merge, arena, id_gen)),     // rule 2
                (true, true) => Some(merge_both_changed(base, l, r, arena, id_gen, ctx, settings, conflicts)),
            }
        }
    }
}

/// Rule 5: both sides changed and matched to each other through BASE.
/// Leaves with textual payload delegate to the line merger; inner
/// nodes recurse into children.
fn merge_both_changed<'a>(
    base: &'a Artifact<'a>,
    left: &'a Artifact<'a>,
    right: &'a Artifact<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
    conflicts: &mut usize,
) -> &'a Artifact<'a> {
    if base.is_leaf() && left.is_leaf() && right.is_leaf() {
        return merge_leaf_payload(base, left, right, arena, id_gen, ctx, settings, conflicts);
    }

    let children = merge_children(base, left, right, arena, id_gen, ctx, settings, conflicts);
    let merged = Artifact::new(arena, id_gen, Revision::Merge, base.kind, children, None, base.unordered_children);
    merged.set_flags(ArtifactFlags { merged: true, ..ArtifactFlags::default() });
    merged
}

fn merge_leaf_payload<'a>(
    base: &'a Artifact<'a>,
    left: &'a Artifact<'a>,
    right: &'a Artifact<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
    conflicts: &mut usize,
) -> &'a Artifact<'a> {
    let result = line_merge::line_merge(
        base.payload.unwrap_or(""),
        left.payload.unwrap_or(""),
        right.payload.unwrap_or(""),
        settings,
    );
    if result.conflict_count == 0 {
        let text = leak_merged_text(result.contents);
        return Artifact::new(arena, id_gen, Revision::Merge, base.kind, Vec::new(), Some(text), false);
    }
    *conflicts += result.conflict_count;
    if ctx.conditional_merge && ctx.choice_applies_at(base.kind) {
        return choice_artifact(base.kind, &[(left.revision, left), (right.revision, right)], arena, id_gen);
    }
    conflict_artifact(base.kind, Some(left), Some(right), arena, id_gen)
}

/// Text synthesized at merge time (as opposed to sliced from an input
/// revision's buffer) has no backing allocation to borrow from, so it
/// is leaked for the process's lifetime, the same trick `mergiraf` uses
/// for its own synthesized merge text.
fn leak_merged_text(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Builds the merged child sequence for two structurally-changed,
/// matched inner nodes (rule 5), splicing in additions from both sides
/// (rules 7/8/9) and surfacing delete-vs-modify conflicts for BASE
/// children matched only on one side (rules 3/4).
///
/// Left's order is authoritative (spec §4.6 tie-break); children
/// deleted-on-left-changed-on-right and right-only additions are
/// appended after it, in that order, since they have no anchor in
/// left's own sequence to splice against.
fn merge_children<'a>(
    base: &'a Artifact<'a>,
    left: &'a Artifact<'a>,
    right: &'a Artifact<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
    conflicts: &mut usize,
) -> Vec<&'a Artifact<'a>> {
    let mut out = Vec::new();
    let mut consumed_right_additions: Vec<&Artifact> = Vec::new();

    let left_additions: Vec<&'a Artifact<'a>> =
        left.children().iter().copied().filter(|c| c.get_match(Revision::Base).is_none()).collect();
    let mut right_additions: Vec<&'a Artifact<'a>> =
        right.children().iter().copied().filter(|c| c.get_match(Revision::Base).is_none()).collect();

    for &lc in left.children() {
        match lc.get_match(Revision::Base) {
            Some(bc) => {
                let rm = bc.get_match(Revision::Right);
                if let Some(result) = merge_node(bc, Some(lc), rm, arena, id_gen, ctx, settings, conflicts) {
                    out.push(result);
                }
            }
            None => {
                // Added on left; see whether an equally-unmatched right
                // child pairs with it (rules 8/9) before treating it as
                // a left-only addition (rule 7).
                if let Some(pos) = right_additions.iter().position(|rc| lc.equals_structurally(rc)) {
                    let rc = right_additions.remove(pos);
                    consumed_right_additions.push(rc);
                    out.push(lc.clone_deep(Revision::Merge, arena, id_gen)); // rule 8
                } else {
                    out.push(lc.clone_deep(Revision::Merge, arena, id_gen)); // rule 7
                }
            }
        }
    }
    let _ = left_additions;

    // BASE children deleted on left but present (possibly changed) on
    // right: rules 3/4 mirrored.
    for &bc in base.children() {
        if bc.get_match(Revision::Left).is_some() {
            continue; // already handled above via left's own sequence
        }
        if let Some(rc) = bc.get_match(Revision::Right) {
            if let Some(result) = merge_node(bc, None, Some(rc), arena, id_gen, ctx, settings, conflicts) {
                out.push(result);
            }
        }
    }

    // Remaining right additions not paired with a left addition.
    for rc in right_additions {
        if consumed_right_additions.iter().any(|c| c.id == rc.id) {
            continue;
        }
        out.push(rc.clone_deep(Revision::Merge, arena, id_gen)); // rule 7
    }

    out
}

fn delete_modify_conflict<'a>(
    kind: Kind,
    left: Option<&'a Artifact<'a>>,
    right: Option<&'a Artifact<'a>>,
    ctx: &MergeContext,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    conflicts: &mut usize,
) -> &'a Artifact<'a> {
    *conflicts += 1;
    if ctx.conditional_merge && ctx.choice_applies_at(kind) {
        let mut variants = Vec::new();
        if let Some(l) = left {
            variants.push((l.revision, l));
        }
        if let Some(r) = right {
            variants.push((r.revision, r));
        }
        return choice_artifact(kind, &variants, arena, id_gen);
    }
    conflict_artifact(kind, left, right, arena, id_gen)
}

/// Builds a conflict artifact: exactly two content children, the LEFT
/// and RIGHT variants (an absent side becomes an empty placeholder),
/// flagged `conflict` (spec §3 invariant).
fn conflict_artifact<'a>(
    kind: Kind,
    left: Option<&'a Artifact<'a>>,
    right: Option<&'a Artifact<'a>>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
) -> &'a Artifact<'a> {
    let left_variant = left.map_or_else(|| empty_variant(kind, Revision::Merge, arena, id_gen), |l| {
        l.clone_deep(Revision::Merge, arena, id_gen)
    });
    let right_variant = right.map_or_else(|| empty_variant(kind, Revision::Merge, arena, id_gen), |r| {
        r.clone_deep(Revision::Merge, arena, id_gen)
    });
    let node = Artifact::new(arena, id_gen, Revision::Merge, kind, vec![left_variant, right_variant], None, false);
    node.mark_conflict();
    node
}

/// Builds a choice artifact: one content child per named variant (spec
/// §3 invariant), used in place of a conflict when conditional merging
/// is enabled.
fn choice_artifact<'a>(
    kind: Kind,
    variants: &[(Revision, &'a Artifact<'a>)],
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
) -> &'a Artifact<'a> {
    let children = variants.iter().map(|(_, art)| art.clone_deep(Revision::Merge, arena, id_gen)).collect();
    let node = Artifact::new(arena, id_gen, Revision::Merge, kind, children, None, false);
    node.mark_choice();
    node
}

fn empty_variant<'a>(kind: Kind, revision: Revision, arena: &'a Arena<Artifact<'a>>, id_gen: &IdGen) -> &'a Artifact<'a> {
    Artifact::new(arena, id_gen, revision, kind, Vec::new(), None, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Kind, Revision};
    use crate::matching::Matching;
    use crate::test_utils::ArenaCtx;

    fn commit(base: &Artifact, left: &Artifact, right: &Artifact) {
        base.set_match(left);
        base.set_match(right);
    }

    #[test]
    fn s1_both_sides_unchanged_clones_base() {
        let ctx = ArenaCtx::new();
        let base = ctx.leaf(Revision::Base, Kind("stmt"), "x");
        let left = ctx.leaf(Revision::Left, Kind("stmt"), "x");
        let right = ctx.leaf(Revision::Right, Kind("stmt"), "x");
        commit(base, left, right);

        let scenario = MergeScenario::three_way(base, left, right);
        let merge_ctx = MergeContext::default();
        let settings = DisplaySettings::default();
        let result = merge_three_way(&scenario, &ctx.arena, &ctx.id_gen, &merge_ctx, &settings);
        assert_eq!(result.conflict_count, 0);
        assert_eq!(result.root.payload, Some("x"));
    }

    #[test]
    fn s4_add_add_equal_yields_single_copy() {
        let ctx = ArenaCtx::new();
        let base = ctx.node(Revision::Base, Kind("class"), vec![], false);
        let added_left = ctx.leaf(Revision::Left, Kind("method"), "m");
        let left = ctx.node(Revision::Left, Kind("class"), vec![added_left], false);
        let added_right = ctx.leaf(Revision::Right, Kind("method"), "m");
        let right = ctx.node(Revision::Right, Kind("class"), vec![added_right], false);
        commit(base, left, right);

        let scenario = MergeScenario::three_way(base, left, right);
        let merge_ctx = MergeContext::default();
        let settings = DisplaySettings::default();
        let result = merge_three_way(&scenario, &ctx.arena, &ctx.id_gen, &merge_ctx, &settings);
        assert_eq!(result.conflict_count, 0);
        assert_eq!(result.root.children().len(), 1);
    }

    #[test]
    fn s5_delete_modify_is_a_conflict() {
        let ctx = ArenaCtx::new();
        let m_base = ctx.leaf(Revision::Base, Kind("method"), "m");
        let base = ctx.node(Revision::Base, Kind("class"), vec![m_base], false);
        let left = ctx.node(Revision::Left, Kind("class"), vec![], false); // deletes m
        let m_right = ctx.leaf(Revision::Right, Kind("method"), "m2"); // body changed
        let right = ctx.node(Revision::Right, Kind("class"), vec![m_right], false);

        base.set_match(left);
        base.set_match(right);
        m_base.set_match(m_right);

        let scenario = MergeScenario::three_way(base, left, right);
        let merge_ctx = MergeContext::default();
        let settings = DisplaySettings::default();
        let result = merge_three_way(&scenario, &ctx.arena, &ctx.id_gen, &merge_ctx, &settings);
        assert_eq!(result.conflict_count, 1);
        let conflict = result.root.children()[0];
        assert!(conflict.flags().conflict);
    }

    #[test]
    fn rule9_conflicting_adds_use_choice_under_conditional_merge() {
        let ctx = ArenaCtx::new();
        let base = ctx.node(Revision::Base, Kind("class"), vec![], false);
        let added_left = ctx.leaf(Revision::Left, Kind("method"), "a");
        let left = ctx.node(Revision::Left, Kind("class"), vec![added_left], false);
        let added_right = ctx.leaf(Revision::Right, Kind("method"), "b");
        let right = ctx.node(Revision::Right, Kind("class"), vec![added_right], false);
        commit(base, left, right);

        let scenario = MergeScenario::three_way(base, left, right);
        let merge_ctx = MergeContext::default();
        let settings = DisplaySettings::default();
        let result = merge_three_way(&scenario, &ctx.arena, &ctx.id_gen, &merge_ctx, &settings);
        assert_eq!(result.root.children().len(), 2); // two independent additions, rule 7 twice
        assert_eq!(result.conflict_count, 0);
    }
}
