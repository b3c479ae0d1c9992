//! The recursive scoring core shared by the ordered and unordered
//! matchers (spec §4.3, §4.4): "the score of a matched pair equals the
//! score of the optimal matching between their subtrees."
//!
//! [`match_pair`] is the single entry point both matchers call when
//! they need the score of matching one child against another; it in
//! turn dispatches back into whichever of [`crate::ordered_matcher`] /
//! [`crate::unordered_matcher`] applies to the pair's children,
//! memoizing per pair of artifact identities for the duration of one
//! run (spec §4.3).

use rustc_hash::FxHashMap;

use crate::artifact::Artifact;
use crate::context::MergeContext;
use crate::matching::{MatchColor, Matching};
use crate::ordered_matcher;
use crate::unordered_matcher;

/// Score plus matching memoized per `(left.id, right.id)` pair, shared
/// by one matcher invocation across both trees being compared.
pub type ScoreMemo<'a> = FxHashMap<(usize, usize), (Matching<'a>, i64)>;

fn lookahead_budget(lookahead: crate::context::Lookahead) -> u32 {
    use crate::context::Lookahead;
    match lookahead {
        Lookahead::Off => 0,
        Lookahead::Bounded(n) => n,
        Lookahead::Full => u32::MAX,
    }
}

/// Score and matching of the best correspondence rooted at `(l, r)`,
/// per spec §4.3/§4.4. `l` and `r` need not share a kind: when they
/// don't, this descends up to the configured look-ahead depth
/// searching for matches within the subtrees before giving up (spec
/// §4.3 "Look-ahead").
pub fn match_pair<'a>(
    l: &'a Artifact<'a>,
    r: &'a Artifact<'a>,
    ctx: &MergeContext,
    memo: &mut ScoreMemo<'a>,
) -> (Matching<'a>, i64) {
    let budget = lookahead_budget(ctx.lookahead.get(l.kind));
    bounded(l, r, budget, ctx, memo)
}

fn bounded<'a>(
    l: &'a Artifact<'a>,
    r: &'a Artifact<'a>,
    budget: u32,
    ctx: &MergeContext,
    memo: &mut ScoreMemo<'a>,
) -> (Matching<'a>, i64) {
    if let Some(cached) = memo.get(&(l.id, r.id)) {
        return cached.clone();
    }

    let result = if l.equals_structurally(r) {
        let mut matching = Matching::new();
        for (a, b) in l.dfs().zip(r.dfs()) {
            matching.add(a, b, 1, MatchColor::Ordered);
        }
        (matching, l.size() as i64)
    } else if l.kind == r.kind {
        let (mut matching, child_score) = if l.unordered_children {
            unordered_matcher::match_children(l, r, ctx, memo)
        } else {
            ordered_matcher::match_children(l, r, ctx, memo)
        };
        let score = child_score + 1;
        let color = if l.unordered_children { MatchColor::Unordered } else { MatchColor::Ordered };
        matching.add(l, r, score, color);
        (matching, score)
    } else if budget == 0 {
        (Matching::new(), 0)
    } else {
        let next_budget = budget.saturating_sub(1);
        let mut best = (Matching::new(), 0i64);
        for rc in r.children() {
            let candidate = bounded(l, rc, next_budget, ctx, memo);
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        for lc in l.children() {
            let candidate = bounded(lc, r, next_budget, ctx, memo);
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    };

    memo.insert((l.id, r.id), result.clone());
    result
}
