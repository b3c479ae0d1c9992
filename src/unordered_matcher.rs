//! Matching over set-valued (order-insignificant) child collections
//! (spec §4.4): maximum-weight bipartite matching over child pairs,
//! edge weights being recursive subtree scores.
//!
//! The exact assignment is computed by subset-DP when the smaller side
//! has at most [`MAX_EXACT_SIDE`] children (ample for the unordered
//! collections real parsers produce: import lists, field sets,
//! attribute bags); beyond that a descending-weight greedy assignment
//! is used instead, since the DP's `O(n * 2^m)` state space stops being
//! practical.

use crate::artifact::Artifact;
use crate::context::MergeContext;
use crate::matching::Matching;
use crate::subtree_matcher::{self, ScoreMemo};

const MAX_EXACT_SIDE: usize = 20;

pub fn match_children<'a>(
    l: &'a Artifact<'a>,
    r: &'a Artifact<'a>,
    ctx: &MergeContext,
    memo: &mut ScoreMemo<'a>,
) -> (Matching<'a>, i64) {
    let lc = l.children();
    let rc = r.children();

    // Weights stay indexed [left][right]; only the DP's internal
    // subset dimension is chosen by size, never the left/right roles
    // `subtree_matcher::match_pair` assigns edges under.
    let weights: Vec<Vec<(Matching<'a>, i64)>> = lc
        .iter()
        .map(|&left_child| rc.iter().map(|&right_child| subtree_matcher::match_pair(left_child, right_child, ctx, memo)).collect())
        .collect();

    let smaller_side = lc.len().min(rc.len());
    let scalar: Vec<Vec<i64>> = weights.iter().map(|row| row.iter().map(|(_, s)| *s).collect()).collect();
    let assignment = if smaller_side <= MAX_EXACT_SIDE {
        exact_assignment(&scalar, lc.len(), rc.len())
    } else {
        greedy_assignment(&scalar, lc.len(), rc.len())
    };

    let mut matching = Matching::new();
    let mut total = 0i64;
    for (i, j) in assignment {
        let (sub_matching, score) = &weights[i][j];
        matching.extend(sub_matching);
        total += score;
    }
    (matching, total)
}

/// Optimal assignment via subset DP: `dp[i][mask]` is the best total
/// weight achievable by assigning rows `0..i` into the subset `mask` of
/// columns (rows may also be left unmatched). The DP always puts its
/// subset dimension on whichever of `n`/`m` is smaller and transposes
/// the result back, since its state space is exponential in that
/// dimension.
fn exact_assignment(weights: &[Vec<i64>], n: usize, m: usize) -> Vec<(usize, usize)> {
    if m > n {
        let transposed: Vec<Vec<i64>> = (0..m).map(|j| (0..n).map(|i| weights[i][j]).collect()).collect();
        return exact_assignment(&transposed, m, n).into_iter().map(|(j, i)| (i, j)).collect();
    }

    let width = 1usize << m;
    let mut dp = vec![vec![0i64; width]; n + 1];
    for i in 0..n {
        for mask in 0..width {
            let base = dp[i][mask];
            if base > dp[i + 1][mask] {
                dp[i + 1][mask] = base;
            }
            for j in 0..m {
                if mask & (1 << j) != 0 {
                    continue;
                }
                let next_mask = mask | (1 << j);
                let candidate = base + weights[i][j];
                if candidate > dp[i + 1][next_mask] {
                    dp[i + 1][next_mask] = candidate;
                }
            }
        }
    }

    let best_mask = (0..width).max_by_key(|&mask| dp[n][mask]).unwrap_or(0);

    let mut assignment = Vec::new();
    let mut mask = best_mask;
    let mut i = n;
    while i > 0 {
        if dp[i][mask] == dp[i - 1][mask] {
            i -= 1;
            continue;
        }
        let row = i - 1;
        let found = (0..m)
            .find(|&j| mask & (1 << j) != 0 && dp[i - 1][mask & !(1 << j)] + weights[row][j] == dp[i][mask]);
        if let Some(j) = found {
            assignment.push((row, j));
            mask &= !(1 << j);
        }
        i -= 1;
    }
    assignment
}

/// Descending-weight greedy fallback for collections too large for
/// exact subset DP.
fn greedy_assignment(weights: &[Vec<i64>], n: usize, m: usize) -> Vec<(usize, usize)> {
    let mut candidates: Vec<(i64, usize, usize)> = Vec::with_capacity(n * m);
    for i in 0..n {
        for j in 0..m {
            candidates.push((weights[i][j], i, j));
        }
    }
    candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut used_rows = vec![false; n];
    let mut used_cols = vec![false; m];
    let mut assignment = Vec::new();
    for (weight, i, j) in candidates {
        if weight <= 0 || used_rows[i] || used_cols[j] {
            continue;
        }
        used_rows[i] = true;
        used_cols[j] = true;
        assignment.push((i, j));
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Kind, Revision};
    use crate::test_utils::ArenaCtx;

    #[test]
    fn matches_regardless_of_child_order() {
        let ctx = ArenaCtx::new();
        let a1 = ctx.leaf(Revision::Left, Kind("import"), "a");
        let a2 = ctx.leaf(Revision::Left, Kind("import"), "b");
        let left = ctx.node(Revision::Left, Kind("imports"), vec![a1, a2], true);

        let b1 = ctx.leaf(Revision::Right, Kind("import"), "b");
        let b2 = ctx.leaf(Revision::Right, Kind("import"), "a");
        let right = ctx.node(Revision::Right, Kind("imports"), vec![b1, b2], true);

        let merge_ctx = MergeContext::default();
        let mut memo = ScoreMemo::default();
        let (matching, score) = match_children(left, right, &merge_ctx, &mut memo);
        assert!(matching.are_matched(a1, b2));
        assert!(matching.are_matched(a2, b1));
        assert_eq!(score, 2);
    }

    #[test]
    fn exact_assignment_finds_optimal_total() {
        let weights = vec![vec![3i64, 1], vec![1, 2]];
        let total: i64 = exact_assignment(&weights, 2, 2).iter().map(|&(i, j)| weights[i][j]).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn exact_assignment_handles_rectangular_wide_case() {
        // More columns than rows: the DP transposes internally.
        let weights = vec![vec![5i64, 1, 1], vec![1, 1, 4]];
        let total: i64 = exact_assignment(&weights, 2, 3).iter().map(|&(i, j)| weights[i][j]).sum();
        assert_eq!(total, 9);
    }
}
