//! Matching over order-significant child sequences (spec §4.3):
//! dynamic programming on the grid of child indices, maximizing total
//! score subject to order preservation.

use crate::artifact::Artifact;
use crate::context::MergeContext;
use crate::matching::Matching;
use crate::subtree_matcher::{self, ScoreMemo};

/// Matches the ordered children of `l` against those of `r`, choosing
/// the subsequence of index pairs that maximizes the sum of recursive
/// subtree scores while preserving relative order on both sides (spec
/// §4.3 invariants (a)-(c)).
pub fn match_children<'a>(
    l: &'a Artifact<'a>,
    r: &'a Artifact<'a>,
    ctx: &MergeContext,
    memo: &mut ScoreMemo<'a>,
) -> (Matching<'a>, i64) {
    let lc = l.children();
    let rc = r.children();
    let n = lc.len();
    let m = rc.len();

    // Subtree score/matching for every candidate pair, computed once
    // and reused both by the DP table and by backtracking.
    let mut pairs: Vec<Vec<Option<(Matching<'a>, i64)>>> = (0..n)
        .map(|i| (0..m).map(|j| Some(subtree_matcher::match_pair(lc[i], rc[j], ctx, memo))).collect())
        .collect();

    let mut dp = vec![vec![0i64; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            let diag = dp[i - 1][j - 1] + pairs[i - 1][j - 1].as_ref().unwrap().1;
            dp[i][j] = diag.max(dp[i - 1][j]).max(dp[i][j - 1]);
        }
    }

    let mut matching = Matching::new();
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        let diag = dp[i - 1][j - 1] + pairs[i - 1][j - 1].as_ref().unwrap().1;
        if dp[i][j] == diag && diag >= dp[i - 1][j] && diag >= dp[i][j - 1] {
            let (sub_matching, _) = pairs[i - 1][j - 1].take().unwrap();
            matching.extend(&sub_matching);
            i -= 1;
            j -= 1;
        } else if dp[i][j] == dp[i - 1][j] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    let total = dp[n][m];
    (matching, total)
}
