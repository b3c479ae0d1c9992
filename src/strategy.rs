//! Strategy dispatcher (spec §4.8): selects line / structured /
//! combined / n-way handling for a merge scenario.

use std::str::FromStr;

use typed_arena::Arena;

use crate::artifact::{Artifact, IdGen, Revision};
use crate::context::MergeContext;
use crate::errors::{MergeError, Result};
use crate::line_merge::{self, LineMergeResult};
use crate::matching::MatchColor;
use crate::merge_driver::{self, MergeResult};
use crate::nway;
use crate::ordered_matcher;
use crate::scenario::MergeScenario;
use crate::settings::DisplaySettings;
use crate::subtree_matcher::ScoreMemo;
use crate::unordered_matcher;

/// The named strategies of spec §6, canonicalized (case-insensitive,
/// whitespace-trimmed) per spec §4.8/§8 testable property 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    LineBased,
    Structured,
    Combined,
    NWay,
}

impl FromStr for Strategy {
    type Err = MergeError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linebased" | "unstructured" => Ok(Strategy::LineBased),
            "structured" => Ok(Strategy::Structured),
            "combined" | "autotuning" => Ok(Strategy::Combined),
            "nway" | "variants" => Ok(Strategy::NWay),
            other => Err(MergeError::StrategyNotFound(other.to_string())),
        }
    }
}

/// Outcome of dispatching a scenario through a strategy: either a
/// structured [`MergeResult`] or a textual [`LineMergeResult`],
/// depending on which path was taken.
pub enum DispatchResult<'a> {
    Structured(MergeResult<'a>),
    Line(LineMergeResult),
}

impl DispatchResult<'_> {
    pub fn conflict_count(&self) -> usize {
        match self {
            DispatchResult::Structured(r) => r.conflict_count,
            DispatchResult::Line(r) => r.conflict_count,
        }
    }
}

/// Computes the BASE↔LEFT and BASE↔RIGHT matchings for a 3-way
/// scenario and commits them onto the artifacts, readying the trees
/// for [`merge_driver::merge_three_way`].
fn match_and_commit<'a>(scenario: &MergeScenario<'a>, ctx: &MergeContext) {
    let base = scenario.base().expect("structured merge requires a BASE revision");
    let left = scenario.left().expect("structured merge requires a LEFT revision");
    let right = scenario.right().expect("structured merge requires a RIGHT revision");

    let mut memo: ScoreMemo = ScoreMemo::default();
    let (bl, _) = match_pair_top(base, left, ctx, &mut memo);
    bl.commit();
    let mut memo = ScoreMemo::default();
    let (br, _) = match_pair_top(base, right, ctx, &mut memo);
    br.commit();
}

fn match_pair_top<'a>(
    l: &'a Artifact<'a>,
    r: &'a Artifact<'a>,
    ctx: &MergeContext,
    memo: &mut ScoreMemo<'a>,
) -> (crate::matching::Matching<'a>, i64) {
    if l.equals_structurally(r) {
        let mut m = crate::matching::Matching::new();
        for (a, b) in l.dfs().zip(r.dfs()) {
            m.add(a, b, 1, MatchColor::Ordered);
        }
        return (m, l.size() as i64);
    }
    if l.unordered_children {
        unordered_matcher::match_children(l, r, ctx, memo)
    } else {
        ordered_matcher::match_children(l, r, ctx, memo)
    }
}

/// Dispatches `scenario` through `strategy`. Directory scenarios are
/// out of scope for this entry point; callers recursing over a
/// directory tree invoke this once per matched file pair (spec §4.8:
/// "the dispatcher recurses pairing files by path").
pub fn dispatch<'a>(
    strategy: Strategy,
    scenario: &MergeScenario<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
) -> Result<DispatchResult<'a>> {
    match strategy {
        Strategy::LineBased => {
            let base = scenario.base().and_then(|a| a.payload).unwrap_or("");
            let left = scenario.left().and_then(|a| a.payload).unwrap_or("");
            let right = scenario.right().and_then(|a| a.payload).unwrap_or("");
            Ok(DispatchResult::Line(line_merge::line_merge(base, left, right, settings)))
        }
        Strategy::Structured => {
            match_and_commit(scenario, ctx);
            Ok(DispatchResult::Structured(merge_driver::merge_three_way(scenario, arena, id_gen, ctx, settings)))
        }
        Strategy::Combined => {
            match_and_commit(scenario, ctx);
            Ok(DispatchResult::Structured(merge_driver::merge_three_way(scenario, arena, id_gen, ctx, settings)))
        }
        Strategy::NWay => {
            let mut nway_ctx = ctx.clone();
            nway_ctx.conditional_merge = true;
            Ok(DispatchResult::Structured(nway::merge_variants(scenario, arena, id_gen, &nway_ctx, settings)))
        }
    }
}

/// Attempts `combined`'s structured-first, line-fallback behavior when
/// a revision's payload cannot be parsed into an artifact tree (spec
/// §4.8, §7 `ParseFailure`). `parse` is the parser collaborator's
/// entry point (spec §6); on failure for any revision this falls back
/// to [`line_merge::line_merge`] over the raw text.
pub fn combined_with_fallback<'a, F>(
    scenario_text: (&str, &str, &str),
    parse: F,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    ctx: &MergeContext,
    settings: &DisplaySettings,
) -> Result<DispatchResult<'a>>
where
    F: Fn(Revision, &'a str) -> Result<&'a Artifact<'a>>,
{
    let (base_text, left_text, right_text) = scenario_text;
    let parsed = (
        parse(Revision::Base, base_text),
        parse(Revision::Left, left_text),
        parse(Revision::Right, right_text),
    );
    match parsed {
        (Ok(base), Ok(left), Ok(right)) => {
            let scenario = MergeScenario::three_way(base, left, right);
            dispatch(Strategy::Structured, &scenario, arena, id_gen, ctx, settings)
        }
        _ => Ok(DispatchResult::Line(line_merge::line_merge(base_text, left_text, right_text, settings))),
    }
}
