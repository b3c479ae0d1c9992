//! End-to-end coverage of spec §8: the six concrete scenarios and the
//! eight cross-cutting invariants, exercised through the crate's
//! public API (line merge, structured dispatch, n-way fold) the way
//! `mergiraf`'s own `tests/integration_tests.rs` exercises its merge
//! driver end-to-end rather than unit-by-unit.

use std::str::FromStr;

use synmerge::artifact::{Artifact, IdGen, Kind, Revision};
use synmerge::context::MergeContext;
use synmerge::line_merge::line_merge;
use synmerge::nway;
use synmerge::scenario::MergeScenario;
use synmerge::settings::DisplaySettings;
use synmerge::strategy::{dispatch, DispatchResult, Strategy};
use typed_arena::Arena;

fn leaf<'a>(arena: &'a Arena<Artifact<'a>>, id_gen: &IdGen, revision: Revision, kind: &'static str, payload: &'a str) -> &'a Artifact<'a> {
    Artifact::new(arena, id_gen, revision, Kind(kind), Vec::new(), Some(payload), false)
}

fn node<'a>(
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
    revision: Revision,
    kind: &'static str,
    children: Vec<&'a Artifact<'a>>,
) -> &'a Artifact<'a> {
    Artifact::new(arena, id_gen, revision, Kind(kind), children, None, false)
}

fn structured_result<'a>(
    scenario: &MergeScenario<'a>,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
) -> synmerge::merge_driver::MergeResult<'a> {
    let ctx = MergeContext::default();
    let settings = DisplaySettings::default();
    match dispatch(Strategy::Structured, scenario, arena, id_gen, &ctx, &settings).unwrap() {
        DispatchResult::Structured(result) => result,
        DispatchResult::Line(_) => panic!("expected a structured result"),
    }
}

#[test]
fn s1_line_merge_without_conflict() {
    let result = line_merge("a\nb\nc\n", "a\nB\nc\n", "a\nb\nC\n", &DisplaySettings::default());
    assert_eq!(result.contents, "a\nB\nC\n");
    assert_eq!(result.conflict_count, 0);
}

#[test]
fn s2_line_merge_conflict_byte_exact_markers() {
    let result = line_merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n", &DisplaySettings::default());
    assert_eq!(result.contents, "a\n<<<LEFT\nX\n====\nY\n>>>RIGHT\nc\n");
    assert_eq!(result.conflict_count, 1);
}

#[test]
fn s3_structured_reorder_without_conflict() {
    let arena = Arena::new();
    let id_gen = IdGen::new();

    let m1_base = leaf(&arena, &id_gen, Revision::Base, "method", "m1 v1");
    let m2_base = leaf(&arena, &id_gen, Revision::Base, "method", "m2 v1");
    let base = node(&arena, &id_gen, Revision::Base, "class", vec![m1_base, m2_base]);

    let m1_left = leaf(&arena, &id_gen, Revision::Left, "method", "m1 v1");
    let m2_left = leaf(&arena, &id_gen, Revision::Left, "method", "m2 v1");
    let left = node(&arena, &id_gen, Revision::Left, "class", vec![m2_left, m1_left]); // reordered

    let m1_right = leaf(&arena, &id_gen, Revision::Right, "method", "m1 v1");
    let m2_right = leaf(&arena, &id_gen, Revision::Right, "method", "m2 v2"); // body renamed
    let right = node(&arena, &id_gen, Revision::Right, "class", vec![m1_right, m2_right]);

    // Matchings a real matcher run would commit: identity on m1, and
    // m2 tracked across the rename on both sides.
    m1_base.set_match(m1_left);
    m1_base.set_match(m1_right);
    m2_base.set_match(m2_left);
    m2_base.set_match(m2_right);

    let scenario = MergeScenario::three_way(base, left, right);
    let ctx = MergeContext::default();
    let settings = DisplaySettings::default();
    let root = synmerge::merge_driver::merge_three_way(&scenario, &arena, &id_gen, &ctx, &settings);

    assert_eq!(root.conflict_count, 0);
    let children = root.root.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].payload, Some("m2 v2")); // left's order, right's body
    assert_eq!(children[1].payload, Some("m1 v1"));
}

#[test]
fn s4_structured_add_add_equal_yields_one_copy() {
    let arena = Arena::new();
    let id_gen = IdGen::new();

    let base = node(&arena, &id_gen, Revision::Base, "class", vec![]);
    let added_left = leaf(&arena, &id_gen, Revision::Left, "method", "m");
    let left = node(&arena, &id_gen, Revision::Left, "class", vec![added_left]);
    let added_right = leaf(&arena, &id_gen, Revision::Right, "method", "m");
    let right = node(&arena, &id_gen, Revision::Right, "class", vec![added_right]);

    base.set_match(left);
    base.set_match(right);

    let scenario = MergeScenario::three_way(base, left, right);
    let result = structured_result(&scenario, &arena, &id_gen);
    assert_eq!(result.conflict_count, 0);
    assert_eq!(result.root.children().len(), 1);
}

#[test]
fn s5_structured_delete_modify_conflict() {
    let arena = Arena::new();
    let id_gen = IdGen::new();

    let m_base = leaf(&arena, &id_gen, Revision::Base, "method", "m");
    let base = node(&arena, &id_gen, Revision::Base, "class", vec![m_base]);
    let left = node(&arena, &id_gen, Revision::Left, "class", vec![]); // deletes m
    let m_right = leaf(&arena, &id_gen, Revision::Right, "method", "m2"); // body changed
    let right = node(&arena, &id_gen, Revision::Right, "class", vec![m_right]);

    base.set_match(left);
    base.set_match(right);
    m_base.set_match(m_right);

    let scenario = MergeScenario::three_way(base, left, right);
    let result = structured_result(&scenario, &arena, &id_gen);
    assert_eq!(result.conflict_count, 1);
    let conflict = result.root.children()[0];
    assert!(conflict.flags().conflict);
    assert_eq!(conflict.children().len(), 2);
    assert_eq!(conflict.children()[0].children().len(), 0); // empty LEFT variant
    assert_eq!(conflict.children()[1].payload, Some("m2")); // RIGHT's version
}

#[test]
fn s6_nway_variants_yield_choice_not_conflict() {
    let arena = Arena::new();
    let id_gen = IdGen::new();

    let v1 = leaf(&arena, &id_gen, Revision::Numbered(1), "stmt", "a");
    let v2 = leaf(&arena, &id_gen, Revision::Numbered(2), "stmt", "b");
    let v3 = leaf(&arena, &id_gen, Revision::Numbered(3), "stmt", "c");

    let scenario = MergeScenario::new(vec![
        (Revision::Numbered(1), v1),
        (Revision::Numbered(2), v2),
        (Revision::Numbered(3), v3),
    ]);
    let ctx = MergeContext::default();
    let settings = DisplaySettings::default();
    let result = nway::merge_variants(&scenario, &arena, &id_gen, &ctx, &settings);

    assert_eq!(result.conflict_count, 0);
    assert!(result.root.flags().choice);
}

#[test]
fn invariant_identity_on_equal_inputs() {
    let result = line_merge("a\nb\n", "a\nb\n", "a\nb\n", &DisplaySettings::default());
    assert_eq!(result.contents, "a\nb\n");
    assert_eq!(result.conflict_count, 0);
}

#[test]
fn invariant_trivial_side_merge() {
    let left_unchanged = line_merge("a\nb\n", "a\nb\n", "a\nB\n", &DisplaySettings::default());
    assert_eq!(left_unchanged.contents, "a\nB\n");
    let right_unchanged = line_merge("a\nb\n", "a\nB\n", "a\nb\n", &DisplaySettings::default());
    assert_eq!(right_unchanged.contents, "a\nB\n");
}

#[test]
fn invariant_conflict_conservation() {
    let arena = Arena::new();
    let id_gen = IdGen::new();

    let base = leaf(&arena, &id_gen, Revision::Base, "stmt", "x = 1");
    let left = leaf(&arena, &id_gen, Revision::Left, "stmt", "x = 2");
    let right = leaf(&arena, &id_gen, Revision::Right, "stmt", "x = 3");
    base.set_match(left);
    base.set_match(right);

    let scenario = MergeScenario::three_way(base, left, right);
    let result = structured_result(&scenario, &arena, &id_gen);
    assert_eq!(result.conflict_count, 1);
}

#[test]
fn invariant_determinism_given_fixed_inputs() {
    let run = || line_merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n", &DisplaySettings::default());
    assert_eq!(run(), run());
}

#[test]
fn invariant_strategy_name_normalization() {
    assert_eq!(Strategy::from_str(" structured ").unwrap(), Strategy::Structured);
    assert_eq!(Strategy::from_str("STRUCTURED").unwrap(), Strategy::Structured);
    assert!(Strategy::from_str("not-a-strategy").is_err());
}
