//! [`MergeContext`]: configuration plus mutable per-run state (spec
//! §3, §5, §9). Constructed per invocation; deep-cloned when a
//! sub-merge needs an isolated view that must not observe a caller's
//! later mutations.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use rustc_hash::FxHashMap;

use crate::artifact::Kind;

/// Look-ahead configuration values (spec §6): an integer depth, or the
/// tokens `off` / `full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    Off,
    Bounded(u32),
    Full,
}

impl Lookahead {
    pub fn parse(token: &str) -> Option<Lookahead> {
        match token.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Lookahead::Off),
            "full" => Some(Lookahead::Full),
            other => other.parse::<u32>().ok().map(Lookahead::Bounded),
        }
    }

    /// Whether descent is still allowed at `depth` levels below the
    /// mismatching root.
    pub fn allows(self, depth: u32) -> bool {
        match self {
            Lookahead::Off => false,
            Lookahead::Full => true,
            Lookahead::Bounded(max) => depth <= max,
        }
    }
}

/// Global look-ahead depth plus a per-kind override table. A per-kind
/// entry supersedes the global depth when present, else the global
/// default applies (spec §9 open question: adopted interpretation of
/// the source's redundant `containsKey` check).
#[derive(Debug, Clone)]
pub struct LookaheadTable {
    global: Lookahead,
    per_kind: FxHashMap<Kind, Lookahead>,
}

impl LookaheadTable {
    pub fn new(global: Lookahead) -> Self {
        Self { global, per_kind: FxHashMap::default() }
    }

    pub fn with_override(mut self, kind: Kind, lookahead: Lookahead) -> Self {
        self.per_kind.insert(kind, lookahead);
        self
    }

    pub fn get(&self, kind: Kind) -> Lookahead {
        self.per_kind.get(&kind).copied().unwrap_or(self.global)
    }
}

impl Default for LookaheadTable {
    fn default() -> Self {
        Self::new(Lookahead::Bounded(0))
    }
}

/// Weights and search parameters for the optional cost-model matcher
/// (spec §4.5). The comma-separated option tuples of spec §6
/// (`iterations, pAssign, wr, wn, wa, ws, wo` and `fixLower, fixUpper`)
/// are parsed by [`CostModelParams::parse_tuple`] /
/// [`CostModelParams::parse_fix_percentage`].
#[derive(Debug, Clone)]
pub struct CostModelParams {
    pub iterations: u32,
    pub p_assign: f64,
    pub w_renaming: f64,
    pub w_ancestry: f64,
    pub w_unmatched: f64,
    pub w_sibling: f64,
    pub w_order: f64,
    pub fix_random_percentage: Option<(f64, f64)>,
    pub re_match_bound: f64,
    pub seed: Option<u64>,
    pub parallel: bool,
}

impl Default for CostModelParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            p_assign: 0.9,
            w_renaming: 1.0,
            w_ancestry: 1.0,
            w_unmatched: 1.0,
            w_sibling: 1.0,
            w_order: 1.0,
            fix_random_percentage: None,
            re_match_bound: 1.5,
            seed: None,
            parallel: false,
        }
    }
}

impl CostModelParams {
    pub fn parse_tuple(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() != 7 {
            return None;
        }
        Some(Self {
            iterations: parts[0].parse().ok()?,
            p_assign: parts[1].parse().ok()?,
            w_renaming: parts[2].parse().ok()?,
            w_ancestry: parts[3].parse().ok()?,
            w_unmatched: parts[4].parse().ok()?,
            w_sibling: parts[5].parse().ok()?,
            w_order: parts[6].parse().ok()?,
            ..Self::default()
        })
    }

    pub fn parse_fix_percentage(spec: &str) -> Option<(f64, f64)> {
        let (lower, upper) = spec.split_once(',')?;
        Some((lower.trim().parse().ok()?, upper.trim().parse().ok()?))
    }

    pub fn parse_seed(spec: &str) -> Option<u64> {
        if spec.trim().eq_ignore_ascii_case("none") {
            None
        } else {
            spec.trim().parse().ok()
        }
    }
}

/// Cooperative cancellation token (spec §5), checked between major
/// phases (per-file, per-matcher iteration, per-annealing iteration).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Append-only, single-writer-discipline sink for buffered output. A
/// `Mutex` serializes writes when the cost-model matcher's parallel
/// restarts are enabled (spec §5, §9).
#[derive(Debug, Default)]
pub struct BufferedSink(Mutex<String>);

impl BufferedSink {
    pub fn write(&self, text: &str) {
        self.0.lock().expect("sink mutex poisoned").push_str(text);
    }

    pub fn snapshot(&self) -> String {
        self.0.lock().expect("sink mutex poisoned").clone()
    }
}

/// Append-only registry of scenarios that failed recoverably, keyed by
/// a scenario label (spec §7: "recorded in the crash registry keyed by
/// scenario").
#[derive(Debug, Default)]
pub struct CrashRegistry(Mutex<Vec<(String, String)>>);

impl CrashRegistry {
    pub fn record(&self, scenario: impl Into<String>, error: impl Into<String>) {
        self.0
            .lock()
            .expect("crash registry mutex poisoned")
            .push((scenario.into(), error.into()));
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.0.lock().expect("crash registry mutex poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().expect("crash registry mutex poisoned").is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MergeContext {
    pub lookahead: LookaheadTable,
    /// When on, rules 4/6/9 of the merge driver (spec §4.6) emit choice
    /// artifacts instead of conflicts.
    pub conditional_merge: bool,
    /// When `conditional_merge` is on but this is false, the
    /// choice-artifact substitution is suppressed outside method-scoped
    /// artifacts.
    pub conditional_outside_methods: bool,
    /// Recoverable errors are recorded and the driver continues with
    /// the next scenario.
    pub keep_going: bool,
    /// Overrides `keep_going`: the first failure is fatal.
    pub exit_on_error: bool,
    pub use_cost_model: bool,
    pub cost_model: CostModelParams,
    /// Kinds the parser collaborator flags as method-scoped, consulted
    /// by the merge driver when `conditional_outside_methods` is false
    /// (spec §4.6: "kind-based predicate from the parser collaborator").
    pub method_scoped_kinds: HashSet<Kind>,
    pub cancellation: CancellationToken,
    crash_registry: Arc<CrashRegistry>,
    output: Arc<BufferedSink>,
    diagnostics: Arc<BufferedSink>,
}

impl Default for MergeContext {
    fn default() -> Self {
        Self {
            lookahead: LookaheadTable::default(),
            conditional_merge: false,
            conditional_outside_methods: true,
            keep_going: false,
            exit_on_error: false,
            use_cost_model: false,
            cost_model: CostModelParams::default(),
            method_scoped_kinds: HashSet::new(),
            cancellation: CancellationToken::new(),
            crash_registry: Arc::new(CrashRegistry::default()),
            output: Arc::new(BufferedSink::default()),
            diagnostics: Arc::new(BufferedSink::default()),
        }
    }
}

impl MergeContext {
    /// Whether choice-artifact substitution applies at `kind` (spec
    /// §4.6 conditional mode): always true unless
    /// `conditional_outside_methods` narrows it to method-scoped kinds.
    pub fn choice_applies_at(&self, kind: Kind) -> bool {
        self.conditional_outside_methods || self.method_scoped_kinds.contains(&kind)
    }

    pub fn record_crash(&self, scenario: impl Into<String>, error: impl Into<String>) {
        self.crash_registry.record(scenario, error);
    }

    pub fn crash_entries(&self) -> Vec<(String, String)> {
        self.crash_registry.entries()
    }

    pub fn write_output(&self, text: &str) {
        self.output.write(text);
    }

    pub fn write_diagnostic(&self, text: &str) {
        self.diagnostics.write(text);
    }

    pub fn output_snapshot(&self) -> String {
        self.output.snapshot()
    }

    pub fn diagnostic_snapshot(&self) -> String {
        self.diagnostics.snapshot()
    }

    /// A fresh, independently-mutable view sharing this context's
    /// configuration but none of its accumulated state: used when a
    /// sub-merge (e.g. one file within a directory merge, or one pair
    /// within an n-way fold) must not observe the caller's later
    /// writes to the crash registry or sinks.
    pub fn isolated_clone(&self) -> Self {
        Self {
            lookahead: self.lookahead.clone(),
            conditional_merge: self.conditional_merge,
            conditional_outside_methods: self.conditional_outside_methods,
            keep_going: self.keep_going,
            exit_on_error: self.exit_on_error,
            use_cost_model: self.use_cost_model,
            cost_model: self.cost_model.clone(),
            method_scoped_kinds: self.method_scoped_kinds.clone(),
            cancellation: self.cancellation.clone(),
            crash_registry: Arc::new(CrashRegistry::default()),
            output: Arc::new(BufferedSink::default()),
            diagnostics: Arc::new(BufferedSink::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_parsing() {
        assert_eq!(Lookahead::parse("off"), Some(Lookahead::Off));
        assert_eq!(Lookahead::parse("FULL"), Some(Lookahead::Full));
        assert_eq!(Lookahead::parse("3"), Some(Lookahead::Bounded(3)));
        assert_eq!(Lookahead::parse("nonsense"), None);
    }

    #[test]
    fn per_kind_override_supersedes_global() {
        let table = LookaheadTable::new(Lookahead::Off).with_override(Kind("method"), Lookahead::Full);
        assert_eq!(table.get(Kind("method")), Lookahead::Full);
        assert_eq!(table.get(Kind("statement")), Lookahead::Off);
    }

    #[test]
    fn isolated_clone_has_independent_state() {
        let ctx = MergeContext::default();
        ctx.record_crash("a", "boom");
        let clone = ctx.isolated_clone();
        assert!(clone.crash_entries().is_empty());
        assert_eq!(ctx.crash_entries().len(), 1);
    }

    #[test]
    fn cost_model_tuple_parsing() {
        let params = CostModelParams::parse_tuple("100, 0.9, 1, 1, 1, 1, 1").unwrap();
        assert_eq!(params.iterations, 100);
        assert_eq!(params.p_assign, 0.9);
        assert_eq!(CostModelParams::parse_tuple("bad"), None);
        assert_eq!(CostModelParams::parse_fix_percentage("0.1,0.3"), Some((0.1, 0.3)));
        assert_eq!(CostModelParams::parse_seed("none"), None);
        assert_eq!(CostModelParams::parse_seed("42"), Some(42));
    }
}
