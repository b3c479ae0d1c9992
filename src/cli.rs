//! Library-side CLI glue (spec §6, SPEC_FULL §2): binds file paths to
//! a [`MergeScenario`] and invokes the strategy dispatcher, kept here
//! rather than in `bin/synmerge.rs` so it is testable without a
//! process boundary, mirroring `mergiraf`'s `main.rs`/`merge.rs` split.

use std::path::{Path, PathBuf};

use typed_arena::Arena;

use crate::artifact::{Artifact, IdGen, Revision};
use crate::context::MergeContext;
use crate::errors::Result;
use crate::file_artifact::FileArtifact;
use crate::parser::{self, JsonProfile, KindProfile};
use crate::render;
use crate::scenario::MergeScenario;
use crate::settings::DisplaySettings;
use crate::strategy::{self, DispatchResult, Strategy};

/// The outcome of a `merge` invocation: the text to write out, the
/// number of conflicts (or choices) it contains, and whether any were
/// found at all (the CLI uses this to pick its exit code, following
/// Git's own merge-driver convention of a non-zero status on conflict).
pub struct MergeOutcome {
    pub contents: String,
    pub conflict_count: usize,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        self.conflict_count > 0
    }
}

/// Arguments for a three-way file merge, already resolved from CLI
/// flags into owned values (spec §6's external interface).
pub struct MergeArgs {
    pub base: PathBuf,
    pub left: PathBuf,
    pub right: PathBuf,
    pub strategy: Strategy,
    pub settings: DisplaySettings,
}

/// Reads `args.base`/`left`/`right` from disk, parses them with the
/// built-in JSON demo profile (SPEC_FULL §1: "demonstration plumbing,
/// not part of the core's size budget"), and dispatches through
/// `args.strategy`. Falls back to the line merger for any revision
/// whose path doesn't look like JSON, so the CLI stays usable on
/// arbitrary text files even without a real language grammar wired up.
pub fn run_merge(args: &MergeArgs, ctx: &MergeContext) -> Result<MergeOutcome> {
    let base_file = FileArtifact::new(&args.base);
    let left_file = FileArtifact::new(&args.left);
    let right_file = FileArtifact::new(&args.right);

    let base_text = base_file.read()?;
    let left_text = left_file.read()?;
    let right_text = right_file.read()?;

    if args.strategy == Strategy::LineBased || !looks_like_json(&args.base) {
        let result =
            crate::line_merge::line_merge(&base_text, &left_text, &right_text, &args.settings);
        return Ok(MergeOutcome { contents: result.contents, conflict_count: result.conflict_count });
    }

    let arena: Arena<Artifact> = Arena::new();
    let id_gen = IdGen::new();
    let profile = JsonProfile;
    let language: tree_sitter::Language = tree_sitter_json::LANGUAGE.into();

    // Leaked once per revision up front so the closure below can hand
    // `combined_with_fallback` a reference tied to the arena's own
    // lifetime rather than the short-lived local `String`s.
    let leaked_base: &str = Box::leak(base_text.clone().into_boxed_str());
    let leaked_left: &str = Box::leak(left_text.clone().into_boxed_str());
    let leaked_right: &str = Box::leak(right_text.clone().into_boxed_str());

    if args.strategy == Strategy::Combined {
        let outcome = strategy::combined_with_fallback(
            (&base_text, &left_text, &right_text),
            |revision, _text| {
                let source = match revision {
                    Revision::Base => leaked_base,
                    Revision::Left => leaked_left,
                    _ => leaked_right,
                };
                parser::parse(language, &profile as &dyn KindProfile, source, revision, &arena, &id_gen)
            },
            &arena,
            &id_gen,
            ctx,
            &args.settings,
        )?;
        return Ok(render_dispatch(outcome, &args.settings));
    }

    let base = parser::parse(language, &profile as &dyn KindProfile, leaked_base, Revision::Base, &arena, &id_gen)?;
    let left = parser::parse(language, &profile as &dyn KindProfile, leaked_left, Revision::Left, &arena, &id_gen)?;
    let right =
        parser::parse(language, &profile as &dyn KindProfile, leaked_right, Revision::Right, &arena, &id_gen)?;
    let scenario = MergeScenario::three_way(base, left, right);
    let outcome = strategy::dispatch(args.strategy, &scenario, &arena, &id_gen, ctx, &args.settings)?;
    Ok(render_dispatch(outcome, &args.settings))
}

fn render_dispatch(outcome: DispatchResult<'_>, settings: &DisplaySettings) -> MergeOutcome {
    match outcome {
        DispatchResult::Line(result) => {
            MergeOutcome { contents: result.contents, conflict_count: result.conflict_count }
        }
        DispatchResult::Structured(result) => {
            let (contents, _) = render::render(result.root, settings);
            MergeOutcome { contents, conflict_count: result.conflict_count }
        }
    }
}

fn looks_like_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn merges_unrelated_text_changes_without_conflict() {
        let base = write_temp("a\nb\nc\n");
        let left = write_temp("a\nb2\nc\n");
        let right = write_temp("a\nb\nc2\n");
        let args = MergeArgs {
            base: base.path().to_path_buf(),
            left: left.path().to_path_buf(),
            right: right.path().to_path_buf(),
            strategy: Strategy::LineBased,
            settings: DisplaySettings::default(),
        };
        let outcome = run_merge(&args, &MergeContext::default()).unwrap();
        assert_eq!(outcome.contents, "a\nb2\nc2\n");
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn missing_input_surfaces_as_typed_error() {
        let args = MergeArgs {
            base: PathBuf::from("/nonexistent/base.txt"),
            left: PathBuf::from("/nonexistent/left.txt"),
            right: PathBuf::from("/nonexistent/right.txt"),
            strategy: Strategy::LineBased,
            settings: DisplaySettings::default(),
        };
        let result = run_merge(&args, &MergeContext::default());
        assert!(matches!(result, Err(crate::errors::MergeError::InputMissing(_))));
    }
}
