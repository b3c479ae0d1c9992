//! The parser collaborator contract (spec §6): `parse(file_bytes,
//! revision) → Artifact | ParseError`. The core treats the resulting
//! tree as opaque beyond the [`crate::artifact::Artifact`] contract;
//! this module also ships a small JSON/Rust demo implementation built
//! on `tree-sitter`, grounding the contract in a real parser without
//! committing the core to any one language.

use std::collections::HashSet;

use tree_sitter::{Node, Parser as TsParser};
use typed_arena::Arena;

use crate::artifact::{Artifact, IdGen, Kind, Revision};
use crate::errors::{MergeError, Result};

/// Per-kind capabilities a parser collaborator declares about the
/// grammar it produces artifacts for (spec §4.1 "the kind determines
/// whether child order is semantically significant"; spec §4.6
/// "kind-based predicate from the parser collaborator").
pub trait KindProfile {
    fn is_unordered(&self, kind: Kind) -> bool;
    fn is_method_scoped(&self, kind: Kind) -> bool;
}

/// A profile with no unordered kinds and no method-scoped kinds; a
/// reasonable default for grammars that don't distinguish either.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatProfile;

impl KindProfile for FlatProfile {
    fn is_unordered(&self, _kind: Kind) -> bool {
        false
    }

    fn is_method_scoped(&self, _kind: Kind) -> bool {
        false
    }
}

/// A profile for a small demo JSON grammar: object members are
/// order-insignificant (spec §4.1's "set-valued children" case); JSON
/// has no method-scoped construct.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProfile;

impl KindProfile for JsonProfile {
    fn is_unordered(&self, kind: Kind) -> bool {
        kind.0 == "object"
    }

    fn is_method_scoped(&self, _kind: Kind) -> bool {
        false
    }
}

/// A profile for a small demo Rust grammar, just enough to exercise
/// the method-scoped predicate that conditional merging consults.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustProfile;

impl KindProfile for RustProfile {
    fn is_unordered(&self, kind: Kind) -> bool {
        kind.0 == "use_list" || kind.0 == "field_declaration_list"
    }

    fn is_method_scoped(&self, kind: Kind) -> bool {
        kind.0 == "function_item"
    }
}

/// Parses `contents` with `language`'s tree-sitter grammar and lowers
/// the resulting concrete syntax tree into an [`Artifact`] tree tagged
/// `revision`, using `profile` to decide each node kind's ordering.
///
/// Named (non-anonymous) tree-sitter nodes become inner artifacts;
/// leaf/terminal nodes without named children carry the underlying
/// source slice as their payload.
pub fn parse<'a>(
    language: tree_sitter::Language,
    profile: &dyn KindProfile,
    contents: &'a str,
    revision: Revision,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
) -> Result<&'a Artifact<'a>> {
    let mut parser = TsParser::new();
    parser.set_language(&language).map_err(|e| MergeError::ParseFailure {
        revision: revision.to_string(),
        message: e.to_string(),
    })?;
    let tree = parser.parse(contents, None).ok_or_else(|| MergeError::ParseFailure {
        revision: revision.to_string(),
        message: "tree-sitter returned no tree".to_string(),
    })?;
    if tree.root_node().has_error() {
        return Err(MergeError::ParseFailure {
            revision: revision.to_string(),
            message: "syntax error in input".to_string(),
        });
    }
    Ok(lower(tree.root_node(), contents, profile, revision, arena, id_gen))
}

fn lower<'a>(
    node: Node,
    source: &'a str,
    profile: &dyn KindProfile,
    revision: Revision,
    arena: &'a Arena<Artifact<'a>>,
    id_gen: &IdGen,
) -> &'a Artifact<'a> {
    let kind = Kind(leak_kind_name(node.kind()));
    let named_children: Vec<Node> = {
        let mut cursor = node.walk();
        node.named_children(&mut cursor).collect()
    };

    if named_children.is_empty() {
        let text = &source[node.byte_range()];
        return Artifact::new(arena, id_gen, revision, kind, Vec::new(), Some(text), false);
    }

    let children = named_children
        .into_iter()
        .map(|child| lower(child, source, profile, revision, arena, id_gen))
        .collect();
    Artifact::new(arena, id_gen, revision, kind, children, None, profile.is_unordered(kind))
}

/// Tree-sitter node kind strings are `'static` in practice (interned by
/// the grammar), but the crate API only hands back a borrowed `&str`
/// tied to the node; leaking once per distinct kind name keeps
/// [`Kind`] as the cheap `Copy` tag the rest of the core assumes.
fn leak_kind_name(name: &str) -> &'static str {
    thread_local! {
        static INTERNED: std::cell::RefCell<HashSet<&'static str>> = std::cell::RefCell::new(HashSet::new());
    }
    INTERNED.with(|cache| {
        if let Some(existing) = cache.borrow().get(name) {
            return existing;
        }
        let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
        cache.borrow_mut().insert(leaked);
        leaked
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json_object() {
        let arena = Arena::new();
        let id_gen = IdGen::new();
        let language = tree_sitter_json::LANGUAGE.into();
        let artifact =
            parse(language, &JsonProfile, "{\"a\": 1}", Revision::Left, &arena, &id_gen).unwrap();
        assert_eq!(artifact.kind, Kind("document"));
    }

    #[test]
    fn surfaces_parse_failure_on_syntax_error() {
        let arena = Arena::new();
        let id_gen = IdGen::new();
        let language = tree_sitter_json::LANGUAGE.into();
        let result = parse(language, &JsonProfile, "{\"a\": ", Revision::Left, &arena, &id_gen);
        assert!(matches!(result, Err(MergeError::ParseFailure { .. })));
    }

    #[test]
    fn rust_profile_marks_use_lists_unordered_and_functions_method_scoped() {
        let arena = Arena::new();
        let id_gen = IdGen::new();
        let language = tree_sitter_rust::LANGUAGE.into();
        let source = "use std::fmt;\nfn main() {}\n";
        let artifact = parse(language, &RustProfile, source, Revision::Left, &arena, &id_gen).unwrap();
        let has_method_scoped_descendant =
            artifact.dfs().any(|node| RustProfile.is_method_scoped(node.kind));
        assert!(has_method_scoped_descendant);
    }
}
