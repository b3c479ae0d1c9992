//! Serializes a merged [`Artifact`] tree back to text (spec §6): leaf
//! payloads concatenated in order, with conflict and choice artifacts
//! rendered as marker-delimited sections using [`DisplaySettings`].

use crate::artifact::Artifact;
use crate::settings::DisplaySettings;

/// Renders `root` to text, returning the text and the number of
/// conflict/choice sections it contains (mirrors
/// [`crate::merge_driver::MergeResult::conflict_count`] for trees that
/// were built without threading a running counter through, e.g. after
/// loading a merge result back from storage).
pub fn render(root: &Artifact<'_>, settings: &DisplaySettings) -> (String, usize) {
    let mut out = String::new();
    let mut sections = 0usize;
    write_node(root, settings, &mut out, &mut sections);
    (out, sections)
}

fn write_node(node: &Artifact<'_>, settings: &DisplaySettings, out: &mut String, sections: &mut usize) {
    let flags = node.flags();
    if flags.conflict {
        *sections += 1;
        let [left, right] = two_children(node);
        out.push_str(&settings.left_marker());
        out.push('\n');
        write_node(left, settings, out, sections);
        if settings.diff3 {
            out.push_str(&settings.base_marker());
            out.push('\n');
        }
        out.push_str(&settings.middle_marker());
        out.push('\n');
        write_node(right, settings, out, sections);
        out.push_str(&settings.right_marker());
        out.push('\n');
        return;
    }
    if flags.choice {
        *sections += 1;
        for (i, child) in node.children().iter().enumerate() {
            if i > 0 {
                out.push_str(&settings.middle_marker());
                out.push('\n');
            }
            write_node(child, settings, out, sections);
        }
        return;
    }
    if let Some(payload) = node.payload {
        out.push_str(payload);
        return;
    }
    for child in node.children() {
        write_node(child, settings, out, sections);
    }
}

/// A conflict artifact always has exactly two content children (spec
/// §3 invariant); an empty placeholder still counts as one.
fn two_children<'a, 'b>(node: &'b Artifact<'a>) -> [&'b Artifact<'a>; 2] {
    let children = node.children();
    [children[0], children[1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactFlags, Kind, Revision};
    use crate::test_utils::ArenaCtx;

    #[test]
    fn renders_plain_tree_as_concatenated_payloads() {
        let ctx = ArenaCtx::new();
        let a = ctx.leaf(Revision::Merge, Kind("stmt"), "x = 1\n");
        let b = ctx.leaf(Revision::Merge, Kind("stmt"), "y = 2\n");
        let root = ctx.node(Revision::Merge, Kind("block"), vec![a, b], false);
        let (text, sections) = render(root, &DisplaySettings::default());
        assert_eq!(text, "x = 1\ny = 2\n");
        assert_eq!(sections, 0);
    }

    #[test]
    fn renders_conflict_with_markers() {
        let ctx = ArenaCtx::new();
        let left = ctx.leaf(Revision::Merge, Kind("stmt"), "a\n");
        let right = ctx.leaf(Revision::Merge, Kind("stmt"), "b\n");
        let conflict = ctx.node(Revision::Merge, Kind("stmt"), vec![left, right], false);
        conflict.set_flags(ArtifactFlags { conflict: true, ..ArtifactFlags::default() });
        let (text, sections) = render(conflict, &DisplaySettings::default());
        assert_eq!(text, "<<<LEFT\na\n====\nb\n>>>RIGHT\n");
        assert_eq!(sections, 1);
    }
}
