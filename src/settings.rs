//! Output formatting settings (spec §6): conflict marker shape and
//! revision display names. Directly modeled on `mergiraf`'s
//! `DisplaySettings`.

/// Parameters controlling how conflicts and choice nodes are rendered.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Whether to include the BASE section in textual conflicts
    /// (diff3-style) or only LEFT/RIGHT (merge-style).
    pub diff3: bool,
    /// The number of characters used for conflict markers (7 by
    /// default, matching Git's own convention).
    pub conflict_marker_size: usize,
    pub left_revision_name: String,
    pub base_revision_name: String,
    pub right_revision_name: String,
}

impl DisplaySettings {
    /// The marker at the beginning of the LEFT part of a conflict. Per
    /// the literal scenario in spec §8 (S2), the revision name is
    /// butted directly against the bracket characters, with no space.
    pub fn left_marker(&self) -> String {
        format!("{}{}", "<".repeat(self.conflict_marker_size), self.left_revision_name)
    }

    /// The marker at the beginning of the BASE part of a conflict
    /// (only emitted when `diff3` is set).
    pub fn base_marker(&self) -> String {
        format!("{}{}", "|".repeat(self.conflict_marker_size), self.base_revision_name)
    }

    /// The marker separating LEFT (or BASE) from RIGHT. One character
    /// wider than the left/right brackets, again matching S2 literally
    /// (`<<<` / `====` / `>>>`).
    pub fn middle_marker(&self) -> String {
        "=".repeat(self.conflict_marker_size + 1)
    }

    /// The marker at the end of the RIGHT part of a conflict.
    pub fn right_marker(&self) -> String {
        format!("{}{}", ">".repeat(self.conflict_marker_size), self.right_revision_name)
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            diff3: false,
            conflict_marker_size: 3,
            left_revision_name: "LEFT".to_string(),
            base_revision_name: "BASE".to_string(),
            right_revision_name: "RIGHT".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_match_spec_scenario_s2() {
        let settings = DisplaySettings::default();
        assert_eq!(settings.left_marker(), "<<<LEFT");
        assert_eq!(settings.middle_marker(), "====");
        assert_eq!(settings.right_marker(), ">>>RIGHT");
    }
}
