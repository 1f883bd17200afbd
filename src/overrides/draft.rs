use crate::security::WILDCARD;
use crate::security::sanitize::{ToolDisabledMap, merge_tool_ids};
use serde::{Deserialize, Serialize};

/// Which override set an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideTarget {
    Add,
    Remove,
}

/// A single operator edit, replayable against any draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Toggle { target: OverrideTarget, path: String },
    SetAllAccess(bool),
    SetAllRemoved(bool),
    AddTools { page_key: String, raw: String },
    RemoveTool { page_key: String, tool_id: String },
}

/// Editable add/remove page sets and disabled-tool map for one subject.
///
/// Edits keep `add` and `remove` disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDraft {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub tools: ToolDisabledMap,
}

impl OverrideDraft {
    /// Apply an edit. Returns `false` when the draft is unchanged.
    pub fn apply(&mut self, edit: &DraftEdit) -> bool {
        match edit {
            DraftEdit::Toggle { target, path } => {
                self.toggle_override(*target, path);
                true
            }
            DraftEdit::SetAllAccess(enabled) => self.set_all_access(*enabled),
            DraftEdit::SetAllRemoved(enabled) => self.set_all_removed(*enabled),
            DraftEdit::AddTools { page_key, raw } => self.add_tools_to_page(page_key, raw),
            DraftEdit::RemoveTool { page_key, tool_id } => {
                self.remove_tool_from_page(page_key, tool_id)
            }
        }
    }

    /// Flip membership of `path` in `target`; adding it evicts it from the other set.
    pub fn toggle_override(&mut self, target: OverrideTarget, path: &str) {
        let (set, other) = self.sets_mut(target);
        if let Some(index) = set.iter().position(|entry| entry == path) {
            set.remove(index);
        } else {
            set.push(path.to_string());
            other.retain(|entry| entry != path);
        }
    }

    pub fn set_all_access(&mut self, enabled: bool) -> bool {
        self.set_wildcard(OverrideTarget::Add, enabled)
    }

    pub fn set_all_removed(&mut self, enabled: bool) -> bool {
        self.set_wildcard(OverrideTarget::Remove, enabled)
    }

    fn set_wildcard(&mut self, target: OverrideTarget, enabled: bool) -> bool {
        let (set, other) = self.sets_mut(target);
        let present = set.iter().any(|entry| entry == WILDCARD);
        if enabled {
            let other_len = other.len();
            other.retain(|entry| entry != WILDCARD);
            if !present {
                set.push(WILDCARD.to_string());
            }
            !present || other.len() != other_len
        } else {
            set.retain(|entry| entry != WILDCARD);
            present
        }
    }

    /// Parse `raw` and merge the ids into the page's list.
    pub fn add_tools_to_page(&mut self, page_key: &str, raw: &str) -> bool {
        let existing = self.tools.get(page_key).map_or(&[][..], Vec::as_slice);
        let merged = merge_tool_ids(existing, raw);
        if merged.as_slice() == existing {
            return false;
        }
        self.tools.insert(page_key.to_string(), merged);
        true
    }

    /// Drop one id; the page key goes away with its last tool.
    pub fn remove_tool_from_page(&mut self, page_key: &str, tool_id: &str) -> bool {
        let Some(tools) = self.tools.get_mut(page_key) else {
            return false;
        };
        let before = tools.len();
        tools.retain(|tool| tool != tool_id);
        let changed = tools.len() != before;
        if tools.is_empty() {
            self.tools.remove(page_key);
        }
        changed
    }

    /// Trimmed, non-empty, deduplicated copy of both page sets.
    pub fn normalized(&self) -> Self {
        Self {
            add: normalize_patterns(&self.add),
            remove: normalize_patterns(&self.remove),
            tools: self.tools.clone(),
        }
    }

    /// Patterns present in both `add` and `remove`, in `add` order.
    pub fn overlapping_patterns(&self) -> Vec<String> {
        self.add
            .iter()
            .filter(|pattern| self.remove.contains(*pattern))
            .cloned()
            .collect()
    }

    fn sets_mut(&mut self, target: OverrideTarget) -> (&mut Vec<String>, &mut Vec<String>) {
        match target {
            OverrideTarget::Add => (&mut self.add, &mut self.remove),
            OverrideTarget::Remove => (&mut self.remove, &mut self.add),
        }
    }
}

fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(patterns.len());
    for pattern in patterns.iter().map(|pattern| pattern.trim()) {
        if !pattern.is_empty() && !out.iter().any(|existing| existing == pattern) {
            out.push(pattern.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut draft = OverrideDraft::default();
        draft.toggle_override(OverrideTarget::Add, "/dashboard/metas");
        assert_eq!(draft.add, strings(&["/dashboard/metas"]));
        draft.toggle_override(OverrideTarget::Add, "/dashboard/metas");
        assert!(draft.add.is_empty());
    }

    #[test]
    fn toggle_into_one_set_evicts_from_the_other() {
        let mut draft = OverrideDraft {
            add: strings(&["/dashboard/metas", "/dashboard/agenda"]),
            ..OverrideDraft::default()
        };
        draft.toggle_override(OverrideTarget::Remove, "/dashboard/metas");
        assert_eq!(draft.add, strings(&["/dashboard/agenda"]));
        assert_eq!(draft.remove, strings(&["/dashboard/metas"]));
        assert!(draft.overlapping_patterns().is_empty());
    }

    #[test]
    fn wildcards_are_mutually_exclusive() {
        let mut draft = OverrideDraft::default();
        assert!(draft.set_all_removed(true));
        assert!(draft.set_all_access(true));
        assert_eq!(draft.add, strings(&["*"]));
        assert!(draft.remove.is_empty());

        assert!(!draft.set_all_access(true));
        assert!(draft.set_all_access(false));
        assert!(draft.add.is_empty());
        assert!(!draft.set_all_access(false));
    }

    #[test]
    fn wildcard_does_not_touch_specific_entries() {
        let mut draft = OverrideDraft {
            remove: strings(&["/dashboard/metas"]),
            ..OverrideDraft::default()
        };
        draft.set_all_access(true);
        assert_eq!(draft.remove, strings(&["/dashboard/metas"]));
    }

    #[test]
    fn add_tools_merges_through_sanitizer() {
        let mut draft = OverrideDraft::default();
        assert!(draft.add_tools_to_page("/dashboard/metas", "export, share"));
        assert!(draft.add_tools_to_page("/dashboard/metas", "share\nprint"));
        assert_eq!(
            draft.tools["/dashboard/metas"],
            strings(&["export", "share", "print"])
        );
        assert!(!draft.add_tools_to_page("/dashboard/metas", " , export"));
        assert!(!draft.add_tools_to_page("/dashboard/agenda", "  "));
        assert!(!draft.tools.contains_key("/dashboard/agenda"));
    }

    #[test]
    fn removing_last_tool_drops_the_key() {
        let mut draft = OverrideDraft::default();
        draft.add_tools_to_page("*", "a,b");
        assert!(draft.remove_tool_from_page("*", "a"));
        assert_eq!(draft.tools["*"], strings(&["b"]));
        assert!(draft.remove_tool_from_page("*", "b"));
        assert!(!draft.tools.contains_key("*"));
        assert!(!draft.remove_tool_from_page("*", "b"));
    }

    #[test]
    fn normalized_trims_and_dedupes() {
        let draft = OverrideDraft {
            add: strings(&[" /dashboard/metas ", "/dashboard/metas", ""]),
            remove: strings(&["*", "*"]),
            tools: ToolDisabledMap::new(),
        };
        let normalized = draft.normalized();
        assert_eq!(normalized.add, strings(&["/dashboard/metas"]));
        assert_eq!(normalized.remove, strings(&["*"]));
    }

    #[test]
    fn overlap_detection_reports_shared_patterns() {
        let draft = OverrideDraft {
            add: strings(&["/dashboard/metas", "*"]),
            remove: strings(&["*"]),
            tools: ToolDisabledMap::new(),
        };
        assert_eq!(draft.overlapping_patterns(), strings(&["*"]));
    }

    #[test]
    fn apply_dispatches_edits() {
        let mut draft = OverrideDraft::default();
        assert!(draft.apply(&DraftEdit::Toggle {
            target: OverrideTarget::Add,
            path: "/dashboard/metas".into(),
        }));
        assert!(draft.apply(&DraftEdit::AddTools {
            page_key: "*".into(),
            raw: "x".into(),
        }));
        assert!(draft.apply(&DraftEdit::RemoveTool {
            page_key: "*".into(),
            tool_id: "x".into(),
        }));
        assert!(!draft.apply(&DraftEdit::SetAllRemoved(false)));
        assert_eq!(draft.add, strings(&["/dashboard/metas"]));
        assert!(draft.tools.is_empty());
    }
}
