//! Boundary where admin-authored free text becomes a validated tool policy.

mod constants;
mod tools;

pub use tools::{
    ToolDisabledMap, is_valid_page_key, merge_tool_ids, normalize_tool_id_list,
    normalize_tool_ids, normalize_tools_disabled_by_page, sanitize_tool_map,
};
