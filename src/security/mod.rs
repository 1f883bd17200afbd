pub mod policy;
pub mod sanitize;

pub use policy::{
    AccessContext, DenyReason, NEUTRAL_PAGE, PageAccess, Role, WILDCARD, can_use_tool,
    compute_deny_reason, compute_page_tools_enabled, normalize_page_path, resolve_page_access,
};
pub use sanitize::{
    ToolDisabledMap, merge_tool_ids, normalize_tool_id_list, normalize_tools_disabled_by_page,
    sanitize_tool_map,
};
