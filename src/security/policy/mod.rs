mod decision;
mod path;
mod types;

pub use decision::{
    can_use_tool, compute_deny_reason, compute_page_tools_enabled, resolve_page_access,
};
pub use path::{
    has_wildcard, is_neutral_page, is_path_blocked_by_admin, normalize_page_path, path_matches,
};
pub use types::{
    AccessContext, DASHBOARD_ROOT, DenyReason, NEUTRAL_PAGE, PageAccess, Role, WILDCARD,
    WORKFLOW_PAGE,
};
