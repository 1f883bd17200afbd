use super::path::{is_neutral_page, is_path_blocked_by_admin, matches_any, normalize_page_path};
use super::types::{AccessContext, DenyReason, PageAccess, Role, WILDCARD};
use crate::security::sanitize::ToolDisabledMap;

/// Page-level decision tree. Rules are evaluated in order; the first that
/// applies decides.
///
/// 1. absent role or admin: enabled
/// 2. neutral page: enabled
/// 3. removed by an admin override: `blocked_by_admin`
/// 4. globally blocked: enabled only through an admin add, else `trial_expired`
/// 5. admin add: enabled
/// 6. plan pages (unrestricted when absent) plus adds: enabled or `not_in_plan`
pub fn resolve_page_access(ctx: &AccessContext<'_>, path: &str) -> PageAccess {
    if matches!(ctx.role, None | Some(Role::Admin)) {
        return PageAccess::Enabled;
    }

    let normalized = normalize_page_path(path);
    if is_neutral_page(normalized) {
        return PageAccess::Enabled;
    }

    if is_path_blocked_by_admin(normalized, ctx.merged_removes) {
        return PageAccess::Denied(DenyReason::BlockedByAdmin);
    }

    let admin_allowed = matches_any(normalized, ctx.merged_adds);

    if ctx.globally_blocked {
        return if admin_allowed {
            PageAccess::Enabled
        } else {
            PageAccess::Denied(DenyReason::TrialExpired)
        };
    }

    if admin_allowed {
        return PageAccess::Enabled;
    }

    if plan_allows(ctx, normalized) {
        PageAccess::Enabled
    } else {
        PageAccess::Denied(DenyReason::NotInPlan)
    }
}

fn plan_allows(ctx: &AccessContext<'_>, normalized: &str) -> bool {
    ctx.plan_allowed_pages
        .is_none_or(|plan| matches_any(normalized, plan))
        || matches_any(normalized, ctx.merged_adds)
}

/// Whether the page at `path` is usable at all.
pub fn compute_page_tools_enabled(ctx: &AccessContext<'_>, path: &str) -> bool {
    resolve_page_access(ctx, path).is_enabled()
}

/// Failure label of the same decision tree; `None` exactly when the page is enabled.
pub fn compute_deny_reason(ctx: &AccessContext<'_>, path: &str) -> Option<DenyReason> {
    resolve_page_access(ctx, path).deny_reason()
}

/// Tool-level gate on top of the page decision.
///
/// Admins and the neutral page skip tool checks entirely. Otherwise a tool is
/// denied when its page is denied, or when the tool id is listed for the page
/// or for the wildcard key.
pub fn can_use_tool(
    ctx: &AccessContext<'_>,
    path: &str,
    tools_disabled_by_page: &ToolDisabledMap,
    tool_id: Option<&str>,
) -> bool {
    let normalized = normalize_page_path(path);
    if ctx.role == Some(Role::Admin) || is_neutral_page(normalized) {
        return true;
    }

    if !compute_page_tools_enabled(ctx, normalized) {
        return false;
    }

    let Some(tool_id) = tool_id else {
        return true;
    };

    let listed = |key: &str| {
        tools_disabled_by_page
            .get(key)
            .is_some_and(|tools| tools.iter().any(|tool| tool == tool_id))
    };
    !(listed(normalized) || listed(WILDCARD))
}
