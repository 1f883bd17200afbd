use super::types::{DASHBOARD_ROOT, NEUTRAL_PAGE, WILDCARD, WORKFLOW_PAGE};

/// Canonicalize a route to the page id that carries its permissions.
///
/// Every workflow editor route collapses onto the workflow listing page.
pub fn normalize_page_path(path: &str) -> &str {
    if path == WORKFLOW_PAGE
        || path
            .strip_prefix(WORKFLOW_PAGE)
            .is_some_and(|rest| rest.starts_with('/'))
    {
        WORKFLOW_PAGE
    } else {
        path
    }
}

pub fn is_neutral_page(normalized_path: &str) -> bool {
    normalized_path == NEUTRAL_PAGE
}

pub fn has_wildcard(patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| pattern == WILDCARD)
}

/// Segment-aware prefix match of a normalized path against a page id.
///
/// The dashboard root only matches itself; otherwise it would swallow every page.
pub fn path_matches(normalized_path: &str, page_id: &str) -> bool {
    if page_id == DASHBOARD_ROOT {
        return normalized_path == DASHBOARD_ROOT;
    }

    normalized_path == page_id
        || normalized_path
            .strip_prefix(page_id)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub(super) fn matches_any(normalized_path: &str, patterns: &[String]) -> bool {
    has_wildcard(patterns)
        || patterns
            .iter()
            .any(|pattern| path_matches(normalized_path, pattern))
}

/// True when an admin removal covers `path`. The neutral page is never blocked.
pub fn is_path_blocked_by_admin(path: &str, merged_removes: &[String]) -> bool {
    let normalized = normalize_page_path(path);
    if is_neutral_page(normalized) {
        return false;
    }
    matches_any(normalized, merged_removes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    #[test]
    fn workflow_sub_routes_collapse_to_listing_page() {
        assert_eq!(normalize_page_path("/dashboard/workflow"), WORKFLOW_PAGE);
        assert_eq!(normalize_page_path("/dashboard/workflow/abc"), WORKFLOW_PAGE);
        assert_eq!(
            normalize_page_path("/dashboard/workflow/abc/edit"),
            WORKFLOW_PAGE
        );
    }

    #[test]
    fn lookalike_workflow_prefix_is_left_alone() {
        assert_eq!(
            normalize_page_path("/dashboard/workflows"),
            "/dashboard/workflows"
        );
        assert_eq!(normalize_page_path("/dashboard/metas"), "/dashboard/metas");
        assert_eq!(normalize_page_path(""), "");
    }

    #[test]
    fn dashboard_root_matches_only_itself() {
        assert!(path_matches("/dashboard", "/dashboard"));
        assert!(!path_matches("/dashboard/sorteios", "/dashboard"));
    }

    #[test]
    fn page_ids_match_their_sub_pages_by_segment() {
        assert!(path_matches("/dashboard/sorteios", "/dashboard/sorteios"));
        assert!(path_matches("/dashboard/sorteios/novo", "/dashboard/sorteios"));
        assert!(!path_matches("/dashboard/sorteios-extra", "/dashboard/sorteios"));
    }

    #[test]
    fn wildcard_detection() {
        assert!(has_wildcard(&patterns(&["/dashboard", "*"])));
        assert!(!has_wildcard(&patterns(&["/dashboard"])));
        assert!(!has_wildcard(&[]));
    }

    #[test]
    fn admin_block_respects_neutral_page() {
        let removes = patterns(&["*"]);
        assert!(is_path_blocked_by_admin("/dashboard/metas", &removes));
        assert!(!is_path_blocked_by_admin(NEUTRAL_PAGE, &removes));
    }

    #[test]
    fn admin_block_applies_to_workflow_editor_routes() {
        let removes = patterns(&["/dashboard/workflow"]);
        assert!(is_path_blocked_by_admin("/dashboard/workflow/doc-42", &removes));
        assert!(!is_path_blocked_by_admin("/dashboard/metas", &removes));
    }
}
