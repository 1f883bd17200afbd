use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Pattern that matches every dashboard page in the set it appears in.
pub const WILDCARD: &str = "*";

/// Root dashboard page. Only matches itself, never its sub-pages.
pub const DASHBOARD_ROOT: &str = "/dashboard";

/// Always reachable so a locked-out subject can still fix billing or profile issues.
pub const NEUTRAL_PAGE: &str = "/dashboard/settings";

/// Listing page whose editor sub-routes share its permission scope.
pub const WORKFLOW_PAGE: &str = "/dashboard/workflow";

/// Role of the subject being evaluated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Why a page is not reachable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DenyReason {
    TrialExpired,
    BlockedByAdmin,
    NotInPlan,
}

/// Outcome of the page-level decision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Enabled,
    Denied(DenyReason),
}

impl PageAccess {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Self::Enabled => None,
            Self::Denied(reason) => Some(reason),
        }
    }
}

/// Everything the decision engine needs about one subject, borrowed from the caller.
///
/// `merged_adds` / `merged_removes` are the user and team overrides after the
/// upstream merge. `plan_allowed_pages == None` means the plan is unrestricted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessContext<'a> {
    pub role: Option<Role>,
    pub plan_allowed_pages: Option<&'a [String]>,
    pub merged_adds: &'a [String],
    pub merged_removes: &'a [String],
    pub globally_blocked: bool,
}
