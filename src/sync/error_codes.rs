use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use strum::EnumString;

/// Machine error codes returned by the override mutation endpoint.
///
/// Unknown codes are kept verbatim in [`MutationErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MutationErrorCode {
    NotAuthenticated,
    InvalidAuth,
    Forbidden,
    OverlappingPermissions,
    AllowedPagesAddRemoveOverlap,
    InvalidDashboardPath,
    InvalidToolOverrides,
    MissingBody,
    InvalidJson,
    InvalidBody,
    MissingUserId,
    MissingTeamId,
    UserNotFound,
    ProfileUpdateFailed,
    RateLimited,
    RateLimitUnavailable,
    InternalError,
    #[strum(default)]
    Other(String),
}

impl MutationErrorCode {
    pub fn from_code(code: &str) -> Self {
        code.parse()
            .unwrap_or_else(|_| Self::Other(code.to_string()))
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::InvalidAuth => "invalid_auth",
            Self::Forbidden => "forbidden",
            Self::OverlappingPermissions => "overlapping_permissions",
            Self::AllowedPagesAddRemoveOverlap => "allowed_pages_add_remove_overlap",
            Self::InvalidDashboardPath => "invalid_dashboard_path",
            Self::InvalidToolOverrides => "invalid_tool_overrides",
            Self::MissingBody => "missing_body",
            Self::InvalidJson => "invalid_json",
            Self::InvalidBody => "invalid_body",
            Self::MissingUserId => "missing_user_id",
            Self::MissingTeamId => "missing_team_id",
            Self::UserNotFound => "user_not_found",
            Self::ProfileUpdateFailed => "profile_update_failed",
            Self::RateLimited => "rate_limited",
            Self::RateLimitUnavailable => "rate_limit_unavailable",
            Self::InternalError => "internal_error",
            Self::Other(code) => code,
        }
    }

    /// Text shown to the operator. Unmapped codes are shown as-is.
    pub fn user_message(&self) -> Cow<'_, str> {
        let message = match self {
            Self::NotAuthenticated => "Your session has expired. Sign in again to keep editing.",
            Self::InvalidAuth => "Your session is no longer valid. Sign in again.",
            Self::Forbidden => "Only administrators can change access overrides.",
            Self::OverlappingPermissions | Self::AllowedPagesAddRemoveOverlap => {
                "A page cannot be granted and revoked at the same time."
            }
            Self::InvalidDashboardPath => "One of the selected pages is not a dashboard page.",
            Self::InvalidToolOverrides => "The disabled tool list is invalid.",
            Self::MissingBody | Self::InvalidJson | Self::InvalidBody => {
                "The server could not read the request."
            }
            Self::MissingUserId => "No user is selected.",
            Self::MissingTeamId => "No team is selected.",
            Self::UserNotFound => "The selected user no longer exists.",
            Self::ProfileUpdateFailed => "The server could not save the changes.",
            Self::RateLimited => "Too many changes in a short time. Wait a moment and try again.",
            Self::RateLimitUnavailable => "Saving is temporarily unavailable. Try again shortly.",
            Self::InternalError => "Unexpected server error. Try again.",
            Self::Other(code) => return Cow::Borrowed(code),
        };
        Cow::Borrowed(message)
    }
}

impl fmt::Display for MutationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for MutationErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for MutationErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

/// Failed override mutation, as reported by the endpoint or the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    pub code: MutationErrorCode,
    pub details: Option<String>,
}

impl MutationError {
    pub fn new(code: MutationErrorCode) -> Self {
        Self {
            code,
            details: None,
        }
    }

    pub fn with_details(code: MutationErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: Some(details.into()),
        }
    }

    pub fn user_message(&self) -> Cow<'_, str> {
        self.code.user_message()
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {details}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for MutationError {}
