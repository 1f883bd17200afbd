use super::error_codes::MutationError;
use crate::error::RpcError;
use crate::overrides::{OverrideDraft, SubjectRef};
use crate::security::sanitize::{ToolDisabledMap, normalize_tools_disabled_by_page};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Body of an override mutation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideMutationRequest {
    pub subject_id: String,
    pub overrides: OverridePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridePayload {
    pub allowed_pages_add: Vec<String>,
    pub allowed_pages_remove: Vec<String>,
    pub tools_disabled_by_page: ToolDisabledMap,
}

/// Either the updated profile or a machine error code.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OverrideMutationResponse {
    Failed {
        error: String,
        #[serde(default)]
        details: Option<String>,
    },
    Updated {
        profile: ProfilePayload,
    },
}

impl OverrideMutationResponse {
    pub fn into_result(self) -> Result<ProfilePayload, MutationError> {
        match self {
            Self::Updated { profile } => Ok(profile),
            Self::Failed { error, details } => Err(MutationError {
                code: super::MutationErrorCode::from_code(&error),
                details,
            }),
        }
    }
}

/// Profile row as stored after the mutation. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfilePayload {
    #[serde(default)]
    pub allowed_pages_add: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_pages_remove: Option<Vec<String>>,
    #[serde(default)]
    pub dashboard_config: Option<DashboardConfigPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardConfigPayload {
    #[serde(default)]
    pub access_overrides: Option<AccessOverridesPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccessOverridesPayload {
    #[serde(default)]
    pub tools_disabled: Value,
}

impl ProfilePayload {
    /// Server-confirmed overrides; fields the server left out keep the sent value.
    ///
    /// The tool map is untrusted and goes through the sanitizer.
    pub fn confirmed(&self, sent: &OverridePayload) -> OverrideDraft {
        let tools = self
            .dashboard_config
            .as_ref()
            .and_then(|config| config.access_overrides.as_ref())
            .filter(|overrides| !overrides.tools_disabled.is_null())
            .map_or_else(
                || sent.tools_disabled_by_page.clone(),
                |overrides| normalize_tools_disabled_by_page(&overrides.tools_disabled),
            );

        OverrideDraft {
            add: self
                .allowed_pages_add
                .clone()
                .unwrap_or_else(|| sent.allowed_pages_add.clone()),
            remove: self
                .allowed_pages_remove
                .clone()
                .unwrap_or_else(|| sent.allowed_pages_remove.clone()),
            tools,
        }
    }
}

impl From<RpcError> for MutationError {
    fn from(error: RpcError) -> Self {
        MutationError::with_details(super::MutationErrorCode::InternalError, error.to_string())
    }
}

pub type MutationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ProfilePayload, MutationError>> + Send + 'a>>;

/// Persists one subject's overrides. Implementations must not retry on their own.
pub trait OverrideMutationClient: Send + Sync {
    fn mutate_overrides<'a>(
        &'a self,
        subject: &'a SubjectRef,
        request: &'a OverrideMutationRequest,
    ) -> MutationFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::MutationErrorCode;
    use serde_json::json;

    fn sent() -> OverridePayload {
        OverridePayload {
            allowed_pages_add: vec!["/dashboard/metas".into()],
            allowed_pages_remove: vec!["*".into()],
            tools_disabled_by_page: [("*".to_string(), vec!["x".to_string()])]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = OverrideMutationRequest {
            subject_id: "u-1".into(),
            overrides: sent(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "subjectId": "u-1",
                "overrides": {
                    "allowedPagesAdd": ["/dashboard/metas"],
                    "allowedPagesRemove": ["*"],
                    "toolsDisabledByPage": {"*": ["x"]}
                }
            })
        );
    }

    #[test]
    fn error_response_maps_to_code() {
        let response: OverrideMutationResponse =
            serde_json::from_value(json!({"error": "forbidden", "details": "member"})).unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, MutationErrorCode::Forbidden);
        assert_eq!(err.details.as_deref(), Some("member"));
    }

    #[test]
    fn profile_response_is_confirmed_with_sanitized_tools() {
        let response: OverrideMutationResponse = serde_json::from_value(json!({
            "profile": {
                "allowed_pages_add": ["/dashboard/agenda"],
                "allowed_pages_remove": [],
                "dashboard_config": {
                    "access_overrides": {
                        "tools_disabled": {"/dashboard": ["a", "a"], "/nope": ["b"]}
                    }
                }
            }
        }))
        .unwrap();
        let confirmed = response.into_result().unwrap().confirmed(&sent());
        assert_eq!(confirmed.add, vec!["/dashboard/agenda".to_string()]);
        assert!(confirmed.remove.is_empty());
        assert_eq!(confirmed.tools.len(), 1);
        assert_eq!(confirmed.tools["/dashboard"], vec!["a".to_string()]);
    }

    #[test]
    fn missing_profile_fields_fall_back_to_sent_values() {
        let profile: ProfilePayload = serde_json::from_value(json!({})).unwrap();
        let confirmed = profile.confirmed(&sent());
        assert_eq!(confirmed.add, sent().allowed_pages_add);
        assert_eq!(confirmed.remove, sent().allowed_pages_remove);
        assert_eq!(confirmed.tools, sent().tools_disabled_by_page);
    }
}
