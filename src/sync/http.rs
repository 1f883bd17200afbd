use super::error_codes::{MutationError, MutationErrorCode};
use super::rpc::{
    MutationFuture, OverrideMutationClient, OverrideMutationRequest, OverrideMutationResponse,
    ProfilePayload,
};
use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::overrides::{SubjectKind, SubjectRef};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Override mutation client for the admin HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpOverrideClient {
    client: reqwest::Client,
    user_endpoint: Url,
    team_endpoint: Url,
    api_token: Option<String>,
}

impl HttpOverrideClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let mut base = Url::parse(&config.base_url).map_err(|error| RpcError::Transport {
            endpoint: config.base_url.clone(),
            message: error.to_string(),
        })?;
        // Endpoint paths are relative to any prefix already in the base URL.
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        let join = |path: &str| {
            base.join(path.trim_start_matches('/')).map_err(|error| RpcError::Transport {
                endpoint: format!("{}{path}", config.base_url),
                message: error.to_string(),
            })
        };
        let user_endpoint = join(&config.user_overrides_path)?;
        let team_endpoint = join(&config.team_overrides_path)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| RpcError::Transport {
                endpoint: config.base_url.clone(),
                message: error.to_string(),
            })?;

        Ok(Self {
            client,
            user_endpoint,
            team_endpoint,
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self, kind: SubjectKind) -> &Url {
        match kind {
            SubjectKind::User => &self.user_endpoint,
            SubjectKind::Team => &self.team_endpoint,
        }
    }

    async fn post(
        &self,
        subject: &SubjectRef,
        request: &OverrideMutationRequest,
    ) -> Result<ProfilePayload, MutationError> {
        if subject.id.trim().is_empty() {
            return Err(MutationError::new(match subject.kind {
                SubjectKind::User => MutationErrorCode::MissingUserId,
                SubjectKind::Team => MutationErrorCode::MissingTeamId,
            }));
        }

        let endpoint = self.endpoint(subject.kind);
        let mut builder = self.client.post(endpoint.clone()).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(subject = %subject, %endpoint, "sending override mutation");
        let response = builder.send().await.map_err(|error| RpcError::Transport {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|error| RpcError::Transport {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        })?;

        match serde_json::from_str::<OverrideMutationResponse>(&body) {
            Ok(OverrideMutationResponse::Updated { .. }) if !status.is_success() => {
                Err(status_error(status))
            }
            Ok(parsed) => parsed.into_result(),
            Err(_) if !status.is_success() => Err(status_error(status)),
            Err(error) => Err(RpcError::Decode {
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            }
            .into()),
        }
    }
}

/// Fallback for error responses without a machine code in the body.
fn status_error(status: StatusCode) -> MutationError {
    let code = match status {
        StatusCode::UNAUTHORIZED => MutationErrorCode::NotAuthenticated,
        StatusCode::FORBIDDEN => MutationErrorCode::Forbidden,
        StatusCode::NOT_FOUND => MutationErrorCode::UserNotFound,
        StatusCode::TOO_MANY_REQUESTS => MutationErrorCode::RateLimited,
        _ => MutationErrorCode::InternalError,
    };
    MutationError::with_details(code, format!("HTTP {status}"))
}

impl OverrideMutationClient for HttpOverrideClient {
    fn mutate_overrides<'a>(
        &'a self,
        subject: &'a SubjectRef,
        request: &'a OverrideMutationRequest,
    ) -> MutationFuture<'a> {
        Box::pin(self.post(subject, request))
    }
}
