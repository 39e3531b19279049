use reqwest::multipart;
use thiserror::Error;
use tracing::info;

use super::types::{RoutePayload, UserLocation};
use crate::session::AudioArtifact;

/// Upload failure taxonomy. Terminal for the recording cycle, never for the
/// application.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx HTTP response from the backend.
    #[error("Backend returned HTTP {status}")]
    Network { status: reqwest::StatusCode },

    /// 2xx response whose body was not a parseable route payload.
    #[error("Failed to parse route response: {source}")]
    ResponseParse {
        #[source]
        source: reqwest::Error,
    },

    /// The request never completed (connect, DNS, timeout).
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
}

/// Which backend route planner handles the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    #[default]
    Standard,
    Tourist,
}

impl RouteMode {
    fn endpoint(self) -> &'static str {
        match self {
            RouteMode::Standard => "stt-route",
            RouteMode::Tourist => "stt-route-tourist",
        }
    }
}

/// HTTP client for the STT/route-planning backend.
#[derive(Debug, Clone)]
pub struct RouteApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl RouteApiClient {
    /// Create a client for the given API base URL (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload one recorded artifact and await the planned route.
    ///
    /// One request, no retry; the transport default timeout applies.
    pub async fn upload(
        &self,
        artifact: &AudioArtifact,
        mode: RouteMode,
    ) -> Result<RoutePayload, ApiError> {
        let url = format!("{}/{}", self.base_url, mode.endpoint());

        let part = multipart::Part::bytes(artifact.bytes.clone())
            .file_name(artifact.filename())
            .mime_str(artifact.codec.mime())
            .map_err(|source| ApiError::Transport { source })?;
        let form = multipart::Form::new().part("audio", part);

        info!(
            "Uploading {} ({} bytes) to {}",
            artifact.filename(),
            artifact.bytes.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ApiError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Network { status });
        }

        response
            .json::<RoutePayload>()
            .await
            .map_err(|source| ApiError::ResponseParse { source })
    }

    /// Report the user's position. The response body is ignored; only the
    /// status matters to callers.
    pub async fn report_location(&self, location: &UserLocation) -> Result<(), ApiError> {
        let url = format!("{}/user-location", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(location)
            .send()
            .await
            .map_err(|source| ApiError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Network { status });
        }

        Ok(())
    }
}
