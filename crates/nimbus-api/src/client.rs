//! Authenticated HTTP client for the control plane.
//!
//! Every service endpoint lives under the
//! `/{version}/{service}/{project}/{region}` path convention, so the client
//! carries the project and region IDs and builds resource URLs on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus_api::{ApiClient, ApiConfig};
//!
//! # async fn example() -> Result<(), nimbus_api::ApiError> {
//! let client = ApiClient::new(ApiConfig {
//!     base_url: "https://api.nimbus.example".into(),
//!     token: "secret".into(),
//!     project: 1,
//!     region: 2,
//! })?;
//! let url = client.url("v1", "instances", "")?;
//! let instances: serde_json::Value = client.get_json(&url).await?;
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::{ApiError, ApiResult};

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the control plane, e.g. `https://api.nimbus.example`.
    pub base_url: String,
    /// Bearer token used on every request.
    pub token: String,
    /// Project ID the client operates in.
    pub project: u32,
    /// Region ID the client operates in.
    pub region: u32,
}

/// Control-plane HTTP client.
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    project: u32,
    region: u32,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("project", &self.project)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Error body shape used by the control plane for non-success responses.
#[derive(Debug, Deserialize)]
struct RemoteError {
    message: String,
}

impl ApiClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is not `http(s)` or the
    /// token is empty.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid API URL '{}': {e}", config.base_url)))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ApiError::Config(format!(
                "invalid API URL: {}, must start with http:// or https://",
                config.base_url
            )));
        }
        if config.token.trim().is_empty() {
            return Err(ApiError::Config("API token is empty".into()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: config.token,
            project: config.project,
            region: config.region,
        })
    }

    /// Build a resource URL: `{base}/{version}/{service}/{project}/{region}[/{tail}]`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the resulting URL is invalid.
    pub fn url(&self, version: &str, service: &str, tail: &str) -> ApiResult<Url> {
        let mut path = format!("{version}/{service}/{}/{}", self.project, self.region);
        if !tail.is_empty() {
            path.push('/');
            path.push_str(tail);
        }
        self.base
            .join(&path)
            .map_err(|e| ApiError::Config(format!("invalid resource path '{path}': {e}")))
    }

    /// `GET` a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ApiResult<T> {
        debug!(method = "GET", url = %url, "API request");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET` a JSON resource with query parameters.
    pub async fn get_json_query<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        debug!(method = "GET", url = %url, "API request");
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST` a JSON body, decoding a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &B,
    ) -> ApiResult<T> {
        debug!(method = "POST", url = %url, "API request");
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `DELETE` a resource, passing options as a JSON body and decoding a
    /// JSON response (mutating deletes return a task list).
    pub async fn delete_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &B,
    ) -> ApiResult<T> {
        debug!(method = "DELETE", url = %url, "API request");
        let response = self
            .http
            .delete(url.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST` with an empty body, discarding the response body.
    pub async fn post_empty<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> ApiResult<()> {
        debug!(method = "POST", url = %url, "API request");
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        trace!(status = %status, "API response");
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        trace!(status = %status, "API response");
        if status.is_success() {
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }
}

/// Map a non-success HTTP status and body into the error taxonomy.
///
/// The remote message is surfaced verbatim; 404 gets its own typed variant
/// because delete-confirmation and task polling both branch on it.
fn classify_failure(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<RemoteError>(body)
        .map_or_else(|_| body.trim().to_string(), |e| e.message);
    match status {
        401 | 403 => ApiError::Auth(message),
        404 => ApiError::NotFound(message),
        _ => ApiError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            base_url: "https://api.nimbus.example".into(),
            token: "tok".into(),
            project: 17,
            region: 3,
        }
    }

    #[test]
    fn client_builds_resource_urls() {
        let client = ApiClient::new(test_config()).expect("client");
        let url = client.url("v1", "instances", "").expect("url");
        assert_eq!(url.as_str(), "https://api.nimbus.example/v1/instances/17/3");

        let url = client.url("v2", "instances", "abc/interfaces").expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.nimbus.example/v2/instances/17/3/abc/interfaces"
        );
    }

    #[test]
    fn client_rejects_bad_scheme() {
        let mut config = test_config();
        config.base_url = "ws://api.nimbus.example".into();
        let result = ApiClient::new(config);
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn client_rejects_empty_token() {
        let mut config = test_config();
        config.token = "  ".into();
        let result = ApiClient::new(config);
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn classify_auth_failures() {
        let err = classify_failure(401, r#"{"message": "token expired"}"#);
        match err {
            ApiError::Auth(msg) => assert_eq!(msg, "token expired"),
            other => panic!("expected Auth, got {other:?}"),
        }
        assert!(matches!(classify_failure(403, ""), ApiError::Auth(_)));
    }

    #[test]
    fn classify_not_found_is_typed() {
        let err = classify_failure(404, r#"{"message": "instance not found"}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn classify_keeps_remote_message_verbatim() {
        let err = classify_failure(409, r#"{"message": "instance is locked"}"#);
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "instance is locked");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn classify_falls_back_to_raw_body() {
        let err = classify_failure(500, "upstream exploded");
        match err {
            ApiError::Api { message, .. } => assert_eq!(message, "upstream exploded"),
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
