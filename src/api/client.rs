//! YouTrack API client implementation.
//!
//! This module provides the client for the YouTrack REST API. It handles
//! authentication, request/response processing, error handling, and retry
//! logic for the lookups done after a successful connection.
//!
//! Redirects are followed here rather than by reqwest: reqwest drops the
//! `Authorization` header when a redirect leaves the original host or port,
//! and YouTrack servers commonly redirect `http` to their canonical `https`
//! address.

use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use reqwest::{redirect, Client, Proxy, Response, StatusCode, Url};
use tracing::{debug, instrument, warn};

use super::auth::{Auth, SecretToken};
use super::error::{ApiError, Result};
use super::types::{CurrentUser, WorkItemType, CURRENT_USER_PATH, WORK_ITEM_TYPES_PATH};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Redirect hops followed per request.
const MAX_REDIRECTS: usize = 5;

/// The YouTrack API client.
#[derive(Debug, Clone)]
pub struct YouTrackClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the YouTrack instance.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
}

impl YouTrackClient {
    /// Create a client for `base_url` authenticating with `token`.
    ///
    /// Does NOT validate the connection. With `proxy` set, all requests go
    /// through that proxy URL; otherwise system proxy settings are ignored.
    pub fn with_credentials(
        base_url: &str,
        token: &SecretToken,
        proxy: Option<&str>,
    ) -> Result<Self> {
        let client = build_http_client(proxy)?;
        Ok(Self::with_http_client(client, base_url, token))
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_http_client(client: Client, base_url: &str, token: &SecretToken) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            auth: Auth::new(token),
        }
    }

    /// Get the current user along with the URL that finally answered.
    ///
    /// A single attempt; connection tests are not retried. The URL differs
    /// from the requested one when the server redirected.
    #[instrument(skip(self))]
    pub async fn locate_current_user(&self) -> Result<(CurrentUser, Url)> {
        let url = format!("{}{}?fields=login,name", self.base_url, CURRENT_USER_PATH);
        self.execute_get(&url).await
    }

    /// Get the work item types configured for time tracking.
    #[instrument(skip(self))]
    pub async fn get_work_item_types(&self) -> Result<Vec<WorkItemType>> {
        let url = format!("{}{}?fields=id,name", self.base_url, WORK_ITEM_TYPES_PATH);
        let types: Vec<WorkItemType> = self.get(&url).await?;
        debug!("Fetched {} work item types", types.len());
        Ok(types)
    }

    /// Perform a GET request with authentication and error handling.
    ///
    /// Includes retry logic for transient failures (rate limiting, server errors).
    #[instrument(skip(self), fields(url = %url))]
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempts = 0;
        let mut last_error: Option<ApiError> = None;

        while attempts < MAX_RETRIES {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, MAX_RETRIES);

            match self.execute_get::<T>(url).await {
                Ok((response, _)) => return Ok(response),
                Err(e) => {
                    if Self::is_retryable(&e) && attempts < MAX_RETRIES {
                        let delay = Self::calculate_retry_delay(attempts);
                        warn!(
                            "Request failed (attempt {}), retrying in {}ms: {}",
                            attempts, delay, e
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::ServerError("Max retries exceeded".to_string())))
    }

    /// Execute a single GET request, returning the body and the final URL.
    ///
    /// Every redirect hop carries the authorization header.
    async fn execute_get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<(T, Url)> {
        let mut url =
            Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(url.clone())
                .header(header::AUTHORIZATION, self.auth.header_value())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            if response.status().is_redirection() {
                if let Some(next) = redirect_target(&url, response.headers())? {
                    debug!(
                        from = %url,
                        to = %next,
                        status = %response.status(),
                        "Following redirect"
                    );
                    url = next;
                    continue;
                }
            }

            let final_url = response.url().clone();
            let body = self.handle_response(response).await?;
            return Ok((body, final_url));
        }

        Err(ApiError::ConnectionFailed(format!(
            "gave up after {} redirects, last at {}",
            MAX_REDIRECTS, url
        )))
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);

            Err(Self::error_from_response(status, &url, &error_body))
        }
    }

    /// Create an appropriate error from an HTTP response.
    ///
    /// YouTrack reports errors as `{"error": ..., "error_description": ...}`.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            let description = json
                .get("error_description")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty());
            if let Some(description) = description {
                return ApiError::from_status(status, description);
            }
        }

        ApiError::from_status(status, url)
    }

    /// Check if an error is retryable.
    fn is_retryable(error: &ApiError) -> bool {
        matches!(
            error,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }

    /// Calculate retry delay with exponential backoff.
    fn calculate_retry_delay(attempt: u32) -> u64 {
        RETRY_DELAY_MS * 2u64.pow(attempt - 1)
    }
}

/// Where a redirect response points, resolved against the request URL.
///
/// `None` when the response carries no usable `Location`. A redirect from
/// `https` to `http` is refused so the token never leaves TLS.
fn redirect_target(from: &Url, headers: &HeaderMap) -> Result<Option<Url>> {
    let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let next = from
        .join(location)
        .map_err(|e| ApiError::InvalidResponse(format!("bad redirect to {}: {}", location, e)))?;
    if from.scheme() == "https" && next.scheme() != "https" {
        return Err(ApiError::ConnectionFailed(format!(
            "refusing redirect from {} to {}",
            from, next
        )));
    }

    Ok(Some(next))
}

/// Build the HTTP client with appropriate settings.
///
/// The client does not follow redirects itself; see [`YouTrackClient`].
pub(crate) fn build_http_client(proxy: Option<&str>) -> Result<Client> {
    let builder = Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .redirect(redirect::Policy::none());

    let builder = match proxy {
        Some(proxy_url) => {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| ApiError::InvalidUrl(format!("proxy {}: {}", proxy_url, e)))?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder.build().map_err(ApiError::Network)
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for local servers)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. The token is sent in clear text.", url);
    }

    url.to_string()
}
