//! Connectivity probe against a YouTrack server.
//!
//! Users often type an address that is almost right: the bare host of an
//! instance served under `/youtrack`, or `http` where the server only speaks
//! `https`. The probe tries a short list of candidate addresses and reports
//! the one that answered, after following redirects. The token is sent on
//! every redirect hop, including hops to another host or port.

use tracing::{debug, info, instrument, warn};

use super::auth::SecretToken;
use super::client::{build_http_client, YouTrackClient};
use super::error::{ApiError, Result};
use super::types::CURRENT_USER_PATH;
use crate::setup::address::ServerAddress;
use crate::setup::validator::ConnectivityProbe;

/// Context path YouTrack is commonly deployed under.
const CONTEXT_PATH: &str = "/youtrack";

/// Probes YouTrack over HTTP.
#[derive(Debug, Clone, Default)]
pub struct YouTrackProbe {
    /// Proxy URL used when the caller asks for proxy use.
    proxy_url: Option<String>,
}

impl YouTrackProbe {
    pub fn new(proxy_url: Option<String>) -> Self {
        Self { proxy_url }
    }
}

impl ConnectivityProbe for YouTrackProbe {
    #[instrument(skip(self, token), fields(token = %token.masked()))]
    async fn probe(
        &self,
        address: &str,
        token: &SecretToken,
        use_proxy: bool,
    ) -> Result<ServerAddress> {
        let proxy = if use_proxy {
            if self.proxy_url.is_none() {
                warn!("Proxy use requested but no proxy URL is known, connecting directly");
            }
            self.proxy_url.as_deref()
        } else {
            None
        };
        let http = build_http_client(proxy)?;

        let mut last_error: Option<ApiError> = None;
        for candidate in candidate_addresses(address) {
            debug!(candidate = %candidate, "Probing");
            let client = YouTrackClient::with_http_client(http.clone(), &candidate, token);

            match client.locate_current_user().await {
                Ok((user, final_url)) => {
                    info!(
                        candidate = %candidate,
                        user = %user.display_name(),
                        "YouTrack answered"
                    );
                    return canonical_address(final_url.as_str());
                }
                Err(e) if e.is_auth_rejection() => {
                    warn!(candidate = %candidate, "Token rejected: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    debug!(candidate = %candidate, "Candidate failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(ApiError::ConnectionFailed(match last_error {
            Some(e) => format!("no YouTrack instance found at {}: {}", address, e),
            None => format!("no YouTrack instance found at {}", address),
        }))
    }
}

/// Addresses worth trying for what the user typed, most likely first.
fn candidate_addresses(address: &str) -> Vec<String> {
    let base = address.trim_end_matches('/').to_string();

    let mut candidates = vec![base.clone()];
    if !base.ends_with(CONTEXT_PATH) {
        candidates.push(format!("{}{}", base, CONTEXT_PATH));
    }

    if let Some(rest) = strip_prefix_ignore_case(&base, "http://") {
        let secure = format!("https://{}", rest);
        candidates.push(secure.clone());
        if !secure.ends_with(CONTEXT_PATH) {
            candidates.push(format!("{}{}", secure, CONTEXT_PATH));
        }
    }

    candidates
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    match text.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&text[prefix.len()..]),
        _ => None,
    }
}

/// Strip the endpoint path and query from the URL that answered.
fn canonical_address(final_url: &str) -> Result<ServerAddress> {
    let without_query = final_url
        .split(['?', '#'])
        .next()
        .unwrap_or(final_url);
    let base = match without_query.rfind(CURRENT_USER_PATH) {
        Some(idx) => &without_query[..idx],
        None => without_query,
    };

    ServerAddress::parse(base.trim_end_matches('/'))
        .map_err(|e| {
            ApiError::InvalidResponse(format!("server answered from {}: {}", final_url, e))
        })
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    #[test]
    fn test_candidates_for_plain_http() {
        assert_eq!(
            candidate_addresses("http://example.com"),
            vec![
                "http://example.com",
                "http://example.com/youtrack",
                "https://example.com",
                "https://example.com/youtrack",
            ]
        );
    }

    #[test]
    fn test_candidates_for_https_with_context_path() {
        assert_eq!(
            candidate_addresses("https://example.com/youtrack/"),
            vec!["https://example.com/youtrack"]
        );
    }

    #[test]
    fn test_canonical_address_strips_endpoint_and_query() {
        let addr =
            canonical_address("https://example.com:8443/youtrack/api/users/me?fields=login,name")
                .unwrap();
        assert_eq!(addr.to_string(), "https://example.com:8443/youtrack");
    }

    #[test]
    fn test_canonical_address_at_root() {
        let addr = canonical_address("https://example.com/api/users/me?fields=login").unwrap();
        assert_eq!(addr.path, "");
        assert_eq!(addr.port, None);
    }

    #[tokio::test]
    async fn test_probe_returns_address_that_answered() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"login":"root"}"#)
            .create_async()
            .await;

        let canonical = YouTrackProbe::default()
            .probe(&server.url(), &SecretToken::new("perm:abc"), false)
            .await
            .unwrap();

        assert_eq!(canonical, ServerAddress::parse(&server.url()).unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_context_path() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/youtrack/api/users/me")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"login":"root","name":"Admin"}"#)
            .create_async()
            .await;

        let canonical = YouTrackProbe::default()
            .probe(&server.url(), &SecretToken::new("perm:abc"), false)
            .await
            .unwrap();

        assert_eq!(canonical.path, "/youtrack");
    }

    #[tokio::test]
    async fn test_probe_follows_redirect() {
        let mut server = Server::new_async().await;
        let target = format!("{}/youtrack/api/users/me?fields=login,name", server.url());
        server
            .mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        server
            .mock("GET", "/youtrack/api/users/me")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"login":"root"}"#)
            .create_async()
            .await;

        let canonical = YouTrackProbe::default()
            .probe(&server.url(), &SecretToken::new("perm:abc"), false)
            .await
            .unwrap();

        assert_eq!(canonical.to_string(), format!("{}/youtrack", server.url()));
    }

    #[tokio::test]
    async fn test_cross_origin_redirect_yields_canonical_address() {
        let mut old = Server::new_async().await;
        let mut new = Server::new_async().await;
        old.mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .with_status(301)
            .with_header("location", &format!("{}/api/users/me", new.url()))
            .create_async()
            .await;
        new.mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .create_async()
            .await;
        new.mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer perm:abc")
            .with_status(200)
            .with_body(r#"{"login":"root"}"#)
            .create_async()
            .await;

        let canonical = YouTrackProbe::default()
            .probe(&old.url(), &SecretToken::new("perm:abc"), false)
            .await
            .unwrap();

        assert_eq!(canonical, ServerAddress::parse(&new.url()).unwrap());
    }

    #[tokio::test]
    async fn test_probe_stops_on_rejected_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/users/me")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        let fallback = server
            .mock("GET", "/youtrack/api/users/me")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = YouTrackProbe::default()
            .probe(&server.url(), &SecretToken::new("perm:abc"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        fallback.assert_async().await;
    }
}
