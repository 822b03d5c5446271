//! The "Test Connection" workflow.
//!
//! [`ConnectionValidator::validate`] turns one set of user inputs into one
//! [`ConnectionAttempt`]. Checks run in a fixed order and the first one that
//! applies decides the outcome:
//!
//! 1. empty address or token
//! 2. proxy requested but no proxy host configured (the probe is skipped)
//! 3. token in neither known format (even if the server answered)
//! 4. the probe failed
//! 5. the credential store only keeps tokens for this session (advisory)
//! 6. success

use std::fmt;

use tracing::{debug, info, instrument, warn};

use super::address::{normalize_address, AddressDiff, ServerAddress};
use super::credentials::CredentialStore;
use super::token::TokenClassifier;
use crate::api::error::ApiError;
use crate::api::SecretToken;

/// Live check that a server answers and accepts a token.
#[allow(async_fn_in_trait)]
pub trait ConnectivityProbe {
    /// Probe `address` with `token`, returning the server-confirmed address.
    async fn probe(
        &self,
        address: &str,
        token: &SecretToken,
        use_proxy: bool,
    ) -> Result<ServerAddress, ApiError>;
}

/// The result shown to the user after a connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    /// The server accepted the token.
    Success,
    /// Address or token was left empty.
    EmptyField,
    /// Proxy use was requested but no proxy host is configured.
    NullProxyHost,
    /// The token matches no known format.
    InvalidToken,
    /// The token will be forgotten when the session ends.
    PasswordNotStored,
    /// The server could not be reached or rejected the token.
    ConnectionFailed,
}

impl NotifierState {
    /// Text for the notification line under the form.
    pub fn message(&self) -> &'static str {
        match self {
            NotifierState::Success => "Connection successful",
            NotifierState::EmptyField => "Server URL and token are required",
            NotifierState::NullProxyHost => {
                "Proxy is not configured: set a proxy host or disable proxy use"
            }
            NotifierState::InvalidToken => {
                "Token format is not recognized: use a permanent token or an application password"
            }
            NotifierState::PasswordNotStored => {
                "Connected, but the token is kept for this session only"
            }
            NotifierState::ConnectionFailed => {
                "Connection failed: check the server URL, network and token"
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NotifierState::Success)
    }

    /// Whether the state calls for the user to fix an input field.
    pub fn is_user_input_error(&self) -> bool {
        matches!(self, NotifierState::EmptyField | NotifierState::InvalidToken)
    }

    /// Whether the state is informational and does not block saving.
    pub fn is_advisory(&self) -> bool {
        matches!(self, NotifierState::PasswordNotStored)
    }
}

impl fmt::Display for NotifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The inputs of one connection test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Address as typed, possibly without a scheme.
    pub raw_address: String,
    pub token: SecretToken,
    /// Whether the user asked to go through the proxy.
    pub use_proxy: bool,
    /// Whether a proxy host is configured at all.
    pub proxy_host_configured: bool,
}

impl ConnectionRequest {
    pub fn new(raw_address: impl Into<String>, token: impl Into<SecretToken>) -> Self {
        Self {
            raw_address: raw_address.into(),
            token: token.into(),
            use_proxy: false,
            proxy_host_configured: false,
        }
    }

    /// Request proxy use, recording whether a proxy host exists.
    pub fn with_proxy(mut self, use_proxy: bool, proxy_host_configured: bool) -> Self {
        self.use_proxy = use_proxy;
        self.proxy_host_configured = proxy_host_configured;
        self
    }
}

/// Everything one connection test produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub raw_address: String,
    pub token: SecretToken,
    /// The address handed to the probe, after normalization.
    pub requested_address: Option<String>,
    /// The server-confirmed address; set only when the probe succeeded.
    pub normalized_address: Option<ServerAddress>,
    /// Effective proxy flag; forced off when no proxy host is configured.
    pub use_proxy: bool,
    pub outcome: NotifierState,
    /// Components corrected by the server, when the probe succeeded and the
    /// requested address could be parsed.
    pub correction: Option<AddressDiff>,
    /// Why the probe failed, if it did.
    pub failure: Option<String>,
}

impl ConnectionAttempt {
    fn new(request: &ConnectionRequest, outcome: NotifierState) -> Self {
        Self {
            raw_address: request.raw_address.clone(),
            token: request.token.clone(),
            requested_address: None,
            normalized_address: None,
            use_proxy: request.use_proxy,
            outcome,
            correction: None,
            failure: None,
        }
    }

    /// The address worth keeping: canonical if known, else the requested one.
    pub fn effective_address(&self) -> Option<String> {
        self.normalized_address
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| self.requested_address.clone())
    }
}

/// Runs connection tests against injected collaborators.
#[derive(Debug)]
pub struct ConnectionValidator<P, C, S> {
    probe: P,
    classifier: C,
    store: S,
}

impl<P, C, S> ConnectionValidator<P, C, S>
where
    P: ConnectivityProbe,
    C: TokenClassifier,
    S: CredentialStore,
{
    pub fn new(probe: P, classifier: C, store: S) -> Self {
        Self {
            probe,
            classifier,
            store,
        }
    }

    /// The credential store this validator consults.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one connection test.
    #[instrument(skip_all, fields(address = %request.raw_address, use_proxy = request.use_proxy))]
    pub async fn validate(&self, request: &ConnectionRequest) -> ConnectionAttempt {
        // Anonymous login is not offered even though the server would allow it.
        if request.raw_address.trim().is_empty() || request.token.is_empty() {
            debug!("Address or token is empty");
            return ConnectionAttempt::new(request, NotifierState::EmptyField);
        }

        let requested = normalize_address(&request.raw_address);
        debug!(requested = %requested, token = %request.token.masked(), "Normalized address");

        if request.use_proxy && !request.proxy_host_configured {
            warn!("Proxy requested but no proxy host is configured");
            let mut attempt = ConnectionAttempt::new(request, NotifierState::NullProxyHost);
            attempt.requested_address = Some(requested);
            attempt.use_proxy = false;
            return attempt;
        }

        let mut attempt = ConnectionAttempt::new(request, NotifierState::Success);
        let probed = self
            .probe
            .probe(&requested, &request.token, request.use_proxy)
            .await;

        match probed {
            Ok(canonical) => {
                attempt.correction = match ServerAddress::parse(&requested) {
                    Ok(before) => Some(AddressDiff::between(&before, &canonical)),
                    Err(e) => {
                        debug!("Skipping auto-correction diff: {}", e);
                        None
                    }
                };
                attempt.normalized_address = Some(canonical);
            }
            Err(e) => {
                warn!("Connection probe failed: {}", e);
                attempt.failure = Some(e.to_string());
            }
        }
        attempt.requested_address = Some(requested);

        attempt.outcome = if !self.classifier.is_recognized(request.token.expose()) {
            NotifierState::InvalidToken
        } else if attempt.failure.is_some() {
            NotifierState::ConnectionFailed
        } else if self.store.is_memory_only() {
            NotifierState::PasswordNotStored
        } else {
            NotifierState::Success
        };

        if attempt.outcome.is_success() {
            if let Some(address) = &attempt.normalized_address {
                info!(address = %address, "YouTrack repository is connected");
            }
        } else {
            info!(outcome = ?attempt.outcome, "Connection test finished");
        }

        attempt
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::api::error::Result as ApiResult;
    use crate::setup::credentials::{KeyringStore, MemoryStore};
    use crate::setup::token::PatternTokenClassifier;

    const BEARER: &str = "perm:abc123";
    const APP_PASSWORD: &str = "A1b2C3d4E5f6G7h8I9j0";

    /// Probe that replays a fixed answer and counts calls.
    struct FakeProbe {
        answer: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, bool)>>,
    }

    impl FakeProbe {
        fn answering(canonical: &'static str) -> Self {
            Self {
                answer: Ok(canonical),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &'static str) -> Self {
            Self {
                answer: Err(reason),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ConnectivityProbe for &FakeProbe {
        async fn probe(
            &self,
            address: &str,
            _token: &SecretToken,
            use_proxy: bool,
        ) -> ApiResult<ServerAddress> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((address.to_string(), use_proxy));
            match self.answer {
                Ok(canonical) => Ok(ServerAddress::parse(canonical).unwrap()),
                Err(reason) => Err(ApiError::ConnectionFailed(reason.to_string())),
            }
        }
    }

    fn validator(
        probe: &FakeProbe,
    ) -> ConnectionValidator<&FakeProbe, PatternTokenClassifier, KeyringStore> {
        ConnectionValidator::new(probe, PatternTokenClassifier::new(), KeyringStore::new())
    }

    #[tokio::test]
    async fn test_empty_address_is_empty_field() {
        let probe = FakeProbe::answering("http://y.com");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("", "x"))
            .await;

        assert_eq!(attempt.outcome, NotifierState::EmptyField);
        assert_eq!(probe.calls(), 0);
        assert!(attempt.normalized_address.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_empty_field() {
        let probe = FakeProbe::answering("http://y.com");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("y.com", ""))
            .await;

        assert_eq!(attempt.outcome, NotifierState::EmptyField);
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_field_wins_over_proxy_and_token_checks() {
        let probe = FakeProbe::answering("http://y.com");
        let request = ConnectionRequest::new("   ", "not-a-token").with_proxy(true, false);
        let attempt = validator(&probe).validate(&request).await;

        assert_eq!(attempt.outcome, NotifierState::EmptyField);
    }

    #[tokio::test]
    async fn test_proxy_without_host_skips_probe() {
        let probe = FakeProbe::answering("http://y.com");
        let request = ConnectionRequest::new("y.com", BEARER).with_proxy(true, false);
        let attempt = validator(&probe).validate(&request).await;

        assert_eq!(attempt.outcome, NotifierState::NullProxyHost);
        assert_eq!(probe.calls(), 0);
        assert!(!attempt.use_proxy);
        assert!(attempt.normalized_address.is_none());
        assert_eq!(attempt.requested_address.as_deref(), Some("http://y.com"));
    }

    #[tokio::test]
    async fn test_proxy_with_host_is_passed_to_probe() {
        let probe = FakeProbe::answering("http://y.com");
        let request = ConnectionRequest::new("y.com", BEARER).with_proxy(true, true);
        let attempt = validator(&probe).validate(&request).await;

        assert_eq!(attempt.outcome, NotifierState::Success);
        assert!(attempt.use_proxy);
        assert_eq!(
            probe.seen.lock().unwrap().as_slice(),
            &[("http://y.com".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_address_is_normalized_before_probing() {
        let probe = FakeProbe::answering("http://example.com");
        validator(&probe)
            .validate(&ConnectionRequest::new("example.com", BEARER))
            .await;

        assert_eq!(
            probe.seen.lock().unwrap()[0],
            ("http://example.com".to_string(), false)
        );
    }

    #[tokio::test]
    async fn test_unrecognized_token_overrides_successful_probe() {
        let probe = FakeProbe::answering("http://y.com");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("y.com", "letmein"))
            .await;

        assert_eq!(probe.calls(), 1);
        assert_eq!(attempt.outcome, NotifierState::InvalidToken);
        // The server did answer, so its address is still reported.
        assert!(attempt.normalized_address.is_some());
    }

    #[tokio::test]
    async fn test_unrecognized_token_reported_even_when_probe_fails() {
        let probe = FakeProbe::failing("unreachable");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("y.com", "letmein"))
            .await;

        assert_eq!(attempt.outcome, NotifierState::InvalidToken);
        assert!(attempt.failure.is_some());
    }

    #[tokio::test]
    async fn test_probe_failure_is_connection_failed() {
        let probe = FakeProbe::failing("host not found");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("y.com", APP_PASSWORD))
            .await;

        assert_eq!(attempt.outcome, NotifierState::ConnectionFailed);
        assert!(attempt.normalized_address.is_none());
        assert!(attempt.correction.is_none());
        assert!(attempt.failure.unwrap().contains("host not found"));
    }

    #[tokio::test]
    async fn test_memory_only_store_is_password_not_stored() {
        let probe = FakeProbe::answering("https://y.com");
        let validator =
            ConnectionValidator::new(&probe, PatternTokenClassifier::new(), MemoryStore::new());
        let attempt = validator
            .validate(&ConnectionRequest::new("y.com", BEARER))
            .await;

        assert_eq!(attempt.outcome, NotifierState::PasswordNotStored);
        assert!(attempt.outcome.is_advisory());
        assert_eq!(
            attempt.normalized_address.unwrap().to_string(),
            "https://y.com"
        );
    }

    #[tokio::test]
    async fn test_success_sets_canonical_address_and_diff() {
        let probe = FakeProbe::answering("https://example.com:443/path");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("example.com", BEARER))
            .await;

        assert_eq!(attempt.outcome, NotifierState::Success);
        assert_eq!(
            attempt.effective_address().as_deref(),
            Some("https://example.com:443/path")
        );

        let diff = attempt.correction.unwrap();
        assert!(diff.scheme);
        assert!(!diff.host);
        assert!(diff.port);
        assert!(diff.path);
    }

    #[tokio::test]
    async fn test_unparseable_requested_address_skips_diff_only() {
        let probe = FakeProbe::answering("http://y.com");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("bad host name", BEARER))
            .await;

        assert_eq!(attempt.outcome, NotifierState::Success);
        assert!(attempt.correction.is_none());
        assert!(attempt.normalized_address.is_some());
    }

    #[tokio::test]
    async fn test_validate_is_idempotent() {
        let probe = FakeProbe::answering("https://example.com/youtrack");
        let validator = validator(&probe);
        let request = ConnectionRequest::new("example.com", APP_PASSWORD);

        let first = validator.validate(&request).await;
        let second = validator.validate(&request).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_attempt_debug_masks_token() {
        let probe = FakeProbe::answering("http://y.com");
        let attempt = validator(&probe)
            .validate(&ConnectionRequest::new("y.com", "perm:top-secret"))
            .await;

        assert!(!format!("{:?}", attempt).contains("top-secret"));
    }

    #[test]
    fn test_notifier_state_taxonomy() {
        assert!(NotifierState::EmptyField.is_user_input_error());
        assert!(NotifierState::InvalidToken.is_user_input_error());
        assert!(!NotifierState::ConnectionFailed.is_user_input_error());
        assert!(!NotifierState::NullProxyHost.is_advisory());
        assert_eq!(NotifierState::Success.to_string(), "Connection successful");
    }
}
