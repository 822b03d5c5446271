//! What confirming the setup does with a connection test result.

use std::path::Path;

use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::validator::{ConnectionAttempt, NotifierState};
use crate::config::{ConfigError, Settings};
use crate::error::Result;
use crate::tracking::TrackingMode;

/// Actions the caller performs when the user confirms the setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPlan {
    /// Save the address, token and proxy flag.
    pub persist: bool,
    /// Reload the issue list from the newly connected server.
    pub refresh_issues: bool,
    /// Let the user pick a time-tracking mode.
    pub enable_tracking: bool,
    /// Dismiss the setup form; otherwise it stays open for corrections.
    pub close: bool,
}

impl CommitPlan {
    pub fn for_outcome(outcome: NotifierState) -> Self {
        let success = outcome.is_success();
        Self {
            persist: outcome != NotifierState::EmptyField,
            refresh_issues: success,
            enable_tracking: success,
            close: !matches!(
                outcome,
                NotifierState::NullProxyHost
                    | NotifierState::PasswordNotStored
                    | NotifierState::EmptyField
            ),
        }
    }

    pub fn for_attempt(attempt: &ConnectionAttempt) -> Self {
        Self::for_outcome(attempt.outcome)
    }

    /// Persist `attempt` into `settings` and `store`, writing the file at `path`.
    ///
    /// The canonical address wins over the requested one. An address the
    /// settings file would not accept is reported in
    /// [`CommitReport::rejected`] and leaves `settings` and the file alone.
    /// A memory-only store is not written to: its tokens would not outlive
    /// this process. A durable store drops the token of a previously saved
    /// address that was replaced.
    pub fn apply<S: CredentialStore>(
        &self,
        attempt: &ConnectionAttempt,
        settings: &mut Settings,
        store: &S,
        share: bool,
        path: &Path,
    ) -> Result<CommitReport> {
        let mut report = CommitReport::default();
        if !self.persist {
            return Ok(report);
        }
        let Some(address) = attempt.effective_address() else {
            return Ok(report);
        };

        let mut updated = settings.clone();
        let repo = &mut updated.repository;
        repo.url = address;
        repo.shared = share;
        repo.use_proxy = attempt.use_proxy;
        repo.remember_token = !store.is_memory_only();
        repo.verified = self.enable_tracking;
        if !self.enable_tracking {
            updated.tracking.mode = TrackingMode::Disabled;
        }

        match updated.validate() {
            Ok(()) => {}
            Err(ConfigError::ValidationError(reason)) => {
                warn!(reason = %reason, "Repository not saved");
                report.rejected = Some(reason);
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        }
        updated.save_to(path)?;
        let previous = std::mem::replace(settings, updated).repository;

        let account = settings.repository.credential_account();
        if store.is_memory_only() {
            debug!(account = %account, "Token kept for this session only");
        } else {
            store.store_token(account, &attempt.token)?;
            report.token_remembered = true;

            let replaced = previous.credential_account();
            if previous.is_configured() && previous.remember_token && replaced != account {
                if let Err(e) = store.delete_token(replaced) {
                    debug!(account = %replaced, "No token removed: {}", e);
                }
            }
        }

        info!(url = %account, outcome = ?attempt.outcome, "Repository saved");
        report.saved_url = Some(account.to_string());
        Ok(report)
    }
}

/// What [`CommitPlan::apply`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Address written to the settings file.
    pub saved_url: Option<String>,
    /// Whether the token went to durable storage.
    pub token_remembered: bool,
    /// Why the address was not saved although the plan asked for it.
    pub rejected: Option<String>,
}
