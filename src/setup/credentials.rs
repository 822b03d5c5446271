//! Credential storage.
//!
//! Tokens are kept either in the OS keyring (durable) or in process memory
//! for the current session only. The validator only asks the store whether
//! it is memory-only; the setup commit uses the rest.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::api::error::{ApiError, Result};
use crate::api::SecretToken;

/// The keyring service name for ytsetup tokens.
pub const KEYRING_SERVICE: &str = "ytsetup";

/// Where tokens go once a connection is accepted.
pub trait CredentialStore {
    /// Whether tokens only survive for the current session.
    fn is_memory_only(&self) -> bool;

    /// Store a token under `account` (the server address).
    fn store_token(&self, account: &str, token: &SecretToken) -> Result<()>;

    /// Retrieve the token stored under `account`.
    fn get_token(&self, account: &str) -> Result<SecretToken>;

    /// Remove the token stored under `account`.
    fn delete_token(&self, account: &str) -> Result<()>;

    /// Check if a token exists for `account`.
    fn has_token(&self, account: &str) -> bool {
        self.get_token(account).is_ok()
    }
}

/// Tokens in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    /// Use a different keyring service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, account)
            .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn is_memory_only(&self) -> bool {
        false
    }

    fn store_token(&self, account: &str, token: &SecretToken) -> Result<()> {
        self.entry(account)?
            .set_password(token.expose())
            .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;
        debug!(account = %account, token = %token.masked(), "Stored token in keyring");
        Ok(())
    }

    fn get_token(&self, account: &str) -> Result<SecretToken> {
        self.entry(account)?
            .get_password()
            .map(SecretToken::from)
            .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        self.entry(account)?
            .delete_password()
            .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))
    }
}

/// Tokens kept for this process only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<String, SecretToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn is_memory_only(&self) -> bool {
        true
    }

    fn store_token(&self, account: &str, token: &SecretToken) -> Result<()> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| ApiError::Keyring("session token store is poisoned".to_string()))?;
        tokens.insert(account.to_string(), token.clone());
        Ok(())
    }

    fn get_token(&self, account: &str) -> Result<SecretToken> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| ApiError::Keyring("session token store is poisoned".to_string()))?;
        tokens
            .get(account)
            .cloned()
            .ok_or_else(|| ApiError::Keyring(format!("no token stored for {}", account)))
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| ApiError::Keyring("session token store is poisoned".to_string()))?;
        tokens.remove(account);
        Ok(())
    }
}

/// Pick the store matching the user's "remember token" choice.
pub fn store_for(remember_token: bool) -> Box<dyn CredentialStore + Send + Sync> {
    if remember_token {
        Box::new(KeyringStore::new())
    } else {
        Box::new(MemoryStore::new())
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for &T {
    fn is_memory_only(&self) -> bool {
        (**self).is_memory_only()
    }

    fn store_token(&self, account: &str, token: &SecretToken) -> Result<()> {
        (**self).store_token(account, token)
    }

    fn get_token(&self, account: &str) -> Result<SecretToken> {
        (**self).get_token(account)
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        (**self).delete_token(account)
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn is_memory_only(&self) -> bool {
        (**self).is_memory_only()
    }

    fn store_token(&self, account: &str, token: &SecretToken) -> Result<()> {
        (**self).store_token(account, token)
    }

    fn get_token(&self, account: &str) -> Result<SecretToken> {
        (**self).get_token(account)
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        (**self).delete_token(account)
    }
}
