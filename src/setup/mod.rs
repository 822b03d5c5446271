//! Connection setup: validating a server address and token, and deciding
//! what to keep afterwards.

pub mod address;
pub mod commit;
pub mod credentials;
pub mod token;
pub mod validator;

pub use address::{AddressDiff, ServerAddress};
pub use commit::{CommitPlan, CommitReport};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore};
pub use token::{PatternTokenClassifier, TokenClassifier};
pub use validator::{
    ConnectionAttempt, ConnectionRequest, ConnectionValidator, ConnectivityProbe, NotifierState,
};
