//! YouTrack API client and types.
//!
//! This module provides the interface for communicating with the YouTrack
//! REST API and the connectivity probe used by connection tests.

mod auth;
mod client;
pub mod error;
mod probe;
pub mod types;

pub use auth::{Auth, SecretToken, PERMANENT_TOKEN_PREFIX};
pub use client::YouTrackClient;
pub use error::ApiError;
pub use probe::YouTrackProbe;
pub use types::{CurrentUser, WorkItemType};
