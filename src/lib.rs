//! ytsetup - connection setup for the YouTrack issue tracker.
//!
//! The core is [`setup::ConnectionValidator`], which tests a server address
//! and token and reports a single [`setup::NotifierState`]. Around it sit the
//! YouTrack HTTP client, the settings file, credential storage and the time
//! tracker settings.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod setup;
pub mod tracking;
