//! Time tracker settings and which of them can be edited.
//!
//! Tracking modes are only selectable after a successful connection test.
//! Automatic tracking unlocks the inactivity, schedule and posting options;
//! manual tracking only the comment and work item type.

mod schedule;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use schedule::{InactivityPeriod, ScheduleError, ScheduledTime};

use crate::config::{ConfigError, Result};

/// How time is tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// The tracker starts and stops on its own.
    Automatic,
    /// The user starts and stops the tracker.
    Manual,
    #[default]
    Disabled,
}

/// Which settings fields accept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAvailability {
    pub mode_selection: bool,
    pub inactivity: bool,
    pub schedule: bool,
    pub post_on_commit: bool,
    pub post_on_close: bool,
    pub comment: bool,
    pub work_item_type: bool,
}

impl FieldAvailability {
    /// Availability for `mode`; without a connection everything is locked.
    pub fn new(mode: TrackingMode, connected: bool) -> Self {
        let mode = if connected { mode } else { TrackingMode::Disabled };
        let automatic = mode == TrackingMode::Automatic;
        let tracking = automatic || mode == TrackingMode::Manual;

        Self {
            mode_selection: connected,
            inactivity: automatic,
            schedule: automatic,
            post_on_commit: automatic,
            post_on_close: automatic,
            comment: tracking,
            work_item_type: tracking,
        }
    }

    /// Names of the settings that accept input, in display order.
    pub fn editable_fields(&self) -> Vec<&'static str> {
        [
            ("mode", self.mode_selection),
            ("schedule", self.schedule),
            ("inactivity period", self.inactivity),
            ("post on commit", self.post_on_commit),
            ("post on close", self.post_on_close),
            ("comment", self.comment),
            ("work item type", self.work_item_type),
        ]
        .into_iter()
        .filter_map(|(name, enabled)| enabled.then_some(name))
        .collect()
    }
}

/// Persisted time tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    pub mode: TrackingMode,
    /// Post tracked time daily at `scheduled_time`.
    pub scheduled: bool,
    pub scheduled_time: ScheduledTime,
    /// Stored in minutes.
    pub inactivity: InactivityPeriod,
    pub post_on_commit: bool,
    pub post_on_close: bool,
    /// Default comment for posted work items.
    pub comment: String,
    pub work_item_type: Option<String>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Disabled,
            scheduled: false,
            scheduled_time: ScheduledTime::default(),
            inactivity: InactivityPeriod::default(),
            post_on_commit: false,
            post_on_close: false,
            comment: String::new(),
            work_item_type: None,
        }
    }
}

/// A partial change to the tracker settings; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub mode: Option<TrackingMode>,
    pub scheduled: Option<bool>,
    pub scheduled_time: Option<ScheduledTime>,
    pub inactivity: Option<InactivityPeriod>,
    pub post_on_commit: Option<bool>,
    pub post_on_close: Option<bool>,
    pub comment: Option<String>,
    pub work_item_type: Option<String>,
}

impl TrackingSettings {
    /// The mode in force; tracking is off until a connection succeeded.
    pub fn effective_mode(&self, connected: bool) -> TrackingMode {
        if connected {
            self.mode
        } else {
            TrackingMode::Disabled
        }
    }

    pub fn availability(&self, connected: bool) -> FieldAvailability {
        FieldAvailability::new(self.mode, connected)
    }

    /// Check stored settings against the connection state.
    ///
    /// Options of modes other than the current one are kept but inert, so
    /// only the mode and the values it relies on are checked.
    pub fn validate(&self, connected: bool) -> Result<()> {
        if self.mode != TrackingMode::Disabled && !connected {
            return Err(ConfigError::ValidationError(format!(
                "{:?} time tracking needs a verified connection",
                self.mode
            )));
        }
        if self.mode == TrackingMode::Automatic && self.inactivity.is_zero() {
            return Err(ConfigError::ValidationError(
                "inactivity period must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `update`, refusing edits to fields locked in the resulting mode.
    ///
    /// Nothing is changed when an error is returned.
    pub fn apply(&mut self, update: TrackingUpdate, connected: bool) -> Result<()> {
        let mode = update.mode.unwrap_or(self.mode);
        if update.mode.is_some() && mode != TrackingMode::Disabled && !connected {
            return Err(ConfigError::ValidationError(
                "time tracking needs a successful connection test first".to_string(),
            ));
        }

        let available = FieldAvailability::new(mode, connected);
        let locked = [
            (
                "schedule",
                update.scheduled.is_some() || update.scheduled_time.is_some(),
                available.schedule,
            ),
            ("inactivity period", update.inactivity.is_some(), available.inactivity),
            ("post on commit", update.post_on_commit.is_some(), available.post_on_commit),
            ("post on close", update.post_on_close.is_some(), available.post_on_close),
            ("comment", update.comment.is_some(), available.comment),
            ("work item type", update.work_item_type.is_some(), available.work_item_type),
        ];
        if let Some((field, _, _)) = locked
            .iter()
            .find(|(_, requested, enabled)| *requested && !*enabled)
        {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be set in {:?} mode",
                field, mode
            )));
        }

        if let Some(inactivity) = update.inactivity {
            if inactivity.is_zero() {
                return Err(ConfigError::ValidationError(
                    "inactivity period must be at least one minute".to_string(),
                ));
            }
            self.inactivity = inactivity;
        }

        self.mode = mode;
        if let Some(scheduled) = update.scheduled {
            self.scheduled = scheduled;
        }
        if let Some(time) = update.scheduled_time {
            self.scheduled_time = time;
        }
        if let Some(post) = update.post_on_commit {
            self.post_on_commit = post;
        }
        if let Some(post) = update.post_on_close {
            self.post_on_close = post;
        }
        if let Some(comment) = update.comment {
            self.comment = comment;
        }
        if let Some(kind) = update.work_item_type {
            self.work_item_type = Some(kind);
        }

        debug!(mode = ?self.mode, "Tracking settings updated");
        Ok(())
    }
}

/// Work item types offered to the user and the one preselected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemChoice {
    pub types: Vec<String>,
    pub selected: Option<usize>,
}

/// Build the type list from a server fetch.
///
/// With types from the server, the current type is preselected when present
/// (first entry otherwise). When the fetch failed or came back empty, the
/// current type is the only choice.
pub fn choose_work_item_type(
    fetched: Option<Vec<String>>,
    current: Option<&str>,
) -> WorkItemChoice {
    match fetched.filter(|types| !types.is_empty()) {
        Some(types) => {
            let selected = current
                .and_then(|current| types.iter().position(|t| t == current))
                .unwrap_or(0);
            WorkItemChoice {
                types,
                selected: Some(selected),
            }
        }
        None => {
            let types: Vec<String> = current.map(str::to_string).into_iter().collect();
            let selected = if types.is_empty() { None } else { Some(0) };
            WorkItemChoice { types, selected }
        }
    }
}
