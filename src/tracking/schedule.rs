//! Time values used by the time tracker settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing a scheduled posting time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("'{0}' is not a time, expected HH:MM")]
    Format(String),

    #[error("hour {0} is out of range (0-23)")]
    Hour(u32),

    #[error("minute {0} is out of range (0-59)")]
    Minute(u32),
}

/// Daily time at which tracked time is posted automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduledTime {
    hour: u8,
    minute: u8,
}

impl ScheduledTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::Hour(hour));
        }
        if minute > 59 {
            return Err(ScheduleError::Minute(minute));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// The persisted form, `HH:MM:0`.
    pub fn stored_form(&self) -> String {
        format!("{:02}:{:02}:0", self.hour, self.minute)
    }
}

impl Default for ScheduledTime {
    fn default() -> Self {
        Self {
            hour: 19,
            minute: 0,
        }
    }
}

impl fmt::Display for ScheduledTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ScheduledTime {
    type Err = ScheduleError;

    /// Accepts `HH:MM` and the stored `HH:MM:S` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || ScheduleError::Format(s.to_string());

        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(format_err)?;
        let minute = parts.next().ok_or_else(format_err)?;
        if let Some(seconds) = parts.next() {
            seconds.parse::<u32>().map_err(|_| format_err())?;
        }
        if parts.next().is_some() {
            return Err(format_err());
        }

        let hour = hour.parse::<u32>().map_err(|_| format_err())?;
        let minute = minute.parse::<u32>().map_err(|_| format_err())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ScheduledTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduledTime> for String {
    fn from(time: ScheduledTime) -> Self {
        time.stored_form()
    }
}

/// Idle time after which automatic tracking pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InactivityPeriod {
    minutes: u64,
}

impl InactivityPeriod {
    pub fn new(hours: u64, minutes: u64) -> Self {
        Self {
            minutes: hours * 60 + minutes,
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self {
            minutes: duration.as_secs() / 60,
        }
    }

    /// Whole hours part.
    pub fn hours(&self) -> u64 {
        self.minutes / 60
    }

    /// Minutes left over after the whole hours.
    pub fn minutes(&self) -> u64 {
        self.minutes % 60
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.minutes * 60)
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0
    }
}

impl Default for InactivityPeriod {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

impl fmt::Display for InactivityPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {:02}m", self.hours(), self.minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheduled_time() {
        let time: ScheduledTime = "08:30".parse().unwrap();
        assert_eq!((time.hour(), time.minute()), (8, 30));
        assert_eq!(time.to_string(), "08:30");
        assert_eq!(time.stored_form(), "08:30:0");
    }

    #[test]
    fn test_parse_stored_form() {
        let time: ScheduledTime = "19:05:0".parse().unwrap();
        assert_eq!(time, ScheduledTime::new(19, 5).unwrap());
    }

    #[test]
    fn test_parse_single_digit_fields() {
        let time: ScheduledTime = "7:5".parse().unwrap();
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn test_reject_out_of_range() {
        assert_eq!("24:00".parse::<ScheduledTime>(), Err(ScheduleError::Hour(24)));
        assert_eq!("10:60".parse::<ScheduledTime>(), Err(ScheduleError::Minute(60)));
    }

    #[test]
    fn test_reject_garbage() {
        for input in ["", "19", "ab:cd", "19:00:00:00", "19:xx:0"] {
            assert!(
                matches!(input.parse::<ScheduledTime>(), Err(ScheduleError::Format(_))),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_default_schedule() {
        assert_eq!(ScheduledTime::default().to_string(), "19:00");
    }

    #[test]
    fn test_inactivity_split() {
        let period = InactivityPeriod::new(2, 75);
        assert_eq!(period.hours(), 3);
        assert_eq!(period.minutes(), 15);
        assert_eq!(period.as_duration(), Duration::from_secs(195 * 60));
        assert_eq!(period.to_string(), "3h 15m");
    }

    #[test]
    fn test_inactivity_from_duration_truncates_seconds() {
        let period = InactivityPeriod::from_duration(Duration::from_millis(600_000 + 59_000));
        assert_eq!(period, InactivityPeriod::new(0, 10));
        assert!(!period.is_zero());
    }
}
