//! Wall-clock value types used by tasks: a time of day and a weekday set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A 24-hour time of day with minute precision, stored as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTime {
    hour: u8,
    minute: u8,
}

impl TaskTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Sort key: `hour * 60 + minute`.
    pub fn minutes_of_day(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    pub fn to_naive(&self) -> NaiveTime {
        // hour/minute are range-checked on construction
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for TaskTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TaskTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskTime> for String {
    fn from(value: TaskTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TaskTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Set of weekday indices, 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekDays(BTreeSet<u8>);

impl WeekDays {
    pub fn new(days: impl IntoIterator<Item = u8>) -> Result<Self, ValidationError> {
        let mut set = BTreeSet::new();
        for day in days {
            if day > 6 {
                return Err(ValidationError::InvalidWeekday(day));
            }
            set.insert(day);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0.contains(&(weekday.num_days_from_sunday() as u8))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for WeekDays {
    type Err = ValidationError;

    /// Parses a comma-separated list such as `"1,3,5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut days = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day: u8 = part.parse().map_err(|_| ValidationError::InvalidValue {
                field: "weekDays".to_string(),
                message: format!("'{part}' is not a weekday index"),
            })?;
            days.push(day);
        }
        Self::new(days)
    }
}

impl TryFrom<Vec<u8>> for WeekDays {
    type Error = ValidationError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WeekDays> for Vec<u8> {
    fn from(value: WeekDays) -> Self {
        value.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_hh_mm() {
        let t: TaskTime = "09:05".parse().unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.minutes_of_day(), 545);
    }

    #[test]
    fn accepts_single_digit_hour() {
        let t: TaskTime = "7:30".parse().unwrap();
        assert_eq!(t.to_string(), "07:30");
    }

    #[test]
    fn rejects_out_of_range_time() {
        assert!("24:00".parse::<TaskTime>().is_err());
        assert!("12:60".parse::<TaskTime>().is_err());
        assert!("noon".parse::<TaskTime>().is_err());
        assert!("12:5".parse::<TaskTime>().is_err());
    }

    #[test]
    fn time_serializes_as_string() {
        let t = TaskTime::new(23, 0).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"23:00\"");
        let back: TaskTime = serde_json::from_str("\"01:15\"").unwrap();
        assert_eq!(back, TaskTime::new(1, 15).unwrap());
        assert!(serde_json::from_str::<TaskTime>("\"25:00\"").is_err());
    }

    #[test]
    fn weekdays_reject_out_of_range() {
        assert_eq!(WeekDays::new([1, 7]), Err(ValidationError::InvalidWeekday(7)));
        assert!(serde_json::from_str::<WeekDays>("[0, 9]").is_err());
    }

    #[test]
    fn weekdays_membership_uses_sunday_zero() {
        let days: WeekDays = "1,3,5".parse().unwrap();
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Fri));
        assert!(!days.contains(Weekday::Sun));
        assert_eq!(serde_json::to_string(&days).unwrap(), "[1,3,5]");
    }
}
