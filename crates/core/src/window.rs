use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown analytics window: '{0}' (expected 7d, 30d or 90d)")]
    UnknownWindow(String),
}

/// A trailing calendar-day range for dashboard aggregation, ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    SevenDays,
    ThirtyDays,
    NinetyDays,
}

impl Window {
    pub fn days(self) -> u64 {
        match self {
            Window::SevenDays => 7,
            Window::ThirtyDays => 30,
            Window::NinetyDays => 90,
        }
    }

    /// The inclusive range `[today - (N-1), today]`, so a 7-day window on a
    /// Sunday starts the previous Monday and includes today.
    pub fn range(self, today: NaiveDate) -> DateRange {
        DateRange::new(today - Days::new(self.days() - 1), today)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::SevenDays => write!(f, "7d"),
            Window::ThirtyDays => write!(f, "30d"),
            Window::NinetyDays => write!(f, "90d"),
        }
    }
}

impl std::str::FromStr for Window {
    type Err = ConfigError;

    /// Strict: anything other than the three known selectors is a
    /// `ConfigError`. Falling back to a default here would present stats for
    /// a window the user never chose.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Window::SevenDays),
            "30d" => Ok(Window::ThirtyDays),
            "90d" => Ok(Window::NinetyDays),
            other => Err(ConfigError::UnknownWindow(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every calendar day in the range, ascending.
    pub fn iter_days(self) -> impl Iterator<Item = NaiveDate> {
        self.start
            .iter_days()
            .take_while(move |d| *d <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_parse_valid() {
        assert_eq!(Window::from_str("7d").unwrap(), Window::SevenDays);
        assert_eq!(Window::from_str("30d").unwrap(), Window::ThirtyDays);
        assert_eq!(Window::from_str("90d").unwrap(), Window::NinetyDays);
    }

    #[test]
    fn window_parse_rejects_unknown() {
        assert_eq!(
            Window::from_str("14d").unwrap_err(),
            ConfigError::UnknownWindow("14d".to_string())
        );
        assert!(Window::from_str("").is_err());
        assert!(Window::from_str("7D").is_err());
    }

    #[test]
    fn window_display_roundtrip() {
        for w in [Window::SevenDays, Window::ThirtyDays, Window::NinetyDays] {
            assert_eq!(Window::from_str(&w.to_string()).unwrap(), w);
        }
    }

    #[test]
    fn range_is_inclusive_of_today() {
        let today = date(2024, 6, 10);
        let r = Window::SevenDays.range(today);
        assert_eq!(r.start, date(2024, 6, 4));
        assert_eq!(r.end, today);
        assert!(r.contains(today));
        assert!(r.contains(r.start));
        assert!(!r.contains(date(2024, 6, 3)));
        assert!(!r.contains(date(2024, 6, 11)));
    }

    #[test]
    fn range_spans_month_boundary() {
        let r = Window::ThirtyDays.range(date(2024, 3, 5));
        assert_eq!(r.start, date(2024, 2, 5)); // 2024 is a leap year
        assert_eq!(r.iter_days().count(), 30);
    }

    #[test]
    fn iter_days_is_ascending_and_complete() {
        let r = Window::SevenDays.range(date(2024, 6, 10));
        let days: Vec<NaiveDate> = r.iter_days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days.first().copied(), Some(r.start));
        assert_eq!(days.last().copied(), Some(r.end));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }
}
