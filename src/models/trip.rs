use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::color::color_for;
use super::day_plan::DayPlan;
use super::ids;

/// A trip spanning an inclusive date range, with one plan per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub color: String,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub memo: String,
}

impl Trip {
    /// Creates a trip with a fresh time-based id.
    pub fn new(
        title: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, TripError> {
        Self::with_id(ids::time_token(), title, destination, start_date, end_date)
    }

    /// Creates a trip with a caller-chosen id.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, TripError> {
        let title = title.into();
        let destination = destination.into();

        if title.trim().is_empty() {
            return Err(TripError::MissingField("title"));
        }
        if destination.trim().is_empty() {
            return Err(TripError::MissingField("destination"));
        }
        if start_date > end_date {
            return Err(TripError::EndBeforeStart {
                start: start_date,
                end: end_date,
            });
        }

        let id = id.into();
        let days = date_range(start_date, end_date)
            .into_iter()
            .map(DayPlan::new)
            .collect();

        Ok(Self {
            color: color_for(&id).to_string(),
            id,
            title,
            destination,
            start_date,
            end_date,
            days,
            memo: String::new(),
        })
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayPlan> {
        self.days.iter_mut().find(|day| day.date == date)
    }

    pub fn item_count(&self) -> usize {
        self.days.iter().map(|day| day.items.len()).sum()
    }
}

/// Every date from `start` to `end`, both inclusive.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|date| *date <= end).collect()
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        writeln!(f, "Destination: {}", self.destination)?;
        writeln!(f, "Dates: {} to {}", self.start_date, self.end_date)?;
        writeln!(f, "Color: {}", self.color)?;

        for day in &self.days {
            writeln!(f, "\n{}", day.date)?;
            if day.items.is_empty() {
                writeln!(f, "  (nothing planned)")?;
            }
            for item in &day.items {
                writeln!(f, "  {}", item)?;
            }
        }

        if !self.memo.is_empty() {
            writeln!(f, "\nMemo:")?;
            for line in self.memo.lines() {
                writeln!(f, "  {}", line)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripError {
    /// A required text field was empty.
    MissingField(&'static str),
    /// The end date falls before the start date.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for TripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripError::MissingField(field) => write!(f, "Trip {} must not be empty", field),
            TripError::EndBeforeStart { start, end } => write!(
                f,
                "End date {} must not be before start date {}",
                end, start
            ),
        }
    }
}

impl std::error::Error for TripError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItineraryItem;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_trip_has_one_empty_day_per_date() {
        let trip = Trip::new("Winter", "Sapporo", date(2024, 1, 1), date(2024, 1, 3)).unwrap();

        let dates: Vec<String> = trip.days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert!(trip.days.iter().all(|d| d.items.is_empty()));
        assert_eq!(trip.memo, "");
    }

    #[test]
    fn test_single_day_trip() {
        let trip = Trip::new("Day trip", "Nara", date(2024, 5, 5), date(2024, 5, 5)).unwrap();
        assert_eq!(trip.days.len(), 1);
    }

    #[test]
    fn test_range_crosses_month_and_leap_day() {
        let days = date_range(date(2024, 2, 28), date(2024, 3, 1));
        assert_eq!(
            days,
            vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = Trip::new("Backwards", "Osaka", date(2024, 1, 3), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, TripError::EndBeforeStart { .. }));
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = Trip::new("  ", "Osaka", date(2024, 1, 1), date(2024, 1, 1)).unwrap_err();
        assert_eq!(err, TripError::MissingField("title"));
    }

    #[test]
    fn test_color_derived_from_id() {
        let trip = Trip::with_id("t1", "T", "D", date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        assert_eq!(trip.color, color_for("t1"));
    }

    #[test]
    fn test_trip_json_uses_camel_case() {
        let trip = Trip::with_id("t1", "T", "D", date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let json = serde_json::to_value(&trip).unwrap();

        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["endDate"], "2024-01-01");
        assert_eq!(json["days"][0]["date"], "2024-01-01");
        assert_eq!(json["memo"], "");
    }

    #[test]
    fn test_item_count_and_day_lookup() {
        let mut trip = Trip::new("T", "D", date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        trip.day_mut(date(2024, 1, 2))
            .unwrap()
            .insert(ItineraryItem::new("10:00", "Walk"));

        assert_eq!(trip.item_count(), 1);
        assert!(trip.day(date(2024, 1, 3)).is_none());
    }

    #[test]
    fn test_trip_display() {
        let trip = Trip::new("Kyoto Weekend", "Kyoto", date(2024, 4, 1), date(2024, 4, 2)).unwrap();
        let output = trip.to_string();
        assert!(output.contains("Kyoto Weekend"));
        assert!(output.contains("2024-04-02"));
        assert!(output.contains("(nothing planned)"));
    }
}
