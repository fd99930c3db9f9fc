//! Edits to a single trip's days, items and memo.
//!
//! The editor never mutates the trip it was given; each operation returns
//! the edited copy for the caller to store or push.

use chrono::{NaiveDate, NaiveTime};
use std::fmt;

use crate::models::{DayPlan, ItineraryItem, Trip};

/// Form input for a new itinerary item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub time: String,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
}

impl NewItem {
    pub fn new(time: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

pub struct ItineraryEditor<'a> {
    trip: &'a Trip,
    read_only: bool,
}

impl<'a> ItineraryEditor<'a> {
    pub fn new(trip: &'a Trip) -> Self {
        Self {
            trip,
            read_only: false,
        }
    }

    /// An editor that rejects every change.
    pub fn read_only(trip: &'a Trip) -> Self {
        Self {
            trip,
            read_only: true,
        }
    }

    pub fn trip(&self) -> &Trip {
        self.trip
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Adds a user-entered item to the day at `date`.
    ///
    /// Time and title are required; the time is normalized to `HH:MM`.
    pub fn add_item(&self, date: NaiveDate, item: NewItem) -> Result<Trip, EditError> {
        self.ensure_writable()?;

        let title = item.title.trim();
        if title.is_empty() {
            return Err(EditError::MissingField("title"));
        }
        let time = normalize_time(&item.time)?;

        let mut new_item = ItineraryItem::new(time, title).with_description(item.description);
        if let Some(link) = item.link.filter(|link| !link.trim().is_empty()) {
            new_item = new_item.with_link(link.trim());
        }

        self.edit_day(date, |day| {
            day.insert(new_item);
            Ok(())
        })
    }

    /// Adds accepted suggestions to the day at `date` without validating them.
    pub fn add_suggested_items(
        &self,
        date: NaiveDate,
        items: Vec<ItineraryItem>,
    ) -> Result<Trip, EditError> {
        self.ensure_writable()?;
        self.edit_day(date, |day| {
            day.extend(items);
            Ok(())
        })
    }

    pub fn delete_item(&self, date: NaiveDate, item_id: &str) -> Result<Trip, EditError> {
        self.ensure_writable()?;
        self.edit_day(date, |day| {
            day.remove(item_id)
                .map(|_| ())
                .ok_or_else(|| EditError::UnknownItem(item_id.to_string()))
        })
    }

    pub fn set_memo(&self, memo: impl Into<String>) -> Result<Trip, EditError> {
        self.ensure_writable()?;
        let mut trip = self.trip.clone();
        trip.memo = memo.into();
        Ok(trip)
    }

    fn ensure_writable(&self) -> Result<(), EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        Ok(())
    }

    fn edit_day<F>(&self, date: NaiveDate, f: F) -> Result<Trip, EditError>
    where
        F: FnOnce(&mut DayPlan) -> Result<(), EditError>,
    {
        let mut trip = self.trip.clone();
        let day = trip.day_mut(date).ok_or(EditError::UnknownDay(date))?;
        f(day)?;
        Ok(trip)
    }
}

fn normalize_time(time: &str) -> Result<String, EditError> {
    let time = time.trim();
    if time.is_empty() {
        return Err(EditError::MissingField("time"));
    }
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| EditError::InvalidTime(time.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The trip is a read-only snapshot.
    ReadOnly,
    /// No trip is open for editing.
    NoTripSelected,
    /// The trip has no day with this date.
    UnknownDay(NaiveDate),
    /// The day has no item with this id.
    UnknownItem(String),
    /// A required field was empty.
    MissingField(&'static str),
    /// Time was not `HH:MM`.
    InvalidTime(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ReadOnly => write!(f, "This trip is read-only"),
            EditError::NoTripSelected => write!(f, "No trip is open"),
            EditError::UnknownDay(date) => write!(f, "Trip has no day {}", date),
            EditError::UnknownItem(id) => write!(f, "No item with id {}", id),
            EditError::MissingField(field) => write!(f, "Item {} must not be empty", field),
            EditError::InvalidTime(time) => {
                write!(f, "Invalid time '{}'. Use HH:MM.", time)
            }
        }
    }
}

impl std::error::Error for EditError {}
