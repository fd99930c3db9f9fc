use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::ItineraryItem;

/// The activities planned for one calendar day of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<ItineraryItem>,
}

impl DayPlan {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            items: Vec::new(),
        }
    }

    /// Adds an item and restores time order.
    pub fn insert(&mut self, item: ItineraryItem) {
        self.items.push(item);
        self.sort_items();
    }

    /// Adds several items at once and restores time order.
    pub fn extend(&mut self, items: impl IntoIterator<Item = ItineraryItem>) {
        self.items.extend(items);
        self.sort_items();
    }

    /// Removes an item by id, returning it if it was present.
    pub fn remove(&mut self, item_id: &str) -> Option<ItineraryItem> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }

    // Stable: items sharing a time keep their insertion order.
    fn sort_items(&mut self) {
        self.items.sort_by(|a, b| a.time.cmp(&b.time));
    }
}
