use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids;

/// One scheduled activity within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: String,
    /// Time of day as `HH:MM`; items in a day are ordered by this string.
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl ItineraryItem {
    pub fn new(time: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ids::time_token(),
            time: time.into(),
            title: title.into(),
            description: String::new(),
            link: None,
        }
    }

    /// Builds an item proposed by the suggestion service.
    pub fn suggested(
        time: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ids::suggestion_token(),
            time: time.into(),
            title: title.into(),
            description: description.into(),
            link: None,
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

impl fmt::Display for ItineraryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.time, self.title)?;
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        if let Some(link) = &self.link {
            write!(f, " <{}>", link)?;
        }
        Ok(())
    }
}
