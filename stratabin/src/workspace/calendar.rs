//! Calendar operations
//!
//! Events are grouped per `YYYY-MM-DD` date key. Each day's list stays
//! sorted by its zero-padded `HH:MM` time, which orders correctly as a string.

use chrono::{NaiveDate, NaiveTime};

use super::models::CalendarEvent;
use super::store::WorkspaceStore;
use crate::error::{AppError, Result};

fn validate_date(date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::InvalidInput(format!("Invalid calendar date: {}", date)))
}

fn validate_time(time: &str) -> Result<()> {
    // Parsing alone would accept "9:00", which breaks string ordering
    let well_formed = time.len() == 5 && NaiveTime::parse_from_str(time, "%H:%M").is_ok();
    if !well_formed {
        return Err(AppError::InvalidInput(format!(
            "Invalid event time {}, expected HH:MM",
            time
        )));
    }
    Ok(())
}

impl WorkspaceStore {
    pub fn add_calendar_event(&mut self, date: &str, time: &str, task: &str) -> Result<String> {
        validate_date(date)?;
        validate_time(time)?;

        let id = Self::new_id();
        let events = self.calendar_events.entry(date.to_string()).or_default();

        // After any events at the same time, so insertion order breaks ties
        let index = events.partition_point(|event| event.time.as_str() <= time);
        events.insert(
            index,
            CalendarEvent {
                id: id.clone(),
                time: time.to_string(),
                task: task.to_string(),
            },
        );
        self.mark_changed();

        tracing::debug!("Added calendar event {} on {} at {}", id, date, time);
        Ok(id)
    }

    /// Remove an event; the day's bucket is dropped once empty
    pub fn remove_calendar_event(&mut self, date: &str, id: &str) -> Result<()> {
        let events = self
            .calendar_events
            .get_mut(date)
            .ok_or_else(|| AppError::CalendarEventNotFound(id.to_string()))?;

        let before = events.len();
        events.retain(|event| event.id != id);
        if events.len() == before {
            return Err(AppError::CalendarEventNotFound(id.to_string()));
        }
        if events.is_empty() {
            self.calendar_events.remove(date);
        }
        self.mark_changed();
        Ok(())
    }

    /// Events on a date, in time order
    pub fn events_on(&self, date: &str) -> &[CalendarEvent] {
        self.calendar_events
            .get(date)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Dates that have at least one event, ascending
    pub fn dates_with_events(&self) -> Vec<&str> {
        self.calendar_events.keys().map(String::as_str).collect()
    }
}
