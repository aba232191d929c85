//! Timeline operations

use chrono::{NaiveDate, Utc};

use super::models::{Lane, Timeline, TimelineItem, UpdateTimelineItemRequest, UpdateTimelineRequest};
use super::store::WorkspaceStore;
use crate::error::{AppError, Result};

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(AppError::InvalidInput(format!(
            "End date {} is before start date {}",
            end, start
        )));
    }
    Ok(())
}

impl WorkspaceStore {
    /// Create a timeline in the active folder
    pub fn create_timeline(
        &mut self,
        title: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String> {
        check_range(start_date, end_date)?;

        let id = Self::new_id();
        let now = Utc::now();
        let timeline = Timeline {
            id: id.clone(),
            title: title.to_string(),
            start_date,
            end_date,
            lanes: Vec::new(),
            items: Vec::new(),
            folder_id: self.active_folder_id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.timelines.insert(id.clone(), timeline);
        self.mark_changed();

        tracing::info!("Created timeline: {} ({})", title, id);
        Ok(id)
    }

    pub fn timeline(&self, id: &str) -> Result<&Timeline> {
        self.timelines
            .get(id)
            .ok_or_else(|| AppError::TimelineNotFound(id.to_string()))
    }

    fn timeline_mut(&mut self, id: &str) -> Result<&mut Timeline> {
        self.timelines
            .get_mut(id)
            .ok_or_else(|| AppError::TimelineNotFound(id.to_string()))
    }

    pub fn timelines(&self) -> Vec<&Timeline> {
        let mut timelines: Vec<&Timeline> = self.timelines.values().collect();
        timelines.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        timelines
    }

    pub fn update_timeline(&mut self, id: &str, req: UpdateTimelineRequest) -> Result<()> {
        let timeline = self.timeline_mut(id)?;

        let start_date = req.start_date.unwrap_or(timeline.start_date);
        let end_date = req.end_date.unwrap_or(timeline.end_date);
        check_range(start_date, end_date)?;

        if let Some(title) = req.title {
            timeline.title = title;
        }
        timeline.start_date = start_date;
        timeline.end_date = end_date;
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }

    pub fn delete_timeline(&mut self, id: &str) -> Result<()> {
        if self.timelines.remove(id).is_none() {
            return Err(AppError::TimelineNotFound(id.to_string()));
        }
        self.mark_changed();

        tracing::info!("Deleted timeline: {}", id);
        Ok(())
    }

    pub fn move_timeline_to_folder(&mut self, id: &str, folder_id: Option<&str>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            if !self.folders.contains_key(folder_id) {
                return Err(AppError::FolderNotFound(folder_id.to_string()));
            }
        }

        let timeline = self.timeline_mut(id)?;
        timeline.folder_id = folder_id.map(str::to_string);
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }

    // ===== Lanes =====

    pub fn add_lane(&mut self, timeline_id: &str, name: &str) -> Result<String> {
        let id = Self::new_id();
        let timeline = self.timeline_mut(timeline_id)?;
        timeline.lanes.push(Lane {
            id: id.clone(),
            name: name.to_string(),
        });
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(id)
    }

    pub fn rename_lane(&mut self, timeline_id: &str, lane_id: &str, name: &str) -> Result<()> {
        let timeline = self.timeline_mut(timeline_id)?;
        let lane = timeline
            .lanes
            .iter_mut()
            .find(|lane| lane.id == lane_id)
            .ok_or_else(|| AppError::LaneNotFound(lane_id.to_string()))?;
        lane.name = name.to_string();
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }

    /// Remove a lane together with the items placed on it
    pub fn remove_lane(&mut self, timeline_id: &str, lane_id: &str) -> Result<()> {
        let timeline = self.timeline_mut(timeline_id)?;
        if !timeline.lanes.iter().any(|lane| lane.id == lane_id) {
            return Err(AppError::LaneNotFound(lane_id.to_string()));
        }

        timeline.lanes.retain(|lane| lane.id != lane_id);
        timeline.items.retain(|item| item.lane_id != lane_id);
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }

    // ===== Items =====

    pub fn add_timeline_item(
        &mut self,
        timeline_id: &str,
        lane_id: &str,
        title: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String> {
        check_range(start_date, end_date)?;

        let id = Self::new_id();
        let timeline = self.timeline_mut(timeline_id)?;
        if !timeline.lanes.iter().any(|lane| lane.id == lane_id) {
            return Err(AppError::LaneNotFound(lane_id.to_string()));
        }

        timeline.items.push(TimelineItem {
            id: id.clone(),
            lane_id: lane_id.to_string(),
            title: title.to_string(),
            start_date,
            end_date,
        });
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(id)
    }

    pub fn update_timeline_item(
        &mut self,
        timeline_id: &str,
        item_id: &str,
        req: UpdateTimelineItemRequest,
    ) -> Result<()> {
        let timeline = self.timeline_mut(timeline_id)?;

        if let Some(lane_id) = &req.lane_id {
            if !timeline.lanes.iter().any(|lane| &lane.id == lane_id) {
                return Err(AppError::LaneNotFound(lane_id.clone()));
            }
        }

        let item = timeline
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| AppError::TimelineItemNotFound(item_id.to_string()))?;

        let start_date = req.start_date.unwrap_or(item.start_date);
        let end_date = req.end_date.unwrap_or(item.end_date);
        check_range(start_date, end_date)?;

        if let Some(lane_id) = req.lane_id {
            item.lane_id = lane_id;
        }
        if let Some(title) = req.title {
            item.title = title;
        }
        item.start_date = start_date;
        item.end_date = end_date;
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }

    pub fn remove_timeline_item(&mut self, timeline_id: &str, item_id: &str) -> Result<()> {
        let timeline = self.timeline_mut(timeline_id)?;
        let before = timeline.items.len();
        timeline.items.retain(|item| item.id != item_id);
        if timeline.items.len() == before {
            return Err(AppError::TimelineItemNotFound(item_id.to_string()));
        }
        timeline.updated_at = Utc::now();
        self.mark_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_create_timeline_rejects_inverted_range() {
        let mut store = WorkspaceStore::new();
        let result = store.create_timeline("Bad", date("2024-05-01"), date("2024-04-01"));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(store.timelines().is_empty());
    }

    #[test]
    fn test_lanes_and_items() {
        let mut store = WorkspaceStore::new();
        let id = store
            .create_timeline("Launch", date("2024-01-01"), date("2024-03-31"))
            .unwrap();
        let design = store.add_lane(&id, "Design").unwrap();
        let build = store.add_lane(&id, "Build").unwrap();

        let item = store
            .add_timeline_item(&id, &design, "Mockups", date("2024-01-02"), date("2024-01-20"))
            .unwrap();
        store
            .add_timeline_item(&id, &build, "Prototype", date("2024-02-01"), date("2024-03-01"))
            .unwrap();

        store
            .update_timeline_item(
                &id,
                &item,
                UpdateTimelineItemRequest {
                    lane_id: Some(build.clone()),
                    title: Some("Final mockups".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        store.remove_lane(&id, &build).unwrap();

        let timeline = store.timeline(&id).unwrap();
        assert_eq!(timeline.lanes.len(), 1);
        assert!(timeline.items.is_empty());
    }

    #[test]
    fn test_item_requires_existing_lane() {
        let mut store = WorkspaceStore::new();
        let id = store
            .create_timeline("Launch", date("2024-01-01"), date("2024-03-31"))
            .unwrap();

        let result = store.add_timeline_item(&id, "ghost", "Task", date("2024-01-01"), date("2024-01-02"));
        assert!(matches!(result, Err(AppError::LaneNotFound(_))));
    }

    #[test]
    fn test_update_timeline_keeps_unspecified_fields() {
        let mut store = WorkspaceStore::new();
        let id = store
            .create_timeline("Launch", date("2024-01-01"), date("2024-03-31"))
            .unwrap();

        store
            .update_timeline(
                &id,
                UpdateTimelineRequest {
                    end_date: Some(date("2024-04-30")),
                    ..Default::default()
                },
            )
            .unwrap();

        let timeline = store.timeline(&id).unwrap();
        assert_eq!(timeline.title, "Launch");
        assert_eq!(timeline.end_date, date("2024-04-30"));
    }
}
