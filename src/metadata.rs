use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub project_name: String,
    /// Set once when the schedule is first built; never changed afterwards.
    pub created_at: NaiveDateTime,
}

impl ScheduleMetadata {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            // Documents store microseconds.
            created_at: Local::now().naive_local().trunc_subsecs(6),
        }
    }

    pub fn with_created_at(project_name: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            project_name: project_name.into(),
            created_at,
        }
    }
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self::new("New Project")
    }
}
