use crate::error::ScheduleResult;
use crate::schedule::Schedule;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Default, Serialize, Deserialize)]
struct TaskReportRecord {
    id: String,
    name: String,
    description: String,
    duration_days: i64,
    predecessors: String,
    resources: String,
    early_start: String,
    early_finish: String,
}

impl From<&Task> for TaskReportRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            description: task.description.clone().unwrap_or_default(),
            duration_days: task.duration_days,
            predecessors: task
                .predecessors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            resources: task.resource_names.join(";"),
            early_start: format_option_i64(task.early_start),
            early_finish: format_option_i64(task.early_finish),
        }
    }
}

/// Writes one CSV row per task with its computed timing.
pub fn save_schedule_report_csv<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> ScheduleResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in schedule.tasks() {
        writer.serialize(TaskReportRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_option_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use tempfile::NamedTempFile;

    #[test]
    fn report_lists_tasks_with_timing() {
        let mut schedule = Schedule::create(
            "Report",
            vec![
                Task::new(1, "Plan", 3).with_resources(["PM"]),
                Task::new(2, "Ship", 1).with_predecessors([1]).with_resources(["PM", "Ops"]),
            ],
            vec![Resource::new(1, "PM", 100), Resource::new(2, "Ops", 50)],
        )
        .unwrap();
        schedule.forward_pass().unwrap();

        let file = NamedTempFile::new().unwrap();
        save_schedule_report_csv(&schedule, file.path()).unwrap();

        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let rows: Vec<TaskReportRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].predecessors, "1");
        assert_eq!(rows[1].resources, "PM;Ops");
        assert_eq!(rows[1].early_start, "3");
        assert_eq!(rows[1].early_finish, "4");
    }
}
