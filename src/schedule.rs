use crate::calculations::forward_pass::ForwardPass;
use crate::error::ScheduleResult;
use crate::ids::{ResourceId, TaskId};
use crate::metadata::ScheduleMetadata;
use crate::resource::Resource;
use crate::task::Task;
use crate::task_validation;
use chrono::NaiveDateTime;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Link between one task and one resource, as persisted in documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub resource_count: usize,
    pub assignment_count: usize,
    pub milestone_count: usize,
    pub total_duration: i64,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("resources={}", self.resource_count));
        parts.push(format!("assignments={}", self.assignment_count));
        if self.milestone_count > 0 {
            parts.push(format!("milestones={}", self.milestone_count));
        }
        parts.push(format!("total_duration={}d", self.total_duration));
        parts.join(", ")
    }
}

/// Tasks, resources and project metadata of one project schedule.
///
/// Built once (from a plan or a decoded document) and validated on
/// construction; afterwards only the computed timing fields change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    metadata: ScheduleMetadata,
    tasks: Vec<Task>,
    resources: Vec<Resource>,
}

impl Schedule {
    /// Builds a new schedule stamped with the current time.
    pub fn create(
        project_name: impl Into<String>,
        tasks: Vec<Task>,
        resources: Vec<Resource>,
    ) -> ScheduleResult<Self> {
        Self::from_parts(ScheduleMetadata::new(project_name), tasks, resources)
    }

    /// Builds a schedule from already known metadata, e.g. a decoded document.
    pub fn from_parts(
        mut metadata: ScheduleMetadata,
        mut tasks: Vec<Task>,
        mut resources: Vec<Resource>,
    ) -> ScheduleResult<Self> {
        crate::task::trim_in_place(&mut metadata.project_name);
        for task in &mut tasks {
            task.normalize();
            task.clear_timing();
        }
        for resource in &mut resources {
            resource.normalize();
        }
        task_validation::validate_task_collection(&tasks)?;
        task_validation::validate_resource_collection(&resources)?;
        Ok(Self {
            metadata,
            tasks,
            resources,
        })
    }

    pub fn metadata(&self) -> &ScheduleMetadata {
        &self.metadata
    }

    pub fn project_name(&self) -> &str {
        &self.metadata.project_name
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.metadata.created_at
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn find_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == task_id)
    }

    pub fn find_resource(&self, resource_id: &ResourceId) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| &resource.id == resource_id)
    }

    pub fn find_resource_by_name(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    /// Task/resource links whose resource name resolves to a known resource,
    /// in task order. Names without a matching resource are skipped.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for task in &self.tasks {
            for resource_name in &task.resource_names {
                match self.find_resource_by_name(resource_name) {
                    Some(resource) => assignments.push(Assignment {
                        task_id: task.id.clone(),
                        resource_id: resource.id.clone(),
                    }),
                    None => tracing::debug!(
                        task_id = %task.id,
                        resource = %resource_name,
                        "skipping assignment to unknown resource"
                    ),
                }
            }
        }
        assignments
    }

    /// Fills `early_start`/`early_finish` on every task.
    ///
    /// On error the timing fields are left as they were.
    pub fn forward_pass(&mut self) -> ScheduleResult<()> {
        let results = ForwardPass::new(&self.tasks).execute()?;
        for task in &mut self.tasks {
            match results.get(&task.id) {
                Some(times) => {
                    task.early_start = Some(times.early_start);
                    task.early_finish = Some(times.early_finish);
                }
                None => task.clear_timing(),
            }
        }
        Ok(())
    }

    pub fn is_scheduled(&self) -> bool {
        self.tasks.iter().all(Task::is_scheduled)
    }

    /// Latest early finish across all tasks; 0 for an empty schedule.
    pub fn total_duration(&self) -> i64 {
        self.tasks
            .iter()
            .filter_map(|task| task.early_finish)
            .max()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            task_count: self.tasks.len(),
            resource_count: self.resources.len(),
            assignment_count: self.assignments().len(),
            milestone_count: self.tasks.iter().filter(|task| task.is_milestone()).count(),
            total_duration: self.total_duration(),
        }
    }

    fn task_table_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("id".into(), DataType::String),
            Field::new("name".into(), DataType::String),
            Field::new("duration_days".into(), DataType::Int64),
            Field::new("predecessors".into(), DataType::List(Box::new(DataType::String))),
            Field::new("resources".into(), DataType::List(Box::new(DataType::String))),
            Field::new("early_start".into(), DataType::Int64),
            Field::new("early_finish".into(), DataType::Int64),
        ])
    }

    /// Tabular view of the tasks, one row per task in schedule order.
    pub fn task_table(&self) -> PolarsResult<DataFrame> {
        if self.tasks.is_empty() {
            return Ok(DataFrame::empty_with_schema(&Self::task_table_schema()));
        }

        let ids: Vec<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        let names: Vec<&str> = self.tasks.iter().map(|t| t.name.as_str()).collect();
        let durations: Vec<i64> = self.tasks.iter().map(|t| t.duration_days).collect();
        let predecessors: Vec<Series> = self
            .tasks
            .iter()
            .map(|t| {
                let values: Vec<&str> = t.predecessors.iter().map(TaskId::as_str).collect();
                Series::new(PlSmallStr::from_static(""), values)
            })
            .collect();
        let resources: Vec<Series> = self
            .tasks
            .iter()
            .map(|t| {
                let values: Vec<&str> = t.resource_names.iter().map(String::as_str).collect();
                Series::new(PlSmallStr::from_static(""), values)
            })
            .collect();
        let early_start: Vec<Option<i64>> = self.tasks.iter().map(|t| t.early_start).collect();
        let early_finish: Vec<Option<i64>> = self.tasks.iter().map(|t| t.early_finish).collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("id"), ids).into_column(),
            Series::new(PlSmallStr::from_static("name"), names).into_column(),
            Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
            Series::new(PlSmallStr::from_static("predecessors"), predecessors).into_column(),
            Series::new(PlSmallStr::from_static("resources"), resources).into_column(),
            Series::new(PlSmallStr::from_static("early_start"), early_start).into_column(),
            Series::new(PlSmallStr::from_static("early_finish"), early_finish).into_column(),
        ];
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;

    fn sample() -> Schedule {
        Schedule::create(
            "Sample",
            vec![
                Task::new(1, "Design", 2).with_resources(["Ana"]),
                Task::new(2, "Build", 4)
                    .with_predecessors([1])
                    .with_resources(["Ana", "Ghost"]),
            ],
            vec![Resource::new(10, "Ana", 100)],
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_duplicate_resource_ids() {
        let err = Schedule::create(
            "Dup",
            vec![],
            vec![Resource::new(1, "A", 100), Resource::new(1, "B", 100)],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[test]
    fn lookups_return_none_when_missing() {
        let schedule = sample();
        assert!(schedule.find_task(&TaskId::from(2)).is_some());
        assert!(schedule.find_task(&TaskId::from(3)).is_none());
        assert!(schedule.find_resource_by_name("Ana").is_some());
        assert!(schedule.find_resource_by_name("Ghost").is_none());
    }

    #[test]
    fn assignments_skip_unknown_resource_names() {
        let schedule = sample();
        let assignments = schedule.assignments();
        assert_eq!(assignments.len(), 2);
        assert!(assignments
            .iter()
            .all(|a| a.resource_id == ResourceId::from(10)));
    }

    #[test]
    fn timing_is_unset_until_forward_pass() {
        let mut schedule = sample();
        assert!(!schedule.is_scheduled());
        assert_eq!(schedule.total_duration(), 0);
        schedule.forward_pass().unwrap();
        assert!(schedule.is_scheduled());
        assert_eq!(schedule.total_duration(), 6);
        assert_eq!(
            schedule.summary().to_cli_summary(),
            "tasks=2, resources=1, assignments=2, total_duration=6d"
        );
    }

    #[test]
    fn task_table_has_one_row_per_task() {
        let mut schedule = sample();
        schedule.forward_pass().unwrap();
        let df = schedule.task_table().unwrap();
        assert_eq!(df.height(), 2);
        let finish = df.column("early_finish").unwrap().i64().unwrap();
        assert_eq!(finish.get(1), Some(6));
    }

    #[test]
    fn empty_schedule_has_empty_table_and_zero_duration() {
        let mut schedule = Schedule::create("Empty", vec![], vec![]).unwrap();
        schedule.forward_pass().unwrap();
        assert_eq!(schedule.total_duration(), 0);
        assert_eq!(schedule.task_table().unwrap().height(), 0);
    }
}
