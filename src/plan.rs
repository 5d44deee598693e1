//! Structured project plan produced by the language model.
//!
//! The model is asked for a JSON object with a project name, tasks and
//! resources. Its answer is not trusted: [`parse_model_response`] extracts the
//! JSON part when there is one, falls back to a line heuristic for plain
//! prose, and finally to a fixed four-phase plan.

use crate::error::ScheduleResult;
use crate::ids::{ResourceId, TaskId};
use crate::resource::Resource;
use crate::schedule::Schedule;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PROJECT_NAME: &str = "New Project";
pub const DEFAULT_TASK_DURATION_DAYS: i64 = 5;
pub const DEFAULT_CAPACITY_PERCENT: i64 = 100;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("model output does not match the plan shape: {0}")]
    Shape(#[from] serde_json::Error),
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_duration() -> i64 {
    DEFAULT_TASK_DURATION_DAYS
}

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY_PERCENT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default)]
    pub tasks: Vec<PlannedTask>,
    #[serde(default)]
    pub resources: Vec<PlannedResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub id: TaskId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Days.
    #[serde(default = "default_duration")]
    pub duration: i64,
    #[serde(default)]
    pub predecessors: Vec<TaskId>,
    /// Resource names.
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedResource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Percent.
    #[serde(default = "default_capacity")]
    pub capacity: i64,
}

/// How a plan was obtained from the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Structured,
    Unstructured,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlan {
    pub plan: ProjectPlan,
    pub source: PlanSource,
}

impl ProjectPlan {
    /// Strict parse of the JSON contract.
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The degraded-mode plan used whenever the model output is unusable.
    pub fn default_plan() -> Self {
        let task = |id: i64, name: &str, description: &str, duration: i64, preds: &[i64], res: &[&str]| {
            PlannedTask {
                id: TaskId::from(id),
                name: name.to_string(),
                description: Some(description.to_string()),
                duration,
                predecessors: preds.iter().map(|p| TaskId::from(*p)).collect(),
                resources: res.iter().map(|r| r.to_string()).collect(),
            }
        };
        let resource = |id: i64, name: &str, role: &str, capacity: i64| PlannedResource {
            id: ResourceId::from(id),
            name: name.to_string(),
            role: Some(role.to_string()),
            capacity,
        };

        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            tasks: vec![
                task(1, "Planning", "Initial project planning", 5, &[], &["Project Manager"]),
                task(2, "Development", "Main development phase", 20, &[1], &["Developer"]),
                task(3, "Testing", "Quality assurance and testing", 10, &[2], &["QA Engineer"]),
                task(
                    4,
                    "Deployment",
                    "Project deployment",
                    2,
                    &[3],
                    &["DevOps Engineer", "Project Manager"],
                ),
            ],
            resources: vec![
                resource(1, "Project Manager", "Management", 100),
                resource(2, "Developer", "Development", 100),
                resource(3, "QA Engineer", "Quality Assurance", 100),
                resource(4, "DevOps Engineer", "Operations", 50),
            ],
        }
    }

    /// Builds the schedule model; duplicate ids and similar integrity problems
    /// are reported as validation errors.
    pub fn to_schedule(&self, project_name: &str) -> ScheduleResult<Schedule> {
        let tasks = self
            .tasks
            .iter()
            .map(|planned| {
                let mut task = Task::new(planned.id.clone(), planned.name.clone(), planned.duration);
                task.description = planned.description.clone();
                task.predecessors = planned.predecessors.clone();
                task.resource_names = planned.resources.clone();
                task
            })
            .collect();
        let resources = self
            .resources
            .iter()
            .map(|planned| {
                let mut resource = Resource::new(
                    planned.id.clone(),
                    planned.name.clone(),
                    planned.capacity,
                );
                resource.role = planned.role.clone();
                resource
            })
            .collect();
        Schedule::create(project_name, tasks, resources)
    }
}

/// Interprets raw model output, never failing.
pub fn parse_model_response(response: &str) -> ParsedPlan {
    match extract_json_object(response) {
        Some(json) => match ProjectPlan::from_json(json) {
            Ok(plan) => ParsedPlan {
                plan,
                source: PlanSource::Structured,
            },
            Err(err) => {
                tracing::warn!(error = %err, "model output is not a valid plan, using default plan");
                default_parsed()
            }
        },
        None => match parse_unstructured(response) {
            Some(plan) => ParsedPlan {
                plan,
                source: PlanSource::Unstructured,
            },
            None => {
                tracing::warn!("no tasks found in model output, using default plan");
                default_parsed()
            }
        },
    }
}

fn default_parsed() -> ParsedPlan {
    ParsedPlan {
        plan: ProjectPlan::default_plan(),
        source: PlanSource::Default,
    }
}

/// Text from the first `{` through the last `}`.
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end > start {
        Some(&response[start..=end])
    } else {
        None
    }
}

/// Line heuristic for prose answers: `Task ...: description` and
/// `Resource ...: role` lines. Returns `None` when no task line is found.
fn parse_unstructured(response: &str) -> Option<ProjectPlan> {
    let mut tasks = Vec::new();
    let mut resources: Vec<PlannedResource> = Vec::new();

    for line in response.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        let Some((head, tail)) = line.split_once(':') else {
            continue;
        };
        let tail = tail.trim();

        if lower.contains("task") {
            let duration = if tail.to_lowercase().contains("day") {
                tail.split_whitespace()
                    .find(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()))
                    .and_then(|word| word.parse::<i64>().ok())
                    .unwrap_or(DEFAULT_TASK_DURATION_DAYS)
            } else {
                DEFAULT_TASK_DURATION_DAYS
            };
            let number = tasks.len() as i64 + 1;
            tasks.push(PlannedTask {
                id: TaskId::from(number),
                name: label_or(head, "Task", number),
                description: Some(tail.to_string()).filter(|d| !d.is_empty()),
                duration,
                predecessors: Vec::new(),
                resources: Vec::new(),
            });
        } else if lower.contains("resource") {
            let number = resources.len() as i64 + 1;
            let name = label_or(head, "Resource", number);
            if resources.iter().any(|r| r.name == name) {
                tracing::debug!(%name, "skipping repeated resource line");
                continue;
            }
            resources.push(PlannedResource {
                id: ResourceId::from(number),
                name,
                role: Some(tail.to_string()).filter(|r| !r.is_empty()),
                capacity: DEFAULT_CAPACITY_PERCENT,
            });
        }
    }

    if tasks.is_empty() {
        return None;
    }
    Some(ProjectPlan {
        project_name: "Extracted Project".to_string(),
        tasks,
        resources,
    })
}

/// Strips the keyword from a line label, numbering the entry when nothing is left.
fn label_or(head: &str, keyword: &str, number: i64) -> String {
    let label = head.replace(keyword, "");
    let label = label.trim();
    if label.is_empty() {
        format!("{keyword} {number}")
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_extracted_from_surrounding_prose() {
        let response = r#"Here is your plan:
{"project_name": "Site", "tasks": [{"id": 1, "name": "Design", "duration": 3}], "resources": []}
Good luck!"#;
        let parsed = parse_model_response(response);
        assert_eq!(parsed.source, PlanSource::Structured);
        assert_eq!(parsed.plan.project_name, "Site");
        assert_eq!(parsed.plan.tasks[0].id, TaskId::from(1));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let plan = ProjectPlan::from_json(
            r#"{"tasks": [{"id": "a", "name": "Draft"}], "resources": [{"id": 1, "name": "Ann"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.project_name, DEFAULT_PROJECT_NAME);
        assert_eq!(plan.tasks[0].duration, DEFAULT_TASK_DURATION_DAYS);
        assert!(plan.tasks[0].predecessors.is_empty());
        assert_eq!(plan.resources[0].capacity, DEFAULT_CAPACITY_PERCENT);
    }

    #[test]
    fn broken_json_falls_back_to_default_plan() {
        let parsed = parse_model_response("{ this is not json }");
        assert_eq!(parsed.source, PlanSource::Default);
        assert_eq!(parsed.plan, ProjectPlan::default_plan());
    }

    #[test]
    fn prose_lines_become_tasks_and_resources() {
        let response = "Task Research: takes 4 days of reading\n\
                        Task Write: draft the report\n\
                        Resource Analyst: research lead";
        let parsed = parse_model_response(response);
        assert_eq!(parsed.source, PlanSource::Unstructured);
        let plan = parsed.plan;
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].name, "Research");
        assert_eq!(plan.tasks[0].duration, 4);
        assert_eq!(plan.tasks[1].duration, DEFAULT_TASK_DURATION_DAYS);
        assert_eq!(plan.resources[0].name, "Analyst");
        assert_eq!(plan.resources[0].role.as_deref(), Some("research lead"));
    }

    #[test]
    fn unlabeled_prose_lines_get_numbered_names() {
        let response = "Task: gather requirements over 3 days\n\
                        Task: build it\n\
                        Resource: backend developer\n\
                        Resource Analyst: first mention\n\
                        Resource Analyst: second mention";
        let parsed = parse_model_response(response);
        assert_eq!(parsed.source, PlanSource::Unstructured);
        let plan = parsed.plan;
        let task_names: Vec<&str> = plan.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(task_names, vec!["Task 1", "Task 2"]);
        let resource_names: Vec<&str> = plan.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(resource_names, vec!["Resource 1", "Analyst"]);
        assert_eq!(plan.resources[1].role.as_deref(), Some("first mention"));

        let schedule = plan.to_schedule(&plan.project_name).unwrap();
        assert_eq!(schedule.tasks().len(), 2);
    }

    #[test]
    fn prose_without_tasks_falls_back_to_default() {
        let parsed = parse_model_response("I could not understand the document.");
        assert_eq!(parsed.source, PlanSource::Default);
    }

    #[test]
    fn default_plan_schedules_to_thirty_seven_days() {
        let mut schedule = ProjectPlan::default_plan().to_schedule("Fallback").unwrap();
        schedule.forward_pass().unwrap();
        let finishes: Vec<i64> = schedule
            .tasks()
            .iter()
            .map(|t| t.early_finish.unwrap())
            .collect();
        assert_eq!(finishes, vec![5, 25, 35, 37]);
        assert_eq!(schedule.total_duration(), 37);
    }
}
