//! XML project document codec.
//!
//! A document has four sections: `ProjectInfo`, `Tasks`, `Resources` and
//! `Assignments`. Tasks and resources are only linked through assignment
//! records that repeat the task and resource ids.

use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::{ResourceId, TaskId};
use crate::metadata::ScheduleMetadata;
use crate::resource::Resource;
use crate::schedule::Schedule;
use crate::task::Task;
use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ROOT_TAG: &str = "Project";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const CREATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const LENIENT_DURATION_DAYS: i64 = 0;
const LENIENT_CAPACITY_PERCENT: i64 = 100;

/// How unparsable `Duration` and `Capacity` values are handled on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericFieldPolicy {
    /// Fail the whole document with a format error.
    #[default]
    Strict,
    /// Log a warning and substitute a default (0 days, 100%).
    Lenient,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub numeric_fields: NumericFieldPolicy,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            numeric_fields: NumericFieldPolicy::Strict,
        }
    }

    pub fn lenient() -> Self {
        Self {
            numeric_fields: NumericFieldPolicy::Lenient,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ProjectDocument {
    #[serde(rename = "ProjectInfo")]
    project_info: ProjectInfoRecord,
    #[serde(rename = "Tasks", default)]
    tasks: TaskSection,
    #[serde(rename = "Resources", default)]
    resources: ResourceSection,
    #[serde(rename = "Assignments", default)]
    assignments: AssignmentSection,
}

#[derive(Serialize, Deserialize)]
struct ProjectInfoRecord {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "CreationDate")]
    creation_date: String,
}

#[derive(Default, Serialize, Deserialize)]
struct TaskSection {
    #[serde(rename = "Task", default)]
    items: Vec<TaskRecord>,
}

#[derive(Serialize, Deserialize)]
struct TaskRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Duration")]
    duration: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "Predecessors", default, skip_serializing_if = "Option::is_none")]
    predecessors: Option<PredecessorSection>,
}

#[derive(Default, Serialize, Deserialize)]
struct PredecessorSection {
    #[serde(rename = "Predecessor", default)]
    items: Vec<PredecessorRecord>,
}

#[derive(Serialize, Deserialize)]
struct PredecessorRecord {
    #[serde(rename = "ID", default)]
    id: String,
}

#[derive(Default, Serialize, Deserialize)]
struct ResourceSection {
    #[serde(rename = "Resource", default)]
    items: Vec<ResourceRecord>,
}

#[derive(Serialize, Deserialize)]
struct ResourceRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Capacity")]
    capacity: String,
    #[serde(rename = "Role", default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct AssignmentSection {
    #[serde(rename = "Assignment", default)]
    items: Vec<AssignmentRecord>,
}

#[derive(Serialize, Deserialize)]
struct AssignmentRecord {
    #[serde(rename = "TaskID")]
    task_id: String,
    #[serde(rename = "ResourceID")]
    resource_id: String,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        let predecessors = if task.predecessors.is_empty() {
            None
        } else {
            Some(PredecessorSection {
                items: task
                    .predecessors
                    .iter()
                    .map(|id| PredecessorRecord {
                        id: id.to_string(),
                    })
                    .collect(),
            })
        };
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            duration: format!("{}d", task.duration_days),
            description: task
                .description
                .clone()
                .filter(|text| !text.trim().is_empty()),
            predecessors,
        }
    }
}

impl From<&Resource> for ResourceRecord {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.to_string(),
            name: resource.name.clone(),
            capacity: format!("{}%", resource.capacity_percent),
            role: resource.role.clone(),
        }
    }
}

impl ProjectDocument {
    fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            project_info: ProjectInfoRecord {
                name: schedule.project_name().to_string(),
                creation_date: schedule
                    .created_at()
                    .format(CREATION_DATE_FORMAT)
                    .to_string(),
            },
            tasks: TaskSection {
                items: schedule.tasks().iter().map(TaskRecord::from).collect(),
            },
            resources: ResourceSection {
                items: schedule
                    .resources()
                    .iter()
                    .map(ResourceRecord::from)
                    .collect(),
            },
            assignments: AssignmentSection {
                items: schedule
                    .assignments()
                    .into_iter()
                    .map(|assignment| AssignmentRecord {
                        task_id: assignment.task_id.to_string(),
                        resource_id: assignment.resource_id.to_string(),
                    })
                    .collect(),
            },
        }
    }

    fn into_schedule(self, options: &DecodeOptions) -> ScheduleResult<Schedule> {
        let created_at = parse_creation_date(&self.project_info.creation_date)?;

        let mut resources = Vec::with_capacity(self.resources.items.len());
        for record in self.resources.items {
            let capacity_percent = match parse_suffixed_integer(&record.capacity) {
                Some(value) => value,
                None => recover_numeric(
                    options,
                    "capacity",
                    &record.id,
                    &record.capacity,
                    LENIENT_CAPACITY_PERCENT,
                )?,
            };
            let mut resource = Resource::new(record.id.trim(), record.name, capacity_percent);
            resource.role = record.role;
            resources.push(resource);
        }

        let resource_names: HashMap<&str, &str> = resources
            .iter()
            .map(|resource| (resource.id.as_str(), resource.name.as_str()))
            .collect();

        let mut tasks = Vec::with_capacity(self.tasks.items.len());
        for record in self.tasks.items {
            let task_id = TaskId::from(record.id.trim());
            let duration_days = match parse_suffixed_integer(&record.duration) {
                Some(value) => value,
                None => recover_numeric(
                    options,
                    "duration",
                    task_id.as_str(),
                    &record.duration,
                    LENIENT_DURATION_DAYS,
                )?,
            };
            let mut task = Task::new(task_id, record.name, duration_days);
            task.description = record.description;
            task.predecessors = record
                .predecessors
                .map(|section| section.items)
                .unwrap_or_default()
                .into_iter()
                .map(|pred| pred.id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(TaskId::from)
                .collect();
            tasks.push(task);
        }

        for record in &self.assignments.items {
            let task_id = record.task_id.trim();
            let resource_id = record.resource_id.trim();
            let Some(task) = tasks.iter_mut().find(|task| task.id.as_str() == task_id) else {
                tracing::warn!(task_id, resource_id, "dropping assignment to unknown task");
                continue;
            };
            let Some(name) = resource_names.get(resource_id) else {
                tracing::warn!(task_id, resource_id, "dropping assignment to unknown resource");
                continue;
            };
            task.resource_names.push((*name).to_string());
        }

        let metadata = ScheduleMetadata::with_created_at(self.project_info.name, created_at);
        Schedule::from_parts(metadata, tasks, resources)
    }
}

/// Strips any trailing unit marker (`d`, `%`, ...) and parses the integer.
fn parse_suffixed_integer(input: &str) -> Option<i64> {
    let digits = input
        .trim()
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .trim();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

fn recover_numeric(
    options: &DecodeOptions,
    field: &str,
    owner_id: &str,
    raw: &str,
    fallback: i64,
) -> ScheduleResult<i64> {
    match options.numeric_fields {
        NumericFieldPolicy::Strict => Err(ScheduleError::format(format!(
            "invalid {field} '{raw}' for record {owner_id}"
        ))),
        NumericFieldPolicy::Lenient => {
            tracing::warn!(field, owner_id, raw, fallback, "substituting unparsable value");
            Ok(fallback)
        }
    }
}

fn parse_creation_date(input: &str) -> ScheduleResult<NaiveDateTime> {
    let text = input.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_local()))
        .map_err(|err| ScheduleError::format(format!("invalid CreationDate '{input}': {err}")))
}

fn root_tag(xml: &str) -> ScheduleResult<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Ok(String::from_utf8_lossy(element.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(ScheduleError::format("document has no root element")),
            Ok(_) => {}
            Err(err) => return Err(ScheduleError::format(format!("malformed XML: {err}"))),
        }
    }
}

/// Renders a schedule as an XML project document.
pub fn encode_schedule(schedule: &Schedule) -> ScheduleResult<String> {
    let document = ProjectDocument::from_schedule(schedule);
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_TAG))
        .map_err(|err| ScheduleError::format(format!("cannot encode document: {err}")))?;
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|err| ScheduleError::format(format!("cannot encode document: {err}")))?;
    Ok(format!("{XML_DECLARATION}\n{body}\n"))
}

/// Parses an XML project document and runs the forward pass on the result.
pub fn decode_schedule(xml: &str, options: &DecodeOptions) -> ScheduleResult<Schedule> {
    let root = root_tag(xml)?;
    if root != ROOT_TAG {
        return Err(ScheduleError::format(format!(
            "expected root element <{ROOT_TAG}>, found <{root}>"
        )));
    }
    let document: ProjectDocument = quick_xml::de::from_str(xml)
        .map_err(|err| ScheduleError::format(format!("unexpected document shape: {err}")))?;
    let mut schedule = document.into_schedule(options)?;
    schedule.forward_pass()?;
    Ok(schedule)
}

pub fn save_schedule_to_xml<P: AsRef<Path>>(schedule: &Schedule, path: P) -> ScheduleResult<()> {
    let xml = encode_schedule(schedule)?;
    fs::write(path.as_ref(), xml)?;
    Ok(())
}

pub fn load_schedule_from_xml<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> ScheduleResult<Schedule> {
    let path = path.as_ref();
    let xml = match fs::read_to_string(path) {
        Ok(xml) => xml,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ScheduleError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    decode_schedule(&xml, options)
}

/// Decodes several documents in parallel; each result is independent.
pub fn load_schedules(
    paths: &[PathBuf],
    options: &DecodeOptions,
) -> Vec<(PathBuf, ScheduleResult<Schedule>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), load_schedule_from_xml(path, options)))
        .collect()
}

/// File stem for a project document: the project name with every character
/// outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn document_file_stem(project_name: &str) -> String {
    let stem: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "project".to_string()
    } else {
        stem
    }
}

/// Writes the schedule under `output_dir` with a fresh unique file name.
pub fn write_schedule_document<P: AsRef<Path>>(
    schedule: &Schedule,
    output_dir: P,
) -> ScheduleResult<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    let file_name = format!(
        "{}_{}.xml",
        document_file_stem(schedule.project_name()),
        Uuid::new_v4()
    );
    let path = output_dir.join(file_name);
    save_schedule_to_xml(schedule, &path)?;
    tracing::info!(path = %path.display(), "wrote project document");
    Ok(path)
}
