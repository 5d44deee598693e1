use crate::ids::TaskId;
use serde::{Deserialize, Serialize};

/// A unit of work in a schedule.
///
/// `early_start` and `early_finish` are day offsets from project start (day 0)
/// and stay `None` until the forward pass has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_days: i64,
    /// Finish-to-start predecessors, in the order they were declared.
    #[serde(default)]
    pub predecessors: Vec<TaskId>,
    /// Names of the resources working on this task. The persisted form links
    /// tasks to resources through assignment records only.
    #[serde(default)]
    pub resource_names: Vec<String>,
    #[serde(default)]
    pub early_start: Option<i64>,
    #[serde(default)]
    pub early_finish: Option<i64>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            duration_days,
            predecessors: Vec::new(),
            resource_names: Vec::new(),
            early_start: None,
            early_finish: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_predecessors<I, T>(mut self, predecessors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.predecessors = predecessors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I, S>(mut self, resource_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_names = resource_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_milestone(&self) -> bool {
        self.duration_days == 0
    }

    pub fn is_scheduled(&self) -> bool {
        self.early_start.is_some() && self.early_finish.is_some()
    }

    pub(crate) fn clear_timing(&mut self) {
        self.early_start = None;
        self.early_finish = None;
    }

    /// Trims text fields, drops blank descriptions and resource names, and
    /// collapses repeated predecessor/resource entries to their first
    /// occurrence.
    pub(crate) fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        self.description = trimmed_non_blank(self.description.take());
        for resource_name in &mut self.resource_names {
            trim_in_place(resource_name);
        }
        self.resource_names.retain(|name| !name.is_empty());
        dedup_preserving_order(&mut self.predecessors);
        dedup_preserving_order(&mut self.resource_names);
    }
}

pub(crate) fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

pub(crate) fn trimmed_non_blank(text: Option<String>) -> Option<String> {
    text.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn dedup_preserving_order<T: Clone + Eq + std::hash::Hash>(values: &mut Vec<T>) {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values.retain(|value| seen.insert(value.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_removes_duplicates_and_blank_description() {
        let mut task = Task::new(1, "Build", 3)
            .with_description("   ")
            .with_predecessors([2, 3, 2])
            .with_resources(["Dev", "QA", "Dev"]);
        task.normalize();
        assert_eq!(task.description, None);
        assert_eq!(task.predecessors, vec![TaskId::from(2), TaskId::from(3)]);
        assert_eq!(task.resource_names, vec!["Dev".to_string(), "QA".to_string()]);
    }

    #[test]
    fn normalize_trims_padded_text() {
        let mut task = Task::new(1, "  Build  ", 3)
            .with_description(" ship it\n")
            .with_resources([" Dev", "Dev ", "  "]);
        task.normalize();
        assert_eq!(task.name, "Build");
        assert_eq!(task.description.as_deref(), Some("ship it"));
        assert_eq!(task.resource_names, vec!["Dev".to_string()]);
    }

    #[test]
    fn new_task_is_unscheduled() {
        let task = Task::new("A", "Kickoff", 0);
        assert!(task.is_milestone());
        assert!(!task.is_scheduled());
    }
}
