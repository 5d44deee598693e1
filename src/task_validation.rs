use crate::resource::Resource;
use crate::task::Task;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.id.is_blank() {
        return Err(TaskValidationError::new(format!(
            "task '{}' has an empty id",
            task.name
        )));
    }

    if task.name.trim().is_empty() {
        return Err(TaskValidationError::new(format!(
            "task {} has an empty name",
            task.id
        )));
    }

    if task.duration_days < 0 {
        return Err(TaskValidationError::new(format!(
            "task {} has negative duration {}",
            task.id, task.duration_days
        )));
    }

    if task.predecessors.contains(&task.id) {
        return Err(TaskValidationError::new(format!(
            "task {} lists itself as a predecessor",
            task.id
        )));
    }

    Ok(())
}

pub fn validate_resource(resource: &Resource) -> Result<(), TaskValidationError> {
    if resource.id.is_blank() {
        return Err(TaskValidationError::new(format!(
            "resource '{}' has an empty id",
            resource.name
        )));
    }

    if resource.name.trim().is_empty() {
        return Err(TaskValidationError::new(format!(
            "resource {} has an empty name",
            resource.id
        )));
    }

    if resource.capacity_percent < 0 {
        return Err(TaskValidationError::new(format!(
            "resource {} has negative capacity {}%",
            resource.id, resource.capacity_percent
        )));
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(&task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}

pub fn validate_resource_collection(resources: &[Resource]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(resources.len());
    let mut seen_names = HashSet::with_capacity(resources.len());
    for resource in resources {
        if !seen_ids.insert(&resource.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate resource id {}",
                resource.id
            )));
        }
        if !seen_names.insert(resource.name.as_str()) {
            return Err(TaskValidationError::new(format!(
                "duplicate resource name '{}'",
                resource.name
            )));
        }
        validate_resource(resource)?;
    }
    Ok(())
}
