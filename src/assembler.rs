use crate::config::Settings;
use crate::error::ScheduleResult;
use crate::ids::RemoteProjectId;
use crate::persistence::{ProjectStore, write_schedule_document};
use crate::plan::{ProjectPlan, parse_model_response};
use crate::project::{AssemblyOutcome, NewProject, ProjectRecord};
use crate::remote::{GraphProjectClient, RemoteHost, RemoteResult};
use crate::schedule::Schedule;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A scheduled model together with where its document was published.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub schedule: Schedule,
    pub outcome: AssemblyOutcome,
}

/// Turns a project plan into a persisted schedule.
///
/// Integrity failures (duplicate ids, dependency cycles) are returned to the
/// caller. A failing remote host is not: the local document is written
/// instead.
pub struct ScheduleAssembler {
    output_dir: PathBuf,
    remote: Option<Arc<dyn RemoteHost>>,
}

impl ScheduleAssembler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteHost>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let assembler = Self::new(settings.storage.output_dir.clone());
        match &settings.remote {
            Some(remote) => assembler.with_remote(Arc::new(GraphProjectClient::new(remote.clone()))),
            None => assembler,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `project_name` overrides the plan's own name unless it is blank.
    pub fn assemble(&self, project_name: &str, plan: &ProjectPlan) -> ScheduleResult<Assembly> {
        let name = if project_name.trim().is_empty() {
            plan.project_name.as_str()
        } else {
            project_name
        };
        let mut schedule = plan.to_schedule(name)?;
        schedule.forward_pass()?;

        if let Some(remote) = &self.remote {
            match publish_remote(remote.as_ref(), &schedule) {
                Ok(project_id) => {
                    tracing::info!(project = name, remote_id = %project_id, "published schedule remotely");
                    return Ok(Assembly {
                        schedule,
                        outcome: AssemblyOutcome::Remote { project_id },
                    });
                }
                Err(err) => {
                    tracing::warn!(project = name, error = %err, "remote publish failed, writing local document");
                }
            }
        }

        let path = write_schedule_document(&schedule, &self.output_dir)?;
        tracing::info!(
            project = name,
            total_duration = schedule.total_duration(),
            "assembled local schedule"
        );
        Ok(Assembly {
            schedule,
            outcome: AssemblyOutcome::Local { path },
        })
    }

    /// Parses raw model output (falling back to the default plan) and assembles it.
    pub fn assemble_from_response(
        &self,
        project_name: &str,
        response: &str,
    ) -> ScheduleResult<Assembly> {
        let parsed = parse_model_response(response);
        tracing::debug!(source = ?parsed.source, tasks = parsed.plan.tasks.len(), "interpreted model output");
        self.assemble(project_name, &parsed.plan)
    }

    /// Assembles `plan` and records the result in `store`.
    pub fn register(
        &self,
        store: &dyn ProjectStore,
        project: NewProject,
        plan: &ProjectPlan,
    ) -> ScheduleResult<(ProjectRecord, Assembly)> {
        let assembly = self.assemble(&project.project_name, plan)?;
        let record = store.create(project, assembly.outcome.clone())?;
        Ok((record, assembly))
    }
}

fn publish_remote(remote: &dyn RemoteHost, schedule: &Schedule) -> RemoteResult<RemoteProjectId> {
    let project_id = remote.create_project(schedule.project_name())?;
    match upload_contents(remote, &project_id, schedule) {
        Ok(()) => Ok(project_id),
        Err(err) => {
            if let Err(discard_err) = remote.discard_project(&project_id) {
                tracing::warn!(remote_id = %project_id, error = %discard_err, "could not discard partial remote project");
            }
            Err(err)
        }
    }
}

fn upload_contents(
    remote: &dyn RemoteHost,
    project_id: &RemoteProjectId,
    schedule: &Schedule,
) -> RemoteResult<()> {
    let mut resource_refs = HashMap::new();
    for resource in schedule.resources() {
        let reference = remote.add_resource(project_id, resource)?;
        resource_refs.insert(resource.id.clone(), reference);
    }

    let mut task_refs = HashMap::new();
    for task in schedule.tasks() {
        let reference = remote.add_task(project_id, task)?;
        task_refs.insert(task.id.clone(), reference);
    }

    for assignment in schedule.assignments() {
        if let (Some(task_ref), Some(resource_ref)) = (
            task_refs.get(&assignment.task_id),
            resource_refs.get(&assignment.resource_id),
        ) {
            remote.assign_resource(project_id, task_ref, resource_ref)?;
        }
    }
    tracing::debug!(
        resources = resource_refs.len(),
        tasks = task_refs.len(),
        "uploaded schedule contents"
    );
    Ok(())
}
