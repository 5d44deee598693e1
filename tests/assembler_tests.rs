use parking_lot::Mutex;
use project_planner::remote::RemoteResult;
use project_planner::{
    AssemblyOutcome, DecodeOptions, InMemoryProjectStore, NewProject, ProjectPlan, ProjectStore,
    RemoteError, RemoteHost, RemoteProjectId, Resource, ScheduleAssembler, ScheduleError, Task,
    load_schedule_from_xml,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Records calls; `add_task` fails when `fail_tasks` is set.
#[derive(Default)]
struct RecordingHost {
    fail_tasks: bool,
    calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn failing() -> Self {
        Self {
            fail_tasks: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl RemoteHost for RecordingHost {
    fn create_project(&self, project_name: &str) -> RemoteResult<RemoteProjectId> {
        self.calls.lock().push(format!("project {project_name}"));
        Ok(RemoteProjectId::new("remote-1"))
    }

    fn add_resource(&self, _: &RemoteProjectId, resource: &Resource) -> RemoteResult<String> {
        self.calls.lock().push(format!("resource {}", resource.name));
        Ok(format!("r-{}", resource.id))
    }

    fn add_task(&self, _: &RemoteProjectId, task: &Task) -> RemoteResult<String> {
        if self.fail_tasks {
            return Err(RemoteError::Unavailable("task upload refused".into()));
        }
        self.calls.lock().push(format!("task {}", task.name));
        Ok(format!("t-{}", task.id))
    }

    fn assign_resource(
        &self,
        _: &RemoteProjectId,
        task_ref: &str,
        resource_ref: &str,
    ) -> RemoteResult<()> {
        self.calls
            .lock()
            .push(format!("assign {task_ref} {resource_ref}"));
        Ok(())
    }

    fn discard_project(&self, project: &RemoteProjectId) -> RemoteResult<()> {
        self.calls.lock().push(format!("discard {project}"));
        Ok(())
    }
}

#[test]
fn local_assembly_writes_decodable_document() {
    let dir = TempDir::new().unwrap();
    let assembler = ScheduleAssembler::new(dir.path());

    let assembly = assembler
        .assemble("Office Move", &ProjectPlan::default_plan())
        .unwrap();

    assert_eq!(assembly.schedule.project_name(), "Office Move");
    assert_eq!(assembly.schedule.total_duration(), 37);
    let path = assembly.outcome.local_path().unwrap();
    assert!(path.starts_with(dir.path()));

    let decoded = load_schedule_from_xml(path, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded.total_duration(), 37);
    assert_eq!(decoded.assignments().len(), 5);
}

#[test]
fn blank_name_uses_plan_name() {
    let dir = TempDir::new().unwrap();
    let assembly = ScheduleAssembler::new(dir.path())
        .assemble("  ", &ProjectPlan::default_plan())
        .unwrap();
    assert_eq!(assembly.schedule.project_name(), "New Project");
}

#[test]
fn remote_success_skips_local_document() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let assembler = ScheduleAssembler::new(dir.path()).with_remote(host.clone());

    let assembly = assembler
        .assemble("Hosted", &ProjectPlan::default_plan())
        .unwrap();

    assert_eq!(
        assembly.outcome,
        AssemblyOutcome::Remote {
            project_id: RemoteProjectId::new("remote-1")
        }
    );
    let calls = host.calls();
    assert_eq!(calls[0], "project Hosted");
    assert_eq!(calls.iter().filter(|c| c.starts_with("resource")).count(), 4);
    assert_eq!(calls.iter().filter(|c| c.starts_with("task")).count(), 4);
    assert!(calls.contains(&"assign t-4 r-4".to_string()));
    assert!(calls.contains(&"assign t-4 r-1".to_string()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn remote_failure_discards_and_falls_back_to_local() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::failing());
    let assembler = ScheduleAssembler::new(dir.path()).with_remote(host.clone());

    let assembly = assembler
        .assemble("Fallback", &ProjectPlan::default_plan())
        .unwrap();

    assert!(!assembly.outcome.is_remote());
    assert!(assembly.outcome.local_path().unwrap().exists());
    assert_eq!(host.calls().last().map(String::as_str), Some("discard remote-1"));
}

#[test]
fn unparseable_model_output_yields_default_plan() {
    let dir = TempDir::new().unwrap();
    let assembly = ScheduleAssembler::new(dir.path())
        .assemble_from_response("Garbled", "{\"tasks\": oops}")
        .unwrap();
    assert_eq!(assembly.schedule.tasks().len(), 4);
    assert_eq!(assembly.schedule.total_duration(), 37);
}

#[test]
fn unlabeled_task_lines_are_scheduled() {
    let dir = TempDir::new().unwrap();
    let assembly = ScheduleAssembler::new(dir.path())
        .assemble_from_response(
            "Prose",
            "Task: gather requirements over 3 days\nTask Build: build it\n\
             Resource: developer\nResource: tester",
        )
        .unwrap();

    let tasks = assembly.schedule.tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name, "Task 1");
    assert_eq!(tasks[0].duration_days, 3);
    assert_eq!(tasks[1].name, "Build");
    assert_eq!(assembly.schedule.resources().len(), 2);
    assert!(assembly.outcome.local_path().unwrap().exists());
}

#[test]
fn structured_model_output_is_scheduled() {
    let dir = TempDir::new().unwrap();
    let response = r#"Sure! ```json
{"project_name": "Garden", "tasks": [
  {"id": 1, "name": "Clear", "duration": 2, "resources": ["Gardener"]},
  {"id": 2, "name": "Plant", "duration": 3, "predecessors": [1]}
], "resources": [{"id": 1, "name": "Gardener", "capacity": 80}]}
```"#;
    let assembly = ScheduleAssembler::new(dir.path())
        .assemble_from_response("", response)
        .unwrap();
    assert_eq!(assembly.schedule.project_name(), "Garden");
    assert_eq!(assembly.schedule.total_duration(), 5);
    assert_eq!(assembly.schedule.resources()[0].capacity_percent, 80);
}

#[test]
fn integrity_errors_are_not_absorbed() {
    let dir = TempDir::new().unwrap();
    let plan = ProjectPlan::from_json(
        r#"{"tasks": [
            {"id": 1, "name": "A", "predecessors": [2]},
            {"id": 2, "name": "B", "predecessors": [1]}
        ]}"#,
    )
    .unwrap();
    let err = ScheduleAssembler::new(dir.path())
        .assemble("Cycle", &plan)
        .unwrap_err();
    assert!(matches!(err, ScheduleError::CycleOrOrdering { .. }), "got {err:?}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn register_records_outcome_in_store() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryProjectStore::new();
    let assembler = ScheduleAssembler::new(dir.path());

    let (record, assembly) = assembler
        .register(
            &store,
            NewProject::new("Stored").owned_by("u1"),
            &ProjectPlan::default_plan(),
        )
        .unwrap();

    assert_eq!(record.document, assembly.outcome);
    assert_eq!(store.list_by_owner("u1").unwrap(), vec![record]);
}
