use super::ProjectStore;
use crate::error::ScheduleResult;
use crate::project::{AssemblyOutcome, NewProject, ProjectRecord};
use parking_lot::RwLock;
use uuid::Uuid;

/// Process-local store; records are lost when the process exits.
#[derive(Default)]
pub struct InMemoryProjectStore {
    records: RwLock<Vec<ProjectRecord>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn create(
        &self,
        project: NewProject,
        document: AssemblyOutcome,
    ) -> ScheduleResult<ProjectRecord> {
        let record = ProjectRecord::new(project, document);
        self.records.write().push(record.clone());
        Ok(record)
    }

    fn get(&self, id: &Uuid) -> ScheduleResult<Option<ProjectRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    fn list(&self) -> ScheduleResult<Vec<ProjectRecord>> {
        Ok(self.records.read().clone())
    }
}
