use crate::error::ScheduleResult;
use crate::project::{AssemblyOutcome, NewProject, ProjectRecord};
use uuid::Uuid;

/// Persistence seam for project records. The assembler and the request layer
/// receive a store; the scheduling and codec logic never depend on one.
pub trait ProjectStore: Send + Sync {
    fn create(&self, project: NewProject, document: AssemblyOutcome)
        -> ScheduleResult<ProjectRecord>;
    fn get(&self, id: &Uuid) -> ScheduleResult<Option<ProjectRecord>>;
    /// All records, oldest first.
    fn list(&self) -> ScheduleResult<Vec<ProjectRecord>>;

    fn list_by_owner(&self, owner_id: &str) -> ScheduleResult<Vec<ProjectRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| record.owner_id.as_deref() == Some(owner_id))
            .collect())
    }
}

pub mod document;
pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use document::{
    DecodeOptions, NumericFieldPolicy, decode_schedule, encode_schedule, load_schedule_from_xml,
    load_schedules, save_schedule_to_xml, write_schedule_document,
};
pub use file::save_schedule_report_csv;
pub use memory::InMemoryProjectStore;
