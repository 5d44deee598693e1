pub mod assembler;
pub mod calculations;
pub mod config;
pub mod error;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ids;
pub mod metadata;
pub mod persistence;
pub mod plan;
pub mod project;
pub mod remote;
pub mod resource;
pub mod schedule;
pub mod task;
pub(crate) mod task_validation;

pub use assembler::{Assembly, ScheduleAssembler};
pub use config::{Settings, read_config};
pub use error::{ScheduleError, ScheduleResult};
pub use ids::{RemoteProjectId, ResourceId, TaskId};
pub use metadata::ScheduleMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteProjectStore;
pub use persistence::{
    DecodeOptions, InMemoryProjectStore, NumericFieldPolicy, ProjectStore, decode_schedule,
    encode_schedule, load_schedule_from_xml, load_schedules, save_schedule_report_csv,
    save_schedule_to_xml, write_schedule_document,
};
pub use plan::{ParsedPlan, PlanError, PlanSource, ProjectPlan, parse_model_response};
pub use project::{AssemblyOutcome, NewProject, ProjectRecord};
pub use remote::{GraphProjectClient, RemoteError, RemoteHost};
pub use resource::Resource;
pub use schedule::{Assignment, Schedule, ScheduleSummary};
pub use task::Task;
pub use task_validation::TaskValidationError;
