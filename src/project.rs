use crate::ids::RemoteProjectId;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where the schedule document of a project ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblyOutcome {
    /// The remote hosting service accepted the project.
    Remote { project_id: RemoteProjectId },
    /// A local XML document was written.
    Local { path: PathBuf },
}

impl AssemblyOutcome {
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            AssemblyOutcome::Local { path } => Some(path),
            AssemblyOutcome::Remote { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AssemblyOutcome::Remote { .. })
    }
}

/// Caller-supplied fields for a project about to be stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub project_name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub overview_file: Option<String>,
}

impl NewProject {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            owner_id: None,
            overview_file: None,
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub project_name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub overview_file: Option<String>,
    pub document: AssemblyOutcome,
    pub created_at: NaiveDateTime,
}

impl ProjectRecord {
    pub fn new(project: NewProject, document: AssemblyOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_name: project.project_name,
            owner_id: project.owner_id,
            overview_file: project.overview_file,
            document,
            created_at: Local::now().naive_local(),
        }
    }
}
