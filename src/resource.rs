use crate::ids::ResourceId;
use crate::task::{trim_in_place, trimmed_non_blank};
use serde::{Deserialize, Serialize};

/// A person, team or piece of equipment that can be assigned to tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Unique within a schedule; tasks refer to resources by this name.
    pub name: String,
    /// Optional role or description for the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Availability in percent. Values above 100 represent overtime or overlap.
    pub capacity_percent: i64,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>, capacity_percent: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            capacity_percent,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub(crate) fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        self.role = trimmed_non_blank(self.role.take());
    }
}
