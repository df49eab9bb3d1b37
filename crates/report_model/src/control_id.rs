//! Template control identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a template control.
///
/// Runtime clones store the ID of the template they came from instead of a
/// pointer to it; [`Report::template_control`](crate::Report::template_control)
/// resolves the ID back to the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlId(Uuid);

impl ControlId {
    /// Create a new random ControlId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ControlId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Create a ControlId from a string representation
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ControlId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ControlId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
