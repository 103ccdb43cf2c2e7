use serde::{Deserialize, Serialize};
use std::fmt;

/// An aircraft that flights can be scheduled on.
///
/// `id` is assigned by the store on first save and never changes afterwards.
/// Two planes are equal only when both the id and the model match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plane {
    pub id: Option<String>,
    pub model: String,
}

impl Plane {
    /// A plane that has not been saved yet.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: None,
            model: model.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            model: model.into(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// The id as shown to users: `null` for an unsaved plane.
    pub fn id_or_null(&self) -> &str {
        self.id().unwrap_or("null")
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, model={}", self.id_or_null(), self.model)
    }
}
