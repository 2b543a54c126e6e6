//! Resource documents: tagged unions on `__type__` with every nested object tagged too.

pub mod curriculum;
pub mod path;
pub mod prompt;
pub mod tagged;

pub use curriculum::{CurriculumDocument, CurriculumStep};
pub use path::{get_path, set_path};
pub use prompt::PromptDocument;
pub use tagged::{Discriminated, Tagged, DISCRIMINATOR};

use crate::error::{ConsoleError, ConsoleResult};
use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__type__")]
pub enum ResourceDocument {
    #[serde(rename = "PiaAGIPrompt")]
    Prompt(PromptDocument),
    #[serde(rename = "DevelopmentalCurriculum")]
    Curriculum(CurriculumDocument),
}

impl ResourceDocument {
    /// Default document for the create form; prompts are dated today.
    pub fn new_default(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Prompt => {
                let today = chrono::Local::now().format("%Y-%m-%d").to_string();
                ResourceDocument::Prompt(PromptDocument::template(&today))
            }
            ResourceKind::Curriculum => ResourceDocument::Curriculum(CurriculumDocument::template()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDocument::Prompt(_) => ResourceKind::Prompt,
            ResourceDocument::Curriculum(_) => ResourceKind::Curriculum,
        }
    }

    pub fn to_value(&self) -> ConsoleResult<Value> {
        serde_json::to_value(self).map_err(|e| ConsoleError::input(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Decode a document of `kind` as returned by the server. A missing top-level
    /// tag is restored; a tag naming another kind is rejected.
    pub fn from_payload(kind: ResourceKind, mut value: Value) -> ConsoleResult<Self> {
        let map = value
            .as_object_mut()
            .ok_or_else(|| ConsoleError::Decode(format!("{} is not a JSON object", kind.label())))?;
        match map.get(DISCRIMINATOR) {
            None | Some(Value::Null) => {
                map.insert(
                    DISCRIMINATOR.to_string(),
                    Value::String(kind.discriminator().to_string()),
                );
            }
            Some(Value::String(tag)) if tag == kind.discriminator() => {}
            Some(other) => {
                return Err(ConsoleError::Decode(format!(
                    "expected a {} document, found {} {}",
                    kind.label(),
                    DISCRIMINATOR,
                    other
                )))
            }
        }
        Self::from_value(value).map_err(|e| ConsoleError::Decode(e.to_string()))
    }

    /// Copy of this document with `path` set to `value`. Fails without touching `self`
    /// when the path is invalid or the edited document no longer decodes.
    pub fn with_field(&self, path: &str, value: Value) -> ConsoleResult<Self> {
        let mut json = self.to_value()?;
        path::set_path(&mut json, path, value)?;
        let edited = Self::from_value(json)
            .map_err(|e| ConsoleError::input(format!("Invalid value for '{}': {}", path, e)))?;
        Ok(edited)
    }

    pub fn field(&self, path: &str) -> Option<Value> {
        let json = self.to_value().ok()?;
        path::get_path(&json, path).cloned()
    }

    /// Name of the first required top-level field that is blank.
    pub fn missing_required(&self) -> Option<&'static str> {
        match self {
            ResourceDocument::Prompt(p) if p.objective.trim().is_empty() => Some("objective"),
            ResourceDocument::Curriculum(c) if c.name.trim().is_empty() => Some("name"),
            _ => None,
        }
    }

    /// Human-readable title: curriculum name, or prompt objective.
    pub fn title(&self) -> &str {
        match self {
            ResourceDocument::Prompt(p) => &p.objective,
            ResourceDocument::Curriculum(c) => &c.name,
        }
    }

    pub fn as_curriculum_mut(&mut self) -> Option<&mut CurriculumDocument> {
        match self {
            ResourceDocument::Curriculum(c) => Some(c),
            ResourceDocument::Prompt(_) => None,
        }
    }

    pub fn as_curriculum(&self) -> Option<&CurriculumDocument> {
        match self {
            ResourceDocument::Curriculum(c) => Some(c),
            ResourceDocument::Prompt(_) => None,
        }
    }
}
