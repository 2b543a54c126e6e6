//! Prompt and curriculum collections on the prompt engineering backend.

use crate::client::{decode, ResourceClient};
use crate::documents::ResourceDocument;
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Prompt,
    Curriculum,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Prompt, ResourceKind::Curriculum];

    pub fn collection_path(self) -> &'static str {
        match self {
            ResourceKind::Prompt => "/api/pes/prompts",
            ResourceKind::Curriculum => "/api/pes/curricula",
        }
    }

    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.collection_path(), urlencoding::encode(id))
    }

    pub fn render_path(self, id: &str) -> String {
        format!("{}/render", self.item_path(id))
    }

    /// Key under which GET wraps the document.
    pub fn payload_key(self) -> &'static str {
        match self {
            ResourceKind::Prompt => "prompt_data",
            ResourceKind::Curriculum => "curriculum_data",
        }
    }

    pub fn discriminator(self) -> &'static str {
        match self {
            ResourceKind::Prompt => "PiaAGIPrompt",
            ResourceKind::Curriculum => "DevelopmentalCurriculum",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Prompt => "prompt",
            ResourceKind::Curriculum => "curriculum",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Prompt => "prompts",
            ResourceKind::Curriculum => "curricula",
        }
    }

    /// Required filename suffix.
    pub fn id_suffix(self) -> &'static str {
        match self {
            ResourceKind::Prompt => ".json",
            ResourceKind::Curriculum => ".curriculum.json",
        }
    }

    /// Whether a create must name its identifier. Prompts may let the server choose.
    pub fn id_required(self) -> bool {
        matches!(self, ResourceKind::Curriculum)
    }

    /// Check a user-supplied identifier.
    pub fn validate_id(self, id: &str) -> ConsoleResult<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ConsoleError::input(format!(
                "A filename is required for a new {}",
                self.label()
            )));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(ConsoleError::input(format!(
                "Invalid filename '{}': path separators are not allowed",
                id
            )));
        }
        let suffix = self.id_suffix();
        if !id.ends_with(suffix) || id.len() == suffix.len() {
            return Err(ConsoleError::input(format!(
                "Invalid filename '{}': a {} filename must end with '{}'",
                id,
                self.label(),
                suffix
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" | "prompts" => Ok(ResourceKind::Prompt),
            "curriculum" | "curricula" => Ok(ResourceKind::Curriculum),
            other => Err(ConsoleError::input(format!("Unknown resource kind '{}'", other))),
        }
    }
}

/// One row of a collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub filename: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ResourceSummary {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.filename)
    }
}

/// Body of a successful create/update/delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResource {
    pub filename: String,
    pub document: ResourceDocument,
}

impl ResourceClient {
    pub async fn list_resources(&self, kind: ResourceKind) -> ConsoleResult<Vec<ResourceSummary>> {
        decode(self.get(kind.collection_path()).await?)
    }

    /// GET one document. The response is `{filename, <payload_key>: {...}}`.
    pub async fn fetch_resource(&self, kind: ResourceKind, id: &str) -> ConsoleResult<LoadedResource> {
        let body = self.get(&kind.item_path(id)).await?;
        parse_loaded(kind, id, body)
    }

    /// POST a new document, with `filename` when the caller chose one.
    pub async fn create_resource(
        &self,
        document: &ResourceDocument,
        filename: Option<&str>,
    ) -> ConsoleResult<MutationReceipt> {
        let body = create_body(document, filename)?;
        let receipt = decode(self.post(document.kind().collection_path(), &body).await?)?;
        tracing::info!(kind = %document.kind(), ?receipt, "resource created");
        Ok(receipt)
    }

    pub async fn update_resource(
        &self,
        id: &str,
        document: &ResourceDocument,
    ) -> ConsoleResult<MutationReceipt> {
        let body = document.to_value()?;
        let receipt = decode_receipt(self.put(&document.kind().item_path(id), &body).await?)?;
        tracing::info!(kind = %document.kind(), id, "resource updated");
        Ok(receipt)
    }

    pub async fn delete_resource(&self, kind: ResourceKind, id: &str) -> ConsoleResult<MutationReceipt> {
        let receipt = decode_receipt(self.delete(&kind.item_path(id)).await?)?;
        tracing::info!(%kind, id, "resource deleted");
        Ok(receipt)
    }

    /// Server-rendered markdown of one document.
    pub async fn render_resource(&self, kind: ResourceKind, id: &str) -> ConsoleResult<String> {
        let body = self.get(&kind.render_path(id)).await?;
        body.get("markdown")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ConsoleError::Decode("response has no 'markdown' field".into()))
    }
}

pub(crate) fn create_body(document: &ResourceDocument, filename: Option<&str>) -> ConsoleResult<Value> {
    let mut body = document.to_value()?;
    if let (Some(name), Some(map)) = (filename, body.as_object_mut()) {
        map.insert("filename".to_string(), Value::String(name.trim().to_string()));
    }
    Ok(body)
}

pub(crate) fn decode_receipt(body: Value) -> ConsoleResult<MutationReceipt> {
    if body.is_null() {
        return Ok(MutationReceipt::default());
    }
    decode(body)
}

pub(crate) fn parse_loaded(kind: ResourceKind, id: &str, body: Value) -> ConsoleResult<LoadedResource> {
    let mut map: Map<String, Value> = match body {
        Value::Object(map) => map,
        _ => return Err(ConsoleError::Decode("expected a JSON object".into())),
    };
    let filename = map
        .get("filename")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string();
    let payload = map
        .remove(kind.payload_key())
        .ok_or_else(|| ConsoleError::Decode(format!("response has no '{}' field", kind.payload_key())))?;
    let document = ResourceDocument::from_payload(kind, payload)?;
    Ok(LoadedResource { filename, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_paths_are_percent_encoded() {
        assert_eq!(
            ResourceKind::Prompt.item_path("my prompt.json"),
            "/api/pes/prompts/my%20prompt.json"
        );
        assert_eq!(
            ResourceKind::Curriculum.render_path("a.curriculum.json"),
            "/api/pes/curricula/a.curriculum.json/render"
        );
    }

    #[test]
    fn identifier_rules() {
        assert!(ResourceKind::Prompt.validate_id("hello.json").is_ok());
        assert!(ResourceKind::Prompt.validate_id("hello.txt").is_err());
        assert!(ResourceKind::Prompt.validate_id("../x.json").is_err());
        assert!(ResourceKind::Prompt.validate_id(".json").is_err());
        assert!(ResourceKind::Curriculum.validate_id("c.curriculum.json").is_ok());
        assert!(ResourceKind::Curriculum.validate_id("c.json").is_err());
        assert!(ResourceKind::Curriculum.id_required());
        assert!(!ResourceKind::Prompt.id_required());
    }

    #[test]
    fn parse_loaded_unwraps_payload() {
        let loaded = parse_loaded(
            ResourceKind::Curriculum,
            "x.curriculum.json",
            json!({"filename": "x.curriculum.json", "curriculum_data": {"__type__": "DevelopmentalCurriculum", "name": "X"}}),
        )
        .unwrap();
        assert_eq!(loaded.filename, "x.curriculum.json");
        assert_eq!(loaded.document.title(), "X");

        assert!(parse_loaded(ResourceKind::Prompt, "p.json", json!({"filename": "p.json"})).is_err());
    }

    #[test]
    fn summary_display_name_falls_back_to_filename() {
        let s: ResourceSummary = serde_json::from_value(json!({"filename": "a.json", "name": null})).unwrap();
        assert_eq!(s.display_name(), "a.json");
    }
}
