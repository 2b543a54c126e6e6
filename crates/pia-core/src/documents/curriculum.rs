//! `DevelopmentalCurriculum` schema.

use super::tagged::{null_as_default, Discriminated, Tagged};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

impl Discriminated for CurriculumDocument {
    const TAG: &'static str = "DevelopmentalCurriculum";
}

impl Discriminated for CurriculumStep {
    const TAG: &'static str = "CurriculumStep";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumDocument {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub target_developmental_stage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub steps: Vec<Tagged<CurriculumStep>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a curriculum. `order` is user data; position in `steps` is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumStep {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order: i64,
    /// Filename of a prompt resource.
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_reference: String,
    #[serde(deserialize_with = "null_as_default")]
    pub conditions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurriculumDocument {
    pub fn template() -> Self {
        Self {
            version: "0.1.0".into(),
            author: "DefaultUser".into(),
            ..Default::default()
        }
    }

    /// Append a blank step numbered `len + 1`. Existing steps keep their order.
    pub fn push_step(&mut self) -> usize {
        let order = self.steps.len() as i64 + 1;
        self.steps.push(Tagged(CurriculumStep {
            order,
            ..Default::default()
        }));
        self.steps.len() - 1
    }

    /// Remove the step at `index`. Remaining steps keep their order.
    pub fn remove_step(&mut self, index: usize) -> Option<CurriculumStep> {
        if index < self.steps.len() {
            Some(self.steps.remove(index).into_inner())
        } else {
            None
        }
    }

    /// Reassign `order = position + 1` to every step.
    pub fn renumber_steps(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.order = i as i64 + 1;
        }
    }

    /// First problem with step ordering: an order below 1, or an order used twice.
    pub fn order_problem(&self) -> Option<String> {
        let mut seen = std::collections::HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.order < 1 {
                return Some(format!("Step {} has order {}; orders start at 1", i + 1, step.order));
            }
            if !seen.insert(step.order) {
                return Some(format!("Duplicate step order {}", step.order));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_and_remove_do_not_renumber() {
        let mut doc = CurriculumDocument::template();
        doc.push_step();
        doc.push_step();
        doc.push_step();
        doc.remove_step(0);
        let orders: Vec<i64> = doc.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![2, 3]);

        doc.push_step();
        assert_eq!(doc.order_problem(), Some("Duplicate step order 3".to_string()));

        doc.renumber_steps();
        let orders: Vec<i64> = doc.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(doc.order_problem().is_none());
    }

    #[test]
    fn steps_carry_their_tag() {
        let mut doc = CurriculumDocument::template();
        doc.push_step();
        let value = serde_json::to_value(Tagged(doc)).unwrap();
        assert_eq!(value["__type__"], "DevelopmentalCurriculum");
        assert_eq!(value["steps"][0]["__type__"], "CurriculumStep");
        assert_eq!(value["steps"][0]["order"], json!(1));
    }
}
