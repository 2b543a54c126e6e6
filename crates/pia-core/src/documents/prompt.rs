//! `PiaAGIPrompt` schema.
//!
//! Only the fields the editors touch are typed; everything else is kept in the
//! flattened `extra` map of the owning object and written back unchanged.

use super::tagged::{null_as_default, Discriminated, Tagged};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! discriminated {
    ($($ty:ty => $tag:literal),* $(,)?) => {
        $(impl Discriminated for $ty {
            const TAG: &'static str = $tag;
        })*
    };
}

discriminated! {
    PromptDocument => "PiaAGIPrompt",
    SystemRules => "SystemRules",
    Requirements => "Requirements",
    UsersInteractors => "UsersInteractors",
    Executors => "Executors",
    Role => "Role",
    CognitiveModuleConfiguration => "CognitiveModuleConfiguration",
    PersonalityConfig => "PersonalityConfig",
    MotivationalBias => "MotivationalBias",
    EmotionalProfile => "EmotionalProfile",
    LearningModuleConfig => "LearningModuleConfig",
    Workflow => "Workflow",
    WorkflowStep => "WorkflowStep",
    DevelopmentalScaffolding => "DevelopmentalScaffolding",
    CbtAutoTraining => "CBTAutoTraining",
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptDocument {
    #[serde(deserialize_with = "null_as_default")]
    pub target_agi: String,
    #[serde(deserialize_with = "null_as_default")]
    pub developmental_stage_target: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub objective: String,
    pub system_rules: Tagged<SystemRules>,
    pub requirements: Tagged<Requirements>,
    pub users_interactors: Tagged<UsersInteractors>,
    pub executors: Tagged<Executors>,
    pub workflow_or_curriculum_phase: Tagged<Workflow>,
    pub developmental_scaffolding_context: Tagged<DevelopmentalScaffolding>,
    pub cbt_autotraining_protocol: Tagged<CbtAutoTraining>,
    #[serde(deserialize_with = "null_as_default")]
    pub initiate_interaction: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemRules {
    #[serde(deserialize_with = "null_as_default")]
    pub syntax: String,
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output_format: String,
    #[serde(deserialize_with = "null_as_default")]
    pub logging_level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub piaagi_interpretation_mode: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    #[serde(deserialize_with = "null_as_default")]
    pub goal: String,
    #[serde(deserialize_with = "null_as_default")]
    pub background_context: String,
    #[serde(deserialize_with = "null_as_default")]
    pub constraints_and_boundaries: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub success_metrics: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersInteractors {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub profile: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executors {
    pub role: Option<Tagged<Role>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub profile: String,
    #[serde(deserialize_with = "null_as_default")]
    pub skills_focus: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub knowledge_domains_active: Vec<String>,
    pub cognitive_module_configuration: Tagged<CognitiveModuleConfiguration>,
    #[serde(deserialize_with = "null_as_default")]
    pub role_specific_rules: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitiveModuleConfiguration {
    pub personality_config: Tagged<PersonalityConfig>,
    pub motivational_bias_config: Tagged<MotivationalBias>,
    pub emotional_profile_config: Tagged<EmotionalProfile>,
    pub learning_module_config: Tagged<LearningModuleConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// OCEAN traits, each in `0.0..=1.0`. Missing traits read as 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityConfig {
    pub ocean_openness: f64,
    pub ocean_conscientiousness: f64,
    pub ocean_extraversion: f64,
    pub ocean_agreeableness: f64,
    pub ocean_neuroticism: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            ocean_openness: 0.5,
            ocean_conscientiousness: 0.5,
            ocean_extraversion: 0.5,
            ocean_agreeableness: 0.5,
            ocean_neuroticism: 0.5,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotivationalBias {
    #[serde(deserialize_with = "null_as_default")]
    pub biases: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub baseline_valence: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningModuleConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub primary_learning_mode: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    #[serde(deserialize_with = "null_as_default")]
    pub steps: Vec<Tagged<WorkflowStep>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowStep {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevelopmentalScaffolding {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbtAutoTraining {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PromptDocument {
    /// The default template offered by the create form, dated `date` (ISO `YYYY-MM-DD`).
    pub fn template(date: &str) -> Self {
        let cognitive = CognitiveModuleConfiguration {
            personality_config: Tagged(PersonalityConfig::default()),
            motivational_bias_config: Tagged(MotivationalBias::default()),
            emotional_profile_config: Tagged(EmotionalProfile {
                baseline_valence: "Neutral".into(),
                ..Default::default()
            }),
            learning_module_config: Tagged(LearningModuleConfig {
                primary_learning_mode: "Observational".into(),
                ..Default::default()
            }),
            extra: Map::new(),
        };
        let role = Role {
            name: "DefaultRole".into(),
            profile: "Default role profile".into(),
            cognitive_module_configuration: Tagged(cognitive),
            ..Default::default()
        };

        Self {
            target_agi: "PiaAGI_GenericInstance_v1".into(),
            developmental_stage_target: "PiaAdult".into(),
            author: "DefaultUser".into(),
            version: "0.1.0".into(),
            date: date.to_string(),
            system_rules: Tagged(SystemRules {
                syntax: "Markdown for general interaction, YAML/JSON for specific config blocks if used"
                    .into(),
                language: "English".into(),
                output_format: "Natural language".into(),
                logging_level: "Brief".into(),
                piaagi_interpretation_mode: "Execute_Immediate".into(),
                extra: Map::new(),
            }),
            users_interactors: Tagged(UsersInteractors {
                kind: "Human Developer".into(),
                profile: "Generic user profile".into(),
                extra: Map::new(),
            }),
            executors: Tagged(Executors {
                role: Some(Tagged(role)),
                extra: Map::new(),
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_tags_every_object() {
        let value = serde_json::to_value(Tagged(PromptDocument::template("2026-01-01"))).unwrap();
        assert_eq!(value["__type__"], "PiaAGIPrompt");
        assert_eq!(value["date"], "2026-01-01");
        assert_eq!(value["users_interactors"]["type"], "Human Developer");
        let cmc = &value["executors"]["role"]["cognitive_module_configuration"];
        assert_eq!(cmc["__type__"], "CognitiveModuleConfiguration");
        assert_eq!(cmc["personality_config"]["__type__"], "PersonalityConfig");
        assert_eq!(cmc["personality_config"]["ocean_openness"], 0.5);
        assert_eq!(value["cbt_autotraining_protocol"], json!({"__type__": "CBTAutoTraining"}));
    }

    #[test]
    fn unknown_fields_and_nulls_survive_decode() {
        let doc: Tagged<PromptDocument> = serde_json::from_value(json!({
            "__type__": "PiaAGIPrompt",
            "objective": "o",
            "author": null,
            "custom_block": {"k": [1, 2]},
            "developmental_scaffolding_context": {
                "__type__": "DevelopmentalScaffolding",
                "current_developmental_goal": null,
                "scaffolding_techniques_employed": ["modeling"]
            },
            "executors": {"__type__": "Executors", "role": null}
        }))
        .unwrap();

        assert_eq!(doc.author, "");
        assert!(doc.executors.role.is_none());
        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["custom_block"], json!({"k": [1, 2]}));
        assert_eq!(
            back["developmental_scaffolding_context"],
            json!({
                "__type__": "DevelopmentalScaffolding",
                "current_developmental_goal": null,
                "scaffolding_techniques_employed": ["modeling"]
            })
        );
    }
}
