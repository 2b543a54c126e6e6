//! Field layouts for the editor screen and the module action forms.

use pia_core::{
    ConsoleError, ConsoleResult, EditorMode, FormEditor, GoalAction, GoalForm, ModuleAction,
    ModuleKind, ResourceDocument,
};
use serde_json::Value;

/// How a field's text is turned back into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Comma-separated strings.
    List,
    /// Free-form JSON.
    Json,
    Number,
    /// The requested filename of a new resource.
    Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub label: String,
    pub path: String,
    pub kind: FieldKind,
    /// Curriculum step this field belongs to.
    pub step: Option<usize>,
}

impl FieldSpec {
    fn new(label: &str, path: &str, kind: FieldKind) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
            kind,
            step: None,
        }
    }
}

const ROLE: &str = "executors.role";
const CMC: &str = "executors.role.cognitive_module_configuration";

fn prompt_fields() -> Vec<FieldSpec> {
    use FieldKind::*;
    let mut fields = vec![
        FieldSpec::new("Objective", "objective", Text),
        FieldSpec::new("Target AGI", "target_agi", Text),
        FieldSpec::new("Developmental stage", "developmental_stage_target", Text),
        FieldSpec::new("Author", "author", Text),
        FieldSpec::new("Version", "version", Text),
        FieldSpec::new("Date", "date", Text),
        FieldSpec::new("Language", "system_rules.language", Text),
        FieldSpec::new("Output format", "system_rules.output_format", Text),
        FieldSpec::new("Goal", "requirements.goal", Text),
        FieldSpec::new("Background", "requirements.background_context", Text),
        FieldSpec::new("Constraints", "requirements.constraints_and_boundaries", List),
        FieldSpec::new("Success metrics", "requirements.success_metrics", List),
        FieldSpec::new("Interactor type", "users_interactors.type", Text),
        FieldSpec::new("Interactor profile", "users_interactors.profile", Text),
    ];
    fields.push(FieldSpec::new("Role name", &format!("{}.name", ROLE), Text));
    fields.push(FieldSpec::new("Role profile", &format!("{}.profile", ROLE), Text));
    for trait_name in [
        "openness",
        "conscientiousness",
        "extraversion",
        "agreeableness",
        "neuroticism",
    ] {
        fields.push(FieldSpec::new(
            &format!("OCEAN {}", trait_name),
            &format!("{}.personality_config.ocean_{}", CMC, trait_name),
            Number,
        ));
    }
    fields.push(FieldSpec::new(
        "Motivational biases",
        &format!("{}.motivational_bias_config.biases", CMC),
        Json,
    ));
    fields.push(FieldSpec::new(
        "Baseline valence",
        &format!("{}.emotional_profile_config.baseline_valence", CMC),
        Text,
    ));
    fields.push(FieldSpec::new(
        "Learning mode",
        &format!("{}.learning_module_config.primary_learning_mode", CMC),
        Text,
    ));
    fields.push(FieldSpec::new("Initiate interaction", "initiate_interaction", Text));
    fields
}

fn curriculum_fields(draft: Option<&ResourceDocument>) -> Vec<FieldSpec> {
    use FieldKind::*;
    let mut fields = vec![
        FieldSpec::new("Name", "name", Text),
        FieldSpec::new("Description", "description", Text),
        FieldSpec::new("Target stage", "target_developmental_stage", Text),
        FieldSpec::new("Version", "version", Text),
        FieldSpec::new("Author", "author", Text),
    ];
    let steps = draft
        .and_then(ResourceDocument::as_curriculum)
        .map(|c| c.steps.len())
        .unwrap_or(0);
    for i in 0..steps {
        for (label, field, kind) in [
            ("name", "name", Text),
            ("order", "order", Number),
            ("prompt", "prompt_reference", Text),
            ("conditions", "conditions", Text),
            ("notes", "notes", Text),
        ] {
            fields.push(FieldSpec {
                label: format!("Step {} {}", i + 1, label),
                path: format!("steps.{}.{}", i, field),
                kind,
                step: Some(i),
            });
        }
    }
    fields
}

/// Fields shown for the editor's current draft, in display order.
pub fn editor_fields(editor: &FormEditor) -> Vec<FieldSpec> {
    let mut fields = Vec::new();
    if *editor.mode() == EditorMode::Create {
        fields.push(FieldSpec::new("Filename", "", FieldKind::Identifier));
    }
    fields.extend(match editor.kind() {
        pia_core::ResourceKind::Prompt => prompt_fields(),
        pia_core::ResourceKind::Curriculum => curriculum_fields(editor.draft()),
    });
    fields
}

/// Current text of a field, as the user would edit it.
pub fn field_text(editor: &FormEditor, spec: &FieldSpec) -> String {
    if spec.kind == FieldKind::Identifier {
        return editor.identifier().to_string();
    }
    match editor.draft().and_then(|d| d.field(&spec.path)) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) if spec.kind == FieldKind::List => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Write edited text back into the draft.
pub fn apply_field(editor: &mut FormEditor, spec: &FieldSpec, text: &str) -> ConsoleResult<()> {
    match spec.kind {
        FieldKind::Identifier => editor.set_identifier(text.trim()),
        FieldKind::Text => editor.set_text(&spec.path, text),
        FieldKind::List => editor.set_list(&spec.path, text),
        FieldKind::Json => editor.set_json(&spec.path, text),
        FieldKind::Number => {
            let value = parse_number(text)
                .ok_or_else(|| ConsoleError::input(format!("'{}' is not a number", text.trim())))?;
            editor.set_field(&spec.path, value)
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

// ---------------------------------------------------------------------------
// Module action forms
// ---------------------------------------------------------------------------

/// Action forms offered for one module, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTemplate {
    Process,
    Appraise,
    Express,
    ManageGoal,
    ActiveGoals,
    UpdateState,
    AddItem,
    RemoveItem,
    SetFocus,
}

impl ActionTemplate {
    pub fn for_module(module: ModuleKind) -> &'static [ActionTemplate] {
        use ActionTemplate::*;
        match module {
            ModuleKind::Perception => &[Process],
            ModuleKind::Emotion => &[Appraise, Express],
            ModuleKind::Motivation => &[ManageGoal, ActiveGoals, UpdateState],
            ModuleKind::WorkingMemory => &[AddItem, RemoveItem, SetFocus],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ActionTemplate::Process => "Process input",
            ActionTemplate::Appraise => "Appraise event",
            ActionTemplate::Express => "Get expression",
            ActionTemplate::ManageGoal => "Manage goal",
            ActionTemplate::ActiveGoals => "Active goals",
            ActionTemplate::UpdateState => "Update state",
            ActionTemplate::AddItem => "Add item",
            ActionTemplate::RemoveItem => "Remove item",
            ActionTemplate::SetFocus => "Set focus",
        }
    }

    /// Input labels with their initial text.
    fn inputs(self) -> Vec<(&'static str, String)> {
        let goal = GoalForm::default();
        match self {
            ActionTemplate::Process => vec![
                ("raw_input", String::new()),
                ("modality", "text".into()),
                ("context (JSON)", String::new()),
            ],
            ActionTemplate::Appraise => vec![
                ("event_info (JSON)", String::new()),
                ("context (JSON)", String::new()),
            ],
            ActionTemplate::Express => Vec::new(),
            ActionTemplate::ManageGoal => vec![
                ("action", goal.action.as_str().into()),
                ("id", goal.id),
                ("description", goal.description),
                ("type", goal.goal_type),
                ("priority", goal.priority.to_string()),
                ("source", goal.source),
                ("details (JSON)", goal.details),
                ("new_status", goal.new_status),
            ],
            ActionTemplate::ActiveGoals => vec![("N", "0".into()), ("min_priority", "0".into())],
            ActionTemplate::UpdateState => vec![("state_info (JSON)", String::new())],
            ActionTemplate::AddItem => vec![
                ("item_content (JSON)", String::new()),
                ("salience", "0.5".into()),
                ("context (JSON)", String::new()),
            ],
            ActionTemplate::RemoveItem | ActionTemplate::SetFocus => {
                vec![("item_id", String::new())]
            }
        }
    }
}

/// Text inputs for one module action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionForm {
    pub template: ActionTemplate,
    pub inputs: Vec<(&'static str, String)>,
}

impl ActionForm {
    pub fn new(template: ActionTemplate) -> Self {
        Self {
            template,
            inputs: template.inputs(),
        }
    }

    fn text(&self, i: usize) -> String {
        self.inputs.get(i).map(|(_, v)| v.clone()).unwrap_or_default()
    }

    fn number(&self, i: usize) -> ConsoleResult<f64> {
        let (label, text) = self
            .inputs
            .get(i)
            .ok_or_else(|| ConsoleError::input("missing input"))?;
        text.trim()
            .parse::<f64>()
            .map_err(|_| ConsoleError::input(format!("{} must be a number", label)))
    }

    /// Build the action. Numeric inputs are checked here; JSON inputs by the panel.
    pub fn build(&self) -> ConsoleResult<ModuleAction> {
        Ok(match self.template {
            ActionTemplate::Process => ModuleAction::Process {
                raw_input: self.text(0),
                modality: self.text(1),
                context: self.text(2),
            },
            ActionTemplate::Appraise => ModuleAction::Appraise {
                event_info: self.text(0),
                context: self.text(1),
            },
            ActionTemplate::Express => ModuleAction::Express,
            ActionTemplate::ManageGoal => ModuleAction::ManageGoal(GoalForm {
                action: self.text(0).trim().parse::<GoalAction>()?,
                id: self.text(1),
                description: self.text(2),
                goal_type: self.text(3),
                priority: self.number(4)?,
                source: self.text(5),
                details: self.text(6),
                new_status: self.text(7),
            }),
            ActionTemplate::ActiveGoals => ModuleAction::ActiveGoals {
                n: self
                    .text(0)
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConsoleError::input("N must be a whole number"))?,
                min_priority: self.number(1)?,
            },
            ActionTemplate::UpdateState => ModuleAction::UpdateState {
                state_info: self.text(0),
            },
            ActionTemplate::AddItem => ModuleAction::AddItem {
                item_content: self.text(0),
                salience: self.number(1)?,
                context: self.text(2),
            },
            ActionTemplate::RemoveItem => ModuleAction::RemoveItem {
                item_id: self.text(0),
            },
            ActionTemplate::SetFocus => ModuleAction::SetFocus {
                item_id: self.text(0),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pia_core::{ErrorKind, ResourceKind};
    use serde_json::json;

    #[test]
    fn create_editor_lists_filename_first() {
        let editor = FormEditor::create(ResourceKind::Prompt);
        let fields = editor_fields(&editor);
        assert_eq!(fields[0].kind, FieldKind::Identifier);
        assert_eq!(fields[1].path, "objective");

        let edit = FormEditor::edit(ResourceKind::Prompt, "p.json");
        assert_ne!(editor_fields(&edit)[0].kind, FieldKind::Identifier);
    }

    #[test]
    fn curriculum_steps_expand_into_fields() {
        let mut editor = FormEditor::create(ResourceKind::Curriculum);
        let base = editor_fields(&editor).len();
        editor.add_item().unwrap();
        let fields = editor_fields(&editor);
        assert_eq!(fields.len(), base + 5);
        let order = fields.iter().find(|f| f.path == "steps.0.order").unwrap();
        assert_eq!(order.step, Some(0));
        assert_eq!(field_text(&editor, order), "1");
    }

    #[test]
    fn apply_field_by_kind() {
        let mut editor = FormEditor::create(ResourceKind::Prompt);
        let fields = editor_fields(&editor);
        let find = |path: &str| fields.iter().find(|f| f.path == path).cloned().unwrap();

        let metrics = find("requirements.success_metrics");
        apply_field(&mut editor, &metrics, "fast, accurate").unwrap();
        assert_eq!(field_text(&editor, &metrics), "fast, accurate");

        let openness = find(&format!("{}.personality_config.ocean_openness", CMC));
        apply_field(&mut editor, &openness, "0.9").unwrap();
        assert_eq!(editor.draft().unwrap().field(&openness.path), Some(json!(0.9)));
        let err = apply_field(&mut editor, &openness, "high").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);

        apply_field(&mut editor, &fields[0], "My.json").unwrap();
        assert_eq!(editor.identifier(), "My.json");
    }

    #[test]
    fn action_form_builds_typed_action() {
        let mut form = ActionForm::new(ActionTemplate::AddItem);
        form.inputs[0].1 = r#"{"fact": 1}"#.into();
        form.inputs[1].1 = "0.7".into();
        assert_eq!(
            form.build().unwrap(),
            ModuleAction::AddItem {
                item_content: r#"{"fact": 1}"#.into(),
                salience: 0.7,
                context: String::new(),
            }
        );

        form.inputs[1].1 = "lots".into();
        assert_eq!(form.build().unwrap_err().to_string(), "salience must be a number");
    }

    #[test]
    fn every_module_offers_forms() {
        for module in ModuleKind::ALL {
            for template in ActionTemplate::for_module(module) {
                let action = ActionForm::new(*template).build().unwrap();
                assert_eq!(action.module(), module);
            }
        }
    }
}
