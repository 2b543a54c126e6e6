//! Module action forms and the requests they turn into.
//!
//! Free-form JSON fields are kept as the text the user typed and parsed by
//! [`ModuleAction::prepare`]; a parse failure never reaches the network.

use super::ModuleKind;
use crate::client::{Method, ResourceClient};
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalAction {
    #[default]
    Add,
    UpdateStatus,
    Remove,
    ListAll,
}

impl GoalAction {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalAction::Add => "add",
            GoalAction::UpdateStatus => "update_status",
            GoalAction::Remove => "remove",
            GoalAction::ListAll => "list_all",
        }
    }
}

impl std::str::FromStr for GoalAction {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(GoalAction::Add),
            "update_status" | "update-status" => Ok(GoalAction::UpdateStatus),
            "remove" => Ok(GoalAction::Remove),
            "list_all" | "list-all" => Ok(GoalAction::ListAll),
            other => Err(ConsoleError::input(format!("Unknown goal action '{}'", other))),
        }
    }
}

/// Motivation `manage` form. Which fields are sent depends on `action`.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalForm {
    pub action: GoalAction,
    pub id: String,
    pub description: String,
    pub goal_type: String,
    pub priority: f64,
    pub source: String,
    /// JSON object text; blank means `{}`.
    pub details: String,
    pub new_status: String,
}

impl Default for GoalForm {
    fn default() -> Self {
        Self {
            action: GoalAction::Add,
            id: String::new(),
            description: String::new(),
            goal_type: "intrinsic".to_string(),
            priority: 0.5,
            source: String::new(),
            details: String::new(),
            new_status: "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleAction {
    /// Perception: process raw input. `context` is optional JSON.
    Process {
        raw_input: String,
        modality: String,
        context: String,
    },
    /// Emotion: appraise an event. `event_info` is required JSON, `context` optional.
    Appraise { event_info: String, context: String },
    /// Emotion: query the current expression.
    Express,
    /// Motivation: add / update / remove / list goals.
    ManageGoal(GoalForm),
    /// Motivation: query active goals. Zero means "no limit".
    ActiveGoals { n: u32, min_priority: f64 },
    /// Motivation: replace state with a required JSON document.
    UpdateState { state_info: String },
    /// Working memory: add an item. `item_content` is required JSON, `context` optional.
    AddItem {
        item_content: String,
        salience: f64,
        context: String,
    },
    RemoveItem { item_id: String },
    SetFocus { item_id: String },
}

/// A fully-formed module call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub module: ModuleKind,
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Whether the call changes remote state (and so invalidates snapshots).
    pub mutating: bool,
}

impl ActionRequest {
    pub async fn send(&self, client: &ResourceClient) -> ConsoleResult<Value> {
        client
            .request(self.method.clone(), &self.path, self.body.as_ref())
            .await
    }
}

fn parse_json(label: &str, text: &str, required: bool) -> ConsoleResult<Value> {
    if text.trim().is_empty() {
        return if required {
            Err(ConsoleError::input(format!("{} cannot be empty", label)))
        } else {
            Ok(Value::Object(Map::new()))
        };
    }
    serde_json::from_str(text)
        .map_err(|e| ConsoleError::input(format!("{} is not valid JSON: {}", label, e)))
}

fn required_text(label: &str, text: &str) -> ConsoleResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::input(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}

fn unit_interval(label: &str, value: f64) -> ConsoleResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConsoleError::input(format!(
            "{} must be between 0.0 and 1.0",
            label
        )));
    }
    Ok(value)
}

impl ModuleAction {
    pub fn module(&self) -> ModuleKind {
        match self {
            ModuleAction::Process { .. } => ModuleKind::Perception,
            ModuleAction::Appraise { .. } | ModuleAction::Express => ModuleKind::Emotion,
            ModuleAction::ManageGoal(_)
            | ModuleAction::ActiveGoals { .. }
            | ModuleAction::UpdateState { .. } => ModuleKind::Motivation,
            ModuleAction::AddItem { .. }
            | ModuleAction::RemoveItem { .. }
            | ModuleAction::SetFocus { .. } => ModuleKind::WorkingMemory,
        }
    }

    /// Endpoint name, also used as the action's task key.
    pub fn key(&self) -> &'static str {
        match self {
            ModuleAction::Process { .. } => "process",
            ModuleAction::Appraise { .. } => "appraise",
            ModuleAction::Express => "express",
            ModuleAction::ManageGoal(_) => "manage",
            ModuleAction::ActiveGoals { .. } => "active_goals",
            ModuleAction::UpdateState { .. } => "update_state",
            ModuleAction::AddItem { .. } => "add_item",
            ModuleAction::RemoveItem { .. } => "remove_item",
            ModuleAction::SetFocus { .. } => "set_focus",
        }
    }

    /// Queries read state without changing it.
    pub fn is_query(&self) -> bool {
        matches!(self, ModuleAction::Express | ModuleAction::ActiveGoals { .. })
    }

    /// Validate the form and build the request. Every failure is [`ConsoleError::Input`].
    pub fn prepare(&self) -> ConsoleResult<ActionRequest> {
        let module = self.module();
        let path = module.endpoint(self.key());
        let post = |body: Value| ActionRequest {
            module,
            method: Method::POST,
            path: path.clone(),
            body: Some(body),
            mutating: true,
        };

        let request = match self {
            ModuleAction::Process {
                raw_input,
                modality,
                context,
            } => {
                let context = parse_json("Context", context, false)?;
                let modality = if modality.trim().is_empty() { "text" } else { modality.trim() };
                post(json!({ "raw_input": raw_input, "modality": modality, "context": context }))
            }
            ModuleAction::Appraise { event_info, context } => {
                let event_info = parse_json("Event Info", event_info, true)?;
                let context = parse_json("Context", context, false)?;
                post(json!({ "event_info": event_info, "context": context }))
            }
            ModuleAction::Express => ActionRequest {
                module,
                method: Method::GET,
                path: path.clone(),
                body: None,
                mutating: false,
            },
            ModuleAction::ManageGoal(form) => {
                let goal_data = match form.action {
                    GoalAction::Add => json!({
                        "description": required_text("Description", &form.description)?,
                        "type": form.goal_type.trim(),
                        "priority": unit_interval("Priority", form.priority)?,
                        "source": form.source.trim(),
                        "details": parse_json("Goal Details", &form.details, false)?,
                    }),
                    GoalAction::UpdateStatus => json!({
                        "id": required_text("Goal ID", &form.id)?,
                        "status": required_text("Status", &form.new_status)?,
                    }),
                    GoalAction::Remove => json!({ "id": required_text("Goal ID", &form.id)? }),
                    GoalAction::ListAll => json!({}),
                };
                let mut request = post(json!({ "action": form.action.as_str(), "goal_data": goal_data }));
                request.mutating = form.action != GoalAction::ListAll;
                request
            }
            ModuleAction::ActiveGoals { n, min_priority } => {
                let mut query = Vec::new();
                if *n > 0 {
                    query.push(format!("N={}", n));
                }
                if *min_priority > 0.0 {
                    query.push(format!("min_priority={}", min_priority));
                }
                let path = if query.is_empty() {
                    path.clone()
                } else {
                    format!("{}?{}", path, query.join("&"))
                };
                ActionRequest {
                    module,
                    method: Method::GET,
                    path,
                    body: None,
                    mutating: false,
                }
            }
            ModuleAction::UpdateState { state_info } => {
                post(parse_json("New State Info", state_info, true)?)
            }
            ModuleAction::AddItem {
                item_content,
                salience,
                context,
            } => {
                let item_content = parse_json("Item Content", item_content, true)?;
                let context = parse_json("Context", context, false)?;
                let salience = unit_interval("Salience", *salience)?;
                post(json!({ "item_content": item_content, "salience": salience, "context": context }))
            }
            ModuleAction::RemoveItem { item_id } | ModuleAction::SetFocus { item_id } => {
                post(json!({ "item_id": required_text("Item ID", item_id)? }))
            }
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn malformed_json_is_input_error() {
        let action = ModuleAction::Appraise {
            event_info: r#"{"bad": }"#.to_string(),
            context: String::new(),
        };
        assert_eq!(action.prepare().unwrap_err().kind(), ErrorKind::Input);

        let action = ModuleAction::AddItem {
            item_content: r#""note""#.to_string(),
            salience: 0.7,
            context: "[1,".to_string(),
        };
        assert_eq!(action.prepare().unwrap_err().kind(), ErrorKind::Input);
    }

    #[test]
    fn add_item_body() {
        let action = ModuleAction::AddItem {
            item_content: r#"{"fact": "sky is blue"}"#.to_string(),
            salience: 0.7,
            context: String::new(),
        };
        let request = action.prepare().unwrap();
        assert_eq!(request.path, "/cml/wm/add_item");
        assert_eq!(
            request.body,
            Some(json!({"item_content": {"fact": "sky is blue"}, "salience": 0.7, "context": {}}))
        );
        assert!(request.mutating);
    }

    #[test]
    fn active_goals_query_only_when_positive() {
        let plain = ModuleAction::ActiveGoals { n: 0, min_priority: 0.0 }.prepare().unwrap();
        assert_eq!(plain.path, "/cml/motivation/active_goals");
        assert!(!plain.mutating);

        let filtered = ModuleAction::ActiveGoals { n: 3, min_priority: 0.5 }.prepare().unwrap();
        assert_eq!(filtered.path, "/cml/motivation/active_goals?N=3&min_priority=0.5");
        assert_eq!(filtered.method, Method::GET);
    }

    #[test]
    fn manage_goal_shapes() {
        let add = ModuleAction::ManageGoal(GoalForm {
            description: "learn".into(),
            details: r#"{"k": 1}"#.into(),
            ..Default::default()
        })
        .prepare()
        .unwrap();
        assert_eq!(
            add.body,
            Some(json!({
                "action": "add",
                "goal_data": {"description": "learn", "type": "intrinsic", "priority": 0.5, "source": "", "details": {"k": 1}}
            }))
        );

        let remove = ModuleAction::ManageGoal(GoalForm {
            action: GoalAction::Remove,
            ..Default::default()
        });
        assert!(remove.prepare().is_err());

        let list = ModuleAction::ManageGoal(GoalForm {
            action: GoalAction::ListAll,
            ..Default::default()
        })
        .prepare()
        .unwrap();
        assert!(!list.mutating);
    }

    #[test]
    fn update_state_requires_json() {
        let empty = ModuleAction::UpdateState { state_info: "  ".into() };
        assert_eq!(empty.prepare().unwrap_err().to_string(), "New State Info cannot be empty");
    }
}
