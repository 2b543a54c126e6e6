//! Command-line definitions and argument parsing helpers.

use clap::{Args, Parser, Subcommand};
use pia_core::{ConsoleResult, FormEditor, GoalAction, GoalForm, ModuleAction, ModuleKind};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "pia", version, about = "PiaAGI dashboard: prompts, curricula, cognitive modules and simulations")]
pub struct Cli {
    /// Config file (overrides PIA_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prompt documents.
    Prompts {
        #[command(subcommand)]
        action: ResourceCommand,
    },
    /// Developmental curricula.
    Curricula {
        #[command(subcommand)]
        action: ResourceCommand,
    },
    /// Cognitive module status and actions.
    Cml {
        #[command(subcommand)]
        action: CmlCommand,
    },
    /// Run a simulation on the scenario engine.
    Simulate,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Prompts { .. } => "prompts",
            Command::Curricula { .. } => "curricula",
            Command::Cml { .. } => "cml",
            Command::Simulate => "simulate",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List the collection.
    List,
    /// Print the server-rendered markdown.
    View { id: String },
    /// Delete after confirmation.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Create from the default template.
    Create {
        /// Filename to request (`.json`, or `.curriculum.json` for curricula).
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Load, change and save an existing document.
    Edit {
        id: String,
        #[command(flatten)]
        edits: EditArgs,
    },
}

#[derive(Debug, Args, Default)]
pub struct EditArgs {
    /// JSON file whose top-level fields are applied first.
    #[arg(long)]
    pub from: Option<String>,
    /// `path=value`; JSON where the field accepts it, else text. Repeatable.
    #[arg(long = "set", value_parser = parse_assignment)]
    pub sets: Vec<(String, String)>,
    /// `path=a,b,c` for comma-separated list fields. Repeatable.
    #[arg(long = "list", value_parser = parse_list_assignment)]
    pub lists: Vec<(String, String)>,
    /// Append blank curriculum steps.
    #[arg(long, default_value_t = 0)]
    pub add_steps: usize,
    /// Remove the curriculum step at this 1-based position.
    #[arg(long)]
    pub remove_step: Option<usize>,
    /// Reassign step orders 1..n from their positions.
    #[arg(long)]
    pub renumber: bool,
}

#[derive(Debug, Subcommand)]
pub enum CmlCommand {
    /// Fetch every status snapshot of a module.
    Status {
        #[arg(value_parser = parse_module)]
        module: ModuleKind,
    },
    /// Perception: process raw input.
    Process {
        #[arg(long)]
        input: String,
        #[arg(long, default_value = "text")]
        modality: String,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Emotion: appraise an event (JSON).
    Appraise {
        #[arg(long)]
        event: String,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Emotion: current expression.
    Express,
    /// Motivation: manage goals.
    Manage {
        #[arg(value_parser = parse_goal_action)]
        action: GoalAction,
        #[arg(long, default_value = "")]
        id: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "intrinsic")]
        goal_type: String,
        #[arg(long, default_value_t = 0.5)]
        priority: f64,
        #[arg(long, default_value = "")]
        source: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long, default_value = "pending")]
        new_status: String,
    },
    /// Motivation: active goals. Zero means no limit.
    ActiveGoals {
        #[arg(short = 'n', long = "top", default_value_t = 0)]
        n: u32,
        #[arg(long, default_value_t = 0.0)]
        min_priority: f64,
    },
    /// Motivation: replace state (JSON).
    UpdateState {
        #[arg(long)]
        state: String,
    },
    /// Working memory: add an item (JSON content).
    AddItem {
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = 0.5)]
        salience: f64,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Working memory: remove an item.
    RemoveItem { item_id: String },
    /// Working memory: focus an item.
    SetFocus { item_id: String },
}

impl CmlCommand {
    /// The module action to run, or `None` for `status`.
    pub fn to_action(&self) -> Option<ModuleAction> {
        let action = match self {
            CmlCommand::Status { .. } => return None,
            CmlCommand::Process {
                input,
                modality,
                context,
            } => ModuleAction::Process {
                raw_input: input.clone(),
                modality: modality.clone(),
                context: context.clone(),
            },
            CmlCommand::Appraise { event, context } => ModuleAction::Appraise {
                event_info: event.clone(),
                context: context.clone(),
            },
            CmlCommand::Express => ModuleAction::Express,
            CmlCommand::Manage {
                action,
                id,
                description,
                goal_type,
                priority,
                source,
                details,
                new_status,
            } => ModuleAction::ManageGoal(GoalForm {
                action: *action,
                id: id.clone(),
                description: description.clone(),
                goal_type: goal_type.clone(),
                priority: *priority,
                source: source.clone(),
                details: details.clone(),
                new_status: new_status.clone(),
            }),
            CmlCommand::ActiveGoals { n, min_priority } => ModuleAction::ActiveGoals {
                n: *n,
                min_priority: *min_priority,
            },
            CmlCommand::UpdateState { state } => ModuleAction::UpdateState {
                state_info: state.clone(),
            },
            CmlCommand::AddItem {
                content,
                salience,
                context,
            } => ModuleAction::AddItem {
                item_content: content.clone(),
                salience: *salience,
                context: context.clone(),
            },
            CmlCommand::RemoveItem { item_id } => ModuleAction::RemoveItem {
                item_id: item_id.clone(),
            },
            CmlCommand::SetFocus { item_id } => ModuleAction::SetFocus {
                item_id: item_id.clone(),
            },
        };
        Some(action)
    }
}

fn split_assignment(s: &str) -> Result<(String, &str), String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected path=value, got '{}'", s))?;
    let path = path.trim();
    if path.is_empty() {
        return Err("field path is empty".into());
    }
    Ok((path.to_string(), value))
}

pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (path, raw) = split_assignment(s)?;
    Ok((path, raw.to_string()))
}

pub fn parse_list_assignment(s: &str) -> Result<(String, String), String> {
    parse_assignment(s)
}

/// Apply one `--set`. Objects and arrays must be JSON; scalars fall back to text
/// when the field rejects them, so `version=1.0` stays a string.
pub fn apply_assignment(editor: &mut FormEditor, path: &str, raw: &str) -> ConsoleResult<()> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => editor.set_field(path, value),
        Ok(value) => editor.set_field(path, value).or_else(|_| editor.set_text(path, raw)),
        Err(_) => editor.set_text(path, raw),
    }
}

pub fn parse_module(s: &str) -> Result<ModuleKind, String> {
    s.parse().map_err(|e: pia_core::ConsoleError| e.to_string())
}

pub fn parse_goal_action(s: &str) -> Result<GoalAction, String> {
    s.parse().map_err(|e: pia_core::ConsoleError| e.to_string())
}
