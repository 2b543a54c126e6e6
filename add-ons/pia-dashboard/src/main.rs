//! **PiaAGI Dashboard**: `pia` drives the prompt engineering, cognitive module
//! and simulation backends from the shell.
//!
//! ## Usage
//!
//! ```text
//! pia prompts list
//! pia prompts view intro.json
//! pia prompts create --id intro.json --set objective="Greet the user"
//! pia curricula edit basics.curriculum.json --add-steps 1 --set steps.0.name=Counting
//! pia curricula delete basics.curriculum.json --yes
//! pia cml status wm
//! pia cml add-item --content '{"fact": "water boils at 100C"}' --salience 0.8
//! pia simulate
//! ```
//!
//! Backends come from `config/console.toml`, `PIA_CONFIG` or `PIA__*` variables.
//! `RUST_LOG` controls diagnostics on stderr (default `warn`).

mod cli;
mod render;

use chrono::Local;
use clap::Parser;
use cli::{CmlCommand, Command, EditArgs, ResourceCommand};
use pia_core::{
    Backends, ConsoleConfig, ConsoleError, ConsoleResult, ErrorKind, FormEditor, ListPhase, ListView,
    ModuleStatusPanel, ResourceKind, Route, SimulationConsole, ViewRenderer,
};
use std::io::{BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();
    let name = cli.command.name();
    if let Err(e) = run(cli).await {
        eprintln!("pia {}: {}", name, e);
        let code = match e.kind() {
            ErrorKind::Input => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

async fn run(cli: cli::Cli) -> ConsoleResult<()> {
    let config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path)?,
        None => ConsoleConfig::load()?,
    };
    let backends = Backends::from_config(&config)?;
    tracing::debug!(api = %config.api_base_url, cml = %config.cml_base_url, "backends configured");

    match cli.command {
        Command::Prompts { action } => run_resource(&backends, ResourceKind::Prompt, action).await,
        Command::Curricula { action } => run_resource(&backends, ResourceKind::Curriculum, action).await,
        Command::Cml { action } => run_cml(&backends, action).await,
        Command::Simulate => run_simulation(&backends).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts / curricula
// ─────────────────────────────────────────────────────────────────────────────

/// Ask on the terminal; anything but `y`/`yes` declines.
fn ask(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn run_resource(backends: &Backends, kind: ResourceKind, command: ResourceCommand) -> ConsoleResult<()> {
    let client = &backends.pes;
    match command {
        ResourceCommand::List => {
            let mut view = ListView::new(kind);
            view.refresh(client).await;
            if let ListPhase::Failed(err) = view.phase() {
                return Err(err.clone());
            }
            println!();
            println!("  PiaAGI {} ({})  {}", kind.plural(), view.items().len(), Local::now().format("%Y-%m-%d %H:%M"));
            println!("{}", render::resource_table(kind, view.items()));
            Ok(())
        }
        ResourceCommand::View { id } => {
            let mut view = ViewRenderer::new(kind, id);
            view.render(client).await;
            match (view.markdown(), view.tasks().error(pia_core::keys::RENDER)) {
                (Some(markdown), None) => {
                    println!("{}", markdown);
                    Ok(())
                }
                (_, Some(err)) => Err(err.clone()),
                (None, None) => Err(ConsoleError::Decode("empty render".into())),
            }
        }
        ResourceCommand::Delete { id, yes } => {
            let mut view = ListView::new(kind);
            let confirm = |question: &str| yes || ask(question);
            if !view.delete(client, &id, &confirm).await? {
                println!("Cancelled.");
                return Ok(());
            }
            println!("{}", deleted_report(&view, &id));
            Ok(())
        }
        ResourceCommand::Create { id, edits } => {
            let mut editor = FormEditor::create(kind);
            if let Some(id) = id {
                editor.set_identifier(&id)?;
            }
            apply_edits(&mut editor, &edits)?;
            let route = editor.submit(client).await?;
            report_saved(&editor, &route);
            Ok(())
        }
        ResourceCommand::Edit { id, edits } => {
            let mut editor = FormEditor::edit(kind, id);
            editor.load(client).await?;
            apply_edits(&mut editor, &edits)?;
            let route = editor.submit(client).await?;
            report_saved(&editor, &route);
            Ok(())
        }
    }
}

/// Summary after a delete; the remaining count is only shown when the reload worked.
fn deleted_report(view: &ListView, id: &str) -> String {
    let kind = view.kind();
    match view.phase() {
        ListPhase::Failed(err) => format!("Deleted {} {}. Could not reload {}: {}", kind.label(), id, kind.plural(), err),
        _ => format!("Deleted {} {}. {} {} remaining.", kind.label(), id, view.items().len(), kind.plural()),
    }
}

fn apply_edits(editor: &mut FormEditor, edits: &EditArgs) -> ConsoleResult<()> {
    if let Some(path) = &edits.from {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::input(format!("Cannot read {}: {}", path, e)))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ConsoleError::input(format!("{} is not valid JSON: {}", path, e)))?;
        let fields = value
            .as_object()
            .ok_or_else(|| ConsoleError::input(format!("{} must contain a JSON object", path)))?;
        for (key, field) in fields {
            if key == pia_core::documents::DISCRIMINATOR || key == "filename" {
                continue;
            }
            editor.set_field(key, field.clone())?;
        }
    }
    for _ in 0..edits.add_steps {
        editor.add_item()?;
    }
    if let Some(position) = edits.remove_step {
        if position == 0 {
            return Err(ConsoleError::input("Step positions start at 1"));
        }
        editor.remove_item(position - 1)?;
    }
    for (path, raw) in &edits.sets {
        cli::apply_assignment(editor, path, raw)?;
    }
    for (path, text) in &edits.lists {
        editor.set_list(path, text)?;
    }
    if edits.renumber {
        editor.renumber_items()?;
    }
    Ok(())
}

fn report_saved(editor: &FormEditor, route: &Route) {
    let message = editor
        .tasks()
        .message(pia_core::keys::SUBMIT)
        .unwrap_or("Saved.");
    match route {
        Route::View(_, id) => println!("{} ({}, view at {})", message, id, route.path()),
        other => println!("{} ({})", message, other.path()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cognitive modules
// ─────────────────────────────────────────────────────────────────────────────

async fn run_cml(backends: &Backends, command: CmlCommand) -> ConsoleResult<()> {
    let client = &backends.cml;
    let Some(action) = command.to_action() else {
        let CmlCommand::Status { module } = command else {
            return Ok(());
        };
        let mut panel = ModuleStatusPanel::new(module);
        panel.refresh(client).await;
        println!();
        println!("  {} module", module.label());
        println!("{}", render::snapshot_table(&panel));
        return Ok(());
    };

    let mut panel = ModuleStatusPanel::new(action.module());
    let result = panel.run(client, &action).await?;
    println!("{}", render::pretty(&result));
    if !action.is_query() && action.module().snapshots().iter().any(|k| panel.snapshot(*k).is_some()) {
        println!();
        println!("  {} module after {}", action.module().label(), action.key());
        println!("{}", render::snapshot_table(&panel));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulation
// ─────────────────────────────────────────────────────────────────────────────

async fn run_simulation(backends: &Backends) -> ConsoleResult<()> {
    let client = &backends.pes;
    let mut console = SimulationConsole::new();
    console.run(client).await;
    if let Some(err) = console.tasks().error(pia_core::keys::RUN) {
        return Err(err.clone());
    }
    let Some(run) = console.last_run() else {
        return Err(ConsoleError::Decode("simulation returned no result".into()));
    };

    println!();
    println!("  PiaAGI scenario engine v{} client  {}", VERSION, Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", render::simulation_table(run));
    if !run.text_log.is_empty() {
        println!();
        println!("{}", run.text_log);
    }
    for url in console.image_urls(client) {
        println!("image: {}", url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pia_core::ResourceSummary;

    fn summary(id: &str) -> ResourceSummary {
        ResourceSummary { filename: id.into(), name: None, version: None }
    }

    #[test]
    fn step_positions_are_one_based() {
        let mut editor = FormEditor::create(ResourceKind::Curriculum);
        let edits = EditArgs { add_steps: 2, remove_step: Some(0), ..Default::default() };
        let err = apply_edits(&mut editor, &edits).unwrap_err();
        assert_eq!(err, ConsoleError::input("Step positions start at 1"));

        let mut editor = FormEditor::create(ResourceKind::Curriculum);
        let edits = EditArgs {
            add_steps: 2,
            remove_step: Some(1),
            sets: vec![("steps.0.name".into(), "Second".into())],
            ..Default::default()
        };
        apply_edits(&mut editor, &edits).unwrap();
        let steps = editor.draft().and_then(|d| d.field("steps")).unwrap();
        assert_eq!(steps.as_array().map(Vec::len), Some(1));
        assert_eq!(steps[0]["name"], "Second");
    }

    #[test]
    fn delete_report_counts_only_after_reload() {
        let mut view = ListView::new(ResourceKind::Prompt);
        let ticket = view.begin_refresh();
        view.finish_refresh(&ticket, Ok(vec![summary("a.json"), summary("b.json")]));
        assert_eq!(deleted_report(&view, "c.json"), "Deleted prompt c.json. 2 prompts remaining.");

        let mut view = ListView::new(ResourceKind::Prompt);
        let ticket = view.begin_refresh();
        view.finish_refresh(&ticket, Err(ConsoleError::Network("connection refused".into())));
        let report = deleted_report(&view, "c.json");
        assert!(report.starts_with("Deleted prompt c.json. Could not reload prompts:"));
        assert!(report.contains("connection refused"));
        assert!(!report.contains("remaining"));
    }
}
