//! Terminal tables and text blocks for command output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use pia_core::{ModuleStatusPanel, ResourceKind, ResourceSummary, SimulationRun};
use serde_json::Value;

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(label)
                .set_alignment(CellAlignment::Center)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn resource_table(kind: ResourceKind, rows: &[ResourceSummary]) -> Table {
    let mut table = table();
    table.set_header(header(&["#", "Filename", "Name", "Version"]));
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&row.filename),
            Cell::new(row.display_name()),
            Cell::new(row.version.as_deref().unwrap_or("-")).set_alignment(CellAlignment::Center),
        ]);
    }
    if rows.is_empty() {
        table.add_row(vec![
            Cell::new(""),
            Cell::new(format!("no {} found", kind.plural())).fg(Color::DarkYellow),
            Cell::new(""),
            Cell::new(""),
        ]);
    }
    table
}

pub fn snapshot_table(panel: &ModuleStatusPanel) -> Table {
    let mut table = table();
    table.set_header(header(&["Snapshot", "Endpoint", "Value"]));
    for kind in panel.module().snapshots() {
        let value = match (panel.snapshot(*kind), panel.snapshot_error(*kind)) {
            (_, Some(err)) => Cell::new(format!("✗ {}", err)).fg(Color::Red),
            (Some(value), None) => Cell::new(pretty(value)),
            (None, None) => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(kind.label()).add_attribute(Attribute::Bold),
            Cell::new(panel.module().endpoint(kind.endpoint())),
            value,
        ]);
    }
    table
}

pub fn simulation_table(run: &SimulationRun) -> Table {
    let summary = &run.summary;
    let (goal, color) = if summary.agent_reached_goal {
        ("● reached", Color::Green)
    } else {
        ("○ not reached", Color::DarkYellow)
    };
    let mut table = table();
    table.set_header(header(&["Run", "Goal", "Steps", "Final position"]));
    table.add_row(vec![
        Cell::new(&run.run_id),
        Cell::new(goal).fg(color).set_alignment(CellAlignment::Center),
        Cell::new(summary.total_steps_taken).set_alignment(CellAlignment::Right),
        Cell::new(summary.final_agent_position.to_string()),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_rows_fall_back_to_filename() {
        let rows = vec![
            ResourceSummary { filename: "a.json".into(), name: Some("Alpha".into()), version: Some("0.1.0".into()) },
            ResourceSummary { filename: "b.json".into(), name: None, version: None },
        ];
        let out = resource_table(ResourceKind::Prompt, &rows).to_string();
        assert!(out.contains("Alpha"));
        assert!(out.contains("b.json"));

        let empty = resource_table(ResourceKind::Curriculum, &[]).to_string();
        assert!(empty.contains("no curricula found"));
    }

    #[test]
    fn snapshot_rows_follow_module_layout() {
        let mut panel = ModuleStatusPanel::new(pia_core::ModuleKind::Emotion);
        let fetches = panel.begin_refresh_all();
        panel.finish_fetch(&fetches[0], Ok(json!({"state": "calm"})));
        let out = snapshot_table(&panel).to_string();
        assert!(out.contains("/cml/emotion/status"));
        assert!(out.contains("calm"));
        assert!(out.contains("/cml/emotion/current"));
    }
}
