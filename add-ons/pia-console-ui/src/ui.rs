//! Ratatui rendering of the console screens.

use crate::app::{App, CmlScreen, EditScreen, ListScreen, Screen, SimulationScreen, ViewScreen, MENU};
use crate::forms::field_text;
use pia_core::keys::{EDIT, LOAD, REFRESH, RENDER, RUN, SUBMIT};
use pia_core::{ListPhase, ModuleKind};
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
    },
};

fn titled(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(format!(" {} ", title))
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red)))
}

fn help_text(app: &App) -> &'static str {
    if app.confirm().is_some() {
        return "y = confirm delete, any other key = cancel";
    }
    if app.is_typing() {
        return "type to edit, Enter = apply, Esc = discard";
    }
    match app.screen() {
        Screen::Home { .. } => "1-4 / Enter = open, q = quit",
        Screen::List(_) => "Enter = view, e = edit, c = create, d = delete, r = refresh, Esc = back",
        Screen::View(_) => "e = edit, d = delete, r = re-render, arrows = scroll, Esc = list",
        Screen::Edit(_) => "Enter = edit field, a = add step, x = remove step, n = renumber, s = save, Esc = back",
        Screen::Cml(_) => "1-4 = module, Tab = action, Enter = edit input, g = run, r = refresh, Esc = back",
        Screen::Simulation(_) => "r = run simulation, arrows = scroll log, Esc = back",
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let location = match app.screen() {
        Screen::Home { .. } => "Home".to_string(),
        Screen::List(s) => format!("{} list", s.view.kind().label()),
        Screen::View(s) => format!("{} {}", s.view.kind().label(), s.view.id()),
        Screen::Edit(s) => match s.editor.identifier() {
            "" => format!("New {}", s.editor.kind().label()),
            id => format!("Edit {}", id),
        },
        Screen::Cml(_) => "Cognitive modules".to_string(),
        Screen::Simulation(_) => "Simulation".to_string(),
    };
    let header = Paragraph::new(format!("{} / {}", app.title(), location)).block(titled("PiaAGI"));
    f.render_widget(header, chunks[0]);

    match app.screen() {
        Screen::Home { selected } => draw_home(f, chunks[1], *selected),
        Screen::List(s) => draw_list(f, chunks[1], s),
        Screen::View(s) => draw_view(f, chunks[1], s),
        Screen::Edit(s) => draw_editor(f, chunks[1], s),
        Screen::Cml(s) => draw_cml(f, chunks[1], s),
        Screen::Simulation(s) => draw_simulation(f, chunks[1], s, app),
    }

    if let Some(status) = app.status() {
        f.render_widget(Paragraph::new(status.to_string()).style(Style::default().fg(Color::Yellow)), chunks[2]);
    }
    f.render_widget(Paragraph::new(help_text(app)), chunks[3]);

    if let Some(pending) = app.confirm() {
        let area = centered(f.area(), 60, 5);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(pending.question())
                .wrap(Wrap { trim: true })
                .block(titled("Confirm")),
            area,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_home(f: &mut Frame, area: Rect, selected: usize) {
    let items: Vec<ListItem> = MENU
        .iter()
        .enumerate()
        .map(|(i, (label, route))| ListItem::new(format!("{}. {:<20} {}", i + 1, label, route.path())))
        .collect();
    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(
        List::new(items).block(titled("Menu")).highlight_style(highlight()),
        area,
        &mut state,
    );
}

fn draw_list(f: &mut Frame, area: Rect, screen: &ListScreen) {
    let view = &screen.view;
    let mut title = view.kind().plural().to_string();
    if view.tasks().is_pending(REFRESH) {
        title.push_str(" (loading)");
    }

    let (list_area, error_area) = match view.phase() {
        ListPhase::Failed(_) => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);
            (parts[1], Some(parts[0]))
        }
        _ => (area, None),
    };
    if let (Some(error_area), ListPhase::Failed(err)) = (error_area, view.phase()) {
        f.render_widget(
            Paragraph::new(error_line(&err.to_string())).block(titled("Error")),
            error_area,
        );
    }

    let items: Vec<ListItem> = view
        .items()
        .iter()
        .map(|row| {
            let mut line = format!("{:<40} {}", row.filename, row.display_name());
            if let Some(version) = &row.version {
                line.push_str(&format!("  v{}", version));
            }
            if view.is_deleting(&row.filename) {
                line.push_str("  [deleting]");
            } else if let Some(err) = view.delete_error(&row.filename) {
                line.push_str(&format!("  [delete failed: {}]", err));
            }
            ListItem::new(line)
        })
        .collect();
    let selected = if items.is_empty() { None } else { Some(screen.selected) };
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(
        List::new(items).block(titled(&title)).highlight_style(highlight()),
        list_area,
        &mut state,
    );
}

fn draw_view(f: &mut Frame, area: Rect, screen: &ViewScreen) {
    let view = &screen.view;
    let body: Text = match (view.markdown(), view.tasks().error(RENDER)) {
        (_, Some(err)) => error_line(&err.to_string()).into(),
        (Some(markdown), None) => Text::raw(markdown.to_string()),
        (None, None) => Text::raw("Rendering..."),
    };
    let lines = body.lines.len();
    f.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(titled(view.id()))
            .scroll((screen.scroll, 0)),
        area,
    );
    let mut state = ScrollbarState::default()
        .content_length(lines)
        .position(screen.scroll as usize);
    f.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area,
        &mut state,
    );
}

fn draw_editor(f: &mut Frame, area: Rect, screen: &EditScreen) {
    let editor = &screen.editor;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    if !editor.is_loaded() {
        let body = match editor.tasks().error(LOAD) {
            Some(err) => error_line(&err.to_string()),
            None => Line::from("Loading..."),
        };
        f.render_widget(Paragraph::new(body).block(titled(editor.kind().label())), parts[0]);
        return;
    }

    let items: Vec<ListItem> = screen
        .fields()
        .iter()
        .map(|spec| ListItem::new(format!("{:<24} {}", spec.label, field_text(editor, spec))))
        .collect();
    let mut title = editor.kind().label().to_string();
    if editor.tasks().is_pending(SUBMIT) {
        title.push_str(" (saving)");
    }
    let mut state = ListState::default().with_selected(Some(screen.selected));
    f.render_stateful_widget(
        List::new(items).block(titled(&title)).highlight_style(highlight()),
        parts[0],
        &mut state,
    );

    let footer = match (&screen.input, editor.tasks().error(SUBMIT), editor.tasks().error(EDIT)) {
        (Some(buffer), _, _) => Line::from(format!("> {}_", buffer)),
        (None, Some(err), _) | (None, None, Some(err)) => error_line(&err.to_string()),
        (None, None, None) => Line::from(""),
    };
    f.render_widget(Paragraph::new(footer).block(titled("Input")), parts[1]);
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn draw_cml(f: &mut Frame, area: Rect, screen: &CmlScreen) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let titles: Vec<String> = ModuleKind::ALL
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{} {}", i + 1, m.label()))
        .collect();
    let selected = screen
        .shell
        .selected()
        .and_then(|m| ModuleKind::ALL.iter().position(|k| *k == m))
        .unwrap_or(0);
    f.render_widget(
        Tabs::new(titles)
            .block(titled("Modules"))
            .select(selected)
            .highlight_style(highlight()),
        parts[0],
    );

    let Some(panel) = screen.shell.panel() else {
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(parts[1]);

    let mut snapshot_lines: Vec<Line> = Vec::new();
    for kind in panel.module().snapshots() {
        snapshot_lines.push(Line::from(Span::styled(
            kind.label().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if panel.is_fetching(*kind) {
            snapshot_lines.push(Line::from("  loading..."));
        } else if let Some(err) = panel.snapshot_error(*kind) {
            snapshot_lines.push(error_line(&format!("  {}", err)));
        } else if let Some(value) = panel.snapshot(*kind) {
            snapshot_lines.extend(pretty(value).lines().map(|l| Line::from(format!("  {}", l))));
        }
    }
    f.render_widget(
        Paragraph::new(snapshot_lines)
            .wrap(Wrap { trim: false })
            .block(titled(panel.module().label())),
        columns[0],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Min(4)])
        .split(columns[1]);
    let items: Vec<ListItem> = screen
        .form
        .inputs
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let shown = match (&screen.input, i == screen.selected) {
                (Some(buffer), true) => format!("{}_", buffer),
                _ => value.clone(),
            };
            ListItem::new(format!("{:<20} {}", label, shown))
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(screen.selected));
    f.render_stateful_widget(
        List::new(items)
            .block(titled(screen.form.template.title()))
            .highlight_style(highlight()),
        right[0],
        &mut state,
    );

    let key = screen
        .form
        .build()
        .map(|action| action.key())
        .unwrap_or_default();
    let result: Vec<Line> = if panel.tasks().is_pending(key) {
        vec![Line::from("running...")]
    } else if let Some(err) = panel.action_error(key) {
        vec![error_line(&err.to_string())]
    } else if let Some(value) = panel.action_result(key) {
        pretty(value).lines().map(|l| Line::from(l.to_string())).collect()
    } else {
        Vec::new()
    };
    f.render_widget(
        Paragraph::new(result).wrap(Wrap { trim: false }).block(titled("Result")),
        right[1],
    );
}

fn draw_simulation(f: &mut Frame, area: Rect, screen: &SimulationScreen, app: &App) {
    let console = &screen.console;
    let mut lines: Vec<Line> = Vec::new();
    if console.is_running() {
        lines.push(Line::from("Running simulation..."));
    } else if let Some(err) = console.tasks().error(RUN) {
        lines.push(error_line(&err.to_string()));
    }
    if let Some(run) = console.last_run() {
        let summary = &run.summary;
        lines.push(Line::from(format!("Run {}", run.run_id)));
        lines.push(Line::from(format!(
            "Goal reached: {}   Steps: {}   Final position: {}",
            summary.agent_reached_goal, summary.total_steps_taken, summary.final_agent_position
        )));
        lines.push(Line::from(""));
        lines.extend(run.text_log.lines().map(|l| Line::from(l.to_string())));
        let images = console.image_urls(app.pes());
        if !images.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("Images:"));
            lines.extend(images.into_iter().map(|url| Line::from(format!("  {}", url))));
        }
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(titled("Simulation run"))
            .scroll((screen.scroll, 0)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pia_core::{ResourceClient, ResourceKind, Route};
    use ratatui::backend::TestBackend;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn every_screen_draws() {
        let mut app = App::new("PiaAGI Console", ResourceClient::new("http://localhost:5001").unwrap());
        assert!(render(&app).contains("Prompts"));

        for route in [
            Route::List(ResourceKind::Prompt),
            Route::View(ResourceKind::Curriculum, "c.curriculum.json".into()),
            Route::New(ResourceKind::Prompt),
            Route::Edit(ResourceKind::Prompt, "p.json".into()),
            Route::Cml,
            Route::Simulation,
        ] {
            app.navigate(route);
            let _ = render(&app);
        }
        assert!(render(&app).contains("Simulation"));
    }
}
