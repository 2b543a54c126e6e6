//! Console state: the active screen, key handling and completion handling.
//!
//! Nothing here touches the terminal or the network. Key presses and completions
//! return the [`Job`]s to spawn next; the binary runs them on the tokio runtime.

use crate::bridge::{AppEvent, Envelope, Job};
use crate::forms::{apply_field, editor_fields, field_text, ActionForm, ActionTemplate, FieldSpec};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pia_core::keys::{EDIT, SUBMIT};
use pia_core::{
    delete_question, DashboardShell, EditorMode, FormEditor, ListView, ModuleKind, ResourceClient,
    ResourceKind, Route, SimulationConsole, ViewRenderer,
};

/// Home menu entries.
pub const MENU: [(&str, Route); 4] = [
    ("Prompts", Route::List(ResourceKind::Prompt)),
    ("Curricula", Route::List(ResourceKind::Curriculum)),
    ("Cognitive modules", Route::Cml),
    ("Simulation", Route::Simulation),
];

#[derive(Debug)]
pub struct ListScreen {
    pub view: ListView,
    pub selected: usize,
}

#[derive(Debug)]
pub struct ViewScreen {
    pub view: ViewRenderer,
    pub scroll: u16,
}

#[derive(Debug)]
pub struct EditScreen {
    pub editor: FormEditor,
    pub selected: usize,
    /// Text being typed into the selected field.
    pub input: Option<String>,
}

#[derive(Debug)]
pub struct CmlScreen {
    pub shell: DashboardShell,
    pub form: ActionForm,
    pub selected: usize,
    pub input: Option<String>,
}

#[derive(Debug)]
pub struct SimulationScreen {
    pub console: SimulationConsole,
    pub scroll: u16,
}

#[derive(Debug)]
pub enum Screen {
    Home { selected: usize },
    List(ListScreen),
    View(ViewScreen),
    Edit(EditScreen),
    Cml(CmlScreen),
    Simulation(SimulationScreen),
}

/// A delete waiting for the y/n answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: ResourceKind,
    pub id: String,
    pub from_view: bool,
}

impl PendingDelete {
    pub fn question(&self) -> String {
        delete_question(self.kind, &self.id)
    }
}

/// What a key press asks the app to do besides mutating the screen.
#[derive(Default)]
struct Effect {
    jobs: Vec<Job>,
    route: Option<Route>,
    module: Option<ModuleKind>,
    confirm: Option<PendingDelete>,
    status: Option<String>,
}

impl Effect {
    fn jobs(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            ..Self::default()
        }
    }

    fn go(route: Route) -> Self {
        Self {
            route: Some(route),
            ..Self::default()
        }
    }

    fn status(message: impl Into<String>) -> Self {
        Self {
            status: Some(message.into()),
            ..Self::default()
        }
    }
}

fn step_up(selected: &mut usize) {
    *selected = selected.saturating_sub(1);
}

fn step_down(selected: &mut usize, len: usize) {
    if *selected + 1 < len {
        *selected += 1;
    }
}

/// Shared line-editing keys. Returns the committed text on Enter.
fn edit_line(buffer: &mut Option<String>, code: KeyCode) -> Option<String> {
    let text = buffer.as_mut()?;
    match code {
        KeyCode::Char(c) => text.push(c),
        KeyCode::Backspace => {
            text.pop();
        }
        KeyCode::Enter => return buffer.take(),
        KeyCode::Esc => *buffer = None,
        _ => {}
    }
    None
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

impl ListScreen {
    fn selected_id(&self) -> Option<String> {
        self.view
            .items()
            .get(self.selected)
            .map(|s| s.filename.clone())
    }

    fn refresh(&mut self) -> Job {
        Job::List {
            kind: self.view.kind(),
            ticket: self.view.begin_refresh(),
        }
    }

    fn on_key(&mut self, code: KeyCode) -> Effect {
        let kind = self.view.kind();
        match code {
            KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.selected),
            KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.selected, self.view.items().len()),
            KeyCode::Char('r') => return Effect::jobs(vec![self.refresh()]),
            KeyCode::Char('c') | KeyCode::Char('n') => return Effect::go(self.view.create_route()),
            KeyCode::Enter | KeyCode::Char('v') => {
                if let Some(id) = self.selected_id() {
                    return Effect::go(self.view.view_route(&id));
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    return Effect::go(self.view.edit_route(&id));
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    if self.view.is_deleting(&id) {
                        return Effect::status(format!("{} is already being deleted", id));
                    }
                    return Effect {
                        confirm: Some(PendingDelete {
                            kind,
                            id,
                            from_view: false,
                        }),
                        ..Effect::default()
                    };
                }
            }
            KeyCode::Esc => return Effect::go(Route::Home),
            _ => {}
        }
        Effect::default()
    }
}

impl ViewScreen {
    fn on_key(&mut self, code: KeyCode) -> Effect {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('e') => return Effect::go(self.view.edit_route()),
            KeyCode::Char('r') => {
                return Effect::jobs(vec![Job::Render {
                    kind: self.view.kind(),
                    id: self.view.id().to_string(),
                    ticket: self.view.begin_render(),
                }])
            }
            KeyCode::Char('d') => {
                return Effect {
                    confirm: Some(PendingDelete {
                        kind: self.view.kind(),
                        id: self.view.id().to_string(),
                        from_view: true,
                    }),
                    ..Effect::default()
                }
            }
            KeyCode::Esc => return Effect::go(Route::List(self.view.kind())),
            _ => {}
        }
        Effect::default()
    }
}

impl EditScreen {
    pub fn new(editor: FormEditor) -> Self {
        Self {
            editor,
            selected: 0,
            input: None,
        }
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        editor_fields(&self.editor)
    }

    fn selected_field(&self) -> Option<FieldSpec> {
        self.fields().get(self.selected).cloned()
    }

    fn clamp(&mut self) {
        let len = self.fields().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn on_key(&mut self, code: KeyCode) -> Effect {
        if self.input.is_some() {
            if let Some(text) = edit_line(&mut self.input, code) {
                if let Some(spec) = self.selected_field() {
                    if let Err(err) = apply_field(&mut self.editor, &spec, &text) {
                        return Effect::status(err.to_string());
                    }
                }
            }
            return Effect::default();
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.selected),
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.fields().len();
                step_down(&mut self.selected, len)
            }
            KeyCode::Enter => {
                if !self.editor.is_loaded() {
                    return Effect::status(format!("The {} has not been loaded", self.editor.kind().label()));
                }
                if let Some(spec) = self.selected_field() {
                    self.input = Some(field_text(&self.editor, &spec));
                }
            }
            KeyCode::Char('a') => match self.editor.add_item() {
                Ok(index) => {
                    let target = format!("steps.{}.name", index);
                    if let Some(pos) = self.fields().iter().position(|f| f.path == target) {
                        self.selected = pos;
                    }
                }
                Err(err) => return Effect::status(err.to_string()),
            },
            KeyCode::Char('x') => {
                let Some(step) = self.selected_field().and_then(|f| f.step) else {
                    return Effect::status("Select a step field to remove that step");
                };
                if let Err(err) = self.editor.remove_item(step) {
                    return Effect::status(err.to_string());
                }
                self.clamp();
            }
            KeyCode::Char('n') => {
                if let Err(err) = self.editor.renumber_items() {
                    return Effect::status(err.to_string());
                }
            }
            KeyCode::Char('s') => {
                return match self.editor.begin_submit() {
                    Some((ticket, request)) => Effect::jobs(vec![Job::Submit { ticket, request }]),
                    None => Effect::status(
                        self.editor
                            .tasks()
                            .error(SUBMIT)
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| "A submission is already in progress".into()),
                    ),
                };
            }
            KeyCode::Esc => {
                let kind = self.editor.kind();
                return Effect::go(match self.editor.mode() {
                    EditorMode::Edit { id } => Route::View(kind, id.clone()),
                    EditorMode::Create => Route::List(kind),
                });
            }
            _ => {}
        }
        Effect::default()
    }

    /// Last field edit error, if the most recent edit failed.
    pub fn edit_error(&self) -> Option<String> {
        self.editor.tasks().error(EDIT).map(|e| e.to_string())
    }
}

impl CmlScreen {
    pub fn new() -> Self {
        Self {
            shell: DashboardShell::new(),
            form: ActionForm::new(ActionTemplate::Process),
            selected: 0,
            input: None,
        }
    }

    pub fn templates(&self) -> &'static [ActionTemplate] {
        self.shell
            .selected()
            .map(ActionTemplate::for_module)
            .unwrap_or(&[])
    }

    /// Mount `module` and start its snapshot fetches. Empty when it is already shown.
    fn select(&mut self, module: ModuleKind) -> Option<Vec<Job>> {
        if !self.shell.select(module) {
            return None;
        }
        self.reset_form(ActionTemplate::for_module(module)[0]);
        Some(self.refresh())
    }

    fn reset_form(&mut self, template: ActionTemplate) {
        self.form = ActionForm::new(template);
        self.selected = 0;
        self.input = None;
    }

    fn refresh(&mut self) -> Vec<Job> {
        self.shell
            .panel_mut()
            .map(|panel| panel.begin_refresh_all().into_iter().map(Job::Snapshot).collect())
            .unwrap_or_default()
    }

    fn next_template(&mut self) {
        let templates = self.templates();
        if templates.is_empty() {
            return;
        }
        let pos = templates
            .iter()
            .position(|t| *t == self.form.template)
            .map(|i| (i + 1) % templates.len())
            .unwrap_or(0);
        self.reset_form(templates[pos]);
    }

    fn run_action(&mut self) -> Effect {
        let action = match self.form.build() {
            Ok(action) => action,
            Err(err) => return Effect::status(err.to_string()),
        };
        let Some(panel) = self.shell.panel_mut() else {
            return Effect::default();
        };
        match panel.begin_action(&action) {
            Some(start) => Effect::jobs(vec![Job::Action(start)]),
            None => Effect::status(
                panel
                    .action_error(action.key())
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
            ),
        }
    }

    fn on_key(&mut self, code: KeyCode) -> Effect {
        if self.input.is_some() {
            if let Some(text) = edit_line(&mut self.input, code) {
                if let Some(slot) = self.form.inputs.get_mut(self.selected) {
                    slot.1 = text;
                }
            }
            return Effect::default();
        }

        match code {
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                return Effect {
                    module: Some(ModuleKind::ALL[index]),
                    ..Effect::default()
                };
            }
            KeyCode::Tab => self.next_template(),
            KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.selected),
            KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.selected, self.form.inputs.len()),
            KeyCode::Enter => {
                if let Some((_, text)) = self.form.inputs.get(self.selected) {
                    self.input = Some(text.clone());
                }
            }
            KeyCode::Char('r') => return Effect::jobs(self.refresh()),
            KeyCode::Char('g') => return self.run_action(),
            KeyCode::Esc => return Effect::go(Route::Home),
            _ => {}
        }
        Effect::default()
    }
}

impl Default for CmlScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationScreen {
    fn on_key(&mut self, code: KeyCode) -> Effect {
        match code {
            KeyCode::Char('r') | KeyCode::Enter => match self.console.begin_run() {
                Some(ticket) => {
                    self.scroll = 0;
                    return Effect::jobs(vec![Job::Simulate(ticket)]);
                }
                None => return Effect::status("A simulation is already running"),
            },
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Esc => return Effect::go(Route::Home),
            _ => {}
        }
        Effect::default()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    title: String,
    /// PES client, for resolving simulation image URLs.
    pes: ResourceClient,
    screen: Screen,
    /// Bumped on every navigation; completions from older screens are ignored.
    generation: u64,
    confirm: Option<PendingDelete>,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(title: impl Into<String>, pes: ResourceClient) -> Self {
        Self {
            title: title.into(),
            pes,
            screen: Screen::Home { selected: 0 },
            generation: 0,
            confirm: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pes(&self) -> &ResourceClient {
        &self.pes
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn confirm(&self) -> Option<&PendingDelete> {
        self.confirm.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// True while a text field has keyboard focus.
    pub fn is_typing(&self) -> bool {
        match &self.screen {
            Screen::Edit(s) => s.input.is_some(),
            Screen::Cml(s) => s.input.is_some(),
            _ => false,
        }
    }

    /// Replace the current screen. Returns the initial requests of the new one.
    pub fn navigate(&mut self, route: Route) -> Vec<Job> {
        self.generation += 1;
        self.confirm = None;
        tracing::debug!(%route, generation = self.generation, "navigate");
        let (screen, jobs) = match route {
            Route::Home | Route::PesIndex => (Screen::Home { selected: 0 }, Vec::new()),
            Route::List(kind) => {
                let mut screen = ListScreen {
                    view: ListView::new(kind),
                    selected: 0,
                };
                let job = screen.refresh();
                (Screen::List(screen), vec![job])
            }
            Route::View(kind, id) => {
                let mut view = ViewRenderer::new(kind, id.clone());
                let ticket = view.begin_render();
                (
                    Screen::View(ViewScreen { view, scroll: 0 }),
                    vec![Job::Render { kind, id, ticket }],
                )
            }
            Route::New(kind) => (Screen::Edit(EditScreen::new(FormEditor::create(kind))), Vec::new()),
            Route::Edit(kind, id) => {
                let mut editor = FormEditor::edit(kind, id.clone());
                let jobs = editor
                    .begin_load()
                    .map(|ticket| Job::Load { kind, id, ticket })
                    .into_iter()
                    .collect();
                (Screen::Edit(EditScreen::new(editor)), jobs)
            }
            Route::Cml => {
                let mut screen = CmlScreen::new();
                let jobs = screen.select(ModuleKind::Perception).unwrap_or_default();
                (Screen::Cml(screen), jobs)
            }
            Route::Simulation => (
                Screen::Simulation(SimulationScreen {
                    console: SimulationConsole::new(),
                    scroll: 0,
                }),
                Vec::new(),
            ),
        };
        self.screen = screen;
        jobs
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Job> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }
        self.status = None;

        if let Some(pending) = self.confirm.take() {
            return self.answer_confirm(pending, key.code);
        }
        if !self.is_typing() && key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return Vec::new();
        }

        let effect = match &mut self.screen {
            Screen::Home { selected } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    step_up(selected);
                    Effect::default()
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    step_down(selected, MENU.len());
                    Effect::default()
                }
                KeyCode::Enter => Effect::go(MENU[*selected].1.clone()),
                KeyCode::Char(c @ '1'..='4') => Effect::go(MENU[c as usize - '1' as usize].1.clone()),
                _ => Effect::default(),
            },
            Screen::List(s) => s.on_key(key.code),
            Screen::View(s) => s.on_key(key.code),
            Screen::Edit(s) => s.on_key(key.code),
            Screen::Cml(s) => s.on_key(key.code),
            Screen::Simulation(s) => s.on_key(key.code),
        };
        self.commit(effect)
    }

    fn commit(&mut self, effect: Effect) -> Vec<Job> {
        let mut jobs = effect.jobs;
        if effect.status.is_some() {
            self.status = effect.status;
        }
        if effect.confirm.is_some() {
            self.confirm = effect.confirm;
        }
        if let Some(module) = effect.module {
            jobs.extend(self.select_module(module));
        }
        if let Some(route) = effect.route {
            jobs.extend(self.navigate(route));
        }
        jobs
    }

    fn select_module(&mut self, module: ModuleKind) -> Vec<Job> {
        let Screen::Cml(screen) = &mut self.screen else {
            return Vec::new();
        };
        match screen.select(module) {
            Some(jobs) => {
                self.generation += 1;
                jobs
            }
            None => Vec::new(),
        }
    }

    fn answer_confirm(&mut self, pending: PendingDelete, code: KeyCode) -> Vec<Job> {
        if !matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.status = Some("Delete cancelled".into());
            return Vec::new();
        }
        let accept = |_: &str| true;
        let ticket = match (&mut self.screen, pending.from_view) {
            (Screen::List(s), false) => s.view.begin_delete(&pending.id, &accept),
            (Screen::View(s), true) => s.view.begin_delete(&accept),
            _ => None,
        };
        match ticket {
            Some(ticket) => vec![Job::Delete {
                kind: pending.kind,
                id: pending.id,
                ticket,
                from_view: pending.from_view,
            }],
            None => Vec::new(),
        }
    }

    /// Apply a completion. Returns follow-up requests (list re-fetch, snapshot refresh, new screen).
    pub fn apply(&mut self, envelope: Envelope) -> Vec<Job> {
        if envelope.generation != self.generation {
            tracing::debug!(
                generation = envelope.generation,
                current = self.generation,
                "completion for a closed screen ignored"
            );
            return Vec::new();
        }

        let mut jobs = Vec::new();
        let mut next = None;
        match (envelope.event, &mut self.screen) {
            (AppEvent::Listed { ticket, outcome }, Screen::List(s)) => {
                s.view.finish_refresh(&ticket, outcome);
                s.selected = s.selected.min(s.view.items().len().saturating_sub(1));
            }
            (AppEvent::Deleted { ticket, outcome, from_view: false }, Screen::List(s)) => {
                let failure = outcome.as_ref().err().map(|e| e.to_string());
                if s.view.finish_delete(&ticket, outcome) {
                    jobs.push(s.refresh());
                }
                self.status = failure;
            }
            (AppEvent::Deleted { ticket, outcome, from_view: true }, Screen::View(s)) => {
                match s.view.finish_delete(&ticket, outcome) {
                    Some(Ok(route)) => next = Some(route),
                    Some(Err(err)) => self.status = Some(err.to_string()),
                    None => {}
                }
            }
            (AppEvent::Rendered { ticket, outcome }, Screen::View(s)) => {
                s.view.finish_render(&ticket, outcome);
            }
            (AppEvent::Loaded { ticket, outcome }, Screen::Edit(s)) => {
                s.editor.finish_load(&ticket, outcome);
                s.clamp();
            }
            (AppEvent::Submitted { ticket, outcome }, Screen::Edit(s)) => {
                match s.editor.finish_submit(&ticket, outcome) {
                    Some(Ok(route)) => {
                        self.status = s.editor.tasks().message(SUBMIT).map(str::to_string);
                        next = Some(route);
                    }
                    Some(Err(err)) => self.status = Some(err.to_string()),
                    None => {}
                }
            }
            (AppEvent::Snapshot { fetch, outcome }, Screen::Cml(s)) => {
                if let Some(panel) = s.shell.panel_mut() {
                    panel.finish_fetch(&fetch, outcome);
                }
            }
            (AppEvent::ActionDone { start, outcome }, Screen::Cml(s)) => {
                if let Some(panel) = s.shell.panel_mut() {
                    jobs.extend(panel.finish_action(&start, outcome).into_iter().map(Job::Snapshot));
                }
            }
            (AppEvent::Simulated { ticket, outcome }, Screen::Simulation(s)) => {
                s.console.finish_run(&ticket, outcome);
            }
            (event, _) => tracing::debug!(?event, "completion does not match the current screen"),
        }

        if let Some(route) = next {
            let status = self.status.take();
            jobs.extend(self.navigate(route));
            self.status = status;
        }
        jobs
    }
}
