//! Read-only rendered view of one resource.

use crate::client::ResourceClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::list_view::{delete_question, Confirm};
use crate::resources::ResourceKind;
use crate::routes::Route;
use crate::tasks::{TaskBoard, Ticket};
use serde_json::Value;

pub const RENDER: &str = "render";
pub const DELETE: &str = "delete";

#[derive(Debug)]
pub struct ViewRenderer {
    kind: ResourceKind,
    id: String,
    markdown: Option<String>,
    tasks: TaskBoard,
}

impl ViewRenderer {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            markdown: None,
            tasks: TaskBoard::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn begin_render(&mut self) -> Ticket {
        self.tasks.begin(RENDER)
    }

    pub fn finish_render(&mut self, ticket: &Ticket, outcome: ConsoleResult<String>) -> bool {
        if !self.tasks.is_current(ticket) {
            return false;
        }
        match outcome {
            Ok(markdown) => {
                self.markdown = Some(markdown);
                self.tasks.finish(ticket, Ok(Value::Bool(true)))
            }
            Err(err) => {
                self.markdown = None;
                self.tasks.finish(ticket, Err(err))
            }
        }
    }

    pub async fn render(&mut self, client: &ResourceClient) {
        let ticket = self.begin_render();
        let outcome = client.render_resource(self.kind, &self.id).await;
        self.finish_render(&ticket, outcome);
    }

    pub fn edit_route(&self) -> Route {
        Route::Edit(self.kind, self.id.clone())
    }

    pub fn begin_delete(&mut self, confirm: &dyn Confirm) -> Option<Ticket> {
        if self.tasks.is_pending(DELETE) || !confirm.confirm(&delete_question(self.kind, &self.id)) {
            return None;
        }
        self.tasks.try_begin(DELETE)
    }

    /// On success the caller navigates to the returned list route.
    pub fn finish_delete(
        &mut self,
        ticket: &Ticket,
        outcome: ConsoleResult<Value>,
    ) -> Option<ConsoleResult<Route>> {
        if !self.tasks.is_current(ticket) {
            return None;
        }
        let routed = outcome.as_ref().map(|_| Route::List(self.kind)).map_err(|e| e.clone());
        self.tasks.finish(ticket, outcome);
        Some(routed)
    }

    /// `Ok(None)` when the user declined.
    pub async fn delete(
        &mut self,
        client: &ResourceClient,
        confirm: &dyn Confirm,
    ) -> ConsoleResult<Option<Route>> {
        let Some(ticket) = self.begin_delete(confirm) else {
            return Ok(None);
        };
        let outcome = client.delete(&self.kind.item_path(&self.id)).await;
        match self.finish_delete(&ticket, outcome) {
            Some(Ok(route)) => Ok(Some(route)),
            Some(Err(err)) => Err(err),
            None => Err(ConsoleError::input("Delete was superseded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_success_routes_to_list() {
        let mut view = ViewRenderer::new(ResourceKind::Curriculum, "c.curriculum.json");
        let ticket = view.begin_delete(&|_: &str| true).unwrap();
        let route = view.finish_delete(&ticket, Ok(json!({"message": "deleted"}))).unwrap();
        assert_eq!(route, Ok(Route::List(ResourceKind::Curriculum)));
        assert_eq!(view.tasks().message(DELETE), Some("deleted"));
    }

    #[test]
    fn render_failure_clears_markdown() {
        let mut view = ViewRenderer::new(ResourceKind::Prompt, "p.json");
        let t = view.begin_render();
        view.finish_render(&t, Ok("# P".into()));
        assert_eq!(view.markdown(), Some("# P"));

        let t = view.begin_render();
        view.finish_render(&t, Err(ConsoleError::Http { status: 404, message: "gone".into() }));
        assert_eq!(view.markdown(), None);
        assert_eq!(view.tasks().error(RENDER).unwrap().to_string(), "gone");
    }
}
