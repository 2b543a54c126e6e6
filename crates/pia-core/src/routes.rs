//! Navigation targets shared by the front-ends.

use crate::resources::ResourceKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    /// Prompt engineering landing page.
    PesIndex,
    List(ResourceKind),
    New(ResourceKind),
    Edit(ResourceKind, String),
    View(ResourceKind, String),
    /// Cognitive module dashboard.
    Cml,
    /// Simulation runs.
    Simulation,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::PesIndex => "/pes".to_string(),
            Route::List(kind) => format!("/pes/{}", kind.plural()),
            Route::New(kind) => format!("/pes/{}/new", kind.label()),
            Route::Edit(kind, id) => format!("/pes/{}/edit/{}", kind.label(), urlencoding::encode(id)),
            Route::View(kind, id) => format!("/pes/{}/view/{}", kind.label(), urlencoding::encode(id)),
            Route::Cml => "/cml".to_string(),
            Route::Simulation => "/se".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let parts: Vec<&str> = trimmed.split('/').skip(1).collect();
        let route = match parts.as_slice() {
            [] | [""] => Route::Home,
            ["pes"] => Route::PesIndex,
            ["cml"] => Route::Cml,
            ["se"] => Route::Simulation,
            ["pes", plural] => Route::List(plural.parse().ok()?),
            ["pes", kind, "new"] => Route::New(kind.parse().ok()?),
            ["pes", kind, action, id] => {
                let kind: ResourceKind = kind.parse().ok()?;
                let id = urlencoding::decode(id).ok()?.into_owned();
                match *action {
                    "edit" => Route::Edit(kind, id),
                    "view" => Route::View(kind, id),
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(route)
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            Route::List(k) | Route::New(k) | Route::Edit(k, _) | Route::View(k, _) => Some(*k),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_through_parse() {
        let routes = [
            Route::Home,
            Route::PesIndex,
            Route::List(ResourceKind::Curriculum),
            Route::New(ResourceKind::Prompt),
            Route::Edit(ResourceKind::Prompt, "a b.json".into()),
            Route::View(ResourceKind::Curriculum, "x.curriculum.json".into()),
            Route::Cml,
            Route::Simulation,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route.clone()), "{}", route);
        }
    }

    #[test]
    fn view_path_encodes_id() {
        assert_eq!(
            Route::View(ResourceKind::Prompt, "a b.json".into()).path(),
            "/pes/prompt/view/a%20b.json"
        );
        assert_eq!(Route::List(ResourceKind::Prompt).path(), "/pes/prompts");
        assert_eq!(Route::parse("/nope"), None);
    }
}
