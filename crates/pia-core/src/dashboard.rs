//! Tab selector over the module panels. Exactly one panel exists at a time.

use crate::modules::{ModuleKind, ModuleStatusPanel};

#[derive(Debug, Default)]
pub struct DashboardShell {
    active: Option<ModuleStatusPanel>,
}

impl DashboardShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `module`. Switching drops the previous panel and all its state; the new
    /// panel starts empty and must be refreshed. Returns true when a panel was mounted.
    pub fn select(&mut self, module: ModuleKind) -> bool {
        if self.selected() == Some(module) {
            return false;
        }
        tracing::debug!(%module, "mounting module panel");
        self.active = Some(ModuleStatusPanel::new(module));
        true
    }

    pub fn selected(&self) -> Option<ModuleKind> {
        self.active.as_ref().map(ModuleStatusPanel::module)
    }

    pub fn panel(&self) -> Option<&ModuleStatusPanel> {
        self.active.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut ModuleStatusPanel> {
        self.active.as_mut()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::SnapshotKind;
    use serde_json::json;

    #[test]
    fn switching_resets_panel_state() {
        let mut shell = DashboardShell::new();
        assert!(shell.select(ModuleKind::Emotion));
        let panel = shell.panel_mut().unwrap();
        let fetch = panel.begin_fetch(SnapshotKind::Status);
        panel.finish_fetch(&fetch, Ok(json!({"state": "calm"})));

        assert!(!shell.select(ModuleKind::Emotion));
        assert!(shell.panel().unwrap().snapshot(SnapshotKind::Status).is_some());

        assert!(shell.select(ModuleKind::Motivation));
        assert!(shell.select(ModuleKind::Emotion));
        assert!(shell.panel().unwrap().snapshot(SnapshotKind::Status).is_none());
        assert_eq!(shell.selected(), Some(ModuleKind::Emotion));
    }
}
