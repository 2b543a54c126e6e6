//! Cognitive module library (CML) services: status snapshots and actions.

pub mod actions;
pub mod panel;

pub use actions::{ActionRequest, GoalAction, GoalForm, ModuleAction};
pub use panel::{ActionStart, ModuleStatusPanel, SnapshotFetch};

use crate::error::ConsoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Perception,
    Emotion,
    Motivation,
    WorkingMemory,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Perception,
        ModuleKind::Emotion,
        ModuleKind::Motivation,
        ModuleKind::WorkingMemory,
    ];

    /// URL segment under `/cml`.
    pub fn segment(self) -> &'static str {
        match self {
            ModuleKind::Perception => "perception",
            ModuleKind::Emotion => "emotion",
            ModuleKind::Motivation => "motivation",
            ModuleKind::WorkingMemory => "wm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModuleKind::Perception => "Perception",
            ModuleKind::Emotion => "Emotion",
            ModuleKind::Motivation => "Motivation",
            ModuleKind::WorkingMemory => "Working Memory",
        }
    }

    /// Snapshots a panel for this module displays, in display order.
    pub fn snapshots(self) -> &'static [SnapshotKind] {
        match self {
            ModuleKind::Perception | ModuleKind::Motivation => &[SnapshotKind::Status],
            ModuleKind::Emotion => &[SnapshotKind::Status, SnapshotKind::CurrentEmotion],
            ModuleKind::WorkingMemory => &[
                SnapshotKind::Status,
                SnapshotKind::Contents,
                SnapshotKind::Focus,
            ],
        }
    }

    pub fn endpoint(self, name: &str) -> String {
        format!("/cml/{}/{}", self.segment(), name)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ModuleKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "perception" => Ok(ModuleKind::Perception),
            "emotion" => Ok(ModuleKind::Emotion),
            "motivation" => Ok(ModuleKind::Motivation),
            "wm" | "working_memory" | "working-memory" => Ok(ModuleKind::WorkingMemory),
            other => Err(ConsoleError::input(format!("Unknown module '{}'", other))),
        }
    }
}

/// A read-only view of module state that can be re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Status,
    CurrentEmotion,
    Contents,
    Focus,
}

impl SnapshotKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            SnapshotKind::Status => "status",
            SnapshotKind::CurrentEmotion => "current",
            SnapshotKind::Contents => "contents",
            SnapshotKind::Focus => "get_focus",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SnapshotKind::Status => "Status",
            SnapshotKind::CurrentEmotion => "Current Emotion",
            SnapshotKind::Contents => "Contents",
            SnapshotKind::Focus => "Current Focus",
        }
    }

    /// Task key of this snapshot's fetches.
    pub fn key(self) -> String {
        format!("snapshot:{}", self.endpoint())
    }
}
