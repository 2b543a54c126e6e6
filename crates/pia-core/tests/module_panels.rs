//! Integration test: CML module panels, the dashboard shell and simulation runs.
//!
//! ## Scenarios
//! 1. Invalid JSON in any free-text field is an input error and sends nothing.
//! 2. Overlapping status fetches: the later fetch wins even when the earlier one resolves last.
//! 3. Successful mutating actions re-fetch every snapshot; queries do not.
//! 4. Simulation results decode and image URLs resolve against the backend.

mod support;

use pia_core::{
    DashboardShell, ErrorKind, GoalAction, GoalForm, ModuleAction, ModuleKind, ModuleStatusPanel,
    SimulationConsole, SnapshotKind,
};
use serde_json::json;
use std::time::Duration;
use support::MockBackend;
use tokio::sync::mpsc;

#[tokio::test]
async fn invalid_json_fields_make_no_requests() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let cases = [
        (
            ModuleKind::Emotion,
            ModuleAction::Appraise {
                event_info: r#"{"bad": }"#.into(),
                context: String::new(),
            },
        ),
        (
            ModuleKind::Perception,
            ModuleAction::Process {
                raw_input: "hello".into(),
                modality: "text".into(),
                context: r#"{"bad": }"#.into(),
            },
        ),
        (
            ModuleKind::Motivation,
            ModuleAction::UpdateState {
                state_info: r#"{"bad": }"#.into(),
            },
        ),
        (
            ModuleKind::Motivation,
            ModuleAction::ManageGoal(GoalForm {
                action: GoalAction::Add,
                description: "learn".into(),
                details: r#"{"bad": }"#.into(),
                ..Default::default()
            }),
        ),
        (
            ModuleKind::WorkingMemory,
            ModuleAction::AddItem {
                item_content: r#"{"bad": }"#.into(),
                salience: 0.5,
                context: String::new(),
            },
        ),
    ];

    for (module, action) in cases {
        let mut panel = ModuleStatusPanel::new(module);
        let err = panel.run(&client, &action).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input, "{:?}", action);
        assert_eq!(panel.action_error(action.key()), Some(&err));
    }
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn later_status_fetch_wins_over_slower_earlier_one() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    backend.delay_cml_get(1, Duration::from_millis(300));

    let mut panel = ModuleStatusPanel::new(ModuleKind::Perception);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let first = panel.begin_fetch(SnapshotKind::Status);
    {
        let (fetch, client, tx) = (first.clone(), client.clone(), tx.clone());
        tokio::spawn(async move {
            let outcome = fetch.send(&client).await;
            let _ = tx.send((fetch, outcome));
        });
    }
    backend.wait_for_hits(1).await;

    let second = panel.begin_fetch(SnapshotKind::Status);
    {
        let (fetch, client, tx) = (second.clone(), client.clone(), tx.clone());
        tokio::spawn(async move {
            let outcome = fetch.send(&client).await;
            let _ = tx.send((fetch, outcome));
        });
    }

    let (done_first, outcome) = rx.recv().await.unwrap();
    assert_eq!(done_first, second);
    assert!(panel.finish_fetch(&done_first, outcome));
    assert_eq!(panel.snapshot(SnapshotKind::Status).unwrap()["request"], json!(2));

    let (done_last, outcome) = rx.recv().await.unwrap();
    assert_eq!(done_last, first);
    assert!(!panel.finish_fetch(&done_last, outcome));
    assert_eq!(panel.snapshot(SnapshotKind::Status).unwrap()["request"], json!(2));
    assert!(!panel.is_fetching(SnapshotKind::Status));
}

#[tokio::test]
async fn mutating_action_refreshes_every_snapshot() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let mut panel = ModuleStatusPanel::new(ModuleKind::WorkingMemory);
    let action = ModuleAction::AddItem {
        item_content: r#"{"fact": "water boils at 100C"}"#.into(),
        salience: 0.8,
        context: r#"{"source": "textbook"}"#.into(),
    };
    let result = panel.run(&client, &action).await.unwrap();
    assert_eq!(result["ok"], json!(true));

    let posts = backend.cml_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "/cml/wm/add_item");
    assert_eq!(
        posts[0].1,
        json!({"item_content": {"fact": "water boils at 100C"}, "salience": 0.8, "context": {"source": "textbook"}})
    );

    for kind in ModuleKind::WorkingMemory.snapshots() {
        assert!(panel.snapshot(*kind).is_some(), "{:?} not refreshed", kind);
    }
    assert_eq!(panel.snapshot(SnapshotKind::Focus).unwrap()["endpoint"], "get_focus");
    assert_eq!(backend.hits(), 4);
}

#[tokio::test]
async fn query_actions_do_not_refresh() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let mut panel = ModuleStatusPanel::new(ModuleKind::Motivation);
    let result = panel
        .run(&client, &ModuleAction::ActiveGoals { n: 2, min_priority: 0.0 })
        .await
        .unwrap();
    assert_eq!(result["endpoint"], "active_goals");
    assert!(panel.snapshot(SnapshotKind::Status).is_none());
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn dashboard_switch_starts_from_empty_panel() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let mut shell = DashboardShell::new();
    shell.select(ModuleKind::Emotion);
    if let Some(panel) = shell.panel_mut() {
        panel.refresh(&client).await;
    }
    assert!(shell.panel().unwrap().snapshot(SnapshotKind::CurrentEmotion).is_some());

    shell.select(ModuleKind::WorkingMemory);
    shell.select(ModuleKind::Emotion);
    assert!(shell.panel().unwrap().snapshot(SnapshotKind::CurrentEmotion).is_none());
}

#[tokio::test]
async fn simulation_run_and_image_urls() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let mut console = SimulationConsole::new();
    assert!(console.run(&client).await);
    let run = console.last_run().unwrap();
    assert_eq!(run.run_id, "run_1");
    assert!(run.summary.agent_reached_goal);
    assert_eq!(run.summary.final_agent_position, json!([4, 4]));
    assert_eq!(
        console.image_urls(&client),
        vec![format!("{}/static/simulations/run_1/final.png", backend.base_url)]
    );
}
