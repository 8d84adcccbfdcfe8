use super::*;
use crate::graph::types::{
    CategoryRecord, CenterRecord, ContentSource, ExperienceContent, LeafRecord, ProjectContent,
};
use crate::graph::IgnoreReason;
use crate::render::render_frame;
use crate::render::tests::RecordingRenderer;
use std::sync::mpsc::{self, Receiver};

fn source() -> ContentSource {
    let category = |id: &str, label: &str| CategoryRecord {
        id: id.into(),
        label: label.into(),
        parent: None,
    };
    ContentSource {
        center: CenterRecord {
            id: "center".into(),
            label: "Me".into(),
        },
        categories: vec![
            category("work", "Work"),
            category("labs", "Embodied intelligence"),
            category("sports", "Sports"),
        ],
        leaves: vec![
            LeafRecord {
                id: "arm".into(),
                label: "Gripper".into(),
                parent: "labs".into(),
                content: ContentPayload::Project(ProjectContent {
                    title: "Lossless gripper".into(),
                    tech_stack: vec!["ROS".into()],
                    ..Default::default()
                }),
            },
            LeafRecord {
                id: "cv".into(),
                label: "Fault diagnosis".into(),
                parent: "labs".into(),
                content: ContentPayload::Project(ProjectContent {
                    title: "Wind turbine fault diagnosis".into(),
                    ..Default::default()
                }),
            },
            LeafRecord {
                id: "erp".into(),
                label: "ERP".into(),
                parent: "work".into(),
                content: ContentPayload::Experience(ExperienceContent {
                    title: "ERP internship".into(),
                    ..Default::default()
                }),
            },
        ],
    }
}

fn config(mode: LayoutMode) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.layout.mode = mode;
    config
}

fn engine_with(config: EngineConfig) -> (SynapseEngine, Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel();
    let model = GraphModel::build(&source()).model;
    let engine = SynapseEngine::new(model, config, Vec2::new(800.0, 600.0), tx)
        .expect("engine should start");
    (engine, rx)
}

fn radial_engine() -> (SynapseEngine, Receiver<EngineEvent>) {
    engine_with(config(LayoutMode::Radial))
}

fn click(engine: &mut SynapseEngine, id: &str, now: f64) -> InteractionOutcome {
    let pos = engine.screen_position(id).expect("node should be visible");
    engine.handle_pointer(PointerEvent::Down(pos), now);
    engine.handle_pointer(PointerEvent::Up(pos), now)
}

fn visible(engine: &SynapseEngine) -> Vec<String> {
    engine
        .visibility()
        .visible_nodes(engine.model())
        .iter()
        .map(|n| n.id.clone())
        .collect()
}

#[test]
fn rejects_unusable_surface() {
    let (tx, _rx) = mpsc::channel();
    let model = GraphModel::build(&source()).model;
    let result = SynapseEngine::new(model.clone(), EngineConfig::default(), Vec2::ZERO, tx.clone());
    assert!(matches!(
        result,
        Err(EngineError::SurfaceUnavailable { .. })
    ));
    let result = SynapseEngine::new(
        model,
        EngineConfig::default(),
        Vec2::new(f32::NAN, 100.0),
        tx,
    );
    assert!(matches!(
        result,
        Err(EngineError::SurfaceUnavailable { .. })
    ));
}

#[test]
fn rejects_invalid_config() {
    let (tx, _rx) = mpsc::channel();
    let mut config = EngineConfig::default();
    config.layout.radii.leaf = 0.0;
    let result = SynapseEngine::new(
        GraphModel::build(&source()).model,
        config,
        Vec2::new(800.0, 600.0),
        tx,
    );
    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}

#[test]
fn center_category_leaf_walkthrough() {
    let (mut engine, events) = radial_engine();
    assert_eq!(visible(&engine), vec!["center"]);
    assert!(!engine.visibility().intro_dismissed());

    assert_eq!(click(&mut engine, "center", 0.0), InteractionOutcome::Click("center".into()));
    assert!(engine.visibility().intro_dismissed());
    assert_eq!(visible(&engine), vec!["center", "work", "labs", "sports"]);
    assert_eq!(events.try_iter().collect::<Vec<_>>(), vec![EngineEvent::IntroDismissed]);

    // Clicking the center again changes nothing and does not re-announce
    click(&mut engine, "center", 1.0);
    assert!(events.try_iter().next().is_none());

    click(&mut engine, "labs", 1.0);
    assert_eq!(
        visible(&engine),
        vec!["center", "work", "labs", "sports", "arm", "cv"]
    );

    click(&mut engine, "arm", 2.0);
    match events.try_recv() {
        Ok(EngineEvent::LeafActivated { id, content }) => {
            assert_eq!(id, "arm");
            assert_eq!(content.title(), "Lossless gripper");
        }
        other => panic!("expected leaf activation, got {other:?}"),
    }
    assert_eq!(engine.visibility().open_card(), Some("arm"));

    // Second leaf while the card is open is ignored
    assert_eq!(
        engine.activate("cv", 2.1),
        Activation::Ignored(IgnoreReason::CardOpen)
    );
    assert!(events.try_iter().next().is_none());

    assert_eq!(engine.close_card().as_deref(), Some("arm"));
    click(&mut engine, "cv", 2.2);
    assert!(matches!(
        events.try_recv(),
        Ok(EngineEvent::LeafActivated { ref id, .. }) if id == "cv"
    ));

    // Leaves never change the visible set
    assert_eq!(visible(&engine).len(), 6);
}

#[test]
fn collapsing_hides_subtree_and_stops_its_animations() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);
    engine.activate("labs", 1.0);
    assert!(engine.position("arm").is_some());

    engine.activate("labs", 1.1);
    assert!(engine.position("arm").is_none());
    assert_eq!(engine.frame(1.1), FrameDecision::Continue);
    assert_eq!(engine.frame(1.2), FrameDecision::Idle);
}

#[test]
fn animations_run_to_completion_then_idle() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);

    let start = engine.snapshot(0.0);
    let work = start.nodes.iter().find(|n| n.id == "work").unwrap();
    assert_eq!(work.radius, 0.0);
    assert_eq!(start.links[0].opacity, 0.0);

    let mut now = 0.0;
    let mut frames = 0;
    while engine.frame(now).is_continue() {
        now += 1.0 / 60.0;
        frames += 1;
        assert!(frames < 200, "animation never finished");
    }
    let done = engine.snapshot(now);
    let work = done.nodes.iter().find(|n| n.id == "work").unwrap();
    assert_eq!(work.radius, 20.0);
    assert!(done.links.iter().all(|l| l.opacity == 1.0));
}

#[test]
fn new_nodes_cannot_be_hit_until_they_grow() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);
    let work = engine.screen_position("work").unwrap();
    assert_eq!(engine.hit_test(work, 0.0), None);
    assert_eq!(engine.hit_test(work, 1.0).as_deref(), Some("work"));
}

#[test]
fn hovered_node_accepts_clicks_on_its_enlarged_rim() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);
    let work = engine.screen_position("work").unwrap();
    let rim = work + Vec2::new(0.9 * 24.0, 0.0);

    // Outside the resting disc until hovered
    assert_eq!(engine.hit_test(rim, 5.0), None);
    assert_eq!(
        engine.handle_pointer(PointerEvent::Move(work), 5.0),
        InteractionOutcome::HoverChanged(Some("work".into()))
    );
    let drawn = engine.snapshot(5.0);
    let sprite = drawn.nodes.iter().find(|n| n.id == "work").unwrap();
    assert!((sprite.radius - 24.0).abs() < 1e-4);
    assert_eq!(engine.hit_test(rim, 5.0).as_deref(), Some("work"));

    engine.handle_pointer(PointerEvent::Down(rim), 5.0);
    assert_eq!(
        engine.handle_pointer(PointerEvent::Up(rim), 5.0),
        InteractionOutcome::Click("work".into())
    );
    assert!(engine.visibility().is_expanded("work"));
}

#[test]
fn snapshot_carries_labels_glyphs_and_links() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);
    engine.activate("labs", 0.0);

    let snapshot = engine.snapshot(5.0);
    assert_eq!(snapshot.nodes.len(), 6);
    assert_eq!(snapshot.links.len(), 5);
    assert_eq!(snapshot.viewport, Vec2::new(800.0, 600.0));

    let labs = snapshot.nodes.iter().find(|n| n.id == "labs").unwrap();
    assert_eq!(labs.label, "Embodied...");
    assert_eq!(labs.glyph, Some('−'));
    let work = snapshot.nodes.iter().find(|n| n.id == "work").unwrap();
    assert_eq!(work.glyph, Some('+'));
    let center = snapshot.nodes.iter().find(|n| n.id == "center").unwrap();
    assert_eq!(center.glyph, None);
    assert_eq!(center.center, Pos2::new(400.0, 300.0));
}

#[test]
fn dragging_a_node_does_not_activate_it() {
    let (mut engine, events) = radial_engine();
    engine.activate("center", 0.0);
    events.try_iter().for_each(drop);

    let start = engine.screen_position("work").unwrap();
    engine.handle_pointer(PointerEvent::Down(start), 1.0);
    let outcome = engine.handle_pointer(PointerEvent::Move(start + Vec2::new(40.0, 0.0)), 1.0);
    assert!(matches!(outcome, InteractionOutcome::DragStarted { .. }));
    assert_eq!(engine.position("work"), Some(start + Vec2::new(40.0, 0.0)));

    engine.handle_pointer(PointerEvent::Up(start + Vec2::new(40.0, 0.0)), 1.0);
    assert!(!engine.visibility().is_expanded("work"));
    assert!(events.try_iter().next().is_none());
    // Elastic release puts it back on its ring
    assert_eq!(engine.position("work"), Some(start));
}

#[test]
fn overlapping_nodes_resolve_to_the_front_most() {
    let mut config = config(LayoutMode::Radial);
    config.layout.pin_policy = PinPolicy::Sticky;
    let (mut engine, _events) = engine_with(config);
    engine.activate("center", 0.0);

    // Drop "sports" on top of "work"; sports is drawn later
    let work = engine.screen_position("work").unwrap();
    let sports = engine.screen_position("sports").unwrap();
    engine.handle_pointer(PointerEvent::Down(sports), 1.0);
    engine.handle_pointer(PointerEvent::Move(work), 1.0);
    engine.handle_pointer(PointerEvent::Up(work), 1.0);

    assert_eq!(engine.hit_test(work, 1.0).as_deref(), Some("sports"));
}

#[test]
fn pan_moves_everything_on_screen() {
    let (mut engine, _events) = radial_engine();
    // Empty canvas corner
    engine.handle_pointer(PointerEvent::Down(Pos2::new(10.0, 10.0)), 0.0);
    engine.handle_pointer(PointerEvent::Move(Pos2::new(60.0, 30.0)), 0.0);
    engine.handle_pointer(PointerEvent::Up(Pos2::new(60.0, 30.0)), 0.0);

    assert_eq!(engine.pan(), Vec2::new(50.0, 20.0));
    assert_eq!(engine.position("center"), Some(Pos2::new(400.0, 300.0)));
    assert_eq!(engine.screen_position("center"), Some(Pos2::new(450.0, 320.0)));
    assert_eq!(
        engine.hit_test(Pos2::new(450.0, 320.0), 0.0).as_deref(),
        Some("center")
    );

    engine.reset_view();
    assert_eq!(engine.pan(), Vec2::ZERO);
}

#[test]
fn resize_recenters_and_rejects_empty_surface() {
    let (mut engine, _events) = radial_engine();
    assert!(matches!(
        engine.resize(Vec2::new(0.0, 300.0)),
        Err(EngineError::SurfaceUnavailable { .. })
    ));
    engine.resize(Vec2::new(1000.0, 400.0)).unwrap();
    assert_eq!(engine.position("center"), Some(Pos2::new(500.0, 200.0)));
}

#[test]
fn force_mode_settles_and_reports_it() {
    let (mut engine, events) = engine_with(config(LayoutMode::Force));
    engine.activate("center", 0.0);
    engine.activate("labs", 0.0);

    let mut now = 0.0;
    let mut frames = 0;
    while engine.frame(now).is_continue() {
        now += 1.0 / 60.0;
        frames += 1;
        assert!(frames < 5000, "force layout never settled");
    }
    assert!(engine.layout().is_settled());
    let events: Vec<_> = events.try_iter().collect();
    assert!(events.contains(&EngineEvent::LayoutSettled));

    // Switching modes wakes the loop again
    engine.set_layout_mode(LayoutMode::Radial);
    assert_eq!(engine.frame(now), FrameDecision::Continue);
    assert_eq!(engine.frame(now), FrameDecision::Idle);
}

#[test]
fn rendered_frame_draws_model_order_over_links() {
    let (mut engine, _events) = radial_engine();
    engine.activate("center", 0.0);

    let mut recorder = RecordingRenderer::default();
    render_frame(&engine.snapshot(1.0), &mut recorder);

    let calls = &recorder.calls;
    assert_eq!(calls[0], "clear 800x600");
    assert!(calls[1..4].iter().all(|c| c.starts_with("link")));
    assert_eq!(&calls[4..], &["node center", "node work", "node labs", "node sports"]);
}
