use cinder_render::HeadlessTarget;
use cinder_runtime::demo::{self, DemoScene, DemoWorld};
use cinder_runtime::{Engine, EngineError, Subsystem};
use cinder_services::input::{GamePaused, ViewZoom};
use cinder_services::Settings;
use std::cell::RefCell;
use std::rc::Rc;

type DemoEngine = Engine<DemoWorld, HeadlessTarget>;

/// Half-second frames and a 4 Hz physics rate keep every step exact.
fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.engine.use_wall_time = false;
    settings.engine.fixed_frame_time = 0.5;
    settings.engine.limit_cpu_usage = false;
    settings.engine.event_budget_ms = None;
    settings.physics.step_rate_hz = 4;
    settings
}

fn demo_engine(settings: &Settings) -> (DemoEngine, DemoScene) {
    let mut engine = Engine::new(settings, DemoWorld::default(), HeadlessTarget::new());
    let scene = demo::build_scene(&mut engine).unwrap();
    (engine, scene)
}

#[test]
fn tick_drives_every_subsystem() {
    let (mut engine, scene) = demo_engine(&settings());

    engine.tick(0.5).unwrap();

    assert_eq!(engine.stats().events_dispatched(), scene.entities.len());
    assert_eq!(engine.physics().world().steps(), 2);
    assert_eq!(engine.target().frames(), 1);
    assert_eq!(engine.target().draws_this_frame(), scene.entities.len());
    assert_eq!(engine.render().tracked().len(), scene.entities.len());
}

#[test]
fn run_counts_frames() {
    let (mut engine, scene) = demo_engine(&settings());

    let ran = engine.run(Some(3)).unwrap();

    assert_eq!(ran, 3);
    assert_eq!(engine.stats().frames(), 3);
    assert_eq!(engine.target().frames(), 3);
    assert_eq!(engine.target().total_draws(), 3 * scene.entities.len() as u64);
    assert_eq!(engine.physics().world().steps(), 6);
}

#[test]
fn stop_ends_run_early() {
    let (mut engine, _) = demo_engine(&settings());
    engine.stop();

    assert_eq!(engine.run(Some(10)).unwrap(), 0);
    assert!(engine.is_stopped());
}

#[test]
fn process_chain_runs_to_completion() {
    let (mut engine, scene) = demo_engine(&settings());
    let (head, tail) = scene.chain;
    assert_eq!(engine.processes().processes(), &[head]);

    // warm-up, announce, two cool-down frames, finish
    engine.run(Some(5)).unwrap();
    assert!(engine.processes().is_empty());

    // retired on the following update
    engine.tick(0.5).unwrap();
    assert!(!engine.processes().arena().contains(tail));
    assert!(engine.processes().arena().is_empty());
}

#[test]
fn start_paused_freezes_simulation() {
    let mut settings = settings();
    settings.engine.start_paused = true;
    let (mut engine, scene) = demo_engine(&settings);
    assert!(engine.is_paused());

    engine.run(Some(2)).unwrap();

    assert_eq!(engine.physics().world().steps(), 0);
    assert_eq!(engine.target().frames(), 0);
    assert_eq!(engine.processes().processes(), &[scene.chain.0]);
}

#[test]
fn events_are_delivered_while_paused() {
    let mut settings = settings();
    settings.engine.start_paused = true;
    let (mut engine, _) = demo_engine(&settings);
    engine.tick(0.5).unwrap();

    let zooms = Rc::new(RefCell::new(Vec::new()));
    let sink = zooms.clone();
    engine
        .events_mut()
        .add_listener::<ViewZoom, _>(move |zoom, _| sink.borrow_mut().push(zoom.delta));
    engine.events_mut().queue_event(ViewZoom { delta: 3 });
    engine.tick(0.5).unwrap();

    assert!(engine.is_paused());
    assert_eq!(*zooms.borrow(), vec![3]);
    assert_eq!(engine.stats().events_dispatched(), 1);
    assert_eq!(engine.events().pending_count(), 0);
}

#[test]
fn unusable_event_budget_does_not_stop_the_tick() {
    let mut settings = settings();
    settings.engine.event_budget_ms = Some(f32::INFINITY);
    let (mut engine, scene) = demo_engine(&settings);

    engine.tick(0.5).unwrap();

    assert_eq!(engine.stats().events_dispatched(), scene.entities.len());
}

#[test]
fn pause_changes_are_announced_once() {
    let (mut engine, _) = demo_engine(&settings());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    engine
        .events_mut()
        .add_listener::<GamePaused, _>(move |event, _| sink.borrow_mut().push(event.paused));

    engine.set_paused(true);
    engine.set_paused(true);
    engine.set_paused(false);

    assert_eq!(*seen.borrow(), vec![true, false]);
    assert!(!engine.is_paused());
}

#[test]
fn game_paused_event_flips_engine_state() {
    let (mut engine, _) = demo_engine(&settings());

    engine.events_mut().queue_event(GamePaused { paused: true });
    engine.tick(0.5).unwrap();

    assert!(engine.is_paused());
    assert!(engine.physics().is_paused());
    assert!(engine.processes().is_paused());
    assert!(engine.entities().is_paused());
    assert!(engine.render().is_paused());
    assert_eq!(engine.physics().world().steps(), 0);

    engine.events_mut().queue_event(GamePaused { paused: false });
    engine.tick(0.5).unwrap();

    assert!(!engine.is_paused());
    assert_eq!(engine.physics().world().steps(), 2);
}

#[test]
fn zero_event_budget_defers_everything() {
    let mut settings = settings();
    settings.engine.event_budget_ms = Some(0.0);
    let (mut engine, scene) = demo_engine(&settings);

    engine.tick(0.5).unwrap();

    assert_eq!(engine.stats().events_dispatched(), 0);
    assert_eq!(engine.stats().events_deferred(), scene.entities.len());
    assert_eq!(engine.events().pending_count(), scene.entities.len());
    assert!(engine.render().tracked().is_empty());
}

#[test]
fn destroyed_entities_stop_drawing() {
    let (mut engine, scene) = demo_engine(&settings());
    engine.tick(0.5).unwrap();

    assert!(engine.destroy_entity(scene.entities[0]));
    engine.tick(0.5).unwrap();

    assert_eq!(engine.target().draws_this_frame(), scene.entities.len() - 1);
    assert_eq!(engine.entities().len(), scene.entities.len() - 1);
}

#[test]
fn shutdown_releases_everything() {
    let (mut engine, _) = demo_engine(&settings());
    engine.tick(0.5).unwrap();

    engine.shutdown();
    engine.shutdown();

    assert!(engine.entities().is_empty());
    assert!(engine.processes().is_empty());
    assert!(engine.render().tracked().is_empty());
    assert_eq!(engine.events().listener_count::<GamePaused>(), 0);
    assert!(matches!(engine.tick(0.5), Err(EngineError::ShutDown)));
}

#[test]
fn subsystem_timings_are_recorded() {
    let (mut engine, _) = demo_engine(&settings());

    engine.tick(0.5).unwrap();

    let total: std::time::Duration = Subsystem::ALL
        .iter()
        .map(|&subsystem| engine.stats().subsystem_time(subsystem))
        .sum();
    assert!(total > std::time::Duration::ZERO);
}
