use std::sync::Arc;
use std::time::{Duration, Instant};

use glowgrid_app::{Ticker, shared_world};
use glowgrid_core::{GridConfig, Tick, World};

fn small_world() -> glowgrid_app::SharedWorld {
    let config = GridConfig {
        grid_width: 4,
        grid_height: 4,
        rng_seed: Some(1),
        ..GridConfig::default()
    };
    shared_world(World::new(config).expect("world"))
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn ticker_starts_paused() {
    let world = small_world();
    let ticker = Ticker::spawn(Arc::clone(&world), 0, 100);
    assert!(ticker.is_paused());
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(ticker.steps(), 0);
    assert_eq!(world.lock().unwrap().tick(), Tick::zero());
    ticker.stop();
}

#[test]
fn resumed_ticker_spends_its_step_budget() {
    let world = small_world();
    let ticker = Ticker::spawn(Arc::clone(&world), 0, 50);
    ticker.resume();
    assert!(
        wait_until(Duration::from_secs(10), || ticker.is_stopped()),
        "ticker should finish its budget"
    );
    assert_eq!(ticker.steps(), 50);
    assert_eq!(world.lock().unwrap().tick(), Tick(50));
}

#[test]
fn pause_takes_effect_on_the_next_boundary() {
    let world = small_world();
    let ticker = Ticker::spawn(Arc::clone(&world), 1, u64::MAX);
    ticker.toggle_pause();
    assert!(!ticker.is_paused());
    assert!(
        wait_until(Duration::from_secs(10), || ticker.steps() >= 5),
        "ticker should make progress while running"
    );
    ticker.pause();
    // One in-flight tick may still land after the pause.
    std::thread::sleep(Duration::from_millis(20));
    let frozen = ticker.steps();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ticker.steps(), frozen);

    ticker.set_delay(0);
    ticker.reset_steps();
    assert_eq!(ticker.steps(), 0);
    ticker.stop();
}

#[test]
fn readers_share_the_world_between_ticks() {
    let world = small_world();
    let ticker = Ticker::spawn(Arc::clone(&world), 0, 200);
    ticker.resume();
    // Interleave snapshot reads and sensor injection with the tick thread.
    for _ in 0..20 {
        {
            let mut guard = world.lock().unwrap();
            guard.inject_sensor_event(1, 1, glowgrid_core::SensorKind::Touch, 1);
            let snapshot = guard.snapshot(1, 1).expect("snapshot");
            assert!(snapshot.energy >= 0.0);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(wait_until(Duration::from_secs(10), || ticker.is_stopped()));
    assert_eq!(world.lock().unwrap().tick(), Tick(200));
}
