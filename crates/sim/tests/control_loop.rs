//! End-to-end tests of the sense, fit, plan, act loop.

use std::sync::Arc;
use std::thread;

use plume_core::{DVec2, SimConfig, Surrogate};
use plume_sim::{SessionRegistry, SimStatus, Simulation, StepOutcome};

fn small_config(seed: u64) -> SimConfig {
    SimConfig {
        resolution: 40,
        ..SimConfig::seeded(seed)
    }
}

#[test]
fn full_run_ends_depleted_within_energy_bounds() {
    let mut sim = Simulation::new(small_config(1)).unwrap();
    let report = sim.run(5000);
    assert!(report.is_depleted());
    let summaries = &report.summaries;

    // Each tick costs between the hotel load (1.0) and the full-speed cost (1.4).
    assert!(
        (715..=1000).contains(&summaries.len()),
        "depleted after {} steps",
        summaries.len()
    );
    assert_eq!(summaries.last().map(|s| s.energy), Some(0.0));
    assert!(summaries.windows(2).all(|w| w[1].energy <= w[0].energy));
    assert!(summaries.iter().enumerate().all(|(i, s)| s.step == i as u64 + 1));
    assert_eq!(sim.status(), SimStatus::Depleted);

    let drained = sim.run(10);
    assert!(drained.is_empty());
    assert!(drained.is_depleted());
    assert!(matches!(sim.step(), StepOutcome::Depleted { .. }));
}

#[test]
fn run_stops_early_on_small_budget() {
    let config = SimConfig {
        energy_capacity: 5.0,
        ..small_config(2)
    };
    let mut sim = Simulation::new(config).unwrap();
    let report = sim.run(100);
    assert!(!report.is_empty() && report.len() <= 5);
    assert!(report.is_depleted());
    assert_eq!(report.last().map(|s| s.energy), Some(0.0));
    assert_eq!(sim.time_step(), report.len() as u64);
}

#[test]
fn reset_clears_samples_but_keeps_field() {
    let mut sim = Simulation::new(small_config(3)).unwrap();
    sim.run(6);
    assert!(sim.estimator().is_fitted());
    let extent = sim.generator().domain().extent();
    let source = sim.generator().source();

    sim.reset(Some(DVec2::new(80.0, 10.0)));
    assert_eq!(sim.time_step(), 0);
    assert_eq!(sim.state().sample_count, 0);

    sim.run(2);
    assert!(!sim.estimator().is_fitted());
    sim.run(1);
    assert!(sim.estimator().is_fitted());

    assert_eq!(sim.generator().domain().extent(), extent);
    assert_eq!(sim.generator().source(), source);
}

#[test]
fn reset_revives_depleted_vehicle() {
    let config = SimConfig {
        energy_capacity: 3.0,
        ..small_config(4)
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.run(50);
    assert_eq!(sim.status(), SimStatus::Depleted);
    sim.reset(None);
    assert_eq!(sim.status(), SimStatus::Active);
    assert_eq!(sim.state().position, DVec2::new(20.0, 20.0));
    assert!(sim.step().report().is_some());
}

#[test]
fn seeded_sessions_replay_across_resets() {
    let drive = || {
        let mut sim = Simulation::new(small_config(5)).unwrap();
        sim.run(4);
        sim.reset(None);
        sim.run(4);
        sim.state()
    };
    assert_eq!(drive(), drive());
}

#[test]
fn state_reports_full_history() {
    let mut sim = Simulation::new(small_config(6)).unwrap();
    sim.run(3);
    sim.set_position(5.0, 5.0);
    let state = sim.state();
    assert_eq!(state.trajectory.len(), 5);
    assert_eq!(state.energy_history.len(), 4);
    assert_eq!(state.position, DVec2::new(5.0, 5.0));
    assert_eq!(state.sample_count, 3);
    assert!(state.operational);
}

#[test]
fn state_serializes_to_json() {
    let mut sim = Simulation::new(small_config(7)).unwrap();
    sim.step();
    let value = serde_json::to_value(sim.state()).unwrap();
    assert_eq!(value["time_step"], 1);
    assert_eq!(value["status"], "active");
    assert_eq!(value["trajectory"].as_array().map(Vec::len), Some(2));
}

#[test]
fn vehicle_leaving_domain_keeps_sampling_boundary() {
    let mut sim = Simulation::new(small_config(8)).unwrap();
    sim.set_position(500.0, -500.0);
    let outcome = sim.step();
    let report = outcome.report().unwrap();
    assert!(report.concentration >= 0.0);
    assert_eq!(sim.state().sample_count, 1);
}

#[test]
fn concurrent_sessions_progress_independently() {
    let registry = Arc::new(SessionRegistry::new(small_config(9)).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let id = registry
                    .create(Some(DVec2::new(10.0 * i as f64, 20.0)))
                    .unwrap();
                registry.with_session(id, |s| s.run(5 + i)).unwrap();
                id
            })
        })
        .collect();
    let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 4);
    for (i, id) in ids.into_iter().enumerate() {
        let t = registry.with_session(id, |s| s.time_step()).unwrap();
        assert_eq!(t, 5 + i as u64);
    }
}
