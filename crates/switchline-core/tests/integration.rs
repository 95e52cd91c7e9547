//! Session-level scenarios: draw paths, run the simulation, check outcomes.

use switchline_core::agent::AgentState;
use switchline_core::authoring::{AuthoringError, ExtendOutcome, ExtensionPolicy};
use switchline_core::color::Color;
use switchline_core::event::EventKind;
use switchline_core::fixed::Fixed64;
use switchline_core::id::AgentId;
use switchline_core::session::PuzzleSession;
use switchline_core::sim::{FailureReason, RunOutcome, RunPhase};
use switchline_core::test_utils::*;

// ===========================================================================
// Scoring
// ===========================================================================

#[test]
fn straight_cyan_run_earns_three_stars() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Cyan)
        .station("s", 4, 2, Color::Cyan)
        .par(5)
        .undo_bonus(0)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    assert_eq!(session.total_path_length(), 5);

    session.start().unwrap();
    let completion = run_to_completion(&mut session, 16, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
    assert_eq!(completion.total_path_length, 5);
    assert_eq!(completion.undo_count, 0);

    let score = session.score().unwrap();
    assert_eq!(score.efficiency_ratio, Fixed64::ONE);
    assert!(score.score >= Fixed64::from_num(80));
    assert_eq!(score.stars, 3);
}

#[test]
fn assisted_draw_matches_manual_draw() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Cyan)
        .station("s", 4, 2, Color::Cyan)
        .par(5)
        .build();
    let outlet = level.outlet_by_name("o").unwrap();
    let mut session = PuzzleSession::with_defaults(level);
    session.start_path(outlet).unwrap();
    let outcome = session
        .extend(outlet, pos(4, 2), ExtensionPolicy::Assisted)
        .unwrap();
    assert!(matches!(outcome, ExtendOutcome::Finalized { added: 4, .. }));
    assert_eq!(session.total_path_length(), 5);
    assert_eq!(
        session.extend(outlet, pos(3, 3), ExtensionPolicy::Assisted),
        Err(AuthoringError::PathFinalized)
    );
}

#[test]
fn undos_beyond_bonus_cost_points() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Cyan)
        .station("s", 4, 2, Color::Cyan)
        .par(5)
        .undo_bonus(1)
        .build();
    let outlet = level.outlet_by_name("o").unwrap();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (1, 3)]);
    session.undo().unwrap();
    session.undo().unwrap();
    session.undo().unwrap();
    assert!(session.path(outlet).is_none());
    assert_eq!(session.undo_count(), 3);

    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    session.start().unwrap();
    run_to_completion(&mut session, 50, 1000).unwrap();
    let score = session.score().unwrap();
    assert_eq!(score.undo_penalty, 2);
    assert_eq!(score.score, Fixed64::from_num(60));
    assert_eq!(score.stars, 2);
}

// ===========================================================================
// Interactions
// ===========================================================================

#[test]
fn converging_paths_merge_into_purple() {
    // Red runs straight east along row 1; blue climbs column 3 and turns
    // east onto (3, 1). Red starts late so both reach (3, 1) together.
    let level = LevelBuilder::new(6)
        .outlet_with("red", 0, 1, Color::Red, 1, 1000, 750)
        .outlet("blue", 0, 4, Color::Blue)
        .station("purple", 4, 1, Color::Purple)
        .par(13)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "red", &[(0, 1), (1, 1), (2, 1), (3, 1), (4, 1)]);
    draw_path(
        &mut session,
        "blue",
        &[(0, 4), (1, 4), (2, 4), (3, 4), (3, 3), (3, 2), (3, 1), (4, 1)],
    );
    assert_eq!(session.junctions().len(), 2);

    session.start().unwrap();
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);

    let sim = session.simulation().unwrap();
    let red = sim.agent(AgentId(0)).unwrap();
    let blue = sim.agent(AgentId(1)).unwrap();
    assert_eq!(red.color, Color::Purple);
    assert_eq!(red.state, AgentState::Succeeded);
    assert_eq!(blue.state, AgentState::Merged);
    assert_eq!(session.event_bus.total_emitted(EventKind::Merge), 1);
}

#[test]
fn head_on_agents_crash() {
    let level = LevelBuilder::new(5)
        .outlet("a", 0, 2, Color::Red)
        .outlet("b", 4, 2, Color::Blue)
        .station("sa", 3, 3, Color::Red)
        .station("sb", 1, 1, Color::Blue)
        .par(10)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "a", &[(0, 2), (1, 2), (2, 2), (3, 2), (3, 3)]);
    draw_path(&mut session, "b", &[(4, 2), (3, 2), (2, 2), (1, 2), (1, 1)]);

    session.start().unwrap();
    let completion = run_to_completion(&mut session, 16, 1000).unwrap();
    assert!(matches!(
        completion.outcome,
        RunOutcome::Failure(FailureReason::Crash { position, .. }) if position == pos(2, 2)
    ));
    let agents = session.agent_snapshots();
    assert!(agents.iter().all(|a| a.state == AgentState::Crashed));
    assert!(agents.iter().all(|a| a.position == pos(2, 2)));
    assert_eq!(session.event_bus.total_emitted(EventKind::Crash), 1);
    assert!(session.score().is_none());
}

#[test]
fn crashed_run_freezes_during_grace_period() {
    let level = LevelBuilder::new(5)
        .outlet("a", 0, 2, Color::Red)
        .outlet("b", 4, 2, Color::Blue)
        .station("sa", 3, 3, Color::Red)
        .station("sb", 1, 1, Color::Blue)
        .par(10)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "a", &[(0, 2), (1, 2), (2, 2), (3, 2), (3, 3)]);
    draw_path(&mut session, "b", &[(4, 2), (3, 2), (2, 2), (1, 2), (1, 1)]);
    session.start().unwrap();
    for _ in 0..10 {
        session.tick(50).unwrap();
    }
    assert!(matches!(session.phase(), Some(RunPhase::Ending { .. })));
    let before = session.state_hash();
    session.tick(100).unwrap();
    assert_eq!(session.state_hash(), before);
    assert!(session.is_running());
}

#[test]
fn turn_into_oncoming_agent_crashes() {
    // `a` turns north at (2, 2) straight into `b` running south.
    let level = LevelBuilder::new(5)
        .outlet("a", 0, 2, Color::Red)
        .outlet("b", 2, 0, Color::Blue)
        .station("sa", 3, 1, Color::Red)
        .station("sb", 2, 4, Color::Blue)
        .par(10)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "a", &[(0, 2), (1, 2), (2, 2), (2, 1), (3, 1)]);
    draw_path(&mut session, "b", &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]);

    session.start().unwrap();
    let completion = run_to_completion(&mut session, 16, 1000).unwrap();
    assert!(matches!(
        completion.outcome,
        RunOutcome::Failure(FailureReason::Crash { position, .. }) if position == pos(2, 2)
    ));
    let agents = session.agent_snapshots();
    assert!(agents.iter().all(|a| a.state == AgentState::Crashed));
    assert_eq!(session.event_bus.total_emitted(EventKind::Merge), 0);
}

#[test]
fn perpendicular_cross_without_mix_keeps_colors() {
    let level = LevelBuilder::new(5)
        .outlet("red", 0, 2, Color::Red)
        .outlet("green", 2, 0, Color::Green)
        .station("sr", 4, 2, Color::Red)
        .station("sg", 2, 4, Color::Green)
        .par(10)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "red", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    draw_path(&mut session, "green", &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]);
    session.start().unwrap();

    // Both sit on (2, 2) between 500 and 750 ms.
    for _ in 0..12 {
        session.tick(50).unwrap();
    }
    let agents = session.agent_snapshots();
    assert!(agents.iter().all(|a| a.position == pos(2, 2)));
    assert!(agents.iter().all(|a| a.state == AgentState::Active));
    assert_eq!(agents[0].color, Color::Red);
    assert_eq!(agents[1].color, Color::Green);
    assert_eq!(session.event_bus.total_emitted(EventKind::Cross), 1);

    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
}

#[test]
fn perpendicular_cross_mixes_mapped_colors() {
    let level = LevelBuilder::new(5)
        .outlet("red", 0, 2, Color::Red)
        .outlet("blue", 2, 0, Color::Blue)
        .station("s1", 4, 2, Color::Purple)
        .station("s2", 2, 4, Color::Purple)
        .par(10)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "red", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    draw_path(&mut session, "blue", &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]);
    session.start().unwrap();
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
    assert!(
        session
            .agent_snapshots()
            .iter()
            .all(|a| a.color == Color::Purple)
    );
}

#[test]
fn color_changer_fixes_mismatched_delivery() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 0, Color::Red)
        .color_changer(2, 0, Color::Yellow)
        .station("s", 4, 0, Color::Yellow)
        .par(5)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    session.start().unwrap();
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
}

// ===========================================================================
// Stations
// ===========================================================================

#[test]
fn underfilled_station_fails_run() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Red)
        .station_requiring("s", 4, 2, Color::Red, 2)
        .par(5)
        .build();
    let station = level.station_by_name("s").unwrap();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    session.start().unwrap();
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(
        completion.outcome,
        RunOutcome::Failure(FailureReason::StationUnderfilled {
            station,
            arrived: 1,
            required: 2,
        })
    );
}

#[test]
fn multi_agent_outlet_fills_station() {
    let level = LevelBuilder::new(5)
        .outlet_with("o", 0, 2, Color::Red, 2, 400, 0)
        .station_requiring("s", 4, 2, Color::Red, 2)
        .par(5)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    session.start().unwrap();

    // The second agent is still on its way when the first arrives.
    for _ in 0..20 {
        assert_eq!(session.tick(50).unwrap(), None);
    }
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
    assert_eq!(session.station_snapshots()[0].arrived, 2);
}

#[test]
fn extra_arrivals_over_count() {
    let level = LevelBuilder::new(5)
        .outlet_with("o", 0, 2, Color::Red, 3, 300, 0)
        .station_requiring("s", 4, 2, Color::Red, 2)
        .par(5)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    session.start().unwrap();
    let completion = run_to_completion(&mut session, 50, 1000).unwrap();
    assert_eq!(completion.outcome, RunOutcome::Success);
    let station = &session.station_snapshots()[0];
    assert_eq!(station.arrived, 3);
    assert!(station.is_satisfied());
}

// ===========================================================================
// Lifecycle
// ===========================================================================

#[test]
fn stop_keeps_paths_and_allows_rerun() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Cyan)
        .station("s", 4, 2, Color::Cyan)
        .par(5)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    let authored = session.state_hash();

    session.start().unwrap();
    session.tick(300).unwrap();
    session.stop();
    assert_eq!(session.state_hash(), authored);
    assert!(session.agent_snapshots().is_empty());

    session.start().unwrap();
    assert!(run_to_completion(&mut session, 100, 100).is_some());
    // A finished run may be restarted without stopping.
    session.start().unwrap();
    assert!(session.completion().is_none());
}

#[test]
fn speed_multiplier_shortens_run() {
    let level = LevelBuilder::new(5)
        .outlet("o", 0, 2, Color::Cyan)
        .station("s", 4, 2, Color::Cyan)
        .par(5)
        .build();
    let mut session = PuzzleSession::with_defaults(level);
    draw_path(&mut session, "o", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
    session.set_speed(4.0);
    session.start().unwrap();
    // 1000 simulated ms at 4x is 250 wall-clock ms.
    assert!(run_to_completion(&mut session, 50, 5).is_some());
}
