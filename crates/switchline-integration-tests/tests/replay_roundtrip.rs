//! Replays recorded against a file-loaded puzzle reproduce the same run.

use switchline_core::authoring::ExtensionPolicy;
use switchline_core::replay::{ReplayCommand, ReplayError, ReplayLog, apply_command, play};
use switchline_core::session::PuzzleSession;
use switchline_core::sim::{FailureReason, RunOutcome};
use switchline_data::{Format, load_level_str};

const CROSSING_JSON: &str = r#"{
    "size": 5,
    "outlets": [
        {"id": "a", "x": 0, "y": 2, "color": "red"},
        {"id": "b", "x": 4, "y": 2, "color": "blue"},
        {"id": "c", "x": 2, "y": 0, "color": "yellow", "count": 2, "delay": 600}
    ],
    "stations": [
        {"id": "sa", "x": 3, "y": 3, "color": "red"},
        {"id": "sb", "x": 1, "y": 1, "color": "blue"},
        {"id": "sc", "x": 2, "y": 4, "color": "yellow", "required": 2}
    ],
    "par": 15
}"#;

fn extend(outlet: &str, x: i32, y: i32) -> ReplayCommand {
    ReplayCommand::Extend {
        outlet: outlet.into(),
        x,
        y,
        policy: ExtensionPolicy::Manual,
    }
}

fn record(commands: Vec<ReplayCommand>) -> (PuzzleSession, ReplayLog) {
    let level = load_level_str(CROSSING_JSON, Format::Json).unwrap();
    let mut session = PuzzleSession::with_defaults(level);
    let mut log = ReplayLog::new(&session);
    for cmd in commands {
        apply_command(&mut session, &cmd).unwrap();
        log.record_with_hash(cmd, session.state_hash());
    }
    (session, log)
}

/// `a` and `b` meet head-on at (2, 2); `c` runs down column 2.
fn crash_script() -> Vec<ReplayCommand> {
    let mut cmds = vec![ReplayCommand::StartPath { outlet: "a".into() }];
    cmds.extend([(1, 2), (2, 2), (3, 2), (3, 3)].map(|(x, y)| extend("a", x, y)));
    cmds.push(ReplayCommand::StartPath { outlet: "b".into() });
    cmds.extend([(3, 2), (2, 2), (1, 2), (1, 1)].map(|(x, y)| extend("b", x, y)));
    cmds.push(ReplayCommand::StartPath { outlet: "c".into() });
    cmds.extend([(2, 1), (2, 2), (2, 3), (2, 4)].map(|(x, y)| extend("c", x, y)));
    cmds.push(ReplayCommand::ToggleJunction { x: 2, y: 2 });
    cmds.push(ReplayCommand::SetSpeed { speed: 2.0 });
    cmds.push(ReplayCommand::Start);
    cmds.extend((0..120).map(|_| ReplayCommand::Tick { elapsed_ms: 16 }));
    cmds
}

#[test]
fn recorded_crash_replays_from_bytes() {
    let (session, log) = record(crash_script());
    let completion = session.completion().unwrap();
    assert!(matches!(
        completion.outcome,
        RunOutcome::Failure(FailureReason::Crash { .. })
    ));

    let bytes = log.to_bytes().unwrap();
    let restored = ReplayLog::from_bytes(&bytes).unwrap();
    let replayed = play(&restored).unwrap();
    assert_eq!(replayed.state_hash(), session.state_hash());
    assert_eq!(replayed.completion(), Some(completion));
}

#[test]
fn tampered_log_fails_verification() {
    let (_, mut log) = record(crash_script());
    // Swap the solution for `a` so the recorded hashes no longer hold.
    log.commands[2] = extend("a", 1, 3);

    assert!(matches!(
        play(&log),
        Err(ReplayError::HashMismatch { command_index: 2, .. })
    ));
}
