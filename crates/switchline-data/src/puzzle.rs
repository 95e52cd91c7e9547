//! Loading pipeline: level definitions and session configuration from disk.
//!
//! A puzzle directory holds a required `level.{ron,toml,json}` and an
//! optional `config.{ron,toml,json}`. Missing config fields take their
//! defaults.

use crate::loader::{DataLoadError, Format, deserialize_file, deserialize_str, find_data_file, require_data_file};
use std::path::Path;
use switchline_core::config::SessionConfig;
use switchline_core::level::{Level, LevelDef};
use switchline_core::session::PuzzleSession;
use tracing::debug;

/// Everything needed to open a session on one puzzle.
#[derive(Debug, Clone)]
pub struct PuzzleData {
    pub level: Level,
    pub config: SessionConfig,
}

impl PuzzleData {
    pub fn into_session(self) -> PuzzleSession {
        PuzzleSession::new(self.level, self.config)
    }
}

fn validate(def: LevelDef, origin: &Path) -> Result<Level, DataLoadError> {
    Level::from_def(def).map_err(|source| DataLoadError::InvalidLevel {
        file: origin.to_path_buf(),
        source,
    })
}

/// Load and validate a level file.
pub fn load_level(path: &Path) -> Result<Level, DataLoadError> {
    let def: LevelDef = deserialize_file(path)?;
    let level = validate(def, path)?;
    debug!(
        path = %path.display(),
        size = level.size(),
        outlets = level.outlet_count(),
        "level loaded"
    );
    Ok(level)
}

/// Parse and validate a level held in memory, e.g. from a level catalog.
pub fn load_level_str(content: &str, format: Format) -> Result<Level, DataLoadError> {
    let origin = Path::new("<memory>");
    let def: LevelDef = deserialize_str(content, format, origin)?;
    validate(def, origin)
}

pub fn load_session_config(path: &Path) -> Result<SessionConfig, DataLoadError> {
    deserialize_file(path)
}

/// Load a puzzle directory.
pub fn load_puzzle(dir: &Path) -> Result<PuzzleData, DataLoadError> {
    let level = load_level(&require_data_file(dir, "level")?)?;
    let config = match find_data_file(dir, "config")? {
        Some(path) => load_session_config(&path)?,
        None => SessionConfig::default(),
    };
    Ok(PuzzleData { level, config })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use switchline_core::authoring::ExtensionPolicy;
    use switchline_core::color::Color;
    use switchline_core::level::LevelError;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "switchline_puzzle_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const LEVEL_TOML: &str = r#"
size = 5
par = 5
undo_bonus = 1

[[obstacles]]
x = 2
y = 0

[[outlets]]
id = "o"
x = 0
y = 2
color = "cyan"
count = 2

[[stations]]
id = "s"
x = 4
y = 2
color = "cyan"
required = 2
"#;

    #[test]
    fn load_level_toml() {
        let level = load_level_str(LEVEL_TOML, Format::Toml).unwrap();
        assert_eq!(level.size(), 5);
        assert_eq!(level.undo_bonus(), 1);
        let outlet = level.outlet(level.outlet_by_name("o").unwrap()).unwrap();
        assert_eq!(outlet.color, Color::Cyan);
        assert_eq!(outlet.count, 2);
        assert_eq!(outlet.delay, 1000);
        assert!(level.is_obstacle(switchline_core::grid::GridPosition::new(2, 0)));
    }

    #[test]
    fn load_level_ron() {
        let ron = r#"(
            size: 3,
            outlets: [(id: "o", x: 0, y: 0, color: red)],
            stations: [(id: "s", x: 2, y: 0, color: red)],
            par: 3,
        )"#;
        let level = load_level_str(ron, Format::Ron).unwrap();
        assert_eq!(level.outlet_count(), 1);
        assert_eq!(level.undo_bonus(), 0);
    }

    #[test]
    fn invalid_level_is_reported() {
        let json = r#"{"size": 3, "par": 1,
            "outlets": [{"id": "o", "x": 5, "y": 0, "color": "red"}]}"#;
        match load_level_str(json, Format::Json) {
            Err(DataLoadError::InvalidLevel { source, .. }) => {
                assert!(matches!(source, LevelError::OutOfBounds { .. }));
            }
            other => panic!("expected invalid level, got {other:?}"),
        }
    }

    #[test]
    fn load_puzzle_dir_with_config() {
        let dir = make_test_dir("with_config");
        fs::write(dir.join("level.toml"), LEVEL_TOML).unwrap();
        fs::write(
            dir.join("config.json"),
            r#"{"undo_depth": 8, "default_policy": "manual", "sim": {"ms_per_cell": 100}}"#,
        )
        .unwrap();

        let data = load_puzzle(&dir).unwrap();
        assert_eq!(data.config.undo_depth, 8);
        assert_eq!(data.config.default_policy, ExtensionPolicy::Manual);
        assert_eq!(data.config.sim.ms_per_cell, 100);
        assert_eq!(data.config.sim.crash_grace_ms, 1000);

        let session = data.into_session();
        assert_eq!(session.config().undo_depth, 8);

        cleanup(&dir);
    }

    #[test]
    fn load_puzzle_dir_defaults_config() {
        let dir = make_test_dir("no_config");
        fs::write(dir.join("level.toml"), LEVEL_TOML).unwrap();
        let data = load_puzzle(&dir).unwrap();
        assert_eq!(data.config, SessionConfig::default());
        cleanup(&dir);
    }

    #[test]
    fn load_puzzle_requires_level() {
        let dir = make_test_dir("no_level");
        assert!(matches!(
            load_puzzle(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }
}
