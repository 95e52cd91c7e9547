//! Switchline Data -- loads puzzle levels and session configuration from
//! RON, TOML or JSON files.

pub mod loader;
pub mod puzzle;

pub use loader::{DataLoadError, Format};
pub use puzzle::{PuzzleData, load_level, load_level_str, load_puzzle, load_session_config};
