//! File-level plumbing for puzzle data: which format a file is in, where a
//! puzzle's `level`/`config` file lives, and how its text becomes a value.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use switchline_core::level::LevelError;

// ===========================================================================
// Errors
// ===========================================================================

/// Why a puzzle file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No `{file}.ron|toml|json` exists in the puzzle directory.
    #[error("{dir} has no '{file}' file")]
    MissingRequired { file: String, dir: PathBuf },

    /// Not a `.ron`, `.toml` or `.json` file.
    #[error("{file} is not a RON, TOML or JSON file")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in two formats; neither wins.
    #[error("ambiguous puzzle file: both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The level parsed but failed validation.
    #[error("invalid level in {file}: {source}")]
    InvalidLevel {
        file: PathBuf,
        #[source]
        source: LevelError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// On-disk encodings a puzzle file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when resolving a base name.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    fn from_extension(ext: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// The format implied by a file's extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Resolve `{base_name}.{ron,toml,json}` inside `dir`.
///
/// `Ok(None)` when none exists; [`DataLoadError::ConflictingFormats`] when
/// more than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|candidate| candidate.exists());

    let Some(first) = present.next() else {
        return Ok(None);
    };
    if let Some(second) = present.next() {
        return Err(DataLoadError::ConflictingFormats { a: first, b: second });
    }
    Ok(Some(first))
}

/// [`find_data_file`] for files a puzzle cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    match find_data_file(dir, base_name)? {
        Some(path) => Ok(path),
        None => Err(DataLoadError::MissingRequired {
            file: base_name.to_string(),
            dir: dir.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize in-memory text. `origin` only labels parse errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parsed = match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    })
}

/// Read `path` and deserialize it in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    deserialize_str(&std::fs::read_to_string(path)?, format, path)
}

// ===========================================================================
// Tests
// ===========================================================================
