//! Persist the session to disk (XDG config or ~/.config/cubelinetui) as JSON.

use crate::sequence::{MAX_SEQUENCE_LEN, Sequence};
use crate::theme::{Rgba, parse_hex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "cubelinetui";
const FILENAME: &str = "save.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt save: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

/// Snapshot written when the game is closed and read back on start.
///
/// Scores are kept as decimal strings and colours as `#RRGGBBAA`; both are re-parsed on load.
/// `fixed_cell_colors[i]` belongs to `fixed_cell_indices[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub best_score: String,
    pub current_score: String,
    pub current_sequence_length: usize,
    pub next_sequence_length: usize,
    pub current_sequence_colors: Vec<String>,
    pub next_sequence_colors: Vec<String>,
    pub fixed_cell_indices: Vec<usize>,
    pub fixed_cell_colors: Vec<String>,
}

/// A `PlayerData` that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub best_score: u32,
    pub current_score: u32,
    pub current: Sequence,
    pub next: Sequence,
    pub fixed: Vec<(usize, Rgba)>,
}

fn corrupt(msg: impl Into<String>) -> SaveError {
    SaveError::Corrupt(msg.into())
}

fn parse_score(field: &str, s: &str) -> Result<u32, SaveError> {
    s.trim()
        .parse()
        .map_err(|_| corrupt(format!("{field} is not a score: {s:?}")))
}

fn parse_sequence(field: &str, len: usize, colors: &[String]) -> Result<Sequence, SaveError> {
    if !(1..=MAX_SEQUENCE_LEN).contains(&len) {
        return Err(corrupt(format!("{field} has length {len}")));
    }
    if colors.len() != len {
        return Err(corrupt(format!(
            "{field} declares {len} blocks but lists {} colours",
            colors.len()
        )));
    }
    let colors = colors
        .iter()
        .map(|c| parse_hex(c).map_err(|e| corrupt(format!("{field}: {e}"))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Sequence::from_colors(colors))
}

impl PlayerData {
    /// Parse every field and check it against a board of `grid_len` cells.
    pub fn decode(&self, grid_len: usize) -> Result<Snapshot, SaveError> {
        let best_score = parse_score("bestScore", &self.best_score)?;
        let current_score = parse_score("currentScore", &self.current_score)?;
        let current = parse_sequence(
            "currentSequence",
            self.current_sequence_length,
            &self.current_sequence_colors,
        )?;
        let next = parse_sequence(
            "nextSequence",
            self.next_sequence_length,
            &self.next_sequence_colors,
        )?;

        if self.fixed_cell_indices.len() != self.fixed_cell_colors.len() {
            return Err(corrupt(format!(
                "{} fixed cells but {} colours",
                self.fixed_cell_indices.len(),
                self.fixed_cell_colors.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.fixed_cell_indices.len());
        let mut fixed = Vec::with_capacity(self.fixed_cell_indices.len());
        for (&index, color) in self.fixed_cell_indices.iter().zip(&self.fixed_cell_colors) {
            if index >= grid_len {
                return Err(corrupt(format!(
                    "fixed cell {index} outside a {grid_len}-cell grid"
                )));
            }
            if !seen.insert(index) {
                return Err(corrupt(format!("fixed cell {index} listed twice")));
            }
            let color = parse_hex(color).map_err(|e| corrupt(format!("fixed cell {index}: {e}")))?;
            fixed.push((index, color));
        }

        Ok(Snapshot {
            best_score,
            current_score,
            current,
            next,
            fixed,
        })
    }
}

/// Default save location: config dir / cubelinetui / save.json.
pub fn save_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// Read a save. `Ok(None)` when there is no file yet.
pub fn load_game(path: &Path) -> Result<Option<PlayerData>, SaveError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write a save, creating the directory if needed.
pub fn save_game(path: &Path, data: &PlayerData) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| SaveError::Io(std::io::Error::other(e)))?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlayerData {
        PlayerData {
            best_score: "120".into(),
            current_score: "30".into(),
            current_sequence_length: 2,
            next_sequence_length: 1,
            current_sequence_colors: vec!["#E06C75FF".into(), "#61AFEFFF".into()],
            next_sequence_colors: vec!["#98C379FF".into()],
            fixed_cell_indices: vec![7, 3],
            fixed_cell_colors: vec!["#E06C75FF".into(), "#61AFEFFF".into()],
        }
    }

    #[test]
    fn decode_valid() {
        let snap = sample().decode(25).unwrap();
        assert_eq!(snap.best_score, 120);
        assert_eq!(snap.current_score, 30);
        assert_eq!(snap.current.len(), 2);
        assert!(snap.current.blocks()[0].is_first);
        assert_eq!(snap.next.color_at(0), Some(Rgba::opaque(0x98, 0xC3, 0x79)));
        // positional pairing, not sorted by index
        assert_eq!(
            snap.fixed,
            vec![
                (7, Rgba::opaque(0xE0, 0x6C, 0x75)),
                (3, Rgba::opaque(0x61, 0xAF, 0xEF)),
            ]
        );
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"bestScore\":\"120\""));
        assert!(json.contains("\"fixedCellIndices\":[7,3]"));
        assert!(json.contains("\"nextSequenceColors\""));
        let back: PlayerData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn bad_score_is_corrupt() {
        let mut data = sample();
        data.current_score = "lots".into();
        assert!(matches!(data.decode(25), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn length_mismatch_is_corrupt() {
        let mut data = sample();
        data.current_sequence_length = 3;
        assert!(matches!(data.decode(25), Err(SaveError::Corrupt(_))));

        let mut data = sample();
        data.fixed_cell_colors.pop();
        assert!(matches!(data.decode(25), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn zero_or_long_sequence_is_corrupt() {
        let mut data = sample();
        data.next_sequence_length = 0;
        data.next_sequence_colors.clear();
        assert!(data.decode(25).is_err());

        let mut data = sample();
        data.next_sequence_length = 5;
        data.next_sequence_colors = vec!["#FFFFFFFF".into(); 5];
        assert!(data.decode(25).is_err());
    }

    #[test]
    fn out_of_range_or_duplicate_cell_is_corrupt() {
        let mut data = sample();
        data.fixed_cell_indices[0] = 25;
        assert!(data.decode(25).is_err());

        let mut data = sample();
        data.fixed_cell_indices = vec![3, 3];
        assert!(data.decode(25).is_err());
    }

    #[test]
    fn bad_colour_is_corrupt() {
        let mut data = sample();
        data.fixed_cell_colors[1] = "blue".into();
        assert!(matches!(data.decode(25), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn unparsable_json_is_corrupt() {
        let err = serde_json::from_str::<PlayerData>("{\"bestScore\": 3").map_err(SaveError::from);
        assert!(matches!(err, Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("cubelinetui-test-{}", std::process::id()));
        let path = dir.join("nested").join(FILENAME);
        assert!(load_game(&path).unwrap().is_none());

        save_game(&path, &sample()).unwrap();
        assert_eq!(load_game(&path).unwrap(), Some(sample()));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_game(&path), Err(SaveError::Corrupt(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_path_ends_in_app_dir() {
        let p = save_path();
        assert!(p.ends_with(Path::new(APP_DIR).join(FILENAME)));
    }
}
