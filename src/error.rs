//! Error type shared by generation, export, parsing and page rendering.

use std::fmt;
use std::path::PathBuf;

use crate::{Direction, Shape};

/// Everything that can go wrong while building, generating or emitting a map.
#[derive(Debug)]
pub enum MapError {
    /// Narrowing left a cell with no shape compatible with its neighbours.
    Contradiction {
        /// (row, column) of the over-constrained cell.
        position: (usize, usize),
        /// Direction from that cell towards the neighbour that constrained it.
        direction: Direction,
        /// Shape of the constraining neighbour.
        neighbour: Shape,
    },

    /// A collapse was attempted on a cell with no candidates left.
    EmptySelection {
        /// (row, column) of the cell.
        position: (usize, usize),
    },

    /// Writing the text export failed.
    Export {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The HTML page could not be rendered.
    Template(minijinja::Error),

    /// Map text contained a character outside the glyph catalog.
    Glyph {
        /// Zero-based line.
        row: usize,
        /// Zero-based character within the line.
        column: usize,
        /// Offending character.
        glyph: char,
    },

    /// Map text had rows of differing lengths.
    RaggedRow {
        /// Zero-based line.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of this row.
        found: usize,
    },

    /// Every generation attempt ended in a contradiction.
    AttemptsExhausted {
        /// Number of grids tried.
        attempts: usize,
        /// Failure of the final attempt.
        last: Box<MapError>,
    },
}

impl MapError {
    /// True for failures of the collapse algorithm itself, which a fresh attempt may avoid.
    #[must_use]
    pub const fn is_contradiction(&self) -> bool {
        matches!(
            self,
            Self::Contradiction { .. } | Self::EmptySelection { .. }
        )
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contradiction {
                position,
                direction,
                neighbour,
            } => write!(
                f,
                "No valid shapes remain at cell ({}, {}) after its {direction} neighbour collapsed to '{neighbour}'",
                position.0, position.1
            ),
            Self::EmptySelection { position } => write!(
                f,
                "Cannot collapse cell ({}, {}): no candidates left",
                position.0, position.1
            ),
            Self::Export { path, source } => {
                write!(f, "Failed to export map to '{}': {source}", path.display())
            }
            Self::Template(source) => write!(f, "Failed to render page: {source}"),
            Self::Glyph { row, column, glyph } => {
                write!(f, "Unknown glyph {glyph:?} at line {row}, column {column}")
            }
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "Line {row} has {found} glyphs, expected {expected}"
            ),
            Self::AttemptsExhausted { attempts, last } => {
                write!(f, "Generation failed after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Export { source, .. } => Some(source),
            Self::Template(source) => Some(source),
            Self::AttemptsExhausted { last, .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<minijinja::Error> for MapError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contradiction_message_names_cell_and_constraint() {
        let err = MapError::Contradiction {
            position: (3, 7),
            direction: Direction::Left,
            neighbour: Shape::UpDown,
        };
        let message = err.to_string();
        assert!(message.contains("(3, 7)"));
        assert!(message.contains("left"));
        assert!(message.contains('║'));
    }

    #[test]
    fn only_algorithmic_failures_are_contradictions() {
        assert!(MapError::EmptySelection { position: (0, 0) }.is_contradiction());
        let io = MapError::Export {
            path: PathBuf::from("map.txt"),
            source: std::io::Error::other("disk full"),
        };
        assert!(!io.is_contradiction());
        assert!(std::error::Error::source(&io).is_some());
    }
}
