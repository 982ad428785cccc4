//! Piece definitions, character-grid patterns and region requests.
//!
//! A piece is described by a rectangular grid of `#` (filled) and `.` (empty)
//! markers. Its filled cells, shifted so the minimum coordinates sit at the
//! origin, form its [`Shape`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::normalize_to_origin;

/// A 2D cell coordinate `(x, y)`, with `x` growing rightwards and `y` downwards.
pub type Coord = (i32, i32);

/// Index of a piece type within a [`PieceCatalog`].
pub type PieceId = usize;

/// Marker for a filled cell in a pattern.
pub const FILLED: char = '#';

/// Marker for an empty cell in a pattern.
pub const EMPTY: char = '.';

/// Errors raised while reading a character grid into a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern has no rows")]
    NoRows,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unexpected character '{found}' at ({x}, {y})")]
    UnexpectedMarker { x: usize, y: usize, found: char },
}

/// A validated rectangular grid of filled and empty markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    width: usize,
    rows: Vec<Vec<bool>>,
}

impl Pattern {
    /// Reads a pattern from its rows, checking that every row has the same
    /// length and uses only [`FILLED`] and [`EMPTY`].
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, PatternError> {
        let Some(first) = rows.first() else {
            return Err(PatternError::NoRows);
        };
        let width = first.as_ref().chars().count();

        let mut cells = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(PatternError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }

            let parsed = row
                .chars()
                .enumerate()
                .map(|(x, marker)| match marker {
                    FILLED => Ok(true),
                    EMPTY => Ok(false),
                    found => Err(PatternError::UnexpectedMarker { x, y, found }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(parsed);
        }

        Ok(Self { width, rows: cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Filled cells in row-major order.
    pub fn filled_cells(&self) -> Vec<Coord> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &filled)| filled)
                    .map(move |(x, _)| (x as i32, y as i32))
            })
            .collect()
    }

    /// Number of filled cells.
    pub fn area(&self) -> usize {
        self.rows.iter().flatten().filter(|&&filled| filled).count()
    }

    /// The normalized shape of the filled cells.
    pub fn shape(&self) -> Shape {
        Shape::from_cells(self.filled_cells())
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = text.lines().map(str::trim_end).collect();
        Self::parse(&rows)
    }
}

/// A set of cells translated so the minimum x and y are both zero.
///
/// Cells are kept sorted, so two shapes compare equal exactly when they cover
/// the same relative offsets. This makes a `Shape` its own canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shape {
    cells: Vec<Coord>,
}

impl Shape {
    pub fn from_cells(cells: impl IntoIterator<Item = Coord>) -> Self {
        Self {
            cells: normalize_to_origin(cells.into_iter().collect()),
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Width of the bounding box (0 for the empty shape).
    pub fn width(&self) -> usize {
        self.cells.iter().map(|&(x, _)| x as usize + 1).max().unwrap_or(0)
    }

    /// Height of the bounding box (0 for the empty shape).
    pub fn height(&self) -> usize {
        self.cells.iter().map(|&(_, y)| y as usize + 1).max().unwrap_or(0)
    }
}

impl fmt::Display for Shape {
    /// Writes the shape back as `#`/`.` rows, one per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.width();
        for y in 0..self.height() as i32 {
            let row: String = (0..width as i32)
                .map(|x| {
                    if self.cells.binary_search(&(x, y)).is_ok() {
                        FILLED
                    } else {
                        EMPTY
                    }
                })
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// All piece types known to a puzzle, indexed by [`PieceId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceCatalog {
    patterns: Vec<Pattern>,
}

impl PieceCatalog {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Adds a piece type and returns the id it was assigned.
    pub fn push(&mut self, pattern: Pattern) -> PieceId {
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    pub fn get(&self, id: PieceId) -> Option<&Pattern> {
        self.patterns.get(id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceId, &Pattern)> {
        self.patterns.iter().enumerate()
    }
}

impl FromIterator<Pattern> for PieceCatalog {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A region to pack: its size and how many instances of each piece it needs.
///
/// `counts[id]` is the number of instances of piece `id`; missing trailing
/// entries mean zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRequest {
    pub width: usize,
    pub height: usize,
    pub counts: Vec<usize>,
}

impl RegionRequest {
    pub fn new(width: usize, height: usize, counts: Vec<usize>) -> Self {
        Self {
            width,
            height,
            counts,
        }
    }

    /// Number of cells, or `None` if it does not fit in a `usize`.
    pub fn area(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Total number of piece instances requested, or `None` on overflow.
    pub fn instance_count(&self) -> Option<usize> {
        self.counts
            .iter()
            .try_fold(0usize, |total, &count| total.checked_add(count))
    }
}

impl fmt::Display for RegionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}:", self.width, self.height)?;
        for count in &self.counts {
            write!(f, " {count}")?;
        }
        Ok(())
    }
}

/// A single cell.
pub const MONOMINO: &[&str] = &["#"];

/// Two cells in a row.
pub const DOMINO: &[&str] = &["##"];

/// Three cells in a row.
pub const I_TROMINO: &[&str] = &["###"];

/// Three cells bent into an L.
pub const L_TROMINO: &[&str] = &["#.", "##"];

/// A 2x2 block.
pub const O_TETROMINO: &[&str] = &["##", "##"];

/// Four cells in an L (chiral: all 8 symmetries are distinct).
pub const L_TETROMINO: &[&str] = &["#.", "#.", "##"];

/// Four cells in a T.
pub const T_TETROMINO: &[&str] = &["###", ".#."];
