//! Text input: a piece catalog followed by region requests.
//!
//! ```text
//! 0:
//! ###
//! ##.
//!
//! 4x4: 2
//! ```
//!
//! A shape block is a header `<id>:` followed by `#`/`.` rows; ids must run
//! `0, 1, 2, ...` in order. A region line is `<width>x<height>:` followed by
//! one count per catalog piece. Blank lines separate blocks.

use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

use crate::pieces::{Pattern, PatternError, PieceCatalog, PieceId, RegionRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected piece {expected}, found piece {found}")]
    UnexpectedPieceId {
        line: usize,
        expected: PieceId,
        found: PieceId,
    },
    #[error("piece {id}: {source}")]
    MalformedShape {
        id: PieceId,
        #[source]
        source: PatternError,
    },
    #[error("line {line}: expected '<width>x<height>: <counts>', got '{text}'")]
    MalformedRegion { line: usize, text: String },
    #[error("line {line}: invalid number")]
    Number {
        line: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: region lists {found} counts but the catalog has {expected} pieces")]
    CountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// A parsed puzzle: the piece types and every region to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuzzleInput {
    pub catalog: PieceCatalog,
    pub regions: Vec<RegionRequest>,
}

impl FromStr for PuzzleInput {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_input(text)
    }
}

/// Shape rows collected since the last header.
struct PendingShape<'a> {
    id: PieceId,
    rows: Vec<&'a str>,
}

impl PendingShape<'_> {
    fn finish(self) -> Result<Pattern, ParseError> {
        Pattern::parse(&self.rows).map_err(|source| ParseError::MalformedShape {
            id: self.id,
            source,
        })
    }
}

/// Parses the whole puzzle text.
pub fn parse_input(text: &str) -> Result<PuzzleInput, ParseError> {
    let mut input = PuzzleInput::default();
    let mut pending: Option<PendingShape> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim_end();

        if line.is_empty() {
            if let Some(shape) = pending.take() {
                input.catalog.push(shape.finish()?);
            }
            continue;
        }

        if let Some(header) = shape_header(line) {
            if let Some(shape) = pending.take() {
                input.catalog.push(shape.finish()?);
            }
            let found = header.parse().map_err(|source| ParseError::Number {
                line: line_number,
                source,
            })?;
            let expected = input.catalog.len();
            if found != expected {
                return Err(ParseError::UnexpectedPieceId {
                    line: line_number,
                    expected,
                    found,
                });
            }
            pending = Some(PendingShape {
                id: found,
                rows: Vec::new(),
            });
            continue;
        }

        match pending.as_mut() {
            Some(shape) if !line.contains(':') => shape.rows.push(line),
            _ => {
                if let Some(shape) = pending.take() {
                    input.catalog.push(shape.finish()?);
                }
                let region = parse_region(line, line_number, input.catalog.len())?;
                input.regions.push(region);
            }
        }
    }

    if let Some(shape) = pending.take() {
        input.catalog.push(shape.finish()?);
    }

    Ok(input)
}

/// Returns the id text of a `<id>:` header line.
fn shape_header(line: &str) -> Option<&str> {
    let id = line.strip_suffix(':')?.trim();
    (!id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit())).then_some(id)
}

/// Parses a `<width>x<height>: <counts>` line against a catalog of
/// `piece_count` pieces.
fn parse_region(
    line: &str,
    line_number: usize,
    piece_count: usize,
) -> Result<RegionRequest, ParseError> {
    let malformed = || ParseError::MalformedRegion {
        line: line_number,
        text: line.to_string(),
    };
    let number = |text: &str| {
        text.trim().parse::<usize>().map_err(|source| ParseError::Number {
            line: line_number,
            source,
        })
    };

    let (size, counts) = line.split_once(':').ok_or_else(malformed)?;
    let (width, height) = size.split_once('x').ok_or_else(malformed)?;
    let width = number(width)?;
    let height = number(height)?;

    let counts = counts
        .split_whitespace()
        .map(number)
        .collect::<Result<Vec<_>, _>>()?;
    if counts.len() != piece_count {
        return Err(ParseError::CountMismatch {
            line: line_number,
            expected: piece_count,
            found: counts.len(),
        });
    }

    Ok(RegionRequest::new(width, height, counts))
}
