//! Occupancy board for a rectangular region.
//!
//! The board is a flat row-major array where each cell contains the label of
//! the piece instance occupying it (1-based), or 0 for empty.

use std::fmt;

/// Characters used to render instance labels, cycling after 62.
const LABEL_CHARS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Converts (x, y) coordinates to a linear cell index.
///
/// Index order is row-major: `idx = y * width + x`.
#[inline(always)]
pub const fn coord_to_idx(width: usize, x: usize, y: usize) -> usize {
    y * width + x
}

/// Converts a linear cell index to (x, y) coordinates.
#[inline(always)]
pub const fn idx_to_coord(width: usize, cell_index: usize) -> (usize, usize) {
    (cell_index % width, cell_index / width)
}

/// One translated, oriented copy of a piece, as absolute cell indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Placement {
    cells: Vec<usize>,
}

impl Placement {
    pub fn new(cells: Vec<usize>) -> Self {
        Self { cells }
    }

    #[inline]
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Mutable occupancy state of one region.
///
/// Placements handed to [`Region::can_place`], [`Region::occupy`] and
/// [`Region::release`] must have been generated for this region's width and
/// height; cells are not bounds-checked again here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Region {
    /// Creates an empty region.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if every cell of the placement is empty.
    #[inline]
    pub fn can_place(&self, placement: &Placement) -> bool {
        placement.cells().iter().all(|&cell| self.cells[cell] == 0)
    }

    /// Marks every cell of the placement as held by `label`.
    ///
    /// The caller must have checked [`Region::can_place`] first.
    #[inline]
    pub fn occupy(&mut self, placement: &Placement, label: u32) {
        debug_assert_ne!(label, 0, "label 0 is reserved for empty cells");
        for &cell in placement.cells() {
            debug_assert_eq!(self.cells[cell], 0, "cell {cell} is already occupied");
            self.cells[cell] = label;
        }
    }

    /// Marks every cell of the placement as empty again.
    #[inline]
    pub fn release(&mut self, placement: &Placement) {
        for &cell in placement.cells() {
            self.cells[cell] = 0;
        }
    }

    /// Label of the instance at (x, y), or `None` when the cell is empty.
    pub fn occupant(&self, x: usize, y: usize) -> Option<u32> {
        match self.cells[coord_to_idx(self.width, x, y)] {
            0 => None,
            label => Some(label),
        }
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&label| label != 0).count()
    }

    /// Number of cells held by the given label.
    pub fn cells_with_label(&self, label: u32) -> usize {
        self.cells.iter().filter(|&&held| held == label).count()
    }

    /// Formats the board one row per line.
    ///
    /// Empty cells show as '.', occupied cells as the instance label in
    /// base 62 (`0-9`, then `A-Z`, then `a-z`, wrapping around).
    pub fn render(&self) -> String {
        let mut output = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width.max(1)) {
            for &label in row {
                output.push(label_char(label));
            }
            output.push('\n');
        }
        output
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn label_char(label: u32) -> char {
    match label {
        0 => '.',
        label => char::from(LABEL_CHARS[(label as usize - 1) % LABEL_CHARS.len()]),
    }
}
