//! Backtracking packer for a single region.
//!
//! Key points:
//! - Placements are enumerated once per piece type and shared by every
//!   instance of that type
//! - Instances are searched most-constrained-first (fewest placements first)
//! - The board is mutated in place: each `occupy` is paired with a `release`
//!   when its branch fails, so no board is ever cloned
//! - Consecutive instances of the same piece type take non-decreasing
//!   placement indices, so interchangeable instances are never permuted

use log::{debug, trace};
use thiserror::Error;

use crate::geometry::all_orientations;
use crate::grid::{coord_to_idx, Placement, Region};
use crate::pieces::{PieceCatalog, PieceId, RegionRequest, Shape};

/// Largest region, in cells, a [`Packer`] will build a board for.
pub const MAX_REGION_CELLS: usize = 1 << 24;

/// Most piece instances a single region may request.
pub const MAX_INSTANCES: usize = 1 << 24;

/// Errors raised when a region request does not match its catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("region {width}x{height} has no cells")]
    EmptyRegion { width: usize, height: usize },
    #[error("region {width}x{height} exceeds the {MAX_REGION_CELLS} cell limit")]
    RegionTooLarge { width: usize, height: usize },
    #[error("region requests more than {MAX_INSTANCES} pieces")]
    TooManyInstances,
    #[error("region requests piece {piece} but the catalog has {available} pieces")]
    UnknownPiece { piece: PieceId, available: usize },
}

/// Order in which instances are handed to the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PieceOrder {
    /// Ascending by placement count, ties in request order.
    #[default]
    MostConstrainedFirst,
    /// Request order.
    Input,
}

/// Tuning knobs for [`Packer::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub order: PieceOrder,
    /// Force identical instances to use non-decreasing placement indices.
    pub break_instance_symmetry: bool,
    /// Give up after this many placement attempts.
    pub max_steps: Option<u64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            order: PieceOrder::MostConstrainedFirst,
            break_instance_symmetry: true,
            max_steps: None,
        }
    }
}

/// Why a region was found not to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The requested pieces cover more cells than the region has.
    AreaExceeded,
    /// Every arrangement was tried.
    Exhausted,
}

/// Result of searching one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All instances were placed; the region holds the packing found.
    Fits(Region),
    DoesNotFit(Reason),
    /// The step budget ran out before the search finished.
    Unknown,
}

impl Verdict {
    pub fn fits(&self) -> bool {
        matches!(self, Verdict::Fits(_))
    }

    pub fn is_definite(&self) -> bool {
        !matches!(self, Verdict::Unknown)
    }
}

/// Counters collected while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Placements occupied on the board.
    pub steps: u64,
    /// Placements released after their branch failed.
    pub backtracks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub stats: SearchStats,
}

/// One requested copy of a piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceInstance {
    pub piece: PieceId,
    /// 1-based position in request order; written into the board cells.
    pub label: u32,
    pub area: usize,
}

/// Translates a shape to every offset where its bounding box stays inside a
/// `width` x `height` region.
///
/// Offsets are produced row by row. A shape larger than the region yields no
/// placements; the empty shape yields a single empty placement.
pub fn placements_for(shape: &Shape, width: usize, height: usize) -> Vec<Placement> {
    if shape.is_empty() {
        return vec![Placement::default()];
    }

    let (shape_width, shape_height) = (shape.width(), shape.height());
    if shape_width > width || shape_height > height {
        return Vec::new();
    }

    let mut placements =
        Vec::with_capacity((width - shape_width + 1) * (height - shape_height + 1));
    for dy in 0..=height - shape_height {
        for dx in 0..=width - shape_width {
            let cells = shape
                .cells()
                .iter()
                .map(|&(x, y)| coord_to_idx(width, dx + x as usize, dy + y as usize))
                .collect();
            placements.push(Placement::new(cells));
        }
    }

    placements
}

/// All placements of a piece in every distinct orientation.
pub fn piece_placements(shape: &Shape, width: usize, height: usize) -> Vec<Placement> {
    all_orientations(shape)
        .iter()
        .flat_map(|orientation| placements_for(orientation, width, height))
        .collect()
}

/// Sorts instances ascending by how many placements their piece has.
///
/// The sort is stable, so instances with equal counts keep request order.
pub fn order_instances(instances: &mut [PieceInstance], placements: &[Vec<Placement>]) {
    instances.sort_by_key(|instance| placements[instance.piece].len());
}

/// Precomputed search input for one region.
#[derive(Debug, Clone)]
pub struct Packer {
    width: usize,
    height: usize,
    /// Indexed by piece id; empty for piece types the region does not use.
    placements: Vec<Vec<Placement>>,
    /// In request order.
    instances: Vec<PieceInstance>,
}

impl Packer {
    /// Builds the placement table and instance list for a region.
    pub fn new(catalog: &PieceCatalog, request: &RegionRequest) -> Result<Self, RequestError> {
        let (width, height) = (request.width, request.height);
        if width == 0 || height == 0 {
            return Err(RequestError::EmptyRegion { width, height });
        }
        if request.area().map_or(true, |cells| cells > MAX_REGION_CELLS) {
            return Err(RequestError::RegionTooLarge { width, height });
        }
        let instance_count = request
            .instance_count()
            .filter(|&count| count <= MAX_INSTANCES)
            .ok_or(RequestError::TooManyInstances)?;

        let mut placements = vec![Vec::new(); catalog.len()];
        let mut instances = Vec::with_capacity(instance_count);

        for (piece, &count) in request.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let Some(pattern) = catalog.get(piece) else {
                return Err(RequestError::UnknownPiece {
                    piece,
                    available: catalog.len(),
                });
            };

            let shape = pattern.shape();
            placements[piece] = piece_placements(&shape, width, height);
            trace!(
                "piece {piece}: {} placements in {width}x{height}",
                placements[piece].len()
            );

            for _ in 0..count {
                let label = u32::try_from(instances.len() + 1)
                    .map_err(|_| RequestError::TooManyInstances)?;
                instances.push(PieceInstance {
                    piece,
                    label,
                    area: shape.area(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            placements,
            instances,
        })
    }

    pub fn instances(&self) -> &[PieceInstance] {
        &self.instances
    }

    /// Placements of one piece type (empty if the region does not use it).
    pub fn placements(&self, piece: PieceId) -> &[Placement] {
        self.placements
            .get(piece)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total cells covered by all requested instances.
    pub fn requested_area(&self) -> usize {
        self.instances.iter().map(|instance| instance.area).sum()
    }

    /// Decides whether every instance fits in the region at once.
    pub fn search(&self, options: &SearchOptions) -> Outcome {
        let region_area = self.width * self.height;
        let requested_area = self.requested_area();

        // no arrangement can cover more cells than the region has
        if requested_area > region_area {
            debug!("requested area {requested_area} exceeds region area {region_area}");
            return Outcome {
                verdict: Verdict::DoesNotFit(Reason::AreaExceeded),
                stats: SearchStats::default(),
            };
        }

        let mut order = self.instances.clone();
        if options.order == PieceOrder::MostConstrainedFirst {
            order_instances(&mut order, &self.placements);
        }

        let mut search = Search {
            placements: &self.placements,
            chosen: vec![0; order.len()],
            order,
            region: Region::new(self.width, self.height),
            break_instance_symmetry: options.break_instance_symmetry,
            max_steps: options.max_steps,
            stats: SearchStats::default(),
        };

        let verdict = match search.place_from(0) {
            Progress::Solved => Verdict::Fits(search.region),
            Progress::Failed => Verdict::DoesNotFit(Reason::Exhausted),
            Progress::OutOfSteps => Verdict::Unknown,
        };

        Outcome {
            verdict,
            stats: search.stats,
        }
    }
}

/// Decides whether the requested pieces fit in the region.
pub fn fits(catalog: &PieceCatalog, request: &RegionRequest) -> Result<bool, RequestError> {
    let packer = Packer::new(catalog, request)?;
    Ok(packer.search(&SearchOptions::default()).verdict.fits())
}

enum Progress {
    Solved,
    Failed,
    OutOfSteps,
}

/// Mutable state of one in-flight search.
struct Search<'a> {
    placements: &'a [Vec<Placement>],
    order: Vec<PieceInstance>,
    /// Placement index chosen at each depth on the current path.
    chosen: Vec<usize>,
    region: Region,
    break_instance_symmetry: bool,
    max_steps: Option<u64>,
    stats: SearchStats,
}

impl Search<'_> {
    /// Places `order[depth..]` on the board.
    ///
    /// On `Solved` the board keeps the full packing; otherwise it is left
    /// exactly as it was on entry.
    fn place_from(&mut self, depth: usize) -> Progress {
        let Some(&instance) = self.order.get(depth) else {
            return Progress::Solved;
        };

        let placements = self.placements;
        let candidates = &placements[instance.piece];

        // an identical instance right before this one already settled on a
        // placement index; anything lower is a permutation of a tried branch
        let first = match depth.checked_sub(1) {
            Some(previous)
                if self.break_instance_symmetry
                    && self.order[previous].piece == instance.piece =>
            {
                self.chosen[previous]
            }
            _ => 0,
        };

        for (index, placement) in candidates.iter().enumerate().skip(first) {
            if !self.region.can_place(placement) {
                continue;
            }
            if self.max_steps.is_some_and(|limit| self.stats.steps >= limit) {
                return Progress::OutOfSteps;
            }

            self.stats.steps += 1;
            self.region.occupy(placement, instance.label);
            self.chosen[depth] = index;

            match self.place_from(depth + 1) {
                Progress::Solved => return Progress::Solved,
                Progress::Failed => {
                    self.region.release(placement);
                    self.stats.backtracks += 1;
                }
                Progress::OutOfSteps => {
                    self.region.release(placement);
                    return Progress::OutOfSteps;
                }
            }
        }

        Progress::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::idx_to_coord;
    use crate::pieces::{
        Pattern, DOMINO, I_TROMINO, L_TETROMINO, L_TROMINO, MONOMINO, T_TETROMINO,
    };

    fn catalog_of(pieces: &[&[&str]]) -> PieceCatalog {
        pieces
            .iter()
            .map(|&rows| Pattern::parse(rows).unwrap())
            .collect()
    }

    fn every_option_set() -> Vec<SearchOptions> {
        let mut sets = Vec::new();
        for order in [PieceOrder::MostConstrainedFirst, PieceOrder::Input] {
            for break_instance_symmetry in [true, false] {
                sets.push(SearchOptions {
                    order,
                    break_instance_symmetry,
                    max_steps: None,
                });
            }
        }
        sets
    }

    /// Checks a finished packing: every instance holds exactly its area and
    /// nothing else is occupied.
    fn assert_valid_packing(packer: &Packer, region: &Region) {
        for instance in packer.instances() {
            assert_eq!(
                region.cells_with_label(instance.label),
                instance.area,
                "Instance {} does not cover its area",
                instance.label
            );
        }
        assert_eq!(region.occupied_count(), packer.requested_area());
    }

    #[test]
    fn test_two_dominoes_tile_a_2x2_square() {
        let catalog = catalog_of(&[DOMINO]);
        let request = RegionRequest::new(2, 2, vec![2]);
        assert_eq!(fits(&catalog, &request), Ok(true));

        let outcome = Packer::new(&catalog, &request)
            .unwrap()
            .search(&SearchOptions::default());
        let Verdict::Fits(region) = outcome.verdict else {
            panic!("Expected a packing");
        };
        insta::assert_snapshot!(region.render(), @r"
        00
        11
        ");
    }

    #[test]
    fn test_piece_longer_than_region_has_no_placements() {
        let catalog = catalog_of(&[I_TROMINO]);
        let request = RegionRequest::new(2, 2, vec![1]);
        let packer = Packer::new(&catalog, &request).unwrap();

        assert!(packer.placements(0).is_empty());
        assert_eq!(
            packer.search(&SearchOptions::default()).verdict,
            Verdict::DoesNotFit(Reason::Exhausted)
        );
    }

    #[test]
    fn test_area_overflow_is_rejected_without_search() {
        let catalog = catalog_of(&[MONOMINO]);
        let request = RegionRequest::new(3, 3, vec![10]);
        let outcome = Packer::new(&catalog, &request)
            .unwrap()
            .search(&SearchOptions::default());

        assert_eq!(outcome.verdict, Verdict::DoesNotFit(Reason::AreaExceeded));
        assert_eq!(outcome.stats, SearchStats::default());
    }

    #[test]
    fn test_nine_monominoes_fill_a_3x3_board() {
        let catalog = catalog_of(&[MONOMINO]);
        let request = RegionRequest::new(3, 3, vec![9]);
        let packer = Packer::new(&catalog, &request).unwrap();

        for options in every_option_set() {
            let Verdict::Fits(region) = packer.search(&options).verdict else {
                panic!("Expected a packing with {options:?}");
            };
            assert_eq!(region.occupied_count(), 9);
            assert_valid_packing(&packer, &region);
        }
    }

    #[test]
    fn test_l_trominoes_and_a_monomino_tile_4x4() {
        let catalog = catalog_of(&[L_TROMINO, MONOMINO]);
        let request = RegionRequest::new(4, 4, vec![5, 1]);
        let packer = Packer::new(&catalog, &request).unwrap();
        assert_eq!(packer.requested_area(), 16);

        for options in every_option_set() {
            let Verdict::Fits(region) = packer.search(&options).verdict else {
                panic!("Expected a packing with {options:?}");
            };
            assert_eq!(region.occupied_count(), 16);
            assert_valid_packing(&packer, &region);
        }
    }

    #[test]
    fn test_area_fits_but_shapes_do_not() {
        // whichever way the first T sits, the free cells left are disconnected
        let catalog = catalog_of(&[T_TETROMINO]);
        let request = RegionRequest::new(4, 2, vec![2]);
        let packer = Packer::new(&catalog, &request).unwrap();

        for options in every_option_set() {
            assert_eq!(
                packer.search(&options).verdict,
                Verdict::DoesNotFit(Reason::Exhausted),
                "Wrong verdict with {options:?}"
            );
        }
    }

    #[test]
    fn test_region_larger_than_pieces_still_fits() {
        let catalog = catalog_of(&[L_TETROMINO, DOMINO]);
        let request = RegionRequest::new(5, 3, vec![2, 3]);
        let packer = Packer::new(&catalog, &request).unwrap();

        let Verdict::Fits(region) = packer.search(&SearchOptions::default()).verdict else {
            panic!("Expected a packing");
        };
        assert_valid_packing(&packer, &region);
    }

    #[test]
    fn test_no_instances_always_fit() {
        let catalog = catalog_of(&[DOMINO]);
        assert_eq!(fits(&catalog, &RegionRequest::new(1, 1, vec![0])), Ok(true));
        assert_eq!(fits(&catalog, &RegionRequest::new(1, 1, vec![])), Ok(true));
    }

    #[test]
    fn test_empty_pieces_take_no_room() {
        let catalog = catalog_of(&[&[".."][..], MONOMINO]);
        let request = RegionRequest::new(1, 1, vec![3, 1]);
        let packer = Packer::new(&catalog, &request).unwrap();

        assert_eq!(packer.placements(0).len(), 1);
        assert!(packer.search(&SearchOptions::default()).verdict.fits());
    }

    #[test]
    fn test_request_errors() {
        let catalog = catalog_of(&[DOMINO]);
        assert_eq!(
            fits(&catalog, &RegionRequest::new(0, 3, vec![1])).unwrap_err(),
            RequestError::EmptyRegion {
                width: 0,
                height: 3
            }
        );
        assert_eq!(
            fits(&catalog, &RegionRequest::new(3, 3, vec![0, 1])).unwrap_err(),
            RequestError::UnknownPiece {
                piece: 1,
                available: 1
            }
        );
        // trailing zero counts for unknown pieces are harmless
        assert_eq!(fits(&catalog, &RegionRequest::new(2, 1, vec![1, 0])), Ok(true));
    }

    #[test]
    fn test_oversized_requests_are_rejected_before_allocating() {
        let catalog = catalog_of(&[DOMINO]);
        assert_eq!(
            Packer::new(&catalog, &RegionRequest::new(usize::MAX, 2, vec![1])).unwrap_err(),
            RequestError::RegionTooLarge {
                width: usize::MAX,
                height: 2
            }
        );
        assert_eq!(
            fits(&catalog, &RegionRequest::new(100_000, 100_000, vec![1])).unwrap_err(),
            RequestError::RegionTooLarge {
                width: 100_000,
                height: 100_000
            }
        );
        assert_eq!(
            fits(&catalog, &RegionRequest::new(4, 4, vec![usize::MAX])).unwrap_err(),
            RequestError::TooManyInstances
        );
        assert_eq!(
            fits(&catalog, &RegionRequest::new(4, 4, vec![MAX_INSTANCES + 1])).unwrap_err(),
            RequestError::TooManyInstances
        );
        // the largest allowed board is still accepted
        let packer = Packer::new(&catalog, &RegionRequest::new(MAX_REGION_CELLS, 1, vec![0]));
        assert!(packer.is_ok());
    }

    #[test]
    fn test_placements_stay_inside_the_region() {
        let (width, height) = (5, 3);
        let shape = Pattern::parse(L_TETROMINO).unwrap().shape();
        let orientations = all_orientations(&shape);
        let placements = piece_placements(&shape, width, height);

        // 4 orientations are 2x3 and 4 are 3x2
        assert_eq!(placements.len(), 4 * 4 * 1 + 4 * 3 * 2);

        for placement in &placements {
            assert_eq!(placement.len(), shape.area());
            let cells: Vec<(i32, i32)> = placement
                .cells()
                .iter()
                .map(|&cell| {
                    assert!(cell < width * height, "Cell {cell} is outside the region");
                    let (x, y) = idx_to_coord(width, cell);
                    (x as i32, y as i32)
                })
                .collect();
            // rows must not wrap: the footprint is one of the orientations
            assert!(orientations.contains(&Shape::from_cells(cells)));
        }
    }

    #[test]
    fn test_placements_are_distinct() {
        let shape = Pattern::parse(L_TROMINO).unwrap().shape();
        let placements = piece_placements(&shape, 4, 4);
        let distinct: rustc_hash::FxHashSet<&Placement> = placements.iter().collect();
        assert_eq!(distinct.len(), placements.len());
        assert_eq!(placements.len(), 4 * 3 * 3);
    }

    #[test]
    fn test_order_is_stable_most_constrained_first() {
        let catalog = catalog_of(&[MONOMINO, L_TROMINO, DOMINO]);
        let request = RegionRequest::new(3, 3, vec![1, 2, 1]);
        let packer = Packer::new(&catalog, &request).unwrap();

        let mut order = packer.instances().to_vec();
        order_instances(&mut order, &packer.placements);

        // L tromino: 4 * 2 * 2 = 16, domino: 2 * 3 * 2 = 12, monomino: 9
        let pieces: Vec<PieceId> = order.iter().map(|instance| instance.piece).collect();
        assert_eq!(pieces, vec![0, 2, 1, 1]);
        let labels: Vec<u32> = order.iter().map(|instance| instance.label).collect();
        assert_eq!(labels, vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_step_budget_reports_unknown() {
        let catalog = catalog_of(&[T_TETROMINO]);
        let request = RegionRequest::new(4, 2, vec![2]);
        let packer = Packer::new(&catalog, &request).unwrap();
        let options = SearchOptions {
            max_steps: Some(1),
            ..SearchOptions::default()
        };

        let outcome = packer.search(&options);
        assert_eq!(outcome.verdict, Verdict::Unknown);
        assert!(!outcome.verdict.is_definite());
        assert_eq!(outcome.stats.steps, 1);
    }

    #[test]
    fn test_symmetry_breaking_never_searches_more() {
        let catalog = catalog_of(&[T_TETROMINO]);
        let request = RegionRequest::new(4, 2, vec![2]);
        let packer = Packer::new(&catalog, &request).unwrap();

        let broken = packer.search(&SearchOptions::default()).stats;
        let plain = packer
            .search(&SearchOptions {
                break_instance_symmetry: false,
                ..SearchOptions::default()
            })
            .stats;
        assert!(broken.steps <= plain.steps);
    }

    #[test]
    fn test_search_is_deterministic() {
        let catalog = catalog_of(&[L_TROMINO, MONOMINO]);
        let request = RegionRequest::new(4, 4, vec![5, 1]);
        let packer = Packer::new(&catalog, &request).unwrap();

        let first = packer.search(&SearchOptions::default());
        for _ in 0..3 {
            assert_eq!(packer.search(&SearchOptions::default()), first);
        }
    }
}
