//! Planar rotation and reflection utilities.
//!
//! A square grid has 8 symmetries (the dihedral group of order 8): the 4
//! quarter-turn rotations, each optionally preceded by a mirror.

use rustc_hash::FxHashSet;

use crate::pieces::{Coord, Shape};

/// All 8 symmetries of the square grid.
///
/// - Transforms 0-3: the identity followed by three successive quarter turns
///   (a quarter turn maps row `y` of a pattern onto column `height - 1 - y`)
/// - Transforms 4-7: the mirror image (row order reversed) followed by the
///   same three quarter turns
///
/// Results are only meaningful after [`normalize_to_origin`].
pub const TRANSFORMS: [fn(Coord) -> Coord; 8] = [
    |(x, y)| (x, y),
    |(x, y)| (-y, x),
    |(x, y)| (-x, -y),
    |(x, y)| (y, -x),
    // mirrored
    |(x, y)| (x, -y),
    |(x, y)| (y, x),
    |(x, y)| (-x, y),
    |(x, y)| (-y, -x),
];

/// Generates the distinct orientations of a shape.
///
/// Applies every transform in [`TRANSFORMS`] order and keeps the first
/// occurrence of each normalized result, so symmetric shapes yield fewer than
/// 8 orientations. The empty shape yields itself once.
pub fn all_orientations(shape: &Shape) -> Vec<Shape> {
    let mut seen: FxHashSet<Shape> = FxHashSet::default();
    let mut orientations = Vec::new();

    for transform in TRANSFORMS {
        let oriented = Shape::from_cells(shape.cells().iter().map(|&cell| transform(cell)));
        if seen.insert(oriented.clone()) {
            orientations.push(oriented);
        }
    }

    orientations
}

/// Translates coordinates so the minimum x and y are both zero, then sorts
/// and dedups them.
///
/// Two cell sets that differ only by translation normalize to the same vector.
pub fn normalize_to_origin(mut coords: Vec<Coord>) -> Vec<Coord> {
    let (Some(min_x), Some(min_y)) = (
        coords.iter().map(|&(x, _)| x).min(),
        coords.iter().map(|&(_, y)| y).min(),
    ) else {
        return coords;
    };

    for (x, y) in &mut coords {
        *x -= min_x;
        *y -= min_y;
    }

    coords.sort_unstable();
    coords.dedup();
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{
        Pattern, DOMINO, I_TROMINO, L_TETROMINO, L_TROMINO, MONOMINO, O_TETROMINO, T_TETROMINO,
    };

    fn shape_of(rows: &[&str]) -> Shape {
        Pattern::parse(rows).unwrap().shape()
    }

    #[test]
    fn test_orientation_counts_follow_piece_symmetry() {
        let expected = [
            (MONOMINO, 1),
            (DOMINO, 2),
            (I_TROMINO, 2),
            (L_TROMINO, 4),
            (O_TETROMINO, 1),
            (T_TETROMINO, 4),
            (L_TETROMINO, 8),
            (&["##.", ".##"][..], 4),
        ];
        for (rows, count) in expected {
            assert_eq!(
                all_orientations(&shape_of(rows)).len(),
                count,
                "Wrong orientation count for {rows:?}"
            );
        }
    }

    #[test]
    fn test_orientations_are_normalized_and_distinct() {
        let shape = shape_of(L_TETROMINO);
        let orientations = all_orientations(&shape);

        let keys: FxHashSet<&Shape> = orientations.iter().collect();
        assert_eq!(keys.len(), orientations.len(), "Duplicate orientation keys");

        for orientation in &orientations {
            assert_eq!(orientation.area(), shape.area());
            assert_eq!(orientation.cells().iter().map(|&(x, _)| x).min(), Some(0));
            assert_eq!(orientation.cells().iter().map(|&(_, y)| y).min(), Some(0));
        }
    }

    #[test]
    fn test_first_orientation_is_the_input_shape() {
        let shape = shape_of(T_TETROMINO);
        assert_eq!(all_orientations(&shape)[0], shape);
    }

    #[test]
    fn test_every_transform_lands_on_a_listed_orientation() {
        let shape = shape_of(&["#..", "###", ".#."]);
        let orientations = all_orientations(&shape);
        for base in &orientations {
            for transform in TRANSFORMS {
                let image = Shape::from_cells(base.cells().iter().map(|&cell| transform(cell)));
                assert!(
                    orientations.contains(&image),
                    "Orientation set is not closed under the symmetry group"
                );
            }
        }
    }

    #[test]
    fn test_transforms_are_bijective_on_a_square() {
        let cells: Vec<Coord> = (0..3).flat_map(|y| (0..3).map(move |x| (x, y))).collect();
        for (index, transform) in TRANSFORMS.iter().enumerate() {
            let image = normalize_to_origin(cells.iter().map(|&cell| transform(cell)).collect());
            assert_eq!(image.len(), 9, "Transform {index} merged cells");
            assert!(
                image.iter().all(|&(x, y)| (0..3).contains(&x) && (0..3).contains(&y)),
                "Transform {index} left the 3x3 square"
            );
        }
    }

    #[test]
    fn test_empty_shape_has_one_orientation() {
        let orientations = all_orientations(&Shape::default());
        assert_eq!(orientations.len(), 1);
        assert!(orientations[0].is_empty());
    }

    #[test]
    fn test_normalize_to_origin_shifts_and_sorts() {
        assert_eq!(
            normalize_to_origin(vec![(3, -1), (2, -1), (2, 0)]),
            vec![(0, 0), (0, 1), (1, 0)]
        );
    }

    #[test]
    fn test_l_tromino_orientations_snapshot() {
        let listing = all_orientations(&shape_of(L_TROMINO))
            .iter()
            .map(Shape::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        insta::assert_snapshot!(listing, @r"
        #.
        ##

        ##
        #.

        ##
        .#

        .#
        ##
        ");
    }
}
