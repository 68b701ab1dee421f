//! Property tests for the field, shapes, line clears and speed progression.

use brickfall_core::clear::{clear_lines, RowSpan};
use brickfall_core::geom::Point2;
use brickfall_core::{
    ActivePiece, Cell, Config, GameSession, PieceType, PlayField, ShapeDef, ShapeMatrix,
    SpawnOutcome, TickOutcome,
};
use proptest::prelude::*;

fn rows_of(size: usize, cells: &[bool]) -> Vec<String> {
    cells
        .chunks(size)
        .map(|row| row.iter().map(|c| if *c { '1' } else { '0' }).collect())
        .collect()
}

/// Shape definitions of size 2 to `max` with at least one cell.
fn shape_rows(max: usize) -> impl Strategy<Value = Vec<String>> {
    (2..=max)
        .prop_flat_map(|size| {
            (
                Just(size),
                prop::collection::vec(any::<bool>(), size * size),
                0..size * size,
            )
        })
        .prop_map(|(size, mut cells, forced)| {
            cells[forced] = true;
            rows_of(size, &cells)
        })
}

/// A field configuration plus a shape that fits into it.
fn field_and_shape() -> impl Strategy<Value = (usize, usize, usize, Vec<String>)> {
    (2usize..=5, 1usize..=10)
        .prop_flat_map(|(max, height)| (Just(max), max..=12usize, Just(height)))
        .prop_flat_map(|(max, width, height)| {
            (Just(width), Just(height), Just(max), shape_rows(max))
        })
}

proptest! {
    #[test]
    fn four_rotations_are_identity(rows in shape_rows(5)) {
        let shape = ShapeMatrix::build(&rows[..], 5).unwrap();
        let turned = shape.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        prop_assert_eq!(&turned, &shape);
        prop_assert_eq!(shape.rotated_cw().cell_count(), shape.cell_count());
    }

    #[test]
    fn empty_field_never_blocks_spawn((width, height, max, rows) in field_and_shape()) {
        let config = Config {
            playable_width: width,
            playable_height: height,
            max_piece_size: max,
            shapes: vec![ShapeDef { name: "P".to_string(), rows: rows.clone() }],
            ..Config::default()
        };
        let mut session = GameSession::with_seed(config, 0).unwrap();
        prop_assert_eq!(session.spawn_next(), SpawnOutcome::Spawned);

        let field = PlayField::new(width, height, max).unwrap();
        let piece_type = PieceType::new("P", ShapeMatrix::build(&rows[..], max).unwrap());
        prop_assert!(ActivePiece::try_spawn(&piece_type, &field).is_ok());
    }

    #[test]
    fn commit_adds_exactly_the_shape_cells(
        rows in shape_rows(4),
        filled in prop::collection::vec((0usize..16, 1usize..5), 0..30),
        dx in 0isize..=4,
        dy in 0isize..=3,
    ) {
        // 8 x 8 playable, walls 4 wide: columns 4..12, rows up to 11
        let mut field = PlayField::new(8, 8, 4).unwrap();
        for (fx, fy) in filled {
            field.set_cell(fx, fy, Cell::Occupied);
        }
        let shape = ShapeMatrix::build(&rows[..], 4).unwrap();
        // the stack stays below row 5, the shape stays above it
        let pos = Point2::new(4 + dx, 11 - dy);
        prop_assert!(!field.would_collide(&shape, pos));

        let before = field.occupied_count();
        field.commit(&shape, pos);
        prop_assert_eq!(field.occupied_count(), before + shape.cell_count());
        prop_assert!(field.would_collide(&shape, pos));
    }

    #[test]
    fn full_rows_in_span_are_all_cleared(
        width in 1usize..8,
        height in 4usize..10,
        seed_rows in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 12),
        full_mask in prop::collection::vec(any::<bool>(), 5),
        span_start in 1usize..4,
    ) {
        let mut field = PlayField::new(width, height, 2).unwrap();
        let columns = field.playable_columns();
        let top = field.height();

        // model of the playable area, index 0 is field row 1
        let mut model: Vec<Vec<bool>> = Vec::new();
        let mut full_rows = 0;
        for y in 1..top {
            let in_span = y >= span_start && y < span_start + full_mask.len();
            let row: Vec<bool> = if in_span && full_mask[y - span_start] {
                full_rows += 1;
                vec![true; width]
            } else {
                // anything outside the full set keeps at least one hole
                let mut row = seed_rows[y % seed_rows.len()][..width].to_vec();
                row[y % width] = false;
                row
            };
            for (i, occupied) in row.iter().enumerate() {
                if *occupied {
                    field.set_cell(columns.start + i, y, Cell::Occupied);
                }
            }
            model.push(row);
        }

        let mut expected: Vec<Vec<bool>> = model
            .into_iter()
            .filter(|row| !row.iter().all(|c| *c))
            .collect();
        while expected.len() < top - 1 {
            expected.push(vec![false; width]);
        }

        let report = clear_lines(&mut field, RowSpan::new(span_start as isize, full_mask.len()));
        prop_assert_eq!(report.count(), full_rows);

        let snapshot = field.snapshot(false);
        let actual: Vec<Vec<bool>> = snapshot.cells.chunks(width).map(|row| row.to_vec()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn speedup_threshold_repeats(threshold in 1u32..6, locks in 0usize..20) {
        // a flat domino exactly as wide as the field clears a row on every lock
        let config = Config {
            playable_width: 2,
            playable_height: 4,
            max_piece_size: 2,
            base_fall_speed: 2.,
            rows_cleared_to_speedup: threshold,
            speedup_increment: 0.5,
            shapes: vec![ShapeDef::new("D", &["00", "11"])],
            ..Config::default()
        };
        let mut session = GameSession::with_seed(config, 5).unwrap();
        prop_assert_eq!(session.spawn_next(), SpawnOutcome::Spawned);

        for i in 1..=locks {
            let report = loop {
                match session.advance_fall() {
                    TickOutcome::Fell => continue,
                    TickOutcome::Locked(report) => break report,
                    other => panic!("unexpected {:?}", other),
                }
            };
            prop_assert_eq!(report.rows_cleared(), 1);
            prop_assert!(!report.game_over);

            let expected_speedups = if i as u32 % threshold == 0 { 1 } else { 0 };
            prop_assert_eq!(report.speedups, expected_speedups);
            prop_assert_eq!(session.rows_cleared_since_speedup(), i as u32 % threshold);
            let speed = 2. + (i as u32 / threshold) as f64 * 0.5;
            prop_assert_eq!(session.fall_speed(), speed);
        }
        prop_assert_eq!(session.total_rows_cleared(), locks);
    }
}
