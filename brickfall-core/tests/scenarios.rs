//! Small hand-built games.

use brickfall_core::clear::clear_lines;
use brickfall_core::geom::Point2;
use brickfall_core::{
    ActivePiece, Cell, CommandOutcome, Config, Direction, GameSession, PieceType, PlayField,
    Rotation, ShapeDef, ShapeMatrix, SpawnOutcome, TickOutcome,
};

fn tiny_config(shapes: Vec<ShapeDef>) -> Config {
    Config {
        playable_width: 4,
        playable_height: 4,
        max_piece_size: 2,
        shapes,
        ..Config::default()
    }
}

fn drop_to_floor(piece: &mut ActivePiece, field: &PlayField) {
    while piece.try_fall(field) == brickfall_core::FallOutcome::Fell {}
}

#[test]
fn two_flat_pieces_clear_the_bottom_row() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    let flat = PieceType::new("flat", ShapeMatrix::build(&["00", "11"], 2).unwrap());

    let mut left = ActivePiece::try_spawn(&flat, &field).unwrap();
    assert!(left.try_move(&field, Direction::Left));
    drop_to_floor(&mut left, &field);
    let span = left.lock(&mut field);
    assert_eq!(clear_lines(&mut field, span).count(), 0);

    let mut right = ActivePiece::try_spawn(&flat, &field).unwrap();
    assert!(right.try_move(&field, Direction::Right));
    drop_to_floor(&mut right, &field);
    let span = right.lock(&mut field);
    assert!(field.is_row_full(1));

    let report = clear_lines(&mut field, span);
    assert_eq!(report.count(), 1);
    assert_eq!(report.rows, vec![1]);
    for x in field.playable_columns() {
        assert_eq!(field.get_cell(x, 1), Some(Cell::Empty));
    }
    assert_eq!(field.stack_count(), 0);
}

#[test]
fn clear_shifts_the_stack_above_down() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    // some debris that the completed row will pull down
    field.set_cell(3, 2, Cell::Occupied);
    field.set_cell(3, 3, Cell::Occupied);
    field.set_cell(4, 3, Cell::Occupied);

    let flat = ShapeMatrix::build(&["00", "11"], 2).unwrap();
    field.commit(&flat, Point2::new(2, 2));
    field.commit(&flat, Point2::new(4, 2));

    let report = clear_lines(&mut field, brickfall_core::clear::RowSpan::for_piece(2, 2));
    assert_eq!(report.count(), 1);
    assert_eq!(field.get_cell(3, 1), Some(Cell::Occupied));
    assert_eq!(field.get_cell(3, 2), Some(Cell::Occupied));
    assert_eq!(field.get_cell(4, 2), Some(Cell::Occupied));
    assert_eq!(field.get_cell(3, 3), Some(Cell::Empty));
    assert_eq!(field.stack_count(), 3);
}

#[test]
fn two_o_pieces_clear_two_rows_through_the_session() {
    let mut session = GameSession::with_seed(tiny_config(vec![ShapeDef::new("O", &["11", "11"])]), 9).unwrap();
    assert_eq!(session.spawn_next(), SpawnOutcome::Spawned);

    assert_eq!(session.move_left(), CommandOutcome::Applied);
    let first = loop {
        if let TickOutcome::Locked(report) = session.advance_fall() {
            break report;
        }
    };
    assert_eq!(first.rows_cleared(), 0);

    assert_eq!(session.move_right(), CommandOutcome::Applied);
    let second = loop {
        if let TickOutcome::Locked(report) = session.advance_fall() {
            break report;
        }
    };
    // both rows the pieces cover are full; the cascade removes them at the same index
    assert_eq!(second.cleared.rows, vec![1, 1]);
    assert!(!second.game_over);
    assert_eq!(session.field().stack_count(), 0);
    assert_eq!(session.total_rows_cleared(), 2);
}

#[test]
fn move_left_against_the_wall_is_rejected() {
    let mut session = GameSession::with_seed(tiny_config(vec![ShapeDef::new("O", &["11", "11"])]), 2).unwrap();
    session.spawn_next();

    assert_eq!(session.move_left(), CommandOutcome::Applied);
    let pos = session.active_piece().map(ActivePiece::pos);
    assert_eq!(pos, Some(Point2::new(2, 5)));

    assert_eq!(session.move_left(), CommandOutcome::Rejected);
    assert_eq!(session.active_piece().map(ActivePiece::pos), pos);
}

#[test]
fn rotation_into_the_wall_is_rejected() {
    let config = Config {
        playable_width: 4,
        playable_height: 6,
        max_piece_size: 4,
        shapes: vec![ShapeDef::new("I", &["0010", "0010", "0010", "0010"])],
        ..Config::default()
    };
    let mut session = GameSession::with_seed(config, 4).unwrap();
    session.spawn_next();
    session.advance_fall();

    while session.move_right().is_applied() {}
    let before = session.piece_snapshot().unwrap();
    // the bar sits in the last playable column; lying down it would reach into the wall
    assert_eq!(before.x, 5);

    assert_eq!(session.rotate(), CommandOutcome::Rejected);
    let after = session.piece_snapshot().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.rotation, Rotation::None);

    // one step away from the wall there is room
    assert_eq!(session.move_left(), CommandOutcome::Applied);
    assert_eq!(session.rotate(), CommandOutcome::Applied);
    assert_eq!(session.piece_snapshot().unwrap().rotation, Rotation::CW);
}

#[test]
fn snapshots_serialize_for_renderers() {
    let mut session = GameSession::with_seed(tiny_config(vec![ShapeDef::new("O", &["11", "11"])]), 2).unwrap();
    session.spawn_next();
    session.rotate();

    let piece = serde_json::to_value(session.piece_snapshot().unwrap()).unwrap();
    assert_eq!(piece["name"], "O");
    assert_eq!(piece["rotation"], 1);
    assert_eq!(piece["rows"], serde_json::json!(["11", "11"]));

    let field = serde_json::to_value(session.field_snapshot(false)).unwrap();
    assert_eq!(field["width"], 4);
    assert_eq!(field["height"], 5);
}
