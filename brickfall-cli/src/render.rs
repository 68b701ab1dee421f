//! Text rendering.

use brickfall_core::{GameSession, Shape};

const EMPTY: char = '.';
const STACK: char = '#';
const PIECE: char = '@';

/// Draws the playable area with the falling piece on top, top row first.
pub fn render_board(session: &GameSession) -> String {
    let snapshot = session.field_snapshot(false);
    let mut rows: Vec<Vec<char>> = (0..snapshot.height)
        .map(|y| {
            (0..snapshot.width)
                .map(|x| match snapshot.get(x, y) {
                    Some(true) => STACK,
                    _ => EMPTY,
                })
                .collect()
        })
        .collect();

    if let Some(piece) = session.active_piece() {
        let border = session.field().border() as isize;
        for cell in piece.iter_cells() {
            let pos = piece.pos().shape_cell(cell);
            // snapshot row 0 is the first row above the floor
            let (x, y) = (pos.x - border, pos.y - 1);
            if x >= 0 && y >= 0 {
                if let Some(c) = rows.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
                    *c = PIECE;
                }
            }
        }
    }

    let mut out = String::new();
    for row in rows.iter().rev() {
        out.push('|');
        out.extend(row.iter());
        out.push_str("|\n");
    }
    out.push('+');
    out.extend(std::iter::repeat('-').take(snapshot.width));
    out.push_str("+\n");
    out
}

#[test]
fn board_shows_stack_and_piece() {
    use brickfall_core::{Config, ShapeDef};

    let config = Config {
        playable_width: 4,
        playable_height: 4,
        max_piece_size: 2,
        shapes: vec![ShapeDef::new("D", &["00", "11"])],
        ..Config::default()
    };
    let mut session = GameSession::with_seed(config, 1).unwrap();
    assert_eq!(
        render_board(&session),
        "|....|\n|....|\n|....|\n|....|\n|....|\n+----+\n"
    );

    session.spawn_next();
    session.move_left();
    session.drop_piece();
    while session.advance_fall() == brickfall_core::TickOutcome::Fell {}
    // the first piece is in the stack, the second hangs at the top
    assert_eq!(
        render_board(&session),
        "|....|\n|.@@.|\n|....|\n|....|\n|##..|\n+----+\n"
    );
}
