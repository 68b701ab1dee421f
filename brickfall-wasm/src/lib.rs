use brickfall_core::{
    ActivePiece, CommandOutcome, Config, GameSession, Shape, SpawnOutcome,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::throw_str;

#[wasm_bindgen(js_name = GameSession)]
pub struct JsGameSession(GameSession);

#[wasm_bindgen(js_name = ActivePiece)]
pub struct JsActivePiece(ActivePiece);

#[wasm_bindgen(js_class = ActivePiece)]
impl JsActivePiece {
    pub fn name(&self) -> String {
        self.0.name().to_string()
    }

    #[wasm_bindgen(js_name = "posX")]
    pub fn pos_x(&self) -> isize {
        self.0.pos().x
    }

    #[wasm_bindgen(js_name = "posY")]
    pub fn pos_y(&self) -> isize {
        self.0.pos().y
    }

    /// Number of clockwise turns from the registered orientation.
    pub fn rotation(&self) -> usize {
        self.0.rotation().cw_steps()
    }

    #[wasm_bindgen(js_name = "isDropped")]
    pub fn is_dropped(&self) -> bool {
        self.0.is_dropped()
    }

    /// Field coordinates of the occupied cells as a flat `[x0, y0, x1, y1, ...]` list.
    #[wasm_bindgen(js_name = "getTiles")]
    pub fn tiles(&self) -> Box<[isize]> {
        let pos = self.0.pos();
        self.0
            .iter_cells()
            .map(|cell| pos.shape_cell(cell))
            .flat_map(|p| vec![p.x, p.y])
            .collect()
    }
}

/// Creates a session from a JSON configuration, or the default one if `config` is null.
///
/// `seed` may be a number for a repeatable piece sequence, or null.
#[wasm_bindgen(js_name = "createSession")]
pub fn create_session(config: JsValue, seed: JsValue) -> JsGameSession {
    let config = if let Some(s) = config.as_string() {
        match serde_json::from_str::<Config>(&s) {
            Ok(config) => config,
            Err(err) => throw_str(&format!("invalid configuration: {}", err)),
        }
    } else if config.is_null() || config.is_undefined() {
        Config::default()
    } else {
        throw_str("configuration must be a JSON string or null");
    };

    let session = if let Some(seed) = seed.as_f64() {
        GameSession::with_seed(config, seed as u64)
    } else if seed.is_null() || seed.is_undefined() {
        GameSession::new(config)
    } else {
        throw_str("seed must be a number or null");
    };

    match session {
        Ok(session) => JsGameSession(session),
        Err(err) => throw_str(&format!("invalid configuration: {}", err)),
    }
}

fn command_name(outcome: CommandOutcome) -> &'static str {
    match outcome {
        CommandOutcome::Applied => "applied",
        CommandOutcome::Rejected => "rejected",
        CommandOutcome::SessionOver => "session-over",
    }
}

#[wasm_bindgen(js_class = GameSession)]
impl JsGameSession {
    /// Returns one of `spawned`, `already-active`, `game-over` or `session-over`.
    #[wasm_bindgen(js_name = "spawnNext")]
    pub fn spawn_next(&mut self) -> String {
        match self.0.spawn_next() {
            SpawnOutcome::Spawned => "spawned",
            SpawnOutcome::AlreadyActive => "already-active",
            SpawnOutcome::GameOver => "game-over",
            SpawnOutcome::SessionOver => "session-over",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = "moveLeft")]
    pub fn move_left(&mut self) -> String {
        command_name(self.0.move_left()).to_string()
    }

    #[wasm_bindgen(js_name = "moveRight")]
    pub fn move_right(&mut self) -> String {
        command_name(self.0.move_right()).to_string()
    }

    pub fn rotate(&mut self) -> String {
        command_name(self.0.rotate()).to_string()
    }

    #[wasm_bindgen(js_name = "dropPiece")]
    pub fn drop_piece(&mut self) -> String {
        command_name(self.0.drop_piece()).to_string()
    }

    /// Runs one gravity step and returns the outcome as JSON.
    #[wasm_bindgen(js_name = "advanceFall")]
    pub fn advance_fall(&mut self) -> String {
        match serde_json::to_string(&self.0.advance_fall()) {
            Ok(s) => s,
            Err(err) => throw_str(&err.to_string()),
        }
    }

    #[wasm_bindgen(js_name = "isGameOver")]
    pub fn is_game_over(&self) -> bool {
        self.0.is_game_over()
    }

    #[wasm_bindgen(js_name = "fallSpeed")]
    pub fn fall_speed(&self) -> f64 {
        self.0.fall_speed()
    }

    #[wasm_bindgen(js_name = "effectiveFallSpeed")]
    pub fn effective_fall_speed(&self) -> f64 {
        self.0.effective_fall_speed()
    }

    #[wasm_bindgen(js_name = "moveRepeatDelay")]
    pub fn move_repeat_delay(&self) -> f64 {
        self.0.config().move_repeat_delay
    }

    #[wasm_bindgen(js_name = "totalRowsCleared")]
    pub fn total_rows_cleared(&self) -> usize {
        self.0.total_rows_cleared()
    }

    #[wasm_bindgen(js_name = "piecesLocked")]
    pub fn pieces_locked(&self) -> usize {
        self.0.pieces_locked()
    }

    #[wasm_bindgen(js_name = "getActivePiece")]
    pub fn active_piece(&self) -> Option<JsActivePiece> {
        self.0.active_piece().cloned().map(JsActivePiece)
    }

    #[wasm_bindgen(js_name = "getFieldWidth")]
    pub fn field_width(&self) -> usize {
        self.0.field().width()
    }

    #[wasm_bindgen(js_name = "getFieldHeight")]
    pub fn field_height(&self) -> usize {
        self.0.field().height()
    }

    #[wasm_bindgen(js_name = "getFieldBorder")]
    pub fn field_border(&self) -> usize {
        self.0.field().border()
    }

    /// Occupancy as one byte per cell, row by row from the floor up.
    #[wasm_bindgen(js_name = "getCells")]
    pub fn cells(&self, include_border: bool) -> Box<[u8]> {
        self.0
            .field_snapshot(include_border)
            .cells
            .iter()
            .map(|occupied| *occupied as u8)
            .collect()
    }

    #[wasm_bindgen(js_name = "getFieldText")]
    pub fn field_text(&self) -> String {
        self.0.field().to_string()
    }
}
