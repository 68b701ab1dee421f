//! Session configuration.

use crate::error::ConfigError;
use crate::field::PlayField;
use crate::piece::PieceType;
use crate::shape::ShapeMatrix;
use serde::{Deserialize, Serialize};

/// A piece definition: a name and rows of `'0'`/`'1'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl ShapeDef {
    pub fn new(name: &str, rows: &[&str]) -> ShapeDef {
        ShapeDef {
            name: name.to_string(),
            rows: rows.iter().map(|row| row.to_string()).collect(),
        }
    }
}

/// Everything a session needs to know up front. Fixed for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Columns between the walls.
    pub playable_width: usize,
    /// Rows between the floor and the spawn area.
    pub playable_height: usize,
    /// Largest allowed shape; also the wall width and spawn area height.
    pub max_piece_size: usize,
    /// Fall speed at the start, in rows per second.
    pub base_fall_speed: f64,
    /// Fall speed of a dropped piece, in rows per second.
    pub drop_fall_speed: f64,
    /// Seconds between repeated horizontal moves.
    pub move_repeat_delay: f64,
    pub rows_cleared_to_speedup: u32,
    pub speedup_increment: f64,
    pub shapes: Vec<ShapeDef>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            playable_width: 10,
            playable_height: 13,
            max_piece_size: 5,
            base_fall_speed: 2.,
            drop_fall_speed: 30.,
            move_repeat_delay: 0.1,
            rows_cleared_to_speedup: 10,
            speedup_increment: 0.5,
            shapes: default_shapes(),
        }
    }
}

/// The seven tetrominoes.
pub fn default_shapes() -> Vec<ShapeDef> {
    vec![
        ShapeDef::new("I", &["0000", "1111", "0000", "0000"]),
        ShapeDef::new("J", &["100", "111", "000"]),
        ShapeDef::new("L", &["001", "111", "000"]),
        ShapeDef::new("O", &["11", "11"]),
        ShapeDef::new("S", &["011", "110", "000"]),
        ShapeDef::new("T", &["010", "111", "000"]),
        ShapeDef::new("Z", &["110", "011", "000"]),
    ]
}

fn check_speed(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpeed { name, value })
    }
}

impl Config {
    /// Checks the configuration and builds the empty field and the piece registry.
    pub fn build(&self) -> Result<(PlayField, Vec<PieceType>), ConfigError> {
        let field = PlayField::new(
            self.playable_width,
            self.playable_height,
            self.max_piece_size,
        )?;
        if self.max_piece_size < 2 {
            return Err(ConfigError::PieceSizeTooSmall(self.max_piece_size));
        }

        check_speed("baseFallSpeed", self.base_fall_speed)?;
        check_speed("dropFallSpeed", self.drop_fall_speed)?;
        if !(self.speedup_increment.is_finite() && self.speedup_increment >= 0.) {
            return Err(ConfigError::InvalidAmount {
                name: "speedupIncrement",
                value: self.speedup_increment,
            });
        }
        if !(self.move_repeat_delay.is_finite() && self.move_repeat_delay >= 0.) {
            return Err(ConfigError::InvalidAmount {
                name: "moveRepeatDelay",
                value: self.move_repeat_delay,
            });
        }
        if self.rows_cleared_to_speedup == 0 {
            return Err(ConfigError::ZeroSpeedupThreshold);
        }
        if self.shapes.is_empty() {
            return Err(ConfigError::NoShapes);
        }

        let mut registry = Vec::with_capacity(self.shapes.len());
        for (index, def) in self.shapes.iter().enumerate() {
            let shape = ShapeMatrix::build(&def.rows[..], self.max_piece_size).map_err(|source| {
                ConfigError::Shape {
                    index,
                    name: def.name.clone(),
                    source,
                }
            })?;
            // anything wider than the playable area would overlap a wall at spawn
            if shape.size() > self.playable_width {
                return Err(ConfigError::ShapeWiderThanField {
                    index,
                    name: def.name.clone(),
                    size: shape.size(),
                    width: self.playable_width,
                });
            }
            registry.push(PieceType::new(def.name.clone(), shape));
        }

        Ok((field, registry))
    }

    /// Checks the configuration without keeping the result.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build().map(|_| ())
    }
}

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    let (field, registry) = config.build().unwrap();
    assert_eq!(field.width(), 20);
    assert_eq!(field.height(), 18);
    assert_eq!(registry.len(), 7);
    assert!(registry.iter().all(|ty| ty.shape().cell_count() == 4));
}

#[test]
fn config_from_json_fills_defaults() {
    let config: Config = serde_json::from_str(
        r#"{
            "playableWidth": 4,
            "playableHeight": 4,
            "maxPieceSize": 2,
            "shapes": [{ "name": "O", "rows": ["11", "11"] }]
        }"#,
    )
    .unwrap();
    assert_eq!(config.playable_width, 4);
    assert_eq!(config.base_fall_speed, 2.);
    assert_eq!(config.rows_cleared_to_speedup, 10);
    assert_eq!(config.shapes, vec![ShapeDef::new("O", &["11", "11"])]);
    config.validate().unwrap();
}

#[test]
fn invalid_configs_are_rejected() {
    use crate::error::ShapeError;

    let mut config = Config::default();
    config.playable_height = 0;
    assert_eq!(
        config.validate(),
        Err(ConfigError::ZeroDimension("playableHeight"))
    );

    let mut config = Config::default();
    config.max_piece_size = 1;
    assert_eq!(config.validate(), Err(ConfigError::PieceSizeTooSmall(1)));

    let mut config = Config::default();
    config.base_fall_speed = 0.;
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidSpeed {
            name: "baseFallSpeed",
            value: 0.
        })
    );

    let mut config = Config::default();
    config.move_repeat_delay = -1.;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.rows_cleared_to_speedup = 0;
    assert_eq!(config.validate(), Err(ConfigError::ZeroSpeedupThreshold));

    let mut config = Config::default();
    config.shapes.clear();
    assert_eq!(config.validate(), Err(ConfigError::NoShapes));

    let mut config = Config::default();
    config.max_piece_size = 3;
    assert_eq!(
        config.validate(),
        Err(ConfigError::Shape {
            index: 0,
            name: "I".to_string(),
            source: ShapeError::TooLarge { size: 4, max: 3 },
        })
    );

    let mut config = Config::default();
    config.shapes.push(ShapeDef::new("bad", &["10", "1"]));
    assert_eq!(
        config.validate(),
        Err(ConfigError::Shape {
            index: 7,
            name: "bad".to_string(),
            source: ShapeError::NotSquare {
                row: 1,
                len: 1,
                size: 2
            },
        })
    );

    let mut config = Config::default();
    config.shapes.push(ShapeDef::new("blank", &["00", "00"]));
    assert_eq!(
        config.validate(),
        Err(ConfigError::Shape {
            index: 7,
            name: "blank".to_string(),
            source: ShapeError::Empty,
        })
    );

    let mut config = Config::default();
    config.playable_width = 3;
    assert_eq!(
        config.validate(),
        Err(ConfigError::ShapeWiderThanField {
            index: 0,
            name: "I".to_string(),
            size: 4,
            width: 3,
        })
    );
}
