#[macro_use]
extern crate log;

mod render;
mod runner;

use crate::runner::{Limits, Runner, RunSummary, ScriptError};
use brickfall_core::{Config, ConfigError, FieldSnapshot, GameSession, PieceSnapshot};
use clap::{App, Arg, ArgMatches};
use log::LevelFilter;
use serde::Serialize;
use std::str::FromStr;
use std::{fs, io, process};
use thiserror::Error;

#[derive(Debug, Error)]
enum StartupError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid script: {0}")]
    Script(#[from] ScriptError),
    #[error("invalid value for --{name}: {value}")]
    Argument { name: &'static str, value: String },
    #[error("could not write output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct FinalState {
    summary: RunSummary,
    field: FieldSnapshot,
    piece: Option<PieceSnapshot>,
}

fn main() {
    let matches = App::new("brickfall")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plays a falling-block game from a command script")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON game configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for the piece sequence")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("script")
                .short("s")
                .long("script")
                .value_name("COMMANDS")
                .help("Commands such as \"left*2 rotate drop next\"")
                .takes_value(true)
                .conflicts_with("script-file"),
        )
        .arg(
            Arg::with_name("script-file")
                .long("script-file")
                .value_name("FILE")
                .help("Reads the commands from a file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("tick-rate")
                .long("tick-rate")
                .value_name("HZ")
                .help("Simulated frames per second")
                .default_value("60"),
        )
        .arg(
            Arg::with_name("max-ticks")
                .long("max-ticks")
                .value_name("N")
                .help("Stops after this many frames")
                .default_value("216000"),
        )
        .arg(
            Arg::with_name("max-pieces")
                .long("max-pieces")
                .value_name("N")
                .help("Stops after this many pieces have locked")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Prints the final state as JSON"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Logs more; repeat for even more"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .conflicts_with("verbose")
                .help("Logs errors only"),
        )
        .get_matches();

    let level = if matches.is_present("quiet") {
        LevelFilter::Error
    } else {
        match matches.occurrences_of("verbose") {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    if let Err(err) = setup_logger(level) {
        eprintln!("could not set up logging: {}", err);
        process::exit(1);
    }

    if let Err(err) = run(&matches) {
        error!("{}", err);
        process::exit(1);
    }
}

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                time::now().rfc3339(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), StartupError> {
    let config = match matches.value_of("config") {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let script = match (matches.value_of("script"), matches.value_of("script-file")) {
        (Some(script), _) => runner::parse_script(script)?,
        (None, Some(path)) => runner::parse_script(&read_file(path)?)?,
        (None, None) => Vec::new(),
    };

    let tick_rate: f64 = parse_arg(matches, "tick-rate")?.unwrap_or(60.);
    if !(tick_rate.is_finite() && tick_rate > 0.) {
        return Err(StartupError::Argument {
            name: "tick-rate",
            value: tick_rate.to_string(),
        });
    }
    let limits = Limits {
        max_ticks: parse_arg(matches, "max-ticks")?,
        max_pieces: parse_arg(matches, "max-pieces")?,
    };

    let session = match parse_arg::<u64>(matches, "seed")? {
        Some(seed) => GameSession::with_seed(config, seed)?,
        None => GameSession::new(config)?,
    };
    info!(
        "playing on {}x{} with {} piece types and {} scripted commands",
        session.config().playable_width,
        session.config().playable_height,
        session.piece_types().len(),
        script.len()
    );

    let mut runner = Runner::new(session, script, tick_rate);
    let summary = runner.run(&limits);

    if matches.is_present("json") {
        let state = FinalState {
            summary,
            field: runner.session().field_snapshot(false),
            piece: runner.session().piece_snapshot(),
        };
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render::render_board(runner.session()));
        println!("{}", summary);
    }
    Ok(())
}

fn read_file(path: &str) -> Result<String, StartupError> {
    fs::read_to_string(path).map_err(|source| StartupError::Read {
        path: path.to_string(),
        source,
    })
}

fn load_config(path: &str) -> Result<Config, StartupError> {
    let text = read_file(path)?;
    let config: Config = serde_json::from_str(&text).map_err(|source| StartupError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    debug!("loaded configuration from {}", path);
    Ok(config)
}

fn parse_arg<T: FromStr>(
    matches: &ArgMatches,
    name: &'static str,
) -> Result<Option<T>, StartupError> {
    match matches.value_of(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| StartupError::Argument {
                name,
                value: value.to_string(),
            }),
        None => Ok(None),
    }
}
