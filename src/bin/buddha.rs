// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use bigbuddha::config::{parse_complex, parse_pair, MIN_PRECISION};
use bigbuddha::{scheduler, Config, Engine};
use clap::{App, Arg, ArgMatches};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const MAXFILE: &str = "max-file";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const PRECISION: &str = "precision";
const CYCLESIZE: &str = "cycle-size";
const CYCLES: &str = "cycles";
const LANES: &str = "lanes";
const ENDLESS: &str = "endless";
const WARMSTART: &str = "warm-start";
const RENDEREVERY: &str = "render-every";
const STATSEVERY: &str = "stats-every";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get() * 4;
    let max_precision = rug::float::prec_max();

    App::new("buddha")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Stochastic arbitrary-precision Buddhabrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("buddhabrot.png")
                .help("Output image, also read back on a warm start"),
        )
        .arg(
            Arg::with_name(MAXFILE)
                .long(MAXFILE)
                .short("m")
                .takes_value(true)
                .default_value("max.txt")
                .help("Sidecar holding the maximum hit count of the last render"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1000x500")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,-1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the viewport"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2.0,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the viewport"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of cycles sampled at once [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum iterations per orbit"),
        )
        .arg(
            Arg::with_name(PRECISION)
                .long(PRECISION)
                .short("p")
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        MIN_PRECISION,
                        max_precision,
                        "Could not parse precision",
                        &format!(
                            "Precision must be between {} and {} bits",
                            MIN_PRECISION, max_precision
                        ),
                    )
                })
                .help("Bits of mantissa for every arbitrary-precision value"),
        )
        .arg(
            Arg::with_name(CYCLESIZE)
                .long(CYCLESIZE)
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse cycle size",
                        "Cycle size must be between 1 and 10000000",
                    )
                })
                .help("Random seeds drawn per cycle"),
        )
        .arg(
            Arg::with_name(CYCLES)
                .long(CYCLES)
                .short("n")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    usize::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse cycle count".to_string())
                })
                .help("Number of cycles to run; ignored in endless mode"),
        )
        .arg(
            Arg::with_name(LANES)
                .long(LANES)
                .takes_value(true)
                .default_value("500")
                .validator(move |s| {
                    validate_range(
                        &s,
                        2,
                        10_000,
                        "Could not parse lane count",
                        "Lane count must be between 2 and 10000",
                    )
                })
                .help("Lattice points per axis in the sampling grid"),
        )
        .arg(
            Arg::with_name(RENDEREVERY)
                .long(RENDEREVERY)
                .takes_value(true)
                .default_value("2")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1_u64,
                        86_400,
                        "Could not parse render interval",
                        "Render interval must be between 1 and 86400 seconds",
                    )
                })
                .help("Seconds between checkpoints"),
        )
        .arg(
            Arg::with_name(STATSEVERY)
                .long(STATSEVERY)
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1_u64,
                        86_400,
                        "Could not parse stats interval",
                        "Stats interval must be between 1 and 86400 seconds",
                    )
                })
                .help("Seconds between status lines"),
        )
        .arg(
            Arg::with_name(ENDLESS)
                .long(ENDLESS)
                .short("e")
                .help("Sample until enter is pressed; --cycles is ignored"),
        )
        .arg(
            Arg::with_name(WARMSTART)
                .long(WARMSTART)
                .short("w")
                .help("Resume from the output image and max file"),
        )
        .get_matches()
}

// Every value has already been through a validator, so parse failures
// here are impossible; fall back to the defaults regardless.
fn config(matches: &ArgMatches) -> Config {
    let defaults = Config::default();
    let number = |name: &str, fallback: usize| {
        matches
            .value_of(name)
            .and_then(|s| usize::from_str(s).ok())
            .unwrap_or(fallback)
    };
    let seconds = |name: &str, fallback: Duration| {
        matches
            .value_of(name)
            .and_then(|s| u64::from_str(s).ok())
            .map(Duration::from_secs)
            .unwrap_or(fallback)
    };
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<usize>(s, 'x'))
        .unwrap_or((defaults.width, defaults.height));

    Config {
        precision: matches
            .value_of(PRECISION)
            .and_then(|s| u32::from_str(s).ok())
            .unwrap_or(defaults.precision),
        max_iterations: number(ITERATIONS, defaults.max_iterations),
        cycle_size: number(CYCLESIZE, defaults.cycle_size),
        n_cycles: number(CYCLES, defaults.n_cycles),
        max_concurrency: number(THREADS, defaults.max_concurrency),
        endless: matches.is_present(ENDLESS),
        warm_start: matches.is_present(WARMSTART),
        width,
        height,
        leftlower: matches
            .value_of(LEFTLOWER)
            .and_then(parse_complex)
            .unwrap_or(defaults.leftlower),
        rightupper: matches
            .value_of(RIGHTUPPER)
            .and_then(parse_complex)
            .unwrap_or(defaults.rightupper),
        grid_lanes: number(LANES, defaults.grid_lanes),
        image_path: matches
            .value_of(OUTPUT)
            .map(PathBuf::from)
            .unwrap_or_else(|| defaults.image_path.clone()),
        max_path: matches
            .value_of(MAXFILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| defaults.max_path.clone()),
        render_interval: seconds(RENDEREVERY, defaults.render_interval),
        stats_interval: seconds(STATSEVERY, defaults.stats_interval),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config(&args());
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }
    info!(
        "Creating image with resolution {} x {}",
        config.width, config.height
    );

    let endless = config.endless;
    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let quit = Arc::new(AtomicBool::new(false));
    if endless {
        scheduler::quit_on_input(quit.clone());
    }

    match scheduler::run(&engine, &quit) {
        Ok(stats) => info!("Done: {}", stats),
        Err(e) => {
            error!("Render failure: {}", e);
            std::process::exit(1);
        }
    }
}
