use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sw_ast::{Config, Transform, TransformSet};
use sw_desugar::{desugar_module, Event, EventLog, RUNTIME_SOURCE};
use sw_parser::{emit_module, parse_source, ParseResult};
use swc_common::BytePos;

mod logging;

#[derive(Parser)]
#[command(name = "sw", about = "sweetener: defer, println and strict equality for JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a file and emit standard JavaScript/TypeScript.
    Transform {
        /// Input .js/.ts/.jsx/.tsx file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print every rewrite to stderr.
        #[arg(long)]
        debug: bool,
        /// Only run these transforms.
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<Transform>>,
        /// JSON configuration file, e.g. `{"transforms": ["defer"]}`.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write a source map next to the output.
        #[arg(long)]
        source_map: bool,
    },
    /// Parse the file and report any syntax errors.
    Check { input: PathBuf },
    /// Run the transforms without writing output and list what they would do.
    Analyze {
        input: PathBuf,
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<Transform>>,
        /// One JSON object per event instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Parse and dump the AST.
    Parse {
        input: PathBuf,
        /// JSON instead of Rust debug output.
        #[arg(long)]
        ast: bool,
    },
    /// Print the `sweetener/runtime` module.
    Runtime,
}

/// An event with its position resolved against the input file.
#[derive(Serialize)]
struct Located<'a> {
    line: usize,
    column: usize,
    #[serde(flatten)]
    event: &'a Event,
}

fn read_input(input: &Path) -> Result<(String, String)> {
    let source = std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    Ok((source, input.display().to_string()))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn locate<'a>(parsed: &ParseResult, event: &'a Event) -> Located<'a> {
    let loc = parsed.source_map.lookup_char_pos(BytePos(event.range().lo));
    Located {
        line: loc.line,
        column: loc.col_display + 1,
        event,
    }
}

fn print_events(parsed: &ParseResult, filename: &str, events: &[Event]) {
    for event in events {
        let located = locate(parsed, event);
        eprintln!(
            "{filename}:{}:{}: [{}] {event}",
            located.line,
            located.column,
            event.transform()
        );
    }
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            input,
            output,
            debug,
            only,
            config,
            source_map,
        } => {
            let (source, filename) = read_input(&input)?;
            let mut config = load_config(config.as_deref())?;
            config.debug |= debug;
            if let Some(only) = only {
                config.transforms = only.into_iter().collect();
            }

            let parsed = parse_source(&source, &filename)?;
            let mut log = EventLog::new();
            let desugared = desugar_module(parsed.module.clone(), config.transforms, &mut log)?;
            tracing::info!(file = %filename, rewrites = desugared.rewrites, "transformed");
            if config.debug {
                print_events(&parsed, &filename, log.events());
            }

            let (code, map) = if desugared.rewrites == 0 && !source_map {
                (source, None)
            } else {
                let emitted = emit_module(&desugared.module, &parsed.source_map, Some(&parsed.comments), source_map)?;
                (emitted.code, emitted.source_map)
            };

            match &output {
                Some(path) => std::fs::write(path, &code).with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{code}"),
            }

            if let Some(map) = map {
                let map_path = match &output {
                    Some(path) => format!("{}.map", path.display()),
                    None => format!("{filename}.map"),
                };
                std::fs::write(&map_path, map)?;
                tracing::debug!(path = %map_path, "wrote source map");
                eprintln!("Source map written to {map_path}");
            }
        }
        Commands::Check { input } => {
            let (source, filename) = read_input(&input)?;
            parse_source(&source, &filename)?;
            eprintln!("OK: {filename}");
        }
        Commands::Analyze { input, only, json } => {
            let (source, filename) = read_input(&input)?;
            let transforms = only.map_or_else(TransformSet::default, |only| only.into_iter().collect());

            let parsed = parse_source(&source, &filename)?;
            let mut log = EventLog::new();
            let desugared = desugar_module(parsed.module.clone(), transforms, &mut log)?;

            if json {
                for event in log.events() {
                    println!("{}", serde_json::to_string(&locate(&parsed, event))?);
                }
            } else {
                print_events(&parsed, &filename, log.events());
                eprintln!(
                    "{filename}: {} rewrite(s): {} equality, {} println, {} defer",
                    desugared.rewrites,
                    log.count(Transform::Equality),
                    log.count(Transform::Println),
                    log.count(Transform::Defer),
                );
            }
        }
        Commands::Parse { input, ast } => {
            let (source, filename) = read_input(&input)?;
            let parsed = parse_source(&source, &filename)?;

            if ast {
                let json = serde_json::to_string_pretty(&parsed.module)?;
                println!("{json}");
            } else {
                println!("{:#?}", parsed.module);
            }
        }
        Commands::Runtime => print!("{RUNTIME_SOURCE}"),
    }

    Ok(())
}
