use std::env;
use std::fs;
use std::path::Path;
use std::process;

use log::{LevelFilter, Metadata, Record};
use timewise::{ReaderOptions, Timeline};

const USAGE: &str = "Usage: timewise [--config <options.yaml>] [--yaml] [--verbose] <input.musicxml> [output]";
const ACCEPTED_EXTENSIONS: &[&str] = &["xml", "musicxml"];

/// Writes log records to stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct Args {
    config: Option<String>,
    yaml: bool,
    verbose: bool,
    input: String,
    output: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut config = None;
    let mut yaml = false;
    let mut verbose = false;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config = Some(path.clone()),
                None => return Err("--config needs a path".to_string()),
            },
            "--yaml" => yaml = true,
            "--verbose" => verbose = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown flag '{}'", flag)),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let input = positional.next().ok_or_else(|| USAGE.to_string())?;
    let output = positional.next();
    if positional.next().is_some() {
        return Err(USAGE.to_string());
    }

    Ok(Args {
        config,
        yaml,
        verbose,
        input,
        output,
    })
}

fn has_accepted_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            ACCEPTED_EXTENSIONS.iter().any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

fn render(timeline: &Timeline, yaml: bool) -> Result<String, String> {
    if yaml {
        serde_yaml::to_string(timeline).map_err(|e| e.to_string())
    } else {
        serde_json::to_string_pretty(timeline).map_err(|e| e.to_string())
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    if args.verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }

    let options = match &args.config {
        Some(path) => {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("Error reading options '{}': {}", path, e);
                    process::exit(1);
                }
            };
            match ReaderOptions::from_yaml(&content) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        None => ReaderOptions::default(),
    };

    if !has_accepted_extension(&args.input) {
        eprintln!(
            "Unsupported file '{}': expected a .xml or .musicxml document",
            args.input
        );
        process::exit(1);
    }

    // Read input file
    let source = match fs::read_to_string(&args.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", args.input, e);
            process::exit(1);
        }
    };

    let timeline = match timewise::read_timeline_with_options(&source, &options) {
        Ok(timeline) => timeline,
        Err(e) => {
            eprintln!("Read error: {}", e);
            process::exit(1);
        }
    };

    let rendered = match render(&timeline, args.yaml) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("Error serializing timeline: {}", e);
            process::exit(1);
        }
    };

    // Output
    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote {} timecodes to {}", timeline.len(), path);
        }
        None => {
            println!("{}", rendered);
        }
    }
}
