use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use regexgen::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use regexgen::{generate, Error, GenerationConfig, Generator, PatternOptions, Program};

/// Generate strings that match a regular expression
#[derive(Parser, Debug)]
#[command(name = "regexgen", version)]
#[command(about = "Generate strings that match a regular expression", long_about = None)]
struct Args {
    /// Pattern to generate from
    #[arg(value_name = "PATTERN")]
    pattern: Option<String>,

    /// Read patterns from a file, one per line
    #[arg(short = 'f', long = "file", value_name = "FILE", conflicts_with_all = ["pattern", "program"])]
    file: Option<PathBuf>,

    /// Run a compiled program (JSON, as written by --dump) without verifying the output
    #[arg(long, value_name = "FILE", conflicts_with = "pattern")]
    program: Option<PathBuf>,

    /// Seed for the first string; later strings and retries use the following seeds
    #[arg(short, long)]
    seed: Option<u64>,

    /// Strings to generate per pattern
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Seeds to try per string before giving up
    #[arg(long, default_value_t = 1)]
    attempts: usize,

    /// Characters to draw free choices from
    #[arg(long)]
    alphabet: Option<String>,

    /// Upper bound on the optional part of bounded repeats
    #[arg(long)]
    cap: Option<usize>,

    /// Character written for \b
    #[arg(long)]
    boundary: Option<char>,

    /// JSON file with generation settings; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    #[arg(short = 'i', long)]
    ignore_case: bool,

    #[arg(short = 'm', long)]
    multi_line: bool,

    #[arg(long)]
    dot_all: bool,

    /// Print the compiled program as JSON before generating
    #[arg(long)]
    dump: bool,

    /// Trace every executed instruction to stderr
    #[arg(long)]
    debug: bool,

    /// Print results as hex-encoded UTF-8
    #[arg(long)]
    hex: bool,

    /// Report errors as JSON lines
    #[arg(long)]
    json: bool,

    /// Explain an error code, e.g. RGX-G001
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,

    /// List every error code
    #[arg(long)]
    list_errors: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(code) = &args.explain {
        return match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                ExitCode::SUCCESS
            }
            None => {
                report(&Diagnostic::error(format!("unknown error code '{code}'")), args.json);
                ExitCode::FAILURE
            }
        };
    }
    if args.list_errors {
        for entry in registry::REGISTRY {
            println!("{}  {}", entry.code, entry.short);
        }
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(d) => {
            report(&d, args.json);
            return ExitCode::FAILURE;
        }
    };

    let ok = if let Some(path) = &args.program {
        run_program(&args, path, &config)
    } else {
        match patterns(&args) {
            Ok(patterns) => {
                let mut ok = true;
                for pattern in &patterns {
                    ok &= run_pattern(&args, pattern, &config);
                }
                ok
            }
            Err(d) => {
                report(&d, args.json);
                false
            }
        }
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn load_config(args: &Args) -> Result<GenerationConfig, Diagnostic> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path).map_err(|e| Diagnostic::error(e.to_string()))?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(alphabet) = &args.alphabet {
        config = config.with_alphabet(alphabet.chars());
    }
    if let Some(cap) = args.cap {
        config.repetition_cap = cap;
    }
    if let Some(c) = args.boundary {
        config.boundary_char = c;
    }
    if args.debug {
        config.debug = true;
    }
    Ok(config)
}

fn patterns(args: &Args) -> Result<Vec<String>, Diagnostic> {
    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Diagnostic::error(format!("cannot read {}: {e}", path.display())))?;
        return Ok(text.lines().filter(|l| !l.is_empty()).map(str::to_string).collect());
    }
    match &args.pattern {
        Some(p) => Ok(vec![p.clone()]),
        None => Err(Diagnostic::error("no pattern given")
            .with_suggestion("pass a PATTERN, --file FILE or --program FILE")),
    }
}

fn options(args: &Args) -> PatternOptions {
    PatternOptions::default()
        .case_insensitive(args.ignore_case)
        .multi_line(args.multi_line)
        .dot_matches_new_line(args.dot_all)
}

fn run_pattern(args: &Args, pattern: &str, config: &GenerationConfig) -> bool {
    let generator = match Generator::with_options(pattern, options(args)) {
        Ok(g) => g,
        Err(e) => {
            report(&Diagnostic::from(&e).with_source(pattern), args.json);
            return false;
        }
    };
    if args.dump && !dump(generator.program(), args.json) {
        return false;
    }
    produce(args, config, |cfg| generator.generate(cfg), pattern)
}

fn run_program(args: &Args, path: &Path, config: &GenerationConfig) -> bool {
    let program = match std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))
        .and_then(|text| {
            serde_json::from_str::<Program>(&text).map_err(|e| format!("invalid program {}: {e}", path.display()))
        }) {
        Ok(p) => p,
        Err(message) => {
            report(&Diagnostic::error(message), args.json);
            return false;
        }
    };
    if args.dump && !dump(&program, args.json) {
        return false;
    }
    produce(args, config, |cfg| generate(&program, cfg).map_err(Error::from), "")
}

/// Generate `--count` strings, trying up to `--attempts` consecutive seeds for each.
fn produce<F>(args: &Args, config: &GenerationConfig, run: F, source: &str) -> bool
where
    F: Fn(&GenerationConfig) -> Result<String, Error>,
{
    let mut cfg = config.clone();
    let mut ok = true;
    for _ in 0..args.count {
        let mut result = Err(None);
        for _ in 0..args.attempts.max(1) {
            result = run(&cfg).map_err(Some);
            cfg.seed = cfg.seed.wrapping_add(1);
            if result.is_ok() {
                break;
            }
        }
        match result {
            Ok(output) if args.hex => println!("{}", hex(&output)),
            Ok(output) => println!("{output}"),
            Err(Some(e)) => {
                let mut d = Diagnostic::from(&e);
                if !source.is_empty() {
                    d = d.with_source(source);
                }
                report(&d, args.json);
                ok = false;
            }
            Err(None) => ok = false,
        }
    }
    ok
}

fn dump(program: &Program, as_json_error: bool) -> bool {
    match serde_json::to_string_pretty(program) {
        Ok(text) => {
            println!("{text}");
            true
        }
        Err(e) => {
            report(&Diagnostic::error(format!("cannot serialize program: {e}")), as_json_error);
            false
        }
    }
}

fn hex(s: &str) -> String {
    s.bytes().map(|b| format!("{b:02x}")).collect()
}

fn report(d: &Diagnostic, as_json: bool) {
    if as_json {
        eprintln!("{}", json::render(d));
    } else {
        let renderer = AnsiRenderer { use_color: std::io::stderr().is_terminal() };
        eprint!("{}", renderer.render(d));
    }
}
