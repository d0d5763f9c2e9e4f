//! minx front-end CLI.
//!
//! Parses one source file and prints its syntax tree, or checks every
//! file under the test directory with `--test`. Exit status 1 means
//! the input was rejected; the diagnostic goes to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use minx_ast::Expr;
use minx_diag::Diagnostic;
use minx_syntax::{Lexer, Reader, Token, parse_source};

/// Directory scanned by `--test`, relative to the working directory.
const TEST_DIR: &str = "testfiles";

#[derive(Parser)]
#[command(name = "minx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Front end for the minx language", long_about = None)]
struct Cli {
    /// Source file to parse
    #[arg(required_unless_present = "test")]
    file: Option<PathBuf>,

    /// How much to print: error, warning, info, or debug
    #[arg(short = 'l', long, default_value = "warning", value_parser = parse_loglevel)]
    loglevel: LogLevel,

    /// Parse every .minx file under the test directory instead
    #[arg(short = 't', long)]
    test: bool,
}

/// Output levels, quietest first. `error` prints nothing on success,
/// `warning` adds the syntax tree, `info` adds declaration counts, and
/// `debug` adds the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

fn parse_loglevel(s: &str) -> Result<LogLevel, String> {
    match s.to_lowercase().as_str() {
        "error" => Ok(LogLevel::Error),
        "warning" => Ok(LogLevel::Warning),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        _ => Err(format!(
            "invalid loglevel '{s}', expected 'error', 'warning', 'info', or 'debug'"
        )),
    }
}

fn main() {
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    if cli.test {
        return run_test_directory(cli.loglevel);
    }
    let Some(file) = cli.file else {
        return Err("no input file".to_string());
    };
    parse_file(&file, cli.loglevel)
}

fn parse_file(path: &Path, loglevel: LogLevel) -> Result<(), String> {
    let source = fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    if loglevel >= LogLevel::Debug {
        dump_tokens(path, &source)?;
    }
    let tree = parse_source(&source).map_err(|diagnostic| located(path, &diagnostic))?;
    if loglevel >= LogLevel::Warning {
        println!("{tree:#?}");
    }
    if loglevel >= LogLevel::Info {
        println!("{} declarations", declaration_count(&tree));
    }
    Ok(())
}

/// Parses every `.minx` file under [`TEST_DIR`] in name order and
/// stops at the first failure.
fn run_test_directory(loglevel: LogLevel) -> Result<(), String> {
    let directory = Path::new(TEST_DIR);
    let entries = fs::read_dir(directory).map_err(|err| {
        format!(
            "failed to read test directory `{}`: {err}",
            directory.display()
        )
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to list `{}`: {err}", directory.display()))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("minx") {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        return Err(format!("no .minx files under `{}`", directory.display()));
    }
    for path in &paths {
        let source = fs::read_to_string(path)
            .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
        let tree = parse_source(&source).map_err(|diagnostic| located(path, &diagnostic))?;
        if loglevel >= LogLevel::Info {
            println!(
                "{}: ok ({} declarations)",
                path.display(),
                declaration_count(&tree)
            );
        } else if loglevel >= LogLevel::Warning {
            println!("{}: ok", path.display());
        }
    }
    println!("{} files parsed", paths.len());
    Ok(())
}

/// Relexes `source` and prints one token per line.
fn dump_tokens(path: &Path, source: &str) -> Result<(), String> {
    let mut lexer =
        Lexer::new(Reader::new(source)).map_err(|diagnostic| located(path, &diagnostic))?;
    loop {
        let token = lexer
            .get()
            .map_err(|diagnostic| located(path, &diagnostic))?;
        println!("{token:?}");
        if token == Token::FileEnd {
            return Ok(());
        }
    }
}

fn located(path: &Path, diagnostic: &Diagnostic) -> String {
    format!("{}: {diagnostic}", path.display())
}

fn declaration_count(tree: &Expr) -> usize {
    match tree {
        Expr::Scope(declarations) => declarations.len(),
        _ => 0,
    }
}
