use anyhow::Context;
use bumpalo::Bump;
use clap::{ArgAction, Parser, ValueEnum};
use php_front::ast::sexpr::SExprFormatter;
use php_front::lexer::Lexer;
use php_front::lexer::token::{Token, TokenKind, TypeClass};
use php_front::{Parser as PhpParser, ParserConfig};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["php", "phtml", "inc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Sexpr,
    Json,
}

/// Tokenize and parse PHP templates.
#[derive(Debug, Parser)]
#[command(name = "php-front")]
struct Args {
    /// Files, or directories searched for .php, .phtml and .inc files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Print every token, trivia included, instead of the syntax tree
    #[arg(long)]
    tokens: bool,

    #[arg(long, value_enum, default_value = "sexpr")]
    format: Format,

    /// Give up on a file after this many errors
    #[arg(long, default_value_t = 10)]
    max_errors: usize,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

struct Report {
    output: String,
    errors: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(args.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let files = collect_files(&args.paths);
    tracing::info!(files = files.len(), "collected input files");
    let config = ParserConfig::default().with_max_errors(args.max_errors);

    let reports: Vec<_> = files
        .par_iter()
        .map(|path| (path, process(path, &args, &config)))
        .collect();

    let mut failed = 0usize;
    for (path, report) in reports {
        match report {
            Ok(report) => {
                if !args.quiet {
                    if files.len() > 1 {
                        println!(";; {}", path.display());
                    }
                    print!("{}", report.output);
                }
                for error in &report.errors {
                    eprintln!("{error}");
                }
                if !report.errors.is_empty() {
                    failed += 1;
                }
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                failed += 1;
            }
        }
    }

    tracing::info!(files = files.len(), failed, "done");
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "php_front=warn",
        1 => "php_front=info",
        2 => "php_front=debug",
        _ => "php_front=trace",
    }
}

fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        files.extend(
            WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| has_template_extension(path)),
        );
    }
    files
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn process(path: &Path, args: &Args, config: &ParserConfig) -> anyhow::Result<Report> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.display().to_string();

    if args.tokens {
        let tokens: Vec<Token<'_>> = Lexer::new(&source).subset(TypeClass::ALL).collect();
        let errors = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Error)
            .map(|token| format!("{name}:{}: invalid token `{}`", token.begin, token.text))
            .collect();
        let output = match args.format {
            Format::Sexpr => tokens
                .iter()
                .map(|token| format!("{} {:?} {:?}\n", token.begin, token.kind, token.text))
                .collect(),
            Format::Json => serde_json::to_string_pretty(&tokens)? + "\n",
        };
        return Ok(Report { output, errors });
    }

    let arena = Bump::new();
    let mut parser = PhpParser::with_config(Lexer::new(&source), &arena, config.clone()).named(&name);
    let program = parser.parse_program();
    let output = match args.format {
        Format::Sexpr => SExprFormatter::format(&program) + "\n",
        Format::Json => serde_json::to_string_pretty(&program)? + "\n",
    };
    Ok(Report {
        output,
        errors: program.errors.iter().map(ToString::to_string).collect(),
    })
}
