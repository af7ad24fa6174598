//! loopcomp CLI - rewrite accumulation loops as comprehensions

use anyhow::Result;
use clap::Parser;
use loopcomp::{analyze, rewrite_file, ConvertOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rewrite Python loops that build lists or dicts as comprehensions
#[derive(Parser, Debug)]
#[command(name = "lcomp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rewrite accumulation loops as comprehensions", long_about = None)]
struct Cli {
    /// Input Python file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Rewrite INPUT in place
    #[arg(short, long, conflicts_with = "output")]
    write: bool,

    /// Write the rewritten source here instead of INPUT
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Report only; exit with status 1 if any loop would be rewritten
    #[arg(short, long, conflicts_with_all = ["write", "output"])]
    check: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Leave the else-branch accumulator of an if/else loop alone
    #[arg(long)]
    no_complement: bool,

    /// Do not merge if/else appends into a conditional expression
    #[arg(long)]
    no_fold_branches: bool,

    /// Show debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            emit_complement: !self.no_complement,
            fold_branches: !self.no_fold_branches,
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "loopcomp=debug" } else { "loopcomp=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let options = cli.options();

    tracing::debug!(input = ?cli.input, output = ?cli.output, "starting");

    let report = if cli.write || cli.output.is_some() {
        rewrite_file(&cli.input, cli.output.as_deref(), &options)?
    } else {
        let source = std::fs::read_to_string(&cli.input)?;
        analyze(&source, &options)?.with_file(&cli.input)
    };

    if cli.json {
        println!("{}", report.to_json());
    } else {
        print!("{}", report.to_text());
    }

    if cli.check && report.has_conversions() {
        std::process::exit(1);
    }

    Ok(())
}
