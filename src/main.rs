//! Polyomino Packer
//!
//! Reads a catalog of polyomino pieces and a list of rectangular regions, each
//! asking for some number of every piece, and reports which regions can hold
//! all of their pieces at once (pieces may be rotated and flipped).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use polypack::geometry::all_orientations;
use polypack::parse::{ParseError, PuzzleInput};
use polypack::solver::{Packer, PieceOrder, Reason, RequestError, SearchOptions, Verdict};
use polypack::{evaluate_regions, Answer, BatchOptions};

/// Input read when no subcommand is given.
const DEFAULT_INPUT: &str = "input.txt";

/// Decides which regions can hold their requested polyomino pieces.
#[derive(Parser)]
#[command(name = "polypack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check every region and count the ones whose pieces fit.
    Solve {
        input: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
        /// Search regions one after another instead of in parallel.
        #[arg(long)]
        sequential: bool,
    },
    /// Print the packing found for one region.
    Show {
        input: PathBuf,
        /// Zero-based index of the region in the input.
        #[arg(long)]
        region: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// List the distinct orientations of one piece.
    Orientations {
        input: PathBuf,
        #[arg(long)]
        piece: usize,
    },
}

#[derive(Args, Default)]
struct SearchArgs {
    /// Give up on a region after this many placements.
    #[arg(long)]
    max_steps: Option<u64>,
    /// Search pieces in input order instead of most-constrained-first.
    #[arg(long)]
    input_order: bool,
    /// Let identical pieces try their placements in any order.
    #[arg(long)]
    no_symmetry_breaking: bool,
}

impl From<&SearchArgs> for SearchOptions {
    fn from(args: &SearchArgs) -> Self {
        Self {
            order: if args.input_order {
                PieceOrder::Input
            } else {
                PieceOrder::MostConstrainedFirst
            },
            break_instance_symmetry: !args.no_symmetry_breaking,
            max_steps: args.max_steps,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("no region {index}: the input has {count} regions")]
    NoSuchRegion { index: usize, count: usize },
    #[error("no piece {id}: the input has {count} pieces")]
    NoSuchPiece { id: usize, count: usize },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Solve {
            input,
            search,
            sequential,
        }) => run_solve(&input, &search, !sequential),
        Some(Command::Show {
            input,
            region,
            search,
        }) => run_show(&input, region, &search),
        Some(Command::Orientations { input, piece }) => run_orientations(&input, piece),
        // default: solve the default input
        None => run_solve(Path::new(DEFAULT_INPUT), &SearchArgs::default(), true),
    };

    match result {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path) -> Result<PuzzleInput, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.parse()?)
}

fn run_solve(path: &Path, search: &SearchArgs, parallel: bool) -> Result<String, CliError> {
    let input = load(path)?;
    let options = BatchOptions {
        search: search.into(),
        parallel,
    };
    solve_report(&input, &options)
}

fn run_show(path: &Path, region: usize, search: &SearchArgs) -> Result<String, CliError> {
    let input = load(path)?;
    show_report(&input, region, &search.into())
}

fn run_orientations(path: &Path, piece: usize) -> Result<String, CliError> {
    let input = load(path)?;
    orientations_report(&input, piece)
}

/// One line per region, then the number of regions that fit.
fn solve_report(input: &PuzzleInput, options: &BatchOptions) -> Result<String, CliError> {
    let answers = evaluate_regions(&input.catalog, &input.regions, options)?;

    let mut output = String::new();
    for (index, (request, answer)) in input.regions.iter().zip(&answers).enumerate() {
        let text = match answer {
            Answer::Fits => "fits",
            Answer::DoesNotFit => "does not fit",
            Answer::Unknown => "unknown",
        };
        output.push_str(&format!("{index}: {request} {text}\n"));
    }

    let fitting = answers.iter().filter(|&&a| a == Answer::Fits).count();
    output.push_str(&format!("{fitting} of {} regions fit\n", answers.len()));
    Ok(output)
}

/// The verdict for one region, with the filled board when it fits.
fn show_report(
    input: &PuzzleInput,
    index: usize,
    options: &SearchOptions,
) -> Result<String, CliError> {
    let request = input.regions.get(index).ok_or(CliError::NoSuchRegion {
        index,
        count: input.regions.len(),
    })?;
    let outcome = Packer::new(&input.catalog, request)?.search(options);

    let mut output = format!("{request}\n");
    match outcome.verdict {
        Verdict::Fits(region) => output.push_str(&region.render()),
        Verdict::DoesNotFit(Reason::AreaExceeded) => {
            output.push_str("does not fit: pieces cover more cells than the region\n")
        }
        Verdict::DoesNotFit(Reason::Exhausted) => {
            output.push_str("does not fit: no arrangement found\n")
        }
        Verdict::Unknown => output.push_str("unknown: step budget exhausted\n"),
    }
    output.push_str(&format!(
        "{} steps, {} backtracks\n",
        outcome.stats.steps, outcome.stats.backtracks
    ));
    Ok(output)
}

/// Every distinct orientation of one piece, separated by blank lines.
fn orientations_report(input: &PuzzleInput, id: usize) -> Result<String, CliError> {
    let pattern = input.catalog.get(id).ok_or(CliError::NoSuchPiece {
        id,
        count: input.catalog.len(),
    })?;
    let orientations = all_orientations(&pattern.shape());

    let mut output = format!("piece {id}: {} orientations\n", orientations.len());
    for orientation in &orientations {
        output.push('\n');
        output.push_str(&orientation.to_string());
    }
    Ok(output)
}
