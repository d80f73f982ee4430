use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use instant::Duration;
use log::info;

use xwfill::{render_grid, FillFailure, Puzzle, SolveOptions, Solver, ValueOrder, VariableOrder};

/// Fill a crossword structure with words from a dictionary.
#[derive(Debug, Parser)]
#[command(name = "xwfill", version)]
struct Args {
    /// Structure file: `_` marks an open cell, anything else a block
    structure: PathBuf,

    /// Word list, one word per line
    words: PathBuf,

    /// Also write the filled grid to this file
    output: Option<PathBuf>,

    /// Fill slots in order and try words in dictionary order instead of using heuristics
    #[arg(long)]
    naive: bool,

    /// Give up after trying this many assignments
    #[arg(long, value_name = "N")]
    max_states: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long, value_name = "MS")]
    time_limit_ms: Option<u64>,
}

impl Args {
    fn solve_options(&self) -> SolveOptions {
        let (variable_order, value_order) = if self.naive {
            (VariableOrder::FirstUnassigned, ValueOrder::Dictionary)
        } else {
            (VariableOrder::MrvDegree, ValueOrder::LeastConstraining)
        };

        SolveOptions {
            variable_order,
            value_order,
            max_states: self.max_states,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
        }
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args = Args::parse();

    let puzzle = Puzzle::load(&args.structure, &args.words).with_context(|| {
        format!(
            "failed to load puzzle from {} and {}",
            args.structure.display(),
            args.words.display()
        )
    })?;
    info!(
        "{}x{} grid with {} slots, {} words",
        puzzle.width,
        puzzle.height,
        puzzle.slot_count(),
        puzzle.dictionary.len()
    );

    let mut solver = Solver::with_options(&puzzle, args.solve_options());

    match solver.solve() {
        Ok(result) => {
            let display_grid = render_grid(&puzzle, &result.assignment);
            println!("{}", display_grid);

            if let Some(output) = &args.output {
                fs::write(output, format!("{}\n", display_grid))
                    .with_context(|| format!("failed to write {}", output.display()))?;
                info!("written grid to {}", output.display());
            }
        }
        Err(FillFailure::Unsatisfiable) => println!("No solution."),
        Err(FillFailure::LimitReached) => {
            println!("No solution found within the search limits.")
        }
    }

    Ok(())
}
