//! Fill crossword grids by treating each slot as a CSP variable whose domain is the dictionary.
//!
//! The pipeline is: build a [`Puzzle`] (slots, overlaps and a [`Dictionary`]), hand it to a
//! [`Solver`], which enforces node consistency and AC-3 arc consistency on its domains and then
//! runs a backtracking search. The result is either a complete [`Assignment`] or a
//! [`FillFailure`] saying why no fill was found.

pub mod arc_consistency;
pub mod dictionary;
pub mod domain;
pub mod error;
pub mod puzzle;
pub mod render;
pub mod search;

pub use arc_consistency::{
    ArcConsistencyFailure, ArcConsistencyResult, ArcConsistencySuccess, SlotArc,
};
pub use dictionary::{Dictionary, Word};
pub use domain::Domains;
pub use error::{Error, Result};
pub use puzzle::{Crossing, Direction, GridEntry, Overlap, Puzzle, SlotConfig};
pub use render::{letter_grid, render_grid};
pub use search::{
    Assignment, FillFailure, FillSuccess, SolveOptions, Solver, Statistics, ValueOrder,
    VariableOrder,
};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The expected maximum number of slots crossing a single slot.
pub const MAX_CROSSING_COUNT: usize = MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the Puzzle's `slot_configs` field.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the Dictionary.
pub type WordId = usize;

/// Zero-indexed (row, col) coords for a cell in the grid, where row = 0 is the top row.
pub type GridCoord = (usize, usize);

/// Convenience wrapper: build a solver with default options and run it.
pub fn find_fill(puzzle: &Puzzle) -> std::result::Result<FillSuccess, FillFailure> {
    Solver::new(puzzle).solve()
}
