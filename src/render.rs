use crate::puzzle::Puzzle;
use crate::search::Assignment;

/// Glyph used for cells that aren't part of the puzzle.
pub const BLOCK: char = '█';

/// The letter in each cell of the grid, indexed `[row][col]`. Cells not covered by an assigned
/// slot are `None`.
pub fn letter_grid(puzzle: &Puzzle, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; puzzle.width]; puzzle.height];

    for (slot_id, word_id) in assignment.iter() {
        let word = puzzle.dictionary.word(word_id);
        for ((row, col), &glyph) in puzzle.slot_configs[slot_id].cell_coords().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given puzzle and (possibly partial) assignment into a rendered string: blocks for
/// blocked cells, spaces for open cells without a letter, and letters everywhere else.
pub fn render_grid(puzzle: &Puzzle, assignment: &Assignment) -> String {
    let letters = letter_grid(puzzle, assignment);

    puzzle
        .structure
        .iter()
        .zip(&letters)
        .map(|(structure_row, letter_row)| {
            structure_row
                .iter()
                .zip(letter_row)
                .map(|(&open, letter)| match (open, letter) {
                    (false, _) => BLOCK,
                    (true, Some(letter)) => *letter,
                    (true, None) => ' ',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
