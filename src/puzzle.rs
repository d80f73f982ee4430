use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;

use smallvec::SmallVec;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::{GridCoord, SlotId, MAX_CROSSING_COUNT};

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// Offsets `(ia, ib)` into two overlapping slots: char `ia` of the first slot's word must equal
/// char `ib` of the second slot's word.
pub type Overlap = (usize, usize);

/// A crossing between one slot and another, referencing the cell within this slot, the other
/// slot's id, and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub cell: usize,
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The static description of a single slot.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Crossing; MAX_CROSSING_COUNT]>,
}

impl SlotConfig {
    /// The coords of each cell of this slot, in word order.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        cell_coords(self.start_cell, self.direction, self.length)
    }
}

fn cell_coords(
    start_cell: GridCoord,
    direction: Direction,
    length: usize,
) -> impl Iterator<Item = GridCoord> {
    (0..length).map(move |cell_idx| match direction {
        Direction::Across => (start_cell.0, start_cell.1 + cell_idx),
        Direction::Down => (start_cell.0 + cell_idx, start_cell.1),
    })
}

/// An across or down entry in the input to `Puzzle::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

/// The immutable puzzle model: grid structure, slots with their crossings, and the dictionary.
pub struct Puzzle {
    pub width: usize,
    pub height: usize,
    /// `structure[row][col]` is true for cells that are part of the puzzle.
    pub structure: Vec<Vec<bool>>,
    pub slot_configs: Vec<SlotConfig>,
    pub dictionary: Dictionary,
}

impl Debug for Puzzle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Puzzle")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("dictionary", &self.dictionary)
            .finish()
    }
}

impl Puzzle {
    /// Build a puzzle from explicit entries. Cells covered by any entry are open; everything
    /// else is blocked. Overlaps are derived from shared cells.
    pub fn new(
        width: usize,
        height: usize,
        entries: &[GridEntry],
        dictionary: Dictionary,
    ) -> Result<Puzzle> {
        let mut structure = vec![vec![false; width]; height];

        // (entry index, cell index within entry) for every entry touching a cell.
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            if entry.len == 0 {
                return Err(Error::malformed(format!("entry {} has zero length", entry_idx)));
            }

            for (cell_idx, loc) in cell_coords(entry.loc, entry.dir, entry.len).enumerate() {
                if loc.0 >= height || loc.1 >= width {
                    return Err(Error::malformed(format!(
                        "entry {} leaves the {}x{} grid at {:?}",
                        entry_idx, width, height, loc
                    )));
                }
                structure[loc.0][loc.1] = true;

                let cell_entries = entries_by_loc.entry(loc).or_default();
                if cell_entries.len() >= 2 {
                    return Err(Error::malformed(format!(
                        "more than two entries share cell {:?}",
                        loc
                    )));
                }
                cell_entries.push((entry_idx, cell_idx));
            }
        }

        let mut slot_configs: Vec<SlotConfig> = entries
            .iter()
            .enumerate()
            .map(|(id, entry)| SlotConfig {
                id,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings: SmallVec::new(),
            })
            .collect();

        for (loc, cell_entries) in &entries_by_loc {
            if let &[(a, a_cell), (b, b_cell)] = cell_entries.as_slice() {
                if entries[a].dir == entries[b].dir {
                    return Err(Error::malformed(format!(
                        "entries {} and {} run the same direction through {:?}",
                        a, b, loc
                    )));
                }
                slot_configs[a].crossings.push(Crossing {
                    cell: a_cell,
                    other_slot_id: b,
                    other_slot_cell: b_cell,
                });
                slot_configs[b].crossings.push(Crossing {
                    cell: b_cell,
                    other_slot_id: a,
                    other_slot_cell: a_cell,
                });
            }
        }

        // HashMap iteration order is arbitrary; keep crossings in cell order so neighbor
        // iteration (and therefore the whole solve) is deterministic.
        for slot_config in &mut slot_configs {
            slot_config.crossings.sort_by_key(|crossing| crossing.cell);
        }

        Ok(Puzzle {
            width,
            height,
            structure,
            slot_configs,
            dictionary,
        })
    }

    /// Build a puzzle from a structure template, with `_` or `.` representing open cells and
    /// anything else (whitespace included) representing blocks. Every line is a row, so a blank
    /// line is a row of blocks; only trailing blank lines are dropped. Short rows are padded with
    /// blocks. Slots are maximal runs of at least two open cells, across slots first (row by row)
    /// and then down slots (column by column).
    pub fn from_template(template: &str, dictionary: Dictionary) -> Result<Puzzle> {
        let mut rows: Vec<Vec<char>> = template
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line).chars().collect())
            .collect();
        while rows.last().map_or(false, |row| row.is_empty()) {
            rows.pop();
        }

        if rows.is_empty() {
            return Err(Error::EmptyStructure);
        }

        let height = rows.len();
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let structure: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|col| matches!(row.get(col), Some('_') | Some('.')))
                    .collect()
            })
            .collect();

        let mut entries: Vec<GridEntry> = vec![];
        for (row, line) in structure.iter().enumerate() {
            for (start, len) in open_runs(line.iter().copied()) {
                entries.push(GridEntry {
                    loc: (row, start),
                    len,
                    dir: Direction::Across,
                });
            }
        }
        for col in 0..width {
            for (start, len) in open_runs(structure.iter().map(|line| line[col])) {
                entries.push(GridEntry {
                    loc: (start, col),
                    len,
                    dir: Direction::Down,
                });
            }
        }

        let mut puzzle = Puzzle::new(width, height, &entries, dictionary)?;
        // Single open cells belong to no slot but are still part of the grid.
        puzzle.structure = structure;
        Ok(puzzle)
    }

    /// Read a structure file and a word list and build a puzzle from them.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(structure_path: P, words_path: Q) -> Result<Puzzle> {
        let template = std::fs::read_to_string(structure_path)?;
        let dictionary = Dictionary::load(words_path)?;
        Puzzle::from_template(&template, dictionary)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot_ids(&self) -> std::ops::Range<SlotId> {
        0..self.slot_configs.len()
    }

    pub fn slot_length(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].length
    }

    /// The slots crossing the given slot.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .map(|crossing| crossing.other_slot_id)
    }

    /// The overlap offsets for the ordered pair `(x, y)`, if they cross.
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<Overlap> {
        self.slot_configs[x]
            .crossings
            .iter()
            .find(|crossing| crossing.other_slot_id == y)
            .map(|crossing| (crossing.cell, crossing.other_slot_cell))
    }

    /// Every ordered pair of distinct crossing slots.
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        self.slot_ids()
            .flat_map(|x| self.neighbors(x).map(move |y| (x, y)))
            .filter(|&(x, y)| x != y)
            .collect()
    }
}

/// (start, length) of each run of at least two consecutive open cells.
fn open_runs<I: Iterator<Item = bool>>(cells: I) -> Vec<(usize, usize)> {
    let mut result = vec![];
    let mut run_start: Option<usize> = None;

    // The trailing block closes a run that reaches the edge.
    for (idx, open) in cells.chain(std::iter::once(false)).enumerate() {
        match (open, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start > 1 {
                    result.push((start, idx - start));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::{Direction, GridEntry, Puzzle};
    use crate::{Dictionary, Error};

    #[test]
    fn test_template_slots_and_overlaps() {
        let puzzle =
            Puzzle::from_template("#___#\n#_##_\n____#\n", Dictionary::default()).unwrap();

        assert_eq!(puzzle.width, 5);
        assert_eq!(puzzle.height, 3);
        assert_eq!(puzzle.slot_count(), 3);

        let across_top = &puzzle.slot_configs[0];
        assert_eq!(across_top.start_cell, (0, 1));
        assert_eq!(across_top.length, 3);
        assert_eq!(across_top.direction, Direction::Across);

        let across_bottom = &puzzle.slot_configs[1];
        assert_eq!(across_bottom.start_cell, (2, 0));
        assert_eq!(across_bottom.length, 4);

        let down = &puzzle.slot_configs[2];
        assert_eq!(down.start_cell, (0, 1));
        assert_eq!(down.length, 3);
        assert_eq!(down.direction, Direction::Down);

        assert_eq!(puzzle.overlap(0, 2), Some((0, 0)));
        assert_eq!(puzzle.overlap(2, 0), Some((0, 0)));
        assert_eq!(puzzle.overlap(1, 2), Some((1, 2)));
        assert_eq!(puzzle.overlap(2, 1), Some((2, 1)));
        assert_eq!(puzzle.overlap(0, 1), None);

        // The lone cell at (1, 4) is open but sits in no slot.
        assert!(puzzle.structure[1][4]);
        assert_eq!(puzzle.arcs().len(), 4);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let puzzle = Puzzle::from_template("___\n_\n_", Dictionary::default()).unwrap();

        assert_eq!(puzzle.width, 3);
        assert!(!puzzle.structure[1][2]);
        assert_eq!(puzzle.slot_count(), 2);
        assert_eq!(puzzle.neighbors(0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let structure_path = dir.path().join("structure.txt");
        let words_path = dir.path().join("words.txt");
        std::fs::write(&structure_path, "#___#\n#####\n").unwrap();
        std::fs::write(&words_path, "CAT\nDOG\n").unwrap();

        let puzzle = Puzzle::load(&structure_path, &words_path).unwrap();

        assert_eq!(puzzle.slot_count(), 1);
        assert_eq!(puzzle.dictionary.len(), 2);
    }

    #[test]
    fn test_leading_whitespace_is_blocked() {
        let puzzle = Puzzle::from_template(" __\n___\n", Dictionary::default()).unwrap();

        assert_eq!(puzzle.structure[0], vec![false, true, true]);
        assert_eq!(puzzle.slot_count(), 4);
        assert_eq!(puzzle.slot_configs[0].start_cell, (0, 1));
        assert_eq!(puzzle.slot_configs[0].length, 2);
        assert_eq!(puzzle.slot_configs[1].start_cell, (1, 0));
        assert_eq!(puzzle.slot_configs[1].length, 3);
    }

    #[test]
    fn test_blank_line_is_a_blocked_row() {
        let puzzle = Puzzle::from_template("___\n\n___\n", Dictionary::default()).unwrap();

        assert_eq!(puzzle.height, 3);
        assert_eq!(puzzle.structure[1], vec![false, false, false]);
        assert_eq!(puzzle.slot_count(), 2);
        assert!(puzzle.arcs().is_empty());
    }

    #[test]
    fn test_carriage_returns_and_trailing_blank_lines_are_ignored() {
        let puzzle = Puzzle::from_template("_#\r\n__\r\n\n\n", Dictionary::default()).unwrap();

        assert_eq!(puzzle.height, 2);
        assert_eq!(puzzle.width, 2);
        assert_eq!(puzzle.structure, vec![vec![true, false], vec![true, true]]);
        assert_eq!(puzzle.slot_count(), 2);
    }

    #[test]
    fn test_empty_template_fails() {
        for template in ["", "\n\n"] {
            let result = Puzzle::from_template(template, Dictionary::default());

            assert!(matches!(result, Err(Error::EmptyStructure)));
        }
    }

    #[test]
    fn test_malformed_entries_fail_fast() {
        let zero_length = Puzzle::new(
            3,
            3,
            &[GridEntry { loc: (0, 0), len: 0, dir: Direction::Across }],
            Dictionary::default(),
        );
        assert!(matches!(zero_length, Err(Error::MalformedPuzzle { .. })));

        let out_of_bounds = Puzzle::new(
            3,
            3,
            &[GridEntry { loc: (2, 1), len: 3, dir: Direction::Across }],
            Dictionary::default(),
        );
        assert!(matches!(out_of_bounds, Err(Error::MalformedPuzzle { .. })));

        let parallel = Puzzle::new(
            5,
            1,
            &[
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
                GridEntry { loc: (0, 2), len: 3, dir: Direction::Across },
            ],
            Dictionary::default(),
        );
        assert!(matches!(parallel, Err(Error::MalformedPuzzle { .. })));
    }
}
