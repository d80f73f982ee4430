//! Backtracking search over partial assignments.
//!
//! Before searching, the solver makes every domain node consistent (right length) and arc
//! consistent (AC-3). The search itself doesn't propagate further: each tentative choice is only
//! checked against the slots already assigned, and undone if it leads nowhere.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::arc_consistency::{self, ArcConsistencyResult, SlotArc};
use crate::domain::Domains;
use crate::puzzle::{Crossing, Puzzle};
use crate::{SlotId, WordId};

/// How to pick the next slot to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableOrder {
    /// Fewest remaining candidates first, ties broken by the most unassigned neighbors.
    #[default]
    MrvDegree,
    /// The unassigned slot with the lowest id.
    FirstUnassigned,
}

/// How to order the candidates for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueOrder {
    /// Candidates ruling out the fewest options for unassigned neighbors first.
    #[default]
    LeastConstraining,
    /// Dictionary order.
    Dictionary,
}

/// Knobs for a single solve.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub variable_order: VariableOrder,
    pub value_order: ValueOrder,
    /// Give up after trying this many tentative assignments.
    pub max_states: Option<u64>,
    /// Give up once this much time has passed since `solve` started.
    pub time_limit: Option<Duration>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Tentative assignments tried during search.
    pub states: u64,
    /// Tentative assignments undone after their subtree failed.
    pub backtracks: u64,
    /// Candidates removed by node and arc consistency before search.
    pub initial_eliminations: usize,
    pub duration: Duration,
}

/// A mapping from some subset of slots to words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        if self.words[slot_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    pub fn unassign(&mut self, slot_id: SlotId) {
        if self.words[slot_id].take().is_some() {
            self.assigned_count -= 1;
        }
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    pub fn slot_count(&self) -> usize {
        self.words.len()
    }

    /// Assigned `(slot, word)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// The word assigned to the slot, as a string.
    pub fn word<'p>(&self, puzzle: &'p Puzzle, slot_id: SlotId) -> Option<&'p str> {
        self.get(slot_id)
            .map(|word_id| puzzle.dictionary.word(word_id).string.as_str())
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    /// No assignment satisfies every constraint.
    Unsatisfiable,
    /// `max_states` or `time_limit` ran out before the search finished.
    LimitReached,
}

/// A single solving run: owns the domains for one puzzle and searches them.
pub struct Solver<'a> {
    puzzle: &'a Puzzle,
    domains: Domains,
    options: SolveOptions,
    statistics: Statistics,
    deadline: Option<Instant>,
}

impl<'a> Solver<'a> {
    pub fn new(puzzle: &'a Puzzle) -> Solver<'a> {
        Solver::with_options(puzzle, SolveOptions::default())
    }

    pub fn with_options(puzzle: &'a Puzzle, options: SolveOptions) -> Solver<'a> {
        Solver {
            puzzle,
            domains: Domains::initialize(puzzle),
            options,
            statistics: Statistics::default(),
            deadline: None,
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) -> usize {
        self.domains.enforce_node_consistency(self.puzzle)
    }

    pub fn revise(&mut self, x: SlotId, y: SlotId) -> bool {
        arc_consistency::revise(self.puzzle, &mut self.domains, x, y)
    }

    pub fn ac3(&mut self, initial_arcs: Option<Vec<SlotArc>>) -> ArcConsistencyResult {
        arc_consistency::ac3(self.puzzle, &mut self.domains, initial_arcs)
    }

    /// Enforce node and arc consistency, then search. If arc consistency already proves the
    /// puzzle unsatisfiable, the search is skipped entirely.
    pub fn solve(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        self.statistics = Statistics::default();
        self.deadline = self.options.time_limit.map(|limit| start + limit);

        let node_eliminations = self.enforce_node_consistency();
        debug!("node consistency eliminated {} candidates", node_eliminations);
        self.statistics.initial_eliminations = node_eliminations;

        match self.ac3(None) {
            Ok(success) => {
                self.statistics.initial_eliminations += success.eliminations;
            }
            Err(failure) => {
                self.statistics.duration = start.elapsed();
                info!("no solution: slot {} has no candidates", failure.slot_id);
                return Err(FillFailure::Unsatisfiable);
            }
        }

        let mut assignment = Assignment::new(self.puzzle.slot_count());
        let result = self.backtrack(&mut assignment);
        self.statistics.duration = start.elapsed();

        match result {
            Ok(true) => {
                info!(
                    "filled {} slots in {:?} ({} states, {} backtracks)",
                    assignment.len(),
                    self.statistics.duration,
                    self.statistics.states,
                    self.statistics.backtracks
                );
                Ok(FillSuccess {
                    statistics: self.statistics.clone(),
                    assignment,
                })
            }
            Ok(false) => {
                info!(
                    "no solution after {} states ({} backtracks)",
                    self.statistics.states, self.statistics.backtracks
                );
                Err(FillFailure::Unsatisfiable)
            }
            Err(failure) => {
                info!(
                    "search limit reached after {} states in {:?}",
                    self.statistics.states, self.statistics.duration
                );
                Err(failure)
            }
        }
    }

    /// Extend `assignment` depth-first. Returns `Ok(true)` with `assignment` complete on success,
    /// `Ok(false)` with `assignment` unchanged if this branch is dead.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        if self.assignment_complete(assignment) {
            return Ok(true);
        }

        let slot_id = match self.select_unassigned_variable(assignment) {
            Some(slot_id) => slot_id,
            None => return Ok(false),
        };

        for word_id in self.order_domain_values(slot_id, assignment) {
            self.check_limits()?;
            self.statistics.states += 1;

            assignment.assign(slot_id, word_id);
            trace!(
                "state {}: slot {} = {}",
                self.statistics.states,
                slot_id,
                self.puzzle.dictionary.word(word_id).string
            );

            if self.consistent_choice(assignment, slot_id) {
                debug_assert!(self.consistent(assignment));

                match self.backtrack(assignment) {
                    Ok(true) => return Ok(true),
                    Ok(false) => self.statistics.backtracks += 1,
                    Err(failure) => {
                        assignment.unassign(slot_id);
                        return Err(failure);
                    }
                }
            }

            assignment.unassign(slot_id);
        }

        Ok(false)
    }

    fn check_limits(&self) -> Result<(), FillFailure> {
        if let Some(max_states) = self.options.max_states {
            if self.statistics.states >= max_states {
                return Err(FillFailure::LimitReached);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::LimitReached);
            }
        }
        Ok(())
    }

    /// Does `assignment` give every slot a word from the dictionary?
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.puzzle.slot_count()
            && assignment
                .iter()
                .all(|(_, word_id)| word_id < self.puzzle.dictionary.len())
    }

    /// Choose the next slot to fill, or `None` if every slot is assigned.
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<SlotId> {
        let mut unassigned = self
            .puzzle
            .slot_ids()
            .filter(|&slot_id| !assignment.is_assigned(slot_id));

        match self.options.variable_order {
            VariableOrder::FirstUnassigned => unassigned.next(),
            VariableOrder::MrvDegree => unassigned.min_by_key(|&slot_id| {
                let degree = self
                    .puzzle
                    .neighbors(slot_id)
                    .filter(|&neighbor| !assignment.is_assigned(neighbor))
                    .count();

                (self.remaining_value_count(slot_id, assignment), Reverse(degree))
            }),
        }
    }

    /// How many of the slot's candidates could still be placed given the current assignment?
    fn remaining_value_count(&self, slot_id: SlotId, assignment: &Assignment) -> usize {
        self.domains
            .get(slot_id)
            .iter()
            .filter(|&word_id| self.compatible(slot_id, word_id, assignment))
            .count()
    }

    /// The slot's candidates in the order they should be tried.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        let mut values: Vec<WordId> = self.domains.get(slot_id).iter().collect();

        if self.options.value_order == ValueOrder::Dictionary {
            return values;
        }

        let dictionary = &self.puzzle.dictionary;

        // For each unassigned neighbor, how many of its candidates place each char at the
        // crossing cell.
        let crossings = &self.puzzle.slot_configs[slot_id].crossings;
        let neighbor_counts: Vec<(&Crossing, HashMap<char, usize>)> = crossings
            .iter()
            .filter(|crossing| !assignment.is_assigned(crossing.other_slot_id))
            .map(|crossing| {
                let mut glyph_counts: HashMap<char, usize> = HashMap::new();
                for word_id in self.domains.get(crossing.other_slot_id).iter() {
                    if let Some(glyph) = dictionary.word(word_id).glyph(crossing.other_slot_cell) {
                        *glyph_counts.entry(glyph).or_insert(0) += 1;
                    }
                }
                (crossing, glyph_counts)
            })
            .collect();

        // A neighbor's candidate is ruled out if it disagrees at the crossing or is the same word.
        values.sort_by_cached_key(|&word_id| {
            let word = dictionary.word(word_id);

            neighbor_counts
                .iter()
                .map(|(crossing, glyph_counts)| {
                    let domain_len = self.domains.len(crossing.other_slot_id);
                    let glyph = match word.glyph(crossing.cell) {
                        Some(glyph) => glyph,
                        None => return domain_len,
                    };
                    let mut kept = glyph_counts.get(&glyph).copied().unwrap_or(0);
                    if self.domains.contains(crossing.other_slot_id, word_id)
                        && word.glyph(crossing.other_slot_cell) == Some(glyph)
                    {
                        kept -= 1;
                    }
                    domain_len - kept
                })
                .sum::<usize>()
        });

        values
    }

    /// Whether the assignment has the right lengths, no repeated words, and agreeing crossings.
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        let mut used_words: HashSet<WordId> = HashSet::with_capacity(assignment.len());

        assignment.iter().all(|(slot_id, word_id)| {
            used_words.insert(word_id)
                && self.fits(slot_id, word_id)
                && self.agrees_with_crossings(slot_id, word_id, assignment)
        })
    }

    /// Whether the word assigned to `slot_id` is consistent with the rest of the assignment.
    /// Equivalent to `consistent` when everything else was already consistent.
    fn consistent_choice(&self, assignment: &Assignment, slot_id: SlotId) -> bool {
        match assignment.get(slot_id) {
            Some(word_id) => self.compatible(slot_id, word_id, assignment),
            None => true,
        }
    }

    /// Could `word_id` go in `slot_id` alongside the other slots in `assignment`?
    fn compatible(&self, slot_id: SlotId, word_id: WordId, assignment: &Assignment) -> bool {
        self.fits(slot_id, word_id)
            && !assignment
                .iter()
                .any(|(other_slot_id, other_word_id)| {
                    other_slot_id != slot_id && other_word_id == word_id
                })
            && self.agrees_with_crossings(slot_id, word_id, assignment)
    }

    fn fits(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.puzzle.dictionary.word(word_id).len() == self.puzzle.slot_length(slot_id)
    }

    fn agrees_with_crossings(
        &self,
        slot_id: SlotId,
        word_id: WordId,
        assignment: &Assignment,
    ) -> bool {
        let dictionary = &self.puzzle.dictionary;
        let word = dictionary.word(word_id);

        self.puzzle.slot_configs[slot_id]
            .crossings
            .iter()
            .all(|crossing| match assignment.get(crossing.other_slot_id) {
                Some(other_word_id) => {
                    word.glyph(crossing.cell)
                        == dictionary.word(other_word_id).glyph(crossing.other_slot_cell)
                }
                None => true,
            })
    }
}
