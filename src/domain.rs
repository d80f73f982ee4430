use bit_set::BitSet;

use crate::puzzle::Puzzle;
use crate::{SlotId, WordId};

/// The candidate words still considered possible for each slot, stored as a set of word ids per
/// slot. Domains only ever shrink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    sets: Vec<BitSet>,
}

impl Domains {
    /// Seed every slot's domain with the full dictionary.
    pub fn initialize(puzzle: &Puzzle) -> Domains {
        let word_count = puzzle.dictionary.len();
        let full: BitSet = (0..word_count).collect();

        Domains {
            sets: puzzle.slot_ids().map(|_| full.clone()).collect(),
        }
    }

    /// Remove every candidate whose length differs from its slot's length. Returns the number of
    /// candidates removed.
    pub fn enforce_node_consistency(&mut self, puzzle: &Puzzle) -> usize {
        let mut removed = 0;

        for (slot_id, domain) in self.sets.iter_mut().enumerate() {
            let length = puzzle.slot_length(slot_id);
            let bad_words: Vec<WordId> = domain
                .iter()
                .filter(|&word_id| puzzle.dictionary.word(word_id).len() != length)
                .collect();

            for word_id in &bad_words {
                domain.remove(*word_id);
            }
            removed += bad_words.len();
        }

        removed
    }

    pub fn get(&self, slot_id: SlotId) -> &BitSet {
        &self.sets[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.sets[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.sets[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.sets[slot_id].contains(word_id)
    }

    pub(crate) fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.sets[slot_id].remove(word_id)
    }

    /// Total number of candidates across all slots.
    pub fn total(&self) -> usize {
        self.sets.iter().map(|set| set.len()).sum()
    }

    /// Whether every slot's domain is a subset of the corresponding domain in `other`.
    pub fn is_subset(&self, other: &Domains) -> bool {
        self.sets.len() == other.sets.len()
            && self
                .sets
                .iter()
                .zip(&other.sets)
                .all(|(set, other_set)| set.is_subset(other_set))
    }
}
