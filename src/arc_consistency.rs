use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::domain::Domains;
use crate::puzzle::Puzzle;
use crate::{SlotId, WordId};

/// An ordered pair of slots `(x, y)`: revising it prunes `x` against `y`.
pub type SlotArc = (SlotId, SlotId);

/// Worklist of arcs waiting to be revised. An arc that's already waiting isn't queued twice.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<SlotArc>,
    queued: HashSet<SlotArc>,
}

impl ConsistencyQueue {
    fn with_initial_arcs<Arcs>(arcs: Arcs) -> ConsistencyQueue
    where
        Arcs: IntoIterator<Item = SlotArc>,
    {
        let mut queue = ConsistencyQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in arcs {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<SlotArc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: SlotArc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `ac3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,
    /// How many candidates were removed across all domains.
    pub eliminations: usize,
}

/// Returned when some slot's domain is empty, which makes the puzzle unsatisfiable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x` arc consistent with `y`: remove every candidate from `x`'s domain that has no
/// compatible candidate in `y`'s domain. A candidate is compatible with a different word that
/// places the same char at the overlap; a word never supports itself. Returns whether `x`'s
/// domain changed. Slots that don't cross impose no constraint, so this is a no-op for them.
pub fn revise(puzzle: &Puzzle, domains: &mut Domains, x: SlotId, y: SlotId) -> bool {
    let (x_cell, y_cell) = match puzzle.overlap(x, y) {
        Some(overlap) => overlap,
        None => return false,
    };
    let dictionary = &puzzle.dictionary;

    // How many of y's candidates place each char at the crossing cell?
    let mut glyph_counts: HashMap<char, usize> = HashMap::new();
    for word_id in domains.get(y).iter() {
        if let Some(glyph) = dictionary.word(word_id).glyph(y_cell) {
            *glyph_counts.entry(glyph).or_insert(0) += 1;
        }
    }

    let bad_words: Vec<WordId> = domains
        .get(x)
        .iter()
        .filter(|&word_id| {
            let word = dictionary.word(word_id);
            let glyph = match word.glyph(x_cell) {
                Some(glyph) => glyph,
                None => return true,
            };

            let mut support = glyph_counts.get(&glyph).copied().unwrap_or(0);
            if domains.contains(y, word_id) && word.glyph(y_cell) == Some(glyph) {
                support -= 1;
            }
            support == 0
        })
        .collect();

    for &word_id in &bad_words {
        domains.remove(x, word_id);
    }

    !bad_words.is_empty()
}

/// AC-3. Starting from `initial_arcs` (or every arc in the puzzle if `None`), revise arcs until
/// none are left, re-queueing `(z, x)` for the other neighbors `z` of any slot `x` whose domain
/// shrank. Fails as soon as any domain is empty.
pub fn ac3(
    puzzle: &Puzzle,
    domains: &mut Domains,
    initial_arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    if let Some(slot_id) = puzzle.slot_ids().find(|&slot_id| domains.is_empty(slot_id)) {
        debug!("slot {} has no candidates before arc consistency", slot_id);
        return Err(ArcConsistencyFailure { slot_id });
    }

    let mut queue =
        ConsistencyQueue::with_initial_arcs(initial_arcs.unwrap_or_else(|| puzzle.arcs()));
    let candidates_before = domains.total();
    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        revisions += 1;

        if revise(puzzle, domains, x, y) {
            if domains.is_empty(x) {
                debug!(
                    "arc consistency emptied slot {} after {} revisions",
                    x, revisions
                );
                return Err(ArcConsistencyFailure { slot_id: x });
            }

            for z in puzzle.neighbors(x) {
                if z != y {
                    queue.enqueue((z, x));
                }
            }
        }
    }

    let eliminations = candidates_before - domains.total();
    debug!(
        "arc consistency: {} revisions, {} candidates eliminated",
        revisions, eliminations
    );

    Ok(ArcConsistencySuccess {
        revisions,
        eliminations,
    })
}

#[cfg(test)]
mod tests {
    use super::{ac3, revise, ArcConsistencyFailure, SlotArc};
    use crate::{Dictionary, Domains, Puzzle};

    /// ___
    /// #_#
    /// #_#
    fn corner_puzzle(words: &[&str]) -> Puzzle {
        Puzzle::from_template("___\n#_#\n#_#", Dictionary::from_words(words)).unwrap()
    }

    fn node_consistent_domains(puzzle: &Puzzle) -> Domains {
        let mut domains = Domains::initialize(puzzle);
        domains.enforce_node_consistency(puzzle);
        domains
    }

    fn assert_arc_consistent(puzzle: &Puzzle, domains: &Domains) {
        for x in puzzle.slot_ids() {
            for y in puzzle.neighbors(x) {
                let (x_cell, y_cell) = puzzle.overlap(x, y).unwrap();
                for wx in domains.get(x).iter() {
                    let word_x = puzzle.dictionary.word(wx);
                    assert!(
                        domains.get(y).iter().any(|wy| {
                            wy != wx
                                && puzzle.dictionary.word(wy).glyph(y_cell)
                                    == word_x.glyph(x_cell)
                        }),
                        "{} in slot {} has no support in slot {}",
                        word_x.string,
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        let puzzle = corner_puzzle(&["CAT", "DOG", "TIE", "AID"]);
        let mut domains = node_consistent_domains(&puzzle);

        assert!(revise(&puzzle, &mut domains, 0, 1));
        let across: Vec<_> = domains.get(0).iter().collect();
        assert_eq!(across, vec![puzzle.dictionary.id_of("CAT").unwrap()]);

        // Nothing left to remove.
        assert!(!revise(&puzzle, &mut domains, 0, 1));
    }

    #[test]
    fn test_revise_without_overlap_is_noop() {
        let puzzle = Puzzle::from_template("___\n###\n___", Dictionary::from_words(["CAT", "DOG"]))
            .unwrap();
        let mut domains = node_consistent_domains(&puzzle);
        let before = domains.clone();

        assert!(!revise(&puzzle, &mut domains, 0, 1));
        assert_eq!(domains, before);
    }

    #[test]
    fn test_revise_word_does_not_support_itself() {
        // ABA crosses itself at A/A, but the same word can't fill both slots.
        let puzzle = Puzzle::from_template("___\n_##\n_##", Dictionary::from_words(["ABA"]))
            .unwrap();
        let mut domains = node_consistent_domains(&puzzle);

        assert!(revise(&puzzle, &mut domains, 0, 1));
        assert!(domains.is_empty(0));
    }

    #[test]
    fn test_revise_before_node_consistency_drops_short_words() {
        let puzzle = corner_puzzle(&["CAT", "AID", "A"]);
        let mut domains = Domains::initialize(&puzzle);

        revise(&puzzle, &mut domains, 0, 1);

        assert!(!domains.contains(0, puzzle.dictionary.id_of("A").unwrap()));
    }

    #[test]
    fn test_ac3_prunes_to_supported_words() {
        let puzzle = corner_puzzle(&["CAT", "DOG", "TIE", "AID"]);
        let mut domains = node_consistent_domains(&puzzle);
        let before = domains.clone();

        let result = ac3(&puzzle, &mut domains, None).unwrap();

        assert_eq!(domains.len(0), 1);
        assert_eq!(domains.len(1), 1);
        assert!(domains.contains(1, puzzle.dictionary.id_of("AID").unwrap()));
        assert_eq!(result.eliminations, 6);
        assert!(domains.is_subset(&before));
        assert_arc_consistent(&puzzle, &domains);
    }

    #[test]
    fn test_ac3_fails_when_domain_empties() {
        let puzzle = corner_puzzle(&["CAT", "DOG"]);
        let mut domains = node_consistent_domains(&puzzle);

        let result = ac3(&puzzle, &mut domains, None);

        assert!(matches!(result, Err(ArcConsistencyFailure { .. })));
    }

    #[test]
    fn test_ac3_fails_on_empty_dictionary() {
        let puzzle = Puzzle::from_template("___", Dictionary::default()).unwrap();
        let mut domains = node_consistent_domains(&puzzle);

        assert_eq!(
            ac3(&puzzle, &mut domains, None),
            Err(ArcConsistencyFailure { slot_id: 0 })
        );
    }

    #[test]
    fn test_ac3_with_initial_arcs_only_revises_those() {
        let puzzle = corner_puzzle(&["CAT", "DOG", "TIE", "AID"]);
        let mut domains = node_consistent_domains(&puzzle);

        // Revising (1, 0) prunes the down slot; the follow-up arcs would go to other neighbors of
        // slot 1, and it has none besides slot 0.
        let arcs: Vec<SlotArc> = vec![(1, 0)];
        let result = ac3(&puzzle, &mut domains, Some(arcs)).unwrap();

        assert_eq!(result.revisions, 1);
        assert_eq!(domains.len(1), 1);
        assert_eq!(domains.len(0), 4);
    }

    /// ___
    /// ___
    /// ___
    #[test]
    fn test_ac3_soundness_on_full_square() {
        let puzzle = Puzzle::from_template(
            "___\n___\n___",
            Dictionary::from_words([
                "CAT", "ORE", "WED", "COW", "ARE", "TED", "ZZZ", "BAT", "EGG", "CAT",
            ]),
        )
        .unwrap();
        let mut domains = node_consistent_domains(&puzzle);
        let before = domains.clone();

        ac3(&puzzle, &mut domains, None).unwrap();

        assert!(domains.is_subset(&before));
        assert_arc_consistent(&puzzle, &domains);
        let zzz = puzzle.dictionary.id_of("ZZZ").unwrap();
        assert!(puzzle.slot_ids().all(|slot_id| !domains.contains(slot_id, zzz)));
    }
}
