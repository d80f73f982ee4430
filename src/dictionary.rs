use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;

use smallvec::SmallVec;

use crate::error::Result;
use crate::{WordId, MAX_SLOT_LENGTH};

/// A word that can be chosen for a slot. `glyphs` holds the word's chars so that overlap offsets
/// can be looked up by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: &str) -> Word {
        Word {
            string: string.to_string(),
            glyphs: string.chars().collect(),
        }
    }

    /// Length in chars, which is what slot lengths are measured in.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The char at the given cell, or `None` if the word is too short to reach it.
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// The candidate words shared by every slot. Words are deduplicated, and ids follow the order in
/// which each word first appeared.
#[derive(Default, Clone)]
pub struct Dictionary {
    words: Vec<Word>,
    ids_by_string: HashMap<String, WordId>,
}

impl Debug for Dictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Dictionary {
    pub fn from_words<I, S>(words: I) -> Dictionary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for word in words {
            dictionary.insert(word.as_ref());
        }
        dictionary
    }

    /// Parse a word list with one word per line. Trailing whitespace is dropped and blank lines
    /// are skipped; case is kept as stored.
    pub fn parse(contents: &str) -> Dictionary {
        Dictionary::from_words(
            contents
                .lines()
                .map(|line| line.trim_end())
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dictionary> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Dictionary::parse(&contents))
    }

    fn insert(&mut self, word: &str) {
        if self.ids_by_string.contains_key(word) {
            return;
        }
        self.ids_by_string.insert(word.to_string(), self.words.len());
        self.words.push(Word::new(word));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.ids_by_string.get(word).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Dictionary;

    #[test]
    fn test_parse_skips_blank_lines_and_dupes() {
        let dictionary = Dictionary::parse("CAT\r\nDOG\n\nCAT\n  \nTIE  \n");

        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary.id_of("CAT"), Some(0));
        assert_eq!(dictionary.id_of("DOG"), Some(1));
        assert_eq!(dictionary.id_of("TIE"), Some(2));
        assert_eq!(dictionary.id_of("cat"), None, "case is kept as stored");
    }

    #[test]
    fn test_word_lengths_count_chars() {
        let dictionary = Dictionary::from_words(["ÉTÉ", "ABC"]);

        assert_eq!(dictionary.word(0).len(), 3);
        assert_eq!(dictionary.word(0).glyph(0), Some('É'));
        assert_eq!(dictionary.word(1).glyph(3), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ONE").unwrap();
        writeln!(file, "TWO").unwrap();
        writeln!(file, "THREE").unwrap();

        let dictionary = Dictionary::load(file.path()).unwrap();

        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary.word(2).string, "THREE");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Dictionary::load(dir.path().join("missing.txt"));

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
