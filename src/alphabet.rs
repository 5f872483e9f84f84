//! Alphabets: the ordered set of letters sequences are built from.
//!
//! An alphabet is an ordered set of 3 to 36 letters, each mapped to a unique
//! integer index in `[0, |Σ|)`. The 36-letter cap keeps a kmer's digit
//! tuple representable with the usual base-36 digit glyphs (`0-9a-z`) for
//! debugging, without colliding.

use crate::error::{Error, Result};
use std::collections::HashMap;

const MAX_ALPHABET_SIZE: usize = 36;

/// An ordered alphabet of up to 36 letters, each mapped to a unique index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<char>,
    index_of: HashMap<char, u8>,
}

impl Alphabet {
    /// Builds an alphabet from an ordered, deduplicated letter sequence.
    ///
    /// Fails with [`Error::AlphabetTooLarge`] if more than 36 letters are
    /// given.
    pub fn new(letters: impl IntoIterator<Item = char>) -> Result<Self> {
        let letters: Vec<char> = letters.into_iter().collect();
        if letters.len() > MAX_ALPHABET_SIZE {
            return Err(Error::AlphabetTooLarge(letters.len()));
        }
        if letters.len() < 3 {
            return Err(Error::InvalidParameter(format!(
                "alphabet must have at least 3 letters, got {}",
                letters.len()
            )));
        }
        let mut index_of = HashMap::with_capacity(letters.len());
        for (i, &c) in letters.iter().enumerate() {
            if index_of.insert(c, i as u8).is_some() {
                return Err(Error::InvalidParameter(format!(
                    "duplicate letter '{c}' in alphabet"
                )));
            }
        }
        Ok(Self { letters, index_of })
    }

    /// Convenience constructor for the standard four-letter DNA alphabet.
    pub fn dna() -> Self {
        Self::new("ACGT".chars()).expect("ACGT is a valid alphabet")
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Index of a letter, or `None` if it is not part of this alphabet.
    pub fn index(&self, letter: char) -> Option<u8> {
        self.index_of.get(&letter).copied()
    }

    /// Encodes a whole string into letter indices, failing if any character
    /// is not a member of this alphabet.
    pub fn encode_str(&self, s: &str) -> Result<Vec<u8>> {
        s.chars()
            .map(|c| {
                self.index(c).ok_or_else(|| {
                    Error::InvalidParameter(format!("letter '{c}' not in alphabet"))
                })
            })
            .collect()
    }

    pub fn letter(&self, index: u8) -> Option<char> {
        self.letters.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_alphabet() {
        let letters: Vec<char> = ('a'..='z').chain('0'..='9').chain(['!', '@']).collect();
        assert_eq!(letters.len(), 38);
        assert!(matches!(
            Alphabet::new(letters),
            Err(Error::AlphabetTooLarge(38))
        ));
    }

    #[test]
    fn indices_are_stable_and_unique() {
        let a = Alphabet::dna();
        assert_eq!(a.index('A'), Some(0));
        assert_eq!(a.index('C'), Some(1));
        assert_eq!(a.index('G'), Some(2));
        assert_eq!(a.index('T'), Some(3));
        assert_eq!(a.index('N'), None);
    }

    #[test]
    fn encode_str_round_trips_through_letter() {
        let a = Alphabet::dna();
        let encoded = a.encode_str("ACGT").unwrap();
        let decoded: String = encoded.iter().map(|&i| a.letter(i).unwrap()).collect();
        assert_eq!(decoded, "ACGT");
    }
}
