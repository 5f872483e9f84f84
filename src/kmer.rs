//! K-mer encoder.
//!
//! Encodes a fixed-length window of alphabet-letter indices as the integer
//! whose base-|Σ| digits are those indices, most-significant digit first.

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};

/// A kmer in its integer representation. `u64` matches the `kmer INTEGER`
/// column of the `kmers_<w>` table (SQLite's 64-bit integer type).
pub type Kmer = u64;

/// Encodes fixed-length windows of letter indices into kmer integers.
///
/// Fails at construction with [`Error::AlphabetTooLarge`] if the alphabet
/// has more than 36 letters, and with [`Error::WordLengthTooLarge`] if `w`
/// exceeds `(bits_of_integer - 1) / 2`, with `bits_of_integer = 64` for the
/// `u64` kmer representation used here.
#[derive(Debug, Clone)]
pub struct KmerEncoder {
    alphabet: Alphabet,
    w: usize,
}

const KMER_BITS: u32 = u64::BITS;

impl KmerEncoder {
    pub fn new(alphabet: Alphabet, w: usize) -> Result<Self> {
        if alphabet.len() > 36 {
            return Err(Error::AlphabetTooLarge(alphabet.len()));
        }
        let max_w = ((KMER_BITS - 1) / 2) as usize;
        if w == 0 || w >= max_w {
            return Err(Error::WordLengthTooLarge {
                w,
                bits: KMER_BITS,
                alphabet_size: alphabet.len(),
            });
        }
        // The bound above ignores alphabet size, so for large alphabets even
        // a "legal" w can still overflow u64. Reject rather than wrap.
        if (alphabet.len() as f64).ln() * w as f64 >= (KMER_BITS as f64) * std::f64::consts::LN_2
        {
            return Err(Error::WordLengthTooLarge {
                w,
                bits: KMER_BITS,
                alphabet_size: alphabet.len(),
            });
        }
        Ok(Self { alphabet, w })
    }

    pub fn word_length(&self) -> usize {
        self.w
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Encodes exactly `w` letter indices as a single integer, most
    /// significant digit first.
    pub fn encode(&self, letters: &[u8]) -> Result<Kmer> {
        if letters.len() != self.w {
            return Err(Error::InvalidParameter(format!(
                "expected exactly {} letters, got {}",
                self.w,
                letters.len()
            )));
        }
        let base = self.alphabet.len() as u64;
        let mut acc: u64 = 0;
        for &digit in letters {
            acc = acc
                .checked_mul(base)
                .and_then(|v| v.checked_add(digit as u64))
                .ok_or_else(|| Error::WordLengthTooLarge {
                    w: self.w,
                    bits: KMER_BITS,
                    alphabet_size: self.alphabet.len(),
                })?;
        }
        Ok(acc)
    }

    /// Window-encodes every position of `sequence`, yielding `len - w + 1`
    /// kmers. Returns an empty vector if the sequence is shorter than `w`.
    pub fn kmers_of(&self, sequence: &[u8]) -> Result<Vec<Kmer>> {
        if sequence.len() < self.w {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(sequence.len() - self.w + 1);
        for window in sequence.windows(self.w) {
            out.push(self.encode(window)?);
        }
        Ok(out)
    }

    /// Inverts [`KmerEncoder::encode`], recovering the original digit
    /// tuple.
    pub fn decode(&self, kmer: Kmer) -> Vec<u8> {
        let base = self.alphabet.len() as u64;
        let mut digits = vec![0u8; self.w];
        let mut remaining = kmer;
        for i in (0..self.w).rev() {
            digits[i] = (remaining % base) as u8;
            remaining /= base;
        }
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna_encoder(w: usize) -> KmerEncoder {
        KmerEncoder::new(Alphabet::dna(), w).unwrap()
    }

    #[test]
    fn encode_matches_colex_ordering_of_digit_tuples() {
        let enc = dna_encoder(2);
        // base-4 digits, most significant first: AA=0, AC=1, AG=2, AT=3, CA=4...
        assert_eq!(enc.encode(&[0, 0]).unwrap(), 0);
        assert_eq!(enc.encode(&[0, 1]).unwrap(), 1);
        assert_eq!(enc.encode(&[1, 0]).unwrap(), 4);
        assert_eq!(enc.encode(&[3, 3]).unwrap(), 15);
    }

    #[test]
    fn distinct_tuples_give_distinct_integers() {
        let enc = dna_encoder(3);
        let mut seen = std::collections::HashSet::new();
        for a in 0..4u8 {
            for b in 0..4u8 {
                for c in 0..4u8 {
                    let k = enc.encode(&[a, b, c]).unwrap();
                    assert!(seen.insert(k), "collision for {a},{b},{c}");
                }
            }
        }
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn decode_inverts_encode() {
        let enc = dna_encoder(4);
        for digits in [[0, 1, 2, 3], [3, 2, 1, 0], [0, 0, 0, 0], [3, 3, 3, 3]] {
            let k = enc.encode(&digits).unwrap();
            assert_eq!(enc.decode(k), digits.to_vec());
        }
    }

    #[test]
    fn kmers_of_yields_len_minus_w_plus_one() {
        let enc = dna_encoder(3);
        let a = Alphabet::dna();
        let seq = a.encode_str("AAACCCGGGTTT").unwrap();
        let kmers = enc.kmers_of(&seq).unwrap();
        assert_eq!(kmers.len(), seq.len() - 3 + 1);
    }

    #[test]
    fn too_short_sequence_yields_no_kmers() {
        let enc = dna_encoder(5);
        let a = Alphabet::dna();
        let seq = a.encode_str("AC").unwrap();
        assert!(enc.kmers_of(&seq).unwrap().is_empty());
    }

    #[test]
    fn rejects_word_length_at_or_above_bound() {
        let a = Alphabet::dna();
        assert!(KmerEncoder::new(a.clone(), 32).is_err());
        assert!(KmerEncoder::new(a, 0).is_err());
    }

    #[test]
    fn rejects_word_length_that_would_overflow_for_large_alphabet() {
        // base-36 alphabet: even w=12 overflows u64 (36^12 > 2^64).
        let letters: Vec<char> = "0123456789abcdefghijklmnopqrstuvwxyz".chars().collect();
        let a = Alphabet::new(letters).unwrap();
        assert!(KmerEncoder::new(a, 12).is_err());
    }
}
