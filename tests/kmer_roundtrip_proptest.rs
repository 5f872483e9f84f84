//! Property-based coverage of the encode/decode round-trip invariant
//! (encode then digit-decode reproduces the original letter indices
//! exactly) across randomly generated digit tuples, complementing the
//! fixed-example unit test in `src/kmer.rs`.

use proptest::prelude::*;
use wordblot::{Alphabet, KmerEncoder};

proptest! {
    #[test]
    fn decode_inverts_encode_for_arbitrary_digit_tuples(
        digits in proptest::collection::vec(0u8..4, 6)
    ) {
        let encoder = KmerEncoder::new(Alphabet::dna(), 6).unwrap();
        let kmer = encoder.encode(&digits).unwrap();
        prop_assert_eq!(encoder.decode(kmer), digits);
    }
}
