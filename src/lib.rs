//! Word-Blot: a seed-discovery and segment-scoring engine for local
//! sequence similarity. Indexes exact k-mer matches between sequences,
//! scores diagonal bands of matches under a binomial null model, and
//! clusters significant bands into similar segments. Built on top of that:
//! pairwise local similarity, long-read overlap detection, and consistent
//! k-mer matches across three or more sequences.

pub mod alphabet;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod kmer;
pub mod query;
pub mod seed;
pub mod segment;
pub mod sequence;
pub mod stats;
pub mod store;

pub use alphabet::Alphabet;
pub use config::Params;
pub use error::{Error, Result};
pub use index::{KmerIndex, SeqId};
pub use kmer::{Kmer, KmerEncoder};
pub use query::{local_query, multiple_query, overlap_query, MultiSegment, OverlapEdge};
pub use segment::Segment;
pub use sequence::Sequence;
