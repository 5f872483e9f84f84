//! Query modes built on the segment builder: Local, Overlap, and Multiple.

pub mod local;
pub mod multiple;
pub mod overlap;

pub use local::query as local_query;
pub use multiple::{query as multiple_query, MultiSegment};
pub use overlap::{query as overlap_query, OverlapEdge};
