//! Core data types shared across the ranking pipeline.

pub mod candidate;
pub mod feedback;
pub mod item;
pub mod search;
pub mod statistics;

pub use candidate::{Candidate, ScoredCandidate, SignalScores};
pub use feedback::FeedbackEvent;
pub use item::{Embedding, Item, ItemAttrs, ItemId, UNKNOWN_GENRE};
pub use search::{ResultItem, SearchFilters, SearchRequest, SearchResponse, Timings};
pub use statistics::{FeedbackKind, ItemStatistics};
