//! examguard-core: Core scoring engine, similarity metrics, and collusion detection.
//!
//! This crate holds the pure domain logic: answer normalization, the three
//! similarity sub-metrics, the weighted trap-rule scorer, per-exam
//! aggregation, pairwise collusion scanning, and cohort report assembly.

pub mod aggregate;
pub mod collusion;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod rules;
pub mod similarity;
pub mod traps;

pub use aggregate::analyze_exam;
pub use collusion::detect_collusion;
pub use report::build_report;
pub use similarity::pair_similarity;
pub use traps::score_answer;
