//! MeterGuard Antifraud - GPS anomaly detection for meter reports
//!
//! The [`FraudEvaluator`] runs a fixed pipeline of checks over each meter
//! report, scores the findings into a confidence value and records them in a
//! bounded per-meter [`HistoryStore`].

pub mod checks;
pub mod evaluator;
pub mod memory;
pub mod ports;
pub mod recommendations;
pub mod scoring;
pub mod stats;
pub mod verdict;

pub use evaluator::FraudEvaluator;
pub use memory::MemoryHistoryStore;
pub use ports::HistoryStore;
pub use scoring::CheckKind;
pub use stats::{AntifraudStats, AnomalyTypeCount};
pub use verdict::ValidationVerdict;
