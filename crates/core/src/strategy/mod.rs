pub mod assembler;
pub mod classifier;
pub mod macd_crossover;

use crate::domain::recommendation::RecommendationRecord;
use crate::error::AdvisorError;
use chrono::{DateTime, Utc};

pub use assembler::{assemble_recommendation, RecordDates};
pub use classifier::{classify, CROSSOVER_FACTOR};
pub use macd_crossover::MacdCrossoverStrategy;

/// A recommendation strategy. Everything a strategy needs is handed to its
/// constructor; `generate` performs no hidden configuration I/O.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Object under which this strategy's record is persisted.
    fn recommendation_object_name(&self) -> &str;

    fn generate(&self, now: DateTime<Utc>) -> Result<RecommendationRecord, AdvisorError>;

    /// Human-readable summary of a generated record.
    fn describe(&self, record: &RecommendationRecord) -> String;
}
