pub mod export;
pub mod insights;
pub mod stats;
pub mod stats_source;

pub use export::*;
pub use insights::InsightSummarizer;
pub use stats::{format_percentage, participation, DetailedStats, MemberStats};
pub use stats_source::{JsonStatsSource, StatsSource, StatsSourceError};
