//! グループチャットの集計結果から CSV / PDF / PNG のレポートを生成するライブラリ

pub mod analytics;
pub mod config;
pub mod logging;

pub use analytics::export::{
    suggested_file_name, ColorTheme, ExportError, ExportFormat, ExportManager, FormatHandler,
    GroupRef, RankingDisplay, ReportArtifact, ReportOptions, ReportPeriod, ReportRequest,
    ReportTemplate,
};
pub use analytics::{
    DetailedStats, InsightSummarizer, JsonStatsSource, MemberStats, StatsSource,
    StatsSourceError,
};
pub use config::{AppConfig, ConfigManager};
