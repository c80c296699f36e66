//! 集計済み統計の取得元
//!
//! レポート生成は統計の計算をしない。呼び出し側が `StatsSource` から
//! `DetailedStats` を取得してリクエストに詰める。

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::export::ReportPeriod;
use super::stats::DetailedStats;

/// 統計取得エラー
#[derive(Error, Debug)]
pub enum StatsSourceError {
    /// ファイル読み込み失敗
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSONの解析失敗
    #[error("JSON parsing error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// 期間内にメッセージが1件もない
    #[error("No messages found for group {group_id} in the selected period")]
    Empty { group_id: String },
}

/// グループ・期間を指定して統計を取得する
pub trait StatsSource {
    fn fetch_stats(
        &self,
        group_id: &str,
        period: &ReportPeriod,
    ) -> Result<DetailedStats, StatsSourceError>;
}

/// `DetailedStats` を1件だけ含むJSONファイルから読む
pub struct JsonStatsSource {
    path: PathBuf,
}

impl JsonStatsSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイルを読み込む（0件でもエラーにしない）
    pub fn load(&self) -> Result<DetailedStats, StatsSourceError> {
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|source| StatsSourceError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl StatsSource for JsonStatsSource {
    fn fetch_stats(
        &self,
        group_id: &str,
        period: &ReportPeriod,
    ) -> Result<DetailedStats, StatsSourceError> {
        let stats = self.load()?;

        tracing::debug!(
            group_id = group_id,
            period = %period.format_range(),
            total_messages = stats.total_messages,
            members = stats.member_stats.len(),
            "📥 Stats loaded from {}",
            self.path.display()
        );

        if stats.total_messages == 0 {
            return Err(StatsSourceError::Empty {
                group_id: group_id.to_string(),
            });
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn period() -> ReportPeriod {
        ReportPeriod::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
    }

    fn write_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_camel_case_stats() {
        let file = write_json(
            r#"{
                "totalMessages": 100,
                "activeMembers": 2,
                "daysAnalyzed": 10,
                "memberStats": [
                    {"name": "A", "messageCount": 60},
                    {"name": "B", "messageCount": 40, "wordCount": 120}
                ],
                "hourlyActivity": {"18": 30, "09": 30},
                "dailyStats": {"2024-03-01": 100}
            }"#,
        );

        let stats = JsonStatsSource::new(file.path())
            .fetch_stats("grp-1", &period())
            .unwrap();
        assert_eq!(stats.total_messages, 100);
        assert_eq!(stats.member_stats.len(), 2);
        assert_eq!(stats.member_stats[1].word_count, Some(120));
        assert_eq!(stats.peak_hour(), Some(("09", 30)));
    }

    #[test]
    fn test_empty_period_is_reported() {
        let file = write_json(r#"{"totalMessages": 0, "memberStats": []}"#);
        let result = JsonStatsSource::new(file.path()).fetch_stats("grp-9", &period());
        match result {
            Err(StatsSourceError::Empty { group_id }) => assert_eq!(group_id, "grp-9"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_accepts_empty_stats() {
        let file = write_json(r#"{"totalMessages": 0}"#);
        let source = JsonStatsSource::new(file.path());
        assert_eq!(source.path(), file.path());

        let stats = source.load().unwrap();
        assert_eq!(stats, DetailedStats::default());
    }

    #[test]
    fn test_invalid_json() {
        let file = write_json("{ not json");
        let result = JsonStatsSource::new(file.path()).fetch_stats("grp-1", &period());
        assert!(matches!(result, Err(StatsSourceError::Parse { .. })));
        assert!(matches!(
            JsonStatsSource::new(file.path()).load(),
            Err(StatsSourceError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonStatsSource::new(dir.path().join("missing.json"));
        let result = source.fetch_stats("grp-1", &period());
        assert!(matches!(result, Err(StatsSourceError::Io(_))));
    }
}
