use super::stats::{format_percentage, DetailedStats};

/// 集計データから短い所見文を生成する
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightSummarizer;

impl InsightSummarizer {
    pub fn new() -> Self {
        Self
    }

    /// 所見文を順序付きで返す
    ///
    /// 必要なデータが欠けている項目は出力しない。
    pub fn summarize(&self, stats: &DetailedStats) -> Vec<String> {
        let mut insights = Vec::new();

        insights.push(format!(
            "Média de {} mensagens por dia",
            stats.average_per_day()
        ));

        if let Some(top) = stats.member_stats.first() {
            insights.push(format!(
                "{} é o membro mais ativo com {}% das mensagens",
                top.name,
                format_percentage(stats.participation_of(top))
            ));
        }

        if let Some((hour, count)) = stats.peak_hour() {
            if count > 0 {
                insights.push(format!("Horário de pico: {}:00", hour));
            }
        }

        if let Some(avg_words) = stats.average_words_per_message() {
            insights.push(format!("Média de {} palavras por mensagem", avg_words));
        }

        tracing::debug!(count = insights.len(), "💡 Insights generated");

        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::stats::MemberStats;
    use std::collections::BTreeMap;

    #[test]
    fn test_full_insights() {
        let stats = DetailedStats {
            total_messages: 100,
            total_words: Some(420),
            active_members: 2,
            days_analyzed: 10,
            member_stats: vec![MemberStats::new("Ana", 60), MemberStats::new("Bruno", 40)],
            hourly_activity: BTreeMap::from([("18".to_string(), 30)]),
            daily_stats: BTreeMap::new(),
        };

        let insights = InsightSummarizer::new().summarize(&stats);
        assert_eq!(
            insights,
            vec![
                "Média de 10 mensagens por dia".to_string(),
                "Ana é o membro mais ativo com 60.0% das mensagens".to_string(),
                "Horário de pico: 18:00".to_string(),
                "Média de 4 palavras por mensagem".to_string(),
            ]
        );
    }

    #[test]
    fn test_peak_hour_is_deterministic() {
        let stats = DetailedStats {
            total_messages: 35,
            days_analyzed: 1,
            hourly_activity: BTreeMap::from([
                ("09".to_string(), 5),
                ("18".to_string(), 20),
                ("21".to_string(), 10),
            ]),
            ..Default::default()
        };

        let summarizer = InsightSummarizer::new();
        for _ in 0..10 {
            let insights = summarizer.summarize(&stats);
            assert!(insights.contains(&"Horário de pico: 18:00".to_string()));
        }
    }

    #[test]
    fn test_missing_data_skips_statements() {
        let stats = DetailedStats {
            total_messages: 0,
            days_analyzed: 0,
            hourly_activity: BTreeMap::from([("10".to_string(), 0)]),
            ..Default::default()
        };

        let insights = InsightSummarizer::new().summarize(&stats);
        assert_eq!(insights, vec!["Média de 0 mensagens por dia".to_string()]);
    }
}
