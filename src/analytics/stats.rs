use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// メンバー別統計
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    /// 表示名
    pub name: String,
    /// 投稿メッセージ数
    pub message_count: u64,
    /// 投稿単語数（集計元によっては未提供）
    #[serde(default)]
    pub word_count: Option<u64>,
}

impl MemberStats {
    pub fn new(name: impl Into<String>, message_count: u64) -> Self {
        Self {
            name: name.into(),
            message_count,
            word_count: None,
        }
    }

    pub fn with_word_count(mut self, word_count: u64) -> Self {
        self.word_count = Some(word_count);
        self
    }
}

/// 期間内のグループ集計データ
///
/// 集計はバックエンド側で行われ、ここでは読み取り専用の入力として扱う。
/// `member_stats` はメッセージ数の降順に並んでいる前提で、その順序がそのまま順位になる。
/// ヒストグラムは `BTreeMap` で保持するため、時間ラベル・日付ラベルの昇順で列挙される。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStats {
    pub total_messages: u64,
    #[serde(default)]
    pub total_words: Option<u64>,
    #[serde(default)]
    pub active_members: u64,
    #[serde(default)]
    pub days_analyzed: u64,
    #[serde(default)]
    pub member_stats: Vec<MemberStats>,
    /// "00".."23" → メッセージ数
    #[serde(default)]
    pub hourly_activity: BTreeMap<String, u64>,
    /// 日付ラベル → メッセージ数
    #[serde(default)]
    pub daily_stats: BTreeMap<String, u64>,
}

impl DetailedStats {
    /// 1日あたりの平均メッセージ数（四捨五入、日数0なら0）
    pub fn average_per_day(&self) -> u64 {
        rounded_ratio(self.total_messages, self.days_analyzed)
    }

    /// 1メッセージあたりの平均単語数
    ///
    /// 単語数が提供されていない、またはメッセージが0件の場合は `None`。
    pub fn average_words_per_message(&self) -> Option<u64> {
        match self.total_words {
            Some(words) if self.total_messages > 0 => {
                Some(rounded_ratio(words, self.total_messages))
            }
            _ => None,
        }
    }

    /// 上位 `limit` 件のメンバーを返す（`None` は全件）
    pub fn ranked_members(&self, limit: Option<usize>) -> &[MemberStats] {
        let len = self.member_stats.len();
        let end = limit.map_or(len, |limit| limit.min(len));
        &self.member_stats[..end]
    }

    /// メンバーの参加率（%）
    pub fn participation_of(&self, member: &MemberStats) -> f64 {
        participation(member.message_count, self.total_messages)
    }

    /// 最もメッセージが多い時間帯
    ///
    /// 同数の場合は時間ラベルが小さい方を採用する。
    pub fn peak_hour(&self) -> Option<(&str, u64)> {
        self.hourly_activity
            .iter()
            .fold(None, |best: Option<(&str, u64)>, (hour, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((hour.as_str(), count)),
            })
    }
}

/// 参加率（%）を小数第1位で丸めて返す
///
/// CSV/PDF/PNG の全出力がこの関数を通すことで、同じメンバーの値が一致する。
pub fn participation(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

/// パーセンテージを小数1桁の文字列にする
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}", value)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64).round() as u64
}
