use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::stats::DetailedStats;

pub mod canvas;
pub mod csv_exporter;
pub mod locale;
pub mod pdf_exporter;
pub mod png_exporter;

pub use csv_exporter::CsvExporter;
pub use pdf_exporter::PdfExporter;
pub use png_exporter::PngExporter;

/// エクスポート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Png,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Pdf, ExportFormat::Png];

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// レポートテンプレート
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTemplate {
    /// 全体統計・ランキング・インサイトを含む完全版
    Complete,
    /// メンバーランキングのみ
    Members,
}

impl ReportTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTemplate::Complete => "complete",
            ReportTemplate::Members => "members",
        }
    }

    /// 画面・画像に表示するラベル
    pub fn label(&self) -> &'static str {
        match self {
            ReportTemplate::Complete => "Relatório Completo",
            ReportTemplate::Members => "Ranking de Membros",
        }
    }
}

impl FromStr for ReportTemplate {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complete" => Ok(ReportTemplate::Complete),
            "members" => Ok(ReportTemplate::Members),
            _ => Err(ExportError::InvalidTemplate {
                template: s.to_string(),
            }),
        }
    }
}

/// RGBカラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// テーマの配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
}

/// PNG出力のカラーテーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
}

impl ColorTheme {
    pub fn palette(&self) -> ThemePalette {
        match self {
            ColorTheme::Blue => ThemePalette {
                primary: Rgb(0x3B, 0x82, 0xF6),
                secondary: Rgb(0xDB, 0xEA, 0xFE),
                accent: Rgb(0x1E, 0x40, 0xAF),
            },
            ColorTheme::Green => ThemePalette {
                primary: Rgb(0x10, 0xB9, 0x81),
                secondary: Rgb(0xD1, 0xFA, 0xE5),
                accent: Rgb(0x04, 0x78, 0x57),
            },
            ColorTheme::Purple => ThemePalette {
                primary: Rgb(0x8B, 0x5C, 0xF6),
                secondary: Rgb(0xED, 0xE9, 0xFE),
                accent: Rgb(0x6D, 0x28, 0xD9),
            },
            ColorTheme::Orange => ThemePalette {
                primary: Rgb(0xF9, 0x73, 0x16),
                secondary: Rgb(0xFE, 0xD7, 0xAA),
                accent: Rgb(0xC2, 0x41, 0x0C),
            },
        }
    }
}

impl FromStr for ColorTheme {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(ColorTheme::Blue),
            "green" => Ok(ColorTheme::Green),
            "purple" => Ok(ColorTheme::Purple),
            "orange" => Ok(ColorTheme::Orange),
            _ => Err(ExportError::InvalidTheme {
                theme: s.to_string(),
            }),
        }
    }
}

/// ランキングの表示方法（PDFのメンバーテンプレートで使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankingDisplay {
    #[default]
    Table,
    Cards,
}

impl FromStr for RankingDisplay {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(RankingDisplay::Table),
            "cards" => Ok(RankingDisplay::Cards),
            _ => Err(ExportError::InvalidData {
                message: format!("unknown ranking display: {}", s),
            }),
        }
    }
}

/// レポート出力オプション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportOptions {
    pub include_general_stats: bool,
    pub include_daily_activity: bool,
    pub include_member_ranking: bool,
    pub include_hourly_activity: bool,
    pub include_insights: bool,
    /// ランキングに含める人数（負の値は全員）
    pub max_members_in_ranking: i32,
    pub color_theme: ColorTheme,
    pub ranking_display: RankingDisplay,
}

impl ReportOptions {
    /// ランキングの上限人数。`None` は無制限
    pub fn ranking_limit(&self) -> Option<usize> {
        usize::try_from(self.max_members_in_ranking).ok()
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_general_stats: true,
            include_daily_activity: true,
            include_member_ranking: true,
            include_hourly_activity: true,
            include_insights: true,
            max_members_in_ranking: 10,
            color_theme: ColorTheme::Blue,
            ranking_display: RankingDisplay::Table,
        }
    }
}

/// 対象グループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// 集計期間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// `dd/mm/yyyy - dd/mm/yyyy` 形式
    pub fn format_range(&self) -> String {
        format!(
            "{} - {}",
            locale::format_date(self.start_date),
            locale::format_date(self.end_date)
        )
    }
}

/// レポート生成リクエスト
///
/// 1回のエクスポート操作ごとに作られ、どのレンダラーからも変更されない。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub group: GroupRef,
    pub period: ReportPeriod,
    pub template: ReportTemplate,
    pub format: ExportFormat,
    #[serde(default)]
    pub options: ReportOptions,
    pub stats: DetailedStats,
    /// 生成日時（未指定なら生成時点の現在時刻）
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl ReportRequest {
    pub fn generated_at_local(&self) -> DateTime<Local> {
        self.generated_at
            .unwrap_or_else(Utc::now)
            .with_timezone(&Local)
    }
}

/// 生成されたレポート
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportArtifact {
    /// BOM付きUTF-8のCSVテキスト
    Text(String),
    /// PDFドキュメント
    Document(Vec<u8>),
    /// PNG画像
    Image(Vec<u8>),
}

impl ReportArtifact {
    pub fn format(&self) -> ExportFormat {
        match self {
            ReportArtifact::Text(_) => ExportFormat::Csv,
            ReportArtifact::Document(_) => ExportFormat::Pdf,
            ReportArtifact::Image(_) => ExportFormat::Png,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ReportArtifact::Text(text) => text.as_bytes(),
            ReportArtifact::Document(bytes) | ReportArtifact::Image(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ReportArtifact::Text(text) => text.into_bytes(),
            ReportArtifact::Document(bytes) | ReportArtifact::Image(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// エクスポートエラー
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid color theme: {theme} (expected blue, green, purple or orange)")]
    InvalidTheme { theme: String },

    #[error("Invalid template: {template} (expected complete or members)")]
    InvalidTemplate { template: String },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Image generation failed: {0}")]
    Image(String),
}

/// フォーマットハンドラートレイト
pub trait FormatHandler: Send + Sync {
    fn render(&self, request: &ReportRequest) -> Result<ReportArtifact, ExportError>;
    fn format(&self) -> ExportFormat;
}

/// エクスポートマネージャー
///
/// `request.format` に対応するハンドラーへ振り分けるだけで、既定形式へのフォールバックはしない。
pub struct ExportManager {
    format_handlers: HashMap<ExportFormat, Box<dyn FormatHandler>>,
}

impl ExportManager {
    /// 新しいエクスポートマネージャーを作成
    pub fn new() -> Self {
        let mut manager = Self::empty();

        // デフォルトハンドラーを登録
        manager.register_handler(Box::new(CsvExporter::new()));
        manager.register_handler(Box::new(PdfExporter::new()));
        manager.register_handler(Box::new(PngExporter::new()));

        manager
    }

    /// ハンドラー未登録のマネージャー
    pub fn empty() -> Self {
        Self {
            format_handlers: HashMap::new(),
        }
    }

    /// フォーマットハンドラーを登録
    pub fn register_handler(&mut self, handler: Box<dyn FormatHandler>) {
        self.format_handlers.insert(handler.format(), handler);
    }

    /// サポートされている形式を取得
    pub fn supported_formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|format| self.format_handlers.contains_key(format))
            .collect()
    }

    /// リクエストの妥当性を検証
    ///
    /// メッセージ数が0件かどうかは呼び出し側の責務なのでここでは見ない。
    pub fn validate_request(&self, request: &ReportRequest) -> Result<(), ExportError> {
        if !self.format_handlers.contains_key(&request.format) {
            return Err(ExportError::UnsupportedFormat {
                format: request.format.to_string(),
            });
        }

        if request.period.start_date > request.period.end_date {
            return Err(ExportError::InvalidData {
                message: "period start must not be after end".to_string(),
            });
        }

        Ok(())
    }

    /// レポートを生成
    pub fn generate(&self, request: &ReportRequest) -> Result<ReportArtifact, ExportError> {
        self.validate_request(request)?;

        let handler = self
            .format_handlers
            .get(&request.format)
            .ok_or_else(|| ExportError::UnsupportedFormat {
                format: request.format.to_string(),
            })?;

        let artifact = handler.render(request)?;

        tracing::info!(
            group = %request.group.name,
            format = %request.format,
            template = request.template.as_str(),
            size_bytes = artifact.len(),
            "📄 Report generated"
        );

        Ok(artifact)
    }
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// ダウンロード用のファイル名を提案
pub fn suggested_file_name(request: &ReportRequest) -> String {
    format!(
        "relatorio-{}-{}-{}-{}.{}",
        slugify(&request.group.name),
        request.template.as_str(),
        request.period.start_date.format("%Y-%m-%d"),
        request.period.end_date.format("%Y-%m-%d"),
        request.format.file_extension()
    )
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase).map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "grupo".to_string()
    } else {
        trimmed.to_string()
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_export_format_extensions() {
        assert_eq!(ExportFormat::Csv.file_extension(), "csv");
        assert_eq!(ExportFormat::Pdf.file_extension(), "pdf");
        assert_eq!(ExportFormat::Png.file_extension(), "png");
        assert_eq!(ExportFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = "xlsx".parse::<ExportFormat>();
        assert!(matches!(result, Err(ExportError::UnsupportedFormat { .. })));
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
    }

    #[test]
    fn test_unknown_theme_fails_fast() {
        let result = "magenta".parse::<ColorTheme>();
        assert!(matches!(result, Err(ExportError::InvalidTheme { .. })));

        let json = r#"{"colorTheme": "magenta"}"#;
        assert!(serde_json::from_str::<ReportOptions>(json).is_err());
    }

    #[test]
    fn test_ranking_limit() {
        let mut options = ReportOptions::default();
        assert_eq!(options.ranking_limit(), Some(10));
        options.max_members_in_ranking = -1;
        assert_eq!(options.ranking_limit(), None);
        options.max_members_in_ranking = 0;
        assert_eq!(options.ranking_limit(), Some(0));
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let json = r#"{"includeInsights": false, "maxMembersInRanking": -1,
            "colorTheme": "purple", "rankingDisplay": "cards"}"#;
        let options: ReportOptions = serde_json::from_str(json).unwrap();
        assert!(!options.include_insights);
        assert!(options.include_general_stats);
        assert_eq!(options.ranking_limit(), None);
        assert_eq!(options.color_theme, ColorTheme::Purple);
        assert_eq!(options.ranking_display, RankingDisplay::Cards);
    }

    #[test]
    fn test_dispatch_by_format() {
        let manager = ExportManager::new();
        for format in ExportFormat::ALL {
            let req = request(format, ReportTemplate::Complete, scenario_stats());
            let artifact = manager.generate(&req).unwrap();
            assert_eq!(artifact.format(), format);
            assert!(!artifact.is_empty());
        }
    }

    #[test]
    fn test_unregistered_handler() {
        let mut manager = ExportManager::empty();
        manager.register_handler(Box::new(CsvExporter::new()));
        assert_eq!(manager.supported_formats(), vec![ExportFormat::Csv]);

        let req = request(ExportFormat::Pdf, ReportTemplate::Complete, scenario_stats());
        let result = manager.generate(&req);
        assert!(matches!(result, Err(ExportError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_inverted_period_is_invalid() {
        let manager = ExportManager::new();
        let mut req = request(ExportFormat::Csv, ReportTemplate::Complete, scenario_stats());
        std::mem::swap(&mut req.period.start_date, &mut req.period.end_date);
        assert!(matches!(
            manager.generate(&req),
            Err(ExportError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_suggested_file_name() {
        let req = request(ExportFormat::Pdf, ReportTemplate::Members, scenario_stats());
        assert_eq!(
            suggested_file_name(&req),
            "relatorio-familia-silva-members-2024-03-01-2024-03-10.pdf"
        );
        assert_eq!(slugify("  !!  "), "grupo");
        assert_eq!(slugify("Equipe 42 - Vendas"), "equipe-42-vendas");
    }

    #[test]
    fn test_period_format_range() {
        let req = request(ExportFormat::Csv, ReportTemplate::Complete, scenario_stats());
        assert_eq!(req.period.format_range(), "01/03/2024 - 10/03/2024");
    }
}
