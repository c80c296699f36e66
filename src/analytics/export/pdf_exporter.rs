use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::locale::{format_datetime, format_thousands};
use super::{
    ExportError, ExportFormat, FormatHandler, RankingDisplay, ReportArtifact, ReportRequest,
    ReportTemplate,
};
use crate::analytics::insights::InsightSummarizer;
use crate::analytics::stats::{format_percentage, DetailedStats, MemberStats};

// A4 (mm)
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN_X: f32 = 20.0;
pub const TOP_MARGIN: f32 = 20.0;
pub const PAGE_BOTTOM: f32 = 270.0;
pub const LINE_HEIGHT: f32 = 8.0;
pub const CARD_HEIGHT: f32 = 22.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_X * 2.0;
const CARD_GAP: f32 = 4.0;
const SECTION_GAP: f32 = 4.0;

const PT_PER_MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_PT: i64 = 595;
const PAGE_HEIGHT_PT: i64 = 842;

/// フォントの太さ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    fn resource_name(&self) -> &'static str {
        match self {
            FontWeight::Regular => "F1",
            FontWeight::Bold => "F2",
        }
    }
}

/// ページ上の描画要素（座標はページ左上原点のmm）
#[derive(Debug, Clone, PartialEq)]
pub enum PdfElement {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        text: String,
    },
    Card {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfPage {
    pub elements: Vec<PdfElement>,
}

impl PdfPage {
    /// ページ内のテキストを出現順に列挙
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            PdfElement::Text { text, .. } => Some(text.as_str()),
            PdfElement::Card { .. } => None,
        })
    }
}

/// 縦カーソルでページ送りを管理するレイアウト
///
/// 1行出力するたびにカーソルが下端を越えていないか確認し、越えていれば改ページする。
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pages: Vec<PdfPage>,
    cursor: f32,
}

impl PdfLayout {
    pub fn new() -> Self {
        Self {
            pages: vec![PdfPage::default()],
            cursor: TOP_MARGIN,
        }
    }

    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }

    /// 全ページのテキストを出現順に列挙
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| page.texts())
    }

    fn current_page(&mut self) -> &mut PdfPage {
        if self.pages.is_empty() {
            self.pages.push(PdfPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(PdfPage::default());
        self.cursor = TOP_MARGIN;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor + height > PAGE_BOTTOM {
            self.new_page();
        }
    }

    /// 1行出力（本文幅に収まらない分は `...` で省略）
    pub fn line(&mut self, text: impl Into<String>, size: f32, weight: FontWeight) {
        if self.cursor > PAGE_BOTTOM {
            self.new_page();
        }
        let y = self.cursor;
        let text = fit_to_width(text.into(), size, weight, CONTENT_WIDTH);
        self.current_page().elements.push(PdfElement::Text {
            x: MARGIN_X,
            y,
            size,
            weight,
            text,
        });
        self.cursor += LINE_HEIGHT;
    }

    pub fn gap(&mut self, height: f32) {
        self.cursor += height;
    }

    /// 枠付きカード（高さ固定）。収まらない場合は先に改ページする
    pub fn card(&mut self, rank_label: String, name: String, detail: String) {
        self.ensure_space(CARD_HEIGHT);

        let top = self.cursor;
        let width = CONTENT_WIDTH;
        let text_width = CONTENT_WIDTH - 25.0;
        let name = fit_to_width(name, 12.0, FontWeight::Bold, text_width);
        let detail = fit_to_width(detail, 10.0, FontWeight::Regular, text_width);
        let page = self.current_page();
        page.elements.push(PdfElement::Card {
            x: MARGIN_X,
            y: top,
            width,
            height: CARD_HEIGHT,
        });
        page.elements.push(PdfElement::Text {
            x: MARGIN_X + 5.0,
            y: top + 9.0,
            size: 12.0,
            weight: FontWeight::Bold,
            text: rank_label,
        });
        page.elements.push(PdfElement::Text {
            x: MARGIN_X + 20.0,
            y: top + 9.0,
            size: 12.0,
            weight: FontWeight::Bold,
            text: name,
        });
        page.elements.push(PdfElement::Text {
            x: MARGIN_X + 20.0,
            y: top + 16.0,
            size: 10.0,
            weight: FontWeight::Regular,
            text: detail,
        });

        self.cursor = top + CARD_HEIGHT + CARD_GAP;
    }

    /// 見出し。直後の1行と同じページに載るよう先に改ページする
    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_HEIGHT * 2.0);
        self.line(text, 14.0, FontWeight::Bold);
    }
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// PDF形式エクスポーター
pub struct PdfExporter {
    summarizer: InsightSummarizer,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self {
            summarizer: InsightSummarizer::new(),
        }
    }

    /// リクエストからページレイアウトを組み立てる
    pub fn layout(&self, request: &ReportRequest) -> PdfLayout {
        let mut layout = PdfLayout::new();

        match request.template {
            ReportTemplate::Complete => self.layout_complete(&mut layout, request),
            ReportTemplate::Members => self.layout_members(&mut layout, request),
        }

        tracing::debug!(
            pages = layout.pages().len(),
            template = request.template.as_str(),
            "📐 PDF layout built"
        );

        layout
    }

    fn layout_complete(&self, layout: &mut PdfLayout, request: &ReportRequest) {
        let options = &request.options;
        let stats = &request.stats;

        layout.line("Relatório de Atividade", 20.0, FontWeight::Bold);
        layout.line(request.group.name.as_str(), 14.0, FontWeight::Bold);
        layout.line(
            format!("Período: {}", request.period.format_range()),
            11.0,
            FontWeight::Regular,
        );
        layout.line(
            format!(
                "Gerado em: {}",
                format_datetime(&request.generated_at_local())
            ),
            9.0,
            FontWeight::Regular,
        );
        layout.gap(SECTION_GAP);

        if options.include_general_stats {
            layout.heading("Estatísticas Gerais");
            let metrics = [
                ("Total de Mensagens", stats.total_messages),
                ("Total de Palavras", stats.total_words.unwrap_or(0)),
                ("Membros Ativos", stats.active_members),
                ("Dias Analisados", stats.days_analyzed),
                ("Média por Dia", stats.average_per_day()),
            ];
            for (label, value) in metrics {
                layout.line(
                    format!("{}: {}", label, format_thousands(value)),
                    11.0,
                    FontWeight::Regular,
                );
            }
            layout.gap(SECTION_GAP);
        }

        if options.include_member_ranking {
            layout.heading("Ranking de Membros");
            for (index, member) in stats
                .ranked_members(options.ranking_limit())
                .iter()
                .enumerate()
            {
                layout.line(
                    ranking_line(index + 1, member, stats),
                    11.0,
                    FontWeight::Regular,
                );
            }
            layout.gap(SECTION_GAP);
        }

        if options.include_hourly_activity && !stats.hourly_activity.is_empty() {
            layout.heading("Atividade por Hora");
            for (hour, count) in &stats.hourly_activity {
                layout.line(
                    format!("{}:00 - {} mensagens", hour, format_thousands(*count)),
                    11.0,
                    FontWeight::Regular,
                );
            }
            layout.gap(SECTION_GAP);
        }

        if options.include_daily_activity && !stats.daily_stats.is_empty() {
            layout.heading("Atividade Diária");
            for (date, count) in &stats.daily_stats {
                layout.line(
                    format!("{} - {} mensagens", date, format_thousands(*count)),
                    11.0,
                    FontWeight::Regular,
                );
            }
            layout.gap(SECTION_GAP);
        }

        if options.include_insights {
            layout.heading("Insights");
            for insight in self.summarizer.summarize(stats) {
                layout.line(format!("• {}", insight), 11.0, FontWeight::Regular);
            }
        }
    }

    fn layout_members(&self, layout: &mut PdfLayout, request: &ReportRequest) {
        let stats = &request.stats;

        layout.line("Ranking Completo de Membros", 20.0, FontWeight::Bold);
        layout.line(request.group.name.as_str(), 14.0, FontWeight::Bold);
        layout.line(
            format!("Período: {}", request.period.format_range()),
            11.0,
            FontWeight::Regular,
        );
        layout.gap(SECTION_GAP);

        let ranked = stats.ranked_members(request.options.ranking_limit());
        for (index, member) in ranked.iter().enumerate() {
            let rank = index + 1;
            match request.options.ranking_display {
                RankingDisplay::Table => {
                    layout.line(ranking_line(rank, member, stats), 11.0, FontWeight::Regular)
                }
                RankingDisplay::Cards => layout.card(
                    format!("{}º", rank),
                    member.name.clone(),
                    format!(
                        "{} mensagens • {}% do total",
                        format_thousands(member.message_count),
                        format_percentage(stats.participation_of(member))
                    ),
                ),
            }
        }
    }

    /// レイアウトをPDFバイト列にエンコード
    pub fn encode(&self, layout: &PdfLayout, title: &str) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_font_id,
                "F2" => bold_font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(layout.pages().len());
        for page in layout.pages() {
            let content = Content {
                operations: page_operations(page),
            };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH_PT),
                Object::Integer(PAGE_HEIGHT_PT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(title)),
            "Producer" => Object::string_literal(concat!("wastats ", env!("CARGO_PKG_VERSION"))),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        tracing::debug!(
            pages = page_count,
            size_bytes = buffer.len(),
            "📄 PDF encoded"
        );

        Ok(buffer)
    }
}

/// Helvetica の文字幅（1000単位/em）の近似値
fn glyph_width_em(c: char, weight: FontWeight) -> f32 {
    let base = match c {
        'i' | 'j' | 'l' | 'í' | 'ì' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 278.0,
        ' ' | 'f' | 't' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 333.0,
        'r' => 333.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 944.0,
        c if c.is_ascii_digit() => 556.0,
        c if c.is_uppercase() => 722.0,
        _ => 556.0,
    };
    match weight {
        FontWeight::Regular => base,
        FontWeight::Bold => base + 40.0,
    }
}

/// 描画幅の見積もり(mm)
fn text_width_mm(text: &str, size: f32, weight: FontWeight) -> f32 {
    let em: f32 = text.chars().map(|c| glyph_width_em(c, weight)).sum();
    em / 1000.0 * size / PT_PER_MM
}

/// 最大幅(mm)を越える場合は末尾を `...` で省略
fn fit_to_width(text: String, size: f32, weight: FontWeight, max_width: f32) -> String {
    if text_width_mm(&text, size, weight) <= max_width {
        return text;
    }
    let budget = max_width - text_width_mm("...", size, weight);
    let mut fitted = String::new();
    let mut width = 0.0;
    for c in text.chars() {
        let w = glyph_width_em(c, weight) / 1000.0 * size / PT_PER_MM;
        if width + w > budget {
            break;
        }
        width += w;
        fitted.push(c);
    }
    let mut fitted = fitted.trim_end().to_string();
    fitted.push_str("...");
    fitted
}

/// `{rank}º {name} - {count} mensagens ({pct}%)`
fn ranking_line(rank: usize, member: &MemberStats, stats: &DetailedStats) -> String {
    format!(
        "{}º {} - {} mensagens ({}%)",
        rank,
        member.name,
        format_thousands(member.message_count),
        format_percentage(stats.participation_of(member))
    )
}

fn mm_to_pt(mm: f32) -> i64 {
    (mm * PT_PER_MM).round() as i64
}

/// 上端からのmmをPDFの下端原点の座標に変換
fn y_to_pt(y: f32) -> i64 {
    PAGE_HEIGHT_PT - mm_to_pt(y)
}

fn page_operations(page: &PdfPage) -> Vec<Operation> {
    let mut operations = Vec::new();

    for element in &page.elements {
        match element {
            PdfElement::Text {
                x,
                y,
                size,
                weight,
                text,
            } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![weight.resource_name().into(), (size.round() as i64).into()],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![mm_to_pt(*x).into(), y_to_pt(*y).into()],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(text))],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            PdfElement::Card {
                x,
                y,
                width,
                height,
            } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("g", vec![Object::Real(0.97)]));
                operations.push(Operation::new("G", vec![Object::Real(0.75)]));
                operations.push(Operation::new("w", vec![Object::Real(0.8)]));
                operations.push(Operation::new(
                    "re",
                    vec![
                        mm_to_pt(*x).into(),
                        y_to_pt(*y + *height).into(),
                        mm_to_pt(*width).into(),
                        mm_to_pt(*height).into(),
                    ],
                ));
                operations.push(Operation::new("B", vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }

    operations
}

/// 標準14フォント用にWinAnsiEncodingのバイト列へ変換（対応外の文字は `?`）
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

impl FormatHandler for PdfExporter {
    fn render(&self, request: &ReportRequest) -> Result<ReportArtifact, ExportError> {
        let layout = self.layout(request);
        let title = format!("{} - {}", request.template.label(), request.group.name);
        Ok(ReportArtifact::Document(self.encode(&layout, &title)?))
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::export::test_support::{many_members_stats, request, scenario_stats};

    fn ranking_lines(layout: &PdfLayout) -> Vec<String> {
        layout
            .texts()
            .filter(|text| text.contains("º ") && text.contains(" mensagens ("))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_complete_layout_order() {
        let req = request(ExportFormat::Pdf, ReportTemplate::Complete, scenario_stats());
        let layout = PdfExporter::new().layout(&req);
        let texts: Vec<&str> = layout.texts().collect();

        assert_eq!(texts[0], "Relatório de Atividade");
        assert_eq!(texts[1], "Família Silva");
        assert_eq!(texts[2], "Período: 01/03/2024 - 10/03/2024");
        assert!(texts[3].starts_with("Gerado em: "));

        let position = |needle: &str| texts.iter().position(|t| *t == needle).unwrap();
        assert!(position("Estatísticas Gerais") < position("Ranking de Membros"));
        assert!(position("Ranking de Membros") < position("Insights"));
        assert!(texts.contains(&"Total de Mensagens: 100"));
        assert!(texts.contains(&"1º A - 60 mensagens (60.0%)"));
        assert!(texts.contains(&"• Horário de pico: 18:00"));
    }

    #[test]
    fn test_thousands_separator() {
        let mut stats = scenario_stats();
        stats.total_messages = 1_234_567;
        let req = request(ExportFormat::Pdf, ReportTemplate::Complete, stats);
        let layout = PdfExporter::new().layout(&req);
        assert!(layout.texts().any(|t| t == "Total de Mensagens: 1.234.567"));
    }

    #[test]
    fn test_ranking_truncation_and_order() {
        let mut req = request(
            ExportFormat::Pdf,
            ReportTemplate::Complete,
            many_members_stats(50),
        );
        req.options.max_members_in_ranking = 5;
        let lines = ranking_lines(&PdfExporter::new().layout(&req));
        assert_eq!(lines.len(), 5);
        for (i, line) in lines.iter().enumerate() {
            let expected = format!("{}º {} - ", i + 1, req.stats.member_stats[i].name);
            assert!(line.starts_with(&expected), "{} / {}", line, expected);
        }

        req.options.max_members_in_ranking = -1;
        assert_eq!(ranking_lines(&PdfExporter::new().layout(&req)).len(), 50);
    }

    #[test]
    fn test_pagination_keeps_lines_above_bottom() {
        let mut req = request(
            ExportFormat::Pdf,
            ReportTemplate::Members,
            many_members_stats(80),
        );
        req.options.max_members_in_ranking = -1;
        let layout = PdfExporter::new().layout(&req);

        assert!(layout.pages().len() > 1);
        for page in layout.pages() {
            for element in &page.elements {
                if let PdfElement::Text { y, .. } = element {
                    assert!(*y >= TOP_MARGIN && *y <= PAGE_BOTTOM, "y = {}", y);
                }
            }
        }
        assert_eq!(ranking_lines(&layout).len(), 80);
    }

    #[test]
    fn test_cards_never_cross_page_bottom() {
        let mut req = request(
            ExportFormat::Pdf,
            ReportTemplate::Members,
            many_members_stats(30),
        );
        req.options.max_members_in_ranking = -1;
        req.options.ranking_display = RankingDisplay::Cards;
        let layout = PdfExporter::new().layout(&req);

        let mut cards = 0;
        for page in layout.pages() {
            for element in &page.elements {
                if let PdfElement::Card { y, height, .. } = element {
                    cards += 1;
                    assert!(*y + *height <= PAGE_BOTTOM);
                }
            }
        }
        assert_eq!(cards, 30);
        assert!(layout.pages().len() > 1);
        assert!(layout
            .texts()
            .any(|t| t == format!("{} mensagens • {}% do total", 300, "6.5")));
    }

    #[test]
    fn test_encoded_document_is_readable() {
        let mut req = request(
            ExportFormat::Pdf,
            ReportTemplate::Members,
            many_members_stats(80),
        );
        req.options.max_members_in_ranking = -1;
        let exporter = PdfExporter::new();
        let layout = exporter.layout(&req);

        let artifact = exporter.render(&req).unwrap();
        let bytes = artifact.into_bytes();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), layout.pages().len());
    }

    #[test]
    fn test_zero_messages_renders() {
        let mut stats = scenario_stats();
        stats.total_messages = 0;
        stats.days_analyzed = 0;
        let req = request(ExportFormat::Pdf, ReportTemplate::Complete, stats);
        let exporter = PdfExporter::new();

        let layout = exporter.layout(&req);
        assert!(layout.texts().any(|t| t == "1º A - 60 mensagens (0.0%)"));
        assert!(exporter.render(&req).unwrap().len() > 0);
    }

    #[test]
    fn test_headings_stay_with_their_first_line() {
        const HEADINGS: [&str; 5] = [
            "Estatísticas Gerais",
            "Ranking de Membros",
            "Atividade por Hora",
            "Atividade Diária",
            "Insights",
        ];

        for members in 1..=40 {
            let mut stats = many_members_stats(members);
            stats.hourly_activity = (8..12).map(|h| (format!("{:02}", h), h)).collect();
            stats.daily_stats = (1..=5).map(|d| (format!("2024-03-{:02}", d), d)).collect();
            let mut req = request(ExportFormat::Pdf, ReportTemplate::Complete, stats);
            req.options.max_members_in_ranking = -1;

            let layout = PdfExporter::new().layout(&req);
            for (index, page) in layout.pages().iter().enumerate() {
                let last = page.texts().last();
                assert!(
                    !last.map_or(false, |text| HEADINGS.contains(&text)),
                    "{} members: page {} ends with heading {:?}",
                    members,
                    index,
                    last
                );
            }
        }
    }

    #[test]
    fn test_long_text_is_truncated_to_page_width() {
        let mut stats = scenario_stats();
        stats.member_stats[0].name = "Maria ".repeat(60);
        let mut req = request(ExportFormat::Pdf, ReportTemplate::Members, stats);
        req.group.name = "Grupo com um nome extremamente comprido ".repeat(10);

        let layout = PdfExporter::new().layout(&req);
        for page in layout.pages() {
            for element in &page.elements {
                if let PdfElement::Text {
                    x,
                    size,
                    weight,
                    text,
                    ..
                } = element
                {
                    assert!(
                        *x + text_width_mm(text, *size, *weight) <= PAGE_WIDTH - MARGIN_X + 0.01,
                        "{}",
                        text
                    );
                }
            }
        }
        let texts: Vec<&str> = layout.texts().collect();
        assert!(texts[1].starts_with("Grupo com um nome") && texts[1].ends_with("..."));
        assert!(texts.iter().any(|t| t.starts_with("1º Maria") && t.ends_with("...")));
        assert!(texts.contains(&"2º B - 40 mensagens (40.0%)"));

        req.options.ranking_display = RankingDisplay::Cards;
        let layout = PdfExporter::new().layout(&req);
        assert!(layout
            .texts()
            .any(|t| t.starts_with("Maria Maria") && t.ends_with("...")));
    }

    #[test]
    fn test_fit_to_width() {
        let short = "Curto".to_string();
        assert_eq!(fit_to_width(short, 11.0, FontWeight::Regular, 50.0), "Curto");

        let fitted = fit_to_width("a".repeat(200), 11.0, FontWeight::Regular, 40.0);
        assert!(fitted.ends_with("..."));
        assert!(text_width_mm(&fitted, 11.0, FontWeight::Regular) <= 40.0);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("1º"), vec![b'1', 0xBA]);
        assert_eq!(encode_win_ansi("• ã"), vec![0x95, b' ', 0xE3]);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }
}
