use super::{
    ExportError, ExportFormat, FormatHandler, ReportArtifact, ReportRequest, ReportTemplate,
};
use crate::analytics::stats::{format_percentage, participation, DetailedStats};

const BOM: char = '\u{FEFF}';

/// CSVの1セクション（タイトル行・列ヘッダー行・データ行）
struct CsvSection {
    title: &'static str,
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

/// CSV形式エクスポーター
pub struct CsvExporter {
    delimiter: char,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// CSVフィールドをエスケープ
    fn escape_csv_field(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// BOM付きのCSVテキストを生成
    pub fn render_text(&self, request: &ReportRequest) -> String {
        let sections = match request.template {
            ReportTemplate::Complete => self.complete_sections(request),
            ReportTemplate::Members => vec![self.full_ranking_section(request)],
        };

        tracing::debug!(
            sections = sections.len(),
            template = request.template.as_str(),
            "🧾 CSV sections built"
        );

        let mut csv_content = String::new();
        csv_content.push(BOM);

        let delimiter = self.delimiter.to_string();
        let blocks: Vec<String> = sections
            .iter()
            .map(|section| {
                let mut lines = Vec::with_capacity(section.rows.len() + 2);
                lines.push(self.escape_csv_field(section.title));
                lines.push(section.headers.join(delimiter.as_str()));
                for row in &section.rows {
                    let fields: Vec<String> =
                        row.iter().map(|field| self.escape_csv_field(field)).collect();
                    lines.push(fields.join(delimiter.as_str()));
                }
                lines.join("\n")
            })
            .collect();

        csv_content.push_str(&blocks.join("\n\n"));
        csv_content.push('\n');
        csv_content
    }

    fn complete_sections(&self, request: &ReportRequest) -> Vec<CsvSection> {
        let options = &request.options;
        let stats = &request.stats;
        let mut sections = Vec::new();

        if options.include_general_stats {
            sections.push(general_stats_section(stats));
        }

        if options.include_member_ranking {
            let rows = stats
                .ranked_members(options.ranking_limit())
                .iter()
                .enumerate()
                .map(|(index, member)| {
                    vec![
                        (index + 1).to_string(),
                        member.name.clone(),
                        member.message_count.to_string(),
                        format_percentage(stats.participation_of(member)),
                    ]
                })
                .collect();

            sections.push(CsvSection {
                title: "Ranking de Membros",
                headers: &["Posição", "Nome", "Mensagens", "Participação (%)"],
                rows,
            });
        }

        if options.include_hourly_activity {
            let rows = stats
                .hourly_activity
                .iter()
                .map(|(hour, count)| vec![format!("{}:00", hour), count.to_string()])
                .collect();

            sections.push(CsvSection {
                title: "Atividade por Hora",
                headers: &["Hora", "Mensagens"],
                rows,
            });
        }

        if options.include_daily_activity {
            let rows = stats
                .daily_stats
                .iter()
                .map(|(date, count)| vec![date.clone(), count.to_string()])
                .collect();

            sections.push(CsvSection {
                title: "Atividade Diária",
                headers: &["Data", "Mensagens"],
                rows,
            });
        }

        sections
    }

    /// メンバーテンプレート用（オプションのセクション指定は無視）
    fn full_ranking_section(&self, request: &ReportRequest) -> CsvSection {
        let stats = &request.stats;
        let rows = stats
            .ranked_members(request.options.ranking_limit())
            .iter()
            .enumerate()
            .map(|(index, member)| {
                vec![
                    (index + 1).to_string(),
                    member.name.clone(),
                    member.message_count.to_string(),
                    format_percentage(participation(member.message_count, stats.total_messages)),
                    member.word_count.unwrap_or(0).to_string(),
                ]
            })
            .collect();

        CsvSection {
            title: "Ranking Completo de Membros",
            headers: &[
                "Posição",
                "Nome",
                "Mensagens",
                "Participação (%)",
                "Total de Palavras",
            ],
            rows,
        }
    }
}

fn general_stats_section(stats: &DetailedStats) -> CsvSection {
    let metric = |name: &str, value: u64| vec![name.to_string(), value.to_string()];

    CsvSection {
        title: "Estatísticas Gerais",
        headers: &["Métrica", "Valor"],
        rows: vec![
            metric("Total de Mensagens", stats.total_messages),
            metric("Total de Palavras", stats.total_words.unwrap_or(0)),
            metric("Membros Ativos", stats.active_members),
            metric("Dias Analisados", stats.days_analyzed),
            metric("Média por Dia", stats.average_per_day()),
        ],
    }
}

impl FormatHandler for CsvExporter {
    fn render(&self, request: &ReportRequest) -> Result<ReportArtifact, ExportError> {
        Ok(ReportArtifact::Text(self.render_text(request)))
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}
