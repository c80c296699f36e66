use tiny_skia::Color;

use super::canvas::{color, white, Canvas, TextAlign, TextStyle};
use super::locale::format_thousands;
use super::{
    ExportError, ExportFormat, FormatHandler, ReportArtifact, ReportRequest, ReportTemplate,
    ThemePalette,
};
use crate::analytics::stats::{format_percentage, MemberStats};

pub const CANVAS_WIDTH: u32 = 800;
pub const COMPLETE_HEIGHT: u32 = 600;
pub const MEMBERS_HEIGHT: u32 = 1040;

const PADDING: f32 = 40.0;
const CONTENT_WIDTH: f32 = CANVAS_WIDTH as f32 - PADDING * 2.0;
const HEADER_HEIGHT: f32 = 130.0;

const COMPLETE_TOP_MEMBERS: usize = 3;
const MEMBERS_LIST_LIMIT: usize = 8;

fn gold() -> Color {
    Color::from_rgba8(255, 215, 0, 255)
}

fn silver() -> Color {
    Color::from_rgba8(192, 192, 192, 255)
}

fn bronze() -> Color {
    Color::from_rgba8(205, 127, 50, 255)
}

fn text_dark() -> Color {
    Color::from_rgba8(31, 41, 55, 255)
}

fn text_muted() -> Color {
    Color::from_rgba8(107, 114, 128, 255)
}

fn border() -> Color {
    Color::from_rgba8(229, 231, 235, 255)
}

/// 上位3位のメダル色
fn medal_color(rank: usize) -> Option<Color> {
    match rank {
        1 => Some(gold()),
        2 => Some(silver()),
        3 => Some(bronze()),
        _ => None,
    }
}

/// 幅に収まる最大の拡大率を選ぶ
fn fit_scale(text: &str, max_width: f32, preferred: u32) -> u32 {
    (1..=preferred.max(1))
        .rev()
        .find(|&scale| TextStyle::new(scale, white()).measure(text) <= max_width)
        .unwrap_or(1)
}

/// PNG形式エクスポーター（1枚もののインフォグラフィック）
pub struct PngExporter;

impl PngExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn canvas_height(template: ReportTemplate) -> u32 {
        match template {
            ReportTemplate::Complete => COMPLETE_HEIGHT,
            ReportTemplate::Members => MEMBERS_HEIGHT,
        }
    }

    /// リクエストをキャンバスに描画
    pub fn draw(&self, request: &ReportRequest) -> Result<Canvas, ExportError> {
        let palette = request.options.color_theme.palette();
        let mut canvas = Canvas::new(CANVAS_WIDTH, Self::canvas_height(request.template))?;

        canvas.fill_vertical_gradient(color(palette.secondary), white());
        self.draw_header(&mut canvas, request, &palette);

        match request.template {
            ReportTemplate::Complete => {
                self.draw_metric_cards(&mut canvas, request, &palette);
                self.draw_top_members(&mut canvas, request, &palette);
            }
            ReportTemplate::Members => self.draw_member_list(&mut canvas, request, &palette),
        }

        Ok(canvas)
    }

    fn draw_header(&self, canvas: &mut Canvas, request: &ReportRequest, palette: &ThemePalette) {
        let x = PADDING;
        let y = PADDING;
        canvas.fill_rounded_rect(x, y, CONTENT_WIDTH, HEADER_HEIGHT, 16.0, white());
        canvas.fill_rect(x, y + 16.0, 6.0, HEADER_HEIGHT - 32.0, color(palette.primary));

        let title = TextStyle::new(4, text_dark()).bold();
        canvas.draw_text_clipped(
            &request.group.name,
            x + 30.0,
            y + 24.0,
            CONTENT_WIDTH - 60.0,
            &title,
        );

        let label = TextStyle::new(2, color(palette.accent)).bold();
        canvas.draw_text(request.template.label(), x + 30.0, y + 70.0, &label);

        let period = TextStyle::new(2, text_muted());
        canvas.draw_text(&request.period.format_range(), x + 30.0, y + 96.0, &period);
    }

    /// 横並びの指標カード3枚
    fn draw_metric_cards(
        &self,
        canvas: &mut Canvas,
        request: &ReportRequest,
        palette: &ThemePalette,
    ) {
        let stats = &request.stats;
        let gap = 20.0;
        let card_width = (CONTENT_WIDTH - gap * 2.0) / 3.0;
        let card_height = 120.0;
        let y = PADDING + HEADER_HEIGHT + 30.0;

        let metrics = [
            ("Mensagens", stats.total_messages, palette.primary),
            ("Membros", stats.active_members, palette.accent),
            ("Média/dia", stats.average_per_day(), palette.primary),
        ];

        for (index, (label, value, fill)) in metrics.into_iter().enumerate() {
            let x = PADDING + index as f32 * (card_width + gap);
            canvas.fill_rounded_rect(x, y, card_width, card_height, 14.0, color(fill));

            let inner = card_width - 16.0;
            let value_text = format_thousands(value);
            let value_style = TextStyle::new(fit_scale(&value_text, inner, 4), white())
                .bold()
                .align(TextAlign::Center);
            canvas.draw_text(&value_text, x + card_width / 2.0, y + 28.0, &value_style);

            let label_style =
                TextStyle::new(fit_scale(label, inner, 2), white()).align(TextAlign::Center);
            canvas.draw_text(label, x + card_width / 2.0, y + 82.0, &label_style);
        }
    }

    /// 上位メンバーの行カード（最大3件）
    fn draw_top_members(
        &self,
        canvas: &mut Canvas,
        request: &ReportRequest,
        palette: &ThemePalette,
    ) {
        let stats = &request.stats;
        let heading_y = PADDING + HEADER_HEIGHT + 175.0;
        let heading = TextStyle::new(2, color(palette.accent)).bold();
        canvas.draw_text("Top Membros", PADDING, heading_y, &heading);

        let row_height = 60.0;
        let members = stats
            .ranked_members(request.options.ranking_limit())
            .iter()
            .take(COMPLETE_TOP_MEMBERS);

        for (index, member) in members.enumerate() {
            let rank = index + 1;
            let y = heading_y + 30.0 + index as f32 * (row_height + 10.0);
            canvas.fill_rounded_rect(PADDING, y, CONTENT_WIDTH, row_height, 12.0, white());
            canvas.stroke_rounded_rect(
                PADDING,
                y,
                CONTENT_WIDTH,
                row_height,
                12.0,
                border(),
                1.0,
            );

            let badge = medal_color(rank).unwrap_or_else(|| color(palette.primary));
            let center_y = y + row_height / 2.0;
            self.draw_rank_badge(canvas, PADDING + 40.0, center_y, 20.0, rank, badge);

            let name = TextStyle::new(2, text_dark()).bold();
            canvas.draw_text_clipped(
                &member.name,
                PADDING + 80.0,
                y + 12.0,
                CONTENT_WIDTH - 100.0,
                &name,
            );
            let detail = TextStyle::new(2, text_muted());
            canvas.draw_text(
                &format!("{} mensagens", format_thousands(member.message_count)),
                PADDING + 80.0,
                y + 34.0,
                &detail,
            );
        }
    }

    /// メンバーランキング（最大8件）
    fn draw_member_list(
        &self,
        canvas: &mut Canvas,
        request: &ReportRequest,
        palette: &ThemePalette,
    ) {
        let stats = &request.stats;
        let card_height = 90.0;
        let gap = 10.0;
        let top = PADDING + HEADER_HEIGHT + 30.0;

        let members = stats
            .ranked_members(request.options.ranking_limit())
            .iter()
            .take(MEMBERS_LIST_LIMIT);

        for (index, member) in members.enumerate() {
            let rank = index + 1;
            let y = top + index as f32 * (card_height + gap);
            let pct = format_percentage(stats.participation_of(member));
            self.draw_member_card(canvas, member, rank, &pct, y, card_height, palette);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_member_card(
        &self,
        canvas: &mut Canvas,
        member: &MemberStats,
        rank: usize,
        pct: &str,
        y: f32,
        height: f32,
        palette: &ThemePalette,
    ) {
        let x = PADDING;
        canvas.fill_rounded_rect(x, y, CONTENT_WIDTH, height, 14.0, white());
        canvas.stroke_rounded_rect(x, y, CONTENT_WIDTH, height, 14.0, border(), 1.0);

        let badge_x = x + 50.0;
        let badge_y = y + height / 2.0;
        match medal_color(rank) {
            Some(medal) => self.draw_medal(canvas, badge_x, badge_y, rank, medal, palette),
            None => {
                let fill = color(palette.primary);
                self.draw_rank_badge(canvas, badge_x, badge_y, 24.0, rank, fill)
            }
        }

        let pill_width = 110.0;
        let pill_height = 40.0;
        let pill_x = x + CONTENT_WIDTH - 20.0 - pill_width;
        let pill_y = y + (height - pill_height) / 2.0;

        let name = TextStyle::new(3, text_dark()).bold();
        canvas.draw_text_clipped(
            &member.name,
            x + 100.0,
            y + 18.0,
            pill_x - (x + 100.0) - 16.0,
            &name,
        );
        let detail = TextStyle::new(2, text_muted());
        canvas.draw_text_clipped(
            &format!(
                "{} mensagens · {}% do total",
                format_thousands(member.message_count),
                pct
            ),
            x + 100.0,
            y + 56.0,
            pill_x - (x + 100.0) - 16.0,
            &detail,
        );

        canvas.fill_rounded_rect(
            pill_x,
            pill_y,
            pill_width,
            pill_height,
            pill_height / 2.0,
            color(palette.primary),
        );
        let pill_text = format!("{}%", pct);
        let pill_style = TextStyle::new(fit_scale(&pill_text, pill_width - 12.0, 2), white())
            .bold()
            .align(TextAlign::Center);
        canvas.draw_text(
            &pill_text,
            pill_x + pill_width / 2.0,
            pill_y + (pill_height - pill_style.line_height()) / 2.0,
            &pill_style,
        );
    }

    /// 番号入りの丸バッジ
    fn draw_rank_badge(
        &self,
        canvas: &mut Canvas,
        cx: f32,
        cy: f32,
        radius: f32,
        rank: usize,
        fill: Color,
    ) {
        canvas.fill_circle(cx, cy, radius, fill);
        let label = rank.to_string();
        let style = TextStyle::new(2, white()).bold().align(TextAlign::Center);
        canvas.draw_text(&label, cx, cy - style.line_height() / 2.0, &style);
    }

    /// 1〜3位用のメダル（リボン付き）
    fn draw_medal(
        &self,
        canvas: &mut Canvas,
        cx: f32,
        cy: f32,
        rank: usize,
        medal: Color,
        palette: &ThemePalette,
    ) {
        let ribbon = color(palette.accent);
        canvas.fill_triangle(
            [(cx - 16.0, cy - 34.0), (cx - 2.0, cy - 34.0), (cx - 8.0, cy - 8.0)],
            ribbon,
        );
        canvas.fill_triangle(
            [(cx + 2.0, cy - 34.0), (cx + 16.0, cy - 34.0), (cx + 8.0, cy - 8.0)],
            ribbon,
        );
        canvas.fill_circle(cx, cy + 4.0, 24.0, medal);
        canvas.fill_circle(cx, cy + 4.0, 18.0, Color::from_rgba8(255, 255, 255, 90));

        let style = TextStyle::new(2, text_dark()).bold().align(TextAlign::Center);
        canvas.draw_text(
            &rank.to_string(),
            cx,
            cy + 4.0 - style.line_height() / 2.0,
            &style,
        );
    }
}

impl FormatHandler for PngExporter {
    fn render(&self, request: &ReportRequest) -> Result<ReportArtifact, ExportError> {
        let canvas = self.draw(request)?;
        let bytes = canvas.encode_png()?;

        tracing::debug!(
            width = canvas.width(),
            height = canvas.height(),
            theme = ?request.options.color_theme,
            size_bytes = bytes.len(),
            "🖼️ PNG rendered"
        );

        Ok(ReportArtifact::Image(bytes))
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }
}

impl Default for PngExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::export::test_support::{many_members_stats, request, scenario_stats};
    use crate::analytics::export::ColorTheme;
    use tiny_skia::Pixmap;

    fn decode(artifact: ReportArtifact) -> Pixmap {
        assert_eq!(artifact.format(), ExportFormat::Png);
        Pixmap::decode_png(artifact.as_bytes()).unwrap()
    }

    fn close(a: u8, b: u8) -> bool {
        (a as i16 - b as i16).abs() <= 2
    }

    #[test]
    fn test_canvas_size_depends_on_template() {
        let exporter = PngExporter::new();

        let req = request(ExportFormat::Png, ReportTemplate::Complete, scenario_stats());
        let image = decode(exporter.render(&req).unwrap());
        assert_eq!((image.width(), image.height()), (CANVAS_WIDTH, COMPLETE_HEIGHT));

        let req = request(ExportFormat::Png, ReportTemplate::Members, many_members_stats(20));
        let image = decode(exporter.render(&req).unwrap());
        assert_eq!((image.width(), image.height()), (CANVAS_WIDTH, MEMBERS_HEIGHT));
    }

    #[test]
    fn test_background_uses_theme_secondary() {
        let exporter = PngExporter::new();
        for theme in [
            ColorTheme::Blue,
            ColorTheme::Green,
            ColorTheme::Purple,
            ColorTheme::Orange,
        ] {
            let mut req = request(ExportFormat::Png, ReportTemplate::Complete, scenario_stats());
            req.options.color_theme = theme;
            let canvas = exporter.draw(&req).unwrap();

            let secondary = theme.palette().secondary;
            let pixel = canvas.pixmap().pixel(2, 0).unwrap().demultiply();
            assert!(close(pixel.red(), secondary.0), "{:?}", theme);
            assert!(close(pixel.green(), secondary.1), "{:?}", theme);
            assert!(close(pixel.blue(), secondary.2), "{:?}", theme);
        }
    }

    #[test]
    fn test_first_metric_card_uses_primary() {
        let req = request(ExportFormat::Png, ReportTemplate::Complete, scenario_stats());
        let canvas = PngExporter::new().draw(&req).unwrap();
        let primary = ColorTheme::Blue.palette().primary;

        // カード左下寄り（文字のない位置）
        let x = PADDING as u32 + 8;
        let y = (PADDING + HEADER_HEIGHT + 30.0 + 110.0) as u32;
        let pixel = canvas.pixmap().pixel(x, y).unwrap().demultiply();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (primary.0, primary.1, primary.2));
    }

    #[test]
    fn test_zero_messages_and_empty_members() {
        let exporter = PngExporter::new();
        let mut stats = scenario_stats();
        stats.total_messages = 0;
        stats.days_analyzed = 0;
        stats.member_stats.clear();

        for template in [ReportTemplate::Complete, ReportTemplate::Members] {
            let req = request(ExportFormat::Png, template, stats.clone());
            let image = decode(exporter.render(&req).unwrap());
            assert_eq!(image.width(), CANVAS_WIDTH);
            assert_eq!(image.height(), PngExporter::canvas_height(template));
        }
    }

    #[test]
    fn test_fit_scale() {
        assert_eq!(fit_scale("123", 200.0, 4), 4);
        assert_eq!(fit_scale("1.234.567", 214.0, 4), 2);
        assert_eq!(fit_scale("um texto muito longo mesmo", 10.0, 3), 1);
    }
}
