//! PNG出力用の描画キャンバス
//!
//! 塗り色・フォントサイズ・揃え位置は毎回引数で渡す。描画状態を共有しないので、
//! ある描画呼び出しの設定が次の呼び出しに漏れることはない。

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, Rect,
    SpreadMode, Stroke, Transform,
};

use super::{ExportError, Rgb};

const GLYPH_SIZE: u32 = 8;

/// 水平方向の揃え
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// テキスト描画スタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// グリフ1ドットの拡大率（8 × scale px の文字になる）
    pub scale: u32,
    pub color: Color,
    pub align: TextAlign,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(scale: u32, color: Color) -> Self {
        Self {
            scale: scale.max(1),
            color,
            align: TextAlign::Left,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// 描画した時の文字列の幅(px)
    pub fn measure(&self, text: &str) -> f32 {
        let glyph_width = (GLYPH_SIZE * self.scale) as f32;
        let extra = if self.bold { 1.0 } else { 0.0 };
        text.chars().count() as f32 * glyph_width + extra
    }

    pub fn line_height(&self) -> f32 {
        (GLYPH_SIZE * self.scale) as f32
    }
}

pub fn color(rgb: Rgb) -> Color {
    Color::from_rgba8(rgb.0, rgb.1, rgb.2, 255)
}

pub fn white() -> Color {
    Color::from_rgba8(255, 255, 255, 255)
}

/// 固定サイズのキャンバス
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, ExportError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Image(format!("invalid canvas size {}x{}", width, height))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// 全面を上→下のグラデーションで塗る
    pub fn fill_vertical_gradient(&mut self, top: Color, bottom: Color) {
        let height = self.height() as f32;
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width() as f32, height) else {
            return;
        };
        let Some(shader) = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(0.0, height),
            vec![GradientStop::new(0.0, top), GradientStop::new(1.0, bottom)],
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            // 高さ1px等で勾配が作れない場合は単色
            self.pixmap.fill(top);
            return;
        };

        let paint = Paint {
            shader,
            ..Paint::default()
        };
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let mut paint = Paint::default();
            paint.set_color(fill);
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    pub fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, fill: Color) {
        if let Some(path) = rounded_rect_path(x, y, w, h, radius) {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn stroke_rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        stroke_color: Color,
        width: f32,
    ) {
        if let Some(path) = rounded_rect_path(x, y, w, h, radius) {
            let mut paint = Paint::default();
            paint.set_color(stroke_color);
            paint.anti_alias = true;
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, fill: Color) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    pub fn fill_triangle(&mut self, points: [(f32, f32); 3], fill: Color) {
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].0, points[0].1);
        pb.line_to(points[1].0, points[1].1);
        pb.line_to(points[2].0, points[2].1);
        pb.close();
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    /// ビットマップフォントで1行描画する（y は文字の上端）
    ///
    /// 対応外の文字は `?` で描く。
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let start_x = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - style.measure(text) / 2.0,
            TextAlign::Right => x - style.measure(text),
        };
        let dot = style.scale as f32;

        let mut paint = Paint::default();
        paint.set_color(style.color);

        for (index, c) in text.chars().enumerate() {
            let Some(rows) = glyph(c) else {
                continue;
            };
            let glyph_x = start_x + index as f32 * (GLYPH_SIZE * style.scale) as f32;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let px = glyph_x + col as f32 * dot;
                    let py = y + row as f32 * dot;
                    let width = if style.bold { dot + 1.0 } else { dot };
                    if let Some(rect) = Rect::from_xywh(px, py, width, dot) {
                        self.pixmap
                            .fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
            }
        }
    }

    /// 最大幅に収まるよう末尾を `...` で省略して描画
    pub fn draw_text_clipped(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: f32,
        style: &TextStyle,
    ) {
        let fitted = fit_text(text, max_width, style);
        self.draw_text(&fitted, x, y, style);
    }

    /// 可逆圧縮のPNGにエンコード（圧縮率最大）
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png::Compression::Best);
            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::Image(e.to_string()))?;
            writer
                .write_image_data(&rgba)
                .map_err(|e| ExportError::Image(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| ExportError::Image(e.to_string()))?;
        }

        Ok(out)
    }
}

fn glyph(c: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
}

fn fit_text(text: &str, max_width: f32, style: &TextStyle) -> String {
    if style.measure(text) <= max_width {
        return text.to_string();
    }
    let glyph_width = (GLYPH_SIZE * style.scale) as f32;
    let max_chars = (max_width / glyph_width).floor() as usize;
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut fitted: String = text.chars().take(max_chars - 3).collect();
    fitted.push_str("...");
    fitted
}

fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<tiny_skia::Path> {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}
