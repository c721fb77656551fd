//! `DrawingSurface` over a tiny-skia pixmap.
//!
//! Shapes go through tiny-skia paths with the surface transform; glyphs are
//! rasterized by rusttype into a small pixmap that is then drawn with the
//! same transform, so rotated labels follow the stack like everything else.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fs;
use std::path::Path;

use image::{Rgb as Pixel, RgbImage};
use rusttype::{point, Font, PositionedGlyph, Scale};
use tiny_skia::{
    self as skia, Color, ColorU8, FillRule, FilterQuality, GradientStop, LineCap, Pixmap, PixmapPaint, Point,
    Rect, Shader, SpreadMode, Stroke, Transform,
};
use tracing::{info, warn};

use super::surface::{ArcSpec, DrawingSurface, FontSpec, FontWeight, Paint, Rgb, TextAlign};
use crate::error::DrawError;

// ---------- FONTS ----------

#[derive(Clone, Default)]
pub struct FontSet {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
}

impl FontSet {
    /// Loads both weights; a missing or unreadable file leaves that weight
    /// empty and text in it fails to draw.
    pub fn load(regular: &Path, bold: &Path) -> Self {
        Self {
            regular: load_font(regular),
            bold: load_font(bold),
        }
    }

    fn get(&self, weight: FontWeight) -> Result<&Font<'static>, DrawError> {
        let font = match weight {
            FontWeight::Regular => self.regular.as_ref(),
            FontWeight::Bold => self.bold.as_ref(),
        };
        font.ok_or(DrawError::FontUnavailable(weight))
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(target: "dial_render", "Font {} unavailable: {e}", path.display());
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        warn!(target: "dial_render", "Font {} could not be parsed", path.display());
    } else {
        info!(target: "dial_render", "Loaded font {}", path.display());
    }
    font
}

fn layout(font: &Font<'static>, text: &str, spec: FontSpec) -> Vec<PositionedGlyph<'static>> {
    font.layout(text, Scale::uniform(spec.size.px()), point(0.0, 0.0))
        .collect()
}

// ---------- PAINT & PATHS ----------

fn color(rgb: Rgb) -> Color {
    Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255)
}

fn to_skia_paint(paint: &Paint) -> Result<skia::Paint<'static>, DrawError> {
    let shader = match paint {
        Paint::Solid(rgb) => Shader::SolidColor(color(*rgb)),
        Paint::LinearGradient { from, to, stops } => {
            let stops = stops
                .iter()
                .map(|(offset, rgb)| GradientStop::new(*offset as f32, color(*rgb)))
                .collect();
            skia::LinearGradient::new(
                Point::from_xy(from.0 as f32, from.1 as f32),
                Point::from_xy(to.0 as f32, to.1 as f32),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )
            .ok_or_else(|| DrawError::InvalidGeometry(format!("gradient {from:?} -> {to:?}")))?
        }
    };
    Ok(skia::Paint {
        shader,
        anti_alias: true,
        ..skia::Paint::default()
    })
}

/// Clockwise arc as cubic segments of at most a quarter turn. With `pie` the
/// path runs out from the center and closes back to it.
fn arc_path(arc: &ArcSpec, pie: bool) -> Option<skia::Path> {
    let sweep = arc.sweep();
    let (cx, cy) = arc.center;
    let r = arc.radius;
    if sweep >= TAU {
        return skia::PathBuilder::from_circle(cx as f32, cy as f32, r as f32);
    }
    if sweep <= 0.0 {
        return None;
    }

    let segments = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / segments as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan() * r;
    let at = |angle: f64| (cx + r * angle.cos(), cy + r * angle.sin());

    let mut pb = skia::PathBuilder::new();
    let (sx, sy) = at(arc.start);
    if pie {
        pb.move_to(cx as f32, cy as f32);
        pb.line_to(sx as f32, sy as f32);
    } else {
        pb.move_to(sx as f32, sy as f32);
    }
    for i in 0..segments {
        let a0 = arc.start + step * i as f64;
        let a1 = a0 + step;
        let ((x0, y0), (x1, y1)) = (at(a0), at(a1));
        let ((s0, c0), (s1, c1)) = (a0.sin_cos(), a1.sin_cos());
        pb.cubic_to(
            (x0 - k * s0) as f32,
            (y0 + k * c0) as f32,
            (x1 + k * s1) as f32,
            (y1 - k * c1) as f32,
            x1 as f32,
            y1 as f32,
        );
    }
    if pie {
        pb.close();
    }
    pb.finish()
}

fn butt_stroke(line_width: f64) -> Stroke {
    Stroke {
        width: line_width as f32,
        line_cap: LineCap::Butt,
        ..Stroke::default()
    }
}

// ---------- SURFACE ----------

pub struct RasterSurface {
    pixmap: Pixmap,
    transform: Transform,
    stack: Vec<Transform>,
    fonts: FontSet,
}

impl RasterSurface {
    /// An opaque black canvas.
    pub fn new(width: u32, height: u32, fonts: FontSet) -> Result<Self, DrawError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(DrawError::Canvas { width, height })?;
        pixmap.fill(Color::BLACK);
        Ok(Self {
            pixmap,
            transform: Transform::identity(),
            stack: Vec::new(),
            fonts,
        })
    }

    pub fn to_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Pixel([c.red(), c.green(), c.blue()]);
        }
        image
    }

    /// Glyph coverage for `text` with the baseline origin at (0, 0), plus the
    /// offset of the pixmap's top-left corner from that origin.
    fn rasterize_text(&self, text: &str, font: FontSpec, rgb: Rgb) -> Result<Option<(Pixmap, i32, i32)>, DrawError> {
        let face = self.fonts.get(font.weight)?;
        let glyphs = layout(face, text, font);

        let boxes: Vec<_> = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).collect();
        let (min_x, min_y) = match (boxes.iter().map(|b| b.min.x).min(), boxes.iter().map(|b| b.min.y).min()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Ok(None),
        };
        let max_x = boxes.iter().map(|b| b.max.x).max().unwrap_or(min_x);
        let max_y = boxes.iter().map(|b| b.max.y).max().unwrap_or(min_y);
        let (width, height) = ((max_x - min_x) as u32, (max_y - min_y) as u32);
        let mut mask = Pixmap::new(width, height).ok_or(DrawError::Canvas { width, height })?;

        let pixels = mask.pixels_mut();
        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let x = (bb.min.x - min_x) as u32 + gx;
                let y = (bb.min.y - min_y) as u32 + gy;
                let idx = (y * width + x) as usize;
                let alpha = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                if let Some(px) = pixels.get_mut(idx) {
                    if alpha > px.alpha() {
                        *px = ColorU8::from_rgba(rgb.r, rgb.g, rgb.b, alpha).premultiply();
                    }
                }
            });
        }
        Ok(Some((mask, min_x, min_y)))
    }
}

impl DrawingSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) -> Result<(), DrawError> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(DrawError::InvalidGeometry(format!("rect {x},{y} {width}x{height}")));
        }
        if width == 0.0 || height == 0.0 {
            return Ok(());
        }
        let rect = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32)
            .ok_or_else(|| DrawError::InvalidGeometry(format!("rect {x},{y} {width}x{height}")))?;
        let paint = to_skia_paint(paint)?;
        self.pixmap.fill_rect(rect, &paint, self.transform, None);
        Ok(())
    }

    fn stroke_arc(&mut self, arc: &ArcSpec, line_width: f64, paint: &Paint) -> Result<(), DrawError> {
        arc.validate()?;
        if !(line_width.is_finite() && line_width > 0.0) {
            return Err(DrawError::InvalidGeometry(format!("line width {line_width}")));
        }
        let paint = to_skia_paint(paint)?;
        if let Some(path) = arc_path(arc, false) {
            self.pixmap
                .stroke_path(&path, &paint, &butt_stroke(line_width), self.transform, None);
        }
        Ok(())
    }

    fn fill_arc(&mut self, arc: &ArcSpec, paint: &Paint) -> Result<(), DrawError> {
        arc.validate()?;
        let paint = to_skia_paint(paint)?;
        if let Some(path) = arc_path(arc, true) {
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, self.transform, None);
        }
        Ok(())
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, paint: &Paint) -> Result<(), DrawError> {
        if ![from.0, from.1, to.0, to.1, line_width].iter().all(|v| v.is_finite()) || line_width <= 0.0 {
            return Err(DrawError::InvalidGeometry(format!("line {from:?} -> {to:?}")));
        }
        let paint = to_skia_paint(paint)?;
        let mut pb = skia::PathBuilder::new();
        pb.move_to(from.0 as f32, from.1 as f32);
        pb.line_to(to.0 as f32, to.1 as f32);
        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &paint, &butt_stroke(line_width), self.transform, None);
        }
        Ok(())
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) -> Result<(), DrawError> {
        self.transform = self.stack.pop().ok_or(DrawError::UnbalancedRestore)?;
        Ok(())
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self
            .transform
            .pre_concat(Transform::from_translate(dx as f32, dy as f32));
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees() as f32));
    }

    fn fill_text(
        &mut self,
        text: &str,
        position: (f64, f64),
        font: FontSpec,
        align: TextAlign,
        color: Rgb,
    ) -> Result<(), DrawError> {
        let advance = self.measure_text(text, font)?;
        let start_x = match align {
            TextAlign::Left => position.0,
            TextAlign::Center => position.0 - advance / 2.0,
            TextAlign::Right => position.0 - advance,
        };

        let Some((glyphs, offset_x, offset_y)) = self.rasterize_text(text, font, color)? else {
            return Ok(());
        };
        let transform = self
            .transform
            .pre_concat(Transform::from_translate(start_x as f32, position.1 as f32));
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(offset_x, offset_y, glyphs.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn measure_text(&self, text: &str, font: FontSpec) -> Result<f64, DrawError> {
        let face = self.fonts.get(font.weight)?;
        let glyphs = layout(face, text, font);
        Ok(glyphs
            .last()
            .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as f64)
            .unwrap_or(0.0))
    }
}
