//! Drawing surface contract and the best-effort command executor.
//!
//! Arc angles are radians measured from +x, growing clockwise (y points
//! down). Every shape is given in the current user space, which is the
//! canvas moved by the `translate`/`rotate` stack.

use std::f64::consts::TAU;

use tracing::warn;

use crate::error::DrawError;

// ---------- COLOR & PAINT ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgb),
    /// Two-point linear gradient. Stops are `(offset, color)` with offsets in
    /// `0..=1`, in increasing order.
    LinearGradient {
        from: (f64, f64),
        to: (f64, f64),
        stops: Vec<(f64, Rgb)>,
    },
}

impl Paint {
    pub fn linear(from: (f64, f64), to: (f64, f64), stops: Vec<(f64, Rgb)>) -> Result<Self, DrawError> {
        if stops.is_empty() {
            return Err(DrawError::InvalidGeometry("gradient without stops".to_string()));
        }
        if stops.iter().any(|(offset, _)| !(0.0..=1.0).contains(offset)) {
            return Err(DrawError::InvalidGeometry("gradient stop outside 0..=1".to_string()));
        }
        if stops.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(DrawError::InvalidGeometry("gradient stops out of order".to_string()));
        }
        Ok(Paint::LinearGradient { from, to, stops })
    }
}

// ---------- TEXT ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    Small,
    Medium,
    Large,
    Title,
}

impl FontSize {
    pub fn px(self) -> f32 {
        match self {
            FontSize::Small => 24.0,
            FontSize::Medium => 32.0,
            FontSize::Large => 44.0,
            FontSize::Title => 64.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub size: FontSize,
}

impl FontSpec {
    pub const fn new(weight: FontWeight, size: FontSize) -> Self {
        Self { weight, size }
    }
}

/// Horizontal anchor of `fill_text`; `y` is always the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

// ---------- ARC ----------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSpec {
    pub center: (f64, f64),
    pub radius: f64,
    pub start: f64,
    pub end: f64,
}

impl ArcSpec {
    pub fn new(center: (f64, f64), radius: f64, start: f64, end: f64) -> Self {
        Self {
            center,
            radius,
            start,
            end,
        }
    }

    pub fn full_circle(center: (f64, f64), radius: f64) -> Self {
        Self::new(center, radius, 0.0, TAU)
    }

    /// Clockwise sweep from `start` to `end`. An end behind the start wraps
    /// around; a difference of a full turn or more is a whole circle.
    pub fn sweep(&self) -> f64 {
        let raw = self.end - self.start;
        if raw >= TAU {
            TAU
        } else {
            raw.rem_euclid(TAU)
        }
    }

    pub fn validate(&self) -> Result<(), DrawError> {
        let values = [self.center.0, self.center.1, self.radius, self.start, self.end];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DrawError::InvalidGeometry(format!("non-finite arc {self:?}")));
        }
        if self.radius <= 0.0 {
            return Err(DrawError::InvalidGeometry(format!("arc radius {}", self.radius)));
        }
        Ok(())
    }
}

// ---------- SURFACE ----------

pub trait DrawingSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) -> Result<(), DrawError>;
    fn stroke_arc(&mut self, arc: &ArcSpec, line_width: f64, paint: &Paint) -> Result<(), DrawError>;
    fn fill_arc(&mut self, arc: &ArcSpec, paint: &Paint) -> Result<(), DrawError>;
    fn line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, paint: &Paint) -> Result<(), DrawError>;

    fn save(&mut self);
    fn restore(&mut self) -> Result<(), DrawError>;
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);

    fn fill_text(
        &mut self,
        text: &str,
        position: (f64, f64),
        font: FontSpec,
        align: TextAlign,
        color: Rgb,
    ) -> Result<(), DrawError>;
    fn measure_text(&self, text: &str, font: FontSpec) -> Result<f64, DrawError>;
}

// ---------- COMMANDS ----------

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    StrokeArc {
        arc: ArcSpec,
        line_width: f64,
        paint: Paint,
    },
    FillArc {
        arc: ArcSpec,
        paint: Paint,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        line_width: f64,
        paint: Paint,
    },
    Save,
    Restore,
    Translate {
        dx: f64,
        dy: f64,
    },
    Rotate {
        radians: f64,
    },
    Text {
        text: String,
        position: (f64, f64),
        font: FontSpec,
        align: TextAlign,
        color: Rgb,
    },
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DrawCommand::FillRect { .. } => "fill_rect",
            DrawCommand::StrokeArc { .. } => "stroke_arc",
            DrawCommand::FillArc { .. } => "fill_arc",
            DrawCommand::Line { .. } => "line",
            DrawCommand::Save => "save",
            DrawCommand::Restore => "restore",
            DrawCommand::Translate { .. } => "translate",
            DrawCommand::Rotate { .. } => "rotate",
            DrawCommand::Text { .. } => "text",
        }
    }

    pub fn apply<S: DrawingSurface + ?Sized>(&self, surface: &mut S) -> Result<(), DrawError> {
        match self {
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                paint,
            } => surface.fill_rect(*x, *y, *width, *height, paint),
            DrawCommand::StrokeArc {
                arc,
                line_width,
                paint,
            } => surface.stroke_arc(arc, *line_width, paint),
            DrawCommand::FillArc { arc, paint } => surface.fill_arc(arc, paint),
            DrawCommand::Line {
                from,
                to,
                line_width,
                paint,
            } => surface.line(*from, *to, *line_width, paint),
            DrawCommand::Save => {
                surface.save();
                Ok(())
            }
            DrawCommand::Restore => surface.restore(),
            DrawCommand::Translate { dx, dy } => {
                surface.translate(*dx, *dy);
                Ok(())
            }
            DrawCommand::Rotate { radians } => {
                surface.rotate(*radians);
                Ok(())
            }
            DrawCommand::Text {
                text,
                position,
                font,
                align,
                color,
            } => surface.fill_text(text, *position, *font, *align, *color),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub executed: usize,
    pub failed: usize,
    /// Index into the command list and the error it produced.
    pub errors: Vec<(usize, DrawError)>,
}

/// Runs every command; a failing command is logged and skipped.
pub fn execute<S: DrawingSurface + ?Sized>(commands: &[DrawCommand], surface: &mut S) -> RenderReport {
    let mut report = RenderReport::default();
    for (index, command) in commands.iter().enumerate() {
        match command.apply(surface) {
            Ok(()) => report.executed += 1,
            Err(e) => {
                warn!(target: "dial_render", "Draw command #{index} ({}) failed: {e}", command.name());
                report.failed += 1;
                report.errors.push((index, e));
            }
        }
    }
    report
}
