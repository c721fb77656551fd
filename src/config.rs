// Configuration for the dial canvas, palette and assets
use std::path::PathBuf;

use crate::render::Rgb;

pub const CANVAS_WIDTH: u32 = 1920;
pub const CANVAS_HEIGHT: u32 = 1080;
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Rgb,
    pub guide: Rgb,
    pub tick: Rgb,
    pub daylight: Rgb,
    pub night: Rgb,
    pub twilight: Rgb,
    pub moon: Rgb,
    pub marker_up: Rgb,
    pub marker_down: Rgb,
    pub title: Rgb,
    pub text: Rgb,
    pub muted_text: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::new(0x10, 0x14, 0x24),
            guide: Rgb::new(0x3a, 0x40, 0x58),
            tick: Rgb::new(0x8a, 0x90, 0xa8),
            daylight: Rgb::new(0xf5, 0xc0, 0x3c),
            night: Rgb::new(0x1c, 0x24, 0x44),
            twilight: Rgb::new(0xe0, 0x6a, 0x3a),
            moon: Rgb::new(0xc8, 0xd0, 0xe0),
            marker_up: Rgb::new(0x5a, 0xe0, 0x7a),
            marker_down: Rgb::new(0xe0, 0x4a, 0x4a),
            title: Rgb::new(0xff, 0xff, 0xff),
            text: Rgb::new(0xe8, 0xe8, 0xf0),
            muted_text: Rgb::new(0x9a, 0xa0, 0xb8),
        }
    }
}

/// Geometry is in canvas pixels. Only the canvas size, center and radii are
/// meant to be tuned; label slots are laid out for the default canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DialConfig {
    pub width: u32,
    pub height: u32,
    pub center: (f64, f64),
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub ring_width: f64,
    pub marker_radius: f64,
    pub palette: Palette,
    pub regular_font: PathBuf,
    pub bold_font: PathBuf,
    pub jpeg_quality: u8,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            center: (960.0, 560.0),
            outer_radius: 400.0,
            inner_radius: 330.0,
            ring_width: 36.0,
            marker_radius: 14.0,
            palette: Palette::default(),
            regular_font: PathBuf::from("assets/fonts/DejaVuSans.ttf"),
            bold_font: PathBuf::from("assets/fonts/DejaVuSans-Bold.ttf"),
            jpeg_quality: JPEG_QUALITY,
        }
    }
}
