//! The dial itself: geometry, layout and the ordered list of draw commands.
//!
//! The outer ring is the sun track and the inner ring the moon track. Every
//! clock position reaches the surface through `to_render_rotation`.

pub mod raster;
pub mod surface;

use std::f64::consts::TAU;

use tracing::{debug, info, warn};

use crate::config::DialConfig;
use crate::label_layout::{sunrise_slots, sunset_slots, Column, LabelSlot, SlotPair};
use crate::moon_window::MoonWindow;
use crate::service::AstronomicalSnapshot;
use crate::time_angle::{format_clock_12h, to_dial_angle, to_render_rotation, DialAngle, DEGREES_PER_HOUR};
use crate::twilight::TwilightWindow;

pub use raster::{FontSet, RasterSurface};
pub use surface::{
    execute, ArcSpec, DrawCommand, DrawingSurface, FontSize, FontSpec, FontWeight, Paint, RenderReport, Rgb,
    TextAlign,
};

const HOURS: u32 = 24;
const TICK_GAP: f64 = 6.0;
const MAJOR_TICK: f64 = 20.0;
const MINOR_TICK: f64 = 10.0;
const CARDINAL_GAP: f64 = 56.0;
const CAPTION_OFFSET: f64 = 42.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Up,
    Down,
}

/// Everything the plan needs, resolved from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DialLayout {
    pub sunrise: DialAngle,
    pub sunset: DialAngle,
    pub morning_twilight: TwilightWindow,
    pub evening_twilight: TwilightWindow,
    pub moon: MoonWindow,
    pub current: DialAngle,
    pub sun_state: MarkerState,
    pub moon_state: MarkerState,
    pub sunrise_slots: SlotPair,
    pub sunset_slots: SlotPair,
}

pub struct DialRenderer {
    config: DialConfig,
}

impl DialRenderer {
    pub fn new(config: DialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DialConfig {
        &self.config
    }

    pub fn layout(&self, snapshot: &AstronomicalSnapshot) -> DialLayout {
        let sunrise = to_dial_angle(&snapshot.sunrise);
        let sunset = to_dial_angle(&snapshot.sunset);
        let current = to_dial_angle(&snapshot.current_time);
        let moon = MoonWindow::resolve(snapshot.moonrise.as_deref(), snapshot.moonset.as_deref());

        let sun_state = if sunrise <= current && current <= sunset {
            MarkerState::Up
        } else {
            MarkerState::Down
        };
        let moon_state = if moon.contains(current) {
            MarkerState::Up
        } else {
            MarkerState::Down
        };

        DialLayout {
            sunrise,
            sunset,
            morning_twilight: TwilightWindow::morning(&snapshot.sunrise),
            evening_twilight: TwilightWindow::evening(&snapshot.sunset),
            moon,
            current,
            sun_state,
            moon_state,
            sunrise_slots: sunrise_slots(sunrise),
            sunset_slots: sunset_slots(sunset),
        }
    }

    /// Draw commands in painting order.
    pub fn plan(&self, snapshot: &AstronomicalSnapshot, title: &str) -> Vec<DrawCommand> {
        let layout = self.layout(snapshot);
        let mut commands = Vec::with_capacity(160);

        self.plan_background(&mut commands);
        self.plan_ticks(&mut commands);
        self.plan_sun_track(&layout, &mut commands);
        self.plan_moon_track(&layout, &mut commands);
        self.plan_markers(&layout, &mut commands);
        self.plan_labels(snapshot, &layout, title, &mut commands);

        debug!(target: "dial_render", "Planned {} draw commands", commands.len());
        commands
    }

    pub fn render<S: DrawingSurface + ?Sized>(
        &self,
        snapshot: &AstronomicalSnapshot,
        title: &str,
        surface: &mut S,
    ) -> RenderReport {
        let commands = self.plan(snapshot, title);
        let report = execute(&commands, surface);
        info!(
            target: "dial_render",
            "Rendered {title} for {}: {} commands, {} failed",
            snapshot.date,
            report.executed + report.failed,
            report.failed
        );
        report
    }

    // ---------- GEOMETRY ----------

    fn point_at(&self, angle: DialAngle, radius: f64) -> (f64, f64) {
        let rotation = to_render_rotation(angle);
        let (cx, cy) = self.config.center;
        (cx + radius * rotation.cos(), cy + radius * rotation.sin())
    }

    fn track_arc(&self, radius: f64, from: DialAngle, to: DialAngle) -> ArcSpec {
        if to.degrees() - from.degrees() >= 360.0 {
            return ArcSpec::full_circle(self.config.center, radius);
        }
        ArcSpec::new(self.config.center, radius, to_render_rotation(from), to_render_rotation(to))
    }

    // ---------- PLAN SECTIONS ----------

    fn plan_background(&self, commands: &mut Vec<DrawCommand>) {
        let c = &self.config;
        let palette = &c.palette;
        commands.push(DrawCommand::FillRect {
            x: 0.0,
            y: 0.0,
            width: c.width as f64,
            height: c.height as f64,
            paint: Paint::Solid(palette.background),
        });
        for radius in [c.outer_radius, c.inner_radius] {
            commands.push(DrawCommand::StrokeArc {
                arc: ArcSpec::full_circle(c.center, radius),
                line_width: c.ring_width,
                paint: Paint::Solid(palette.night),
            });
            commands.push(DrawCommand::StrokeArc {
                arc: ArcSpec::full_circle(c.center, radius + c.ring_width / 2.0),
                line_width: 2.0,
                paint: Paint::Solid(palette.guide),
            });
        }
    }

    fn plan_ticks(&self, commands: &mut Vec<DrawCommand>) {
        let c = &self.config;
        let start = c.outer_radius + c.ring_width / 2.0 + TICK_GAP;

        for hour in 0..HOURS {
            let angle = DialAngle::from_degrees(hour as f64 * DEGREES_PER_HOUR);
            let (length, width) = if hour % 6 == 0 { (MAJOR_TICK, 4.0) } else { (MINOR_TICK, 2.0) };
            commands.push(DrawCommand::Save);
            commands.push(DrawCommand::Translate {
                dx: c.center.0,
                dy: c.center.1,
            });
            commands.push(DrawCommand::Rotate {
                radians: to_render_rotation(angle),
            });
            commands.push(DrawCommand::Line {
                from: (start, 0.0),
                to: (start + length, 0.0),
                line_width: width,
                paint: Paint::Solid(c.palette.tick),
            });
            commands.push(DrawCommand::Restore);
        }

        let font = FontSpec::new(FontWeight::Bold, FontSize::Small);
        let radius = start + MAJOR_TICK + CARDINAL_GAP;
        for (hour, label) in [(0.0, "MIDNIGHT"), (6.0, "6 AM"), (12.0, "NOON"), (18.0, "6 PM")] {
            let (x, y) = self.point_at(DialAngle::from_degrees(hour * DEGREES_PER_HOUR), radius);
            commands.push(DrawCommand::Text {
                text: label.to_string(),
                position: (x, y + font.size.px() as f64 / 3.0),
                font,
                align: TextAlign::Center,
                color: c.palette.tick,
            });
        }
    }

    fn plan_sun_track(&self, layout: &DialLayout, commands: &mut Vec<DrawCommand>) {
        let c = &self.config;
        let palette = &c.palette;

        commands.push(DrawCommand::StrokeArc {
            arc: self.track_arc(c.outer_radius, layout.sunrise, layout.sunset),
            line_width: c.ring_width,
            paint: Paint::Solid(palette.daylight),
        });

        let windows = [
            (layout.morning_twilight, palette.night, palette.twilight),
            (layout.evening_twilight, palette.twilight, palette.night),
        ];
        for (window, from_color, to_color) in windows {
            let paint = Paint::linear(
                self.point_at(window.start, c.outer_radius),
                self.point_at(window.end, c.outer_radius),
                vec![(0.0, from_color), (1.0, to_color)],
            );
            match paint {
                Ok(paint) => commands.push(DrawCommand::StrokeArc {
                    arc: self.track_arc(c.outer_radius, window.start, window.end),
                    line_width: c.ring_width,
                    paint,
                }),
                Err(e) => warn!(target: "dial_render", "Skipping twilight arc {window:?}: {e}"),
            }
        }
    }

    fn plan_moon_track(&self, layout: &DialLayout, commands: &mut Vec<DrawCommand>) {
        let c = &self.config;
        commands.push(DrawCommand::StrokeArc {
            arc: self.track_arc(c.inner_radius, layout.moon.rise, layout.moon.set),
            line_width: c.ring_width,
            paint: Paint::Solid(c.palette.moon),
        });
    }

    fn plan_markers(&self, layout: &DialLayout, commands: &mut Vec<DrawCommand>) {
        let c = &self.config;
        let markers = [(c.outer_radius, layout.sun_state), (c.inner_radius, layout.moon_state)];
        for (radius, state) in markers {
            let color = match state {
                MarkerState::Up => c.palette.marker_up,
                MarkerState::Down => c.palette.marker_down,
            };
            commands.push(DrawCommand::Save);
            commands.push(DrawCommand::Translate {
                dx: c.center.0,
                dy: c.center.1,
            });
            commands.push(DrawCommand::Rotate {
                radians: to_render_rotation(layout.current),
            });
            commands.push(DrawCommand::FillArc {
                arc: ArcSpec::new((radius, 0.0), c.marker_radius, 0.0, TAU),
                paint: Paint::Solid(color),
            });
            commands.push(DrawCommand::Restore);
        }
    }

    fn plan_labels(
        &self,
        snapshot: &AstronomicalSnapshot,
        layout: &DialLayout,
        title: &str,
        commands: &mut Vec<DrawCommand>,
    ) {
        let c = &self.config;
        let palette = &c.palette;
        let (cx, cy) = c.center;

        let mut push_text = |text: String, position: (f64, f64), font: FontSpec, align: TextAlign, color: Rgb| {
            commands.push(DrawCommand::Text {
                text,
                position,
                font,
                align,
                color,
            });
        };

        push_text(
            title.to_string(),
            (60.0, 96.0),
            FontSpec::new(FontWeight::Bold, FontSize::Title),
            TextAlign::Left,
            palette.title,
        );
        push_text(
            snapshot.date.format("%A, %B %-d, %Y").to_string(),
            (60.0, 150.0),
            FontSpec::new(FontWeight::Regular, FontSize::Medium),
            TextAlign::Left,
            palette.muted_text,
        );

        let events = [
            (layout.sunrise_slots.event_slot(), "SUNRISE", &snapshot.sunrise),
            (layout.sunrise_slots.twilight_slot(), "FIRST LIGHT", &snapshot.first_light),
            (layout.sunset_slots.event_slot(), "SUNSET", &snapshot.sunset),
            (layout.sunset_slots.twilight_slot(), "LAST LIGHT", &snapshot.last_light),
        ];
        for (slot, caption, time) in events {
            let LabelSlot { x, y, column } = slot;
            let align = match column {
                Column::Left => TextAlign::Left,
                Column::Right => TextAlign::Right,
            };
            push_text(
                caption.to_string(),
                (x, y - CAPTION_OFFSET),
                FontSpec::new(FontWeight::Regular, FontSize::Small),
                align,
                palette.muted_text,
            );
            push_text(
                format_clock_12h(time),
                (x, y),
                FontSpec::new(FontWeight::Bold, FontSize::Large),
                align,
                palette.text,
            );
        }

        push_text(
            format_clock_12h(&snapshot.current_time),
            (cx, cy - 50.0),
            FontSpec::new(FontWeight::Bold, FontSize::Title),
            TextAlign::Center,
            palette.title,
        );
        push_text(
            snapshot.lunar_phase.name().to_string(),
            (cx, cy + 20.0),
            FontSpec::new(FontWeight::Bold, FontSize::Medium),
            TextAlign::Center,
            palette.moon,
        );
        push_text(
            format!(
                "{}% illuminated, {}",
                snapshot.lunar_illumination_percent, snapshot.lunar_wax_wane
            ),
            (cx, cy + 62.0),
            FontSpec::new(FontWeight::Regular, FontSize::Small),
            TextAlign::Center,
            palette.text,
        );
        push_text(
            format!("Moon age {:.1} days", snapshot.lunar_age_days),
            (cx, cy + 98.0),
            FontSpec::new(FontWeight::Regular, FontSize::Small),
            TextAlign::Center,
            palette.text,
        );
        push_text(
            format!(
                "Moonrise {}   Moonset {}",
                moon_event_label(snapshot.moonrise.as_deref()),
                moon_event_label(snapshot.moonset.as_deref())
            ),
            (cx, cy + 150.0),
            FontSpec::new(FontWeight::Regular, FontSize::Small),
            TextAlign::Center,
            palette.muted_text,
        );
    }
}

fn moon_event_label(time: Option<&str>) -> String {
    match time {
        Some(time) => format_clock_12h(time),
        None => "none today".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;
    use crate::lunar::{LunarPhase, WaxWane};
    use chrono::NaiveDate;

    fn snapshot(current_time: &str) -> AstronomicalSnapshot {
        AstronomicalSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
            current_time: current_time.to_string(),
            sunrise: "06:20".to_string(),
            sunset: "19:04".to_string(),
            moonrise: Some("09:10".to_string()),
            moonset: Some("01:30".to_string()),
            first_light: "04:44".to_string(),
            last_light: "20:40".to_string(),
            lunar_age_days: 3.4,
            lunar_illumination_percent: 12,
            lunar_wax_wane: WaxWane::Waxing,
            lunar_phase: LunarPhase::WaxingCrescent,
        }
    }

    fn renderer() -> DialRenderer {
        DialRenderer::new(DialConfig::default())
    }

    #[test]
    fn test_sun_marker_state() {
        assert_eq!(renderer().layout(&snapshot("08:19")).sun_state, MarkerState::Up);
        assert_eq!(renderer().layout(&snapshot("23:00")).sun_state, MarkerState::Down);
        assert_eq!(renderer().layout(&snapshot("06:20")).sun_state, MarkerState::Up);
        assert_eq!(renderer().layout(&snapshot("05:00")).sun_state, MarkerState::Down);
    }

    #[test]
    fn test_moon_marker_state_across_midnight() {
        // moon up 09:10 until 01:30 the next morning
        let layout = renderer().layout(&snapshot("23:00"));
        assert!(layout.moon.set > layout.moon.rise);
        assert_eq!(layout.moon_state, MarkerState::Up);
        assert_eq!(renderer().layout(&snapshot("00:45")).moon_state, MarkerState::Up);
        assert_eq!(renderer().layout(&snapshot("04:00")).moon_state, MarkerState::Down);
    }

    #[test]
    fn test_invalid_current_time_degrades_to_midnight() {
        let layout = renderer().layout(&snapshot("later"));
        assert_eq!(layout.current, DialAngle::MIDNIGHT);
        assert_eq!(layout.sun_state, MarkerState::Down);
    }

    #[test]
    fn test_plan_order() {
        let commands = renderer().plan(&snapshot("08:19"), "Test Town");
        assert!(matches!(commands[0], DrawCommand::FillRect { .. }));

        let first_tick = commands.iter().position(|c| matches!(c, DrawCommand::Line { .. })).unwrap();
        let first_gradient = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::StrokeArc { paint: Paint::LinearGradient { .. }, .. }))
            .unwrap();
        let first_fill_arc = commands.iter().position(|c| matches!(c, DrawCommand::FillArc { .. })).unwrap();
        let title = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Test Town"))
            .unwrap();
        assert!(first_tick < first_gradient);
        assert!(first_gradient < first_fill_arc);
        assert!(first_fill_arc < title);

        let lines = commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. })).count();
        assert_eq!(lines, 24);

        let saves = commands.iter().filter(|c| matches!(c, DrawCommand::Save)).count();
        let restores = commands.iter().filter(|c| matches!(c, DrawCommand::Restore)).count();
        assert_eq!(saves, restores);
    }

    #[test]
    fn test_daylight_arc_goes_through_render_rotation() {
        let r = renderer();
        let commands = r.plan(&snapshot("08:19"), "Test Town");
        let daylight = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::StrokeArc { arc, paint: Paint::Solid(color), .. }
                    if *color == r.config().palette.daylight =>
                {
                    Some(*arc)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(daylight.start, to_render_rotation(to_dial_angle("06:20")));
        assert_eq!(daylight.end, to_render_rotation(to_dial_angle("19:04")));
    }

    #[test]
    fn test_moon_without_events_is_a_full_ring() {
        let r = renderer();
        let mut s = snapshot("12:00");
        s.moonrise = None;
        s.moonset = None;
        let commands = r.plan(&s, "Test Town");
        let moon = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::StrokeArc { arc, paint: Paint::Solid(color), .. }
                    if *color == r.config().palette.moon =>
                {
                    Some(*arc)
                }
                _ => None,
            })
            .unwrap();
        assert!((moon.sweep() - TAU).abs() < 1e-12);

        let has_none_label = commands.iter().any(|c| {
            matches!(c, DrawCommand::Text { text, .. } if text == "Moonrise none today   Moonset none today")
        });
        assert!(has_none_label);
    }

    #[test]
    fn test_labels_use_slots() {
        let commands = renderer().plan(&snapshot("08:19"), "Test Town");
        let sunrise = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text { text, position, align, .. } if text == "6:20 AM" => Some((*position, *align)),
                _ => None,
            })
            .unwrap();
        // 06:20 is 95°, inside the twilight band past 6 AM
        let slot = SlotPair { event: 1, twilight: 2 }.event_slot();
        assert_eq!(sunrise, ((slot.x, slot.y), TextAlign::Left));

        let sunset = commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text { text, align, .. } if text == "7:04 PM" => Some(*align),
                _ => None,
            })
            .unwrap();
        assert_eq!(sunset, TextAlign::Right);
    }

    #[test]
    fn test_render_without_fonts_still_draws_shapes() {
        let r = DialRenderer::new(DialConfig::default());
        let mut surface = RasterSurface::new(1920, 1080, FontSet::default()).unwrap();
        let report = r.render(&snapshot("08:19"), "Test Town", &mut surface);

        let texts = r
            .plan(&snapshot("08:19"), "Test Town")
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { .. }))
            .count();
        assert_eq!(report.failed, texts);
        assert!(report.executed > 0);
        assert!(report
            .errors
            .iter()
            .all(|(_, e)| matches!(e, DrawError::FontUnavailable(_))));

        // background was painted
        let config = r.config();
        let corner = surface.to_image().get_pixel(5, 5).0;
        let bg = config.palette.background;
        assert_eq!(corner, [bg.r, bg.g, bg.b]);
    }

    #[test]
    fn test_render_with_fonts_is_clean() {
        let config = DialConfig::default();
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        let fonts = FontSet::load(&dir.join(&config.regular_font), &dir.join(&config.bold_font));
        let r = DialRenderer::new(config);
        let mut surface = RasterSurface::new(1920, 1080, fonts).unwrap();

        // sunset late enough that last light falls after midnight
        let mut late = snapshot("23:30");
        late.sunset = "23:10".to_string();
        late.last_light = "00:46".to_string();
        let report = r.render(&late, "Test Town", &mut surface);
        assert_eq!(report.failed, 0, "{:?}", report.errors);
        assert!(report.executed > 100);
    }
}
