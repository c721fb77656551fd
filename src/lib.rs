//! 24-hour sun and moon dial.
//!
//! One request fetches (or recalls) the astronomical data for a location and
//! day, lays out a circular dial where midnight points down and noon up, and
//! writes it out as a 1920×1080 JPEG.

pub mod cache;
pub mod config;
pub mod error;
pub mod label_layout;
pub mod lunar;
pub mod metrics;
pub mod moon_window;
pub mod output;
pub mod provider;
pub mod render;
pub mod service;
pub mod time_angle;
pub mod twilight;

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{error, info};

pub use cache::TtlCache;
pub use config::DialConfig;
pub use error::GenerateError;
pub use metrics::Metrics;
pub use output::{DirectorySink, ImageSink};
pub use provider::{AstronomyProvider, IpGeolocationProvider, RawAstronomy};
pub use render::{DialRenderer, FontSet, RasterSurface};
pub use service::{AstronomicalDataService, AstronomicalSnapshot, SnapshotQuery};

#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Shown as the dial title.
    pub location: String,
    pub file_name: String,
    pub lat: f64,
    pub lon: f64,
    pub api_key: String,
    pub time_zone: Tz,
    pub date_override: Option<NaiveDate>,
}

impl ImageRequest {
    fn query(&self) -> SnapshotQuery {
        SnapshotQuery {
            lat: self.lat,
            lon: self.lon,
            api_key: self.api_key.clone(),
            time_zone: self.time_zone,
            date_override: self.date_override,
        }
    }
}

// ---------- GENERATOR ----------

pub struct DialImageGenerator<'c, P, S> {
    service: AstronomicalDataService<'c, P>,
    renderer: DialRenderer,
    fonts: FontSet,
    sink: S,
    metrics: Arc<Metrics>,
}

impl<'c, P: AstronomyProvider, S: ImageSink> DialImageGenerator<'c, P, S> {
    pub fn new(provider: P, cache: &'c TtlCache, sink: S, config: DialConfig) -> Self {
        let fonts = FontSet::load(&config.regular_font, &config.bold_font);
        Self::with_fonts(provider, cache, sink, config, fonts)
    }

    pub fn with_fonts(provider: P, cache: &'c TtlCache, sink: S, config: DialConfig, fonts: FontSet) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            service: AstronomicalDataService::new(provider, cache, metrics.clone()),
            renderer: DialRenderer::new(config),
            fonts,
            sink,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Renders and writes one dial. Every failure is logged and reported as
    /// `false`; nothing is drawn when no snapshot is available.
    pub fn create_image(&self, request: &ImageRequest) -> bool {
        let result = self.try_create_image(request);
        info!(target: "dial_service", "{}", self.metrics.report());
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(target: "dial_service", "Could not create {}: {e}", request.file_name);
                false
            }
        }
    }

    pub fn try_create_image(&self, request: &ImageRequest) -> Result<(), GenerateError> {
        let snapshot = self.service.get_snapshot(&request.query())?;

        let config = self.renderer.config();
        let mut surface = RasterSurface::new(config.width, config.height, self.fonts.clone())?;
        let start = Instant::now();
        let report = self.renderer.render(&snapshot, &request.location, &mut surface);
        self.metrics.record_render(start.elapsed());
        self.metrics.record_failed_draws(report.failed);

        let bytes = output::encode_jpeg(&surface.to_image(), config.jpeg_quality)?;
        self.sink.write(&request.file_name, &bytes)?;
        Ok(())
    }
}
