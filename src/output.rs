use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use tracing::info;

use crate::error::OutputError;

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, OutputError> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)?;
    Ok(bytes)
}

/// Persists encoded images by file name.
pub trait ImageSink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<(), OutputError>;
}

/// Writes images into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageSink for DirectorySink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<(), OutputError> {
        let path = self.dir.join(file_name);
        let write_err = |source| OutputError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        fs::write(&path, bytes).map_err(write_err)?;

        info!(target: "dial_render", "Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}
