// src/compile/images.rs

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info};

use super::image_cache::{ImageCache, content_hash};
use super::{ImageOptimizer, collect_sources, target_for};
use crate::pipeline::PipelineContext;
use crate::stages::StageReport;
use crate::types::{Category, Stage};

/// Re-encodes PNG and JPEG images with the `image` crate. Other formats pass
/// through unchanged, as does any result larger than its input.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateOptimizer {
    jpeg_quality: u8,
}

impl ImageCrateOptimizer {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn encode(&self, img: &DynamicImage, format: ImageFormat) -> Result<Option<Vec<u8>>> {
        let mut out = Vec::new();
        match format {
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    Cursor::new(&mut out),
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
            }
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), self.jpeg_quality);
                img.to_rgb8().write_with_encoder(encoder)?;
            }
            _ => return Ok(None),
        }
        Ok(Some(out))
    }
}

impl Default for ImageCrateOptimizer {
    fn default() -> Self {
        Self::new(80)
    }
}

impl ImageOptimizer for ImageCrateOptimizer {
    fn optimize(&self, path: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
        let format = match ImageFormat::from_path(path) {
            Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => format,
            _ => return Ok(bytes.to_vec()),
        };

        let img = image::load_from_memory_with_format(bytes, format)
            .with_context(|| format!("decoding {:?}", path))?;

        match self.encode(&img, format)? {
            Some(encoded) if encoded.len() < bytes.len() => Ok(encoded),
            _ => Ok(bytes.to_vec()),
        }
    }
}

/// Optimize every image into the images intermediate directory, reusing
/// cached results for content seen before.
pub fn optimize_images(ctx: &PipelineContext) -> Result<StageReport> {
    let category = ctx.paths.category(Category::Images)?;
    let fs = ctx.fs.as_ref();
    let cache = ImageCache::new(ctx.paths.cache_dir());
    let mut report = StageReport::new(Stage::Images);

    for source in collect_sources(fs, &ctx.paths, category)? {
        let bytes = fs.read(&source)?;
        let hash = content_hash(&bytes);

        let optimized = match cache.get(fs, &hash) {
            Some(cached) => {
                report.cached += 1;
                cached
            }
            None => {
                let optimized = ctx
                    .compilers
                    .images
                    .optimize(&source, &bytes)
                    .with_context(|| format!("optimizing {:?}", source))?;
                cache.put(fs, &hash, &optimized)?;
                report.written += 1;
                optimized
            }
        };

        let target = target_for(category, &source, &category.intermediate_dir);
        debug!(from = ?source, to = ?target, "writing image");
        fs.write(&target, &optimized)?;
    }

    info!(
        optimized = report.written,
        cached = report.cached,
        "images processed"
    );
    Ok(report)
}
