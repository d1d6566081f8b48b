//! Light/dark classification of a tile's text-overlay region.

use async_trait::async_trait;
use aura_core::{Error, Result};
use image::DynamicImage;
use tracing::debug;

use crate::ProxyClient;

/// Classifies whether an image's overlay region is light.
#[async_trait]
pub trait LuminanceProbe: Send + Sync {
    async fn is_light(&self, url: &str) -> Result<bool>;
}

/// Downloads and decodes images to sample their overlay region.
pub struct PixelSampler {
    client: ProxyClient,
    threshold: f64,
    overlay_top: f64,
}

impl PixelSampler {
    pub const fn new(client: ProxyClient, threshold: f64, overlay_top: f64) -> Self {
        Self {
            client,
            threshold,
            overlay_top,
        }
    }

    /// Classify already-downloaded image bytes.
    pub fn classify(&self, bytes: &[u8]) -> Result<bool> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::Parse(format!("Failed to decode image: {e}")))?;
        Ok(overlay_luminance(&image, self.overlay_top) > self.threshold)
    }
}

#[async_trait]
impl LuminanceProbe for PixelSampler {
    async fn is_light(&self, url: &str) -> Result<bool> {
        let bytes = self.client.get_bytes(url).await?;
        let light = self.classify(&bytes)?;
        debug!(url, light, "Sampled overlay luminance");
        Ok(light)
    }
}

/// Average relative luminance (0..1) of the band from `top` (a fraction of
/// the height) to the bottom edge. Large images are sampled on a grid.
pub fn overlay_luminance(image: &DynamicImage, top: f64) -> f64 {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let start_row = ((f64::from(height) * top.clamp(0.0, 1.0)) as u32).min(height - 1);
    let step = (width / 64).max(1);

    let mut total = 0.0;
    let mut count = 0u32;
    for y in (start_row..height).step_by(step as usize) {
        for x in (0..width).step_by(step as usize) {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            total += relative_luminance(r, g, b);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        total / f64::from(count)
    }
}

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    0.0722f64.mul_add(
        linearize(b),
        0.2126f64.mul_add(linearize(r), 0.7152 * linearize(g)),
    )
}
