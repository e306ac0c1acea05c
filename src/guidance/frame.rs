use anyhow::{Context, Result};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};

/// Scales `frame` down to at most `max_width` pixels wide (keeping its aspect
/// ratio) and encodes it as JPEG at `quality`.
pub fn encode_guidance_frame(frame: &DynamicImage, max_width: u32, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        anyhow::bail!("viewfinder frame is empty");
    }

    let scaled;
    let source = if width > max_width && max_width > 0 {
        let scaled_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
        scaled = frame.resize_exact(max_width, scaled_height, FilterType::Triangle);
        &scaled
    } else {
        frame
    };

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    source
        .to_rgb8()
        .write_with_encoder(encoder)
        .context("failed to encode guidance frame")?;
    Ok(jpeg)
}
