use std::io::Cursor;

use clap::ValueEnum;
use eframe::egui;
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, ImageError, ImageFormat};
use tracing::debug;
use zune_jpeg::JpegDecoder;

use crate::crop::CropRegion;

/// Long edge of the textures used for grid cards and the editor canvas.
pub const PREVIEW_MAX_EDGE: u32 = 1024;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum OutputFormat {
    Png,
    Jpg,
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

pub fn to_color_image(img: &DynamicImage) -> egui::ColorImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.into_raw();
    egui::ColorImage::from_rgba_unmultiplied(size, &pixels)
}

/// Decodes raw image bytes, taking the zune-jpeg path for JPEG payloads.
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<DynamicImage, ImageError> {
    let is_jpeg = mime.eq_ignore_ascii_case("image/jpeg")
        || mime.eq_ignore_ascii_case("image/jpg")
        || image::guess_format(bytes).ok() == Some(ImageFormat::Jpeg);
    if is_jpeg {
        if let Some(image) = decode_jpeg_fast(bytes) {
            return Ok(image);
        }
    }
    image::load_from_memory(bytes)
}

fn decode_jpeg_fast(bytes: &[u8]) -> Option<DynamicImage> {
    let mut decoder = JpegDecoder::new(Cursor::new(bytes));
    match decoder.decode() {
        Ok(pixels) => {
            let info = decoder.info()?;
            // Grayscale and CMYK output does not fit an RGB buffer; the generic decoder handles those.
            image::RgbImage::from_raw(info.width as u32, info.height as u32, pixels)
                .map(DynamicImage::ImageRgb8)
        }
        Err(err) => {
            debug!("zune-jpeg rejected payload, falling back: {err:?}");
            None
        }
    }
}

/// Downscales to at most [`PREVIEW_MAX_EDGE`] on the long edge and converts for upload.
pub fn preview_image(image: &DynamicImage) -> egui::ColorImage {
    let (width, height) = (image.width(), image.height());
    if width <= PREVIEW_MAX_EDGE && height <= PREVIEW_MAX_EDGE {
        return to_color_image(image);
    }
    let ratio = width as f64 / height as f64;
    let (new_w, new_h) = if width >= height {
        (PREVIEW_MAX_EDGE, ((PREVIEW_MAX_EDGE as f64 / ratio) as u32).max(1))
    } else {
        (((PREVIEW_MAX_EDGE as f64 * ratio) as u32).max(1), PREVIEW_MAX_EDGE)
    };

    let rgba = image.to_rgba8();
    let resized = Image::from_vec_u8(width, height, rgba.into_raw(), PixelType::U8x4)
        .ok()
        .and_then(|src| {
            let mut dst = Image::new(new_w, new_h, PixelType::U8x4);
            let mut resizer = Resizer::new();
            resizer
                .resize(&src, &mut dst, &ResizeOptions::default())
                .ok()
                .map(|_| dst)
        });

    match resized {
        Some(dst) => egui::ColorImage::from_rgba_unmultiplied(
            [new_w as usize, new_h as usize],
            dst.buffer(),
        ),
        None => to_color_image(&image.thumbnail(new_w, new_h)),
    }
}

/// Copies the natural-space region out of `image` into a new buffer.
pub fn crop_region(image: &DynamicImage, region: &CropRegion) -> Option<DynamicImage> {
    let (x, y, w, h) = region.to_pixel_bounds(image.width(), image.height())?;
    Some(image.crop_imm(x, y, w, h))
}

pub fn encode_image(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
            image.write_with_encoder(encoder)?;
        }
        OutputFormat::Jpg => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        OutputFormat::Webp => {
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut buffer);
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
        }
    }
    Ok(buffer.into_inner())
}

/// Re-encodes raw RGBA pixels (as handed out by the system clipboard) to PNG.
pub fn rgba_to_png(width: u32, height: u32, rgba: Vec<u8>) -> Option<Vec<u8>> {
    let buffer = image::RgbaImage::from_raw(width, height, rgba)?;
    encode_image(&DynamicImage::ImageRgba8(buffer), OutputFormat::Png, 100).ok()
}
