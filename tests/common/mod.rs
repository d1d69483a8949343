#![allow(dead_code)]

use std::{
    io::Cursor,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use cutout::collection::{NewImage, SourceBytes};
use cutout::image_utils::to_color_image;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    let pixel = Rgba(color);
    let buffer = RgbaImage::from_pixel(width, height, pixel);
    DynamicImage::ImageRgba8(buffer)
}

pub fn write_image(path: impl Into<PathBuf>, image: &DynamicImage) {
    image
        .save(path.into())
        .expect("failed to write image to disk");
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    solid_image(width, height, [200, 40, 40, 255])
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

/// Decoded image as intake would hand it to the collection.
pub fn new_image(name: &str, width: u32, height: u32) -> NewImage {
    let image = solid_image(width, height, [10, 20, 30, 255]);
    NewImage {
        name: name.to_string(),
        source: SourceBytes::new(png_bytes(width, height), "image/png"),
        width,
        height,
        preview: to_color_image(&image),
    }
}

/// Polls `check` until it returns true or `timeout` expires.
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}
