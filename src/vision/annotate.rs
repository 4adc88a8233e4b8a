// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Detection visualization
//!
//! Draws bounding boxes and `"{label} {score:.2}"` text onto a copy of the
//! source image. The input is never mutated and the output keeps the input
//! dimensions; drawing is deterministic given the same detection order.

use std::io::Cursor;

use ab_glyph::{FontArc, PxScale};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detector::Detection;

/// Number of distinct box colors on the HSV wheel.
const COLOR_COUNT: usize = 16;

/// Vertical offset lifting the label above the box's top edge.
const LABEL_OFFSET: i32 = 18;

/// Draws detections onto images.
pub struct Annotator {
    font: FontArc,
    font_scale: PxScale,
    colors: Vec<Rgb<u8>>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    pub fn new() -> Self {
        // Embedded so annotation works without any system font lookup
        let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
        let font = FontArc::try_from_slice(font_data).expect("embedded font is valid");

        let colors = (0..COLOR_COUNT)
            .map(|i| {
                let hue = (i as f32 / COLOR_COUNT as f32) * 360.0;
                hsv_to_rgb(hue, 0.8, 0.9)
            })
            .collect();

        Self {
            font,
            font_scale: PxScale::from(16.0),
            colors,
        }
    }

    /// Draw every detection onto a fresh copy of the image.
    ///
    /// Boxes touching the image boundary are clipped to it; an empty
    /// detection list returns an unannotated copy.
    pub fn annotate(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let (img_w, img_h) = (canvas.width(), canvas.height());

        for (i, det) in detections.iter().enumerate() {
            let color = self.colors[i % self.colors.len()];

            let x = det.bbox[0].max(0.0) as i32;
            let y = det.bbox[1].max(0.0) as i32;
            let width = det.width().min(img_w as f32 - det.bbox[0]) as u32;
            let height = det.height().min(img_h as f32 - det.bbox[1]) as u32;

            if width > 0 && height > 0 {
                let rect = Rect::at(x, y).of_size(width, height);
                draw_hollow_rect_mut(&mut canvas, rect, color);

                // Second inset border for visibility
                if width > 2 && height > 2 {
                    let inner = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
                    draw_hollow_rect_mut(&mut canvas, inner, color);
                }
            }

            let label = format!("{} {:.2}", det.label, det.score);
            let text_y = (y - LABEL_OFFSET).max(0);
            draw_text_mut(
                &mut canvas,
                color,
                x,
                text_y,
                self.font_scale,
                &self.font,
                &label,
            );
        }

        canvas
    }
}

/// JPEG-encode an annotated image into an embeddable data URI.
pub fn to_data_uri(image: &RgbImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(&buf)
    ))
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgb([
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ])
}
