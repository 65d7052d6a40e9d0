//! Drawing detections and warnings onto frames.
//!
//! Text origins follow the usual baseline convention: `(x, y)` is the
//! bottom-left corner of the first glyph. All drawing is clipped to the image.

mod font;

use image::{Rgb, RgbImage};

use crate::detect::Detection;
use font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Drawn for detections whose label does not contain "NO".
pub const PRESENT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Drawn for "NO-" detections and the warning banner.
pub const MISSING_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Where the warning banner baseline starts.
pub const WARNING_ORIGIN: (i32, i32) = (20, 40);

/// Label baseline offset above the top edge of its box.
const LABEL_OFFSET: i32 = 10;

#[derive(Clone, Copy, Debug)]
pub struct Annotator {
    /// Box line thickness in pixels.
    pub thickness: u32,
    /// Glyph pixel scale.
    pub text_scale: u32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            thickness: 2,
            text_scale: 2,
        }
    }
}

impl Annotator {
    /// Draw every detection and, if present, the warning banner.
    pub fn annotate(&self, image: &mut RgbImage, detections: &[Detection], warning: Option<&str>) {
        for detection in detections {
            let color = color_for(detection);
            let b = detection.bbox;
            self.draw_rectangle(image, b.x1, b.y1, b.x2, b.y2, color);
            let baseline = b.y1.saturating_sub(LABEL_OFFSET);
            self.draw_text(image, b.x1, baseline, &detection.label, color);
        }
        if let Some(text) = warning {
            self.draw_text(image, WARNING_ORIGIN.0, WARNING_ORIGIN.1, text, MISSING_COLOR);
        }
    }

    pub fn draw_rectangle(
        &self,
        image: &mut RgbImage,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        color: Rgb<u8>,
    ) {
        let (left, right) = (left.min(right), left.max(right));
        let (top, bottom) = (top.min(bottom), top.max(bottom));
        let t = to_i32(self.thickness.max(1));
        // Lines are centred on the edge like a stroked rectangle.
        let lo = -(t / 2);
        let hi = lo + (t - 1);
        let outer_left = left.saturating_add(lo);
        let outer_right = right.saturating_add(hi);
        let outer_top = top.saturating_add(lo);
        let outer_bottom = bottom.saturating_add(hi);

        fill_rect(image, outer_left, outer_top, outer_right, top.saturating_add(hi), color);
        fill_rect(image, outer_left, bottom.saturating_add(lo), outer_right, outer_bottom, color);
        fill_rect(image, outer_left, outer_top, left.saturating_add(hi), outer_bottom, color);
        fill_rect(image, right.saturating_add(lo), outer_top, outer_right, outer_bottom, color);
    }

    pub fn draw_text(
        &self,
        image: &mut RgbImage,
        x: i32,
        baseline: i32,
        text: &str,
        color: Rgb<u8>,
    ) {
        let scale = to_i32(self.text_scale.max(1));
        let top = baseline.saturating_sub((GLYPH_HEIGHT as i32).saturating_mul(scale));
        let advance = (GLYPH_ADVANCE as i32).saturating_mul(scale);
        let width = to_i32(image.width());
        let mut cursor = x;
        for ch in text.chars() {
            if cursor >= width {
                break;
            }
            if let Some(rows) = glyph(ch) {
                for (row, pattern) in rows.iter().enumerate() {
                    let py = top.saturating_add((row as i32).saturating_mul(scale));
                    for col in 0..GLYPH_WIDTH {
                        if (pattern >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                            let px = cursor.saturating_add((col as i32).saturating_mul(scale));
                            fill_rect(
                                image,
                                px,
                                py,
                                px.saturating_add(scale - 1),
                                py.saturating_add(scale - 1),
                                color,
                            );
                        }
                    }
                }
            }
            cursor = cursor.saturating_add(advance);
        }
    }
}

fn color_for(detection: &Detection) -> Rgb<u8> {
    if detection.is_negative() {
        MISSING_COLOR
    } else {
        PRESENT_COLOR
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Fill the inclusive rectangle `(x0, y0)..=(x1, y1)`, clipped to the image.
fn fill_rect(image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let (width, height) = (to_i32(image.width()), to_i32(image.height()));
    if x1 < 0 || y1 < 0 || x0 >= width || y0 >= height || x0 > x1 || y0 > y1 {
        return;
    }
    let (x0, x1) = (x0.max(0) as u32, x1.min(width - 1) as u32);
    let (y0, y1) = (y0.max(0) as u32, y1.min(height - 1) as u32);
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x, y, color);
        }
    }
}
