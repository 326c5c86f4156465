use image::{imageops, Rgba, RgbaImage};

use crate::geometry::GogglesGeometry;
use crate::landmarks::Point;

/// CSS `LightGray`, fully opaque.
pub const LIGHT_GRAY: Rgba<u8> = Rgba([211, 211, 211, 255]);

/// Solid rectangle for the unrotated goggles.
pub fn render_goggles(geometry: &GogglesGeometry) -> RgbaImage {
    let (w, h) = geometry.pixel_size();
    RgbaImage::from_pixel(w, h, LIGHT_GRAY)
}

/// Rotate `src` counter-clockwise by `degrees` about `center`, growing the canvas
/// so the whole rotated image fits. Uncovered pixels are transparent.
///
/// Sampling is nearest-neighbour at output pixel centres, and the expanded size
/// is `ceil(max) - floor(min)` over the transformed corners.
pub fn rotate_expand(src: &RgbaImage, degrees: f32, center: (f32, f32)) -> RgbaImage {
    let angle = (degrees as f64).rem_euclid(360.0);
    if angle == 0.0 {
        return src.clone();
    }

    let (w, h) = (src.width() as f64, src.height() as f64);
    let (cx, cy) = (center.0 as f64, center.1 as f64);

    // Output -> input mapping:
    // [ a  b  c ]
    // [ d  e  f ]
    let rad = -angle.to_radians();
    let a = round15(rad.cos());
    let b = round15(rad.sin());
    let d = round15(-rad.sin());
    let e = round15(rad.cos());
    let map = |x: f64, y: f64, c: f64, f: f64| (a * x + b * y + c, d * x + e * y + f);

    let (c, f) = map(-cx, -cy, 0.0, 0.0);
    let (c, f) = (c + cx, f + cy);

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| map(x, y, c, f));
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let new_w = (max_x.ceil() - min_x.floor()) as u32;
    let new_h = (max_y.ceil() - min_y.floor()) as u32;

    let (c, f) = map(
        -(new_w as f64 - w) / 2.0,
        -(new_h as f64 - h) / 2.0,
        c,
        f,
    );

    let mut output = RgbaImage::new(new_w, new_h);
    for out_y in 0..new_h {
        for out_x in 0..new_w {
            let (in_x, in_y) = map(out_x as f64 + 0.5, out_y as f64 + 0.5, c, f);
            if in_x >= 0.0 && in_x < w && in_y >= 0.0 && in_y < h {
                let p = *src.get_pixel(in_x.floor() as u32, in_y.floor() as u32);
                output.put_pixel(out_x, out_y, p);
            }
            // else: leave transparent
        }
    }
    output
}

fn round15(v: f64) -> f64 {
    (v * 1e15).round() / 1e15
}

/// Alpha-paste `overlay` so its centre lands on `center`. Returns the top-left
/// paste position, which may be negative; out-of-bounds pixels are clipped.
pub fn paste_centered(dst: &mut RgbaImage, overlay: &RgbaImage, center: Point) -> (i64, i64) {
    let x = (center.x - overlay.width() as f32 / 2.0) as i64;
    let y = (center.y - overlay.height() as f32 / 2.0) as i64;
    imageops::overlay(dst, overlay, x, y);
    (x, y)
}

/// Render, rotate and composite the goggles described by `geometry` onto `image`.
pub fn draw_goggles(image: &mut RgbaImage, geometry: &GogglesGeometry) -> (i64, i64) {
    let rectangle = render_goggles(geometry);
    let rotated = rotate_expand(
        &rectangle,
        -geometry.angle_degrees,
        (geometry.width / 2.0, geometry.height / 2.0),
    );
    log::debug!(
        "goggles {}x{} rotated to {}x{} ({:.2} deg)",
        rectangle.width(),
        rectangle.height(),
        rotated.width(),
        rotated.height(),
        geometry.angle_degrees
    );
    paste_centered(image, &rotated, geometry.eye_midpoint)
}
