//! Image-level building blocks: corner selection, lens correction and
//! subpixel sampling shared by the tracker.

pub mod corners;
pub mod undistort;

use image::GrayImage;

pub use corners::CornerDetector;
pub use undistort::{FisheyeCorrection, FrameCorrection};

/// Bilinear interpolation, clamping to the image border.
pub fn sample_bilinear(image: &GrayImage, x: f32, y: f32) -> f32{
    let (width, height) = image.dimensions();

    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    let cx0 = x0.clamp(0, max_x) as u32;
    let cy0 = y0.clamp(0, max_y) as u32;
    let cx1 = (x0 + 1).clamp(0, max_x) as u32;
    let cy1 = (y0 + 1).clamp(0, max_y) as u32;

    let p00 = image.get_pixel(cx0, cy0).0[0] as f32;
    let p10 = image.get_pixel(cx1, cy0).0[0] as f32;
    let p01 = image.get_pixel(cx0, cy1).0[0] as f32;
    let p11 = image.get_pixel(cx1, cy1).0[0] as f32;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;

    top * (1.0 - fy) + bottom * fy
}

/// Bilinear interpolation that yields `None` outside the image.
pub fn sample_bilinear_inside(image: &GrayImage, x: f32, y: f32) -> Option<f32>{
    let (width, height) = image.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f32 || y > (height - 1) as f32{
        return None;
    }
    Some(sample_bilinear(image, x, y))
}
