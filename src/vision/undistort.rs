//! Fisheye lens correction.
//!
//! The remap table is built once from the lens model; correcting a frame is a
//! table lookup plus bilinear interpolation. Pixels that map outside the
//! source frame are black.

use image::{GrayImage, Luma};

use crate::config::CorrectionConfig;
use crate::vision::sample_bilinear_inside;

/// A pure per-frame geometric correction.
pub trait FrameCorrection{
    fn correct(&self, frame: &GrayImage) -> GrayImage;
}

pub struct FisheyeCorrection{
    width: u32,
    height: u32,
    /// Source coordinate for every destination pixel, row-major.
    map: Vec<(f32, f32)>,
}

impl FisheyeCorrection{
    /// Build the remap table for `width` x `height` frames. The rectified
    /// image keeps the original camera matrix.
    pub fn new(width: u32, height: u32, lens: &CorrectionConfig) -> Self{
        let [k1, k2, k3, k4] = lens.distortion;
        let mut map = Vec::with_capacity((width * height) as usize);

        for v in 0..height{
            for u in 0..width{
                let x = (u as f64 - lens.cx) / lens.fx;
                let y = (v as f64 - lens.cy) / lens.fy;

                let r = (x * x + y * y).sqrt();
                let theta = r.atan();
                let theta2 = theta * theta;
                let theta_d = theta
                    * (1.0 + theta2 * (k1 + theta2 * (k2 + theta2 * (k3 + theta2 * k4))));
                let scale = if r > 1e-8 { theta_d / r }else{ 1.0 };

                let src_x = lens.fx * x * scale + lens.cx;
                let src_y = lens.fy * y * scale + lens.cy;
                map.push((src_x as f32, src_y as f32));
            }
        }

        Self { width, height, map }
    }
}

impl FrameCorrection for FisheyeCorrection{
    fn correct(&self, frame: &GrayImage) -> GrayImage{
        if frame.dimensions() != (self.width, self.height){
            tracing::warn!(
                "correction table is {}x{}, frame is {:?}; passing frame through",
                self.width,
                self.height,
                frame.dimensions()
            );
            return frame.clone();
        }

        let mut out = GrayImage::new(self.width, self.height);
        for (idx, &(sx, sy)) in self.map.iter().enumerate(){
            let value = sample_bilinear_inside(frame, sx, sy).unwrap_or(0.0);
            let x = idx as u32 % self.width;
            let y = idx as u32 / self.width;
            out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
        out
    }
}
