//! Shi-Tomasi corner selection ("good features to track").
//!
//! The response at each pixel is the smaller eigenvalue of the gradient
//! structure tensor summed over a `block_size` window. Candidates must be a
//! 3x3 local maximum and reach `quality_level` times the strongest response;
//! survivors are taken strongest first while keeping `min_distance` between
//! accepted corners.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use nalgebra::Point2;

use crate::config::FeatureConfig;

#[derive(Debug, Clone)]
pub struct CornerDetector{
    max_corners: usize,
    quality_level: f32,
    min_distance: f32,
    block_size: usize,
}

impl Default for CornerDetector{
    fn default() -> Self{
        Self::new(&FeatureConfig::default())
    }
}

impl CornerDetector{
    pub fn new(config: &FeatureConfig) -> Self{
        Self{
            max_corners: config.max_corners,
            quality_level: config.quality_level,
            min_distance: config.min_distance,
            block_size: config.block_size.max(3) | 1,
        }
    }

    /// Detect up to `max_corners` corners, strongest first.
    pub fn detect(&self, image: &GrayImage) -> Vec<Point2<f32>>{
        let (width, height) = image.dimensions();
        let width = width as usize;
        let height = height as usize;
        let radius = self.block_size / 2;

        // Window plus one pixel for the local maximum test
        if width < 2 * radius + 3 || height < 2 * radius + 3 || self.max_corners == 0{
            return Vec::new();
        }

        let response = self.min_eigen_response(image, width, height, radius);

        let strongest = response.iter().cloned().fold(0.0f32, f32::max);
        if strongest <= 0.0{
            return Vec::new();
        }
        let threshold = strongest * self.quality_level;

        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        for y in (radius + 1)..(height - radius - 1){
            for x in (radius + 1)..(width - radius - 1){
                let value = response[y * width + x];
                if value <= 0.0 || value < threshold{
                    continue;
                }
                if is_local_max(&response, width, x, y, value){
                    candidates.push((value, x, y));
                }
            }
        }

        // Stable sort keeps raster order among equal responses
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let min_dist_sq = self.min_distance * self.min_distance;
        let mut corners: Vec<Point2<f32>> = Vec::with_capacity(self.max_corners);

        for (_, x, y) in candidates{
            let point = Point2::new(x as f32, y as f32);
            let crowded = corners
                .iter()
                .any(|kept| (*kept - point).norm_squared() < min_dist_sq);
            if crowded{
                continue;
            }
            corners.push(point);
            if corners.len() == self.max_corners{
                break;
            }
        }

        corners
    }

    /// Minimum eigenvalue map, zero where the window does not fit.
    fn min_eigen_response(
        &self,
        image: &GrayImage,
        width: usize,
        height: usize,
        radius: usize,
    ) -> Vec<f32>{
        let gx = horizontal_sobel(image);
        let gy = vertical_sobel(image);

        // Integral images of the tensor terms, (width+1) x (height+1)
        let stride = width + 1;
        let mut sxx = vec![0.0f64; stride * (height + 1)];
        let mut syy = vec![0.0f64; stride * (height + 1)];
        let mut sxy = vec![0.0f64; stride * (height + 1)];

        for y in 0..height{
            let mut row_xx = 0.0f64;
            let mut row_yy = 0.0f64;
            let mut row_xy = 0.0f64;
            for x in 0..width{
                let ix = gx.get_pixel(x as u32, y as u32).0[0] as f64;
                let iy = gy.get_pixel(x as u32, y as u32).0[0] as f64;
                row_xx += ix * ix;
                row_yy += iy * iy;
                row_xy += ix * iy;

                let idx = (y + 1) * stride + (x + 1);
                sxx[idx] = sxx[idx - stride] + row_xx;
                syy[idx] = syy[idx - stride] + row_yy;
                sxy[idx] = sxy[idx - stride] + row_xy;
            }
        }

        let window_sum = |table: &[f64], x0: usize, y0: usize, x1: usize, y1: usize| -> f64{
            table[y1 * stride + x1] - table[y0 * stride + x1] - table[y1 * stride + x0]
                + table[y0 * stride + x0]
        };

        let mut response = vec![0.0f32; width * height];
        for y in radius..(height - radius){
            for x in radius..(width - radius){
                let (x0, y0) = (x - radius, y - radius);
                let (x1, y1) = (x + radius + 1, y + radius + 1);

                let a = window_sum(&sxx, x0, y0, x1, y1);
                let c = window_sum(&syy, x0, y0, x1, y1);
                let b = window_sum(&sxy, x0, y0, x1, y1);

                let half_trace = (a + c) / 2.0;
                let spread = (((a - c) / 2.0).powi(2) + b * b).sqrt();
                response[y * width + x] = (half_trace - spread).max(0.0) as f32;
            }
        }

        response
    }
}

fn is_local_max(response: &[f32], width: usize, x: usize, y: usize, value: f32) -> bool{
    for ny in (y - 1)..=(y + 1){
        for nx in (x - 1)..=(x + 1){
            if response[ny * width + nx] > value{
                return false;
            }
        }
    }
    true
}
