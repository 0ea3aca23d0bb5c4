//! Pyramidal Lucas-Kanade motion estimation
//!
//! Tracks a sparse point set from the previous frame into the current one,
//! coarse to fine, and averages the per-point motion of the points that
//! tracked into one displacement for the cycle.

use image::{GrayImage, Luma};
use nalgebra::{Point2, Vector2};

use crate::config::FlowConfig;
use crate::vision::sample_bilinear;

/// Outcome of tracking one point set between two frames.
#[derive(Debug, Clone)]
pub struct FlowResult{
    /// Input points, in order.
    pub previous: Vec<Point2<f32>>,
    /// Tracked position per input point (the input position when lost).
    pub points: Vec<Point2<f32>>,
    /// `true` where the point tracked successfully.
    pub status: Vec<bool>,
    /// Mean of (new - old) over tracked points; `None` when none tracked.
    pub displacement: Option<Vector2<f32>>,
}

impl FlowResult{
    pub fn fed_count(&self) -> usize{
        self.previous.len()
    }

    pub fn tracked_count(&self) -> usize{
        self.status.iter().filter(|&&ok| ok).count()
    }

    /// New positions of the successfully tracked points.
    pub fn tracked(&self) -> Vec<Point2<f32>>{
        self.points
            .iter()
            .zip(&self.status)
            .filter(|(_, &ok)| ok)
            .map(|(p, _)| *p)
            .collect()
    }
}

pub struct MotionEstimator{
    half_window: i32,
    max_level: usize,
    max_iterations: usize,
    epsilon: f32,
    min_eigenvalue: f32,
}

impl Default for MotionEstimator{
    fn default() -> Self{
        Self::new(&FlowConfig::default())
    }
}

impl MotionEstimator{
    pub fn new(config: &FlowConfig) -> Self{
        Self{
            half_window: (config.window / 2).max(1) as i32,
            max_level: config.max_level,
            max_iterations: config.max_iterations.max(1),
            epsilon: config.epsilon,
            min_eigenvalue: config.min_eigenvalue,
        }
    }

    /// Track `points` from `prev` into `curr`.
    pub fn track(
        &self,
        prev: &GrayImage,
        curr: &GrayImage,
        points: &[Point2<f32>],
    ) -> FlowResult{
        if points.is_empty() || prev.dimensions() != curr.dimensions(){
            return FlowResult{
                previous: points.to_vec(),
                points: points.to_vec(),
                status: vec![false; points.len()],
                displacement: None,
            };
        }

        let prev_pyramid = self.build_pyramid(prev);
        let curr_pyramid = self.build_pyramid(curr);

        let mut tracked_points = Vec::with_capacity(points.len());
        let mut status = Vec::with_capacity(points.len());
        let mut sum = Vector2::zeros();
        let mut count = 0usize;

        for point in points{
            match self.track_point(&prev_pyramid, &curr_pyramid, point){
                Some(new_point) =>{
                    sum += new_point - *point;
                    count += 1;
                    tracked_points.push(new_point);
                    status.push(true);
                }
                None =>{
                    tracked_points.push(*point);
                    status.push(false);
                }
            }
        }

        let displacement = if count > 0{
            Some(sum / count as f32)
        } else{
            None
        };

        FlowResult{
            previous: points.to_vec(),
            points: tracked_points,
            status,
            displacement,
        }
    }

    fn build_pyramid(&self, image: &GrayImage) -> Vec<GrayImage>{
        let mut pyramid = Vec::with_capacity(self.max_level + 1);
        pyramid.push(image.clone());

        for level in 1..=self.max_level{
            let (w, h) = pyramid[level - 1].dimensions();
            // Stop once a level would be smaller than the window
            if w / 2 <= 2 * self.half_window as u32 || h / 2 <= 2 * self.half_window as u32{
                break;
            }
            let next = downsample(&pyramid[level - 1]);
            pyramid.push(next);
        }

        pyramid
    }

    fn track_point(
        &self,
        prev_pyramid: &[GrayImage],
        curr_pyramid: &[GrayImage],
        point: &Point2<f32>,
    ) -> Option<Point2<f32>>{
        let top = prev_pyramid.len() - 1;
        let mut guess = Vector2::<f32>::zeros();

        for level in (0..=top).rev(){
            let scale = (1u32 << level) as f32;
            let p = Point2::new(point.x / scale, point.y / scale);
            let d = self.refine(&prev_pyramid[level], &curr_pyramid[level], &p, &guess)?;

            if level > 0{
                guess = (guess + d) * 2.0;
            } else{
                guess += d;
            }
        }

        let tracked = *point + guess;
        let (width, height) = prev_pyramid[0].dimensions();
        if tracked.x < 0.0
            || tracked.y < 0.0
            || tracked.x > (width - 1) as f32
            || tracked.y > (height - 1) as f32
       {
            return None;
        }
        Some(tracked)
    }

    /// Iterative LK at one level. Returns the residual motion on top of
    /// `guess`, or `None` when the patch cannot be tracked.
    fn refine(
        &self,
        prev: &GrayImage,
        curr: &GrayImage,
        p: &Point2<f32>,
        guess: &Vector2<f32>,
    ) -> Option<Vector2<f32>>{
        let (width, height) = prev.dimensions();
        if p.x < 0.0 || p.y < 0.0 || p.x > (width - 1) as f32 || p.y > (height - 1) as f32{
            return None;
        }

        let win = self.half_window;
        let side = (2 * win + 1) as usize;
        let area = (side * side) as f32;

        let mut template = Vec::with_capacity(side * side);
        let mut grad_x = Vec::with_capacity(side * side);
        let mut grad_y = Vec::with_capacity(side * side);
        let (mut gxx, mut gyy, mut gxy) = (0.0f32, 0.0f32, 0.0f32);

        for dy in -win..=win{
            for dx in -win..=win{
                let x = p.x + dx as f32;
                let y = p.y + dy as f32;
                let ix = (sample_bilinear(prev, x + 1.0, y) - sample_bilinear(prev, x - 1.0, y)) / 2.0;
                let iy = (sample_bilinear(prev, x, y + 1.0) - sample_bilinear(prev, x, y - 1.0)) / 2.0;

                template.push(sample_bilinear(prev, x, y));
                grad_x.push(ix);
                grad_y.push(iy);
                gxx += ix * ix;
                gyy += iy * iy;
                gxy += ix * iy;
            }
        }

        let det = gxx * gyy - gxy * gxy;
        let half_trace = (gxx + gyy) / 2.0;
        let spread = (((gxx - gyy) / 2.0).powi(2) + gxy * gxy).sqrt();
        let min_eig = (half_trace - spread) / area;
        if min_eig < self.min_eigenvalue || det.abs() < f32::EPSILON{
            return None;
        }

        let mut d = Vector2::<f32>::zeros();
        let limit = (width.max(height)) as f32;

        for _ in 0..self.max_iterations{
            let cx = p.x + guess.x + d.x;
            let cy = p.y + guess.y + d.y;
            if cx < -(win as f32) || cy < -(win as f32) || cx > limit + win as f32 || cy > limit + win as f32{
                return None;
            }

            let (mut bx, mut by) = (0.0f32, 0.0f32);
            let mut idx = 0;
            for wy in -win..=win{
                for wx in -win..=win{
                    let next = sample_bilinear(curr, cx + wx as f32, cy + wy as f32);
                    let diff = template[idx] - next;
                    bx += grad_x[idx] * diff;
                    by += grad_y[idx] * diff;
                    idx += 1;
                }
            }

            let step = Vector2::new((gyy * bx - gxy * by) / det, (gxx * by - gxy * bx) / det);
            d += step;

            if step.norm() < self.epsilon{
                break;
            }
        }

        Some(d)
    }
}

/// 2x downsample with a 2x2 box filter.
fn downsample(image: &GrayImage) -> GrayImage{
    let (width, height) = image.dimensions();
    let new_width = (width / 2).max(1);
    let new_height = (height / 2).max(1);
    let mut result = GrayImage::new(new_width, new_height);

    for y in 0..new_height{
        for x in 0..new_width{
            let sx = x * 2;
            let sy = y * 2;
            let sx1 = (sx + 1).min(width - 1);
            let sy1 = (sy + 1).min(height - 1);

            let sum = image.get_pixel(sx, sy).0[0] as u32
                + image.get_pixel(sx1, sy).0[0] as u32
                + image.get_pixel(sx, sy1).0[0] as u32
                + image.get_pixel(sx1, sy1).0[0] as u32;
            result.put_pixel(x, y, Luma([((sum + 2) / 4) as u8]));
        }
    }

    result
}
