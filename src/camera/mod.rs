//! Frame sources.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::config::CameraConfig;
use crate::error::CaptureError;

/// Supplies fixed-size grayscale frames on demand.
pub trait Camera{
    fn capture(&mut self) -> Result<GrayImage, CaptureError>;
    fn release(&mut self);

    fn dimensions(&self) -> (u32, u32);
}

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Plays back a directory of still images in file-name order.
pub struct ImageSequenceCamera{
    paths: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
    repeat: bool,
    released: bool,
}

impl ImageSequenceCamera{
    pub fn open(dir: impl AsRef<Path>, config: &CameraConfig) -> Result<Self, CaptureError>{
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::NoFrame(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path|{
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty(){
            return Err(CaptureError::NoFrame(format!(
                "no frames in {}",
                dir.display()
            )));
        }

        tracing::info!("playing {} frames from {}", paths.len(), dir.display());
        Ok(ImageSequenceCamera{
            paths,
            next: 0,
            width: config.width,
            height: config.height,
            repeat: config.repeat,
            released: false,
        })
    }

    pub fn len(&self) -> usize{
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool{
        self.paths.is_empty()
    }
}

impl Camera for ImageSequenceCamera{
    fn capture(&mut self) -> Result<GrayImage, CaptureError>{
        if self.released{
            return Err(CaptureError::Closed);
        }
        if self.next >= self.paths.len(){
            if !self.repeat{
                return Err(CaptureError::Closed);
            }
            self.next = 0;
        }

        let path = &self.paths[self.next];
        self.next += 1;

        let frame = image::open(path)?.to_luma8();
        Ok(fit(frame, self.width, self.height))
    }

    fn release(&mut self){
        self.released = true;
    }

    fn dimensions(&self) -> (u32, u32){
        (self.width, self.height)
    }
}

/// Resize to the configured frame size when the source differs.
pub fn fit(frame: GrayImage, width: u32, height: u32) -> GrayImage{
    if frame.dimensions() == (width, height){
        return frame;
    }
    imageops::resize(&frame, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn config(repeat: bool) -> CameraConfig {
        CameraConfig {
            width: 32,
            height: 24,
            repeat,
        }
    }

    fn write_frames(dir: &Path) {
        for (name, value) in [("0002.png", 200u8), ("0001.png", 100u8)] {
            GrayImage::from_pixel(64, 48, Luma([value]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
    }

    #[test]
    fn test_sequence_plays_in_name_order_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path());
        let mut camera = ImageSequenceCamera::open(dir.path(), &config(false)).unwrap();
        assert_eq!(camera.len(), 2);

        let first = camera.capture().unwrap();
        assert_eq!(first.dimensions(), (32, 24));
        assert_eq!(first.get_pixel(10, 10).0[0], 100);
        assert_eq!(camera.capture().unwrap().get_pixel(10, 10).0[0], 200);
        assert!(matches!(camera.capture(), Err(CaptureError::Closed)));
    }

    #[test]
    fn test_sequence_repeats() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path());
        let mut camera = ImageSequenceCamera::open(dir.path(), &config(true)).unwrap();
        for _ in 0..5 {
            assert!(camera.capture().is_ok());
        }
    }

    #[test]
    fn test_release_closes() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path());
        let mut camera = ImageSequenceCamera::open(dir.path(), &config(true)).unwrap();
        camera.release();
        assert!(matches!(camera.capture(), Err(CaptureError::Closed)));
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceCamera::open(dir.path(), &config(false)).is_err());
    }
}
