//! Feature set ownership and re-seed policy.

use image::GrayImage;
use nalgebra::Point2;

use crate::config::FeatureConfig;
use crate::tracking::motion::FlowResult;
use crate::vision::CornerDetector;

pub type FeatureSet = Vec<Point2<f32>>;

/// What `update` did with the feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome{
    /// The tracked subset was carried forward.
    Kept,
    /// The set was discarded and detection ran again.
    Reseeded,
}

pub struct FeatureManager{
    detector: CornerDetector,
    quorum: usize,
    features: FeatureSet,
}

impl Default for FeatureManager{
    fn default() -> Self{
        Self::new(&FeatureConfig::default())
    }
}

impl FeatureManager{
    pub fn new(config: &FeatureConfig) -> Self{
        Self{
            detector: CornerDetector::new(config),
            quorum: config.quorum,
            features: Vec::new(),
        }
    }

    /// Replace the set with fresh corners from `frame`. An empty result is
    /// not an error; the caller retries on a later frame.
    pub fn initialize(&mut self, frame: &GrayImage) -> &FeatureSet{
        self.features = self.detector.detect(frame);
        &self.features
    }

    /// Apply the re-seed policy to this cycle's tracking result.
    ///
    /// Any lost point, or fewer tracked points than the quorum, discards the
    /// whole set and re-seeds from `frame`; otherwise exactly the tracked
    /// points become the new set.
    pub fn update(&mut self, frame: &GrayImage, track: &FlowResult) -> UpdateOutcome{
        let tracked = track.tracked_count();
        if tracked != track.fed_count() || tracked < self.quorum{
            self.initialize(frame);
            return UpdateOutcome::Reseeded;
        }
        self.features = track.tracked();
        UpdateOutcome::Kept
    }

    pub fn features(&self) -> &FeatureSet{
        &self.features
    }

    pub fn is_empty(&self) -> bool{
        self.features.is_empty()
    }

    pub fn len(&self) -> usize{
        self.features.len()
    }

    pub fn quorum(&self) -> usize{
        self.quorum
    }
}
