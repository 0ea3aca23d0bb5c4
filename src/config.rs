/**
 * Pipeline configuration
 *
 * Every knob has a default matching the shipped pen hardware; a TOML file
 * only needs to name the values it changes.
 */

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const SERVICE_UUID: &str = "00000001-710e-4a5b-8d75-3e5b444bc3cf";
pub const CHARACTERISTIC_UUID: &str = "00000002-710e-4a5b-8d75-3e5b444bc3cf";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig{
    pub camera: CameraConfig,
    pub features: FeatureConfig,
    pub flow: FlowConfig,
    pub integrator: IntegratorConfig,
    pub telemetry: TelemetryConfig,
    pub channel: ChannelConfig,
    pub capture: CaptureConfig,
    pub correction: CorrectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig{
    pub width: u32,
    pub height: u32,
    /// Start over from the first frame when an image sequence runs out.
    pub repeat: bool,
}

impl Default for CameraConfig{
    fn default() -> Self{
        Self{
            width: 640,
            height: 480,
            repeat: false,
        }
    }
}

/// Shi-Tomasi corner selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig{
    pub max_corners: usize,
    /// Fraction of the strongest response a corner must reach.
    pub quality_level: f32,
    pub min_distance: f32,
    /// Side of the structure tensor window (odd).
    pub block_size: usize,
    /// Fewer tracked points than this forces a re-seed.
    pub quorum: usize,
}

impl Default for FeatureConfig{
    fn default() -> Self{
        Self{
            max_corners: 50,
            quality_level: 0.3,
            min_distance: 7.0,
            block_size: 7,
            quorum: 7,
        }
    }
}

/// Pyramidal Lucas-Kanade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig{
    /// Full window side in pixels (15 -> 15x15).
    pub window: usize,
    /// Highest pyramid level; 0 means no pyramid.
    pub max_level: usize,
    pub max_iterations: usize,
    pub epsilon: f32,
    /// Minimum eigenvalue of the normalised structure tensor.
    pub min_eigenvalue: f32,
}

impl Default for FlowConfig{
    fn default() -> Self{
        Self{
            window: 15,
            max_level: 2,
            max_iterations: 10,
            epsilon: 0.03,
            min_eigenvalue: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode{
    /// Integrate only when per-frame motion has settled below epsilon.
    Settled,
    /// Integrate only when motion reaches epsilon (noise rejection).
    Moving,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig{
    pub epsilon: f32,
    pub gate: GateMode,
}

impl Default for IntegratorConfig{
    fn default() -> Self{
        Self{
            epsilon: 0.01,
            gate: GateMode::Settled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig{
    pub divisor: f32,
    pub separator: String,
    pub chunk_size: usize,
    /// Written when a stroke starts; empty disables.
    pub path_marker: String,
}

impl Default for TelemetryConfig{
    fn default() -> Self{
        Self{
            divisor: 3.0,
            separator: " ".to_string(),
            chunk_size: 20,
            path_marker: "M".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerWriteAction{
    Ignore,
    Recenter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig{
    pub name: String,
    pub service_uuid: String,
    pub characteristic_uuid: String,
    pub baud_rate: u32,
    pub connect_poll_ms: u64,
    pub register_timeout_ms: u64,
    pub on_peer_write: PeerWriteAction,
}

impl Default for ChannelConfig{
    fn default() -> Self{
        Self{
            name: "Pen service".to_string(),
            service_uuid: SERVICE_UUID.to_string(),
            characteristic_uuid: CHARACTERISTIC_UUID.to_string(),
            baud_rate: 115_200,
            connect_poll_ms: 1000,
            register_timeout_ms: 2000,
            on_peer_write: PeerWriteAction::Ignore,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig{
    /// Yield between cycles.
    pub cycle_sleep_ms: u64,
}

impl Default for CaptureConfig{
    fn default() -> Self{
        Self { cycle_sleep_ms: 1 }
    }
}

/// Fisheye lens model (pinhole K plus four radial terms).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig{
    pub enabled: bool,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub distortion: [f64; 4],
}

impl Default for CorrectionConfig{
    fn default() -> Self{
        // 160 degree imx219 module
        Self{
            enabled: false,
            fx: 359.8891228256634,
            fy: 359.7463655695599,
            cx: 335.1625120488727,
            cy: 220.7128714747221,
            distortion: [
                -0.01684524332140226,
                -0.08959331600156382,
                0.31754669583708056,
                -0.42204012028321364,
            ],
        }
    }
}

impl TrackerConfig{
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self>{
        let path = path.as_ref();
        if !path.exists(){
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()>{
        anyhow::ensure!(self.telemetry.chunk_size > 0, "telemetry.chunk_size must be > 0");
        anyhow::ensure!(self.telemetry.divisor != 0.0, "telemetry.divisor must be non-zero");
        anyhow::ensure!(self.flow.window >= 3, "flow.window must be at least 3");
        anyhow::ensure!(self.features.block_size % 2 == 1, "features.block_size must be odd");
        anyhow::ensure!(
            self.camera.width > 0 && self.camera.height > 0,
            "camera dimensions must be non-zero"
        );
        Ok(())
    }
}
