pub mod camera;
pub mod capture;
pub mod channel;
pub mod config;
pub mod error;
pub mod ffi;
pub mod input;
pub mod telemetry;
pub mod tracking;
pub mod vision;

#[cfg(feature = "python")]
pub mod python;

pub use capture::{CaptureLoop, LoopState, LoopSummary, PipelineContext, TrackingPhase};
pub use channel::{ChannelState, ControlChannel, PeerLink, TriggerEvent};
pub use config::TrackerConfig;
pub use error::{CaptureError, LinkError, PipelineError};
pub use telemetry::{TelemetryBuffer, TelemetryEncoder};
pub use tracking::{FeatureManager, FlowResult, MotionEstimator, PositionIntegrator, StabilityGate};
