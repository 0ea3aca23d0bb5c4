pub mod features;
pub mod integrator;
pub mod motion;

pub use features::{FeatureManager, FeatureSet, UpdateOutcome};
pub use integrator::{integrate, PositionIntegrator, StabilityGate};
pub use motion::{FlowResult, MotionEstimator};
