use nalgebra::{Point2, Vector2};

use crate::config::{GateMode, IntegratorConfig};

/// Threshold test deciding whether a displacement may be integrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityGate{
    pub epsilon: f32,
    pub mode: GateMode,
}

impl Default for StabilityGate{
    fn default() -> Self{
        Self{
            epsilon: 0.01,
            mode: GateMode::Settled,
        }
    }
}

impl From<&IntegratorConfig> for StabilityGate{
    fn from(config: &IntegratorConfig) -> Self{
        Self{
            epsilon: config.epsilon,
            mode: config.gate,
        }
    }
}

impl StabilityGate{
    pub fn admits(&self, displacement: &Vector2<f32>) -> bool{
        let settled = displacement.x.abs() < self.epsilon && displacement.y.abs() < self.epsilon;
        match self.mode{
            GateMode::Settled => settled,
            GateMode::Moving => !settled,
        }
    }
}

/// Add `displacement` to `position` if the gate admits it.
pub fn integrate(
    position: Point2<f32>,
    displacement: &Vector2<f32>,
    gate: &StabilityGate,
) -> Point2<f32>{
    if gate.admits(displacement){
        position + *displacement
    } else{
        position
    }
}

/// Running position estimate, relative to the canvas centre.
#[derive(Debug, Clone)]
pub struct PositionIntegrator{
    position: Point2<f32>,
    origin: Point2<f32>,
    gate: StabilityGate,
}

impl PositionIntegrator{
    pub fn new(width: u32, height: u32, gate: StabilityGate) -> Self{
        let origin = Point2::new(width as f32 / 2.0, height as f32 / 2.0);
        Self{
            position: origin,
            origin,
            gate,
        }
    }

    /// Returns the new position when the displacement was accepted.
    pub fn integrate(&mut self, displacement: &Vector2<f32>) -> Option<Point2<f32>>{
        if !self.gate.admits(displacement){
            return None;
        }
        self.position = integrate(self.position, displacement, &self.gate);
        Some(self.position)
    }

    pub fn recenter(&mut self) -> Point2<f32>{
        self.position = self.origin;
        self.position
    }

    pub fn position(&self) -> Point2<f32>{
        self.position
    }

    pub fn origin(&self) -> Point2<f32>{
        self.origin
    }
}
