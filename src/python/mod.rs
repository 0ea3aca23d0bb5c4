use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use nalgebra::{Point2, Vector2};

use crate::config::{GateMode, TelemetryConfig};
use crate::telemetry::TelemetryEncoder;
use crate::tracking::{PositionIntegrator, StabilityGate};

#[pyclass]
pub struct PyTelemetryEncoder{
    inner: TelemetryEncoder,
}

#[pymethods]
impl PyTelemetryEncoder{
    #[new]
    #[pyo3(signature = (divisor = 3.0, chunk_size = 20, separator = " ", path_marker = "M"))]
    fn new(divisor: f32, chunk_size: usize, separator: &str, path_marker: &str) -> PyResult<Self>{
        if divisor == 0.0 || chunk_size == 0{
            return Err(PyValueError::new_err("divisor and chunk_size must be non-zero"));
        }
        let config = TelemetryConfig{
            divisor,
            separator: separator.to_string(),
            chunk_size,
            path_marker: path_marker.to_string(),
        };
        Ok(PyTelemetryEncoder{
            inner: TelemetryEncoder::new(&config),
        })
    }

    fn append(&mut self, x: f32, y: f32){
        self.inner.append(&Point2::new(x, y));
    }

    fn begin_path(&mut self){
        self.inner.begin_path();
    }

    fn emit_chunk(&mut self) -> Option<Vec<u8>>{
        self.inner.emit_chunk().map(|chunk| chunk.to_vec())
    }

    fn pending(&self) -> Vec<u8>{
        self.inner.pending().to_vec()
    }
}

#[pyclass]
pub struct PyPositionIntegrator{
    inner: PositionIntegrator,
}

#[pymethods]
impl PyPositionIntegrator{
    #[new]
    #[pyo3(signature = (width = 640, height = 480, epsilon = 0.01, gate = "settled"))]
    fn new(width: u32, height: u32, epsilon: f32, gate: &str) -> PyResult<Self>{
        let mode = match gate{
            "settled" => GateMode::Settled,
            "moving" => GateMode::Moving,
            other =>{
                return Err(PyValueError::new_err(format!(
                    "unknown gate '{}', expected 'settled' or 'moving'",
                    other
                )))
            }
        };
        Ok(PyPositionIntegrator{
            inner: PositionIntegrator::new(width, height, StabilityGate { epsilon, mode }),
        })
    }

    /// Returns the new position, or None when the gate rejected the motion.
    fn integrate(&mut self, dx: f32, dy: f32) -> Option<(f32, f32)>{
        self.inner
            .integrate(&Vector2::new(dx, dy))
            .map(|p| (p.x, p.y))
    }

    fn recenter(&mut self) -> (f32, f32){
        let origin = self.inner.recenter();
        (origin.x, origin.y)
    }

    fn position(&self) -> (f32, f32){
        let p = self.inner.position();
        (p.x, p.y)
    }
}

#[pymodule]
fn pen_tracker(_py: Python, m: &PyModule) -> PyResult<()>{
    m.add_class::<PyTelemetryEncoder>()?;
    m.add_class::<PyPositionIntegrator>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_encoder_chunks() {
        let mut encoder = PyTelemetryEncoder::new(3.0, 20, " ", "M").unwrap();
        encoder.begin_path();
        for _ in 0..3 {
            encoder.append(960.0, 720.0);
        }
        assert_eq!(encoder.emit_chunk().unwrap(), b"M 320,240 320,240 32".to_vec());
        assert_eq!(encoder.pending(), b"0,240 ".to_vec());
        assert!(encoder.emit_chunk().is_none());
    }

    #[test]
    fn test_py_integrator_gate() {
        let mut integrator = PyPositionIntegrator::new(640, 480, 0.01, "settled").unwrap();
        assert_eq!(integrator.integrate(2.0, 0.0), None);
        assert_eq!(integrator.integrate(0.0, 0.0), Some((320.0, 240.0)));
        assert_eq!(integrator.recenter(), (320.0, 240.0));
        assert!(PyPositionIntegrator::new(640, 480, 0.01, "sideways").is_err());
    }
}
