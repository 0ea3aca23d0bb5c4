use std::ptr;

use nalgebra::{Point2, Vector2};

use crate::config::{GateMode, TelemetryConfig};
use crate::telemetry::TelemetryEncoder;
use crate::tracking::{PositionIntegrator, StabilityGate};

pub struct PenEncoder{
    inner: TelemetryEncoder,
}

pub struct PenIntegrator{
    inner: PositionIntegrator,
}

//encoder with the default separator and path marker
#[no_mangle]
pub extern "C" fn pen_encoder_new(divisor: f32, chunk_size: usize) -> *mut PenEncoder{
    if divisor == 0.0 || chunk_size == 0{
        return ptr::null_mut();
    }
    let config = TelemetryConfig{
        divisor,
        chunk_size,
        ..TelemetryConfig::default()
    };
    let encoder = Box::new(PenEncoder{
        inner: TelemetryEncoder::new(&config),
    });
    Box::into_raw(encoder)
}

#[no_mangle]
pub unsafe extern "C" fn pen_encoder_free(encoder: *mut PenEncoder){
    if !encoder.is_null(){
        unsafe{ drop(Box::from_raw(encoder)); }
    }
}

#[no_mangle]
pub unsafe extern "C" fn pen_encoder_append(encoder: *mut PenEncoder, x: f32, y: f32) -> i32{
    if encoder.is_null(){
        return -1;
    }
    unsafe{
        (*encoder).inner.append(&Point2::new(x, y));
    }
    0
}

#[no_mangle]
pub unsafe extern "C" fn pen_encoder_begin_path(encoder: *mut PenEncoder) -> i32{
    if encoder.is_null(){
        return -1;
    }
    unsafe{
        (*encoder).inner.begin_path();
    }
    0
}

/// 1 = chunk written, 0 = nothing due, -1 = null argument,
/// -2 = `max_len` smaller than one chunk (nothing consumed).
#[no_mangle]
pub unsafe extern "C" fn pen_encoder_emit_chunk(
    encoder: *mut PenEncoder,
    out_data: *mut u8,
    out_len: *mut usize,
    max_len: usize,
) -> i32{
    if encoder.is_null() || out_data.is_null() || out_len.is_null(){
        return -1;
    }

    unsafe{
        let enc = &mut *encoder;
        if max_len < enc.inner.chunk_size(){
            return -2;
        }
        match enc.inner.emit_chunk(){
            Some(chunk) =>{
                ptr::copy_nonoverlapping(chunk.as_ptr(), out_data, chunk.len());
                *out_len = chunk.len();
                1
            }
            None => 0,
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn pen_encoder_pending(encoder: *const PenEncoder) -> usize{
    if encoder.is_null(){
        return 0;
    }
    unsafe{ (*encoder).inner.pending().len() }
}

//moving != 0 selects the "integrate only when moving" gate
#[no_mangle]
pub extern "C" fn pen_integrator_new(width: u32, height: u32, epsilon: f32, moving: i32) -> *mut PenIntegrator{
    let gate = StabilityGate{
        epsilon,
        mode: if moving != 0 { GateMode::Moving }else{ GateMode::Settled },
    };
    let integrator = Box::new(PenIntegrator{
        inner: PositionIntegrator::new(width, height, gate),
    });
    Box::into_raw(integrator)
}

#[no_mangle]
pub unsafe extern "C" fn pen_integrator_free(integrator: *mut PenIntegrator){
    if !integrator.is_null(){
        unsafe{ drop(Box::from_raw(integrator)); }
    }
}

/// 1 = accepted, 0 = gated out, -1 = null argument. The current position is
/// written either way.
#[no_mangle]
pub unsafe extern "C" fn pen_integrator_integrate(
    integrator: *mut PenIntegrator,
    dx: f32,
    dy: f32,
    out_x: *mut f32,
    out_y: *mut f32,
) -> i32{
    if integrator.is_null() || out_x.is_null() || out_y.is_null(){
        return -1;
    }

    unsafe{
        let ig = &mut *integrator;
        let accepted = ig.inner.integrate(&Vector2::new(dx, dy)).is_some();
        let position = ig.inner.position();
        *out_x = position.x;
        *out_y = position.y;
        if accepted { 1 }else{ 0 }
    }
}

#[no_mangle]
pub unsafe extern "C" fn pen_integrator_recenter(
    integrator: *mut PenIntegrator,
    out_x: *mut f32,
    out_y: *mut f32,
) -> i32{
    if integrator.is_null() || out_x.is_null() || out_y.is_null(){
        return -1;
    }

    unsafe{
        let origin = (*integrator).inner.recenter();
        *out_x = origin.x;
        *out_y = origin.y;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_encoder_create_free() {
        let encoder = pen_encoder_new(3.0, 20);
        assert!(!encoder.is_null());
        unsafe { pen_encoder_free(encoder); }
        assert!(pen_encoder_new(0.0, 20).is_null());
    }

    #[test]
    fn test_ffi_encoder_chunks() {
        let encoder = pen_encoder_new(3.0, 20);
        let mut out_data = [0u8; 64];
        let mut out_len = 0usize;

        unsafe {
            assert_eq!(pen_encoder_begin_path(encoder), 0);
            for _ in 0..3 {
                pen_encoder_append(encoder, 960.0, 720.0);
            }
            // "M " + 3 x "320,240 " = 26 bytes
            assert_eq!(pen_encoder_pending(encoder), 26);

            assert_eq!(pen_encoder_emit_chunk(encoder, out_data.as_mut_ptr(), &mut out_len, 8), -2);
            assert_eq!(pen_encoder_pending(encoder), 26);

            assert_eq!(pen_encoder_emit_chunk(encoder, out_data.as_mut_ptr(), &mut out_len, 64), 1);
            assert_eq!(out_len, 20);
            assert_eq!(&out_data[..20], b"M 320,240 320,240 32");
            assert_eq!(pen_encoder_emit_chunk(encoder, out_data.as_mut_ptr(), &mut out_len, 64), 0);

            pen_encoder_free(encoder);
        }
    }

    #[test]
    fn test_ffi_integrator() {
        let integrator = pen_integrator_new(640, 480, 0.01, 0);
        let (mut x, mut y) = (0.0f32, 0.0f32);

        unsafe {
            assert_eq!(pen_integrator_integrate(integrator, 5.0, 0.0, &mut x, &mut y), 0);
            assert_eq!((x, y), (320.0, 240.0));
            assert_eq!(pen_integrator_integrate(integrator, 0.0, 0.0, &mut x, &mut y), 1);

            assert_eq!(pen_integrator_recenter(integrator, &mut x, &mut y), 0);
            assert_eq!((x, y), (320.0, 240.0));
            assert_eq!(pen_integrator_integrate(ptr::null_mut(), 0.0, 0.0, &mut x, &mut y), -1);

            pen_integrator_free(integrator);
        }
    }
}
