pub mod buffer;
pub mod encoder;

pub use buffer::TelemetryBuffer;
pub use encoder::TelemetryEncoder;
