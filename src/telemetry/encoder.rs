//! Position samples as short ASCII text, sized for a small-MTU attribute.
//!
//! A sample is `"<x>,<y><sep>"` where each coordinate is the position divided
//! by a fixed divisor and truncated toward zero. A path marker may be written
//! at the start of each stroke so the peer can split the stream into paths.

use bytes::Bytes;
use nalgebra::Point2;

use crate::config::TelemetryConfig;
use crate::telemetry::buffer::TelemetryBuffer;

pub struct TelemetryEncoder{
    buffer: TelemetryBuffer,
    divisor: f32,
    separator: String,
    chunk_size: usize,
    path_marker: String,
}

impl Default for TelemetryEncoder{
    fn default() -> Self{
        Self::new(&TelemetryConfig::default())
    }
}

impl TelemetryEncoder{
    pub fn new(config: &TelemetryConfig) -> Self{
        Self{
            buffer: TelemetryBuffer::with_capacity(config.chunk_size * 4),
            divisor: config.divisor,
            separator: config.separator.clone(),
            chunk_size: config.chunk_size,
            path_marker: config.path_marker.clone(),
        }
    }

    /// Text written for one position.
    pub fn format_sample(&self, position: &Point2<f32>) -> String{
        let x = (position.x / self.divisor).trunc() as i64;
        let y = (position.y / self.divisor).trunc() as i64;
        format!("{},{}{}", x, y, self.separator)
    }

    pub fn append(&mut self, position: &Point2<f32>){
        let sample = self.format_sample(position);
        self.append_raw(sample.as_bytes());
    }

    /// Append pre-encoded bytes verbatim.
    pub fn append_raw(&mut self, bytes: &[u8]){
        self.buffer.append(bytes);
    }

    /// Mark the start of a new stroke. No-op when the marker is empty.
    pub fn begin_path(&mut self){
        if self.path_marker.is_empty(){
            return;
        }
        let marker = format!("{}{}", self.path_marker, self.separator);
        self.buffer.append(marker.as_bytes());
    }

    /// Next full chunk, if strictly more than one chunk's worth is pending.
    pub fn emit_chunk(&mut self) -> Option<Bytes>{
        self.buffer.emit_chunk(self.chunk_size)
    }

    pub fn pending(&self) -> &[u8]{
        self.buffer.pending()
    }

    pub fn chunk_size(&self) -> usize{
        self.chunk_size
    }

    pub fn buffer(&self) -> &TelemetryBuffer{
        &self.buffer
    }
}
