use bytes::{Bytes, BytesMut};

//append-only fifo of encoded text, drained from the front in fixed chunks
#[derive(Debug, Default)]
pub struct TelemetryBuffer{
    data: BytesMut,
    total_appended: u64,
    total_emitted: u64,
}

impl TelemetryBuffer{
    pub fn new() -> Self{
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self{
        TelemetryBuffer{
            data: BytesMut::with_capacity(capacity),
            total_appended: 0,
            total_emitted: 0,
        }
    }

    pub fn append(&mut self, bytes: &[u8]){
        self.data.extend_from_slice(bytes);
        self.total_appended += bytes.len() as u64;
    }

    /// Split off the first `size` bytes, but only once strictly more than
    /// `size` bytes are pending.
    pub fn emit_chunk(&mut self, size: usize) -> Option<Bytes>{
        if size == 0 || self.data.len() <= size{
            return None;
        }
        let chunk = self.data.split_to(size).freeze();
        self.total_emitted += chunk.len() as u64;
        Some(chunk)
    }

    pub fn pending(&self) -> &[u8]{
        &self.data
    }

    pub fn len(&self) -> usize{
        self.data.len()
    }

    pub fn is_empty(&self) -> bool{
        self.data.is_empty()
    }

    pub fn total_appended(&self) -> u64{
        self.total_appended
    }

    pub fn total_emitted(&self) -> u64{
        self.total_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_size_is_not_emitted() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(&[b'x'; 20]);
        assert!(buffer.emit_chunk(20).is_none());
        buffer.append(b"y");
        assert_eq!(buffer.emit_chunk(20).unwrap().len(), 20);
        assert_eq!(buffer.pending(), b"y");
    }

    #[test]
    fn test_counters_track_flow() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(b"0123456789");
        buffer.append(b"abcdef");
        buffer.emit_chunk(8);
        assert_eq!(buffer.total_appended(), 16);
        assert_eq!(buffer.total_emitted(), 8);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.pending(), b"89abcdef");
    }

    #[test]
    fn test_zero_size_never_emits() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(b"abc");
        assert!(buffer.emit_chunk(0).is_none());
    }
}
