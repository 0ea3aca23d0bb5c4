use crate::error::LinkError;

pub const SYNC_BYTE: u8 = 0xAA;
pub const MAX_PAYLOAD: usize = 244;

//attribute property flags carried in Register
pub const PROP_READ: u8 = 0x01;
pub const PROP_WRITE: u8 = 0x02;
pub const PROP_NOTIFY: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType{
    //host -> radio
    Register = 0x01,
    Notify = 0x02,
    ReadResponse = 0x03,
    Heartbeat = 0x04,
    //radio -> host
    Ack = 0x05,
    Connected = 0x10,
    Disconnected = 0x11,
    ReadRequest = 0x12,
    WriteRequest = 0x13,
}

impl FrameType{
    pub fn from_u8(val: u8) -> Option<Self>{
        match val{
            0x01 => Some(FrameType::Register),
            0x02 => Some(FrameType::Notify),
            0x03 => Some(FrameType::ReadResponse),
            0x04 => Some(FrameType::Heartbeat),
            0x05 => Some(FrameType::Ack),
            0x10 => Some(FrameType::Connected),
            0x11 => Some(FrameType::Disconnected),
            0x12 => Some(FrameType::ReadRequest),
            0x13 => Some(FrameType::WriteRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame{
    pub frame_type: FrameType,
    pub payload: Vec<u8>,
}

pub fn checksum(data: &[u8]) -> u8{
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// `[SYNC][TYPE][LEN][PAYLOAD...][CHECKSUM]`, checksum over TYPE..PAYLOAD.
pub fn encode_frame(frame_type: FrameType, payload: &[u8]) -> Result<Vec<u8>, LinkError>{
    if payload.len() > MAX_PAYLOAD{
        return Err(LinkError::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.push(SYNC_BYTE);
    frame.push(frame_type as u8);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame[1..]));
    Ok(frame)
}

/// Register payload: `service\0characteristic\0flags`.
pub fn register_payload(service: &str, characteristic: &str, flags: u8) -> Vec<u8>{
    let mut payload = Vec::with_capacity(service.len() + characteristic.len() + 3);
    payload.extend_from_slice(service.as_bytes());
    payload.push(0);
    payload.extend_from_slice(characteristic.as_bytes());
    payload.push(0);
    payload.push(flags);
    payload
}

//accumulates raw serial bytes and yields whole frames
#[derive(Debug, Default)]
pub struct FrameDecoder{
    rx_buffer: Vec<u8>,
}

impl FrameDecoder{
    pub fn new() -> Self{
        FrameDecoder{
            rx_buffer: Vec::with_capacity(512),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]){
        self.rx_buffer.extend_from_slice(bytes);
    }

    /// Next valid frame, resyncing past garbage and bad checksums.
    pub fn next_frame(&mut self) -> Option<WireFrame>{
        loop{
            if self.rx_buffer.len() < 4{
                return None;
            }

            //find sync byte
            let sync_pos = match self.rx_buffer.iter().position(|&b| b == SYNC_BYTE){
                Some(pos) => pos,
                None =>{
                    self.rx_buffer.clear();
                    return None;
                }
            };
            if sync_pos > 0{
                self.rx_buffer.drain(0..sync_pos);
            }
            if self.rx_buffer.len() < 4{
                return None;
            }

            let type_byte = self.rx_buffer[1];
            let len = self.rx_buffer[2] as usize;
            if len > MAX_PAYLOAD{
                self.rx_buffer.remove(0);
                continue;
            }

            let frame_len = 4 + len;
            if self.rx_buffer.len() < frame_len{
                return None;
            }

            let expected = self.rx_buffer[3 + len];
            if expected != checksum(&self.rx_buffer[1..3 + len]){
                self.rx_buffer.remove(0);
                continue;
            }

            let payload = self.rx_buffer[3..3 + len].to_vec();
            self.rx_buffer.drain(0..frame_len);

            match FrameType::from_u8(type_byte){
                Some(frame_type) => return Some(WireFrame { frame_type, payload }),
                None =>{
                    tracing::debug!("dropping frame with unknown type 0x{:02x}", type_byte);
                    continue;
                }
            }
        }
    }
}
