use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;

use crate::channel::link::{LinkEvent, PeerLink};
use crate::channel::protocol::{
    encode_frame, register_payload, FrameDecoder, FrameType, WireFrame, PROP_NOTIFY, PROP_READ,
    PROP_WRITE,
};
use crate::config::ChannelConfig;
use crate::error::LinkError;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

/// Keep-alive schedule. `due` restarts the period when it fires, so a failed
/// send waits a full period before the next attempt.
struct Heartbeat{
    period: Duration,
    last: Instant,
}

impl Heartbeat{
    fn new(period: Duration) -> Self{
        Heartbeat{
            period,
            last: Instant::now(),
        }
    }

    fn due(&mut self) -> bool{
        if self.last.elapsed() < self.period{
            return false;
        }
        self.last = Instant::now();
        true
    }
}

/// Link to the radio co-processor over a serial port.
pub struct SerialLink{
    port: Box<dyn SerialPort>,
    decoder: FrameDecoder,
    pending: VecDeque<LinkEvent>,
    heartbeat: Heartbeat,
}

impl SerialLink{
    /// Open the port, register the attribute and wait for the radio's Ack.
    pub fn open(port_name: &str, baud_rate: u32, config: &ChannelConfig) -> Result<Self, LinkError>{
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;

        let mut link = SerialLink{
            port,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            heartbeat: Heartbeat::new(HEARTBEAT_PERIOD),
        };

        let payload = register_payload(
            &config.service_uuid,
            &config.characteristic_uuid,
            PROP_READ | PROP_WRITE | PROP_NOTIFY,
        );
        link.send(FrameType::Register, &payload)?;
        link.wait_for_ack(Duration::from_millis(config.register_timeout_ms))?;

        tracing::info!(
            "registered '{}' ({}) on {} at {} baud",
            config.name,
            config.service_uuid,
            port_name,
            baud_rate
        );
        Ok(link)
    }

    fn wait_for_ack(&mut self, timeout: Duration) -> Result<(), LinkError>{
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline{
            self.read_available(true)?;
            while let Some(frame) = self.decoder.next_frame(){
                if frame.frame_type == FrameType::Ack{
                    return Ok(());
                }
                if let Some(event) = frame_to_event(frame){
                    self.pending.push_back(event);
                }
            }
        }
        Err(LinkError::RegistrationTimeout)
    }

    //blocking=false only reads what the driver already holds
    fn read_available(&mut self, blocking: bool) -> Result<(), LinkError>{
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 && !blocking{
            return Ok(());
        }

        let mut read_buf = [0u8; 256];
        let want = waiting.clamp(1, read_buf.len());
        match self.port.read(&mut read_buf[..want]){
            Ok(n) => self.decoder.extend(&read_buf[..n]),
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(LinkError::Io(e)),
        }
        Ok(())
    }

    fn send(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<(), LinkError>{
        let frame = encode_frame(frame_type, payload)?;
        self.port.write_all(&frame)?;
        self.port.flush()?;
        Ok(())
    }
}

impl PeerLink for SerialLink{
    fn poll_event(&mut self) -> Result<Option<LinkEvent>, LinkError>{
        //a missed keep-alive must not starve inbound events
        if self.heartbeat.due(){
            if let Err(e) = self.send(FrameType::Heartbeat, &[]){
                tracing::warn!("heartbeat not sent: {}", e);
            }
        }

        if let Some(event) = self.pending.pop_front(){
            return Ok(Some(event));
        }

        self.read_available(false)?;
        while let Some(frame) = self.decoder.next_frame(){
            if let Some(event) = frame_to_event(frame){
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn respond_read(&mut self, value: &[u8]) -> Result<(), LinkError>{
        self.send(FrameType::ReadResponse, value)
    }

    fn notify(&mut self, value: &[u8]) -> Result<(), LinkError>{
        self.send(FrameType::Notify, value)
    }

    fn shutdown(&mut self){
        let _ = self.port.flush();
        tracing::debug!("serial link closed");
    }
}

/// Map an inbound frame to a link event. Host-bound types and stray Acks
/// carry no event.
pub fn frame_to_event(frame: WireFrame) -> Option<LinkEvent>{
    match frame.frame_type{
        FrameType::Connected => Some(LinkEvent::Connected),
        FrameType::Disconnected => Some(LinkEvent::Disconnected),
        FrameType::ReadRequest => Some(LinkEvent::ReadRequest),
        FrameType::WriteRequest => Some(LinkEvent::WriteRequest(frame.payload)),
        FrameType::Register
        | FrameType::Notify
        | FrameType::ReadResponse
        | FrameType::Heartbeat
        | FrameType::Ack => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(frame_type: FrameType, payload: &[u8]) -> WireFrame {
        WireFrame {
            frame_type,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_inbound_frames_become_events() {
        assert_eq!(
            frame_to_event(frame(FrameType::Connected, &[])),
            Some(LinkEvent::Connected)
        );
        assert_eq!(
            frame_to_event(frame(FrameType::WriteRequest, b"")),
            Some(LinkEvent::WriteRequest(Vec::new()))
        );
        assert_eq!(
            frame_to_event(frame(FrameType::ReadRequest, &[])),
            Some(LinkEvent::ReadRequest)
        );
    }

    #[test]
    fn test_outbound_and_ack_frames_are_ignored() {
        assert_eq!(frame_to_event(frame(FrameType::Ack, &[])), None);
        assert_eq!(frame_to_event(frame(FrameType::Notify, b"1,2 ")), None);
        assert_eq!(frame_to_event(frame(FrameType::Heartbeat, &[])), None);
    }

    #[test]
    fn test_heartbeat_waits_a_period() {
        let mut heartbeat = Heartbeat::new(Duration::from_secs(60));
        assert!(!heartbeat.due());
    }

    #[test]
    fn test_heartbeat_restarts_when_due() {
        let mut heartbeat = Heartbeat {
            period: Duration::from_millis(500),
            last: Instant::now() - Duration::from_secs(2),
        };
        assert!(heartbeat.due());
        // restarted whether or not the frame went out
        assert!(!heartbeat.due());
        assert!(heartbeat.last.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_decoded_stream_to_events() {
        let mut decoder = FrameDecoder::new();
        for (ty, payload) in [
            (FrameType::Ack, &b""[..]),
            (FrameType::Connected, &b""[..]),
            (FrameType::WriteRequest, &b"go"[..]),
            (FrameType::Disconnected, &b""[..]),
        ] {
            decoder.extend(&encode_frame(ty, payload).unwrap());
        }

        let mut events = Vec::new();
        while let Some(f) = decoder.next_frame() {
            events.extend(frame_to_event(f));
        }
        assert_eq!(
            events,
            vec![
                LinkEvent::Connected,
                LinkEvent::WriteRequest(b"go".to_vec()),
                LinkEvent::Disconnected,
            ]
        );
    }
}
