//! Transports beneath the control channel.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::LinkError;

/// Something that happened on the radio side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent{
    Connected,
    Disconnected,
    /// The peer read the attribute; answer with `respond_read`.
    ReadRequest,
    WriteRequest(Vec<u8>),
}

/// A connection to the peer that carries one read/write/notify attribute.
///
/// Implementations must not block in `poll_event`: the capture loop calls it
/// every cycle on the same task that runs tracking.
pub trait PeerLink{
    fn poll_event(&mut self) -> Result<Option<LinkEvent>, LinkError>;
    fn respond_read(&mut self, value: &[u8]) -> Result<(), LinkError>;
    fn notify(&mut self, value: &[u8]) -> Result<(), LinkError>;
    fn shutdown(&mut self);
}

/// Bench link: the "peer" is a local stream that is always connected.
pub struct ConsoleLink{
    out: Box<dyn Write>,
    announced: bool,
}

impl ConsoleLink{
    pub fn stdout() -> Self{
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write>) -> Self{
        ConsoleLink{
            out,
            announced: false,
        }
    }
}

impl PeerLink for ConsoleLink{
    fn poll_event(&mut self) -> Result<Option<LinkEvent>, LinkError>{
        if self.announced{
            return Ok(None);
        }
        self.announced = true;
        Ok(Some(LinkEvent::Connected))
    }

    fn respond_read(&mut self, _value: &[u8]) -> Result<(), LinkError>{
        Ok(())
    }

    fn notify(&mut self, value: &[u8]) -> Result<(), LinkError>{
        self.out.write_all(value)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn shutdown(&mut self){
        let _ = self.out.flush();
    }
}

#[derive(Debug, Default)]
pub struct MemoryLinkState{
    pub events: VecDeque<LinkEvent>,
    pub notified: Vec<Vec<u8>>,
    pub read_responses: Vec<Vec<u8>>,
    pub shut_down: bool,
}

/// In-process link driven by a shared script; used by tests and for
/// replaying recorded sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryLink{
    state: Arc<Mutex<MemoryLinkState>>,
}

impl MemoryLink{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn push_event(&self, event: LinkEvent){
        if let Ok(mut state) = self.state.lock(){
            state.events.push_back(event);
        }
    }

    pub fn notified(&self) -> Vec<Vec<u8>>{
        self.state
            .lock()
            .map(|state| state.notified.clone())
            .unwrap_or_default()
    }

    pub fn read_responses(&self) -> Vec<Vec<u8>>{
        self.state
            .lock()
            .map(|state| state.read_responses.clone())
            .unwrap_or_default()
    }

    pub fn is_shut_down(&self) -> bool{
        self.state.lock().map(|state| state.shut_down).unwrap_or(false)
    }
}

impl PeerLink for MemoryLink{
    fn poll_event(&mut self) -> Result<Option<LinkEvent>, LinkError>{
        Ok(self
            .state
            .lock()
            .ok()
            .and_then(|mut state| state.events.pop_front()))
    }

    fn respond_read(&mut self, value: &[u8]) -> Result<(), LinkError>{
        if let Ok(mut state) = self.state.lock(){
            state.read_responses.push(value.to_vec());
        }
        Ok(())
    }

    fn notify(&mut self, value: &[u8]) -> Result<(), LinkError>{
        if let Ok(mut state) = self.state.lock(){
            state.notified.push(value.to_vec());
        }
        Ok(())
    }

    fn shutdown(&mut self){
        if let Ok(mut state) = self.state.lock(){
            state.shut_down = true;
        }
    }
}
