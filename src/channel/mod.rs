/**
 * Control channel adapter
 *
 * One read/write/notify attribute shared with the remote peer. Link events
 * are pumped on the capture task, so the stored value is only ever touched
 * from one place. Peer writes are forwarded to the loop as trigger events
 * over an mpsc channel.
 */

pub mod link;
pub mod protocol;
pub mod serial;

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{PipelineError, Result};
use crate::tracking::PositionIntegrator;

pub use link::{ConsoleLink, LinkEvent, MemoryLink, PeerLink};
pub use serial::SerialLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState{
    Disconnected,
    Connected,
}

/// A peer write, delivered to the capture loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent{
    pub value: Vec<u8>,
}

pub struct ControlChannel{
    link: Box<dyn PeerLink>,
    value: Vec<u8>,
    state: ChannelState,
    triggers: mpsc::UnboundedSender<TriggerEvent>,
}

impl ControlChannel{
    /// Returns the channel and the receiving end for trigger events.
    pub fn new(link: Box<dyn PeerLink>) -> (Self, mpsc::UnboundedReceiver<TriggerEvent>){
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = ControlChannel{
            link,
            value: Vec::new(),
            state: ChannelState::Disconnected,
            triggers: tx,
        };
        (channel, rx)
    }

    pub fn state(&self) -> ChannelState{
        self.state
    }

    pub fn is_connected(&self) -> bool{
        self.state == ChannelState::Connected
    }

    /// Loopback read of the stored value.
    pub fn on_read(&self) -> Vec<u8>{
        self.value.clone()
    }

    pub fn on_write(&mut self, value: Vec<u8>){
        tracing::debug!("peer wrote {} bytes", value.len());
        self.value = value.clone();
        //receiver gone means the loop already stopped
        let _ = self.triggers.send(TriggerEvent { value });
    }

    /// Store `chunk` and notify the peer. When no peer is connected the
    /// chunk comes back inside `ChannelDisconnected`.
    pub fn publish(&mut self, chunk: Bytes) -> Result<()>{
        if !self.is_connected(){
            return Err(PipelineError::ChannelDisconnected(chunk));
        }
        self.value = chunk.to_vec();
        if let Err(err) = self.link.notify(&chunk){
            tracing::warn!("notify failed: {}", err);
            return Err(PipelineError::ChannelDisconnected(chunk));
        }
        Ok(())
    }

    /// Drain pending link events without blocking.
    pub fn pump(&mut self) -> Result<()>{
        while let Some(event) = self.link.poll_event()?{
            match event{
                LinkEvent::Connected =>{
                    if self.state != ChannelState::Connected{
                        tracing::info!("peer connected");
                    }
                    self.state = ChannelState::Connected;
                }
                LinkEvent::Disconnected =>{
                    if self.state != ChannelState::Disconnected{
                        tracing::warn!("peer disconnected");
                    }
                    self.state = ChannelState::Disconnected;
                }
                LinkEvent::ReadRequest =>{
                    let value = self.on_read();
                    self.link.respond_read(&value)?;
                }
                LinkEvent::WriteRequest(value) => self.on_write(value),
            }
        }
        Ok(())
    }

    /// Suspend until a peer is connected, checking every `poll`.
    pub async fn wait_for_connection(&mut self, poll: Duration) -> Result<()>{
        self.pump()?;
        while !self.is_connected(){
            tracing::debug!("waiting for connection");
            tokio::time::sleep(poll).await;
            self.pump()?;
        }
        Ok(())
    }

    pub fn shutdown(&mut self){
        self.state = ChannelState::Disconnected;
        self.link.shutdown();
    }
}

/// What the capture loop does when the peer writes the attribute.
pub trait PeerWriteHandler{
    fn on_peer_write(&mut self, event: &TriggerEvent, integrator: &mut PositionIntegrator) -> bool;
}

/// Default: the write only wakes the loop.
pub struct IgnoreWrites;

impl PeerWriteHandler for IgnoreWrites{
    fn on_peer_write(&mut self, _event: &TriggerEvent, _integrator: &mut PositionIntegrator) -> bool{
        false
    }
}

/// Treat any write as "reset pen position".
pub struct RecenterOnWrite;

impl PeerWriteHandler for RecenterOnWrite{
    fn on_peer_write(&mut self, _event: &TriggerEvent, integrator: &mut PositionIntegrator) -> bool{
        integrator.recenter();
        true
    }
}
