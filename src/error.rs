use std::fmt;

use bytes::Bytes;

/// Why a frame could not be captured.
#[derive(Debug)]
pub enum CaptureError{
    /// The source returned no usable frame this cycle.
    NoFrame(String),
    /// The source is gone for good (device unplugged, sequence exhausted).
    Closed,
}

impl CaptureError{
    pub fn is_recoverable(&self) -> bool{
        matches!(self, CaptureError::NoFrame(_))
    }
}

impl fmt::Display for CaptureError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        match self{
            CaptureError::NoFrame(reason) => write!(f, "no frame: {}", reason),
            CaptureError::Closed => write!(f, "camera closed"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<image::ImageError> for CaptureError{
    fn from(err: image::ImageError) -> Self{
        CaptureError::NoFrame(err.to_string())
    }
}

/// Errors raised by a peer link transport.
#[derive(Debug)]
pub enum LinkError{
    Io(std::io::Error),
    Serial(serialport::Error),
    /// Payload does not fit in one wire frame.
    PayloadTooLarge(usize),
    /// The radio did not acknowledge attribute registration in time.
    RegistrationTimeout,
}

impl fmt::Display for LinkError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        match self{
            LinkError::Io(err) => write!(f, "link i/o error: {}", err),
            LinkError::Serial(err) => write!(f, "serial port error: {}", err),
            LinkError::PayloadTooLarge(len) => write!(f, "payload of {} bytes too large", len),
            LinkError::RegistrationTimeout => write!(f, "radio did not acknowledge registration"),
        }
    }
}

impl std::error::Error for LinkError{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)>{
        match self{
            LinkError::Io(err) => Some(err),
            LinkError::Serial(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LinkError{
    fn from(err: std::io::Error) -> Self{
        LinkError::Io(err)
    }
}

impl From<serialport::Error> for LinkError{
    fn from(err: serialport::Error) -> Self{
        LinkError::Serial(err)
    }
}

/// Pipeline-level error kinds.
///
/// Only `ConfigurationFailure` is fatal; the others are handled inside the
/// component that detects them and never unwind past the capture loop.
#[derive(Debug)]
pub enum PipelineError{
    CaptureFailure(CaptureError),
    /// No point survived tracking this cycle.
    TrackingFailure,
    /// Publish attempted with no connected peer. Carries the chunk back so it
    /// can be held and retried.
    ChannelDisconnected(Bytes),
    ConfigurationFailure(String),
    Link(LinkError),
}

impl fmt::Display for PipelineError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        match self{
            PipelineError::CaptureFailure(err) => write!(f, "capture failure: {}", err),
            PipelineError::TrackingFailure => write!(f, "tracking failure: no point survived"),
            PipelineError::ChannelDisconnected(chunk) =>{
                write!(f, "channel disconnected, holding {} byte chunk", chunk.len())
            }
            PipelineError::ConfigurationFailure(reason) =>{
                write!(f, "configuration failure: {}", reason)
            }
            PipelineError::Link(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)>{
        match self{
            PipelineError::CaptureFailure(err) => Some(err),
            PipelineError::Link(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CaptureError> for PipelineError{
    fn from(err: CaptureError) -> Self{
        PipelineError::CaptureFailure(err)
    }
}

impl From<LinkError> for PipelineError{
    fn from(err: LinkError) -> Self{
        PipelineError::Link(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
