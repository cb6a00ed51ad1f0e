//! Error types for the AMDTP protocol core.

use core::fmt::Debug;
use thiserror::Error;

/// Errors produced by the frame codec and the reassembly buffers.
///
/// These never escape the driver's receive path: the driver recovers by
/// discarding the in-progress message and notifying the peer with an ACK
/// status code. They are surfaced directly only through the lower-level
/// [`frame`](crate::frame) and [`reassembly`](crate::reassembly) APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer bytes were available than a frame prefix requires.
    #[error("message too short to contain a frame prefix")]
    TooShort,
    /// The declared length exceeds the receive buffer capacity.
    #[error("declared length exceeds the receive buffer")]
    TooLarge,
    /// The CRC-32 trailer does not match the payload.
    #[error("frame checksum does not match the payload")]
    ChecksumMismatch,
    /// The declared length cannot even hold the CRC-32 trailer, or a payload
    /// exceeded the maximum message size.
    #[error("invalid frame length")]
    InvalidLength,
}

/// Errors surfaced to the application by [`AmdtpDriver`](crate::driver::AmdtpDriver).
///
/// `E` is the opaque error type of the injected [`Transport`](crate::transport::Transport).
#[derive(Debug, PartialEq, Eq, Error)]
pub enum AmdtpError<E: Debug> {
    /// The requested payload exceeds the maximum message size.
    #[error("payload exceeds the maximum message size")]
    InvalidLength,
    /// A message is already outstanding; wait for its terminal ACK.
    #[error("a message is already outstanding")]
    Busy,
    /// An inbound frame declared a length that overflows the reassembly
    /// buffer.
    #[error("inbound frame overflows the reassembly buffer")]
    InsufficientBuffer,
    /// An inbound frame failed checksum validation.
    #[error("inbound frame failed checksum validation")]
    ChecksumMismatch,
    /// The transport rejected a chunk.
    #[error("transport error")]
    Transport(E),
}

impl<E: Debug> From<FrameError> for AmdtpError<E> {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::TooShort | FrameError::InvalidLength => AmdtpError::InvalidLength,
            FrameError::TooLarge => AmdtpError::InsufficientBuffer,
            FrameError::ChecksumMismatch => AmdtpError::ChecksumMismatch,
        }
    }
}
