//! Trait seams between the protocol core and its collaborators.
//!
//! The core never talks to a BLE stack directly. The host injects a
//! [`Transport`] (the GATT layer: one writable characteristic per channel
//! plus the negotiated MTU) and a [`MessageSink`] (the application handler
//! for reassembled messages) into the driver at construction time. Inbound
//! chunks are pushed into the driver by calling
//! [`AmdtpDriver::receive`](crate::driver::AmdtpDriver::receive) from the
//! transport's notification callback.

use core::fmt::Debug;

/// One of the two independent byte streams the transport exposes.
///
/// DATA frames travel on one characteristic, ACK and CONTROL frames on
/// another; their reassembly states never interleave.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Channel {
    /// Carries DATA frames.
    Data,
    /// Carries ACK and CONTROL frames.
    Ack,
}

/// The outbound half of the GATT transport.
///
/// Implementations write one MTU-bounded chunk per [`send`](Transport::send)
/// call; the driver never hands over more than `mtu() - 3` bytes at a time.
pub trait Transport {
    /// Opaque transport failure, propagated to the caller unchanged.
    type Error: Debug;

    /// Writes one chunk to the characteristic backing `channel`.
    fn send(&mut self, channel: Channel, chunk: &[u8]) -> Result<(), Self::Error>;

    /// The currently negotiated ATT MTU. Consulted on every transmission,
    /// so a renegotiation takes effect on the next frame.
    fn mtu(&self) -> u16;
}

/// The application-side consumer of reassembled messages.
pub trait MessageSink {
    /// Called once per complete, checksum-valid DATA frame, with the
    /// payload bytes exactly as the peer sent them.
    fn deliver(&mut self, payload: &[u8]);
}
