//! Per-channel accumulation of transport chunks into complete frames.
//!
//! The transport delivers each channel's bytes as an ordered stream of
//! arbitrarily sized chunks. A [`Reassembler`] buffers those bytes until the
//! 4-byte frame prefix is available, reads the declared length, and hands
//! back one complete body (payload plus CRC trailer) at a time. Bytes beyond
//! the end of the current frame stay buffered and belong to the next frame.
//!
//! One instance exists per channel; the DATA and ACK/CONTROL streams never
//! share an accumulator.

use crate::consts::{AMDTP_MAX_BODY_SIZE, AMDTP_PREFIX_SIZE_IN_PKT_USIZE};
use crate::error::FrameError;
use crate::frame::{BodyBuf, Header};
use heapless::Vec;

/// Chunk accumulator for one channel.
///
/// `N` is the raw buffer capacity: at least one maximum-sized frame plus
/// whatever spill-over a chunk may append. See
/// [`DATA_REASSEMBLY_CAP`](crate::consts::DATA_REASSEMBLY_CAP) and
/// [`ACK_REASSEMBLY_CAP`](crate::consts::ACK_REASSEMBLY_CAP).
#[derive(Debug, Default)]
pub struct Reassembler<const N: usize> {
    raw: Vec<u8, N>,
}

impl<const N: usize> Reassembler<N> {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Reassembler { raw: Vec::new() }
    }

    /// Discards all buffered bytes and any in-progress message.
    pub fn reset(&mut self) {
        self.raw.clear();
    }

    /// True while no message bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Appends one unstuffed transport chunk to the accumulator.
    ///
    /// A chunk shorter than the 4-byte prefix is simply buffered; the
    /// prefix is parsed once enough bytes have arrived.
    ///
    /// # Errors
    /// [`FrameError::TooLarge`] if the chunk overflows the accumulator. The
    /// caller must [`reset`](Reassembler::reset) the channel and notify the
    /// peer.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), FrameError> {
        self.raw
            .extend_from_slice(chunk)
            .map_err(|_| FrameError::TooLarge)
    }

    /// Extracts the next complete frame, if the buffered bytes contain one.
    ///
    /// Returns the parsed header and the frame body (payload plus CRC
    /// trailer, i.e. exactly `length` bytes). The consumed bytes are
    /// dropped; surplus bytes remain buffered for the next frame. The body
    /// still needs checksum validation by the frame codec.
    ///
    /// # Errors
    /// - [`FrameError::InvalidLength`] if the declared length cannot hold
    ///   the CRC trailer.
    /// - [`FrameError::TooLarge`] if the declared length exceeds the
    ///   512-byte payload capacity plus trailer.
    ///
    /// On error the accumulator is left untouched; the caller resets it and
    /// notifies the peer.
    pub fn next_frame(&mut self) -> Result<Option<(Header, BodyBuf)>, FrameError> {
        if self.raw.len() < AMDTP_PREFIX_SIZE_IN_PKT_USIZE {
            return Ok(None);
        }

        let length = u16::from_le_bytes([self.raw[0], self.raw[1]]);
        let header = Header::unpack(u16::from_le_bytes([self.raw[2], self.raw[3]]));

        if length < crate::consts::AMDTP_CRC_SIZE_IN_PKT {
            return Err(FrameError::InvalidLength);
        }
        if length > AMDTP_MAX_BODY_SIZE {
            return Err(FrameError::TooLarge);
        }

        let end = AMDTP_PREFIX_SIZE_IN_PKT_USIZE + length as usize;
        if self.raw.len() < end {
            return Ok(None);
        }

        let mut body = BodyBuf::new();
        let _ = body.extend_from_slice(&self.raw[AMDTP_PREFIX_SIZE_IN_PKT_USIZE..end]);

        // Keep surplus bytes: they are the start of the next frame.
        let remaining = self.raw.len() - end;
        self.raw.copy_within(end.., 0);
        self.raw.truncate(remaining);

        Ok(Some((header, body)))
    }
}
