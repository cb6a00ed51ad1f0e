//! AMDTP protocol driver: state machine, ACK/resend recovery and
//! fragmentation.
//!
//! This module provides the [`AmdtpDriver`] struct, which ties the frame
//! codec, the escape codec and the per-channel reassembly buffers together
//! into the message-transfer protocol proper. It owns the injected
//! [`Transport`] (the GATT layer) and [`MessageSink`] (the application
//! handler) and is driven entirely from two entry points:
//!
//! - [`send_message`](AmdtpDriver::send_message), called by the application
//!   with an outbound payload;
//! - [`receive`](AmdtpDriver::receive), called from the transport's
//!   notification callback with each inbound chunk.
//!
//! ## Outbound path
//!
//! A payload is framed (length, header, CRC-32), stuffed so no literal zero
//! byte reaches the transport, and written out in chunks of `mtu - 3` bytes.
//! The escaped frame is retained until the peer acknowledges it: an ACK with
//! status `CrcError` or `ResendReply` triggers a byte-for-byte retransmit,
//! an ACK with status `Success` advances the 4-bit sequence number and
//! frees the slot. Only one DATA frame may be outstanding at a time;
//! [`send_message`](AmdtpDriver::send_message) rejects with `Busy` until the
//! outstanding frame reaches a terminal ACK.
//!
//! ## Inbound path
//!
//! Chunks are unstuffed and accumulated per channel until a complete frame
//! is available, the checksum is verified, and the frame is dispatched on
//! its packet type. Length and checksum faults are recovered locally: the
//! channel buffer is discarded and the peer is notified with the matching
//! ACK status so it can retransmit.
//!
//! ## Timing
//!
//! There is no internal timer: a lost ACK leaves the driver in
//! [`AmdtpState::Sending`] until the host tears the connection down and
//! calls [`reset`](AmdtpDriver::reset). Hosts that need a bounded wait must
//! layer their own timeout over [`poll_complete`](AmdtpDriver::poll_complete).
//!
//! ## Example
//!
//! ```rust
//! use amdtp::driver::AmdtpDriver;
//! use amdtp::transport::{Channel, MessageSink, Transport};
//!
//! # #[derive(Debug)]
//! # struct Gatt;
//! # impl Transport for Gatt {
//! #     type Error = core::convert::Infallible;
//! #     fn send(&mut self, _: Channel, _: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn mtu(&self) -> u16 { 23 }
//! # }
//! # #[derive(Debug)]
//! # struct App;
//! # impl MessageSink for App { fn deliver(&mut self, _: &[u8]) {} }
//! let mut driver = AmdtpDriver::new(Gatt, App);
//! driver.send_message(b"HELLO").unwrap();
//! assert!(driver.is_busy()); // until the peer ACKs
//! ```

use crate::consts::{
    ACK_REASSEMBLY_CAP, AMDTP_STUFFED_PACKET_SIZE_USIZE, ATT_DEFAULT_PAYLOAD_LEN_USIZE,
    ATT_ENVELOPE_SIZE_USIZE, DATA_REASSEMBLY_CAP, PACKET_SN_MODULO,
};
use crate::error::{AmdtpError, FrameError};
use crate::frame::{self, AmdtpControl, AmdtpStatus, Header, PacketType};
use crate::macros::{debug, trace, warn};
use crate::reassembly::Reassembler;
use crate::stuffing;
use crate::transport::{Channel, MessageSink, Transport};
use core::convert::Infallible;
use heapless::Vec;

/// An escaped frame retained for possible retransmission.
type PendingBuf = Vec<u8, AMDTP_STUFFED_PACKET_SIZE_USIZE>;

/// High-level state of the outbound half of the driver.
///
/// The inbound half has no state of its own beyond the reassembly buffers;
/// it reacts to whatever arrives.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum AmdtpState {
    /// No DATA frame is outstanding; a new send is accepted.
    #[default]
    Idle,
    /// A DATA frame has been transmitted (or retransmitted) and its
    /// terminal ACK has not yet arrived. New sends are rejected with
    /// `Busy`.
    Sending,
}

/// The AMDTP protocol core for one endpoint.
///
/// One instance exists per connection, owned by the host application and
/// shared with the transport's callback registration. All entry points must
/// run on a single logical thread of execution; a multi-threaded host must
/// serialize calls with a mutex (see the [`shared`](crate::shared) module
/// for an interrupt-safe wrapper).
///
/// ## Type Parameters
///
/// - `T`: the GATT transport implementing [`Transport`]
/// - `S`: the application handler implementing [`MessageSink`]
///
/// Tearing down the connection must be followed by
/// [`reset`](AmdtpDriver::reset); no state survives a disconnect.
#[derive(Debug)]
pub struct AmdtpDriver<T, S>
where
    T: Transport,
    S: MessageSink,
{
    /// Current outbound state.
    pub state: AmdtpState,
    /// The injected GATT transport.
    pub transport: T,
    /// The injected application message handler.
    pub sink: S,

    /// Value stamped into the encryption header bit of outbound DATA
    /// frames. Defined on the wire, never enforced by either side.
    pub tx_encrypted: bool,

    /// Value stamped into the ack-enabled header bit of outbound DATA
    /// frames. Defined on the wire, never consulted by the state machine.
    pub tx_ack_enabled: bool,

    /// Counter of DATA frames acknowledged with `Success`.
    pub tx_good: u16,

    /// Counter of complete, checksum-valid DATA frames delivered to the
    /// sink.
    pub rx_good: u16,

    /// Counter of inbound messages discarded for length or checksum
    /// faults.
    pub rx_bad: u16,

    tx_sn: u8,
    last_rx_sn: u8,
    pending: Option<PendingBuf>,
    data_chan: Reassembler<DATA_REASSEMBLY_CAP>,
    ack_chan: Reassembler<ACK_REASSEMBLY_CAP>,
}

impl<T, S> AmdtpDriver<T, S>
where
    T: Transport,
    S: MessageSink,
{
    /// Creates a driver for a fresh connection.
    ///
    /// # Arguments
    /// - `transport`: the GATT layer used for all outbound chunks.
    /// - `sink`: the application handler for reassembled payloads.
    ///
    /// Sequence numbers start at 0 and both header flag bits default to
    /// off.
    pub fn new(transport: T, sink: S) -> Self {
        AmdtpDriver {
            state: AmdtpState::Idle,
            transport,
            sink,
            tx_encrypted: false,
            tx_ack_enabled: false,
            tx_good: 0,
            rx_good: 0,
            rx_bad: 0,
            tx_sn: 0,
            last_rx_sn: 0,
            pending: None,
            data_chan: Reassembler::new(),
            ack_chan: Reassembler::new(),
        }
    }

    /// Restores the driver to its initial state.
    ///
    /// Must be called when the transport disconnects: discards both
    /// reassembly buffers, any outstanding frame, and resets the sequence
    /// numbers. The `tx_good`/`rx_good`/`rx_bad` counters are preserved.
    pub fn reset(&mut self) {
        self.state = AmdtpState::Idle;
        self.tx_sn = 0;
        self.last_rx_sn = 0;
        self.pending = None;
        self.data_chan.reset();
        self.ack_chan.reset();
    }

    /// Sequence number the next outbound DATA frame will carry.
    pub fn tx_sequence(&self) -> u8 {
        self.tx_sn
    }

    /// Sequence number of the most recently accepted inbound DATA frame.
    pub fn last_rx_sequence(&self) -> u8 {
        self.last_rx_sn
    }

    /// True while a DATA frame is outstanding and new sends are rejected.
    pub fn is_busy(&self) -> bool {
        self.state == AmdtpState::Sending
    }

    /// Non-blocking completion check for the outstanding DATA frame.
    ///
    /// Returns [`nb::Error::WouldBlock`] until the terminal ACK has been
    /// processed. With no internal timer, a lost ACK blocks forever; see
    /// the module docs.
    pub fn poll_complete(&self) -> nb::Result<(), Infallible> {
        if self.state == AmdtpState::Sending {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Sends one application message to the peer.
    ///
    /// Frames, stuffs and fragments `payload`, then transmits every chunk
    /// synchronously. Returns as soon as the last chunk has been handed to
    /// the transport; completion is signaled by the peer's ACK (observable
    /// via [`poll_complete`](AmdtpDriver::poll_complete)).
    ///
    /// # Errors
    /// - [`AmdtpError::Busy`] if a previous message has not reached its
    ///   terminal ACK. Nothing is transmitted.
    /// - [`AmdtpError::InvalidLength`] if `payload` exceeds 512 bytes.
    ///   Nothing is transmitted.
    /// - [`AmdtpError::Transport`] if the transport rejects a chunk; the
    ///   driver returns to idle and the message is not retained.
    pub fn send_message(&mut self, payload: &[u8]) -> Result<(), AmdtpError<T::Error>> {
        if self.state != AmdtpState::Idle {
            return Err(AmdtpError::Busy);
        }

        let header = Header {
            packet_type: PacketType::Data,
            sequence: self.tx_sn,
            encrypted: self.tx_encrypted,
            ack_enabled: self.tx_ack_enabled,
        };
        let frame = frame::build(header, payload)?;
        let stuffed = stuffing::stuff::<AMDTP_STUFFED_PACKET_SIZE_USIZE>(&frame)?;

        debug!(
            "sending {} byte payload, sn {}, {} bytes on the wire",
            payload.len(),
            self.tx_sn,
            stuffed.len()
        );

        Self::transmit(&mut self.transport, Channel::Data, &stuffed)
            .map_err(AmdtpError::Transport)?;

        self.pending = Some(stuffed);
        self.state = AmdtpState::Sending;
        Ok(())
    }

    /// Sends a CONTROL request to the peer on the ACK channel.
    ///
    /// The first payload byte is the control code, followed by `data` (for
    /// [`AmdtpControl::ResendRequest`], the queried sequence number). The
    /// driver never emits a control request on its own; this surface exists
    /// for hosts that do.
    ///
    /// # Errors
    /// [`AmdtpError::InvalidLength`] if `data` does not fit in a single ATT
    /// payload alongside the control code.
    pub fn send_control(
        &mut self,
        control: AmdtpControl,
        data: &[u8],
    ) -> Result<(), AmdtpError<T::Error>> {
        let mut payload: Vec<u8, ATT_DEFAULT_PAYLOAD_LEN_USIZE> = Vec::new();
        payload
            .push(control as u8)
            .map_err(|_| AmdtpError::InvalidLength)?;
        payload
            .extend_from_slice(data)
            .map_err(|_| AmdtpError::InvalidLength)?;
        self.send_ack_frame(PacketType::Control, &payload)
    }

    /// Feeds one raw inbound transport chunk into the protocol.
    ///
    /// Call this from the transport's notification callback with the bytes
    /// exactly as delivered. The chunk is unstuffed, accumulated on
    /// `channel`, and any frames it completes are processed: payloads are
    /// delivered to the sink, ACKs advance or retransmit the outstanding
    /// frame, control requests are answered.
    ///
    /// Length and checksum faults in the inbound stream are recovered
    /// locally (buffer discarded, peer notified) and do **not** surface as
    /// errors here.
    ///
    /// # Errors
    /// [`AmdtpError::Transport`] if sending a reply or retransmit chunk
    /// fails.
    pub fn receive(&mut self, channel: Channel, chunk: &[u8]) -> Result<(), AmdtpError<T::Error>> {
        let unstuffed = match stuffing::unstuff::<AMDTP_STUFFED_PACKET_SIZE_USIZE>(chunk) {
            Ok(bytes) => bytes,
            Err(err) => return self.recover(channel, err),
        };

        let fed = match channel {
            Channel::Data => self.data_chan.feed(&unstuffed),
            Channel::Ack => self.ack_chan.feed(&unstuffed),
        };
        if let Err(err) = fed {
            return self.recover(channel, err);
        }

        self.pump(channel)
    }

    /// Drains every complete frame currently buffered on `channel`.
    fn pump(&mut self, channel: Channel) -> Result<(), AmdtpError<T::Error>> {
        loop {
            let next = match channel {
                Channel::Data => self.data_chan.next_frame(),
                Channel::Ack => self.ack_chan.next_frame(),
            };
            match next {
                Ok(None) => return Ok(()),
                Ok(Some((header, body))) => match frame::validate(&body) {
                    Ok(payload) => self.dispatch(header, payload)?,
                    Err(err) => return self.recover(channel, err),
                },
                Err(err) => return self.recover(channel, err),
            }
        }
    }

    /// Reacts to one complete, checksum-valid frame.
    fn dispatch(&mut self, header: Header, payload: &[u8]) -> Result<(), AmdtpError<T::Error>> {
        match header.packet_type {
            PacketType::Data => {
                trace!("data frame sn {}, {} bytes", header.sequence, payload.len());
                self.last_rx_sn = header.sequence;
                self.rx_good = self.rx_good.wrapping_add(1);
                // Acknowledge first, then hand the payload to the
                // application.
                self.send_reply(AmdtpStatus::Success, &[])?;
                self.sink.deliver(payload);
            }
            PacketType::Ack => self.handle_ack(payload)?,
            PacketType::Control => self.handle_control(payload)?,
            PacketType::Unknown => {
                warn!("frame with unknown packet type dropped");
            }
        }
        Ok(())
    }

    /// Processes the status byte of an inbound ACK frame.
    fn handle_ack(&mut self, payload: &[u8]) -> Result<(), AmdtpError<T::Error>> {
        let Some(&status_byte) = payload.first() else {
            warn!("empty ack frame dropped");
            return Ok(());
        };
        match AmdtpStatus::from_wire(status_byte) {
            AmdtpStatus::CrcError | AmdtpStatus::ResendReply => {
                debug!("peer requested resend, status {}", status_byte);
                self.retransmit()?;
            }
            AmdtpStatus::Success => {
                if self.state == AmdtpState::Sending {
                    self.tx_sn = (self.tx_sn + 1) % PACKET_SN_MODULO;
                    self.tx_good = self.tx_good.wrapping_add(1);
                    self.pending = None;
                    self.state = AmdtpState::Idle;
                }
            }
            _ => {
                // Terminal failure: the peer cannot accept this frame, give
                // up on it.
                warn!("peer rejected frame with status {}", status_byte);
                self.pending = None;
                self.state = AmdtpState::Idle;
            }
        }
        Ok(())
    }

    /// Processes an inbound CONTROL frame.
    fn handle_control(&mut self, payload: &[u8]) -> Result<(), AmdtpError<T::Error>> {
        let (Some(&code), Some(&sequence)) = (payload.first(), payload.get(1)) else {
            warn!("truncated control frame dropped");
            return Ok(());
        };
        match AmdtpControl::from_wire(code) {
            Some(AmdtpControl::ResendRequest) => {
                self.data_chan.reset();
                if sequence > self.last_rx_sn {
                    // The peer asks about a message we have not seen yet.
                    self.send_reply(AmdtpStatus::ResendReply, &[])?;
                } else if sequence == self.last_rx_sn {
                    self.send_reply(AmdtpStatus::Success, &[])?;
                } else {
                    debug!(
                        "stale resend request sn {}, last received {}",
                        sequence, self.last_rx_sn
                    );
                }
            }
            None => {
                warn!("unexpected control request {}", code);
            }
        }
        Ok(())
    }

    /// Discards `channel`'s in-progress message and notifies the peer.
    fn recover(&mut self, channel: Channel, err: FrameError) -> Result<(), AmdtpError<T::Error>> {
        warn!("inbound message discarded: {}", err as u8);
        self.rx_bad = self.rx_bad.wrapping_add(1);
        match channel {
            Channel::Data => self.data_chan.reset(),
            Channel::Ack => self.ack_chan.reset(),
        }
        let status = match err {
            FrameError::TooLarge => AmdtpStatus::InsufficientBuffer,
            FrameError::ChecksumMismatch => AmdtpStatus::CrcError,
            FrameError::TooShort | FrameError::InvalidLength => AmdtpStatus::InvalidPktLength,
        };
        self.send_reply(status, &[])
    }

    /// Sends an ACK frame whose first payload byte is `status`.
    fn send_reply(
        &mut self,
        status: AmdtpStatus,
        data: &[u8],
    ) -> Result<(), AmdtpError<T::Error>> {
        let mut payload: Vec<u8, ATT_DEFAULT_PAYLOAD_LEN_USIZE> = Vec::new();
        payload
            .push(status as u8)
            .map_err(|_| AmdtpError::InvalidLength)?;
        payload
            .extend_from_slice(data)
            .map_err(|_| AmdtpError::InvalidLength)?;
        self.send_ack_frame(PacketType::Ack, &payload)
    }

    /// Frames, stuffs and transmits an ACK or CONTROL payload on the ACK
    /// channel. Replies are never sequence-numbered and never retained.
    fn send_ack_frame(
        &mut self,
        packet_type: PacketType,
        payload: &[u8],
    ) -> Result<(), AmdtpError<T::Error>> {
        let header = Header {
            packet_type,
            sequence: 0,
            encrypted: false,
            ack_enabled: false,
        };
        let frame = frame::build(header, payload)?;
        let stuffed = stuffing::stuff::<AMDTP_STUFFED_PACKET_SIZE_USIZE>(&frame)?;
        Self::transmit(&mut self.transport, Channel::Ack, &stuffed).map_err(AmdtpError::Transport)
    }

    /// Retransmits the outstanding DATA frame byte-for-byte.
    fn retransmit(&mut self) -> Result<(), AmdtpError<T::Error>> {
        if let Some(pending) = self.pending.as_ref() {
            Self::transmit(&mut self.transport, Channel::Data, pending)
                .map_err(AmdtpError::Transport)?;
        } else {
            warn!("resend requested but no frame is outstanding");
        }
        Ok(())
    }

    /// Writes an escaped frame to the transport in MTU-bounded chunks.
    ///
    /// Each chunk carries `min(mtu - 3, remaining)` bytes; the 3 reserved
    /// bytes cover the transport's own ATT envelope. Chunks are emitted
    /// synchronously, in order.
    fn transmit(transport: &mut T, channel: Channel, frame: &[u8]) -> Result<(), T::Error> {
        let chunk_len = (transport.mtu() as usize)
            .saturating_sub(ATT_ENVELOPE_SIZE_USIZE)
            .max(1);
        for chunk in frame.chunks(chunk_len) {
            trace!("chunk of {} bytes", chunk.len());
            transport.send(channel, chunk)?;
        }
        Ok(())
    }
}
