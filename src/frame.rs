//! Frame codec: the binary unit exchanged on the wire.
//!
//! A frame, before escaping, is laid out as
//!
//! ```text
//! | length: u16 LE | header: u16 LE | payload: 0..=512 bytes | crc32: u32 LE |
//! ```
//!
//! where `length` counts the bytes *after* the header, i.e.
//! `payload.len() + 4`, and the CRC-32 covers the payload only.
//!
//! The 16-bit header packs the packet type (bits 15..12), a 4-bit sequence
//! number (bits 11..8) and two flag bits; the remaining bits are reserved
//! and round-trip as zero.

use crate::consts::{
    AMDTP_CRC_SIZE_IN_PKT, AMDTP_CRC_SIZE_IN_PKT_USIZE, AMDTP_MAX_BODY_SIZE_USIZE,
    AMDTP_MAX_PAYLOAD_SIZE_USIZE, AMDTP_PACKET_SIZE_USIZE, PACKET_ACK_BIT_MASK,
    PACKET_ACK_BIT_OFFSET, PACKET_ENCRYPTION_BIT_MASK, PACKET_ENCRYPTION_BIT_OFFSET,
    PACKET_SN_BIT_MASK, PACKET_SN_BIT_OFFSET, PACKET_TYPE_BIT_MASK, PACKET_TYPE_BIT_OFFSET,
};
use crate::crc::checksum;
use crate::error::FrameError;
use heapless::Vec;

/// A complete unescaped frame, ready for stuffing and fragmentation.
pub type FrameBuf = Vec<u8, AMDTP_PACKET_SIZE_USIZE>;

/// The body of a frame as accumulated by a reassembly buffer:
/// payload followed by the CRC-32 trailer.
pub type BodyBuf = Vec<u8, AMDTP_MAX_BODY_SIZE_USIZE>;

/// Kind of frame, carried in the top four header bits.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[repr(u8)]
pub enum PacketType {
    /// Invalid or not-yet-parsed frame type.
    #[default]
    Unknown = 0,
    /// Application payload, sequence-numbered and acknowledged.
    Data = 1,
    /// Acknowledgement; the first payload byte is an [`AmdtpStatus`].
    Ack = 2,
    /// Control request; the first payload byte is an [`AmdtpControl`].
    Control = 3,
}

impl PacketType {
    /// Decodes the four type bits. Anything out of range is `Unknown`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => PacketType::Data,
            2 => PacketType::Ack,
            3 => PacketType::Control,
            _ => PacketType::Unknown,
        }
    }
}

/// Status code carried in the first payload byte of an ACK frame.
///
/// The discriminants are wire values shared with the peer; they must not be
/// reordered.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum AmdtpStatus {
    /// The peer accepted the frame.
    Success = 0,
    /// The peer saw a checksum mismatch; the sender retransmits.
    CrcError = 1,
    /// The peer could not interpret the frame metadata.
    InvalidMetadata = 2,
    /// The peer received fewer bytes than a frame prefix requires, or a
    /// nonsensical declared length.
    InvalidPktLength = 3,
    /// The declared length overflows the peer's receive buffer.
    InsufficientBuffer = 4,
    /// Catch-all for unrecognized status bytes.
    UnknownError = 5,
    /// The peer is busy with an outstanding transmission.
    Busy = 6,
    /// The peer's transport is not ready to transmit.
    TxNotReady = 7,
    /// Reply to a resend request for a sequence number the peer has not
    /// seen; the sender retransmits.
    ResendReply = 8,
    /// More chunks are needed before the message is complete.
    ReceiveContinue = 9,
    /// The message is complete and checksum-valid.
    ReceiveDone = 10,
}

impl AmdtpStatus {
    /// Decodes a status byte received from the peer.
    pub const fn from_wire(byte: u8) -> Self {
        match byte {
            0 => AmdtpStatus::Success,
            1 => AmdtpStatus::CrcError,
            2 => AmdtpStatus::InvalidMetadata,
            3 => AmdtpStatus::InvalidPktLength,
            4 => AmdtpStatus::InsufficientBuffer,
            6 => AmdtpStatus::Busy,
            7 => AmdtpStatus::TxNotReady,
            8 => AmdtpStatus::ResendReply,
            9 => AmdtpStatus::ReceiveContinue,
            10 => AmdtpStatus::ReceiveDone,
            _ => AmdtpStatus::UnknownError,
        }
    }
}

/// Request code carried in the first payload byte of a CONTROL frame.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum AmdtpControl {
    /// Ask the peer whether it has seen the sequence number in the second
    /// payload byte.
    ResendRequest = 0,
}

impl AmdtpControl {
    /// Decodes a control byte received from the peer.
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AmdtpControl::ResendRequest),
            _ => None,
        }
    }
}

/// The decoded 16-bit frame header.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct Header {
    /// Frame kind, bits 15..12.
    pub packet_type: PacketType,
    /// 4-bit sequence number, bits 11..8. Meaningful only for DATA frames.
    pub sequence: u8,
    /// Encryption flag, bit 7. Defined on the wire, never enforced.
    pub encrypted: bool,
    /// Ack-enabled flag, bit 6. Defined on the wire, never consulted.
    pub ack_enabled: bool,
}

impl Header {
    /// Packs the header into its 16-bit wire representation. Reserved bits
    /// are zero.
    pub fn pack(&self) -> u16 {
        let mut bits = ((self.packet_type as u16) << PACKET_TYPE_BIT_OFFSET)
            | (((self.sequence & 0xf) as u16) << PACKET_SN_BIT_OFFSET);
        if self.encrypted {
            bits |= 1 << PACKET_ENCRYPTION_BIT_OFFSET;
        }
        if self.ack_enabled {
            bits |= 1 << PACKET_ACK_BIT_OFFSET;
        }
        bits
    }

    /// Unpacks a 16-bit wire header. Reserved bits are ignored.
    pub fn unpack(bits: u16) -> Self {
        Header {
            packet_type: PacketType::from_bits(
                ((bits & PACKET_TYPE_BIT_MASK) >> PACKET_TYPE_BIT_OFFSET) as u8,
            ),
            sequence: ((bits & PACKET_SN_BIT_MASK) >> PACKET_SN_BIT_OFFSET) as u8,
            encrypted: (bits & PACKET_ENCRYPTION_BIT_MASK) != 0,
            ack_enabled: (bits & PACKET_ACK_BIT_MASK) != 0,
        }
    }
}

/// Builds a complete unescaped frame around `payload`.
///
/// Computes the CRC-32 over `payload` and lays out length, header, payload
/// and checksum per the wire format. Nothing is transmitted here.
///
/// # Errors
/// [`FrameError::InvalidLength`] if `payload` exceeds 512 bytes.
pub fn build(header: Header, payload: &[u8]) -> Result<FrameBuf, FrameError> {
    if payload.len() > AMDTP_MAX_PAYLOAD_SIZE_USIZE {
        return Err(FrameError::InvalidLength);
    }

    let length = payload.len() as u16 + AMDTP_CRC_SIZE_IN_PKT;
    let crc = checksum(payload);

    let mut frame = FrameBuf::new();
    let _ = frame.extend_from_slice(&length.to_le_bytes());
    let _ = frame.extend_from_slice(&header.pack().to_le_bytes());
    let _ = frame.extend_from_slice(payload);
    let _ = frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Validates a reassembled frame body (payload plus CRC trailer) and
/// returns the payload portion.
///
/// # Errors
/// - [`FrameError::TooShort`] if `body` cannot even hold the trailer.
/// - [`FrameError::ChecksumMismatch`] if the trailer does not match the
///   CRC-32 of the preceding payload bytes.
pub fn validate(body: &[u8]) -> Result<&[u8], FrameError> {
    if body.len() < AMDTP_CRC_SIZE_IN_PKT_USIZE {
        return Err(FrameError::TooShort);
    }
    let (payload, trailer) = body.split_at(body.len() - AMDTP_CRC_SIZE_IN_PKT_USIZE);

    let mut crc_bytes = [0u8; AMDTP_CRC_SIZE_IN_PKT_USIZE];
    crc_bytes.copy_from_slice(trailer);
    let peer_crc = u32::from_le_bytes(crc_bytes);

    if peer_crc != checksum(payload) {
        return Err(FrameError::ChecksumMismatch);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = Header {
            packet_type: PacketType::Data,
            sequence: 11,
            encrypted: true,
            ack_enabled: false,
        };
        assert_eq!(Header::unpack(header.pack()), header);
    }

    #[test]
    fn reserved_bits_round_trip_as_zero() {
        let header = Header {
            packet_type: PacketType::Control,
            sequence: 15,
            encrypted: true,
            ack_enabled: true,
        };
        assert_eq!(header.pack() & 0x003f, 0);
    }

    #[test]
    fn data_header_bit_positions() {
        let header = Header {
            packet_type: PacketType::Data,
            sequence: 5,
            encrypted: false,
            ack_enabled: false,
        };
        assert_eq!(header.pack(), 0x1500);
    }

    #[test]
    fn build_layout_for_known_payload() {
        let header = Header {
            packet_type: PacketType::Data,
            sequence: 0,
            ..Header::default()
        };
        let frame = build(header, b"HELLO").unwrap();
        // 2 length + 2 header + 5 payload + 4 crc
        assert_eq!(frame.len(), 13);
        // length counts payload + crc
        assert_eq!(u16::from_le_bytes([frame[0], frame[1]]), 9);
        assert_eq!(u16::from_le_bytes([frame[2], frame[3]]), 0x1000);
        assert_eq!(&frame[4..9], b"HELLO");
    }

    #[test]
    fn build_then_validate_round_trips() {
        for len in [0usize, 1, 19, 512] {
            let payload: std::vec::Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let header = Header {
                packet_type: PacketType::Data,
                sequence: (len % 16) as u8,
                ..Header::default()
            };
            let frame = build(header, &payload).unwrap();
            let parsed = Header::unpack(u16::from_le_bytes([frame[2], frame[3]]));
            assert_eq!(parsed, header);
            assert_eq!(validate(&frame[4..]).unwrap(), payload.as_slice());
        }
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let payload = [0u8; 513];
        assert_eq!(
            build(Header::default(), &payload),
            Err(FrameError::InvalidLength)
        );
    }

    #[test]
    fn flipped_payload_bit_fails_validation() {
        let frame = build(
            Header {
                packet_type: PacketType::Data,
                ..Header::default()
            },
            b"HELLO",
        )
        .unwrap();
        let mut body = frame[4..].to_vec();
        body[2] ^= 0x01;
        assert_eq!(validate(&body), Err(FrameError::ChecksumMismatch));
    }

    #[test]
    fn short_body_is_rejected() {
        assert_eq!(validate(&[0x01, 0x02]), Err(FrameError::TooShort));
    }

    #[test]
    fn status_wire_mapping() {
        assert_eq!(AmdtpStatus::from_wire(0), AmdtpStatus::Success);
        assert_eq!(AmdtpStatus::from_wire(1), AmdtpStatus::CrcError);
        assert_eq!(AmdtpStatus::from_wire(8), AmdtpStatus::ResendReply);
        assert_eq!(AmdtpStatus::from_wire(200), AmdtpStatus::UnknownError);
    }

    #[test]
    fn control_wire_mapping() {
        assert_eq!(
            AmdtpControl::from_wire(0),
            Some(AmdtpControl::ResendRequest)
        );
        assert_eq!(AmdtpControl::from_wire(1), None);
    }

    #[test]
    fn unknown_packet_type_bits() {
        assert_eq!(PacketType::from_bits(0), PacketType::Unknown);
        assert_eq!(PacketType::from_bits(7), PacketType::Unknown);
    }
}
