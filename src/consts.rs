//! Constants used across the AMDTP protocol implementation.
//!
//! This module defines the wire-format sizes, header bit layout, ATT MTU
//! defaults and escape bytes shared by the frame codec, the reassembly
//! buffers and the driver.
//!
//! ## Key Concepts
//!
//! - **Frame prefix**: every frame starts with a 2-byte length followed by a
//!   2-byte bit-packed header.
//! - **Payload limit**: a single message carries at most 512 bytes of
//!   application data; the CRC-32 trailer adds 4 more.
//! - **Header bits**: packet type, sequence number and two flag bits are
//!   packed into the 16-bit header field.
//! - **Escaping**: the transport cannot carry a literal `0x00`, so framed
//!   bytes are stuffed with a two-byte escape sequence before transmission.
//!
//! These values should be used wherever framing or buffer logic is
//! implemented to ensure consistent message boundaries.

/// Maximum number of application payload bytes in a single message.
pub const AMDTP_MAX_PAYLOAD_SIZE: u16 = 512;

/// See [`AMDTP_MAX_PAYLOAD_SIZE`].
pub const AMDTP_MAX_PAYLOAD_SIZE_USIZE: usize = AMDTP_MAX_PAYLOAD_SIZE as usize;

/// Size (in bytes) of the length field at the start of every frame.
pub const AMDTP_LENGTH_SIZE_IN_PKT: u16 = 2;

/// Size (in bytes) of the bit-packed header field following the length.
pub const AMDTP_HEADER_SIZE_IN_PKT: u16 = 2;

/// Size (in bytes) of the CRC-32 trailer appended after the payload.
pub const AMDTP_CRC_SIZE_IN_PKT: u16 = 4;

/// See [`AMDTP_CRC_SIZE_IN_PKT`].
pub const AMDTP_CRC_SIZE_IN_PKT_USIZE: usize = AMDTP_CRC_SIZE_IN_PKT as usize;

/// Combined size of the length and header fields, i.e. the bytes a receiver
/// must see before it knows how long the rest of the message is.
pub const AMDTP_PREFIX_SIZE_IN_PKT: u16 = AMDTP_LENGTH_SIZE_IN_PKT + AMDTP_HEADER_SIZE_IN_PKT;

/// See [`AMDTP_PREFIX_SIZE_IN_PKT`].
pub const AMDTP_PREFIX_SIZE_IN_PKT_USIZE: usize = AMDTP_PREFIX_SIZE_IN_PKT as usize;

/// Maximum size of the body a reassembly buffer accumulates per message:
/// payload plus CRC trailer. This equals the largest valid value of the
/// frame's length field.
pub const AMDTP_MAX_BODY_SIZE: u16 = AMDTP_MAX_PAYLOAD_SIZE + AMDTP_CRC_SIZE_IN_PKT;

/// See [`AMDTP_MAX_BODY_SIZE`].
pub const AMDTP_MAX_BODY_SIZE_USIZE: usize = AMDTP_MAX_BODY_SIZE as usize;

/// Maximum total size of an unescaped frame:
/// length + header + payload + CRC.
pub const AMDTP_PACKET_SIZE: u16 =
    AMDTP_MAX_PAYLOAD_SIZE + AMDTP_PREFIX_SIZE_IN_PKT + AMDTP_CRC_SIZE_IN_PKT;

/// See [`AMDTP_PACKET_SIZE`].
pub const AMDTP_PACKET_SIZE_USIZE: usize = AMDTP_PACKET_SIZE as usize;

/// Maximum size of an escaped frame. Stuffing replaces each `0x00` with two
/// bytes, so the worst case doubles the frame.
pub const AMDTP_STUFFED_PACKET_SIZE: u16 = AMDTP_PACKET_SIZE * 2;

/// See [`AMDTP_STUFFED_PACKET_SIZE`].
pub const AMDTP_STUFFED_PACKET_SIZE_USIZE: usize = AMDTP_STUFFED_PACKET_SIZE as usize;

/// Bit offset of the 4-bit packet type inside the header field.
pub const PACKET_TYPE_BIT_OFFSET: u16 = 12;

/// Bitmask for the packet type.
pub const PACKET_TYPE_BIT_MASK: u16 = 0xf << PACKET_TYPE_BIT_OFFSET;

/// Bit offset of the 4-bit sequence number inside the header field.
pub const PACKET_SN_BIT_OFFSET: u16 = 8;

/// Bitmask for the sequence number.
pub const PACKET_SN_BIT_MASK: u16 = 0xf << PACKET_SN_BIT_OFFSET;

/// Bit offset of the encryption flag. Defined on the wire, never enforced.
pub const PACKET_ENCRYPTION_BIT_OFFSET: u16 = 7;

/// Bitmask for the encryption flag.
pub const PACKET_ENCRYPTION_BIT_MASK: u16 = 0x1 << PACKET_ENCRYPTION_BIT_OFFSET;

/// Bit offset of the ack-enabled flag. Defined on the wire, never consulted
/// by the state machine.
pub const PACKET_ACK_BIT_OFFSET: u16 = 6;

/// Bitmask for the ack-enabled flag.
pub const PACKET_ACK_BIT_MASK: u16 = 0x1 << PACKET_ACK_BIT_OFFSET;

/// Number of distinct sequence numbers. The 4-bit counter wraps from 15
/// back to 0.
pub const PACKET_SN_MODULO: u8 = 16;

/// Default value of ATT_MTU before any exchange has been negotiated.
pub const ATT_DEFAULT_MTU: u16 = 23;

/// Number of bytes the ATT envelope consumes out of each MTU-sized write.
pub const ATT_ENVELOPE_SIZE: u16 = 3;

/// See [`ATT_ENVELOPE_SIZE`].
pub const ATT_ENVELOPE_SIZE_USIZE: usize = ATT_ENVELOPE_SIZE as usize;

/// Default maximum payload length of a single ATT PDU (default MTU minus the
/// envelope). Also the capacity of the scratch buffer used for ACK and
/// CONTROL payloads.
pub const ATT_DEFAULT_PAYLOAD_LEN: u16 = ATT_DEFAULT_MTU - ATT_ENVELOPE_SIZE;

/// See [`ATT_DEFAULT_PAYLOAD_LEN`].
pub const ATT_DEFAULT_PAYLOAD_LEN_USIZE: usize = ATT_DEFAULT_PAYLOAD_LEN as usize;

/// First byte of the two-byte sequence substituted for a literal `0x00`.
pub const ESCAPE_PREFIX: u8 = 0x7e;

/// Second byte of the two-byte sequence substituted for a literal `0x00`.
pub const ESCAPE_SUBSTITUTE: u8 = 0x20;

/// Capacity of the DATA channel reassembly accumulator: one maximum-sized
/// frame plus spill-over bytes belonging to the next frame.
pub const DATA_REASSEMBLY_CAP: usize = AMDTP_PACKET_SIZE_USIZE * 2;

/// Capacity of the ACK/CONTROL channel reassembly accumulator. ACK frames
/// are small; anything larger than this is a protocol violation.
pub const ACK_REASSEMBLY_CAP: usize = 128;
