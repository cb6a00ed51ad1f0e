//! # amdtp
//!
//! A portable, no_std Rust implementation of AMDTP, a lightweight reliable
//! message-transfer protocol for BLE GATT links whose characteristics are
//! MTU-limited, unreliable and cannot carry a literal zero byte.
//!
//! This crate implements the protocol core in pure software using:
//! - a [`Transport`](transport::Transport) trait seam for the host GATT
//!   layer (two characteristics: one for DATA, one for ACK/CONTROL)
//! - CRC-32 payload validation and zero-byte escape stuffing on every frame
//! - a stop-and-wait state machine with 4-bit sequence numbers and
//!   ACK-driven retransmission
//! - interrupt-safe shared access with `critical-section`
//!
//! ## Crate features
//! | Feature                    | Description |
//! |----------------------------|-------------|
//! | `std`                      | Disables `#![no_std]` support for hosted targets and tests |
//! | `shared-driver` (default)  | Global driver cell guarded by `critical_section::with` |
//! | `defmt-0-3`                | Uses `defmt` logging |
//! | `log`                      | Uses `log` logging |
//!
//! ## Protocol
//!
//! Every message travels as one frame: a little-endian length, a bit-packed
//! 16-bit header (packet type, sequence number, two flag bits) and the
//! payload, closed by a CRC-32 over the payload. The frame is then escaped
//! so no `0x00` reaches the wire and written out in chunks of `MTU - 3`
//! bytes. The receiver accumulates chunks per channel, validates the
//! checksum and answers every DATA frame with an ACK; `CrcError` and
//! `ResendReply` statuses make the sender retransmit the retained frame
//! byte-for-byte. One DATA frame is outstanding at a time.
//!
//! ## Usage
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
//!
//! // Outbound: frame, escape and fragment one message.
//! driver.send_message(b"HELLO")?;
//!
//! // Inbound: push each notification's bytes from the GATT callback.
//! // driver.receive(Channel::Data, chunk)?;
//! # Ok::<(), amdtp::error::AmdtpError<core::convert::Infallible>>(())
//! ```
//!
//! ## Integration Notes
//!
//! - All entry points must run on one logical thread; use the
//!   [`shared`] module when notifications arrive in interrupt context.
//! - There is no internal timeout: a lost ACK leaves the driver busy until
//!   the host resets it on disconnect.
//! - The encryption and ack-enabled header bits are carried on the wire but
//!   never enforced; peers interoperate regardless of their setting.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded
//! environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "shared-driver")]
pub use critical_section;

pub use heapless;

pub mod consts;
pub(crate) mod crc;
pub mod driver;
pub mod error;
pub mod frame;
pub(crate) mod macros;
pub mod reassembly;
#[cfg(feature = "shared-driver")]
pub mod shared;
pub mod stuffing;
pub mod transport;
