//! CRC-32 checksum for frame integrity.
//!
//! The checksum covers the payload bytes only, not the length or header
//! fields. The algorithm is the reflected CRC-32 polynomial `0x04C11DB7`
//! seeded with `0xFFFFFFFF` and with no final XOR, so an empty payload
//! checksums to `0xFFFFFFFF`.

use crc::{Algorithm, Crc};

const CRC_32_AMDTP: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0xffff_ffff,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x340b_c6d9,
    residue: 0x0000_0000,
};

const AMDTP_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_AMDTP);

/// Computes the payload checksum appended to every frame.
pub(crate) fn checksum(payload: &[u8]) -> u32 {
    AMDTP_CRC.checksum(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_seed() {
        assert_eq!(checksum(&[]), 0xffff_ffff);
    }

    #[test]
    fn single_byte_vector() {
        // Complement of the CRC-32/ISO-HDLC value for [0x01].
        assert_eq!(checksum(&[0x01]), 0x5afa_20e4);
    }

    #[test]
    fn check_string_vector() {
        assert_eq!(checksum(b"123456789"), 0x340b_c6d9);
    }

    #[test]
    fn deterministic() {
        let payload = [0u8, 1, 2, 3, 254, 255];
        assert_eq!(checksum(&payload), checksum(&payload));
    }
}
