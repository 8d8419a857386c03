//! CRC-32 used by the primary feed.
//!
//! This is the reflected ISO-HDLC variant (polynomial 0xEDB88320, initial
//! value and final XOR 0xFFFFFFFF), the same one used by Ethernet and zlib.

/// Compute the CRC-32 checksum of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
