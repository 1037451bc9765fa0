//! Low-level binary helpers for fixed-size archive structures.

use std::io::{self, Read};

use crate::{Error, Result};

/// Reads exactly `N` bytes, reporting a short read as a corrupt structure.
///
/// `offset` is the absolute position of the structure and `what` names it
/// for the error message.
pub fn read_block<R: Read + ?Sized, const N: usize>(
    r: &mut R,
    offset: u64,
    what: &str,
) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    match r.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(Error::corrupt_header(offset, format!("truncated {}", what)))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Reads up to `buf.len()` bytes, stopping early only at end of input.
///
/// Returns the number of bytes read. A zero-byte read ends the loop, so a
/// short count means the input was exhausted.
pub fn read_up_to<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decodes a little-endian `u32` at `at`.
#[inline]
pub fn le_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

/// Decodes a little-endian `u64` at `at`.
#[inline]
pub fn le_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

/// Encodes a little-endian `u32` at `at`.
#[inline]
pub fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Encodes a little-endian `u64` at `at`.
#[inline]
pub fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}
