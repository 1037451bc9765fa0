//! Record id generation.
//!
//! An id packs the low 32 bits of the current Unix time in milliseconds
//! into its high half, and the CRC-32 of the display name XORed with 32
//! random bits into its low half. Uniqueness is probabilistic, so the
//! generator retries with fresh random bits while the id is already taken
//! in the archive.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::checksum::crc32;
use crate::name::EntryName;

/// Combines the id components.
#[inline]
pub fn compose_id(timestamp_ms: u64, name_crc: u32, random: u32) -> u64 {
    (timestamp_ms << 32) | u64::from(name_crc ^ random)
}

/// Generates an id for `name` that `is_taken` does not report as used.
pub fn generate_id(name: &EntryName, is_taken: impl Fn(u64) -> bool) -> u64 {
    let name_crc = crc32(name.as_str().as_bytes());
    loop {
        let id = compose_id(now_ms(), name_crc, rand::random::<u32>());
        if !is_taken(id) {
            return id;
        }
        log::debug!("id {} already in use, retrying", id);
    }
}

fn now_ms() -> u64 {
    // A clock before the epoch only costs the time component.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
