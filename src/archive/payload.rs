//! Chunked payload I/O.
//!
//! Payloads are never read or written in one piece: every copy loops over
//! bounded chunks, and a zero-byte read before the recorded size ends the
//! loop early. Callers turn that short count into
//! [`Error::TruncatedRecord`].

use std::io::{self, Read, Write};
use std::path::Path;

use crate::checksum::{Checksum, Crc32};
use crate::crypto::Cipher;
use crate::format::reader::read_up_to;
use crate::format::record::RecordHeader;
use crate::{Error, Result};

/// Streams a payload from `src` to `out`, decrypting with `cipher`.
///
/// `src` must be positioned at the first payload byte. Returns the CRC-32
/// of the plaintext, or [`Error::TruncatedRecord`] if the input ends
/// before `header.data_size` bytes.
pub(crate) fn read_payload<R, W>(
    src: &mut R,
    header: &RecordHeader,
    cipher: Cipher<'_>,
    chunk_size: usize,
    out: &mut W,
) -> Result<u32>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_len(chunk_size, header.data_size)];
    let mut crc = Crc32::new();
    let mut keystream = cipher.begin();
    let mut remaining = header.data_size;

    while remaining > 0 {
        let want = chunk_len(buf.len(), remaining);
        let n = read_up_to(src, &mut buf[..want])?;
        if n == 0 {
            return Err(Error::TruncatedRecord {
                id: header.id,
                name: Some(header.name.to_string()),
                expected: header.data_size,
                actual: header.data_size - remaining,
            });
        }
        let chunk = &mut buf[..n];
        keystream.apply(chunk);
        crc.update(chunk);
        out.write_all(chunk)?;
        remaining -= n as u64;
    }

    Ok(crc.finalize())
}

/// Reads and decrypts a payload, checking it against the stored checksum.
pub(crate) fn verify_payload<R, W>(
    src: &mut R,
    header: &RecordHeader,
    cipher: Cipher<'_>,
    chunk_size: usize,
    out: &mut W,
) -> Result<()>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let actual = read_payload(src, header, cipher, chunk_size, out)?;
    if actual != header.checksum {
        return Err(Error::crc_mismatch(
            header.id,
            Some(header.name.to_string()),
            header.checksum,
            actual,
        ));
    }
    Ok(())
}

/// Writes plaintext `data` through `cipher`, one chunk at a time.
pub(crate) fn write_payload<W: Write + ?Sized>(
    dst: &mut W,
    data: &[u8],
    cipher: Cipher<'_>,
    chunk_size: usize,
) -> Result<()> {
    if !cipher.is_encrypted() {
        dst.write_all(data)?;
        return Ok(());
    }

    let mut keystream = cipher.begin();
    let mut buf = vec![0u8; chunk_len(chunk_size, data.len() as u64)];
    for piece in data.chunks(buf.len().max(1)) {
        let chunk = &mut buf[..piece.len()];
        chunk.copy_from_slice(piece);
        keystream.apply(chunk);
        dst.write_all(chunk)?;
    }
    Ok(())
}

/// Copies `len` stored bytes unchanged. Returns the number of bytes copied,
/// which is smaller than `len` only if `src` ran out.
pub(crate) fn copy_raw<R, W>(src: &mut R, dst: &mut W, len: u64, chunk_size: usize) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_len(chunk_size, len)];
    let mut copied = 0u64;
    while copied < len {
        let want = chunk_len(buf.len(), len - copied);
        let n = read_up_to(src, &mut buf[..want])?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

/// Reads a whole source file in bounded chunks.
pub(crate) fn read_source(path: &Path, chunk_size: usize) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut data = Vec::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(data)
}

/// Size of the next chunk: at most `chunk_size`, at most `remaining`.
#[inline]
fn chunk_len(chunk_size: usize, remaining: u64) -> usize {
    let chunk_size = chunk_size.max(1);
    usize::try_from(remaining).map_or(chunk_size, |r| r.min(chunk_size))
}
