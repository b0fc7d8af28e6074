// src/db/chunking.rs
// DOCUMENTATION: Payload chunking and validated reassembly
// PURPOSE: Shared by every blob store engine so chunk rules live in one place

use crate::errors::StoreError;
use crate::models::Photo;

/// Default chunk size (255 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// One stored piece of a payload
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Zero-based sequence number within the parent photo
    pub n: u32,
    pub data: Vec<u8>,
}

/// Split a payload into equal-size chunks (the last one may be shorter)
pub fn split_payload(payload: &[u8], chunk_size: usize) -> Vec<Chunk> {
    payload
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(n, data)| Chunk {
            n: n as u32,
            data: data.to_vec(),
        })
        .collect()
}

/// Number of chunks a payload of `length` bytes occupies
pub fn expected_chunk_count(length: u64, chunk_size: usize) -> u64 {
    let chunk_size = chunk_size.max(1) as u64;
    (length + chunk_size - 1) / chunk_size
}

/// Rebuild a payload from chunks in retrieval order
/// DOCUMENTATION: Chunks must arrive as n = 0, 1, 2, ... with full-size
/// chunks everywhere but the tail. Any gap, duplicate, reordering, size
/// mismatch or extra chunk is reported as CorruptBlob; a partial payload
/// is never returned.
pub fn reassemble<I>(photo: &Photo, chunks: I) -> Result<Vec<u8>, StoreError>
where
    I: IntoIterator<Item = Chunk>,
{
    let expected = expected_chunk_count(photo.length, photo.chunk_size);
    let corrupt = |reason: String| StoreError::CorruptBlob {
        id: photo.id.to_string(),
        reason,
    };

    let mut payload = Vec::with_capacity(photo.length as usize);
    let mut seen: u64 = 0;

    for chunk in chunks {
        if seen >= expected {
            return Err(corrupt(format!(
                "unexpected chunk {} beyond expected count {}",
                chunk.n, expected
            )));
        }

        if u64::from(chunk.n) != seen {
            return Err(corrupt(format!(
                "chunk {} found where chunk {} was expected",
                chunk.n, seen
            )));
        }

        let expected_len = if seen + 1 == expected {
            photo.length - seen * photo.chunk_size as u64
        } else {
            photo.chunk_size as u64
        };

        if chunk.data.len() as u64 != expected_len {
            return Err(corrupt(format!(
                "chunk {} has {} bytes, expected {}",
                chunk.n,
                chunk.data.len(),
                expected_len
            )));
        }

        payload.extend_from_slice(&chunk.data);
        seen += 1;
    }

    if seen != expected {
        return Err(corrupt(format!(
            "missing chunk {} of {}",
            seen, expected
        )));
    }

    Ok(payload)
}
