//! Test fixtures utilities: load streamed bodies and re-chunk them
#![allow(dead_code)]

use std::io;

pub type ByteChunks = Vec<Result<Vec<u8>, io::Error>>;

pub fn fixture_bytes(path: &str) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("read fixture {path}: {e}"))
}

/// Split an `.sse` fixture into one chunk per event.
pub fn load_sse_fixture_as_chunks(path: &str) -> ByteChunks {
    let raw = String::from_utf8(fixture_bytes(path)).expect("utf-8 fixture");
    let normalized = raw.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(|chunk| chunk.trim_end_matches('\n'))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| Ok(format!("{chunk}\n\n").into_bytes()))
        .collect()
}

/// Cut `bytes` into pieces of at most `size` bytes, ignoring line and
/// character boundaries.
pub fn fixed_size_chunks(bytes: &[u8], size: usize) -> ByteChunks {
    bytes.chunks(size).map(|c| Ok(c.to_vec())).collect()
}

/// Two chunks split at `at`.
pub fn split_at(bytes: &[u8], at: usize) -> ByteChunks {
    let (left, right) = bytes.split_at(at);
    vec![Ok(left.to_vec()), Ok(right.to_vec())]
}
