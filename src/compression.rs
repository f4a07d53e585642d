//! Streaming gzip compression for outgoing bodies.
//!
//! The wrapper pipes an outgoing body through a [`flate2`] gzip encoder
//! chunk-by-chunk on its way to the transport. Only one chunk and the
//! encoder's internal state are buffered at a time, never the full payload.
//! The encoder is finalized before the stream terminates, so the destination
//! always sees a complete, valid gzip stream; any read, compress, or finish
//! error terminates the stream as a body-write failure and no partial output
//! is treated as valid.

use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures_util::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read chunk size for the compression loop.
const CHUNK_SIZE: usize = 8192;

struct GzipState<R> {
    reader: R,
    /// `None` once the stream has finished or failed.
    encoder: Option<GzEncoder<Vec<u8>>>,
    buf: Vec<u8>,
}

/// Compress everything read from `reader` into a stream of gzip-encoded
/// chunks.
///
/// The final chunk carries whatever the encoder buffered plus the gzip
/// trailer, produced by closing the encoder. After an error item the stream
/// terminates; consumers must treat the output as unusable on that path.
pub fn gzip_stream<R>(reader: R) -> impl Stream<Item = std::io::Result<Bytes>> + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let state = GzipState {
        reader,
        encoder: Some(GzEncoder::new(Vec::new(), Compression::default())),
        buf: vec![0u8; CHUNK_SIZE],
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if state.encoder.is_none() {
                return None;
            }
            match state.reader.read(&mut state.buf).await {
                Ok(0) => {
                    // Source exhausted: close the encoder and emit the
                    // remaining buffered output plus the gzip trailer.
                    let finished = match state.encoder.take() {
                        Some(encoder) => encoder.finish(),
                        None => return None,
                    };
                    return match finished {
                        Ok(tail) => Some((Ok(Bytes::from(tail)), state)),
                        Err(e) => Some((Err(e), state)),
                    };
                }
                Ok(n) => {
                    let encoder = match state.encoder.as_mut() {
                        Some(encoder) => encoder,
                        None => return None,
                    };
                    if let Err(e) = encoder.write_all(&state.buf[..n]) {
                        state.encoder = None;
                        return Some((Err(e), state));
                    }
                    let out = encoder.get_mut();
                    if !out.is_empty() {
                        let chunk = Bytes::from(std::mem::take(out));
                        return Some((Ok(chunk), state));
                    }
                    // Encoder absorbed the chunk without output; keep reading.
                }
                Err(e) => {
                    state.encoder = None;
                    return Some((Err(e), state));
                }
            }
        }
    })
}

/// Check if data is gzip compressed (magic bytes check).
#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Decompress a complete gzip payload.
///
/// Used by callers (and tests) to verify or unwrap compressed payloads; the
/// hot path only ever compresses.
pub fn decompress_gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use std::io::Read;
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
