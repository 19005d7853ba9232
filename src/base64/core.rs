use std::io::{self, Read, Write};

use crate::common::io::read_retrying;

/// RFC 4648 standard alphabet, indexed by 6-bit value.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Padding symbol for incomplete trailing groups.
pub const PAD: u8 = b'=';

/// Default read block: 4KB, matching a typical pipe read.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Smallest block that can still make progress with two leftover bytes carried.
pub const MIN_BLOCK_SIZE: usize = 3;

/// Largest accepted block: 256MB of input plus 4/3 of that for symbols.
pub const MAX_BLOCK_SIZE: usize = 256 * 1024 * 1024;

/// Errors that abort an encoding session.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to read input")]
    Read(#[source] io::Error),

    #[error("failed to write output")]
    Write(#[source] io::Error),

    #[error(
        "invalid block size {size} (must be between {min} and {max})",
        min = MIN_BLOCK_SIZE,
        max = MAX_BLOCK_SIZE
    )]
    BlockSize { size: usize },

    #[error("cannot allocate buffers for block size {size}")]
    Alloc { size: usize },
}

impl EncodeError {
    /// The underlying I/O failure, if this error came from the reader or writer.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            EncodeError::Read(e) | EncodeError::Write(e) => Some(e),
            EncodeError::BlockSize { .. } | EncodeError::Alloc { .. } => None,
        }
    }
}

/// Byte counts for one completed session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Length of the padded encoding of `n` input bytes.
#[inline]
pub fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

/// Encode one full 3-byte group into 4 symbols.
#[inline]
pub fn encode_group(group: &[u8; 3]) -> [u8; 4] {
    let [b1, b2, b3] = *group;
    [
        ALPHABET[((b1 >> 2) & 0x3f) as usize],
        ALPHABET[(((b1 << 4) & 0x30) | ((b2 >> 4) & 0x0f)) as usize],
        ALPHABET[(((b2 << 2) & 0x3c) | ((b3 >> 6) & 0x03)) as usize],
        ALPHABET[(b3 & 0x3f) as usize],
    ]
}

/// Encode the final 1 or 2 leftover bytes with `=` padding.
///
/// Any other length means the caller's group arithmetic is broken.
#[inline]
pub fn encode_tail(tail: &[u8]) -> [u8; 4] {
    match tail {
        &[b1] => [
            ALPHABET[((b1 >> 2) & 0x3f) as usize],
            ALPHABET[((b1 << 4) & 0x30) as usize],
            PAD,
            PAD,
        ],
        &[b1, b2] => [
            ALPHABET[((b1 >> 2) & 0x3f) as usize],
            ALPHABET[(((b1 << 4) & 0x30) | ((b2 >> 4) & 0x0f)) as usize],
            ALPHABET[((b2 << 2) & 0x3c) as usize],
            PAD,
        ],
        _ => unreachable!("leftover count must be 1 or 2, got {}", tail.len()),
    }
}

/// Encode all complete groups of `input` into `out`.
/// Returns the number of output bytes written; `out` must hold `input.len() / 3 * 4`.
#[inline]
fn encode_groups(input: &[u8], out: &mut [u8]) -> usize {
    let mut wp = 0;
    for chunk in input.chunks_exact(3) {
        out[wp..wp + 4].copy_from_slice(&encode_group(&[chunk[0], chunk[1], chunk[2]]));
        wp += 4;
    }
    wp
}

/// Encode a complete in-memory buffer, padding included.
pub fn encode_to_vec(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; encoded_len(data.len())];
    let full = data.len() - data.len() % 3;
    let wp = encode_groups(&data[..full], &mut out);
    if full < data.len() {
        out[wp..wp + 4].copy_from_slice(&encode_tail(&data[full..]));
    }
    out
}

/// Allocate a zero-filled buffer, reporting allocation failure instead of aborting.
fn zeroed_buffer(len: usize) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| EncodeError::Alloc { size: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Chunked base64 encoder with reusable input and output buffers.
///
/// Each call to [`StreamEncoder::encode`] is one session: it reads the source
/// block by block, writes the symbols for every complete group once per
/// refill, carries the 0-2 leftover bytes to the front of the input buffer,
/// and pads the final partial group at end of stream.
pub struct StreamEncoder {
    input: Vec<u8>,
    output: Vec<u8>,
    rem: usize,
}

impl StreamEncoder {
    pub fn new(block_size: usize) -> Result<Self, EncodeError> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(EncodeError::BlockSize { size: block_size });
        }
        let output_size = (block_size / 3)
            .checked_mul(4)
            .ok_or(EncodeError::BlockSize { size: block_size })?;
        Ok(StreamEncoder {
            input: zeroed_buffer(block_size)?,
            output: zeroed_buffer(output_size)?,
            rem: 0,
        })
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.input.len()
    }

    /// Run one encoding session from `reader` to `writer`, then flush `writer`.
    pub fn encode(
        &mut self,
        reader: &mut impl Read,
        writer: &mut impl Write,
    ) -> Result<EncodeSummary, EncodeError> {
        let mut summary = EncodeSummary::default();
        self.rem = 0;
        log::debug!("encode session start: block size {}", self.block_size());

        loop {
            let n = read_retrying(reader, &mut self.input[self.rem..])
                .map_err(EncodeError::Read)?;
            if n == 0 {
                break;
            }
            summary.bytes_in += n as u64;

            let avail = self.rem + n;
            let full = avail - avail % 3;
            let wp = encode_groups(&self.input[..full], &mut self.output);
            writer
                .write_all(&self.output[..wp])
                .map_err(EncodeError::Write)?;
            summary.bytes_out += wp as u64;

            self.rem = avail - full;
            self.input.copy_within(full..avail, 0);
            log::trace!(
                "refill: read {} bytes, wrote {} symbols, {} left over",
                n,
                wp,
                self.rem
            );
        }

        if self.rem != 0 {
            let tail = encode_tail(&self.input[..self.rem]);
            writer.write_all(&tail).map_err(EncodeError::Write)?;
            summary.bytes_out += tail.len() as u64;
        }
        writer.flush().map_err(EncodeError::Write)?;

        log::debug!(
            "encode session done: {} bytes in, {} bytes out, tail {}",
            summary.bytes_in,
            summary.bytes_out,
            self.rem
        );
        self.rem = 0;
        Ok(summary)
    }
}

/// Stream-encode `reader` into `writer` using a fresh encoder with `block_size` buffers.
pub fn encode_stream(
    reader: &mut impl Read,
    writer: &mut impl Write,
    block_size: usize,
) -> Result<EncodeSummary, EncodeError> {
    StreamEncoder::new(block_size)?.encode(reader, writer)
}
