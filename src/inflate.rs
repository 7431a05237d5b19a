//! Decompression of whole DEFLATE streams.
//!
//! There's no streaming support: all of the compressed data must be in one
//! slice, and all of the output goes into one buffer. If you don't know the
//! output size ahead of time you can run the decoder in "counting" mode first
//! to find out, then allocate once and run it again.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{
  block::{BlockDecoder, BlockType},
  error::InflateResult,
  sink::OutputSink,
};

/// Byte counts from a successful decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Inflated {
  /// Bytes written to the output (or counted, in counting mode).
  pub produced: usize,
  /// Bytes of compressed input used, including the partial final byte.
  pub consumed: usize,
}

/// Decompresses a complete DEFLATE stream into the sink given.
///
/// Blocks are decoded until the one marked final is done. Any bytes after the
/// final block are left alone, and `consumed` tells you where they start.
///
/// ## Failure
/// On error nothing about the partial progress is reported. Either error can
/// be "fixed" by the caller:
/// * `InputExhausted`: the stream was cut short.
/// * `OutputExhausted`: the sink's buffer was too small.
///
/// All other errors mean the data is corrupt.
pub fn inflate(compressed: &[u8], sink: OutputSink<'_>) -> InflateResult<Inflated> {
  let mut decoder = BlockDecoder::new(compressed, sink);
  loop {
    let is_final = decoder.bits.take_bits(1)? == 1;
    let block_type = BlockType::try_from(decoder.bits.take_bits(2)?)?;
    decoder.decode_block(block_type)?;
    if is_final {
      break;
    }
  }
  let out = Inflated { produced: decoder.out.produced(), consumed: decoder.bits.bytes_consumed() };
  log::trace!("inflated {} bytes into {} bytes", out.consumed, out.produced);
  Ok(out)
}

/// Finds the decompressed size of the stream without writing anything.
#[inline]
pub fn inflate_size(compressed: &[u8]) -> InflateResult<Inflated> {
  inflate(compressed, OutputSink::counting())
}

/// Decompresses into `out`, which must be big enough for all of the output.
#[inline]
pub fn inflate_to_slice(compressed: &[u8], out: &mut [u8]) -> InflateResult<Inflated> {
  inflate(compressed, OutputSink::bounded(out))
}

/// Decompresses into a new `Vec`.
///
/// * With `size_hint` of `None` the stream is decoded twice: once to count
///   the exact output size, then again into an allocation of that size.
/// * With `Some(n)` the stream is decoded once into `n` bytes of space. Too
///   small a hint gives `OutputExhausted`.
///
/// The output is truncated to the bytes produced, and the number of input
/// bytes consumed is returned alongside it.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn inflate_to_vec(
  compressed: &[u8], size_hint: Option<usize>,
) -> InflateResult<(Vec<u8>, usize)> {
  let capacity = match size_hint {
    Some(n) => n,
    None => inflate_size(compressed)?.produced,
  };
  let mut out = alloc::vec![0_u8; capacity];
  let Inflated { produced, consumed } = inflate_to_slice(compressed, &mut out)?;
  out.truncate(produced);
  Ok((out, consumed))
}

#[cfg(test)]
use crate::error::InflateError;

#[test]
fn test_inflate_stored_block() {
  let data = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'A', b'B', b'C'];
  let mut buf = [0_u8; 3];
  let got = inflate_to_slice(&data, &mut buf).unwrap();
  assert_eq!(got, Inflated { produced: 3, consumed: 8 });
  assert_eq!(&buf, b"ABC");
  // one byte short of output space
  let mut buf = [0_u8; 2];
  assert_eq!(inflate_to_slice(&data, &mut buf), Err(InflateError::OutputExhausted));
  // one byte short of input
  assert_eq!(inflate_size(&data[..7]), Err(InflateError::InputExhausted));
  // NLEN doesn't match
  let bad = [0x01, 0x03, 0x00, 0xFC, 0xFE, b'A', b'B', b'C'];
  assert_eq!(inflate_size(&bad), Err(InflateError::StoredLengthMismatch));
}

#[test]
fn test_inflate_fixed_block_with_overlap() {
  // BFINAL=1, BTYPE=01, literal 'A', length 10 (symbol 264), distance 1
  // (distance code 0), end of block. Huffman codes go msb first, the header
  // bits lsb first.
  let mut bits: u64 = 0;
  let mut n: u32 = 0;
  let mut push = |value: u64, count: u32| {
    bits |= value << n;
    n += count;
  };
  let reverse = |code: u64, count: u32| code.reverse_bits() >> (64 - count);
  push(1, 1);
  push(1, 2);
  push(reverse(0x30 + u64::from(b'A'), 8), 8);
  push(reverse(264 - 256, 7), 7);
  push(reverse(0, 5), 5);
  push(reverse(0, 7), 7);
  let byte_count = ((n + 7) / 8) as usize;
  let bytes = bits.to_le_bytes();
  let stream = &bytes[..byte_count];

  let mut buf = [0_u8; 11];
  let got = inflate_to_slice(stream, &mut buf).unwrap();
  assert_eq!(got, Inflated { produced: 11, consumed: byte_count });
  assert_eq!(&buf, b"AAAAAAAAAAA");
  assert_eq!(inflate_size(stream).unwrap().produced, 11);
}

#[test]
fn test_inflate_distance_too_far() {
  // BFINAL=1, BTYPE=01, then length 3 right away with nothing behind it.
  let mut bits: u32 = 0b011;
  // symbol 257 is the 7 bit code 0000001, reversed gives 1000000
  bits |= 0b100_0000 << 3;
  let bytes = bits.to_le_bytes();
  assert_eq!(inflate_size(&bytes), Err(InflateError::DistanceTooFar));
}

#[test]
fn test_inflate_bad_block_type() {
  // BFINAL=1, BTYPE=11
  assert_eq!(inflate_size(&[0b111]), Err(InflateError::InvalidBlockType));
  assert_eq!(inflate_size(&[]), Err(InflateError::InputExhausted));
}

#[test]
#[cfg(feature = "alloc")]
fn test_inflate_to_vec_with_and_without_hint() {
  let data = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'A', b'B', b'C', 0xEE];
  let (v, used) = inflate_to_vec(&data, None).unwrap();
  assert_eq!(v, b"ABC");
  assert_eq!(used, 8);
  let (v, _) = inflate_to_vec(&data, Some(100)).unwrap();
  assert_eq!(v, b"ABC");
  assert_eq!(inflate_to_vec(&data, Some(1)), Err(InflateError::OutputExhausted));
}
