//! Pulls bits out of a DEFLATE stream.
//!
//! DEFLATE packs data starting at the least significant bit of each byte, and
//! multi-bit fields (other than Huffman codes) are stored least significant
//! bit first. New bytes are put "on top" of whatever bits are left over, and
//! bits are taken off "the bottom".

use crate::error::{InflateError, InflateResult};

/// A read cursor over compressed bytes.
#[derive(Clone)]
pub struct BitReader<'b> {
  bytes: &'b [u8],
  position: usize,
  spare_bits: u32,
  spare_bit_count: u32,
}

impl core::fmt::Debug for BitReader<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("BitReader")
      .field("position", &self.position)
      .field("remaining", &(self.bytes.len() - self.position))
      .field("spare_bits", &format_args!("{:#b}", self.spare_bits))
      .field("spare_bit_count", &self.spare_bit_count)
      .finish()
  }
}

impl<'b> BitReader<'b> {
  /// Starts reading at the first bit of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, position: 0, spare_bits: 0, spare_bit_count: 0 }
  }

  /// How many input bytes have been pulled so far.
  ///
  /// A byte counts as soon as any of its bits have been used.
  #[inline]
  #[must_use]
  pub const fn bytes_consumed(&self) -> usize {
    self.position
  }

  /// Takes the next `count` bits, with the earliest bit in the lowest position.
  ///
  /// `count` must be 16 or less. Asking for 0 bits is fine and gives 0.
  ///
  /// ## Failure
  /// * `InputExhausted` if the input runs out first.
  #[inline]
  pub fn take_bits(&mut self, count: u32) -> InflateResult<u32> {
    debug_assert!(count <= 16);
    // the accumulator always has less than 8 bits between calls, so pulling
    // at most 2 more bytes tops out at 23 bits, well inside the u32.
    let mut acc = self.spare_bits;
    while self.spare_bit_count < count {
      let byte = *self.bytes.get(self.position).ok_or(InflateError::InputExhausted)?;
      self.position += 1;
      acc |= u32::from(byte) << self.spare_bit_count;
      self.spare_bit_count += 8;
    }
    self.spare_bits = acc >> count;
    self.spare_bit_count -= count;
    Ok(acc & ((1_u32 << count) - 1))
  }

  /// Throws away any leftover bits of the current byte.
  ///
  /// Stored blocks begin on a byte boundary, so this must be called after the
  /// stored block header is read. The discarded bits have no defined value.
  #[inline]
  pub fn align_to_byte(&mut self) {
    self.spare_bits = 0;
    self.spare_bit_count = 0;
  }

  /// Borrows the next `count` whole bytes.
  ///
  /// The reader must be byte aligned first.
  ///
  /// ## Failure
  /// * `InputExhausted` if there's not `count` bytes remaining. The cursor is
  ///   left as it was.
  #[inline]
  pub fn take_aligned_bytes(&mut self, count: usize) -> InflateResult<&'b [u8]> {
    debug_assert_eq!(self.spare_bit_count, 0);
    let end = self.position.checked_add(count).ok_or(InflateError::InputExhausted)?;
    let out = self.bytes.get(self.position..end).ok_or(InflateError::InputExhausted)?;
    self.position = end;
    Ok(out)
  }
}

#[test]
fn test_take_bits_is_lsb_first() {
  let mut br = BitReader::new(&[0b1010_1101, 0b0000_0011]);
  assert_eq!(br.take_bits(1), Ok(1));
  assert_eq!(br.take_bits(2), Ok(0b10));
  assert_eq!(br.bytes_consumed(), 1);
  // the last 5 bits of byte 0 followed by the 2 low bits of byte 1
  assert_eq!(br.take_bits(7), Ok(0b11_10101));
  assert_eq!(br.bytes_consumed(), 2);
  assert_eq!(br.take_bits(0), Ok(0));
  assert_eq!(br.take_bits(6), Ok(0));
  assert_eq!(br.take_bits(1), Err(InflateError::InputExhausted));
}

#[test]
fn test_take_bits_sixteen() {
  let mut br = BitReader::new(&[0xFF, 0x34, 0x12]);
  assert_eq!(br.take_bits(8), Ok(0xFF));
  assert_eq!(br.take_bits(16), Ok(0x1234));
  assert_eq!(br.bytes_consumed(), 3);
}

#[test]
fn test_align_then_take_bytes() {
  let mut br = BitReader::new(&[0b0000_0001, 3, 0, 0xFC, 0xFF, b'A']);
  assert_eq!(br.take_bits(3), Ok(1));
  br.align_to_byte();
  assert_eq!(br.take_aligned_bytes(4), Ok(&[3, 0, 0xFC, 0xFF][..]));
  assert_eq!(br.take_aligned_bytes(2), Err(InflateError::InputExhausted));
  assert_eq!(br.take_aligned_bytes(1), Ok(&[b'A'][..]));
  assert_eq!(br.bytes_consumed(), 6);
}
