use core::fmt::{Debug, Write};

/// The four byte type code of a chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl PngChunkType {
  /// Image Header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Image Data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image End
  pub const IEND: Self = Self(*b"IEND");

  /// If a decoder may skip this chunk when it doesn't know the type.
  ///
  /// That's bit 5 of the first byte, meaning a lowercase first letter.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & 0x20) != 0
  }
}
impl Debug for PngChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      f.write_char(if b.is_ascii_graphic() { b as char } else { '?' })?;
    }
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
///
/// The CRC is kept as it was declared, and never checked.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawPngChunk<'b> {
  /// chunk type
  pub type_: PngChunkType,
  /// chunk payload, without the length, type, or CRC
  pub data: &'b [u8],
  /// the CRC value stored after the payload
  pub declared_crc: u32,
}
impl Debug for RawPngChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Iteration stops at the end of the data, or at the first chunk that doesn't
/// fit in the data that's left. In that second case the unread bytes are still
/// available from [`remaining`](Self::remaining), so you can tell a clean end
/// apart from a truncated one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawPngChunkIter<'b>(&'b [u8]);
impl<'b> RawPngChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  ///
  /// The signature bytes are skipped without being checked.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }

  /// The bytes that haven't been turned into chunks yet.
  #[inline]
  #[must_use]
  pub const fn remaining(&self) -> &'b [u8] {
    self.0
  }
}
impl<'b> Iterator for RawPngChunkIter<'b> {
  type Item = RawPngChunk<'b>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    let (len_bytes, rest) = split_array::<4>(self.0)?;
    let (type_bytes, rest) = split_array::<4>(rest)?;
    let chunk_len = usize::try_from(u32::from_be_bytes(len_bytes)).ok()?;
    if rest.len() < chunk_len {
      return None;
    }
    let (data, rest) = rest.split_at(chunk_len);
    let (crc_bytes, rest) = split_array::<4>(rest)?;
    self.0 = rest;
    Some(RawPngChunk {
      type_: PngChunkType(type_bytes),
      data,
      declared_crc: u32::from_be_bytes(crc_bytes),
    })
  }
}

#[inline]
fn split_array<const N: usize>(bytes: &[u8]) -> Option<([u8; N], &[u8])> {
  if bytes.len() >= N {
    let (head, tail) = bytes.split_at(N);
    let a: [u8; N] = head.try_into().ok()?;
    Some((a, tail))
  } else {
    None
  }
}

#[test]
fn test_raw_chunk_iter_reads_chunks() {
  let mut png = alloc::vec::Vec::new();
  png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);
  png.extend_from_slice(&[0, 0, 0, 2]);
  png.extend_from_slice(b"teXt");
  png.extend_from_slice(&[1, 2]);
  png.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
  png.extend_from_slice(&[0, 0, 0, 0]);
  png.extend_from_slice(b"IEND");
  png.extend_from_slice(&[0, 0, 0, 0]);

  let mut it = RawPngChunkIter::new(&png);
  let text = it.next().unwrap();
  assert_eq!(text.type_, PngChunkType(*b"teXt"));
  assert!(text.type_.is_ancillary());
  assert_eq!(text.data, &[1, 2]);
  assert_eq!(text.declared_crc, 0xAABB_CCDD);
  let end = it.next().unwrap();
  assert_eq!(end.type_, PngChunkType::IEND);
  assert!(!end.type_.is_ancillary());
  assert!(it.next().is_none());
  assert!(it.remaining().is_empty());
}

#[test]
fn test_raw_chunk_iter_stops_on_truncation() {
  // declares 100 bytes of data but only has 3
  let png = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 100, b'I', b'D', b'A', b'T', 1, 2, 3];
  let mut it = RawPngChunkIter::new(&png);
  assert!(it.next().is_none());
  assert_eq!(it.remaining().len(), 11);
}
