//! The destinations that decompressed bytes can be written to.

use crate::error::{InflateError, InflateResult};

/// Where decompressed bytes go.
///
/// * `Bounded` writes into a caller-provided buffer, and decompression fails
///   with `OutputExhausted` if the buffer fills up.
/// * `Counting` writes nothing and only counts. This lets you find out the
///   exact decompressed size before you allocate anything.
#[derive(Debug)]
pub enum OutputSink<'o> {
  /// Write into `buf`, with `len` bytes written so far.
  Bounded {
    /// the output buffer
    buf: &'o mut [u8],
    /// bytes written so far
    len: usize,
  },
  /// Only count the output.
  Counting {
    /// bytes produced so far
    len: usize,
  },
}
impl<'o> OutputSink<'o> {
  /// A sink that fills `buf` from the start.
  #[inline]
  #[must_use]
  pub fn bounded(buf: &'o mut [u8]) -> Self {
    Self::Bounded { buf, len: 0 }
  }

  /// A sink that only counts.
  #[inline]
  #[must_use]
  pub const fn counting() -> Self {
    Self::Counting { len: 0 }
  }

  /// The number of bytes produced so far.
  #[inline]
  #[must_use]
  pub const fn produced(&self) -> usize {
    match self {
      Self::Bounded { len, .. } | Self::Counting { len } => *len,
    }
  }

  /// If this sink is just counting bytes.
  #[inline]
  #[must_use]
  pub const fn is_counting(&self) -> bool {
    matches!(self, Self::Counting { .. })
  }

  #[inline]
  pub(crate) fn push_byte(&mut self, byte: u8) -> InflateResult<()> {
    match self {
      Self::Bounded { buf, len } => {
        let slot = buf.get_mut(*len).ok_or(InflateError::OutputExhausted)?;
        *slot = byte;
        *len += 1;
      }
      Self::Counting { len } => *len += 1,
    }
    Ok(())
  }

  #[inline]
  pub(crate) fn push_slice(&mut self, bytes: &[u8]) -> InflateResult<()> {
    match self {
      Self::Bounded { buf, len } => {
        let end = len.checked_add(bytes.len()).ok_or(InflateError::OutputExhausted)?;
        buf.get_mut(*len..end).ok_or(InflateError::OutputExhausted)?.copy_from_slice(bytes);
        *len = end;
      }
      Self::Counting { len } => *len += bytes.len(),
    }
    Ok(())
  }

  /// Copies `length` bytes starting `distance` bytes back from the end.
  ///
  /// The copy goes forward one byte at a time, so when `length > distance` the
  /// bytes written early in the copy get read again later in the same copy.
  /// That's how DEFLATE encodes runs (distance 1, length 258 repeats the last
  /// byte 258 times), so a `copy_within` style block copy would be wrong here.
  #[inline]
  pub(crate) fn copy_back(&mut self, distance: usize, length: usize) -> InflateResult<()> {
    if distance == 0 || distance > self.produced() {
      return Err(InflateError::DistanceTooFar);
    }
    match self {
      Self::Bounded { buf, len } => {
        let end = len.checked_add(length).ok_or(InflateError::OutputExhausted)?;
        if end > buf.len() {
          return Err(InflateError::OutputExhausted);
        }
        for i in *len..end {
          buf[i] = buf[i - distance];
        }
        *len = end;
      }
      Self::Counting { len } => *len += length,
    }
    Ok(())
  }
}

#[test]
fn test_copy_back_overlaps() {
  let mut buf = [0_u8; 12];
  let mut sink = OutputSink::bounded(&mut buf);
  sink.push_slice(b"xA").unwrap();
  sink.copy_back(1, 10).unwrap();
  assert_eq!(sink.produced(), 12);
  assert_eq!(&buf, b"xAAAAAAAAAAA");
}

#[test]
fn test_copy_back_repeats_pattern() {
  let mut buf = [0_u8; 12];
  let mut sink = OutputSink::bounded(&mut buf);
  sink.push_slice(b"abcd").unwrap();
  sink.copy_back(4, 8).unwrap();
  assert_eq!(&buf, b"abcdabcdabcd");
}

#[test]
fn test_copy_back_too_far() {
  let mut buf = [0_u8; 8];
  let mut sink = OutputSink::bounded(&mut buf);
  sink.push_byte(1).unwrap();
  assert_eq!(sink.copy_back(2, 3), Err(InflateError::DistanceTooFar));
  let mut sink = OutputSink::counting();
  assert_eq!(sink.copy_back(1, 3), Err(InflateError::DistanceTooFar));
}

#[test]
fn test_bounded_exhaustion() {
  let mut buf = [0_u8; 2];
  let mut sink = OutputSink::bounded(&mut buf);
  sink.push_byte(7).unwrap();
  assert_eq!(sink.copy_back(1, 2), Err(InflateError::OutputExhausted));
  assert_eq!(sink.push_slice(&[1, 2]), Err(InflateError::OutputExhausted));
  sink.push_byte(8).unwrap();
  assert_eq!(sink.push_byte(9), Err(InflateError::OutputExhausted));
  assert_eq!(sink.produced(), 2);
}

#[test]
fn test_counting_counts() {
  let mut sink = OutputSink::counting();
  assert!(sink.is_counting());
  sink.push_byte(0).unwrap();
  sink.push_slice(&[0; 300]).unwrap();
  sink.copy_back(1, 258).unwrap();
  assert_eq!(sink.produced(), 559);
}
