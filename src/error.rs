//! Error types for decompression and for PNG decoding.

use core::{fmt, num::TryFromIntError};

/// Result alias for the inflate functions.
pub type InflateResult<T> = Result<T, InflateError>;

/// An error from decompressing a DEFLATE stream.
///
/// The first two variants are "retryable": the data might be fine, but the
/// call didn't have enough input or enough output space. Everything else means
/// the compressed data is not a valid DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InflateError {
  /// The compressed data ended before the final block did.
  InputExhausted,
  /// The output buffer was too small to hold everything.
  OutputExhausted,
  /// A block header used the reserved block type `0b11`.
  InvalidBlockType,
  /// A stored block's `LEN` didn't match the one's complement in `NLEN`.
  StoredLengthMismatch,
  /// A dynamic block declared more than 286 literal/length codes or more than
  /// 30 distance codes.
  TooManyCodes,
  /// The code length code of a dynamic block wasn't a complete code.
  IncompleteCodeLengthCode,
  /// A "repeat previous length" instruction appeared before any length.
  RepeatWithoutPrevious,
  /// A repeat instruction ran past the declared number of lengths.
  TooManyLengths,
  /// The literal/length code lengths don't describe a usable code.
  InvalidLitLenLengths,
  /// The distance code lengths don't describe a usable code.
  InvalidDistLengths,
  /// A bit pattern didn't decode to any valid symbol.
  InvalidSymbol,
  /// A back reference pointed before the start of the output.
  DistanceTooFar,
}
impl InflateError {
  /// If the same data could succeed when given more input or more output
  /// space.
  #[inline]
  #[must_use]
  pub const fn is_retryable(self) -> bool {
    matches!(self, Self::InputExhausted | Self::OutputExhausted)
  }

  /// If the compressed data itself is malformed.
  #[inline]
  #[must_use]
  pub const fn is_corrupt(self) -> bool {
    !self.is_retryable()
  }

  /// The classic `puff` status code for this error.
  ///
  /// Positive values are the retryable conditions, negative values are
  /// corrupt data. Zero (success) is never returned from here.
  #[inline]
  #[must_use]
  pub const fn code(self) -> i32 {
    match self {
      Self::InputExhausted => 2,
      Self::OutputExhausted => 1,
      Self::InvalidBlockType => -1,
      Self::StoredLengthMismatch => -2,
      Self::TooManyCodes => -3,
      Self::IncompleteCodeLengthCode => -4,
      Self::RepeatWithoutPrevious => -5,
      Self::TooManyLengths => -6,
      Self::InvalidLitLenLengths => -7,
      Self::InvalidDistLengths => -8,
      Self::InvalidSymbol => -9,
      Self::DistanceTooFar => -10,
    }
  }
}
impl fmt::Display for InflateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let msg = match self {
      Self::InputExhausted => "compressed data ended before the final block",
      Self::OutputExhausted => "output space exhausted before inflate completed",
      Self::InvalidBlockType => "invalid block type (3)",
      Self::StoredLengthMismatch => "stored block length did not match one's complement",
      Self::TooManyCodes => "too many length or distance codes",
      Self::IncompleteCodeLengthCode => "code lengths code is incomplete",
      Self::RepeatWithoutPrevious => "repeat lengths with no first length",
      Self::TooManyLengths => "repeat more than specified lengths",
      Self::InvalidLitLenLengths => "invalid literal/length code lengths",
      Self::InvalidDistLengths => "invalid distance code lengths",
      Self::InvalidSymbol => "invalid literal/length or distance code",
      Self::DistanceTooFar => "distance is too far back",
    };
    f.write_str(msg)
  }
}
impl core::error::Error for InflateError {}

/// Result alias for the PNG functions.
pub type PngResult<T> = Result<T, PngError>;

/// An error from decoding PNG data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PngError {
  /// The first 8 bytes aren't the PNG signature.
  NoPngSignature,
  /// The data ended in the middle of a chunk, or before the `IEND` chunk.
  UnexpectedEndOfInput,
  /// The first chunk after the signature must be `IHDR`.
  FirstChunkNotIHDR,
  /// The `IHDR` chunk must be exactly 13 bytes.
  BadIhdrLength,
  /// The declared width and/or height of this image is 0.
  WidthOrHeightZero,
  /// The decompressed image data would be larger than the
  /// [`PngLimits`](crate::png::PngLimits) allow.
  ImageTooLarge,
  /// Only 8 bits per channel is supported.
  UnsupportedBitDepth(u8),
  /// Only truecolor (2) and truecolor with alpha (6) are supported.
  UnsupportedColorType(u8),
  /// The compression method must be 0.
  UnsupportedCompressionMethod,
  /// The filter method must be 0.
  UnsupportedFilterMethod,
  /// Interlaced images aren't supported.
  InterlaceNotSupported,
  /// A single `IDAT` chunk was larger than the configured cap.
  IdatChunkTooLarge,
  /// There was no `IDAT` chunk at all.
  MissingImageData,
  /// The image data is too short to even hold the zlib framing.
  ZlibStreamTooShort,
  /// The zlib header doesn't declare deflate with a window of 32K or less.
  BadZlibHeader,
  /// The zlib header asks for a preset dictionary.
  ZlibPresetDictionary,
  /// The deflate data didn't end right before the zlib checksum.
  ZlibStreamLengthMismatch,
  /// Decompression gave fewer bytes than the image dimensions need.
  ImageDataTooShort,
  /// The output buffer given for unfiltering can't hold every row.
  PixelBufferTooSmall,
  /// A scanline used a filter type other than 0 through 4.
  IllegalFilterType(u8),
  /// The image data failed to decompress.
  Inflate(InflateError),
  /// The allocator couldn't give us enough space.
  Alloc,
  /// A checked math operation failed.
  CheckedMath,
}
impl From<InflateError> for PngError {
  #[inline]
  fn from(e: InflateError) -> Self {
    Self::Inflate(e)
  }
}
#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<TryFromIntError> for PngError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::CheckedMath
  }
}
impl fmt::Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NoPngSignature => f.write_str("missing PNG signature"),
      Self::UnexpectedEndOfInput => f.write_str("PNG data ended unexpectedly"),
      Self::FirstChunkNotIHDR => f.write_str("first chunk is not IHDR"),
      Self::BadIhdrLength => f.write_str("IHDR chunk is not 13 bytes"),
      Self::WidthOrHeightZero => f.write_str("image width or height is zero"),
      Self::ImageTooLarge => f.write_str("image data size exceeds the limit"),
      Self::UnsupportedBitDepth(d) => write!(f, "unsupported bit depth {d}"),
      Self::UnsupportedColorType(c) => write!(f, "unsupported color type {c}"),
      Self::UnsupportedCompressionMethod => f.write_str("unsupported compression method"),
      Self::UnsupportedFilterMethod => f.write_str("unsupported filter method"),
      Self::InterlaceNotSupported => f.write_str("interlaced images are not supported"),
      Self::IdatChunkTooLarge => f.write_str("IDAT chunk exceeds the limit"),
      Self::MissingImageData => f.write_str("no IDAT chunk"),
      Self::ZlibStreamTooShort => f.write_str("zlib stream too short"),
      Self::BadZlibHeader => f.write_str("bad zlib header"),
      Self::ZlibPresetDictionary => f.write_str("zlib preset dictionary is not supported"),
      Self::ZlibStreamLengthMismatch => f.write_str("deflate data does not end at the checksum"),
      Self::ImageDataTooShort => f.write_str("not enough image data for the dimensions"),
      Self::PixelBufferTooSmall => f.write_str("pixel buffer too small for the image"),
      Self::IllegalFilterType(t) => write!(f, "illegal filter type {t}"),
      Self::Inflate(e) => write!(f, "inflate failed: {e}"),
      Self::Alloc => f.write_str("allocation failed"),
      Self::CheckedMath => f.write_str("image size arithmetic overflowed"),
    }
  }
}
impl core::error::Error for PngError {
  fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
    match self {
      Self::Inflate(e) => Some(e),
      _ => None,
    }
  }
}

#[test]
fn test_inflate_error_codes_match_classes() {
  use InflateError::*;
  for e in [InputExhausted, OutputExhausted] {
    assert!(e.is_retryable());
    assert!(e.code() > 0);
  }
  for e in [
    InvalidBlockType,
    StoredLengthMismatch,
    TooManyCodes,
    IncompleteCodeLengthCode,
    RepeatWithoutPrevious,
    TooManyLengths,
    InvalidLitLenLengths,
    InvalidDistLengths,
    InvalidSymbol,
    DistanceTooFar,
  ] {
    assert!(e.is_corrupt());
    assert!(e.code() < 0);
  }
}
