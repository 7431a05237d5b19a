use crate::error::{PngError, PngResult};

/// The color types this decoder supports.
///
/// Both are 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Red, Green, Blue
  RGB = 2,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::RGB => 3,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      2 => PngColorType::RGB,
      6 => PngColorType::RGBA,
      other => return Err(PngError::UnsupportedColorType(other)),
    })
  }
}

/// Image Header
///
/// Only headers this decoder can actually decode are constructed: the bit
/// depth is always 8, and the compression, filter, and interlace methods are
/// all 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// pixel color type
  pub color_type: PngColorType,
}
impl IHDR {
  /// Bytes per pixel, 3 or 4.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    self.color_type.channel_count()
  }

  /// Bytes of pixel data in one row, not counting the filter byte.
  #[inline]
  pub fn bytes_per_scanline(&self) -> PngResult<usize> {
    usize::try_from(self.width)?.checked_mul(self.bytes_per_pixel()).ok_or(PngError::CheckedMath)
  }

  /// Gets the buffer size required to perform Zlib decompression.
  ///
  /// Every row gets one extra byte on the front for its filter type.
  #[inline]
  pub fn get_zlib_decompression_requirement(&self) -> PngResult<usize> {
    let filterline = self.bytes_per_scanline()?.checked_add(1).ok_or(PngError::CheckedMath)?;
    filterline.checked_mul(usize::try_from(self.height)?).ok_or(PngError::CheckedMath)
  }

  /// Gets the buffer size required for the final, unfiltered pixels.
  #[inline]
  pub fn get_pixel_buffer_requirement(&self) -> PngResult<usize> {
    self.bytes_per_scanline()?.checked_mul(usize::try_from(self.height)?).ok_or(PngError::CheckedMath)
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  /// Parses the 13 bytes of an `IHDR` payload.
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 {
          return Err(PngError::WidthOrHeightZero);
        }
        if *bit_depth != 8 {
          return Err(PngError::UnsupportedBitDepth(*bit_depth));
        }
        let color_type = PngColorType::try_from(*color_type)?;
        if *compression_method != 0 {
          return Err(PngError::UnsupportedCompressionMethod);
        }
        if *filter_method != 0 {
          return Err(PngError::UnsupportedFilterMethod);
        }
        if *interlace_method != 0 {
          return Err(PngError::InterlaceNotSupported);
        }
        Ok(Self { width, height, color_type })
      }
      _ => Err(PngError::BadIhdrLength),
    }
  }
}

#[cfg(test)]
fn ihdr_bytes(w: u32, h: u32, depth: u8, color: u8, methods: [u8; 3]) -> [u8; 13] {
  let mut out = [0_u8; 13];
  out[0..4].copy_from_slice(&w.to_be_bytes());
  out[4..8].copy_from_slice(&h.to_be_bytes());
  out[8] = depth;
  out[9] = color;
  out[10..].copy_from_slice(&methods);
  out
}

#[test]
fn test_ihdr_accepts_truecolor() {
  let ihdr = IHDR::try_from(&ihdr_bytes(3, 2, 8, 6, [0; 3])[..]).unwrap();
  assert_eq!(ihdr, IHDR { width: 3, height: 2, color_type: PngColorType::RGBA });
  assert_eq!(ihdr.bytes_per_pixel(), 4);
  assert_eq!(ihdr.get_zlib_decompression_requirement(), Ok((3 * 4 + 1) * 2));
  assert_eq!(ihdr.get_pixel_buffer_requirement(), Ok(3 * 4 * 2));
  let ihdr = IHDR::try_from(&ihdr_bytes(5, 1, 8, 2, [0; 3])[..]).unwrap();
  assert_eq!(ihdr.get_zlib_decompression_requirement(), Ok(16));
}

#[test]
fn test_ihdr_rejections() {
  fn check(bytes: &[u8], e: PngError) {
    assert_eq!(IHDR::try_from(bytes), Err(e));
  }
  check(&ihdr_bytes(0, 2, 8, 6, [0; 3]), PngError::WidthOrHeightZero);
  check(&ihdr_bytes(2, 0, 8, 6, [0; 3]), PngError::WidthOrHeightZero);
  check(&ihdr_bytes(2, 2, 16, 6, [0; 3]), PngError::UnsupportedBitDepth(16));
  check(&ihdr_bytes(2, 2, 8, 3, [0; 3]), PngError::UnsupportedColorType(3));
  check(&ihdr_bytes(2, 2, 8, 0, [0; 3]), PngError::UnsupportedColorType(0));
  check(&ihdr_bytes(2, 2, 8, 2, [1, 0, 0]), PngError::UnsupportedCompressionMethod);
  check(&ihdr_bytes(2, 2, 8, 2, [0, 1, 0]), PngError::UnsupportedFilterMethod);
  check(&ihdr_bytes(2, 2, 8, 2, [0, 0, 1]), PngError::InterlaceNotSupported);
  check(&ihdr_bytes(2, 2, 8, 2, [0; 3])[..12], PngError::BadIhdrLength);
}
