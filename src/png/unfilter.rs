//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Since this decoder only handles 8 bit channels, the "corresponding byte of
//! the pixel to the left" is always `bytes_per_pixel` bytes back.

use super::IHDR;
use crate::error::{PngError, PngResult};

/// Reconstructs the pixel rows of `raw` into `out`.
///
/// * `raw` is the decompressed image data: `height` lines, each one a filter
///   type byte followed by `width * bytes_per_pixel` filtered bytes. Extra
///   bytes after the last line are ignored.
/// * `out` gets the reconstructed rows packed one after the other, with no
///   filter bytes. It must be at least
///   [`get_pixel_buffer_requirement`](IHDR::get_pixel_buffer_requirement)
///   bytes.
///
/// Rows are reconstructed top to bottom. Each row's "previous row" is the
/// already reconstructed row above it in `out`, and the first row uses a
/// previous row of all zeroes.
///
/// ## Failure
/// * `WidthOrHeightZero` if the header has no pixels.
/// * `ImageDataTooShort` if `raw` doesn't hold every line.
/// * `PixelBufferTooSmall` if `out` can't hold every row.
/// * `IllegalFilterType` if a line's filter type is more than 4. Rows before
///   that line will already have been written.
pub fn unfilter_scanlines(header: &IHDR, raw: &[u8], out: &mut [u8]) -> PngResult<()> {
  let bpp = header.bytes_per_pixel();
  let row_len = header.bytes_per_scanline()?;
  let height = usize::try_from(header.height)?;
  if row_len == 0 || height == 0 {
    return Err(PngError::WidthOrHeightZero);
  }
  if raw.len() < header.get_zlib_decompression_requirement()? {
    return Err(PngError::ImageDataTooShort);
  }
  if out.len() < header.get_pixel_buffer_requirement()? {
    return Err(PngError::PixelBufferTooSmall);
  }

  let mut previous: &[u8] = &[];
  let lines = raw.chunks_exact(row_len + 1).take(height);
  for (filterline, row) in lines.zip(out.chunks_exact_mut(row_len)) {
    let (filter_type, filtered) = match filterline.split_first() {
      Some((f, rest)) => (*f, rest),
      None => return Err(PngError::ImageDataTooShort),
    };
    match filter_type {
      0 => row.copy_from_slice(filtered),
      1 => {
        for i in 0..row_len {
          let ra = if i >= bpp { row[i - bpp] } else { 0 };
          row[i] = reconstruct_sub(filtered[i], ra);
        }
      }
      2 => {
        for i in 0..row_len {
          let rb = previous.get(i).copied().unwrap_or(0);
          row[i] = reconstruct_up(filtered[i], rb);
        }
      }
      3 => {
        for i in 0..row_len {
          let ra = if i >= bpp { row[i - bpp] } else { 0 };
          let rb = previous.get(i).copied().unwrap_or(0);
          row[i] = reconstruct_average(filtered[i], ra, rb);
        }
      }
      4 => {
        for i in 0..row_len {
          let (ra, rc) = if i >= bpp {
            (row[i - bpp], previous.get(i - bpp).copied().unwrap_or(0))
          } else {
            (0, 0)
          };
          let rb = previous.get(i).copied().unwrap_or(0);
          row[i] = reconstruct_paeth(filtered[i], ra, rb, rc);
        }
      }
      other => return Err(PngError::IllegalFilterType(other)),
    }
    previous = row;
  }
  Ok(())
}

/// Reconstruct Filter Type 1
///
/// * `fx` filtered X
/// * `ra` reconstructed `a`, the matching byte of the pixel to the left (0 for
///   the leftmost pixel)
const fn reconstruct_sub(fx: u8, ra: u8) -> u8 {
  fx.wrapping_add(ra)
}

/// Reconstruct Filter Type 2
///
/// * `fx` filtered X
/// * `rb` reconstructed `b`, the matching byte in the previous row
const fn reconstruct_up(fx: u8, rb: u8) -> u8 {
  fx.wrapping_add(rb)
}

/// Reconstruct Filter Type 3
///
/// The sum is done without overflow, so this is the true floor of the mean.
const fn reconstruct_average(fx: u8, ra: u8, rb: u8) -> u8 {
  fx.wrapping_add(((ra as u16 + rb as u16) / 2) as u8)
}

/// Reconstruct Filter Type 4
///
/// * `rc` reconstructed `c`, the byte above and to the left
const fn reconstruct_paeth(fx: u8, ra: u8, rb: u8, rc: u8) -> u8 {
  fx.wrapping_add(paeth_predictor(ra, rb, rc))
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the "predictor" of the neighboring pixel closest to the
/// computed value.
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // "The calculations within the PaethPredictor function shall be performed
  // exactly, without overflow." i32 is wide enough for any u8 inputs.
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // ties must go to a, then b, then c.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

#[cfg(test)]
use super::PngColorType;

#[test]
fn test_paeth_predictor_tie_breaks() {
  // p = a + b - c
  assert_eq!(paeth_predictor(0, 0, 0), 0);
  // a and b tie with c far away: a wins
  assert_eq!(paeth_predictor(10, 10, 10), 10);
  // p = 20 + 30 - 25 = 25: pa = 5, pb = 5, pc = 0
  assert_eq!(paeth_predictor(20, 30, 25), 25);
  // p = 200 + 100 - 0 = 300: pa = 100, pb = 200, pc = 300
  assert_eq!(paeth_predictor(200, 100, 0), 200);
  // p = 0 + 255 - 255 = 0: pa = 0
  assert_eq!(paeth_predictor(0, 255, 255), 0);
  // p = 255 + 0 - 255 = 0: pa = 255, pb = 0, pc = 255
  assert_eq!(paeth_predictor(255, 0, 255), 0);
}

#[test]
fn test_average_does_not_overflow() {
  assert_eq!(reconstruct_average(0, 255, 255), 255);
  assert_eq!(reconstruct_average(1, 255, 254), 255);
}

#[test]
fn test_first_row_uses_zero_previous_row() {
  let header = IHDR { width: 2, height: 1, color_type: PngColorType::RGB };
  let mut out = [0_u8; 6];
  // Average on the first row: x + floor(left / 2)
  unfilter_scanlines(&header, &[3, 10, 20, 30, 10, 20, 30], &mut out).unwrap();
  assert_eq!(out, [10, 20, 30, 15, 30, 45]);
  // Paeth on the first row acts like Sub
  unfilter_scanlines(&header, &[4, 10, 20, 30, 1, 2, 3], &mut out).unwrap();
  assert_eq!(out, [10, 20, 30, 11, 22, 33]);
  // Up on the first row is a plain copy
  unfilter_scanlines(&header, &[2, 10, 20, 30, 1, 2, 3], &mut out).unwrap();
  assert_eq!(out, [10, 20, 30, 1, 2, 3]);
}

#[test]
fn test_unfilter_errors() {
  let header = IHDR { width: 1, height: 2, color_type: PngColorType::RGBA };
  let mut out = [0_u8; 8];
  let raw = [0, 1, 2, 3, 4, 5, 1, 2, 3, 4];
  assert_eq!(unfilter_scanlines(&header, &raw, &mut out), Err(PngError::IllegalFilterType(5)));
  // the row before the bad one was still written
  assert_eq!(&out[..4], &[1, 2, 3, 4]);
  assert_eq!(unfilter_scanlines(&header, &raw[..9], &mut out), Err(PngError::ImageDataTooShort));
  let mut small = [0_u8; 7];
  let raw = [0, 1, 2, 3, 4, 0, 1, 2, 3, 4];
  assert_eq!(unfilter_scanlines(&header, &raw, &mut small), Err(PngError::PixelBufferTooSmall));
}

#[test]
fn test_empty_header_is_rejected() {
  let mut out = [0_u8; 8];
  let header = IHDR { width: 0, height: 2, color_type: PngColorType::RGB };
  assert_eq!(unfilter_scanlines(&header, &[0, 0], &mut out), Err(PngError::WidthOrHeightZero));
  let header = IHDR { width: 2, height: 0, color_type: PngColorType::RGB };
  assert_eq!(unfilter_scanlines(&header, &[], &mut out), Err(PngError::WidthOrHeightZero));
}
