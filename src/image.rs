#![forbid(unsafe_code)]

//! The decoded image type, and conversions for handing it to other code.

use alloc::vec::Vec;

use crate::{
  pixel_formats::{BGRA8, RGB8, RGBA8},
  png::PngColorType,
};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize) * (width as usize) + (x as usize)
}

/// A decoded PNG.
///
/// The pixels are stored top row first, each row left to right, with 3 or 4
/// bytes per pixel depending on the color type. There's no padding between
/// rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngImage {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// if there's an alpha channel
  pub color_type: PngColorType,
  /// `width * height * bytes_per_pixel` bytes of pixel data
  pub pixels: Vec<u8>,
}
impl PngImage {
  /// 3 for RGB, 4 for RGBA.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    self.color_type.channel_count()
  }

  /// Same as `bytes_per_pixel`, since every channel is one byte.
  #[inline]
  #[must_use]
  pub const fn channels(&self) -> usize {
    self.color_type.channel_count()
  }

  #[inline]
  fn row_len(&self) -> usize {
    (self.width as usize) * self.bytes_per_pixel()
  }

  /// The pixel bytes, less any partial pixel on the end.
  #[inline]
  fn whole_pixels(&self) -> &[u8] {
    let bpp = self.bytes_per_pixel();
    &self.pixels[..self.pixels.len() - self.pixels.len() % bpp]
  }

  /// Gets the bytes of the pixel at the position, or `None` if the position is
  /// out of bounds.
  #[inline]
  #[must_use]
  pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
    if x < self.width && y < self.height {
      let bpp = self.bytes_per_pixel();
      let i = xy_width_to_index(x, y, self.width) * bpp;
      self.pixels.get(i..i + bpp)
    } else {
      None
    }
  }

  /// Every pixel as RGBA, in the same order. RGB pixels get an alpha of 255.
  #[must_use]
  pub fn to_rgba8(&self) -> Vec<RGBA8> {
    rgba_from_bytes(self.color_type, self.whole_pixels())
  }

  /// Every pixel as BGRA, with the bottom row first.
  ///
  /// That's the layout of a 32-bit bottom-up DIB. With `premultiply` each
  /// color channel is scaled by the alpha, which is what alpha blending of
  /// such a bitmap expects.
  #[must_use]
  pub fn to_bgra8_bottom_up(&self, premultiply: bool) -> Vec<BGRA8> {
    let row_len = self.row_len();
    if row_len == 0 {
      return Vec::new();
    }
    let mut out = Vec::with_capacity(self.pixels.len() / self.bytes_per_pixel());
    for row in self.pixels.chunks_exact(row_len).rev() {
      out.extend(rgba_from_bytes(self.color_type, row).into_iter().map(BGRA8::from).map(|px| {
        if premultiply {
          px.premultiplied()
        } else {
          px
        }
      }));
    }
    out
  }

  /// Flips the image top to bottom.
  #[inline]
  pub fn vertical_flip(&mut self) {
    let row_len = self.row_len();
    let mut data: &mut [u8] = self.pixels.as_mut_slice();
    let mut temp_height = self.height;
    while temp_height > 1 && data.len() >= row_len * 2 {
      let (low, mid) = data.split_at_mut(row_len);
      let (mid, high) = mid.split_at_mut(mid.len() - row_len);
      low.swap_with_slice(high);
      data = mid;
      temp_height -= 2;
    }
  }
}

/// `bytes` must be a whole number of pixels.
fn rgba_from_bytes(color_type: PngColorType, bytes: &[u8]) -> Vec<RGBA8> {
  match color_type {
    PngColorType::RGBA => bytemuck::cast_slice::<u8, RGBA8>(bytes).to_vec(),
    PngColorType::RGB => {
      bytemuck::cast_slice::<u8, RGB8>(bytes).iter().copied().map(RGBA8::from).collect()
    }
  }
}

#[cfg(test)]
fn rgb_2x2() -> PngImage {
  PngImage {
    width: 2,
    height: 2,
    color_type: PngColorType::RGB,
    pixels: alloc::vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
  }
}

#[test]
fn test_pixel_lookup() {
  let img = rgb_2x2();
  assert_eq!(img.pixel(1, 0), Some(&[4, 5, 6][..]));
  assert_eq!(img.pixel(0, 1), Some(&[7, 8, 9][..]));
  assert_eq!(img.pixel(2, 0), None);
  assert_eq!(img.pixel(0, 2), None);
}

#[test]
fn test_to_rgba8() {
  let img = rgb_2x2();
  let rgba = img.to_rgba8();
  assert_eq!(rgba.len(), 4);
  assert_eq!(rgba[3], RGBA8 { r: 10, g: 11, b: 12, a: 255 });
  // a stray partial pixel is left out
  let mut img = rgb_2x2();
  img.pixels.push(99);
  assert_eq!(img.to_rgba8().len(), 4);
}

#[test]
fn test_to_bgra8_bottom_up() {
  let img = PngImage {
    width: 1,
    height: 2,
    color_type: PngColorType::RGBA,
    pixels: alloc::vec![10, 20, 30, 255, 200, 100, 50, 0],
  };
  let plain = img.to_bgra8_bottom_up(false);
  assert_eq!(plain, [BGRA8 { b: 50, g: 100, r: 200, a: 0 }, BGRA8 { b: 30, g: 20, r: 10, a: 255 }]);
  let pre = img.to_bgra8_bottom_up(true);
  assert_eq!(pre, [BGRA8 { b: 0, g: 0, r: 0, a: 0 }, BGRA8 { b: 30, g: 20, r: 10, a: 255 }]);
}

#[test]
fn test_vertical_flip() {
  let mut img = PngImage {
    width: 1,
    height: 3,
    color_type: PngColorType::RGB,
    pixels: alloc::vec![1, 1, 1, 2, 2, 2, 3, 3, 3],
  };
  img.vertical_flip();
  assert_eq!(img.pixels, [3, 3, 3, 2, 2, 2, 1, 1, 1]);
  let mut img = rgb_2x2();
  img.vertical_flip();
  assert_eq!(img.pixels, [7, 8, 9, 10, 11, 12, 1, 2, 3, 4, 5, 6]);
}
