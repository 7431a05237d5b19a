//! Pixel types for handing decoded images to other code.
//!
//! All of these are plain bytes with `#[repr(C)]`, so a `&[u8]` of the right
//! length can be viewed as a slice of pixels with [`bytemuck::cast_slice`] and
//! the other way around.

use bytemuck::{Pod, Zeroable};

/// An RGB value, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// An RGBA value, 8 bits per channel.
///
/// The alpha is straight (not premultiplied) unless you made it otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl From<RGB8> for RGBA8 {
  #[inline]
  fn from(RGB8 { r, g, b }: RGB8) -> Self {
    Self { r, g, b, a: u8::MAX }
  }
}

/// A BGRA value, 8 bits per channel.
///
/// This is the byte order of a 32-bit Windows DIB, and of many GPU texture
/// formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct BGRA8 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  pub a: u8,
}
impl From<RGBA8> for BGRA8 {
  #[inline]
  fn from(RGBA8 { r, g, b, a }: RGBA8) -> Self {
    Self { b, g, r, a }
  }
}
impl BGRA8 {
  /// Scales each color channel by the alpha, `c * a / 255`.
  #[inline]
  #[must_use]
  pub const fn premultiplied(self) -> Self {
    const fn mul(c: u8, a: u8) -> u8 {
      ((c as u16 * a as u16) / 255) as u8
    }
    Self { b: mul(self.b, self.a), g: mul(self.g, self.a), r: mul(self.r, self.a), a: self.a }
  }
}

#[test]
fn test_pixels_are_bytes() {
  let bytes = [1_u8, 2, 3, 4, 5, 6, 7, 8];
  let rgba: &[RGBA8] = bytemuck::cast_slice(&bytes);
  assert_eq!(rgba[1], RGBA8 { r: 5, g: 6, b: 7, a: 8 });
  let bgra: &[BGRA8] = bytemuck::cast_slice(&bytes);
  assert_eq!(bgra[0], BGRA8 { b: 1, g: 2, r: 3, a: 4 });
  let rgb: &[RGB8] = bytemuck::cast_slice(&bytes[..6]);
  assert_eq!(rgb.len(), 2);
}

#[test]
fn test_premultiply() {
  let px = BGRA8 { b: 255, g: 128, r: 10, a: 128 };
  assert_eq!(px.premultiplied(), BGRA8 { b: 128, g: 64, r: 5, a: 128 });
  let opaque = BGRA8 { b: 1, g: 2, r: 3, a: 255 };
  assert_eq!(opaque.premultiplied(), opaque);
  assert_eq!(BGRA8 { b: 200, g: 200, r: 200, a: 0 }.premultiplied(), BGRA8::default());
}
