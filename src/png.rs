#![forbid(unsafe_code)]

//! Module for working with PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! Only a small part of PNG is supported: 8 bits per channel, truecolor with
//! or without alpha, not interlaced. That covers the images most programs
//! write for textures and sprites.
//!
//! ## Automatic Decoding
//!
//! Just call [`decode_png`] and you get a [`PngImage`](crate::image::PngImage)
//! back.
//!
//! ```no_run
//! let bytes: &[u8] = unimplemented!("data from somewhere");
//! let image = pngpuff::png::decode_png(bytes).unwrap();
//! let rgba = image.to_rgba8();
//! ```
//!
//! ## Manual Decoding
//!
//! If you want control over when allocations happen you can do it yourself:
//!
//! 1) Call [`png_get_header`] to get the [`IHDR`] for the PNG.
//! 2) Call
//!    [`get_zlib_decompression_requirement`](IHDR::get_zlib_decompression_requirement)
//!    to find how much temporary space the decompression needs. You *cannot*
//!    decompress directly into the final image buffer, because every row has
//!    a filter type byte in front of it.
//! 3) Walk the chunks with [`RawPngChunkIter`] and join the data of all the
//!    `IDAT` chunks. That's a zlib stream, so pass it to
//!    [`zlib_deflate_payload`] and then decompress what that gives you with
//!    [`inflate_to_slice`](crate::inflate::inflate_to_slice).
//! 4) Call [`unfilter_scanlines`] to turn the decompressed, filtered data into
//!    the final pixel bytes.
//!
//! ## Parsing Errors
//!
//! The CRC of each chunk and the Adler-32 of the zlib stream are not checked.
//! Chunks other than `IHDR`, `IDAT`, and `IEND` are skipped without being
//! looked at, and chunk ordering rules are not enforced.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{
  error::{InflateError, PngError, PngResult},
  image::PngImage,
  inflate::{inflate_size, inflate_to_slice, Inflated},
};

mod chunk;
pub use chunk::*;

mod header;
pub use header::*;

mod unfilter;
pub use unfilter::*;

mod zlib;
pub use zlib::*;

/// The 8 bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
#[inline]
#[must_use]
pub fn is_png_signature_correct(bytes: &[u8]) -> bool {
  bytes.get(..8) == Some(&PNG_SIGNATURE[..])
}

/// Limits on what the decoder will accept.
///
/// Nothing is allocated for the image until the compressed data has been
/// checked to decompress to exactly the size the header declares, so a short
/// file can't claim a huge image and get a huge buffer for it. These limits
/// bound what a file that really is large can make the decoder allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngLimits {
  /// The largest single `IDAT` chunk accepted, in bytes.
  pub max_idat_chunk_len: usize,
  /// The largest decompressed image data accepted, in bytes, counting the
  /// filter byte of each row. `None` means any size.
  pub max_image_bytes: Option<usize>,
}
impl PngLimits {
  /// 16 MiB per `IDAT` chunk.
  pub const DEFAULT_MAX_IDAT_CHUNK_LEN: usize = 16 * 1024 * 1024;
}
impl Default for PngLimits {
  #[inline]
  fn default() -> Self {
    Self { max_idat_chunk_len: Self::DEFAULT_MAX_IDAT_CHUNK_LEN, max_image_bytes: None }
  }
}

/// Reads the signature and header, leaving the chunk iterator just after the
/// `IHDR`.
fn read_header(png: &[u8]) -> PngResult<(IHDR, RawPngChunkIter<'_>)> {
  if !is_png_signature_correct(png) {
    return Err(PngError::NoPngSignature);
  }
  let mut chunks = RawPngChunkIter::new(png);
  let first = chunks.next().ok_or(PngError::UnexpectedEndOfInput)?;
  if first.type_ != PngChunkType::IHDR {
    return Err(PngError::FirstChunkNotIHDR);
  }
  let ihdr = IHDR::try_from(first.data)?;
  Ok((ihdr, chunks))
}

/// Gets the header of the PNG.
///
/// ## Failure
/// * `NoPngSignature` if the first 8 bytes are wrong.
/// * `FirstChunkNotIHDR` if the first chunk isn't an `IHDR`.
/// * Any of the errors from parsing an [`IHDR`].
#[inline]
pub fn png_get_header(png: &[u8]) -> PngResult<IHDR> {
  read_header(png).map(|(ihdr, _)| ihdr)
}

/// Joins the payloads of every `IDAT` chunk up to `IEND`.
#[cfg(feature = "alloc")]
fn collect_idat(chunks: RawPngChunkIter<'_>, limits: &PngLimits) -> PngResult<Vec<u8>> {
  let mut stream: Vec<u8> = Vec::new();
  let mut idat_count = 0_usize;
  let mut chunks = chunks;
  loop {
    let chunk = chunks.next().ok_or(PngError::UnexpectedEndOfInput)?;
    match chunk.type_ {
      PngChunkType::IDAT => {
        if chunk.data.len() > limits.max_idat_chunk_len {
          log::warn!(
            "IDAT chunk of {} bytes exceeds the limit of {}",
            chunk.data.len(),
            limits.max_idat_chunk_len
          );
          return Err(PngError::IdatChunkTooLarge);
        }
        stream.try_reserve(chunk.data.len())?;
        stream.extend_from_slice(chunk.data);
        idat_count += 1;
      }
      PngChunkType::IEND => break,
      other => log::trace!("skipping {other:?} chunk ({} bytes)", chunk.data.len()),
    }
  }
  if idat_count == 0 {
    return Err(PngError::MissingImageData);
  }
  log::trace!("joined {idat_count} IDAT chunks, {} bytes", stream.len());
  Ok(stream)
}

/// Allocates a zeroed buffer, reporting failure instead of aborting.
#[cfg(feature = "alloc")]
fn try_zeroed_vec(len: usize) -> PngResult<Vec<u8>> {
  let mut v: Vec<u8> = Vec::new();
  v.try_reserve_exact(len)?;
  v.resize(len, 0);
  Ok(v)
}

/// Decodes a PNG with the default [`PngLimits`].
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
#[inline]
pub fn decode_png(png: &[u8]) -> PngResult<PngImage> {
  decode_png_with_limits(png, &PngLimits::default())
}

/// Decodes a PNG into a [`PngImage`].
///
/// The whole file must be in `png`. No partial image is returned on failure.
///
/// The deflate data is decompressed twice: once only counting the output, and
/// then for real once the count matches the header.
///
/// ## Failure
/// Any [`PngError`]. Decompression problems come back as
/// `PngError::Inflate`, except that the deflate data must exactly fill the
/// image (`ImageDataTooShort`) and must end exactly where the zlib checksum
/// starts (`ZlibStreamLengthMismatch`). More data than the image holds is
/// `Inflate(OutputExhausted)`.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn decode_png_with_limits(png: &[u8], limits: &PngLimits) -> PngResult<PngImage> {
  let (header, chunks) = read_header(png)?;
  let required = header.get_zlib_decompression_requirement()?;
  if limits.max_image_bytes.is_some_and(|max| required > max) {
    log::warn!(
      "{}x{} image needs {required} bytes, over the limit of {:?}",
      header.width,
      header.height,
      limits.max_image_bytes
    );
    return Err(PngError::ImageTooLarge);
  }

  let zlib_stream = collect_idat(chunks, limits)?;
  let deflate = zlib_deflate_payload(&zlib_stream)?;

  // size the data up before trusting the header with an allocation
  let Inflated { produced, consumed } = inflate_size(deflate)?;
  if produced > required {
    return Err(PngError::Inflate(InflateError::OutputExhausted));
  }
  if consumed != deflate.len() {
    return Err(PngError::ZlibStreamLengthMismatch);
  }
  if produced != required {
    return Err(PngError::ImageDataTooShort);
  }

  let mut filtered = try_zeroed_vec(required)?;
  inflate_to_slice(deflate, &mut filtered)?;

  let mut pixels = try_zeroed_vec(header.get_pixel_buffer_requirement()?)?;
  unfilter_scanlines(&header, &filtered, &mut pixels)?;
  log::debug!(
    "decoded {}x{} {:?} PNG from {} compressed bytes",
    header.width,
    header.height,
    header.color_type,
    deflate.len()
  );
  Ok(PngImage {
    width: header.width,
    height: header.height,
    color_type: header.color_type,
    pixels,
  })
}

#[test]
fn test_read_header_rejections() {
  assert_eq!(png_get_header(&[]), Err(PngError::NoPngSignature));
  assert_eq!(png_get_header(&[137, 80, 78, 71, 13, 10, 26, 11]), Err(PngError::NoPngSignature));
  assert_eq!(png_get_header(&PNG_SIGNATURE), Err(PngError::UnexpectedEndOfInput));

  let mut png = alloc::vec::Vec::from(PNG_SIGNATURE);
  png.extend_from_slice(&[0, 0, 0, 0]);
  png.extend_from_slice(b"IDAT");
  png.extend_from_slice(&[0, 0, 0, 0]);
  assert_eq!(png_get_header(&png), Err(PngError::FirstChunkNotIHDR));

  let mut png = alloc::vec::Vec::from(PNG_SIGNATURE);
  png.extend_from_slice(&[0, 0, 0, 12]);
  png.extend_from_slice(b"IHDR");
  png.extend_from_slice(&[0; 12]);
  png.extend_from_slice(&[0, 0, 0, 0]);
  assert_eq!(png_get_header(&png), Err(PngError::BadIhdrLength));
}

#[test]
fn test_png_limits_default() {
  let limits = PngLimits::default();
  assert_eq!(limits.max_idat_chunk_len, 16 * 1024 * 1024);
  assert_eq!(limits.max_image_bytes, None);
}
