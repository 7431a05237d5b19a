//! The zlib wrapper around PNG image data.
//!
//! A zlib stream is a 2 byte header, the deflate data, then a 4 byte Adler-32
//! checksum. The checksum isn't verified.

use crate::error::{PngError, PngResult};

/// The 2 byte header plus the 4 byte checksum.
const ZLIB_OVERHEAD: usize = 6;

/// Checks the zlib header and gives back the deflate data inside.
///
/// ## Failure
/// * `ZlibStreamTooShort` if there's less than 6 bytes.
/// * `BadZlibHeader` if the method isn't deflate or the window is over 32K.
/// * `ZlibPresetDictionary` if a preset dictionary is required.
pub fn zlib_deflate_payload(stream: &[u8]) -> PngResult<&[u8]> {
  if stream.len() < ZLIB_OVERHEAD {
    return Err(PngError::ZlibStreamTooShort);
  }
  let cmf = stream[0];
  let flg = stream[1];
  // method 8 is deflate, and the window is 2^(info+8) bytes.
  if (cmf & 0x0F) != 8 || (cmf >> 4) > 7 {
    return Err(PngError::BadZlibHeader);
  }
  if (flg & 0x20) != 0 {
    return Err(PngError::ZlibPresetDictionary);
  }
  Ok(&stream[2..stream.len() - 4])
}

#[test]
fn test_zlib_deflate_payload() {
  let stream = [0x78, 0x9C, 1, 2, 3, 0, 0, 0, 0];
  assert_eq!(zlib_deflate_payload(&stream), Ok(&[1, 2, 3][..]));
  assert_eq!(zlib_deflate_payload(&stream[..5]), Err(PngError::ZlibStreamTooShort));
  assert_eq!(zlib_deflate_payload(&stream[..6]), Ok(&[][..]));
  // method 15
  assert_eq!(zlib_deflate_payload(&[0x7F, 0x9C, 0, 0, 0, 0]), Err(PngError::BadZlibHeader));
  // window of 64K
  assert_eq!(zlib_deflate_payload(&[0x88, 0x9C, 0, 0, 0, 0]), Err(PngError::BadZlibHeader));
  assert_eq!(zlib_deflate_payload(&[0x78, 0xBB, 0, 0, 0, 0]), Err(PngError::ZlibPresetDictionary));
}
