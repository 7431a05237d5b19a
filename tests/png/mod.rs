use miniz_oxide::deflate::compress_to_vec_zlib;
use pngpuff::{
  image::PngImage,
  png::{
    decode_png, decode_png_with_limits, png_get_header, PngColorType, PngLimits, RawPngChunkIter,
    IHDR,
  },
  InflateError, PngError, BGRA8, RGBA8,
};
use walkdir::WalkDir;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn push_chunk(png: &mut Vec<u8>, type_: &[u8; 4], data: &[u8]) {
  png.extend_from_slice(&(data.len() as u32).to_be_bytes());
  png.extend_from_slice(type_);
  png.extend_from_slice(data);
  // the decoder doesn't check CRCs
  png.extend_from_slice(&[0, 0, 0, 0]);
}

fn ihdr_data(width: u32, height: u32, color_type: u8) -> Vec<u8> {
  let mut v = Vec::new();
  v.extend_from_slice(&width.to_be_bytes());
  v.extend_from_slice(&height.to_be_bytes());
  v.extend_from_slice(&[8, color_type, 0, 0, 0]);
  v
}

/// A PNG with the zlib stream split over `idat_count` chunks.
fn build_png(width: u32, height: u32, color_type: u8, zlib: &[u8], idat_count: usize) -> Vec<u8> {
  let mut png = SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr_data(width, height, color_type));
  let piece = (zlib.len() + idat_count - 1) / idat_count;
  for part in zlib.chunks(piece.max(1)) {
    push_chunk(&mut png, b"IDAT", part);
  }
  push_chunk(&mut png, b"IEND", &[]);
  png
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let p = i32::from(a) + i32::from(b) - i32::from(c);
  let pa = (p - i32::from(a)).abs();
  let pb = (p - i32::from(b)).abs();
  let pc = (p - i32::from(c)).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// The encoder side of the PNG filters: each row gets `filters[y]`.
fn filter_rows(pixels: &[u8], row_len: usize, bpp: usize, filters: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  let zero_row = vec![0_u8; row_len];
  let mut prev: &[u8] = &zero_row;
  for (row, &f) in pixels.chunks_exact(row_len).zip(filters) {
    out.push(f);
    for i in 0..row_len {
      let a = if i >= bpp { row[i - bpp] } else { 0 };
      let b = prev[i];
      let c = if i >= bpp { prev[i - bpp] } else { 0 };
      let predicted = match f {
        0 => 0,
        1 => a,
        2 => b,
        3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
        4 => paeth(a, b, c),
        _ => unreachable!(),
      };
      out.push(row[i].wrapping_sub(predicted));
    }
    prev = row;
  }
  out
}

fn sample_pixels(width: usize, height: usize, bpp: usize) -> Vec<u8> {
  (0..width * height * bpp).map(|i| (i * 37 + (i / 7) * 101) as u8).collect()
}

#[test]
fn test_minimal_1x1_rgba() {
  // level 0 gives a single stored block
  let zlib = compress_to_vec_zlib(&[0, 255, 0, 0, 128], 0);
  let png = build_png(1, 1, 6, &zlib, 1);
  let image = decode_png(&png).unwrap();
  assert_eq!(
    image,
    PngImage { width: 1, height: 1, color_type: PngColorType::RGBA, pixels: vec![255, 0, 0, 128] }
  );
  assert_eq!(image.to_rgba8(), [RGBA8 { r: 255, g: 0, b: 0, a: 128 }]);
  assert_eq!(image.to_bgra8_bottom_up(true), [BGRA8 { b: 0, g: 0, r: 128, a: 128 }]);
}

#[test]
fn test_each_filter_type_inverts() {
  for (color_type, bpp) in [(2_u8, 3_usize), (6, 4)] {
    let (w, h) = (3, 2);
    let pixels = sample_pixels(w, h, bpp);
    for f in 0..=4 {
      let filtered = filter_rows(&pixels, w * bpp, bpp, &[f, f]);
      let png = build_png(w as u32, h as u32, color_type, &compress_to_vec_zlib(&filtered, 6), 1);
      let image = decode_png(&png).unwrap();
      assert_eq!(image.pixels, pixels, "color type {color_type}, filter {f}");
    }
  }
}

#[test]
fn test_mixed_filters_per_row() {
  let (w, h, bpp) = (7, 6, 4);
  let pixels = sample_pixels(w, h, bpp);
  let filtered = filter_rows(&pixels, w * bpp, bpp, &[4, 3, 2, 1, 0, 4]);
  let png = build_png(w as u32, h as u32, 6, &compress_to_vec_zlib(&filtered, 9), 1);
  assert_eq!(decode_png(&png).unwrap().pixels, pixels);
}

#[test]
fn test_multiple_idat_chunks_match_single() {
  let (w, h, bpp) = (16, 16, 3);
  let pixels = sample_pixels(w, h, bpp);
  let filtered = filter_rows(&pixels, w * bpp, bpp, &[1; 16]);
  let zlib = compress_to_vec_zlib(&filtered, 6);
  let single = decode_png(&build_png(16, 16, 2, &zlib, 1)).unwrap();
  let split = decode_png(&build_png(16, 16, 2, &zlib, 5)).unwrap();
  assert_eq!(single, split);
  assert_eq!(single.pixels, pixels);
}

#[test]
fn test_ancillary_chunks_are_skipped() {
  let zlib = compress_to_vec_zlib(&[0, 1, 2, 3], 6);
  let mut png = SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr_data(1, 1, 2));
  push_chunk(&mut png, b"gAMA", &[0, 0, 177, 143]);
  push_chunk(&mut png, b"IDAT", &zlib);
  push_chunk(&mut png, b"tIME", &[7, 230, 1, 1, 0, 0, 0]);
  push_chunk(&mut png, b"IEND", &[]);
  assert_eq!(decode_png(&png).unwrap().pixels, [1, 2, 3]);
}

#[test]
fn test_fixture_files() {
  // written by a different encoder, with real CRCs and a tEXt chunk
  let png = std::fs::read("tests/png/gradient_rgba_4x3.png").unwrap();
  let image = decode_png(&png).unwrap();
  assert_eq!((image.width, image.height, image.color_type), (4, 3, PngColorType::RGBA));
  for y in 0..3_u32 {
    for x in 0..4_u32 {
      let expected = [x * 60, y * 80, (x + y) * 20, 255 - x * 10].map(|c| c as u8);
      assert_eq!(image.pixel(x, y), Some(&expected[..]), "({x},{y})");
    }
  }

  let png = std::fs::read("tests/png/pattern_rgb_5x5.png").unwrap();
  let image = decode_png(&png).unwrap();
  assert_eq!((image.width, image.height, image.color_type), (5, 5, PngColorType::RGB));
  for y in 0..5_u32 {
    for x in 0..5_u32 {
      let expected = [(x * y * 13) & 255, (x * 37 + y * 11) & 255, 200 - x * y].map(|c| c as u8);
      assert_eq!(image.pixel(x, y), Some(&expected[..]), "({x},{y})");
    }
  }
}

#[test]
fn test_header_only() {
  let png = build_png(640, 480, 2, &[], 1);
  assert_eq!(
    png_get_header(&png),
    Ok(IHDR { width: 640, height: 480, color_type: PngColorType::RGB })
  );
}

#[test]
fn test_header_rejections() {
  fn with_ihdr(data: &[u8]) -> Result<PngImage, PngError> {
    let mut png = SIGNATURE.to_vec();
    push_chunk(&mut png, b"IHDR", data);
    push_chunk(&mut png, b"IEND", &[]);
    decode_png(&png)
  }
  let mut bad = ihdr_data(1, 1, 2);
  bad[8] = 16;
  assert_eq!(with_ihdr(&bad), Err(PngError::UnsupportedBitDepth(16)));
  assert_eq!(with_ihdr(&ihdr_data(1, 1, 3)), Err(PngError::UnsupportedColorType(3)));
  assert_eq!(with_ihdr(&ihdr_data(1, 1, 4)), Err(PngError::UnsupportedColorType(4)));
  assert_eq!(with_ihdr(&ihdr_data(0, 1, 2)), Err(PngError::WidthOrHeightZero));
  let mut bad = ihdr_data(1, 1, 2);
  bad[12] = 1;
  assert_eq!(with_ihdr(&bad), Err(PngError::InterlaceNotSupported));
  assert_eq!(with_ihdr(&ihdr_data(1, 1, 2)[..12]), Err(PngError::BadIhdrLength));

  assert_eq!(decode_png(b"GIF89a"), Err(PngError::NoPngSignature));
  let mut png = SIGNATURE.to_vec();
  push_chunk(&mut png, b"IEND", &[]);
  assert_eq!(decode_png(&png), Err(PngError::FirstChunkNotIHDR));
}

#[test]
fn test_chunk_walk_rejections() {
  let zlib = compress_to_vec_zlib(&[0, 1, 2, 3], 6);

  let mut png = SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr_data(1, 1, 2));
  push_chunk(&mut png, b"IEND", &[]);
  assert_eq!(decode_png(&png), Err(PngError::MissingImageData));

  let mut png = SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr_data(1, 1, 2));
  push_chunk(&mut png, b"IDAT", &zlib);
  assert_eq!(decode_png(&png), Err(PngError::UnexpectedEndOfInput));
  // cut off in the middle of the IDAT
  png.truncate(png.len() - 6);
  assert_eq!(decode_png(&png), Err(PngError::UnexpectedEndOfInput));

  let png = build_png(1, 1, 2, &zlib, 1);
  let tight = PngLimits { max_idat_chunk_len: zlib.len() - 1, ..PngLimits::default() };
  assert_eq!(decode_png_with_limits(&png, &tight), Err(PngError::IdatChunkTooLarge));
  // the cap is per chunk, so splitting the stream up gets under it
  let png = build_png(1, 1, 2, &zlib, 2);
  assert!(decode_png_with_limits(&png, &tight).is_ok());

  // 5x5 RGB is 5 * (5 * 3 + 1) = 80 bytes of image data
  let png = build_png(5, 5, 2, &zlib, 1);
  let small = PngLimits { max_image_bytes: Some(79), ..PngLimits::default() };
  assert_eq!(decode_png_with_limits(&png, &small), Err(PngError::ImageTooLarge));
  let exact = PngLimits { max_image_bytes: Some(80), ..PngLimits::default() };
  assert_eq!(decode_png_with_limits(&png, &exact), Err(PngError::ImageDataTooShort));
}

#[test]
fn test_wide_strip() {
  let width = 20_000_usize;
  let mut raw = vec![0_u8];
  raw.extend((0..width * 3).map(|i| (i % 7) as u8));
  let zlib = compress_to_vec_zlib(&raw, 9);
  let image = decode_png(&build_png(width as u32, 1, 2, &zlib, 1)).unwrap();
  assert_eq!(image.pixels, &raw[1..]);
  assert_eq!(image.pixel(19_999, 0), Some(&raw[raw.len() - 3..]));
}

#[test]
fn test_huge_header_with_little_data() {
  // claims a gigabyte of image data but only has four bytes, which has to be
  // noticed before any buffer for the image gets made
  let zlib = compress_to_vec_zlib(&[0, 1, 2, 3], 6);
  let png = build_png(20_000, 20_000, 6, &zlib, 1);
  assert!(png.len() < 100);
  assert_eq!(decode_png(&png), Err(PngError::ImageDataTooShort));
}

#[test]
fn test_zlib_rejections() {
  let png = build_png(1, 1, 2, &[0x78, 0x9C, 0x03, 0x00, 0x00], 1);
  assert_eq!(decode_png(&png), Err(PngError::ZlibStreamTooShort));
  let png = build_png(1, 1, 2, &[0x79, 0x9C, 0x03, 0x00, 0, 0, 0, 0], 1);
  assert_eq!(decode_png(&png), Err(PngError::BadZlibHeader));
  let png = build_png(1, 1, 2, &[0x78, 0xBB, 0x03, 0x00, 0, 0, 0, 0], 1);
  assert_eq!(decode_png(&png), Err(PngError::ZlibPresetDictionary));
  // BFINAL with block type 3
  let png = build_png(1, 1, 2, &[0x78, 0x9C, 0xFF, 0, 0, 0, 0], 1);
  assert_eq!(decode_png(&png), Err(PngError::Inflate(InflateError::InvalidBlockType)));
}

#[test]
fn test_image_data_size_rejections() {
  // 2x2 RGB needs 14 bytes, this has one row's worth
  let zlib = compress_to_vec_zlib(&[0, 1, 2, 3, 4, 5, 6], 6);
  let png = build_png(2, 2, 2, &zlib, 1);
  assert_eq!(decode_png(&png), Err(PngError::ImageDataTooShort));

  // too much data overflows the buffer
  let zlib = compress_to_vec_zlib(&[0; 20], 6);
  let png = build_png(2, 2, 2, &zlib, 1);
  assert_eq!(decode_png(&png), Err(PngError::Inflate(InflateError::OutputExhausted)));

  // an extra byte between the deflate data and the checksum
  let mut zlib = compress_to_vec_zlib(&[0, 1, 2, 3], 6);
  zlib.insert(zlib.len() - 4, 0);
  let png = build_png(1, 1, 2, &zlib, 1);
  assert_eq!(decode_png(&png), Err(PngError::ZlibStreamLengthMismatch));

  let zlib = compress_to_vec_zlib(&[7, 1, 2, 3], 6);
  let png = build_png(1, 1, 2, &zlib, 1);
  assert_eq!(decode_png(&png), Err(PngError::IllegalFilterType(7)));
}

#[test]
fn test_hand_off_conversions() {
  let pixels = vec![10, 20, 30, 40, 50, 60];
  let zlib = compress_to_vec_zlib(&[0, 10, 20, 30, 0, 40, 50, 60], 6);
  let mut image = decode_png(&build_png(1, 2, 2, &zlib, 1)).unwrap();
  assert_eq!(image.pixels, pixels);
  assert_eq!(image.channels(), 3);
  assert_eq!(
    image.to_bgra8_bottom_up(false),
    [BGRA8 { b: 60, g: 50, r: 40, a: 255 }, BGRA8 { b: 30, g: 20, r: 10, a: 255 }]
  );
  image.vertical_flip();
  assert_eq!(image.pixels, [40, 50, 60, 10, 20, 30]);
}

#[test]
fn test_RawPngChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in RawPngChunkIter::new(&v) {
      //
    }
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in RawPngChunkIter::new(&v) {
      //
    }
  }
}

#[test]
fn test_decode_png_no_panics() {
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    if entry.file_type().is_dir() {
      continue;
    }
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    // Most files here aren't PNGs at all, so they naturally fail to decode.
    // However, the library shouldn't panic even with a hostile file.
    let _ = decode_png(&v);
  }
  // random data after a valid header
  for _ in 0..200 {
    let mut png = SIGNATURE.to_vec();
    push_chunk(&mut png, b"IHDR", &ihdr_data(4, 4, 6));
    let mut noise = vec![0x78, 0x9C];
    noise.extend(super::rand_bytes(200));
    push_chunk(&mut png, b"IDAT", &noise);
    push_chunk(&mut png, b"IEND", &[]);
    let _ = decode_png(&png);
  }
}
