use miniz_oxide::deflate::compress_to_vec;
use pngpuff::{inflate, inflate_size, inflate_to_slice, inflate_to_vec, InflateError, OutputSink};

use crate::BitWriter;

const TEXT: &[u8] = b"It is a truth universally acknowledged, that a single man in \
possession of a good fortune, must be in want of a wife. However little known the \
feelings or views of such a man may be on his first entering a neighbourhood, this \
truth is so well fixed in the minds of the surrounding families, that he is \
considered the rightful property of some one or other of their daughters.";

/// Decodes with a counting sink and then for real, and checks both agree
/// with the original data.
fn check_round_trip(data: &[u8], level: u8) {
  let compressed = compress_to_vec(data, level);
  let counted = inflate_size(&compressed).unwrap();
  assert_eq!(counted.produced, data.len(), "level {level}");
  assert_eq!(counted.consumed, compressed.len(), "level {level}");

  let mut out = vec![0; data.len()];
  let real = inflate_to_slice(&compressed, &mut out).unwrap();
  assert_eq!(real, counted, "level {level}");
  assert!(out == data, "level {level}: output differs");
}

#[test]
fn test_round_trip_empty() {
  check_round_trip(&[], 0);
  check_round_trip(&[], 6);
}

#[test]
fn test_round_trip_text() {
  // short text mostly gets the fixed codes, repeated text gets dynamic ones
  check_round_trip(TEXT, 1);
  check_round_trip(&TEXT.repeat(40), 6);
  check_round_trip(&TEXT.repeat(40), 9);
}

#[test]
fn test_round_trip_long_runs() {
  // distance 1 copies, each one overlapping its own output
  check_round_trip(&[b'z'; 5000], 6);
  let mut data = vec![0_u8; 1000];
  data.extend_from_slice(&[1, 2, 3].repeat(900));
  data.extend(std::iter::repeat(7).take(3000));
  check_round_trip(&data, 9);
}

#[test]
fn test_round_trip_stored_blocks() {
  // level 0 writes stored blocks, and more than 64K needs several of them
  let data = crate::rand_bytes(70_000);
  check_round_trip(&data, 0);
  check_round_trip(&data, 6);
}

#[test]
fn test_round_trip_mixed() {
  let data: Vec<u8> =
    (0..100_000_u32).map(|i| ((i % 251) as u8) ^ ((i / 1000) as u8)).collect();
  check_round_trip(&data, 1);
  check_round_trip(&data, 9);
}

#[test]
fn test_every_truncation_is_input_exhausted() {
  let compressed = compress_to_vec(&TEXT.repeat(4), 6);
  for n in 0..compressed.len() {
    assert_eq!(inflate_size(&compressed[..n]), Err(InflateError::InputExhausted), "cut at {n}");
  }
}

#[test]
fn test_output_one_byte_short() {
  let compressed = compress_to_vec(TEXT, 6);
  let mut out = vec![0; TEXT.len() - 1];
  assert_eq!(inflate_to_slice(&compressed, &mut out), Err(InflateError::OutputExhausted));
  assert_eq!(inflate_to_vec(&compressed, Some(10)), Err(InflateError::OutputExhausted));
}

#[test]
fn test_inflate_to_vec() {
  let compressed = compress_to_vec(TEXT, 6);
  let (sized, used) = inflate_to_vec(&compressed, None).unwrap();
  assert_eq!(sized, TEXT);
  assert_eq!(used, compressed.len());
  let (hinted, _) = inflate_to_vec(&compressed, Some(TEXT.len() * 2)).unwrap();
  assert_eq!(hinted, TEXT);
}

#[test]
fn test_trailing_bytes_are_not_consumed() {
  let mut compressed = compress_to_vec(TEXT, 6);
  let real_len = compressed.len();
  compressed.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
  let got = inflate(&compressed, OutputSink::counting()).unwrap();
  assert_eq!(got.consumed, real_len);
  assert_eq!(got.produced, TEXT.len());
}

#[test]
fn test_oversubscribed_lit_len_lengths() {
  // A dynamic block whose code length code is {1: "0", 18: "1"}, and then
  // every literal/length symbol is given length 1. That's far more codes than
  // one bit can hold.
  let mut w = BitWriter::new();
  w.push(1, 1); // BFINAL
  w.push(2, 2); // BTYPE dynamic
  w.push(0, 5); // HLIT = 257
  w.push(0, 5); // HDIST = 1
  w.push(14, 4); // HCLEN = 18
  for i in 0..18 {
    // order index 2 is symbol 18, index 17 is symbol 1
    w.push(if i == 2 || i == 17 { 1 } else { 0 }, 3);
  }
  for _ in 0..258 {
    w.push(0, 1);
  }
  let stream = w.finish();
  assert_eq!(inflate_size(&stream), Err(InflateError::InvalidLitLenLengths));
}

/// The order that code length code lengths are stored in.
const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Pushes a Huffman code, which goes in most significant bit first.
fn push_code(w: &mut BitWriter, code: u32, len: u32) {
  for i in (0..len).rev() {
    w.push((code >> i) & 1, 1);
  }
}

/// Starts a final dynamic block, giving all 19 code length code lengths.
fn dynamic_header(w: &mut BitWriter, hlit: u32, hdist: u32, cl_lengths: &[u32; 19]) {
  w.push(1, 1);
  w.push(2, 2);
  w.push(hlit - 257, 5);
  w.push(hdist - 1, 5);
  w.push(15, 4);
  for symbol in CODE_LENGTH_ORDER {
    w.push(cl_lengths[symbol], 3);
  }
}

/// Code length code where 0, 1, 2, and 18 are the two bit codes 00, 01, 10,
/// and 11.
fn four_symbol_header(w: &mut BitWriter, hlit: u32, hdist: u32) {
  let mut cl = [0; 19];
  cl[0] = 2;
  cl[1] = 2;
  cl[2] = 2;
  cl[18] = 2;
  dynamic_header(w, hlit, hdist, &cl);
}

/// With `four_symbol_header`: a run of `count` zero lengths, 11 to 138.
fn push_zeros(w: &mut BitWriter, count: u32) {
  push_code(w, 0b11, 2);
  w.push(count - 11, 7);
}

#[test]
fn test_repeat_past_the_end_is_too_many_lengths() {
  let mut cl = [0; 19];
  cl[1] = 1;
  cl[18] = 1;
  let mut w = BitWriter::new();
  dynamic_header(&mut w, 257, 1, &cl);
  // 138 zeros fit in the 258 lengths, another 138 don't
  push_code(&mut w, 1, 1);
  w.push(127, 7);
  push_code(&mut w, 1, 1);
  w.push(127, 7);
  assert_eq!(inflate_size(&w.finish()), Err(InflateError::TooManyLengths));
}

#[test]
fn test_bad_dist_lengths() {
  // literal 0 and end of block get one bit each, which is complete
  fn with_dist_lengths(dist: &[u32]) -> Vec<u8> {
    let mut w = BitWriter::new();
    four_symbol_header(&mut w, 257, dist.len() as u32);
    push_code(&mut w, 0b01, 2);
    push_zeros(&mut w, 138);
    push_zeros(&mut w, 117);
    push_code(&mut w, 0b01, 2);
    for &len in dist {
      push_code(&mut w, len, 2);
    }
    w.finish()
  }
  // three one bit codes
  assert_eq!(inflate_size(&with_dist_lengths(&[1, 1, 1])), Err(InflateError::InvalidDistLengths));
  // two two bit codes, leaving half the code space unused
  assert_eq!(inflate_size(&with_dist_lengths(&[2, 2])), Err(InflateError::InvalidDistLengths));
}

#[test]
fn test_incomplete_lit_len_lengths() {
  // literal 0 and end of block get two bits each, so two patterns are unused
  let mut w = BitWriter::new();
  four_symbol_header(&mut w, 257, 1);
  push_code(&mut w, 0b10, 2);
  push_zeros(&mut w, 138);
  push_zeros(&mut w, 117);
  push_code(&mut w, 0b10, 2);
  push_code(&mut w, 0b01, 2);
  assert_eq!(inflate_size(&w.finish()), Err(InflateError::InvalidLitLenLengths));
}

#[test]
fn test_single_distance_code_is_allowed() {
  // Literals 0 and 1, end of block, and length 3 get the two bit codes 00,
  // 01, 10, and 11. The only distance code is distance 1, with a one bit code.
  let mut w = BitWriter::new();
  four_symbol_header(&mut w, 258, 1);
  push_code(&mut w, 0b10, 2);
  push_code(&mut w, 0b10, 2);
  push_zeros(&mut w, 138);
  push_zeros(&mut w, 116);
  push_code(&mut w, 0b10, 2);
  push_code(&mut w, 0b10, 2);
  push_code(&mut w, 0b01, 2);
  // literal 1, then copy 3 from distance 1, then end of block
  push_code(&mut w, 0b01, 2);
  push_code(&mut w, 0b11, 2);
  push_code(&mut w, 0, 1);
  push_code(&mut w, 0b10, 2);
  let stream = w.finish();
  let (out, used) = inflate_to_vec(&stream, None).unwrap();
  assert_eq!(out, [1, 1, 1, 1]);
  assert_eq!(used, stream.len());
}

#[test]
fn test_fixed_code_spare_symbols() {
  fn fixed_block(build: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.push(1, 1);
    w.push(1, 2);
    build(&mut w);
    w.push(0, 16);
    w.finish()
  }
  // literal/length symbols 286 and 287 are 11000110 and 11000111
  let s286 = fixed_block(|w| push_code(w, 0b1100_0110, 8));
  assert_eq!(inflate_size(&s286), Err(InflateError::InvalidSymbol));
  let s287 = fixed_block(|w| push_code(w, 0b1100_0111, 8));
  assert_eq!(inflate_size(&s287), Err(InflateError::InvalidSymbol));
  // length 3 (0000001), then distance patterns 30 and 31
  for pattern in [0b11110, 0b11111] {
    let stream = fixed_block(|w| {
      push_code(w, 0b000_0001, 7);
      push_code(w, pattern, 5);
    });
    assert_eq!(inflate_size(&stream), Err(InflateError::InvalidSymbol), "{pattern:05b}");
  }
}

#[test]
fn test_random_data_never_panics() {
  let mut out = vec![0_u8; 4096];
  for _ in 0..500 {
    let v = crate::rand_bytes(300);
    let _ = inflate_size(&v);
    let _ = inflate_to_slice(&v, &mut out);
    // dynamic blocks, so the header parsing gets exercised more
    let mut dynamic = v.clone();
    dynamic[0] = (dynamic[0] & !0b110) | 0b100;
    let _ = inflate_size(&dynamic);
    let _ = inflate_to_slice(&dynamic, &mut out[..16]);
  }
}

#[test]
fn test_error_codes() {
  assert_eq!(InflateError::InputExhausted.code(), 2);
  assert_eq!(InflateError::OutputExhausted.code(), 1);
  assert_eq!(InflateError::InvalidBlockType.code(), -1);
  assert_eq!(InflateError::DistanceTooFar.code(), -10);
  assert!(InflateError::OutputExhausted.is_retryable());
  assert!(InflateError::InvalidSymbol.is_corrupt());
}
