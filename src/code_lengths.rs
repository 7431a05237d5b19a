use crate::{
  bit_reader::BitReader,
  error::{InflateError, InflateResult},
  huffman::{CodeStatus, HuffmanTable},
};

/// Most literal/length codes a dynamic block may declare.
pub const MAX_LIT_LEN_CODES: usize = 286;
/// Most distance codes a dynamic block may declare.
pub const MAX_DIST_CODES: usize = 30;
/// Literal/length symbols in the fixed code (two of them are never valid).
pub const FIXED_LIT_LEN_CODES: usize = 288;

const CODE_LENGTH_CODES: usize = 19;

/// The order that code length code lengths are stored in.
const CODE_LENGTH_ORDER: [usize; CODE_LENGTH_CODES] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

pub(crate) type LitLenTable = HuffmanTable<FIXED_LIT_LEN_CODES>;
pub(crate) type DistTable = HuffmanTable<MAX_DIST_CODES>;

/// Reads the code description at the start of a dynamic block.
///
/// This is the three counts, then the code length code, then the run-length
/// coded list of literal/length and distance code lengths. The two length
/// lists are read as one list, so runs may cross from one into the other.
pub(crate) fn read_dynamic_tables(
  bits: &mut BitReader<'_>,
) -> InflateResult<(LitLenTable, DistTable)> {
  let lit_len_count = bits.take_bits(5)? as usize + 257;
  let dist_count = bits.take_bits(5)? as usize + 1;
  let code_length_count = bits.take_bits(4)? as usize + 4;
  if lit_len_count > MAX_LIT_LEN_CODES || dist_count > MAX_DIST_CODES {
    return Err(InflateError::TooManyCodes);
  }

  let mut cl_lengths = [0_u8; CODE_LENGTH_CODES];
  for &slot in CODE_LENGTH_ORDER.iter().take(code_length_count) {
    cl_lengths[slot] = bits.take_bits(3)? as u8;
  }
  let (cl_table, status) = HuffmanTable::<CODE_LENGTH_CODES>::construct(&cl_lengths);
  if status != CodeStatus::Complete {
    return Err(InflateError::IncompleteCodeLengthCode);
  }

  let total = lit_len_count + dist_count;
  let mut lengths = [0_u8; MAX_LIT_LEN_CODES + MAX_DIST_CODES];
  let mut acquired = 0_usize;
  while acquired < total {
    let (value, repeat_count) = match cl_table.decode(bits)? {
      len @ 0..=15 => {
        lengths[acquired] = len as u8;
        acquired += 1;
        continue;
      }
      16 => {
        // repeat the previous length 3 to 6 times
        if acquired == 0 {
          return Err(InflateError::RepeatWithoutPrevious);
        }
        (lengths[acquired - 1], 3 + bits.take_bits(2)? as usize)
      }
      // repeat zero 3 to 10 times
      17 => (0, 3 + bits.take_bits(3)? as usize),
      // repeat zero 11 to 138 times
      _ => (0, 11 + bits.take_bits(7)? as usize),
    };
    if acquired + repeat_count > total {
      return Err(InflateError::TooManyLengths);
    }
    lengths[acquired..acquired + repeat_count].fill(value);
    acquired += repeat_count;
  }

  let (lit_len_lengths, dist_lengths) = lengths[..total].split_at(lit_len_count);
  let lit_len_table = build_checked(lit_len_lengths, InflateError::InvalidLitLenLengths)?;
  let dist_table = build_checked(dist_lengths, InflateError::InvalidDistLengths)?;
  log::trace!(
    "dynamic tables: {} lit/len codes, {} dist codes",
    lit_len_table.used_symbols(),
    dist_table.used_symbols()
  );
  Ok((lit_len_table, dist_table))
}

/// Incomplete codes are only allowed when exactly one symbol is used: a
/// single code still has to take one bit, leaving the other pattern unused.
fn build_checked<const N: usize>(
  lengths: &[u8], err: InflateError,
) -> InflateResult<HuffmanTable<N>> {
  let (table, status) = HuffmanTable::<N>::construct(lengths);
  match status {
    CodeStatus::Complete => Ok(table),
    CodeStatus::Incomplete { .. } if table.used_symbols() == 1 => Ok(table),
    _ => Err(err),
  }
}

#[test]
fn test_repeat_without_previous_is_rejected() {
  // HLIT=257, HDIST=1, HCLEN=4, so lengths are given for 16, 17, 18, 0.
  // Codes 16 and 17 get length 1, which makes 16 the code "0".
  let mut w = 0_u64;
  let mut n = 0;
  let mut push = |value: u64, count: u32| {
    w |= value << n;
    n += count;
  };
  push(0, 5);
  push(0, 5);
  push(0, 4);
  push(1, 3);
  push(1, 3);
  push(0, 3);
  push(0, 3);
  push(0, 1); // symbol 16
  let bytes = w.to_le_bytes();
  let mut br = BitReader::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut br).unwrap_err(), InflateError::RepeatWithoutPrevious);
}

#[test]
fn test_too_many_codes_is_rejected() {
  // HLIT = 30 + 257 = 287
  let mut br = BitReader::new(&[0b0001_1110, 0, 0, 0]);
  assert_eq!(read_dynamic_tables(&mut br).unwrap_err(), InflateError::TooManyCodes);
  // HDIST = 31 + 1 = 32
  let mut br = BitReader::new(&[0b1110_0000, 0b0000_0011, 0, 0]);
  assert_eq!(read_dynamic_tables(&mut br).unwrap_err(), InflateError::TooManyCodes);
}

#[test]
fn test_incomplete_code_length_code_is_rejected() {
  // HCLEN=4 with only code 16 given a length: one code of length 1.
  // bits 0..14 are the counts (all zero), then bits 14..17 = 001 for symbol 16
  let mut br = BitReader::new(&[0, 0b0100_0000, 0, 0, 0]);
  assert_eq!(read_dynamic_tables(&mut br).unwrap_err(), InflateError::IncompleteCodeLengthCode);
}
