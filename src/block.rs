//! Decoding of the three DEFLATE block types.

use crate::{
  bit_reader::BitReader,
  code_lengths::{read_dynamic_tables, DistTable, LitLenTable, FIXED_LIT_LEN_CODES, MAX_DIST_CODES},
  error::{InflateError, InflateResult},
  huffman::HuffmanTable,
  sink::OutputSink,
};

/// Base lengths for length symbols 257 through 285.
const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];
/// Extra bits for length symbols 257 through 285.
const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];
/// Base distances for distance symbols 0 through 29.
const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
  2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
/// Extra bits for distance symbols 0 through 29.
const DIST_EXTRA: [u8; 30] = [
  0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

const END_OF_BLOCK: u16 = 256;

const fn fixed_lit_len_lengths() -> [u8; FIXED_LIT_LEN_CODES] {
  let mut lengths = [0_u8; FIXED_LIT_LEN_CODES];
  let mut s = 0;
  while s < FIXED_LIT_LEN_CODES {
    lengths[s] = match s {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    s += 1;
  }
  lengths
}

/// The fixed literal/length code.
///
/// It's complete, but symbols 286 and 287 are never valid, so those are
/// rejected after decoding.
static FIXED_LIT_LEN: LitLenTable = HuffmanTable::construct(&fixed_lit_len_lengths()).0;

/// The fixed distance code.
///
/// All 30 symbols get 5 bits, which leaves two of the 32 patterns unused. That
/// makes it incomplete, so the unused patterns fail during decoding.
static FIXED_DIST: DistTable = HuffmanTable::construct(&[5; MAX_DIST_CODES]).0;

/// The kind of block, from the two `BTYPE` header bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockType {
  /// `00`: raw bytes
  Stored,
  /// `01`: compressed with the fixed codes
  Fixed,
  /// `10`: compressed with codes described at the start of the block
  Dynamic,
}
impl TryFrom<u32> for BlockType {
  type Error = InflateError;
  #[inline]
  fn try_from(btype: u32) -> Result<Self, Self::Error> {
    Ok(match btype {
      0 => Self::Stored,
      1 => Self::Fixed,
      2 => Self::Dynamic,
      _ => return Err(InflateError::InvalidBlockType),
    })
  }
}

/// The input and output state for decoding one stream.
#[derive(Debug)]
pub(crate) struct BlockDecoder<'b, 'o> {
  pub(crate) bits: BitReader<'b>,
  pub(crate) out: OutputSink<'o>,
}
impl<'b, 'o> BlockDecoder<'b, 'o> {
  pub(crate) fn new(compressed: &'b [u8], out: OutputSink<'o>) -> Self {
    Self { bits: BitReader::new(compressed), out }
  }

  /// Decodes the body of one block, after its 3 header bits.
  pub(crate) fn decode_block(&mut self, block_type: BlockType) -> InflateResult<()> {
    log::trace!(
      "{block_type:?} block at input byte {}, output byte {}",
      self.bits.bytes_consumed(),
      self.out.produced()
    );
    match block_type {
      BlockType::Stored => self.stored(),
      BlockType::Fixed => self.codes(&FIXED_LIT_LEN, &FIXED_DIST),
      BlockType::Dynamic => {
        let (lit_len, dist) = read_dynamic_tables(&mut self.bits)?;
        self.codes(&lit_len, &dist)
      }
    }
  }

  fn stored(&mut self) -> InflateResult<()> {
    self.bits.align_to_byte();
    let header = self.bits.take_aligned_bytes(4)?;
    let len = u16::from_le_bytes([header[0], header[1]]);
    let nlen = u16::from_le_bytes([header[2], header[3]]);
    if len != !nlen {
      return Err(InflateError::StoredLengthMismatch);
    }
    let data = self.bits.take_aligned_bytes(usize::from(len))?;
    self.out.push_slice(data)
  }

  /// Decodes literals and length/distance pairs up to the end-of-block code.
  fn codes(&mut self, lit_len: &LitLenTable, dist: &DistTable) -> InflateResult<()> {
    loop {
      let symbol = lit_len.decode(&mut self.bits)?;
      match symbol {
        0..=255 => self.out.push_byte(symbol as u8)?,
        END_OF_BLOCK => return Ok(()),
        _ => {
          let index = usize::from(symbol - 257);
          if index >= LENGTH_BASE.len() {
            // only reachable with the fixed code's two spare symbols
            return Err(InflateError::InvalidSymbol);
          }
          let length = usize::from(LENGTH_BASE[index])
            + self.bits.take_bits(u32::from(LENGTH_EXTRA[index]))? as usize;

          let dist_symbol = usize::from(dist.decode(&mut self.bits)?);
          if dist_symbol >= DIST_BASE.len() {
            return Err(InflateError::InvalidSymbol);
          }
          let distance = usize::from(DIST_BASE[dist_symbol])
            + self.bits.take_bits(u32::from(DIST_EXTRA[dist_symbol]))? as usize;

          self.out.copy_back(distance, length)?;
        }
      }
    }
  }
}

#[test]
fn test_fixed_tables_are_built() {
  use crate::huffman::CodeStatus;
  assert_eq!(FIXED_LIT_LEN.used_symbols(), 288);
  assert_eq!(FIXED_DIST.used_symbols(), 30);
  let (_, lit_status) = LitLenTable::construct(&fixed_lit_len_lengths());
  assert_eq!(lit_status, CodeStatus::Complete);
  let (_, dist_status) = HuffmanTable::<30>::construct(&[5; 30]);
  assert_eq!(dist_status, CodeStatus::Incomplete { missing: 2 << 10 });
}

#[test]
fn test_fixed_literal_codes() {
  // literal 0 is the 8 bit code 00110000, and it goes in msb first.
  let mut br = BitReader::new(&[0b0000_1100]);
  assert_eq!(FIXED_LIT_LEN.decode(&mut br), Ok(0));
  // end of block is seven 0 bits
  let mut br = BitReader::new(&[0]);
  assert_eq!(FIXED_LIT_LEN.decode(&mut br), Ok(256));
  // literal 255 is 111111111
  let mut br = BitReader::new(&[0xFF, 0x01]);
  assert_eq!(FIXED_LIT_LEN.decode(&mut br), Ok(255));
}

#[test]
fn test_block_type_from_bits() {
  assert_eq!(BlockType::try_from(0), Ok(BlockType::Stored));
  assert_eq!(BlockType::try_from(1), Ok(BlockType::Fixed));
  assert_eq!(BlockType::try_from(2), Ok(BlockType::Dynamic));
  assert_eq!(BlockType::try_from(3), Err(InflateError::InvalidBlockType));
}
