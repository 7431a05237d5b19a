//! Canonical Huffman codes, the way DEFLATE describes them.
//!
//! A canonical code is fully determined by the code length of each symbol, so
//! the table only has to store how many symbols use each length and the list
//! of symbols sorted by (length, symbol). Decoding then walks the lengths one
//! bit at a time.

use crate::{
  bit_reader::BitReader,
  error::{InflateError, InflateResult},
};

/// The longest code length that DEFLATE allows.
pub const MAX_BITS: usize = 15;

/// How a set of code lengths fills the code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodeStatus {
  /// Every bit pattern of the longest length decodes to some symbol.
  ///
  /// An all-zero set of lengths also reports as complete, but the resulting
  /// table can't decode anything.
  Complete,
  /// Some bit patterns are unassigned. `missing` counts the unused codes at
  /// the maximum length.
  Incomplete {
    /// unassigned codes at length 15
    missing: u32,
  },
  /// More codes were asked for than fit in the code space. Such a table must
  /// not be used.
  Oversubscribed,
}

/// Decoding data for one canonical Huffman code over up to `N` symbols.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HuffmanTable<const N: usize> {
  /// `count[len]` is the number of symbols with code length `len`.
  ///
  /// `count[0]` is the number of symbols that aren't used at all.
  count: [u16; MAX_BITS + 1],
  /// Used symbols, sorted by code length and then by symbol value.
  symbol: [u16; N],
}
impl<const N: usize> core::fmt::Debug for HuffmanTable<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let used = self.used_symbols();
    f.debug_struct("HuffmanTable")
      .field("count", &self.count)
      .field("symbol", &&self.symbol[..used.min(N)])
      .finish()
  }
}

impl<const N: usize> HuffmanTable<N> {
  /// Builds the table for the given code lengths, one per symbol.
  ///
  /// * A length of 0 means the symbol isn't used.
  /// * Lengths must be 15 or less, and there must be at most `N` of them.
  ///
  /// The status tells you if the code is usable. An `Oversubscribed` table is
  /// returned half-built and must not be used for decoding.
  #[must_use]
  pub const fn construct(lengths: &[u8]) -> (Self, CodeStatus) {
    assert!(lengths.len() <= N);
    let mut table = Self { count: [0; MAX_BITS + 1], symbol: [0; N] };

    // count the number of codes of each length
    let mut s = 0;
    while s < lengths.len() {
      let len = lengths[s] as usize;
      assert!(len <= MAX_BITS);
      table.count[len] += 1;
      s += 1;
    }
    if table.count[0] as usize == lengths.len() {
      // no codes at all. decoding with this table will always fail.
      return (table, CodeStatus::Complete);
    }

    // one possible code of zero length, and each extra bit doubles the
    // possibilities. If we ever use more than exist we're over-subscribed.
    let mut left: i32 = 1;
    let mut len = 1;
    while len <= MAX_BITS {
      left <<= 1;
      left -= table.count[len] as i32;
      if left < 0 {
        return (table, CodeStatus::Oversubscribed);
      }
      len += 1;
    }

    // offsets of the first symbol of each length within the sorted list
    let mut offsets = [0_u16; MAX_BITS + 1];
    let mut len = 1;
    while len < MAX_BITS {
      offsets[len + 1] = offsets[len] + table.count[len];
      len += 1;
    }

    // scatter symbols into their length buckets. Walking the symbols in order
    // keeps each bucket sorted by symbol value.
    let mut s = 0;
    while s < lengths.len() {
      let len = lengths[s] as usize;
      if len != 0 {
        table.symbol[offsets[len] as usize] = s as u16;
        offsets[len] += 1;
      }
      s += 1;
    }

    let status = if left == 0 {
      CodeStatus::Complete
    } else {
      CodeStatus::Incomplete { missing: left as u32 }
    };
    (table, status)
  }

  /// The number of symbols that have a code.
  #[inline]
  #[must_use]
  pub const fn used_symbols(&self) -> usize {
    let mut total = 0;
    let mut len = 1;
    while len <= MAX_BITS {
      total += self.count[len] as usize;
      len += 1;
    }
    total
  }

  /// Decodes one symbol from the bit stream.
  ///
  /// Huffman codes are stored starting with their most significant bit, the
  /// reverse of every other field in DEFLATE, so the code is accumulated one
  /// bit at a time by shifting left. Within one length the codes are
  /// consecutive integers starting at `first`, which lets us find the symbol
  /// with plain integer comparisons.
  ///
  /// ## Failure
  /// * `InvalidSymbol` if no symbol matches after 15 bits. This happens with
  ///   an incomplete code or an empty table.
  /// * `InputExhausted` if the stream runs out first.
  pub fn decode(&self, bits: &mut BitReader<'_>) -> InflateResult<u16> {
    let mut code: u32 = 0;
    let mut first: u32 = 0;
    let mut index: u32 = 0;
    for len in 1..=MAX_BITS {
      code |= bits.take_bits(1)?;
      let count = u32::from(self.count[len]);
      if code < first + count {
        return Ok(self.symbol[(index + (code - first)) as usize]);
      }
      index += count;
      first += count;
      first <<= 1;
      code <<= 1;
    }
    Err(InflateError::InvalidSymbol)
  }
}

#[test]
fn test_construct_small_example() {
  // The example from RFC 1951 section 3.2.2: lengths (3, 3, 3, 3, 3, 2, 4, 4)
  // give F=00, A=010, B=011, C=100, D=101, E=110, G=1110, H=1111.
  let (table, status) = HuffmanTable::<8>::construct(&[3, 3, 3, 3, 3, 2, 4, 4]);
  assert_eq!(status, CodeStatus::Complete);
  assert_eq!(table.used_symbols(), 8);
  assert_eq!(&table.symbol[..8], &[5, 0, 1, 2, 3, 4, 6, 7]);

  // "1110" is G (symbol 6): the code goes in most significant bit first, and
  // the reader hands out bits lowest first, so the byte is 0b0111.
  let mut br = BitReader::new(&[0b0000_0111]);
  assert_eq!(table.decode(&mut br), Ok(6));
  // "00" is F (symbol 5)
  let mut br = BitReader::new(&[0b0000_0000]);
  assert_eq!(table.decode(&mut br), Ok(5));
  // "010" is A: bits in stream order 0, 1, 0
  let mut br = BitReader::new(&[0b0000_0010]);
  assert_eq!(table.decode(&mut br), Ok(0));
}

#[test]
fn test_construct_oversubscribed() {
  // three codes of length 1 can't exist
  let (_, status) = HuffmanTable::<3>::construct(&[1, 1, 1]);
  assert_eq!(status, CodeStatus::Oversubscribed);
  let (_, status) = HuffmanTable::<5>::construct(&[2, 2, 2, 2, 1]);
  assert_eq!(status, CodeStatus::Oversubscribed);
}

#[test]
fn test_construct_incomplete_single_symbol() {
  let (table, status) = HuffmanTable::<4>::construct(&[0, 0, 1, 0]);
  assert_eq!(status, CodeStatus::Incomplete { missing: 1 << 14 });
  assert_eq!(table.used_symbols(), 1);
  // a 0 bit is the one valid code
  let mut br = BitReader::new(&[0b0]);
  assert_eq!(table.decode(&mut br), Ok(2));
  // a 1 bit leads nowhere, and fails after 15 bits
  let mut br = BitReader::new(&[0xFF, 0xFF]);
  assert_eq!(table.decode(&mut br), Err(InflateError::InvalidSymbol));
}

#[test]
fn test_construct_empty_table_cannot_decode() {
  let (table, status) = HuffmanTable::<4>::construct(&[0, 0, 0, 0]);
  assert_eq!(status, CodeStatus::Complete);
  assert_eq!(table.used_symbols(), 0);
  let mut br = BitReader::new(&[0, 0]);
  assert_eq!(table.decode(&mut br), Err(InflateError::InvalidSymbol));
  // and a short stream just runs out of input instead
  let mut br = BitReader::new(&[0]);
  assert_eq!(table.decode(&mut br), Err(InflateError::InputExhausted));
}
