//! Fixed-length packed boolean vectors.
//!
//! Every sample set in the search (rule truth tables, label columns, the
//! not-yet-captured samples of a prefix) is a [`BitVec`] of the same length.
//! Support counting over `n` samples is then `n / 64` word operations and
//! a population count per word.

use std::fmt;

/// A boolean vector of fixed length, backed by `u64` words.
///
/// The length is chosen at creation and never changes. Bits past the length
/// inside the last word are always kept clear, so word-wise `count_ones` and
/// equality are exact.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitVec {
    /// Storage: each u64 holds 64 bits
    words: Vec<u64>,
    /// Number of logical bits
    len: usize,
}

impl BitVec {
    /// Number of bits per word.
    const BITS_PER_WORD: usize = 64;

    fn num_words(len: usize) -> usize {
        (len + Self::BITS_PER_WORD - 1) / Self::BITS_PER_WORD
    }

    /// Gets the word index and bit position for a given bit index.
    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        let word = index / Self::BITS_PER_WORD;
        let bit = index % Self::BITS_PER_WORD;
        (word, bit)
    }

    /// Creates a vector of `len` clear bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; Self::num_words(len)],
            len,
        }
    }

    /// Creates a vector of `len` set bits.
    pub fn ones(len: usize) -> Self {
        let mut v = Self {
            words: vec![u64::MAX; Self::num_words(len)],
            len,
        };
        v.clear_tail();
        v
    }

    /// Creates a vector from a sequence of booleans.
    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut words = Vec::new();
        let mut len = 0;
        for bit in bits {
            let (word_idx, bit_idx) = Self::word_and_bit(len);
            if word_idx == words.len() {
                words.push(0);
            }
            if bit {
                words[word_idx] |= 1u64 << bit_idx;
            }
            len += 1;
        }
        Self { words, len }
    }

    /// Keeps the bits past `len` clear.
    fn clear_tail(&mut self) {
        let rem = self.len % Self::BITS_PER_WORD;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    /// Returns the number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the value of the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "Bit index {} out of range 0..{}", index, self.len);
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        (self.words[word_idx] >> bit_idx) & 1 == 1
    }

    /// Sets the bit at `index` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len, "Bit index {} out of range 0..{}", index, self.len);
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        if value {
            self.words[word_idx] |= mask;
        } else {
            self.words[word_idx] &= !mask;
        }
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if any bit is set.
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    fn check_len(&self, other: &BitVec) {
        assert_eq!(
            self.len, other.len,
            "Bit vector length mismatch: {} vs {}",
            self.len, other.len
        );
    }

    /// Returns `self AND other`.
    pub fn and(&self, other: &BitVec) -> BitVec {
        self.check_len(other);
        let words = self.words.iter().zip(&other.words).map(|(a, b)| a & b).collect();
        BitVec { words, len: self.len }
    }

    /// Returns `self AND NOT other`.
    pub fn and_not(&self, other: &BitVec) -> BitVec {
        self.check_len(other);
        let words = self.words.iter().zip(&other.words).map(|(a, b)| a & !b).collect();
        BitVec { words, len: self.len }
    }

    /// Returns `self OR other`.
    pub fn or(&self, other: &BitVec) -> BitVec {
        self.check_len(other);
        let words = self.words.iter().zip(&other.words).map(|(a, b)| a | b).collect();
        BitVec { words, len: self.len }
    }

    /// Returns `NOT self`.
    pub fn not(&self) -> BitVec {
        let mut v = BitVec {
            words: self.words.iter().map(|w| !w).collect(),
            len: self.len,
        };
        v.clear_tail();
        v
    }

    /// In-place `self &= other`.
    pub fn and_assign(&mut self, other: &BitVec) {
        self.check_len(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    /// In-place `self |= other`.
    pub fn or_assign(&mut self, other: &BitVec) {
        self.check_len(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Population count of `self AND other`, without allocating.
    #[inline]
    pub fn count_and(&self, other: &BitVec) -> usize {
        self.check_len(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Heap bytes held by the vector.
    pub fn heap_size(&self) -> usize {
        self.words.capacity() * std::mem::size_of::<u64>()
    }

    /// Returns an iterator over all set bit indices.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            bits: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Returns an iterator over all bits, in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec(")?;
        for bit in self.iter() {
            write!(f, "{}", if bit { '1' } else { '0' })?;
        }
        write!(f, ")")
    }
}

/// Iterator over set bits in a [`BitVec`].
pub struct Ones<'a> {
    bits: &'a BitVec,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit_idx = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * BitVec::BITS_PER_WORD + bit_idx);
            }

            self.word_idx += 1;
            if self.word_idx >= self.bits.words.len() {
                return None;
            }
            self.current_word = self.bits.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_zeros_ones() {
        let z = BitVec::zeros(70);
        assert_eq!(z.len(), 70);
        assert_eq!(z.count_ones(), 0);
        assert!(!z.any());

        let o = BitVec::ones(70);
        assert_eq!(o.count_ones(), 70);
        assert!(o.get(69));
    }

    #[test]
    fn test_empty() {
        let v = BitVec::zeros(0);
        assert!(v.is_empty());
        assert_eq!(v.not().count_ones(), 0);
        assert_eq!(v.iter_ones().count(), 0);
    }

    #[test]
    fn test_set_get() {
        let mut v = BitVec::zeros(100);
        v.set(42, true);
        assert!(v.get(42));
        assert!(!v.get(41));
        v.set(42, false);
        assert!(!v.get(42));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range() {
        BitVec::zeros(10).get(10);
    }

    #[test]
    fn test_not_keeps_tail_clear() {
        let v = BitVec::from_bools([true, false, true]);
        let n = v.not();
        assert_eq!(n.count_ones(), 1);
        assert!(n.get(1));
        assert_eq!(n.not(), v);
    }

    #[test]
    fn test_and_or_and_not() {
        let a = BitVec::from_bools([true, true, false, false]);
        let b = BitVec::from_bools([true, false, true, false]);
        assert_eq!(a.and(&b), BitVec::from_bools([true, false, false, false]));
        assert_eq!(a.or(&b), BitVec::from_bools([true, true, true, false]));
        assert_eq!(a.and_not(&b), BitVec::from_bools([false, true, false, false]));
        assert_eq!(a.count_and(&b), 1);
    }

    #[test]
    fn test_assign_ops() {
        let mut a = BitVec::from_bools([true, true, false]);
        a.and_assign(&BitVec::from_bools([false, true, true]));
        assert_eq!(a, BitVec::from_bools([false, true, false]));
        a.or_assign(&BitVec::from_bools([true, false, false]));
        assert_eq!(a, BitVec::from_bools([true, true, false]));
    }

    #[test]
    fn test_iter_ones_across_words() {
        let mut v = BitVec::zeros(130);
        for i in [3, 5, 64, 65, 129] {
            v.set(i, true);
        }
        let ones: Vec<_> = v.iter_ones().collect();
        assert_eq!(ones, vec![3, 5, 64, 65, 129]);
        assert_eq!(v.count_ones(), 5);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_length_mismatch_panics() {
        BitVec::zeros(3).and(&BitVec::zeros(4));
    }

    #[test]
    fn test_debug() {
        let v = BitVec::from_bools([true, false, true]);
        assert_eq!(format!("{:?}", v), "BitVec(101)");
    }
}
