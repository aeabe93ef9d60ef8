//! Validated alphabets and their selection masks
//!
//! An [`Alphabet`] is the ordered set of symbols identifiers are drawn
//! from. Each random byte is reduced with the alphabet's mask and the result
//! is either an index into the alphabet or rejected. The mask is the smallest
//! value of the form `2^k - 1` covering every index, so no more bits than
//! necessary are kept and no modulo bias is introduced.

use std::fmt;

use crate::{ConfigError, MAX_ALPHABET_SIZE};

/// Return the selection mask for an alphabet of `len` symbols.
///
/// The mask is `2^ceil(log2(len)) - 1`, the smallest all-ones value that is at
/// least `len - 1`. An alphabet of one symbol has mask zero.
///
/// # Panics
///
/// Function will panic if `len` is zero or greater than
/// [`MAX_ALPHABET_SIZE`]. [`Alphabet::new`] never calls it that way.
#[must_use]
#[inline]
pub fn mask_for_len(len: usize) -> u8 {
    assert!(
        (1..=MAX_ALPHABET_SIZE).contains(&len),
        "alphabet length {len} out of range"
    );
    // 256.next_power_of_two() - 1 == 255, every other result is smaller.
    u8::try_from(len.next_power_of_two() - 1).unwrap_or(u8::MAX)
}

/// An ordered, immutable set of symbols.
///
/// Symbols are `char`s. When every symbol is below U+0100 the alphabet also
/// carries a byte for each symbol, so identifiers can be written into byte
/// buffers. Repeated symbols are permitted and weight the output toward that
/// symbol.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Alphabet {
    text: Box<str>,
    symbols: Box<[char]>,
    bytes: Option<Box<[u8]>>,
    mask: u8,
}

#[allow(clippy::len_without_is_empty)]
impl Alphabet {
    /// Create a new `Alphabet` from the characters of `symbols`, deriving its
    /// mask.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAlphabet`] if `symbols` is empty and
    /// [`ConfigError::AlphabetTooLong`] if it holds more than
    /// [`MAX_ALPHABET_SIZE`] characters.
    pub fn new(symbols: &str) -> Result<Self, ConfigError> {
        let chars: Box<[char]> = symbols.chars().collect();
        Self::from_parts(symbols.into(), chars)
    }

    /// Create a new `Alphabet` whose symbols are the bytes of `symbols`.
    ///
    /// Byte `b` is the symbol `char::from(b)`, so identifiers written to a byte
    /// buffer reproduce `symbols` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAlphabet`] if `symbols` is empty and
    /// [`ConfigError::AlphabetTooLong`] if it holds more than
    /// [`MAX_ALPHABET_SIZE`] bytes.
    pub fn from_bytes(symbols: &[u8]) -> Result<Self, ConfigError> {
        let chars: Box<[char]> = symbols.iter().copied().map(char::from).collect();
        let text: String = chars.iter().collect();
        Self::from_parts(text.into(), chars)
    }

    fn from_parts(text: Box<str>, symbols: Box<[char]>) -> Result<Self, ConfigError> {
        let len = symbols.len();
        if len == 0 {
            return Err(ConfigError::EmptyAlphabet);
        }
        if len > MAX_ALPHABET_SIZE {
            return Err(ConfigError::AlphabetTooLong { len });
        }
        let bytes = symbols
            .iter()
            .map(|&symbol| u8::try_from(symbol).ok())
            .collect();

        Ok(Self {
            text,
            symbols,
            bytes,
            mask: mask_for_len(len),
        })
    }

    /// The number of symbols in the alphabet, never zero.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// The cached selection mask, see [`mask_for_len`].
    #[must_use]
    #[inline]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// The symbols, in order.
    #[must_use]
    #[inline]
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// One byte per symbol, in order. `None` when a symbol is U+0100 or above.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// The symbols as a string slice, in order.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `symbol` is one of the alphabet's symbols.
    #[must_use]
    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Map a random byte onto an index into the alphabet. Returns `None` when
    /// the masked byte falls outside the alphabet and must be rejected.
    #[inline]
    pub(crate) fn select(&self, random: u8) -> Option<usize> {
        let index = usize::from(random & self.mask);
        (index < self.symbols.len()).then_some(index)
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alphabet")
            .field("symbols", &self.as_str())
            .field("mask", &self.mask)
            .finish()
    }
}

impl TryFrom<&str> for Alphabet {
    type Error = ConfigError;

    fn try_from(symbols: &str) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl std::str::FromStr for Alphabet {
    type Err = ConfigError;

    fn from_str(symbols: &str) -> Result<Self, Self::Err> {
        Self::new(symbols)
    }
}

#[cfg(kani)]
mod verification {
    use super::mask_for_len;
    use crate::MAX_ALPHABET_SIZE;

    // The mask must cover every index of the alphabet and be no wider than
    // needed to do so.
    #[kani::proof]
    fn mask_is_minimal_cover() {
        let len: usize = kani::any();
        kani::assume(len >= 1 && len <= MAX_ALPHABET_SIZE);

        let mask = usize::from(mask_for_len(len));
        assert!(mask >= len - 1);
        assert!((mask + 1).is_power_of_two());
        assert!(mask < 2 * len);
        assert!(mask == 0 || (mask >> 1) < len - 1);
    }
}
