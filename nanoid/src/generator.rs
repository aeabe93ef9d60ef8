//! The identifier generator
//!
//! A [`Generator`] binds a random source to an optional [`Alphabet`]. With no
//! alphabet configured generation takes a fast path: the default alphabet has
//! exactly 64 symbols so every random byte masked with 63 is a valid index and
//! a single read of `buf.len()` bytes suffices. A custom alphabet instead
//! reads batches of random bytes into scratch space and keeps each masked byte
//! only if it indexes the alphabet.
//!
//! Identifiers are produced as a `String` by [`Generator::new_id`] or written
//! into caller buffers of `char`s or bytes.

use std::io;

use tracing::trace;

use crate::{
    Alphabet, ConfigError, DEFAULT_ALPHABET, DEFAULT_SIZE, Error,
    builder::{Config, GeneratorBuilder},
    pool::ScratchPool,
    source::{OsSource, RandomSource},
};

const DEFAULT_SYMBOLS: &[u8] = DEFAULT_ALPHABET.as_bytes();
const DEFAULT_MASK: u8 = 63;

// Batches are sized 1.6 times the expected number of draws per accepted
// symbol. Expressed as a ratio to keep the computation in integers.
const MARGIN_NUMERATOR: usize = 16;
const MARGIN_DENOMINATOR: usize = 10;

static SCRATCH: ScratchPool = ScratchPool::new();

/// Return the number of random bytes to draw per batch when generating `size`
/// symbols from `alphabet`.
///
/// A masked byte is accepted with probability `len / (mask + 1)`, so on
/// average `size * (mask + 1) / len` bytes are needed. The batch carries a
/// margin of 1.6 over that so one batch nearly always suffices. The result is
/// never smaller than `size`. Too small a batch costs an extra read, never
/// correctness.
#[must_use]
pub fn batch_size(alphabet: &Alphabet, size: usize) -> usize {
    let span = usize::from(alphabet.mask()) + 1;
    size.saturating_mul(MARGIN_NUMERATOR * span)
        .div_ceil(MARGIN_DENOMINATOR * alphabet.len())
        .max(1)
}

/// Generator of random identifiers.
///
/// A `Generator` holds only immutable configuration and its random source. It
/// may be shared between threads whenever the source may be.
#[derive(Debug, Clone)]
pub struct Generator<S = OsSource> {
    source: S,
    alphabet: Option<Alphabet>,
}

impl Generator<OsSource> {
    /// Create a new instance of `Generator` using the operating system's
    /// random source and [`DEFAULT_ALPHABET`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            source: OsSource,
            alphabet: None,
        }
    }

    /// Begin configuring a `Generator`, see [`GeneratorBuilder`].
    #[must_use]
    pub fn builder() -> GeneratorBuilder<OsSource> {
        GeneratorBuilder::new()
    }

    /// Create a new instance of `Generator` from `config` using the operating
    /// system's random source.
    ///
    /// # Errors
    ///
    /// See documentation in [`ConfigError`].
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        GeneratorBuilder::new().config(config).build()
    }
}

impl Default for Generator<OsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Generator<S> {
    pub(crate) fn from_parts(source: S, alphabet: Option<Alphabet>) -> Self {
        Self { source, alphabet }
    }

    /// Create a new instance of `Generator` from `config` drawing randomness
    /// from `source`.
    ///
    /// # Errors
    ///
    /// See documentation in [`ConfigError`]. Returns
    /// [`ConfigError::MissingRandomSource`] if `source` is `None`.
    pub fn from_config_with_source(
        config: &Config,
        source: Option<S>,
    ) -> Result<Self, ConfigError> {
        GeneratorBuilder::new()
            .config(config)
            .random_source(source)
            .build()
    }

    /// The configured alphabet, `None` when [`DEFAULT_ALPHABET`] is used.
    #[must_use]
    pub fn alphabet(&self) -> Option<&Alphabet> {
        self.alphabet.as_ref()
    }

    /// The symbols identifiers are drawn from.
    #[must_use]
    pub fn symbols(&self) -> &str {
        self.alphabet.as_ref().map_or(DEFAULT_ALPHABET, Alphabet::as_str)
    }

    /// The random source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S> Generator<S>
where
    S: RandomSource,
{
    /// Fill `buf` with random symbols and return the number written, always
    /// `buf.len()` on success.
    ///
    /// Each symbol is written as its single byte, see [`Alphabet::as_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBuffer`] if `buf` is empty and
    /// [`Error::WideAlphabet`] if a symbol does not fit in a byte, in both
    /// cases without reading from the random source. Returns [`Error::Source`]
    /// if the random source fails; generation stops at once and the error
    /// carries the number of symbols already written to the front of `buf`.
    pub fn generate(&self, buf: &mut [u8]) -> Result<usize, Error<S::Error>> {
        if buf.is_empty() {
            return Err(Error::EmptyBuffer);
        }

        let Some(alphabet) = &self.alphabet else {
            self.source
                .fill(buf)
                .map_err(|source| Error::Source { written: 0, source })?;
            for byte in buf.iter_mut() {
                *byte = DEFAULT_SYMBOLS[usize::from(*byte & DEFAULT_MASK)];
            }
            return Ok(buf.len());
        };
        let Some(table) = alphabet.as_bytes() else {
            return Err(Error::WideAlphabet);
        };

        self.sample(&SCRATCH, alphabet, buf.len(), |at, index| {
            buf[at] = table[index];
        })?;
        Ok(buf.len())
    }

    /// Fill `buf` with random symbols and return the number written, always
    /// `buf.len()` on success. Unlike [`Generator::generate`] this accepts
    /// every alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBuffer`] if `buf` is empty, without reading from
    /// the random source, and [`Error::Source`] if the random source fails.
    pub fn generate_chars(&self, buf: &mut [char]) -> Result<usize, Error<S::Error>> {
        if buf.is_empty() {
            return Err(Error::EmptyBuffer);
        }

        match &self.alphabet {
            None => self.sample_default(buf.len(), |at, symbol| {
                buf[at] = char::from(symbol);
            })?,
            Some(alphabet) => {
                let symbols = alphabet.symbols();
                self.sample(&SCRATCH, alphabet, buf.len(), |at, index| {
                    buf[at] = symbols[index];
                })?;
            }
        }
        Ok(buf.len())
    }

    /// Return a new identifier of `size` symbols.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroSize`] if `size` is zero and [`Error::Source`] if
    /// the random source fails.
    pub fn new_id(&self, size: usize) -> Result<String, Error<S::Error>> {
        if size == 0 {
            return Err(Error::ZeroSize);
        }

        let mut id = String::with_capacity(size);
        match &self.alphabet {
            None => self.sample_default(size, |_, symbol| id.push(char::from(symbol)))?,
            Some(alphabet) => {
                let symbols = alphabet.symbols();
                self.sample(&SCRATCH, alphabet, size, |_, index| {
                    id.push(symbols[index]);
                })?;
            }
        }
        Ok(id)
    }

    /// Return a new identifier of [`DEFAULT_SIZE`] symbols.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Source`] if the random source fails.
    pub fn new_id_default(&self) -> Result<String, Error<S::Error>> {
        self.new_id(DEFAULT_SIZE)
    }

    // One read of `size` bytes, each masked onto the 64 symbol default
    // alphabet. `emit` receives the output position and the symbol.
    fn sample_default<F>(&self, size: usize, mut emit: F) -> Result<(), Error<S::Error>>
    where
        F: FnMut(usize, u8),
    {
        let mut random = SCRATCH.acquire(size);
        self.source
            .fill(&mut random)
            .map_err(|source| Error::Source { written: 0, source })?;
        for (at, &byte) in random.iter().enumerate() {
            emit(at, DEFAULT_SYMBOLS[usize::from(byte & DEFAULT_MASK)]);
        }
        Ok(())
    }

    // Rejection sampling of `size` symbols from `alphabet`. `emit` receives the
    // output position and the index of the accepted symbol. The scratch
    // buffer goes back to `pool` on every return.
    fn sample<F>(
        &self,
        pool: &ScratchPool,
        alphabet: &Alphabet,
        size: usize,
        mut emit: F,
    ) -> Result<(), Error<S::Error>>
    where
        F: FnMut(usize, usize),
    {
        debug_assert!(size > 0);
        debug_assert!(usize::from(alphabet.mask()) + 1 >= alphabet.len());
        debug_assert!((usize::from(alphabet.mask()) + 1).is_power_of_two());

        let batch = batch_size(alphabet, size);
        let mut random = pool.acquire(batch);
        let mut written = 0;

        loop {
            self.source
                .fill(&mut random)
                .map_err(|source| Error::Source { written, source })?;

            for &byte in random.iter() {
                if let Some(index) = alphabet.select(byte) {
                    emit(written, index);
                    written += 1;
                    if written == size {
                        return Ok(());
                    }
                }
            }

            trace!(
                written,
                remaining = size - written,
                batch,
                "random batch exhausted, drawing another"
            );
        }
    }
}

/// Reading from a `Generator` fills the buffer with random symbols, see
/// [`Generator::generate`]. An empty buffer or an alphabet that does not fit
/// in bytes is an [`io::ErrorKind::InvalidInput`] error.
impl<S> io::Read for &Generator<S>
where
    S: RandomSource,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.generate(buf)?)
    }
}

impl<S> io::Read for Generator<S>
where
    S: RandomSource,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

#[cfg(kani)]
mod verification {
    use super::{MARGIN_DENOMINATOR, MARGIN_NUMERATOR};
    use crate::{MAX_ALPHABET_SIZE, alphabet::mask_for_len};

    // A batch must never be shorter than the identifier it serves.
    #[kani::proof]
    fn batch_covers_size() {
        let len: usize = kani::any();
        let size: usize = kani::any();
        kani::assume(len >= 1 && len <= MAX_ALPHABET_SIZE);
        kani::assume(size >= 1 && size <= 1 << 20);

        let span = usize::from(mask_for_len(len)) + 1;
        let batch = (size * MARGIN_NUMERATOR * span).div_ceil(MARGIN_DENOMINATOR * len);
        assert!(batch >= size);
    }
}
