//! Short, URL-safe, unbiased random identifiers
//!
//! This library mints identifiers such as database keys or request IDs from a
//! cryptographically strong random source. Every symbol is drawn uniformly
//! from an alphabet of up to [`MAX_ALPHABET_SIZE`] symbols: random bytes are
//! masked down to the fewest bits that index the alphabet and out of range
//! values are rejected rather than reduced modulo the alphabet length.
//!
//! Alphabets are sequences of `char`s. Identifiers are returned as `String`s,
//! or written into caller buffers of `char`s or, when every symbol fits in a
//! byte, of bytes.
//!
//! The free functions in this module use a process-wide [`Generator`] with
//! the [`DEFAULT_ALPHABET`] and the operating system's random source. Build a
//! [`Generator`] with [`GeneratorBuilder`] to use another alphabet or source.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::module_name_repetitions)]

use std::io;

pub mod alphabet;
pub mod builder;
pub mod generator;
mod pool;
pub mod source;

pub use alphabet::Alphabet;
pub use builder::{Config, GeneratorBuilder};
pub use generator::Generator;
pub use pool::{MAX_IDLE, SCRATCH_SIZE};
pub use source::{OsError, OsSource, RandomSource, ReaderSource, RngSource};

/// The alphabet used when none is configured. It holds 64 URL-safe symbols:
/// digits, upper and lower case letters, `-` and `_`.
pub const DEFAULT_ALPHABET: &str =
    "ModuleSymbhasOwnPr-0123456789ABCDEFGHNRVfgctiUvz_KqYTJkLxpZXIjQW";

/// The maximum number of symbols in an alphabet.
pub const MAX_ALPHABET_SIZE: usize = 256;

/// The number of symbols in an identifier made by [`new_id`].
pub const DEFAULT_SIZE: usize = 21;

/// Errors produced while configuring a [`Generator`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The alphabet has no symbols.
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,
    /// The alphabet has more than [`MAX_ALPHABET_SIZE`] symbols.
    #[error("alphabet has {len} symbols, at most {max} are supported", max = MAX_ALPHABET_SIZE)]
    AlphabetTooLong {
        /// Number of symbols supplied.
        len: usize,
    },
    /// The random source was explicitly set to nothing.
    #[error("random source must be present")]
    MissingRandomSource,
}

/// Errors produced while generating identifiers. `E` is the error type of the
/// [`RandomSource`] in use.
#[derive(thiserror::Error, Debug)]
pub enum Error<E> {
    /// The output buffer has no room for a symbol.
    #[error("output buffer is empty")]
    EmptyBuffer,
    /// An identifier of zero symbols was requested.
    #[error("identifier size must be at least one")]
    ZeroSize,
    /// A byte buffer was supplied but the alphabet has a symbol at or above
    /// U+0100, which does not fit in a byte.
    #[error("alphabet symbols do not fit in a byte buffer")]
    WideAlphabet,
    /// The random source failed. Symbols written before the failure remain in
    /// the output buffer, the rest of it is unspecified.
    #[error("random source failed after {written} symbols were generated")]
    Source {
        /// Number of symbols written before the failure.
        written: usize,
        /// The random source's error, unchanged.
        #[source]
        source: E,
    },
}

impl<E> Error<E> {
    /// The number of symbols written to the output buffer before the error.
    #[must_use]
    pub fn written(&self) -> usize {
        match self {
            Error::EmptyBuffer | Error::ZeroSize | Error::WideAlphabet => 0,
            Error::Source { written, .. } => *written,
        }
    }
}

impl<E> From<Error<E>> for io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: Error<E>) -> Self {
        match err {
            Error::EmptyBuffer | Error::ZeroSize | Error::WideAlphabet => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            Error::Source { source, .. } => io::Error::other(source),
        }
    }
}

static DEFAULT_GENERATOR: Generator = Generator::new();

/// Fill `buf` with symbols from [`DEFAULT_ALPHABET`] and return the number of
/// symbols written, always `buf.len()` on success.
///
/// # Errors
///
/// Returns [`Error::EmptyBuffer`] if `buf` is empty, without reading any
/// randomness, and [`Error::Source`] if the operating system's random source
/// fails.
pub fn generate(buf: &mut [u8]) -> Result<usize, Error<OsError>> {
    DEFAULT_GENERATOR.generate(buf)
}

/// Return a new identifier of `size` symbols drawn from
/// [`DEFAULT_ALPHABET`].
///
/// # Errors
///
/// Returns [`Error::ZeroSize`] if `size` is zero and [`Error::Source`] if the
/// operating system's random source fails.
pub fn new_id_with_size(size: usize) -> Result<String, Error<OsError>> {
    DEFAULT_GENERATOR.new_id(size)
}

/// Return a new identifier of [`DEFAULT_SIZE`] symbols drawn from
/// [`DEFAULT_ALPHABET`].
///
/// # Errors
///
/// Returns [`Error::Source`] if the operating system's random source fails.
pub fn new_id() -> Result<String, Error<OsError>> {
    new_id_with_size(DEFAULT_SIZE)
}
