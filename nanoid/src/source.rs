//! Random byte sources
//!
//! A [`Generator`](crate::Generator) draws all of its randomness through the
//! [`RandomSource`] trait. A fill either delivers every requested byte or
//! fails, there are no partial fills. The default source is the operating
//! system's cryptographic generator.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rand::{TryRngCore, rngs::OsRng};

/// Error produced by [`OsSource`].
pub type OsError = <OsRng as TryRngCore>::Error;

/// A provider of uniformly distributed random bytes.
///
/// Sources take `&self` so that a single generator can be shared by many
/// threads. Implementations with mutable state must synchronize internally.
pub trait RandomSource {
    /// The error produced when the source cannot supply bytes.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fill all of `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` could not be completely filled. The contents
    /// of `dest` are unspecified in that case.
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error>;
}

impl<S> RandomSource for &S
where
    S: RandomSource + ?Sized,
{
    type Error = S::Error;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        (**self).fill(dest)
    }
}

impl<S> RandomSource for Box<S>
where
    S: RandomSource + ?Sized,
{
    type Error = S::Error;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        (**self).fill(dest)
    }
}

impl<S> RandomSource for Arc<S>
where
    S: RandomSource + ?Sized,
{
    type Error = S::Error;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        (**self).fill(dest)
    }
}

/// The operating system's cryptographically secure random number generator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OsSource;

impl RandomSource for OsSource {
    type Error = OsError;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

// The guarded values are byte streams with no invariant a panicking holder
// could have broken, a poisoned lock is taken over as is.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Adapts any [`TryRngCore`] into a [`RandomSource`].
///
/// Every infallible `RngCore` is also a `TryRngCore`, so seeded generators
/// such as `StdRng` can be used to make output reproducible.
#[derive(Debug, Default)]
pub struct RngSource<R> {
    inner: Mutex<R>,
}

impl<R> RngSource<R> {
    /// Create a new instance of `RngSource` wrapping `rng`.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// Recover the wrapped generator.
    pub fn into_inner(self) -> R {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R> RandomSource for RngSource<R>
where
    R: TryRngCore,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    type Error = R::Error;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        lock(&self.inner).try_fill_bytes(dest)
    }
}

/// Adapts any [`io::Read`] into a [`RandomSource`].
///
/// Fills use `read_exact`, a reader that ends before delivering every
/// requested byte fails the fill with [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug, Default)]
pub struct ReaderSource<R> {
    inner: Mutex<R>,
}

impl<R> ReaderSource<R> {
    /// Create a new instance of `ReaderSource` wrapping `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            inner: Mutex::new(reader),
        }
    }

    /// Recover the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R> RandomSource for ReaderSource<R>
where
    R: io::Read,
{
    type Error = io::Error;

    #[inline]
    fn fill(&self, dest: &mut [u8]) -> Result<(), Self::Error> {
        lock(&self.inner).read_exact(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::io::Cursor;

    #[test]
    fn os_source_fills() {
        // 64 zero bytes from a working OS generator has probability 2^-512.
        let mut buf = [0u8; 64];
        OsSource.fill(&mut buf).expect("os randomness available");
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn rng_source_is_reproducible() {
        let a = RngSource::new(StdRng::seed_from_u64(19_690_716));
        let b = RngSource::new(StdRng::seed_from_u64(19_690_716));

        let mut left = [0u8; 128];
        let mut right = [0u8; 128];
        a.fill(&mut left).expect("infallible");
        b.fill(&mut right).expect("infallible");
        assert_eq!(left, right);

        a.fill(&mut left).expect("infallible");
        assert_ne!(left, right);
    }

    #[test]
    fn reader_source_streams_in_order() {
        let source = ReaderSource::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut buf = [0u8; 2];
        source.fill(&mut buf).expect("enough bytes");
        assert_eq!(buf, [1, 2]);
        source.fill(&mut buf).expect("enough bytes");
        assert_eq!(buf, [3, 4]);
    }

    #[test]
    fn reader_source_short_read_fails() {
        let source = ReaderSource::new(Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 4];
        let err = source.fill(&mut buf).expect_err("short read");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn shared_sources_delegate() {
        let source = Arc::new(ReaderSource::new(Cursor::new(vec![7u8, 8])));
        let by_ref = &source;
        let mut buf = [0u8; 1];
        by_ref.fill(&mut buf).expect("enough bytes");
        assert_eq!(buf, [7]);
        Box::new(Arc::clone(&source))
            .fill(&mut buf)
            .expect("enough bytes");
        assert_eq!(buf, [8]);
    }
}
