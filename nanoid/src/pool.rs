//! Scratch buffer pool
//!
//! Generation with a custom alphabet needs a scratch buffer of random bytes
//! for every call. Batches no larger than [`SCRATCH_SIZE`] are served from a
//! process-wide pool of fixed-size buffers to avoid a heap allocation per
//! identifier. Larger batches are allocated fresh and dropped afterwards.

use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, PoisonError},
};

/// Size in bytes of each pooled scratch buffer. Custom alphabets with
/// identifiers of up to roughly 72 symbols stay within this size.
pub const SCRATCH_SIZE: usize = 128;

/// Maximum number of idle buffers retained by a pool. Buffers released while
/// the pool is full are freed.
pub const MAX_IDLE: usize = 64;

type Block = Box<[u8; SCRATCH_SIZE]>;

/// A bounded, thread-safe pool of [`SCRATCH_SIZE`] byte buffers.
#[derive(Debug)]
pub(crate) struct ScratchPool {
    idle: Mutex<Vec<Block>>,
}

impl ScratchPool {
    pub(crate) const fn new() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Acquire a scratch buffer of exactly `len` bytes.
    ///
    /// The buffer comes from the pool when `len` is at most [`SCRATCH_SIZE`]
    /// and is returned to it when the `Scratch` is dropped. Contents are
    /// unspecified.
    pub(crate) fn acquire(&self, len: usize) -> Scratch<'_> {
        if len > SCRATCH_SIZE {
            return Scratch::Owned(vec![0; len]);
        }

        let block = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| Box::new([0; SCRATCH_SIZE]));

        Scratch::Pooled {
            pool: self,
            block: Some(block),
            len,
        }
    }

    fn release(&self, block: Block) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE {
            idle.push(block);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A scratch buffer on loan from a [`ScratchPool`], or owned outright when
/// too large to pool.
#[derive(Debug)]
pub(crate) enum Scratch<'a> {
    Pooled {
        pool: &'a ScratchPool,
        // Always `Some` until dropped.
        block: Option<Block>,
        len: usize,
    },
    Owned(Vec<u8>),
}

impl Deref for Scratch<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Scratch::Pooled { block, len, .. } => block
                .as_deref()
                .map_or_else(Default::default, |block| &block[..*len]),
            Scratch::Owned(buf) => buf,
        }
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Scratch::Pooled { block, len, .. } => block
                .as_deref_mut()
                .map_or_else(Default::default, |block| &mut block[..*len]),
            Scratch::Owned(buf) => buf,
        }
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        if let Scratch::Pooled { pool, block, .. } = self {
            if let Some(block) = block.take() {
                pool.release(block);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RandomSource, ReaderSource};
    use std::io::Cursor;

    #[test]
    fn small_requests_are_pooled() {
        let pool = ScratchPool::new();
        {
            let mut scratch = pool.acquire(34);
            assert_eq!(scratch.len(), 34);
            assert!(matches!(scratch, Scratch::Pooled { .. }));
            scratch.fill(0xAA);
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);

        // The released buffer is handed out again rather than a new one.
        let scratch = pool.acquire(SCRATCH_SIZE);
        assert_eq!(scratch.len(), SCRATCH_SIZE);
        assert_eq!(pool.idle(), 0);
        drop(scratch);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn loans_return_on_error_paths() {
        fn fill_from<S: RandomSource>(
            pool: &ScratchPool,
            source: &S,
            len: usize,
        ) -> Result<u8, S::Error> {
            let mut scratch = pool.acquire(len);
            source.fill(&mut scratch)?;
            Ok(scratch[0])
        }

        let pool = ScratchPool::new();
        let short = ReaderSource::new(Cursor::new(vec![9u8; 10]));
        assert_eq!(fill_from(&pool, &short, 8).expect("enough bytes"), 9);
        assert_eq!(pool.idle(), 1);

        // Two bytes remain, the fill fails and the loan is still released.
        assert!(fill_from(&pool, &short, 8).is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn large_requests_are_owned() {
        let pool = ScratchPool::new();
        let scratch = pool.acquire(SCRATCH_SIZE + 1);
        assert_eq!(scratch.len(), SCRATCH_SIZE + 1);
        assert!(matches!(scratch, Scratch::Owned(_)));
        drop(scratch);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn idle_buffers_are_bounded() {
        let pool = ScratchPool::new();
        let loans: Vec<_> = (0..MAX_IDLE + 8).map(|_| pool.acquire(16)).collect();
        drop(loans);
        assert_eq!(pool.idle(), MAX_IDLE);
    }

    #[test]
    fn concurrent_loans_are_released() {
        let pool = ScratchPool::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for i in 0..1_000 {
                        let mut scratch = pool.acquire(1 + i % SCRATCH_SIZE);
                        scratch[0] = 1;
                    }
                });
            }
        });
        assert!(pool.idle() >= 1);
        assert!(pool.idle() <= 8);
    }
}
