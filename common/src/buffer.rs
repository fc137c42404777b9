//! Fixed-capacity byte accumulators shared between execution contexts.
//!
//! Each buffer is guarded by one mutex covering the byte storage and the
//! fill level together, so no reader ever observes a torn pair. All
//! operations are try-style: a caller that finds the guard taken does
//! nothing and retries on its next scheduling pass.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::coding::LineCodingPair;

/// Byte capacity of every channel buffer in the firmware.
pub const BUFFER_CAPACITY: usize = 2560;

/// Storage and fill level, mutated only while the owning mutex is held.
struct Inner<const CAP: usize> {
    data: [u8; CAP],
    len: usize,
}

impl<const CAP: usize> Inner<CAP> {
    const fn new() -> Self {
        Self {
            data: [0; CAP],
            len: 0,
        }
    }

    fn append(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(CAP - self.len);
        self.data[self.len..self.len + n].copy_from_slice(&src[..n]);
        self.len += n;
        n
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len);
        self.data.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

/// One direction of a serial channel.
pub struct ChannelBuffer<M: RawMutex, const CAP: usize = BUFFER_CAPACITY> {
    inner: Mutex<M, Inner<CAP>>,
}

impl<M: RawMutex, const CAP: usize> ChannelBuffer<M, CAP> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Append as many of `src`'s bytes as fit. Returns the number
    /// accepted: fewer than offered when capacity runs out, zero when the
    /// guard is already taken.
    pub fn try_fill(&self, src: &[u8]) -> usize {
        match self.inner.try_lock() {
            Ok(mut inner) => inner.append(src),
            Err(_) => 0,
        }
    }

    /// Begin handing out pending bytes. Returns `None` when the guard is
    /// taken or nothing is buffered. Bytes leave the buffer only through
    /// [`Drain::consume`]; dropping the handle early keeps them all.
    pub fn try_drain(&self) -> Option<Drain<'_, M, CAP>> {
        match self.inner.try_lock() {
            Ok(inner) if inner.len > 0 => Some(Drain { inner }),
            _ => None,
        }
    }

    /// Bytes currently held, or `None` while the guard is taken.
    pub fn len(&self) -> Option<usize> {
        self.inner.try_lock().map(|inner| inner.len).ok()
    }

    /// Remaining capacity, or `None` while the guard is taken. Producers
    /// check this before requesting bytes from their source, so bytes
    /// that could not be stored are never requested at all.
    pub fn free(&self) -> Option<usize> {
        self.inner.try_lock().map(|inner| CAP - inner.len).ok()
    }
}

/// Exclusive drain access to a non-empty buffer.
///
/// The handle owns the guard and may be held across the consuming
/// transport's await; fill attempts on this buffer skip their pass in
/// the meantime, while the opposite direction proceeds untouched.
pub struct Drain<'a, M: RawMutex, const CAP: usize> {
    inner: MutexGuard<'a, M, Inner<CAP>>,
}

impl<M: RawMutex, const CAP: usize> Drain<'_, M, CAP> {
    /// The bytes available to the consumer, oldest first.
    pub fn pending(&self) -> &[u8] {
        &self.inner.data[..self.inner.len]
    }

    /// Remove exactly `n` bytes from the front; the unconsumed tail
    /// shifts down to offset zero.
    pub fn consume(&mut self, n: usize) {
        self.inner.consume(n);
    }
}

/// Per-interface channel record: one buffer per direction plus the line
/// coding pair. Lives in a static table for the process lifetime; a
/// buffer is "reset" only by being drained to empty.
pub struct SerialChannel<M: RawMutex> {
    /// Bytes waiting to go out to the USB host.
    pub to_host: ChannelBuffer<M, BUFFER_CAPACITY>,
    /// Bytes received from the USB host, waiting for the serial side.
    pub from_host: ChannelBuffer<M, BUFFER_CAPACITY>,
    /// Host-side and peripheral-side line coding.
    pub coding: LineCodingPair<M>,
}

impl<M: RawMutex> SerialChannel<M> {
    pub const fn new() -> Self {
        Self {
            to_host: ChannelBuffer::new(),
            from_host: ChannelBuffer::new(),
            coding: LineCodingPair::new(),
        }
    }
}
