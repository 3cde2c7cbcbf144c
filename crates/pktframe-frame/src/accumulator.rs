use bytes::{Buf, Bytes, BytesMut};

/// Bytes received but not yet classified into a packet.
///
/// Always holds exactly the unconsumed suffix of everything appended so far,
/// in arrival order. The accumulator enforces no size limit; the state
/// machine decides how much it is willing to wait for.
#[derive(Debug, Default)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append raw bytes to the end of the buffer.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// The first `n` bytes, or `None` when fewer are buffered yet.
    pub fn peek(&self, n: usize) -> Option<&[u8]> {
        self.buf.get(..n)
    }

    /// Remove and return the first `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are buffered. Callers check with
    /// [`Accumulator::peek`] or [`Accumulator::len`] first.
    pub fn consume(&mut self, n: usize) -> Bytes {
        assert!(
            n <= self.buf.len(),
            "consume({n}) with only {} bytes buffered",
            self.buf.len()
        );
        self.buf.split_to(n).freeze()
    }

    /// Drop the first `n` bytes.
    ///
    /// # Panics
    ///
    /// Same precondition as [`Accumulator::consume`].
    pub fn skip(&mut self, n: usize) {
        assert!(
            n <= self.buf.len(),
            "skip({n}) with only {} bytes buffered",
            self.buf.len()
        );
        self.buf.advance(n);
    }

    /// Current byte count.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Give the underlying buffer back.
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}

impl From<BytesMut> for Accumulator {
    fn from(buf: BytesMut) -> Self {
        Self { buf }
    }
}
