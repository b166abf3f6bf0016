//! An append-and-compact byte buffer (§3 "CompositeByteBuffer", §9 "Composite
//! byte buffer with compact").
//!
//! Grounded on the `compact`/underflow discipline the teacher crate's lexical
//! sub-parsers rely on (`quick_dtd::PiParser`/`QuotedParser` retain a small
//! amount of state across `feed` calls instead of buffering bytes themselves);
//! here that discipline is promoted to an explicit, reusable buffer type since
//! this crate must retain *all* undecoded bytes, not just a one-bit flag.
//!
//! Deliberately a `Vec<u8>`-backed contiguous buffer rather than a ring buffer:
//! the decoder needs a contiguous slice to hand to `encoding_rs`.

/// A byte buffer with two phases, `put` (write new bytes at the end) and
/// `flip`/read (consume bytes from the front), unified so that leftover
/// undecoded bytes from one `receive` call are available unchanged to the
/// next.
#[derive(Debug, Default)]
pub struct CompositeByteBuffer {
    data: Vec<u8>,
    /// Read cursor; bytes before this index have already been consumed.
    pos: usize,
}

impl CompositeByteBuffer {
    pub fn new() -> Self {
        CompositeByteBuffer { data: Vec::new(), pos: 0 }
    }

    /// Appends a new chunk of bytes received from the host.
    pub fn put(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Marks `n` bytes (from the start of [`Self::remaining`]) as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.data.len());
        self.pos += n;
    }

    /// Drops already-consumed bytes, shifting the unread suffix to the front.
    /// Must be called between `receive` calls so the buffer does not grow
    /// without bound.
    pub fn compact(&mut self) {
        if self.pos > 0 {
            self.data.drain(..self.pos);
            self.pos = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn put_then_remaining() {
        let mut buf = CompositeByteBuffer::new();
        buf.put(b"hello");
        assert_eq!(buf.remaining(), b"hello");
    }

    #[test]
    fn compact_preserves_unread_suffix() {
        let mut buf = CompositeByteBuffer::new();
        buf.put(b"hello world");
        buf.consume(6);
        assert_eq!(buf.remaining(), b"world");
        buf.compact();
        assert_eq!(buf.remaining(), b"world");
        buf.put(b"!");
        assert_eq!(buf.remaining(), b"world!");
    }

    #[test]
    fn compact_across_multiple_receives_retains_underflow() {
        let mut buf = CompositeByteBuffer::new();
        buf.put(&[0xE2, 0x82]); // incomplete 3-byte UTF-8 sequence (E2 82 AC = €)
        buf.compact();
        assert_eq!(buf.remaining(), &[0xE2, 0x82]);
        buf.put(&[0xAC]);
        assert_eq!(buf.remaining(), &[0xE2, 0x82, 0xAC]);
    }
}
