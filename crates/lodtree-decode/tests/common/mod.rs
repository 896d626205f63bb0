//! Byte-level fixture builder shared by the integration tests.

#![allow(dead_code)]

/// Little-endian buffer with placeholders that can be patched once the
/// target position is known.
#[derive(Debug, Default)]
pub struct Fixture {
    bytes: Vec<u8>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    pub fn i32s(&mut self, values: &[i32]) -> &mut Self {
        for v in values {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        for v in values {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Reserve a word to patch later; returns its position.
    pub fn placeholder(&mut self) -> usize {
        let at = self.position();
        self.i32s(&[0]);
        at
    }

    pub fn patch(&mut self, at: usize, value: i32) {
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Patch `at` with the offset of the current position from `anchor`.
    pub fn point_here(&mut self, at: usize, anchor: usize) {
        let value = self.position() as i32 - anchor as i32;
        self.patch(at, value);
    }

    /// Tree header with the given kind tags.
    pub fn header(&mut self, tags: &[i32]) -> &mut Self {
        self.i32s(&[tags.len() as i32]).i32s(tags)
    }

    /// Root node with every list empty. Returns `(node position, subtree
    /// placeholder)`; the placeholder holds `-1` until patched.
    pub fn empty_root(&mut self, sibling: i32) -> (usize, usize) {
        let at = self.position();
        self.i32s(&[0, sibling, -1, 0, 0, -1, -1, 0]);
        let subtree = self.placeholder();
        self.patch(subtree, -1);
        self.i32s(&[-1, 0, 0]);
        (at, subtree)
    }

    /// Generic node. Returns `(node position, sibling placeholder)`.
    pub fn generic(&mut self, sibling: i32) -> (usize, usize) {
        let at = self.position();
        self.i32s(&[0]);
        let slot = self.placeholder();
        self.patch(slot, sibling);
        (at, slot)
    }

    pub fn pad(&mut self, len: usize) -> &mut Self {
        self.bytes.resize(self.bytes.len() + len, 0);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
