//! Node-kind tags and the per-tree type stream.
//!
//! Each tree starts with a node count followed by one kind tag per node, in
//! the pre-order the node payloads are visited. A single [`TypeCursor`]
//! hands those tags out across every recursive descent of one tree.

use std::fmt;

use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// The 18 node kinds, keyed by their on-disk tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum NodeKind {
    Generic = 0,
    SubTree = 1,
    Root = 2,
    Slot = 3,
    DegreeOfFreedom = 4,
    Switch = 5,
    Splitter = 6,
    Primitive = 7,
    LitPrimitive = 8,
    CulledPrimitive = 9,
    SpecialTransform = 10,
    LightString = 11,
    Translate = 12,
    Scale = 13,
    ExtendedDof = 14,
    ExtendedSwitch = 15,
    RenderControl = 16,
    Culled = 17,
}

impl NodeKind {
    /// Every kind in tag order.
    pub const ALL: [Self; crate::NODE_KIND_COUNT] = [
        Self::Generic,
        Self::SubTree,
        Self::Root,
        Self::Slot,
        Self::DegreeOfFreedom,
        Self::Switch,
        Self::Splitter,
        Self::Primitive,
        Self::LitPrimitive,
        Self::CulledPrimitive,
        Self::SpecialTransform,
        Self::LightString,
        Self::Translate,
        Self::Scale,
        Self::ExtendedDof,
        Self::ExtendedSwitch,
        Self::RenderControl,
        Self::Culled,
    ];

    /// The on-disk tag.
    #[must_use]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Display name used by text dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::SubTree => "SubTree",
            Self::Root => "Root",
            Self::Slot => "Slot",
            Self::DegreeOfFreedom => "DOF",
            Self::Switch => "Switch",
            Self::Splitter => "Splitter",
            Self::Primitive => "Primitive",
            Self::LitPrimitive => "LitPrimitive",
            Self::CulledPrimitive => "CulledPrimitive",
            Self::SpecialTransform => "SpecialTransform",
            Self::LightString => "LightString",
            Self::Translate => "Translate",
            Self::Scale => "Scale",
            Self::ExtendedDof => "XDOF",
            Self::ExtendedSwitch => "XSwitch",
            Self::RenderControl => "RenderControl",
            Self::Culled => "Culled",
        }
    }
}

impl TryFrom<i32> for NodeKind {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        usize::try_from(tag)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(tag)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pre-order kind tags of one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeStream {
    pub tags: Vec<i32>,
}

impl TypeStream {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// A fresh cursor at the first tag.
    #[must_use]
    pub fn cursor(&self) -> TypeCursor<'_> {
        TypeCursor {
            tags: &self.tags,
            index: 0,
        }
    }
}

/// Read a tree header: a node count and that many kind tags.
///
/// Returns the tags and the position right after them, where the first
/// node's bytes begin.
///
/// # Example
///
/// ```
/// use lodtree_decode::read_count_and_tags;
///
/// let mut bytes = Vec::new();
/// for word in [2i32, 2, 7] {
///     bytes.extend_from_slice(&word.to_le_bytes());
/// }
/// let (stream, next) = read_count_and_tags(&bytes, 0).unwrap();
/// assert_eq!(stream.tags, vec![2, 7]);
/// assert_eq!(next, 12);
/// ```
pub fn read_count_and_tags(buffer: &[u8], pos: usize) -> DecodeResult<(TypeStream, u64)> {
    let mut reader = ByteReader::new(buffer);
    reader.seek(pos as u64);
    let stream = read_tags(&mut reader)?;
    Ok((stream, reader.position()))
}

pub(crate) fn read_tags(reader: &mut ByteReader<'_>) -> DecodeResult<TypeStream> {
    let count = reader.count("node count")?;
    reader.require("node tags", (count as u64).saturating_mul(4))?;
    let mut tags = Vec::with_capacity(count);
    for _ in 0..count {
        tags.push(reader.i32("node tag")?);
    }
    Ok(TypeStream { tags })
}

/// Shared position in a tree's [`TypeStream`].
///
/// Advances by exactly one per decoded node. One cursor is threaded by
/// reference through every recursive walk of a tree.
#[derive(Debug)]
pub struct TypeCursor<'a> {
    tags: &'a [i32],
    index: usize,
}

impl TypeCursor<'_> {
    /// Take the next tag.
    pub fn next_tag(&mut self) -> DecodeResult<i32> {
        let tag = self
            .tags
            .get(self.index)
            .copied()
            .ok_or(DecodeError::TypeStreamExhausted {
                count: self.tags.len(),
            })?;
        self.index += 1;
        Ok(tag)
    }

    /// Number of tags handed out so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.index
    }

    /// Number of tags not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tags.len() - self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_maps_back_to_its_kind() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::try_from(kind.tag()), Ok(kind));
        }
        assert_eq!(NodeKind::try_from(18), Err(18));
        assert_eq!(NodeKind::try_from(-1), Err(-1));
    }

    #[test]
    fn header_with_missing_tags_is_truncated() {
        let bytes: Vec<u8> = [3i32, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let err = read_count_and_tags(&bytes, 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                field: "node tags",
                position: 4,
                needed: 12,
                available: 4,
            }
        );
    }

    #[test]
    fn negative_node_count_is_invalid() {
        let bytes = (-1i32).to_le_bytes();
        assert!(matches!(
            read_count_and_tags(&bytes, 0),
            Err(DecodeError::InvalidCount { count: -1, .. })
        ));
    }

    #[test]
    fn cursor_is_exhausted_after_last_tag() {
        let stream = TypeStream { tags: vec![2, 0] };
        let mut cursor = stream.cursor();
        assert_eq!(cursor.next_tag(), Ok(2));
        assert_eq!(cursor.next_tag(), Ok(0));
        assert_eq!(cursor.consumed(), 2);
        assert_eq!(
            cursor.next_tag(),
            Err(DecodeError::TypeStreamExhausted { count: 2 })
        );
        assert_eq!(cursor.remaining(), 0);
    }
}
