//! Root-relative offset resolution.
//!
//! Every pointer stored in a LOD tree is a signed 32-bit offset from the
//! tree's anchor (the byte position of its Root node). The single sentinel
//! `-1` marks an absent link; every other value, `0` included, is added to
//! the anchor.

use crate::error::{DecodeError, DecodeResult};

/// Raw offset value marking an absent link.
pub const SENTINEL: i32 = -1;

/// Resolve a raw offset against `anchor`.
///
/// Returns `None` only for [`SENTINEL`].
///
/// # Example
///
/// ```
/// use lodtree_decode::resolve;
///
/// assert_eq!(resolve(-1, 100), None);
/// assert_eq!(resolve(0, 100), Some(100));
/// assert_eq!(resolve(-8, 100), Some(92));
/// ```
#[must_use]
pub fn resolve(raw: i32, anchor: i64) -> Option<i64> {
    (raw != SENTINEL).then(|| anchor + i64::from(raw))
}

/// A pointer field as stored on disk together with its absolute target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    /// The raw root-relative value.
    pub raw: i32,
    /// Absolute byte position, or `None` when the link is absent or was not
    /// followed (list pointers with a zero count are never resolved).
    pub target: Option<u64>,
}

impl Offset {
    /// The absent link.
    pub const ABSENT: Self = Self {
        raw: SENTINEL,
        target: None,
    };

    /// A raw value that was deliberately left unresolved.
    #[must_use]
    pub const fn unresolved(raw: i32) -> Self {
        Self { raw, target: None }
    }

    /// Resolve `raw` against `anchor` and check the result lies inside a
    /// buffer of `len` bytes.
    pub fn locate(field: &'static str, raw: i32, anchor: i64, len: usize) -> DecodeResult<Self> {
        let Some(resolved) = resolve(raw, anchor) else {
            return Ok(Self::unresolved(raw));
        };
        match u64::try_from(resolved) {
            Ok(target) if target < len as u64 => Ok(Self {
                raw,
                target: Some(target),
            }),
            _ => Err(DecodeError::OffsetOutOfBounds {
                field,
                raw,
                resolved,
                len,
            }),
        }
    }

    /// Whether this is the sentinel.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.raw == SENTINEL
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::ABSENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_the_only_absent_value() {
        assert_eq!(resolve(SENTINEL, 0), None);
        assert_eq!(resolve(SENTINEL, 4096), None);
        assert_eq!(resolve(-2, 4096), Some(4094));
        assert_eq!(resolve(0, 4096), Some(4096));
        assert_eq!(resolve(i32::MAX, 0), Some(i64::from(i32::MAX)));
    }

    #[test]
    fn zero_resolves_to_anchor() {
        let offset = Offset::locate("sibling", 0, 40, 64).unwrap();
        assert_eq!(offset.target, Some(40));
        assert!(!offset.is_sentinel());
    }

    #[test]
    fn locate_rejects_positions_past_end() {
        let err = Offset::locate("sibling", 24, 40, 64).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OffsetOutOfBounds {
                field: "sibling",
                raw: 24,
                resolved: 64,
                len: 64,
            }
        );
    }

    #[test]
    fn locate_rejects_negative_positions() {
        let err = Offset::locate("front", -50, 40, 64).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::OffsetOutOfBounds { resolved: -10, .. }
        ));
    }

    #[test]
    fn locate_keeps_sentinel_absent() {
        assert_eq!(Offset::locate("back", -1, 40, 64).unwrap(), Offset::ABSENT);
    }
}
