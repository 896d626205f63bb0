//! Positioned little-endian reader shared by every decoder of one tree.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Mat3, Vec3};

use crate::error::{DecodeError, DecodeResult};
use crate::offset::Offset;

/// Byte position of one decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub field: &'static str,
    pub position: u64,
}

/// Cursor over the file bytes with an explicit seek position.
///
/// Every read names the field it decodes so truncation errors and the
/// optional annotation side channel can point at it.
pub(crate) struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    spans: Option<Vec<FieldSpan>>,
    findings: Vec<DecodeError>,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            spans: None,
            findings: Vec::new(),
        }
    }

    /// Record the position of every field read from now on.
    pub(crate) fn annotated(mut self, enabled: bool) -> Self {
        self.spans = enabled.then(Vec::new);
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub(crate) fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub(crate) fn seek(&mut self, position: u64) {
        self.cursor.set_position(position);
    }

    fn remaining_from(&self, position: u64) -> u64 {
        (self.len() as u64).saturating_sub(position)
    }

    /// Fail unless `needed` bytes are available at the current position.
    pub(crate) fn require(&self, field: &'static str, needed: u64) -> DecodeResult<()> {
        let position = self.position();
        let available = self.remaining_from(position);
        if available < needed {
            return Err(DecodeError::TruncatedInput {
                field,
                position,
                needed,
                available,
            });
        }
        Ok(())
    }

    fn begin(&mut self, field: &'static str, size: u64) -> DecodeResult<()> {
        self.require(field, size)?;
        if let Some(spans) = self.spans.as_mut() {
            spans.push(FieldSpan {
                field,
                position: self.cursor.position(),
            });
        }
        Ok(())
    }

    fn truncated(&self, field: &'static str, position: u64, needed: u64) -> DecodeError {
        DecodeError::TruncatedInput {
            field,
            position,
            needed,
            available: self.remaining_from(position),
        }
    }

    pub(crate) fn i32(&mut self, field: &'static str) -> DecodeResult<i32> {
        let at = self.position();
        self.begin(field, 4)?;
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(field, at, 4))
    }

    pub(crate) fn u32(&mut self, field: &'static str) -> DecodeResult<u32> {
        let at = self.position();
        self.begin(field, 4)?;
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(field, at, 4))
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> DecodeResult<u16> {
        let at = self.position();
        self.begin(field, 2)?;
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(field, at, 2))
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> DecodeResult<u8> {
        let at = self.position();
        self.begin(field, 1)?;
        self.cursor.read_u8().map_err(|_| self.truncated(field, at, 1))
    }

    pub(crate) fn f32(&mut self, field: &'static str) -> DecodeResult<f32> {
        let at = self.position();
        self.begin(field, 4)?;
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.truncated(field, at, 4))
    }

    pub(crate) fn bytes<const N: usize>(&mut self, field: &'static str) -> DecodeResult<[u8; N]> {
        let at = self.position();
        self.begin(field, N as u64)?;
        let mut out = [0u8; N];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| self.truncated(field, at, N as u64))?;
        Ok(out)
    }

    pub(crate) fn vec3(&mut self, field: &'static str) -> DecodeResult<Vec3> {
        self.require(field, 12)?;
        Ok(Vec3::new(self.f32(field)?, self.f32(field)?, self.f32(field)?))
    }

    /// Read a row-major 3x3 matrix.
    pub(crate) fn mat3(&mut self, field: &'static str) -> DecodeResult<Mat3> {
        self.require(field, 36)?;
        let mut rows = [[0.0f32; 3]; 3];
        for row in &mut rows {
            for value in row.iter_mut() {
                *value = self.f32(field)?;
            }
        }
        Ok(Mat3::from_cols_array_2d(&rows).transpose())
    }

    /// Read a raw offset and resolve it against `anchor`.
    pub(crate) fn offset(&mut self, field: &'static str, anchor: i64) -> DecodeResult<Offset> {
        let raw = self.i32(field)?;
        Offset::locate(field, raw, anchor, self.len())
    }

    /// Read a declared element count, rejecting negative values.
    pub(crate) fn count(&mut self, field: &'static str) -> DecodeResult<usize> {
        let count = self.i32(field)?;
        usize::try_from(count).map_err(|_| DecodeError::InvalidCount { field, count })
    }

    /// Run `read` at `position`, then return to where the cursor was.
    pub(crate) fn at<T>(
        &mut self,
        position: u64,
        read: impl FnOnce(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<T> {
        let resume = self.position();
        self.seek(position);
        let result = read(self);
        self.seek(resume);
        result
    }

    /// Read `count` records of `size` bytes each from the list behind
    /// `raw`.
    ///
    /// Zero-length lists leave their pointer unresolved. A non-empty list
    /// behind the sentinel cannot be located and is reported out of bounds.
    pub(crate) fn list<T>(
        &mut self,
        field: &'static str,
        raw: i32,
        count: usize,
        size: u64,
        anchor: i64,
        mut read: impl FnMut(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<(Offset, Vec<T>)> {
        if count == 0 {
            return Ok((Offset::unresolved(raw), Vec::new()));
        }
        let offset = Offset::locate(field, raw, anchor, self.len())?;
        let Some(target) = offset.target else {
            return Err(DecodeError::OffsetOutOfBounds {
                field,
                raw,
                resolved: anchor + i64::from(raw),
                len: self.len(),
            });
        };
        let items = self.at(target, |r| {
            r.require(field, size.saturating_mul(count as u64))?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read(r)?);
            }
            Ok(items)
        })?;
        Ok((offset, items))
    }

    /// Note a recoverable problem without interrupting the decode.
    pub(crate) fn report(&mut self, finding: DecodeError) {
        tracing::warn!("{finding}");
        self.findings.push(finding);
    }

    pub(crate) fn take_spans(&mut self) -> Vec<FieldSpan> {
        self.spans.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn take_findings(&mut self) -> Vec<DecodeError> {
        std::mem::take(&mut self.findings)
    }
}
