//! Primitive (polygon) record decoding.
//!
//! A primitive record is a 12-byte header `[code][vertex_count][vertices]`
//! followed by a family-specific tail. Codes 0 and 1 are points and lines.
//! From code 2 upwards the family follows `code % 4` and the textured bands
//! 6..=13 and 18..=26.
//!
//! The vertex index list is read last. Whatever follows a primitive inside
//! its node (the light plane of a light string) starts where that list ends.

use crate::error::{DecodeError, DecodeResult};
use crate::offset::Offset;
use crate::reader::ByteReader;

/// Size of the shared primitive header.
pub const PRIMITIVE_HEADER_LEN: u64 = 12;

/// Plane equation `ax + by + cz + d = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Plane {
    pub(crate) fn read(reader: &mut ByteReader<'_>, field: &'static str) -> DecodeResult<Self> {
        reader.require(field, 16)?;
        Ok(Self {
            a: reader.f32(field)?,
            b: reader.f32(field)?,
            c: reader.f32(field)?,
            d: reader.f32(field)?,
        })
    }
}

/// Layout family selected by a primitive code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveFamily {
    Point,
    Line,
    FlatColor,
    FlatColorIntensity,
    VertexColor,
    VertexColorIntensity,
    TexturedFlatColor,
    TexturedFlatColorIntensity,
    TexturedVertexColor,
    TexturedVertexColorIntensity,
}

impl PrimitiveFamily {
    /// Highest known primitive code.
    pub const MAX_CODE: i32 = 26;

    /// Map a primitive code to its family.
    ///
    /// # Example
    ///
    /// ```
    /// use lodtree_decode::PrimitiveFamily;
    ///
    /// assert_eq!(PrimitiveFamily::from_code(0), Some(PrimitiveFamily::Point));
    /// assert_eq!(PrimitiveFamily::from_code(15), Some(PrimitiveFamily::FlatColorIntensity));
    /// assert_eq!(PrimitiveFamily::from_code(26), Some(PrimitiveFamily::TexturedFlatColor));
    /// assert_eq!(PrimitiveFamily::from_code(27), None);
    /// ```
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        let textured = match code {
            0 => return Some(Self::Point),
            1 => return Some(Self::Line),
            2..=5 | 14..=17 => false,
            6..=13 | 18..=Self::MAX_CODE => true,
            _ => return None,
        };
        Some(match (code % 4, textured) {
            (2, false) => Self::FlatColor,
            (3, false) => Self::FlatColorIntensity,
            (0, false) => Self::VertexColor,
            (1, false) => Self::VertexColorIntensity,
            (2, true) => Self::TexturedFlatColor,
            (3, true) => Self::TexturedFlatColorIntensity,
            (0, true) => Self::TexturedVertexColor,
            _ => Self::TexturedVertexColorIntensity,
        })
    }

    #[must_use]
    pub const fn is_polygon(self) -> bool {
        !matches!(self, Self::Point | Self::Line)
    }

    #[must_use]
    pub const fn has_intensity(self) -> bool {
        matches!(
            self,
            Self::FlatColorIntensity
                | Self::VertexColorIntensity
                | Self::TexturedFlatColorIntensity
                | Self::TexturedVertexColorIntensity
        )
    }

    #[must_use]
    pub const fn is_textured(self) -> bool {
        matches!(
            self,
            Self::TexturedFlatColor
                | Self::TexturedFlatColorIntensity
                | Self::TexturedVertexColor
                | Self::TexturedVertexColorIntensity
        )
    }

    /// Bytes following the shared header.
    #[must_use]
    pub const fn tail_len(self) -> u64 {
        if !self.is_polygon() {
            return 4;
        }
        let mut len = 16 + 4;
        if self.has_intensity() {
            len += 4;
        }
        if self.is_textured() {
            len += 8;
        }
        len
    }
}

/// Texture handle and UV array handle of a textured polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub texture: i32,
    pub uv: i32,
}

/// Polygon tail shared by every family from code 2 upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub plane: Plane,
    pub color: i32,
    pub intensity: Option<i32>,
    pub texture: Option<TextureRef>,
}

/// Family-specific part of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveShape {
    Point { color: i32 },
    Line { color: i32 },
    Polygon(Polygon),
    /// The code has no known layout; only the header was consumed.
    Unrecognized,
}

/// One decoded primitive record.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Absolute position of the record header.
    pub position: u64,
    pub code: i32,
    pub vertex_count: i32,
    pub vertices_offset: Offset,
    pub shape: PrimitiveShape,
    /// Vertex indices read from `vertices_offset`.
    pub vertices: Vec<i32>,
}

impl Primitive {
    #[must_use]
    pub fn family(&self) -> Option<PrimitiveFamily> {
        PrimitiveFamily::from_code(self.code)
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self.shape, PrimitiveShape::Unrecognized)
    }
}

/// Decode the primitive record at `pos`.
///
/// Returns the primitive and the position just past its vertex list, or
/// past its fixed fields when the list is empty. Points and lines normally
/// keep the list inline after the color word. Unknown codes yield
/// [`PrimitiveShape::Unrecognized`] and a position 12 bytes past `pos`.
///
/// # Arguments
///
/// * `buffer` - The whole file
/// * `pos` - Absolute position of the record
/// * `anchor` - Base for the vertex list offset
pub fn decode_primitive(buffer: &[u8], pos: usize, anchor: i64) -> DecodeResult<(Primitive, u64)> {
    let mut reader = ByteReader::new(buffer);
    reader.seek(pos as u64);
    let primitive = read_primitive(&mut reader, anchor)?;
    Ok((primitive, reader.position()))
}

pub(crate) fn read_primitive(reader: &mut ByteReader<'_>, anchor: i64) -> DecodeResult<Primitive> {
    let position = reader.position();
    reader.require("primitive header", PRIMITIVE_HEADER_LEN)?;
    let code = reader.i32("primitive code")?;
    let vertex_count = reader.i32("vertex count")?;
    let vertices_raw = reader.i32("vertices")?;

    let Some(family) = PrimitiveFamily::from_code(code) else {
        reader.report(DecodeError::UnknownPrimitiveVariant { code, position });
        return Ok(Primitive {
            position,
            code,
            vertex_count,
            vertices_offset: Offset::unresolved(vertices_raw),
            shape: PrimitiveShape::Unrecognized,
            vertices: Vec::new(),
        });
    };

    let shape = read_shape(reader, family)?;
    let count = usize::try_from(vertex_count).map_err(|_| DecodeError::InvalidCount {
        field: "vertex count",
        count: vertex_count,
    })?;
    let (vertices_offset, vertices) =
        reader.list("vertices", vertices_raw, count, 4, anchor, |r| r.i32("vertex"))?;
    if let Some(target) = vertices_offset.target {
        reader.seek(target + 4 * count as u64);
    }

    Ok(Primitive {
        position,
        code,
        vertex_count,
        vertices_offset,
        shape,
        vertices,
    })
}

fn read_shape(reader: &mut ByteReader<'_>, family: PrimitiveFamily) -> DecodeResult<PrimitiveShape> {
    reader.require("primitive tail", family.tail_len())?;
    match family {
        PrimitiveFamily::Point => Ok(PrimitiveShape::Point {
            color: reader.i32("color")?,
        }),
        PrimitiveFamily::Line => Ok(PrimitiveShape::Line {
            color: reader.i32("color")?,
        }),
        _ => {
            let plane = Plane::read(reader, "plane")?;
            let color = reader.i32("color")?;
            let intensity = if family.has_intensity() {
                Some(reader.i32("intensity")?)
            } else {
                None
            };
            let texture = if family.is_textured() {
                Some(TextureRef {
                    texture: reader.i32("texture")?,
                    uv: reader.i32("uv")?,
                })
            } else {
                None
            };
            Ok(PrimitiveShape::Polygon(Polygon {
                plane,
                color,
                intensity,
                texture,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn families_follow_code_bands() {
        use PrimitiveFamily as F;
        let expected = [
            (0, F::Point),
            (1, F::Line),
            (2, F::FlatColor),
            (3, F::FlatColorIntensity),
            (4, F::VertexColor),
            (5, F::VertexColorIntensity),
            (6, F::TexturedFlatColor),
            (7, F::TexturedFlatColorIntensity),
            (8, F::TexturedVertexColor),
            (9, F::TexturedVertexColorIntensity),
            (10, F::TexturedFlatColor),
            (13, F::TexturedVertexColorIntensity),
            (14, F::FlatColor),
            (17, F::VertexColorIntensity),
            (18, F::TexturedFlatColor),
            (25, F::TexturedVertexColorIntensity),
            (26, F::TexturedFlatColor),
        ];
        for (code, family) in expected {
            assert_eq!(F::from_code(code), Some(family), "code {code}");
        }
        assert_eq!(F::from_code(-1), None);
        assert_eq!(F::from_code(27), None);
    }

    #[test]
    fn tail_lengths() {
        assert_eq!(PrimitiveFamily::Point.tail_len(), 4);
        assert_eq!(PrimitiveFamily::FlatColor.tail_len(), 20);
        assert_eq!(PrimitiveFamily::VertexColorIntensity.tail_len(), 24);
        assert_eq!(PrimitiveFamily::TexturedFlatColor.tail_len(), 28);
        assert_eq!(PrimitiveFamily::TexturedVertexColorIntensity.tail_len(), 32);
    }

    #[test]
    fn point_reads_one_color_and_its_vertices() {
        // code 0, one vertex at anchor + 16, color 9, vertex index 42
        let data = words(&[0, 1, 16, 9, 42]);
        let (primitive, next) = decode_primitive(&data, 0, 0).unwrap();
        assert_eq!(next, 20);
        assert_eq!(primitive.shape, PrimitiveShape::Point { color: 9 });
        assert_eq!(primitive.vertices, vec![42]);
        assert_eq!(primitive.vertices_offset.target, Some(16));
    }

    #[test]
    fn textured_intensity_polygon_reads_full_tail() {
        let mut data = words(&[7, 2, 44]);
        for f in [0.0f32, 1.0, 0.0, -5.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend(words(&[3, 4, 5, 6]));
        data.extend(words(&[10, 11]));
        let (primitive, next) = decode_primitive(&data, 0, 0).unwrap();
        assert_eq!(next, 52);
        let PrimitiveShape::Polygon(polygon) = primitive.shape else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.plane.b, 1.0);
        assert_eq!(polygon.plane.d, -5.0);
        assert_eq!(polygon.color, 3);
        assert_eq!(polygon.intensity, Some(4));
        assert_eq!(polygon.texture, Some(TextureRef { texture: 5, uv: 6 }));
        assert_eq!(primitive.vertices, vec![10, 11]);
    }

    #[test]
    fn unknown_code_consumes_only_the_header() {
        let data = words(&[99, 3, 0, 1, 2, 3]);
        let mut reader = ByteReader::new(&data);
        let primitive = read_primitive(&mut reader, 0).unwrap();
        assert_eq!(reader.position(), PRIMITIVE_HEADER_LEN);
        assert_eq!(primitive.shape, PrimitiveShape::Unrecognized);
        assert!(primitive.vertices.is_empty());
        assert_eq!(
            reader.take_findings(),
            vec![DecodeError::UnknownPrimitiveVariant {
                code: 99,
                position: 0,
            }]
        );
    }

    #[test]
    fn vertex_list_outside_buffer_is_out_of_bounds() {
        let data = words(&[1, 1, 400, 0]);
        assert!(matches!(
            decode_primitive(&data, 0, 0),
            Err(DecodeError::OffsetOutOfBounds {
                field: "vertices",
                ..
            })
        ));
    }

    #[test]
    fn polygon_ends_after_a_detached_vertex_list() {
        // flat polygon whose two vertices sit past a padding word at 36
        let mut data = words(&[2, 2, 36]);
        for f in [1.0f32, 0.0, 0.0, 0.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend(words(&[4, 0, 7, 8, 99]));
        let (primitive, next) = decode_primitive(&data, 0, 0).unwrap();
        assert_eq!(primitive.vertices, vec![7, 8]);
        assert_eq!(next, 44);
    }

    #[test]
    fn short_tail_is_truncated_before_any_field() {
        // flat polygon with only two plane words present
        let mut data = words(&[2, 0, -1]);
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&2.0f32.to_le_bytes());
        assert_eq!(
            decode_primitive(&data, 0, 0).unwrap_err(),
            DecodeError::TruncatedInput {
                field: "primitive tail",
                position: 12,
                needed: 20,
                available: 8,
            }
        );
    }

    #[test]
    fn empty_vertex_list_is_not_resolved() {
        let data = words(&[1, 0, -1, 8]);
        let (primitive, _) = decode_primitive(&data, 0, 0).unwrap();
        assert_eq!(primitive.vertices_offset, Offset::ABSENT);
        assert_eq!(primitive.shape, PrimitiveShape::Line { color: 8 });
    }
}
