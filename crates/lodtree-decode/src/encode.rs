//! Positional re-encoder.
//!
//! Writes every field of a decoded [`Tree`] back at the absolute position
//! it was read from. Bytes the decoder never looked at come out as zero.
//! Decoding the output at the tree's start offset reproduces the tree.

use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Mat3, Vec3};

use crate::node::{
    DofRange, MathOperands, Node, NodeBody, PrimitiveRef, RenderControl, SubTree, Switch, VecList,
};
use crate::primitive::{Plane, Primitive, PrimitiveShape};
use crate::tree::Tree;

/// Encode `tree` into a zero-filled buffer of at least `len` bytes.
///
/// # Errors
///
/// Only fails if writing to the in-memory buffer fails.
pub fn encode_tree(tree: &Tree, len: usize) -> io::Result<Vec<u8>> {
    let mut writer = ByteWriter {
        cursor: Cursor::new(vec![0u8; len]),
    };

    writer.seek(tree.start_offset());
    writer.i32(tree.tags().len() as i32)?;
    for &tag in tree.tags() {
        writer.i32(tag)?;
    }
    for node in tree.nodes() {
        writer.node(node)?;
    }
    Ok(writer.cursor.into_inner())
}

struct ByteWriter {
    cursor: Cursor<Vec<u8>>,
}

impl ByteWriter {
    fn seek(&mut self, position: u64) {
        self.cursor.set_position(position);
    }

    fn at(&mut self, position: u64, write: impl FnOnce(&mut Self) -> io::Result<()>) -> io::Result<()> {
        let resume = self.cursor.position();
        self.seek(position);
        let result = write(self);
        self.seek(resume);
        result
    }

    fn i32(&mut self, value: i32) -> io::Result<()> {
        self.cursor.write_i32::<LittleEndian>(value)
    }

    fn f32(&mut self, value: f32) -> io::Result<()> {
        self.cursor.write_f32::<LittleEndian>(value)
    }

    fn vec3(&mut self, value: Vec3) -> io::Result<()> {
        value.to_array().into_iter().try_for_each(|v| self.f32(v))
    }

    fn mat3(&mut self, value: Mat3) -> io::Result<()> {
        (0..3).try_for_each(|row| self.vec3(value.row(row)))
    }

    fn plane(&mut self, plane: &Plane) -> io::Result<()> {
        [plane.a, plane.b, plane.c, plane.d]
            .into_iter()
            .try_for_each(|v| self.f32(v))
    }

    fn list_of<T: Copy>(
        &mut self,
        target: Option<u64>,
        items: &[T],
        mut write: impl FnMut(&mut Self, T) -> io::Result<()>,
    ) -> io::Result<()> {
        let Some(target) = target else {
            return Ok(());
        };
        self.at(target, |w| items.iter().try_for_each(|&item| write(w, item)))
    }

    fn vec_list(&mut self, list: &VecList) -> io::Result<()> {
        self.list_of(list.offset.target, &list.items, Self::vec3)
    }

    fn node(&mut self, node: &Node) -> io::Result<()> {
        self.seek(node.position);
        self.i32(node.vft)?;
        self.i32(node.sibling.raw)?;
        match &node.body {
            NodeBody::Generic => Ok(()),
            NodeBody::SubTree(subtree) => self.subtree(subtree),
            NodeBody::Root(root) => {
                self.subtree(&root.subtree)?;
                self.i32(root.textures_offset.raw)?;
                self.i32(root.textures.len() as i32)?;
                self.i32(root.script_id)?;
                self.list_of(root.textures_offset.target, &root.textures, Self::i32)
            }
            NodeBody::Slot(slot) => {
                self.mat3(slot.rotation)?;
                self.vec3(slot.point)?;
                self.i32(slot.slot_id)
            }
            NodeBody::DegreeOfFreedom(dof) => {
                self.subtree(&dof.subtree)?;
                self.i32(dof.dof_id)?;
                self.mat3(dof.rotation)?;
                self.vec3(dof.point)
            }
            NodeBody::Switch(switch) | NodeBody::ExtendedSwitch(switch) => self.switch(switch),
            NodeBody::Splitter(splitter) | NodeBody::Culled(splitter) => {
                self.plane(&splitter.plane)?;
                self.i32(splitter.front.raw)?;
                self.i32(splitter.back.raw)
            }
            NodeBody::Primitive(primitive) | NodeBody::CulledPrimitive(primitive) => {
                self.primitive_ref(primitive)
            }
            NodeBody::LitPrimitive(lit) => {
                self.i32(lit.front.raw)?;
                self.i32(lit.back.raw)?;
                for primitive in [&lit.front_primitive, &lit.back_primitive]
                    .into_iter()
                    .flatten()
                {
                    self.at(primitive.position, |w| w.primitive(primitive))?;
                }
                Ok(())
            }
            NodeBody::SpecialTransform(transform) => {
                self.i32(transform.coords.offset.raw)?;
                self.i32(transform.coords.len() as i32)?;
                self.i32(transform.transform.into())?;
                self.i32(transform.subtree.raw)?;
                self.vec_list(&transform.coords)
            }
            NodeBody::LightString(light) => {
                self.primitive_ref(&light.primitive)?;
                self.plane(&light.light)?;
                self.i32(light.rgba_front)?;
                self.i32(light.rgba_back)
            }
            NodeBody::Translate {
                subtree,
                range,
                translation,
            } => {
                self.subtree(subtree)?;
                self.dof_range(range)?;
                self.vec3(*translation)
            }
            NodeBody::Scale {
                subtree,
                range,
                scale,
                translation,
            } => {
                self.subtree(subtree)?;
                self.dof_range(range)?;
                self.vec3(*scale)?;
                self.vec3(*translation)
            }
            NodeBody::ExtendedDof {
                subtree,
                range,
                matrix,
                translation,
            } => {
                self.subtree(subtree)?;
                self.dof_range(range)?;
                self.mat3(*matrix)?;
                self.vec3(*translation)
            }
            NodeBody::RenderControl(control) => self.render_control(control),
        }
    }

    fn subtree(&mut self, subtree: &SubTree) -> io::Result<()> {
        self.i32(subtree.coords.offset.raw)?;
        self.i32(subtree.coords.len() as i32)?;
        self.i32(subtree.dynamic_coords.len() as i32)?;
        self.i32(subtree.dynamic_coords.offset.raw)?;
        self.i32(subtree.normals.offset.raw)?;
        self.i32(subtree.normals.len() as i32)?;
        self.i32(subtree.subtree.raw)?;
        self.vec_list(&subtree.coords)?;
        self.vec_list(&subtree.dynamic_coords)?;
        self.vec_list(&subtree.normals)
    }

    fn dof_range(&mut self, range: &DofRange) -> io::Result<()> {
        self.i32(range.dof_id)?;
        self.f32(range.min)?;
        self.f32(range.max)?;
        self.f32(range.multiplier)?;
        self.f32(range.future)?;
        self.i32(range.flags)
    }

    fn switch(&mut self, switch: &Switch) -> io::Result<()> {
        self.i32(switch.switch_id)?;
        if let Some(flags) = switch.flags {
            self.i32(flags)?;
        }
        self.i32(switch.children.entries.len() as i32)?;
        self.i32(switch.children.offset.raw)?;
        let raws: Vec<i32> = switch.children.entries.iter().map(|e| e.raw).collect();
        self.list_of(switch.children.offset.target, &raws, Self::i32)
    }

    fn primitive_ref(&mut self, primitive: &PrimitiveRef) -> io::Result<()> {
        self.i32(primitive.handle)?;
        self.primitive(&primitive.primitive)
    }

    fn primitive(&mut self, primitive: &Primitive) -> io::Result<()> {
        self.i32(primitive.code)?;
        self.i32(primitive.vertex_count)?;
        self.i32(primitive.vertices_offset.raw)?;
        match &primitive.shape {
            PrimitiveShape::Point { color } | PrimitiveShape::Line { color } => self.i32(*color)?,
            PrimitiveShape::Polygon(polygon) => {
                self.plane(&polygon.plane)?;
                self.i32(polygon.color)?;
                if let Some(intensity) = polygon.intensity {
                    self.i32(intensity)?;
                }
                if let Some(texture) = polygon.texture {
                    self.i32(texture.texture)?;
                    self.i32(texture.uv)?;
                }
            }
            PrimitiveShape::Unrecognized => return Ok(()),
        }
        // Fields after a primitive continue at the end of its vertex list.
        let Some(target) = primitive.vertices_offset.target else {
            return Ok(());
        };
        self.seek(target);
        primitive.vertices.iter().try_for_each(|&v| self.i32(v))
    }

    fn render_control(&mut self, control: &RenderControl) -> io::Result<()> {
        self.i32(control.mode())?;
        match control {
            RenderControl::DataContext(context) => {
                context.iter().try_for_each(|&value| self.i32(value))
            }
            RenderControl::ZBias { reserved, z_bias } => {
                self.cursor.write_all(reserved)?;
                self.f32(*z_bias)
            }
            RenderControl::Math(math) => {
                self.cursor.write_u16::<LittleEndian>(math.math_mode)?;
                self.cursor.write_all(&math.arg_types)?;
                self.cursor.write_u8(math.result_type)?;
                self.cursor.write_u32::<LittleEndian>(math.result_id)?;
                match math.operands {
                    MathOperands::Ids(ids) => ids.into_iter().try_for_each(|id| self.i32(id)),
                    MathOperands::Values(values) => {
                        values.into_iter().try_for_each(|v| self.f32(v))
                    }
                }
            }
            RenderControl::Unrecognized(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::decode_tree;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn generic_chain_reencodes_byte_for_byte() {
        let data = words(&[2, 0, 0, 5, 8, 6, -1]);
        let tree = decode_tree(&data, 0).unwrap();
        assert_eq!(encode_tree(&tree, data.len()).unwrap(), data);
    }

    #[test]
    fn unread_bytes_come_back_as_zero() {
        let mut data = words(&[1, 0, 3, -1]);
        data.extend_from_slice(&[0xAA; 8]);
        let tree = decode_tree(&data, 0).unwrap();
        let encoded = encode_tree(&tree, data.len()).unwrap();
        assert_eq!(&encoded[..16], &data[..16]);
        assert!(encoded[16..].iter().all(|&b| b == 0));
        assert_eq!(decode_tree(&encoded, 0).unwrap(), tree);
    }
}
