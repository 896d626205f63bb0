//! Per-kind node payload readers.

use crate::error::{DecodeError, DecodeResult};
use crate::node::{
    ChildTable, DegreeOfFreedom, DofRange, LightString, Links, LitPrimitive, MathControl,
    MathOperands, Node, NodeBody, PrimitiveRef, RenderControl, Root, Slot, SpecialTransform,
    Splitter, SubTree, Switch, VecList,
};
use crate::offset::Offset;
use crate::primitive::{Plane, Primitive, read_primitive};
use crate::reader::ByteReader;
use crate::types::NodeKind;

/// Decode one node of kind `tag` at `pos`.
///
/// Offsets are resolved against `anchor`; a Root node resolves its own
/// fields against its own position, so callers pass that position as the
/// anchor when `tag` is Root. Returns the node (with empty [`Links`]) and
/// the position just past its last inline field. For primitive kinds that
/// is the end of the vertex list.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownNodeKind`] for tags outside `0..=17`,
/// [`DecodeError::TruncatedInput`] when the payload runs past the buffer
/// and [`DecodeError::OffsetOutOfBounds`] for links that resolve outside it.
pub fn decode_node(buffer: &[u8], pos: usize, anchor: i64, tag: i32) -> DecodeResult<(Node, u64)> {
    let mut reader = ByteReader::new(buffer);
    reader.seek(pos as u64);
    let node = read_node(&mut reader, anchor, tag)?;
    Ok((node, reader.position()))
}

pub(crate) fn read_node(reader: &mut ByteReader<'_>, anchor: i64, tag: i32) -> DecodeResult<Node> {
    let position = reader.position();
    let kind =
        NodeKind::try_from(tag).map_err(|tag| DecodeError::UnknownNodeKind { tag, position })?;
    NodeDecoder { reader, anchor }.node(kind, position)
}

struct NodeDecoder<'r, 'a> {
    reader: &'r mut ByteReader<'a>,
    anchor: i64,
}

impl NodeDecoder<'_, '_> {
    fn node(mut self, kind: NodeKind, position: u64) -> DecodeResult<Node> {
        self.reader.require("node header", 8)?;
        let vft = self.reader.i32("vft")?;
        let sibling = self.offset("sibling")?;
        let body = self.body(kind)?;
        Ok(Node {
            position,
            vft,
            sibling,
            body,
            links: Links::default(),
        })
    }

    fn body(&mut self, kind: NodeKind) -> DecodeResult<NodeBody> {
        Ok(match kind {
            NodeKind::Generic => NodeBody::Generic,
            NodeKind::SubTree => NodeBody::SubTree(self.subtree()?),
            NodeKind::Root => NodeBody::Root(self.root()?),
            NodeKind::Slot => NodeBody::Slot(Slot {
                rotation: self.reader.mat3("rotation")?,
                point: self.reader.vec3("rotation point")?,
                slot_id: self.reader.i32("slot id")?,
            }),
            NodeKind::DegreeOfFreedom => NodeBody::DegreeOfFreedom(DegreeOfFreedom {
                subtree: self.subtree()?,
                dof_id: self.reader.i32("dof id")?,
                rotation: self.reader.mat3("rotation")?,
                point: self.reader.vec3("rotation point")?,
            }),
            NodeKind::Switch => NodeBody::Switch(self.switch(false)?),
            NodeKind::Splitter => NodeBody::Splitter(self.splitter()?),
            NodeKind::Primitive => NodeBody::Primitive(self.primitive_ref()?),
            NodeKind::LitPrimitive => NodeBody::LitPrimitive(self.lit_primitive()?),
            NodeKind::CulledPrimitive => NodeBody::CulledPrimitive(self.primitive_ref()?),
            NodeKind::SpecialTransform => {
                let coords_raw = self.reader.i32("coords")?;
                let coord_count = self.reader.count("coord count")?;
                let transform = self.reader.i32("transform type")?.into();
                let subtree = self.offset("subtree")?;
                NodeBody::SpecialTransform(SpecialTransform {
                    coords: self.vec_list("coords", coords_raw, coord_count)?,
                    transform,
                    subtree,
                })
            }
            NodeKind::LightString => NodeBody::LightString(LightString {
                primitive: self.primitive_ref()?,
                light: Plane::read(self.reader, "light plane")?,
                rgba_front: self.reader.i32("rgba front")?,
                rgba_back: self.reader.i32("rgba back")?,
            }),
            NodeKind::Translate => NodeBody::Translate {
                subtree: self.subtree()?,
                range: self.dof_range()?,
                translation: self.reader.vec3("translation")?,
            },
            NodeKind::Scale => NodeBody::Scale {
                subtree: self.subtree()?,
                range: self.dof_range()?,
                scale: self.reader.vec3("scale")?,
                translation: self.reader.vec3("translation")?,
            },
            NodeKind::ExtendedDof => NodeBody::ExtendedDof {
                subtree: self.subtree()?,
                range: self.dof_range()?,
                matrix: self.reader.mat3("matrix")?,
                translation: self.reader.vec3("translation")?,
            },
            NodeKind::ExtendedSwitch => NodeBody::ExtendedSwitch(self.switch(true)?),
            NodeKind::RenderControl => NodeBody::RenderControl(self.render_control()?),
            NodeKind::Culled => NodeBody::Culled(self.splitter()?),
        })
    }

    fn offset(&mut self, field: &'static str) -> DecodeResult<Offset> {
        self.reader.offset(field, self.anchor)
    }

    fn vec_list(&mut self, field: &'static str, raw: i32, count: usize) -> DecodeResult<VecList> {
        let (offset, items) = self
            .reader
            .list(field, raw, count, 12, self.anchor, |r| r.vec3(field))?;
        Ok(VecList { offset, items })
    }

    fn subtree(&mut self) -> DecodeResult<SubTree> {
        let coords_raw = self.reader.i32("coords")?;
        let coord_count = self.reader.count("coord count")?;
        let dynamic_count = self.reader.count("dynamic coord count")?;
        let dynamic_raw = self.reader.i32("dynamic coords")?;
        let normals_raw = self.reader.i32("normals")?;
        let normal_count = self.reader.count("normal count")?;
        let subtree = self.offset("subtree")?;
        Ok(SubTree {
            coords: self.vec_list("coords", coords_raw, coord_count)?,
            dynamic_coords: self.vec_list("dynamic coords", dynamic_raw, dynamic_count)?,
            normals: self.vec_list("normals", normals_raw, normal_count)?,
            subtree,
        })
    }

    fn root(&mut self) -> DecodeResult<Root> {
        let subtree = self.subtree()?;
        let textures_raw = self.reader.i32("textures")?;
        let texture_count = self.reader.count("texture count")?;
        let script_id = self.reader.i32("script id")?;
        let (textures_offset, textures) =
            self.reader
                .list("textures", textures_raw, texture_count, 4, self.anchor, |r| {
                    r.i32("texture id")
                })?;
        Ok(Root {
            subtree,
            textures_offset,
            textures,
            script_id,
        })
    }

    fn dof_range(&mut self) -> DecodeResult<DofRange> {
        self.reader.require("dof range", 24)?;
        Ok(DofRange {
            dof_id: self.reader.i32("dof id")?,
            min: self.reader.f32("min")?,
            max: self.reader.f32("max")?,
            multiplier: self.reader.f32("multiplier")?,
            future: self.reader.f32("future")?,
            flags: self.reader.i32("flags")?,
        })
    }

    fn switch(&mut self, extended: bool) -> DecodeResult<Switch> {
        let switch_id = self.reader.i32("switch id")?;
        let flags = if extended {
            Some(self.reader.i32("flags")?)
        } else {
            None
        };
        let count = self.reader.count("child count")?;
        let children_raw = self.reader.i32("children")?;
        let anchor = self.anchor;
        let (offset, entries) = self
            .reader
            .list("children", children_raw, count, 4, anchor, |r| {
                r.offset("child", anchor)
            })?;
        if let Some(table) = offset.target {
            for (index, entry) in entries.iter().enumerate() {
                if entry.is_sentinel() {
                    self.reader.report(DecodeError::AbsentSwitchChild {
                        index,
                        position: table + 4 * index as u64,
                    });
                }
            }
        }
        Ok(Switch {
            switch_id,
            flags,
            children: ChildTable { offset, entries },
        })
    }

    fn splitter(&mut self) -> DecodeResult<Splitter> {
        Ok(Splitter {
            plane: Plane::read(self.reader, "plane")?,
            front: self.offset("front")?,
            back: self.offset("back")?,
        })
    }

    fn primitive_ref(&mut self) -> DecodeResult<PrimitiveRef> {
        Ok(PrimitiveRef {
            handle: self.reader.i32("primitive")?,
            primitive: read_primitive(self.reader, self.anchor)?,
        })
    }

    fn lit_primitive(&mut self) -> DecodeResult<LitPrimitive> {
        let front = self.offset("front")?;
        let back = self.offset("back")?;
        Ok(LitPrimitive {
            front,
            back,
            front_primitive: self.primitive_at(front)?,
            back_primitive: self.primitive_at(back)?,
        })
    }

    fn primitive_at(&mut self, offset: Offset) -> DecodeResult<Option<Primitive>> {
        let Some(target) = offset.target else {
            return Ok(None);
        };
        let anchor = self.anchor;
        self.reader
            .at(target, |r| read_primitive(r, anchor))
            .map(Some)
    }

    fn render_control(&mut self) -> DecodeResult<RenderControl> {
        let position = self.reader.position();
        let mode = self.reader.i32("mode")?;
        Ok(match mode {
            0 => {
                let mut context = [0i32; 8];
                for slot in &mut context {
                    *slot = self.reader.i32("data context")?;
                }
                RenderControl::DataContext(context)
            }
            1 => RenderControl::ZBias {
                reserved: self.reader.bytes::<32>("reserved")?,
                z_bias: self.reader.f32("z bias")?,
            },
            2 => RenderControl::Math(self.math_control()?),
            mode => {
                self.reader
                    .report(DecodeError::UnknownRenderControl { mode, position });
                RenderControl::Unrecognized(mode)
            }
        })
    }

    fn math_control(&mut self) -> DecodeResult<MathControl> {
        let math_mode = self.reader.u16("math mode")?;
        let mut arg_types = [0u8; 5];
        for arg in &mut arg_types {
            *arg = self.reader.u8("arg type")?;
        }
        let result_type = self.reader.u8("result type")?;
        let result_id = self.reader.u32("result id")?;
        let operands = if result_type == 0 {
            let mut ids = [0i32; 5];
            for id in &mut ids {
                *id = self.reader.i32("arg id")?;
            }
            MathOperands::Ids(ids)
        } else {
            let mut values = [0f32; 5];
            for value in &mut values {
                *value = self.reader.f32("arg value")?;
            }
            MathOperands::Values(values)
        };
        Ok(MathControl {
            math_mode,
            arg_types,
            result_type,
            result_id,
            operands,
        })
    }
}
