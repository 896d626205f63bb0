//! Plain-text dump of a decoded tree.

use std::fmt::{self, Write};

use glam::{Mat3, Vec3};
use lodtree_decode::{
    DofRange, MathOperands, Node, NodeBody, NodeId, Offset, Plane, Primitive, PrimitiveShape,
    RenderControl, SubTree, Tree, VecList, Visitor,
};

/// Knobs for [`render_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append each node's annotated field positions. Only has an effect on
    /// trees decoded with annotations enabled.
    pub positions: bool,
    /// Longest list (coordinates, vertices, textures) printed in full.
    pub list_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            positions: false,
            list_limit: 16,
        }
    }
}

/// Render `tree` as an indented, one-field-per-line text dump.
#[must_use]
pub fn render_text(tree: &Tree, options: &RenderOptions) -> String {
    let mut renderer = TextRenderer {
        out: String::new(),
        options: *options,
        depth: 0,
    };
    tree.walk(&mut renderer);
    for diagnostic in tree.diagnostics() {
        match diagnostic.node {
            Some(id) => renderer.raw(format_args!("warning {id}: {}\n", diagnostic.error)),
            None => renderer.raw(format_args!("warning: {}\n", diagnostic.error)),
        }
    }
    renderer.out
}

struct TextRenderer {
    out: String,
    options: RenderOptions,
    depth: usize,
}

impl Visitor for TextRenderer {
    fn enter(&mut self, tree: &Tree, id: NodeId, depth: usize) {
        let Some(node) = tree.get(id) else {
            return;
        };
        self.depth = depth;
        self.line(format_args!("***{}*** {id} @{}", node.kind(), node.position));
        self.node(node);
        if self.options.positions {
            let fields: Vec<String> = tree
                .annotations_for(id)
                .map(|a| format!("{}@{}", a.field, a.position))
                .collect();
            if !fields.is_empty() {
                self.field("Fields", format_args!("{}", fields.join(" ")));
            }
        }
    }
}

impl TextRenderer {
    fn raw(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a String cannot fail.
        let _ = self.out.write_fmt(args);
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        let indent = "  ".repeat(self.depth);
        self.raw(format_args!("{indent}{args}\n"));
    }

    fn field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        self.line(format_args!("  {name}: {value}"));
    }

    fn offset(&mut self, name: &str, offset: Offset) {
        match offset.target {
            Some(target) => self.field(name, format_args!("{} -> {target}", offset.raw)),
            None => self.field(name, format_args!("{}", offset.raw)),
        }
    }

    fn vec3(&mut self, name: &str, value: Vec3) {
        self.field(name, format_args!("{:.4} {:.4} {:.4}", value.x, value.y, value.z));
    }

    fn mat3(&mut self, name: &str, value: Mat3) {
        for row in 0..3 {
            self.vec3(&format!("{name}[{row}]"), value.row(row));
        }
    }

    fn plane(&mut self, name: &str, plane: &Plane) {
        self.field(
            name,
            format_args!("A={} B={} C={} D={}", plane.a, plane.b, plane.c, plane.d),
        );
    }

    fn list<T: fmt::Display>(&mut self, name: &str, items: &[T]) {
        let shown: Vec<String> = items
            .iter()
            .take(self.options.list_limit)
            .map(ToString::to_string)
            .collect();
        let more = items.len().saturating_sub(shown.len());
        if more > 0 {
            self.field(name, format_args!("[{}] (+{more} more)", shown.join(", ")));
        } else {
            self.field(name, format_args!("[{}]", shown.join(", ")));
        }
    }

    fn vec_list(&mut self, name: &str, list: &VecList) {
        self.offset(&format!("{name} ptr"), list.offset);
        self.field(&format!("{name} count"), format_args!("{}", list.len()));
        for (i, item) in list.items.iter().take(self.options.list_limit).enumerate() {
            self.vec3(&format!("{name}[{i}]"), *item);
        }
    }

    fn subtree(&mut self, block: &SubTree) {
        self.vec_list("Coords", &block.coords);
        self.vec_list("Dynamic coords", &block.dynamic_coords);
        self.vec_list("Normals", &block.normals);
        self.offset("Subtree", block.subtree);
    }

    fn dof_range(&mut self, range: &DofRange) {
        self.field("DOF id", format_args!("{}", range.dof_id));
        self.field("Min", format_args!("{}", range.min));
        self.field("Max", format_args!("{}", range.max));
        self.field("Multiplier", format_args!("{}", range.multiplier));
        self.field("Future", format_args!("{}", range.future));
        self.field("Flags", format_args!("{:#x}", range.flags));
    }

    fn primitive(&mut self, label: &str, primitive: &Primitive) {
        self.field(
            label,
            format_args!("code {} @{}", primitive.code, primitive.position),
        );
        self.field("Vertex count", format_args!("{}", primitive.vertex_count));
        self.offset("Vertices ptr", primitive.vertices_offset);
        match &primitive.shape {
            PrimitiveShape::Point { color } | PrimitiveShape::Line { color } => {
                self.field("Color", format_args!("{color}"));
            }
            PrimitiveShape::Polygon(polygon) => {
                self.plane("Plane", &polygon.plane);
                self.field("Color", format_args!("{}", polygon.color));
                if let Some(intensity) = polygon.intensity {
                    self.field("Intensity", format_args!("{intensity}"));
                }
                if let Some(texture) = polygon.texture {
                    self.field("Texture", format_args!("{}", texture.texture));
                    self.field("UV", format_args!("{}", texture.uv));
                }
            }
            PrimitiveShape::Unrecognized => self.field("Shape", format_args!("unrecognized")),
        }
        self.list("Vertices", &primitive.vertices);
    }

    fn node(&mut self, node: &Node) {
        self.field("VFT", format_args!("{:#x}", node.vft));
        self.offset("Sibling", node.sibling);
        match &node.body {
            NodeBody::Generic => {}
            NodeBody::SubTree(block) => self.subtree(block),
            NodeBody::Root(root) => {
                self.subtree(&root.subtree);
                self.offset("Textures ptr", root.textures_offset);
                self.list("Textures", &root.textures);
                self.field("Script id", format_args!("{}", root.script_id));
            }
            NodeBody::Slot(slot) => {
                self.mat3("Rotation", slot.rotation);
                self.vec3("Rotation point", slot.point);
                self.field("Slot id", format_args!("{}", slot.slot_id));
            }
            NodeBody::DegreeOfFreedom(dof) => {
                self.subtree(&dof.subtree);
                self.field("DOF id", format_args!("{}", dof.dof_id));
                self.mat3("Rotation", dof.rotation);
                self.vec3("Rotation point", dof.point);
            }
            NodeBody::Switch(switch) | NodeBody::ExtendedSwitch(switch) => {
                self.field("Switch id", format_args!("{}", switch.switch_id));
                if let Some(flags) = switch.flags {
                    self.field("Flags", format_args!("{flags:#x}"));
                }
                self.field(
                    "Child count",
                    format_args!("{}", switch.children.entries.len()),
                );
                self.offset("Children ptr", switch.children.offset);
                let raws: Vec<i32> = switch.children.entries.iter().map(|e| e.raw).collect();
                self.list("Children", &raws);
            }
            NodeBody::Splitter(splitter) | NodeBody::Culled(splitter) => {
                self.plane("Plane", &splitter.plane);
                self.offset("Front", splitter.front);
                self.offset("Back", splitter.back);
            }
            NodeBody::Primitive(primitive) | NodeBody::CulledPrimitive(primitive) => {
                self.field("Primitive handle", format_args!("{}", primitive.handle));
                self.primitive("Primitive", &primitive.primitive);
            }
            NodeBody::LitPrimitive(lit) => {
                self.offset("Front", lit.front);
                self.offset("Back", lit.back);
                if let Some(front) = &lit.front_primitive {
                    self.primitive("Front primitive", front);
                }
                if let Some(back) = &lit.back_primitive {
                    self.primitive("Back primitive", back);
                }
            }
            NodeBody::SpecialTransform(transform) => {
                self.vec_list("Coords", &transform.coords);
                self.field("Transform", format_args!("{:?}", transform.transform));
                self.offset("Subtree", transform.subtree);
            }
            NodeBody::LightString(light) => {
                self.field("Primitive handle", format_args!("{}", light.primitive.handle));
                self.primitive("Primitive", &light.primitive.primitive);
                self.plane("Light plane", &light.light);
                self.field("RGBA front", format_args!("{:#010x}", light.rgba_front));
                self.field("RGBA back", format_args!("{:#010x}", light.rgba_back));
            }
            NodeBody::Translate {
                subtree,
                range,
                translation,
            } => {
                self.subtree(subtree);
                self.dof_range(range);
                self.vec3("Translation", *translation);
            }
            NodeBody::Scale {
                subtree,
                range,
                scale,
                translation,
            } => {
                self.subtree(subtree);
                self.dof_range(range);
                self.vec3("Scale", *scale);
                self.vec3("Translation", *translation);
            }
            NodeBody::ExtendedDof {
                subtree,
                range,
                matrix,
                translation,
            } => {
                self.subtree(subtree);
                self.dof_range(range);
                self.mat3("Matrix", *matrix);
                self.vec3("Translation", *translation);
            }
            NodeBody::RenderControl(control) => self.render_control(control),
        }
    }

    fn render_control(&mut self, control: &RenderControl) {
        self.field("Mode", format_args!("{}", control.mode()));
        match control {
            RenderControl::DataContext(context) => self.list("Data context", context),
            RenderControl::ZBias { z_bias, .. } => {
                self.field("Z bias", format_args!("{z_bias}"));
            }
            RenderControl::Math(math) => {
                self.field("Math mode", format_args!("{}", math.math_mode));
                self.list("Arg types", &math.arg_types);
                self.field("Result type", format_args!("{}", math.result_type));
                self.field("Result id", format_args!("{}", math.result_id));
                match &math.operands {
                    MathOperands::Ids(ids) => self.list("Arg ids", ids),
                    MathOperands::Values(values) => self.list("Arg values", values),
                }
            }
            RenderControl::Unrecognized(_) => {
                self.field("Payload", format_args!("unrecognized"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lodtree_decode::{DecodeOptions, decode_tree_with};

    use super::*;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn nested_nodes_are_indented() {
        // Root at 12 whose subtree is a Generic at 60
        let data = words(&[
            2, 2, 0, //
            0, -1, -1, 0, 0, -1, -1, 0, 48, -1, 0, 0, //
            0, -1,
        ]);
        let tree = decode_tree_with(&data, 0, &DecodeOptions::default()).unwrap();
        let text = render_text(&tree, &RenderOptions::default());
        assert!(text.starts_with("***Root*** #0 @12\n"));
        assert!(text.contains("\n  ***Generic*** #1 @60\n"));
        assert!(text.contains("  Subtree: 48 -> 60\n"));
    }

    #[test]
    fn positions_come_from_annotations() {
        let data = words(&[1, 0, 0, -1]);
        let options = DecodeOptions::default().with_annotations(true);
        let tree = decode_tree_with(&data, 0, &options).unwrap();
        let text = render_text(
            &tree,
            &RenderOptions {
                positions: true,
                ..RenderOptions::default()
            },
        );
        assert!(text.contains("Fields: vft@8 sibling@12"));
    }

    #[test]
    fn long_lists_are_cut() {
        let mut renderer = TextRenderer {
            out: String::new(),
            options: RenderOptions {
                positions: false,
                list_limit: 2,
            },
            depth: 0,
        };
        renderer.list("Vertices", &[1, 2, 3, 4]);
        assert_eq!(renderer.out, "  Vertices: [1, 2] (+2 more)\n");
    }
}
