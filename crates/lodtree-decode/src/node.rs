//! Decoded node model.
//!
//! Every node is a [`Node`] carrying the shared prologue (`vft` word and
//! sibling link) plus a [`NodeBody`] variant for its kind. Shared payload
//! pieces such as the subtree block are embedded by composition.

use glam::{Mat3, Vec3};

use crate::offset::Offset;
use crate::primitive::{Plane, Primitive};
use crate::tree::NodeId;
use crate::types::NodeKind;

/// One decoded node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Absolute position of the node's first byte.
    pub position: u64,
    /// Runtime vtable slot, carried through verbatim.
    pub vft: i32,
    pub sibling: Offset,
    pub body: NodeBody,
    /// Structural links to other nodes of the same tree.
    pub links: Links,
}

impl Node {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }
}

/// Ids of the nodes reached from a node's offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub sibling: Option<NodeId>,
    pub subtree: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub front: Option<NodeId>,
    pub back: Option<NodeId>,
}

impl Links {
    /// Structural children in traversal order: subtree, switch children,
    /// then front and back branches. The sibling is not included.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subtree
            .iter()
            .chain(&self.children)
            .chain(&self.front)
            .chain(&self.back)
            .copied()
    }
}

/// A list of 3-float records behind a root-relative pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecList {
    pub offset: Offset,
    pub items: Vec<Vec3>,
}

impl VecList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Geometry lists and subtree link shared by the subtree family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubTree {
    pub coords: VecList,
    pub dynamic_coords: VecList,
    pub normals: VecList,
    pub subtree: Offset,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub subtree: SubTree,
    pub textures_offset: Offset,
    pub textures: Vec<i32>,
    pub script_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub rotation: Mat3,
    pub point: Vec3,
    pub slot_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DegreeOfFreedom {
    pub subtree: SubTree,
    pub dof_id: i32,
    pub rotation: Mat3,
    pub point: Vec3,
}

/// Motion limits of the extended DOF kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DofRange {
    pub dof_id: i32,
    pub min: f32,
    pub max: f32,
    pub multiplier: f32,
    pub future: f32,
    pub flags: i32,
}

/// Array of child offsets behind a switch's child pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildTable {
    pub offset: Offset,
    pub entries: Vec<Offset>,
}

/// Switch and extended switch. Only the extended form carries `flags`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switch {
    pub switch_id: i32,
    pub flags: Option<i32>,
    pub children: ChildTable,
}

/// BSP splitter, also used for culled nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splitter {
    pub plane: Plane,
    pub front: Offset,
    pub back: Offset,
}

/// An inline primitive record and the engine handle stored before it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRef {
    pub handle: i32,
    pub primitive: Primitive,
}

/// Front and back primitive records referenced by offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LitPrimitive {
    pub front: Offset,
    pub back: Offset,
    pub front_primitive: Option<Primitive>,
    pub back_primitive: Option<Primitive>,
}

/// Transform applied by a special-transform node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformType {
    Normal,
    Billboard,
    Tree,
    Other(i32),
}

impl From<i32> for TransformType {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Billboard,
            2 => Self::Tree,
            other => Self::Other(other),
        }
    }
}

impl From<TransformType> for i32 {
    fn from(value: TransformType) -> Self {
        match value {
            TransformType::Normal => 0,
            TransformType::Billboard => 1,
            TransformType::Tree => 2,
            TransformType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialTransform {
    pub coords: VecList,
    pub transform: TransformType,
    pub subtree: Offset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightString {
    pub primitive: PrimitiveRef,
    pub light: Plane,
    pub rgba_front: i32,
    pub rgba_back: i32,
}

/// Operands of a math render control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathOperands {
    Ids([i32; 5]),
    Values([f32; 5]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathControl {
    pub math_mode: u16,
    pub arg_types: [u8; 5],
    pub result_type: u8,
    pub result_id: u32,
    pub operands: MathOperands,
}

/// Render-control payload, selected by its mode word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderControl {
    /// Mode 0.
    DataContext([i32; 8]),
    /// Mode 1.
    ZBias { reserved: [u8; 32], z_bias: f32 },
    /// Mode 2.
    Math(MathControl),
    /// Any other mode; the payload is left unread.
    Unrecognized(i32),
}

impl RenderControl {
    #[must_use]
    pub fn mode(&self) -> i32 {
        match self {
            Self::DataContext(_) => 0,
            Self::ZBias { .. } => 1,
            Self::Math(_) => 2,
            Self::Unrecognized(mode) => *mode,
        }
    }
}

/// Kind-specific node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Generic,
    SubTree(SubTree),
    Root(Root),
    Slot(Slot),
    DegreeOfFreedom(DegreeOfFreedom),
    Switch(Switch),
    Splitter(Splitter),
    Primitive(PrimitiveRef),
    LitPrimitive(LitPrimitive),
    CulledPrimitive(PrimitiveRef),
    SpecialTransform(SpecialTransform),
    LightString(LightString),
    Translate {
        subtree: SubTree,
        range: DofRange,
        translation: Vec3,
    },
    Scale {
        subtree: SubTree,
        range: DofRange,
        scale: Vec3,
        translation: Vec3,
    },
    ExtendedDof {
        subtree: SubTree,
        range: DofRange,
        matrix: Mat3,
        translation: Vec3,
    },
    ExtendedSwitch(Switch),
    RenderControl(RenderControl),
    Culled(Splitter),
}

impl NodeBody {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Generic => NodeKind::Generic,
            Self::SubTree(_) => NodeKind::SubTree,
            Self::Root(_) => NodeKind::Root,
            Self::Slot(_) => NodeKind::Slot,
            Self::DegreeOfFreedom(_) => NodeKind::DegreeOfFreedom,
            Self::Switch(_) => NodeKind::Switch,
            Self::Splitter(_) => NodeKind::Splitter,
            Self::Primitive(_) => NodeKind::Primitive,
            Self::LitPrimitive(_) => NodeKind::LitPrimitive,
            Self::CulledPrimitive(_) => NodeKind::CulledPrimitive,
            Self::SpecialTransform(_) => NodeKind::SpecialTransform,
            Self::LightString(_) => NodeKind::LightString,
            Self::Translate { .. } => NodeKind::Translate,
            Self::Scale { .. } => NodeKind::Scale,
            Self::ExtendedDof { .. } => NodeKind::ExtendedDof,
            Self::ExtendedSwitch(_) => NodeKind::ExtendedSwitch,
            Self::RenderControl(_) => NodeKind::RenderControl,
            Self::Culled(_) => NodeKind::Culled,
        }
    }

    /// The subtree block, for kinds that have one.
    #[must_use]
    pub fn subtree_block(&self) -> Option<&SubTree> {
        match self {
            Self::SubTree(subtree)
            | Self::Root(Root { subtree, .. })
            | Self::DegreeOfFreedom(DegreeOfFreedom { subtree, .. })
            | Self::Translate { subtree, .. }
            | Self::Scale { subtree, .. }
            | Self::ExtendedDof { subtree, .. } => Some(subtree),
            _ => None,
        }
    }

    /// The offset of the nested subtree chain, if this kind has one.
    #[must_use]
    pub fn subtree_link(&self) -> Option<Offset> {
        match self {
            Self::SpecialTransform(transform) => Some(transform.subtree),
            _ => self.subtree_block().map(|block| block.subtree),
        }
    }

    #[must_use]
    pub fn switch(&self) -> Option<&Switch> {
        match self {
            Self::Switch(switch) | Self::ExtendedSwitch(switch) => Some(switch),
            _ => None,
        }
    }

    /// Plane and branches of splitter and culled nodes.
    #[must_use]
    pub fn splitter(&self) -> Option<&Splitter> {
        match self {
            Self::Splitter(splitter) | Self::Culled(splitter) => Some(splitter),
            _ => None,
        }
    }

    /// Every primitive record held by this node.
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        let (first, second) = match self {
            Self::Primitive(p) | Self::CulledPrimitive(p) => (Some(&p.primitive), None),
            Self::LightString(light) => (Some(&light.primitive.primitive), None),
            Self::LitPrimitive(lit) => (lit.front_primitive.as_ref(), lit.back_primitive.as_ref()),
            _ => (None, None),
        };
        first.into_iter().chain(second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_type_round_trips_unknown_values() {
        for raw in [0, 1, 2, 7, -3] {
            assert_eq!(i32::from(TransformType::from(raw)), raw);
        }
        assert_eq!(TransformType::from(1), TransformType::Billboard);
    }

    #[test]
    fn descendants_follow_traversal_order() {
        let links = Links {
            sibling: Some(NodeId(9)),
            subtree: Some(NodeId(1)),
            children: vec![NodeId(2), NodeId(3)],
            front: Some(NodeId(4)),
            back: None,
        };
        let ids: Vec<_> = links.descendants().collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    }

    #[test]
    fn subtree_link_covers_special_transform() {
        let body = NodeBody::SpecialTransform(SpecialTransform {
            coords: VecList::default(),
            transform: TransformType::Tree,
            subtree: Offset::unresolved(12),
        });
        assert_eq!(body.subtree_link(), Some(Offset::unresolved(12)));
        assert_eq!(NodeBody::Generic.subtree_link(), None);
    }

    #[test]
    fn render_control_mode_is_preserved() {
        assert_eq!(RenderControl::Unrecognized(9).mode(), 9);
        assert_eq!(RenderControl::DataContext([0; 8]).mode(), 0);
    }
}
