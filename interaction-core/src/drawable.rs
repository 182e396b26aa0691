//! Rendering interface to the external renderer (§4.7): each frame the edit
//! layer emits a flat list of opaque draw commands, one or more per live
//! entity, for the host to actually rasterize.

use scene_core::entity::{Entity, EntityKind, MeshHandle};
use scene_core::graph::SceneGraph;
use scene_core::id::Id;
use scene_core::math::Transform;

/// Draw-order/grouping tag; the renderer may use it for batching or for a
/// gizmo visibility toggle, the core never inspects it itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    Ground,
    Mesh,
    Body,
    Joint,
    Station,
}

/// Hover-rim highlighting flags, computed per drawable from the current
/// selection and hover id (§4.7). Not mutually exclusive: the hovered
/// entity itself carries both `hovered` and `child_of_hovered`, since it is
/// trivially a member of its own selection group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Highlight {
    pub selected: bool,
    pub hovered: bool,
    pub child_of_hovered: bool,
}

impl Highlight {
    pub fn is_none(&self) -> bool {
        !self.selected && !self.hovered && !self.child_of_hovered
    }
}

/// One opaque draw command. `mesh_handle` is `None` for the primitive shapes
/// (sphere/cube/cone/cylinder) the core itself requests by name via `shape`;
/// it is `Some` only for an actual `Mesh` entity's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub id: Id,
    pub group_id: Group,
    pub shape: Shape,
    pub mesh_handle: Option<MeshHandle>,
    pub transform: Transform,
    pub color: [f32; 4],
    pub highlight: Highlight,
    pub material_override: Option<String>,
    pub property_block: Option<Vec<(String, f32)>>,
}

/// Primitive gizmo shapes the renderer is expected to know how to draw
/// without any mesh data at all (§4.7's per-variant table).
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    Mesh,
    Cube { half_extent: f32 },
    Cone { axis: usize, length: f32 },
    Cylinder { axis: usize, length: f32 },
}

const BODY_TRIAD_CONE_LENGTH: f32 = 0.5;
const JOINT_AXIS_DOF_LENGTH: f32 = 1.0;
const JOINT_AXIS_CONSTRAINED_LENGTH: f32 = 0.6;
const RED_TINT: [f32; 4] = [0.8, 0.2, 0.2, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn highlight_for(graph: &SceneGraph, id: Id, hover: Option<Id>) -> Highlight {
    let mut flags = Highlight {
        selected: graph.is_selected(id),
        ..Default::default()
    };
    if hover == Some(id) {
        flags.hovered = true;
        flags.child_of_hovered = true;
    } else if let Some(hover_id) = hover {
        flags.child_of_hovered = graph.same_selection_group(id, hover_id);
    }
    flags
}

/// Emits every live entity's drawables for one frame (§4.7). `hover` is the
/// id under the cursor this frame, resolved by [`crate::pick::hit_test`].
pub fn emit_drawables(graph: &SceneGraph, hover: Option<Id>, ground_visible: bool) -> Vec<Drawable> {
    let mut out = Vec::new();
    for entity in graph.iter() {
        let id = entity.id();
        let highlight = highlight_for(graph, id, hover);
        match entity {
            Entity::Ground(_) => {
                if ground_visible {
                    out.push(Drawable {
                        id,
                        group_id: Group::Ground,
                        shape: Shape::Sphere { radius: 0.1 },
                        mesh_handle: None,
                        transform: Transform::identity(),
                        color: WHITE,
                        highlight,
                        material_override: None,
                        property_block: None,
                    });
                }
            }
            Entity::Mesh(mesh) => {
                let red_tinted = mesh.parent.is_ground() || mesh.parent.is_empty();
                out.push(Drawable {
                    id,
                    group_id: Group::Mesh,
                    shape: Shape::Mesh,
                    mesh_handle: Some(mesh.mesh_handle),
                    transform: mesh.transform,
                    color: if red_tinted { RED_TINT } else { WHITE },
                    highlight,
                    material_override: None,
                    property_block: None,
                });
            }
            Entity::Body(body) => {
                out.push(Drawable {
                    id,
                    group_id: Group::Body,
                    shape: Shape::Cube { half_extent: 0.1 },
                    mesh_handle: None,
                    transform: body.transform,
                    color: WHITE,
                    highlight,
                    material_override: None,
                    property_block: None,
                });
                for axis in 0..3 {
                    out.push(Drawable {
                        id,
                        group_id: Group::Body,
                        shape: Shape::Cone {
                            axis,
                            length: BODY_TRIAD_CONE_LENGTH,
                        },
                        mesh_handle: None,
                        transform: body.transform,
                        color: WHITE,
                        highlight,
                        material_override: None,
                        property_block: None,
                    });
                }
            }
            Entity::Joint(joint) => {
                out.push(Drawable {
                    id,
                    group_id: Group::Joint,
                    shape: Shape::Sphere { radius: 0.05 },
                    mesh_handle: None,
                    transform: joint.transform,
                    color: WHITE,
                    highlight,
                    material_override: None,
                    property_block: None,
                });
                let dof_axes: Vec<usize> = joint
                    .joint_type
                    .dof_suffixes()
                    .iter()
                    .map(|suffix| match *suffix {
                        "_tx" | "_rx" => 0,
                        "_ty" | "_ry" => 1,
                        _ => 2,
                    })
                    .collect();
                for axis in 0..3 {
                    let length = if dof_axes.contains(&axis) {
                        JOINT_AXIS_DOF_LENGTH
                    } else {
                        JOINT_AXIS_CONSTRAINED_LENGTH
                    };
                    out.push(Drawable {
                        id,
                        group_id: Group::Joint,
                        shape: Shape::Cylinder { axis, length },
                        mesh_handle: None,
                        transform: joint.transform,
                        color: WHITE,
                        highlight,
                        material_override: None,
                        property_block: None,
                    });
                }
            }
            Entity::Station(station) => {
                out.push(Drawable {
                    id,
                    group_id: Group::Station,
                    shape: Shape::Sphere { radius: 0.03 },
                    mesh_handle: None,
                    transform: Transform {
                        position: station.position,
                        ..Transform::identity()
                    },
                    color: WHITE,
                    highlight,
                    material_override: None,
                    property_block: None,
                });
            }
        }
    }
    out
}

/// `true` for drawables whose entity kind is worth hit-testing at all; a
/// caller filters `emit_drawables`'s output through this before picking.
pub fn is_hittable(kind: EntityKind) -> bool {
    !matches!(kind, EntityKind::Ground)
}
